use ahash::AHashSet;
use serde::Serialize;
use std::sync::Arc;
use crate::catalog::Catalog;
use crate::record::CorpusRecord;
use crate::store::{Records, ScanOrder};
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total_records: usize,
    pub unique_skus: usize,
    /// Corpus records carrying a usable (non-zero) embedding.
    pub embedded_records: usize,
    pub catalog_size: usize,
}

/// Aggregate counts over the corpus and master catalog.
pub fn collect(records: &Records, catalog: &Arc<dyn Catalog>) -> Result<DatasetStats> {
    let corpus = records.scan::<CorpusRecord>(None, ScanOrder::Key)?;

    let unique: AHashSet<&str> = corpus.iter().map(|r| r.sku_code.as_str()).collect();
    let embedded_records = corpus.iter().filter(|r| !r.embedding.is_zero()).count();

    Ok(DatasetStats {
        total_records: corpus.len(),
        unique_skus: unique.len(),
        embedded_records,
        catalog_size: catalog.size()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::testutil::{corpus_at, seeded_catalog};

    #[test]
    fn test_counts() {
        let store = Arc::new(MemoryStore::new());
        let records = Records::new(store.clone());
        records.insert(&corpus_at("r1", "A100", vec![1.0, 0.0], 1)).unwrap();
        records.insert(&corpus_at("r2", "A100", vec![0.0, 1.0], 2)).unwrap();
        records.insert(&corpus_at("r3", "B200", vec![0.0, 0.0], 3)).unwrap();
        let catalog = seeded_catalog(store, &["A100", "B200", "C300"]);

        let stats = collect(&records, &catalog).unwrap();
        assert_eq!(
            stats,
            DatasetStats {
                total_records: 3,
                unique_skus: 2,
                embedded_records: 2,
                catalog_size: 3,
            }
        );
    }
}
