// Benchmarks for the exact linear scan and correction lookup
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use skulens_core::{
    CandidateSearch, CatalogEntry, CorrectionLookup, CorrectionRecord, CorpusRecord, Embedding,
    ImageMeta, LinearScan, MatchConfig, MatchEngine, MemoryStore, RecordStore, Records,
    StoreCatalog, StoreDirectory, DEFAULT_CORRECTION_THRESHOLD, DEFAULT_FEATURE_MODEL,
    DEFAULT_TOP_K,
};
use std::sync::Arc;

const DIM: usize = 512;

fn generate_random_embedding(rng: &mut impl Rng) -> Embedding {
    let data: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Embedding::from_features(data)
}

/// Corpus of `size` records spread over `size / 4` SKUs.
fn populated_store(size: usize) -> Arc<dyn RecordStore> {
    let mut rng = rand::rng();
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let records = Records::new(store.clone());
    let now = chrono::Utc::now();

    for i in 0..size {
        let sku_code = format!("SKU{:05}", i / 4);
        let record = CorpusRecord {
            id: format!("img-{}", i),
            meta: ImageMeta::for_upload(&sku_code, 1024, now),
            sku_code,
            embedding: generate_random_embedding(&mut rng),
            image: Vec::new(),
            uploaded_by: "bench".to_string(),
            created_at: now,
        };
        records.insert(&record).unwrap();
    }
    for i in 0..size / 10 {
        let record = CorrectionRecord {
            training_id: format!("t-{}", i),
            embedding: generate_random_embedding(&mut rng),
            correct_sku: format!("SKU{:05}", i),
            feedback_id: format!("f-{}", i),
            created_at: now,
        };
        records.insert(&record).unwrap();
    }
    store
}

fn benchmark_cosine(c: &mut Criterion) {
    let mut rng = rand::rng();
    let a = generate_random_embedding(&mut rng);
    let b = generate_random_embedding(&mut rng);

    c.bench_function("cosine_similarity_512", |bench| {
        bench.iter(|| black_box(a.cosine_similarity(black_box(&b))));
    });
}

fn benchmark_linear_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_scan");
    group.sample_size(20);

    for size in [1_000, 10_000].iter() {
        let store = populated_store(*size);
        // threshold 0 keeps every candidate so dedup and sort are exercised
        let scan = LinearScan::new(Records::new(store), 0.0, DEFAULT_FEATURE_MODEL);
        let query = generate_random_embedding(&mut rand::rng());

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(scan.search(black_box(&query), DEFAULT_TOP_K).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_correction_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("correction_lookup");

    for size in [1_000, 10_000].iter() {
        let store = populated_store(*size);
        let lookup = CorrectionLookup::new(Records::new(store), DEFAULT_CORRECTION_THRESHOLD);
        let query = generate_random_embedding(&mut rand::rng());

        group.bench_with_input(BenchmarkId::from_parameter(size / 10), size, |b, _| {
            b.iter(|| black_box(lookup.lookup(black_box(&query)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_concurrent_searches(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_searches");
    group.sample_size(10);

    let store = populated_store(1_000);
    let catalog = StoreCatalog::new(store.clone());
    for i in 0..250 {
        catalog
            .register(&CatalogEntry {
                sku_code: format!("SKU{:05}", i),
                description: None,
            })
            .unwrap();
    }
    let engine = Arc::new(MatchEngine::new(
        MatchConfig::default(),
        store.clone(),
        Arc::new(catalog),
        Arc::new(StoreDirectory::new(store)),
    ));
    let query = generate_random_embedding(&mut rand::rng());

    group.bench_function("engine_search_x10", |b| {
        b.iter(|| {
            use std::thread;
            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let engine = engine.clone();
                    let q = query.clone();
                    thread::spawn(move || engine.search(&q))
                })
                .collect();

            for handle in handles {
                black_box(handle.join().unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_cosine,
    benchmark_linear_scan,
    benchmark_correction_lookup,
    benchmark_concurrent_searches
);
criterion_main!(benches);
