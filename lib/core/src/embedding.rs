use serde::{Deserialize, Serialize};

/// A visual embedding produced by the extraction service.
///
/// Embeddings are expected to be unit vectors. An empty or all-zero
/// embedding is the "no usable features" sentinel and never matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Build an embedding from raw extractor output, normalizing to unit length.
    #[must_use]
    pub fn from_features(features: Vec<f32>) -> Self {
        let mut embedding = Self::new(features);
        embedding.normalize();
        embedding
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.norm_f64() as f32
    }

    /// Euclidean norm accumulated in f64, so neither tiny nor huge
    /// components underflow or overflow.
    fn norm_f64(&self) -> f64 {
        self.data
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }

    /// True for empty, all-zero and non-finite vectors.
    #[inline]
    pub fn is_zero(&self) -> bool {
        let norm = self.norm_f64();
        !norm.is_finite() || norm == 0.0
    }

    /// Normalize the vector to unit length. Zero vectors are left untouched.
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm_f64();
        if norm.is_finite() && norm > 0.0 {
            for x in &mut self.data {
                *x = (f64::from(*x) / norm) as f32;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }

    /// Cosine similarity: the dot product of both vectors after normalization.
    ///
    /// Returns `None` when either side is a zero vector or the dimensions
    /// differ, so degenerate embeddings can never clear a threshold.
    pub fn cosine_similarity(&self, other: &Embedding) -> Option<f32> {
        if self.dim() != other.dim() {
            return None;
        }

        if self.is_zero() || other.is_zero() {
            return None;
        }

        let a = self.normalized();
        let b = other.normalized();
        Some(dot(&a.data, &b.data).clamp(-1.0, 1.0))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(data: Vec<f32>) -> Self {
        Embedding::new(data)
    }
}

/// Dot product with two accumulators for better pipelining.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;

    let chunks = a.chunks_exact(8);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(8);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        dot0 += a_chunk[0] * b_chunk[0]
            + a_chunk[1] * b_chunk[1]
            + a_chunk[2] * b_chunk[2]
            + a_chunk[3] * b_chunk[3];

        dot1 += a_chunk[4] * b_chunk[4]
            + a_chunk[5] * b_chunk[5]
            + a_chunk[6] * b_chunk[6]
            + a_chunk[7] * b_chunk[7];
    }

    for i in (a.len() - remainder.len())..a.len() {
        dot0 += a[i] * b[i];
    }

    dot0 + dot1
}
