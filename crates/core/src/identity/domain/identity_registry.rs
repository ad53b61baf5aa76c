use crate::shared::constants::LABEL_PREFIX;
use crate::shared::math::cosine_similarity;

/// Session-scoped catalogue of every face seen so far.
///
/// Append-only: entries are never merged, decayed or removed, and labels
/// are never reused. Embeddings are expected to be L2-normalized so that
/// the dot product used for matching is cosine similarity.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    embeddings: Vec<Vec<f32>>,
    labels: Vec<String>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the best-scoring stored embedding if its score reaches
    /// `threshold` (inclusive). Ties go to the earliest entry; NaN scores
    /// never match. A query that is all zeros or holds a non-finite value
    /// matches nothing.
    pub fn find_match(&self, embedding: &[f32], threshold: f64) -> Option<usize> {
        if !is_usable(embedding) {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (idx, stored) in self.embeddings.iter().enumerate() {
            let score = cosine_similarity(stored, embedding);
            if score.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }
        best.filter(|&(_, score)| score >= threshold)
            .map(|(idx, _)| idx)
    }

    /// Appends a new identity and returns its label.
    pub fn register(&mut self, embedding: Vec<f32>) -> String {
        let label = format!("{LABEL_PREFIX} {}", self.labels.len() + 1);
        self.embeddings.push(embedding);
        self.labels.push(label.clone());
        label
    }

    /// Match-or-register in one step.
    pub fn identify(&mut self, embedding: Vec<f32>, threshold: f64) -> String {
        match self.find_match(&embedding, threshold) {
            Some(idx) => self.labels[idx].clone(),
            None => self.register(embedding),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn is_usable(embedding: &[f32]) -> bool {
    embedding.iter().all(|v| v.is_finite()) && embedding.iter().any(|&v| v != 0.0)
}
