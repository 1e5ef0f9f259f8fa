//! Offline embeddings from hashed word and character-trigram features.

use crate::embeddings::provider::EmbeddingProvider;
use ragbot_core::AppResult;
use std::collections::HashMap;

pub const HASHED_MODEL: &str = "hashed-trigram";

const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic, content-dependent vectors with no model behind them.
///
/// Words sharing trigrams land in shared dimensions, so texts with
/// overlapping vocabulary score higher than unrelated ones. Useful when
/// no embedding server is available and in tests.
#[derive(Debug)]
pub struct HashedProvider {
    dimensions: usize,
}

impl HashedProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        let hash = feature
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(1_099_511_628_211).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        let lower = text.to_lowercase();
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *counts.entry(word).or_insert(0) += 1;
        }

        for (word, count) in &counts {
            let weight = *count as f32;
            vector[self.bucket(word, 17)] += weight;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 31)] += weight.sqrt();
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashedProvider {
    fn provider_name(&self) -> &str {
        "hashed"
    }

    fn model_name(&self) -> &str {
        HASHED_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
