//! Document-document similarity.
//!
//! Three signals are combined into one static NxN matrix:
//! - title token overlap (Jaccard)
//! - keyword token overlap (Jaccard)
//! - abstract TF-IDF cosine
//!
//! The matrix and the neighbor lists derived from it are built once and are
//! read-only afterwards.

pub mod compare;
pub mod neighbors;

use std::time::Instant;

use num::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    vectorizer::{corpus::Corpus, tfidf::TFIDFEngine, TFIDFVectorizer},
    DocId,
};

pub use neighbors::NeighborGraph;

/// Weights of the similarity signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub title: f64,
    pub keywords: f64,
    #[serde(rename = "abstract")]
    pub abstract_text: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        SimilarityWeights {
            title: 0.2,
            keywords: 0.3,
            abstract_text: 0.5,
        }
    }
}

impl SimilarityWeights {
    pub fn sum(&self) -> f64 {
        self.title + self.keywords + self.abstract_text
    }

    /// Combine the three signals of one document pair.
    #[inline]
    pub fn combine(&self, title: f64, keywords: f64, abstract_text: f64) -> f64 {
        self.title * title + self.keywords * keywords + self.abstract_text * abstract_text
    }

    /// Weights not summing to 1 are accepted; combined scores then leave [0, 1].
    pub(crate) fn check(&self) {
        if (self.sum() - 1.0).abs() > 1e-9 {
            warn!(sum = self.sum(), "similarity weights do not sum to 1.0");
        }
    }
}

/// Dense square similarity matrix, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    /// Fill an `n x n` matrix row by row, rows in parallel.
    /// `fill(i, row)` writes the whole row `i`.
    pub fn from_rows<F>(n: usize, fill: F) -> Self
    where
        F: Fn(usize, &mut [f64]) + Sync + Send,
    {
        let mut data = vec![0.0; n * n];
        if n > 0 {
            data.par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, row)| fill(i, row));
        }
        SimilarityMatrix { n, data }
    }

    /// Number of documents (rows = columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// `None` when either id is outside the matrix.
    #[inline]
    pub fn get(&self, i: DocId, j: DocId) -> Option<f64> {
        let (i, j) = (i as usize, j as usize);
        if i < self.n && j < self.n {
            Some(self.data[i * self.n + j])
        } else {
            None
        }
    }

    #[inline]
    pub fn row(&self, i: DocId) -> Option<&[f64]> {
        let i = i as usize;
        if i < self.n {
            Some(&self.data[i * self.n..(i + 1) * self.n])
        } else {
            None
        }
    }
}

/// Build the combined similarity matrix of a corpus.
///
/// `vectorizer` must have been built from the abstract tokens of `corpus`.
/// The cosine signal is a sparse matrix product of the normalized TF-IDF
/// columns: each row accumulates over the postings of its own terms.
pub fn combined_matrix<N, E>(corpus: &Corpus, vectorizer: &TFIDFVectorizer<N, E>, weights: &SimilarityWeights) -> SimilarityMatrix
where
    N: Float + Into<f64> + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    debug_assert_eq!(corpus.len(), vectorizer.doc_num());
    weights.check();
    let n = corpus.len();
    let start = Instant::now();

    let titles = compare::token_sets(corpus.iter().map(|d| d.title_tokens.as_slice()));
    let keywords = compare::token_sets(corpus.iter().map(|d| d.keyword_tokens.as_slice()));
    let term_weights = vectorizer.term_weights();

    let matrix = SimilarityMatrix::from_rows(n, |i, row| {
        // cosine row: Σ_t u[t][i] * u[t][j], dims ascending
        let mut cosine = vec![0.0f64; n];
        for (dim, w) in vectorizer.documents[i].raw_iter() {
            let w: f64 = w.into();
            for &(j, wj) in &term_weights[dim] {
                let wj: f64 = wj.into();
                cosine[j as usize] += w * wj;
            }
        }
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = weights.combine(
                compare::jaccard(&titles[i], &titles[j]),
                compare::jaccard(&keywords[i], &keywords[j]),
                cosine[j],
            );
        }
    });

    debug!(docs = n, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "combined similarity matrix built");
    matrix
}
