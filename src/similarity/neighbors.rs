use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ranking::NeighborSource, similarity::SimilarityMatrix, utils::sort::cmp_score_desc, DocId};

/// A similarity matrix plus, for every document, all other documents ranked
/// by descending similarity (ascending id on ties). A document never appears
/// in its own list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborGraph {
    matrix: SimilarityMatrix,
    ranked: Vec<Vec<DocId>>,
}

impl NeighborGraph {
    pub fn new(matrix: SimilarityMatrix) -> Self {
        let start = Instant::now();
        let n = matrix.size();
        let ranked = (0..n)
            .into_par_iter()
            .map(|i| {
                let row = matrix.row(i as DocId).unwrap_or_default();
                let mut list: Vec<(DocId, f64)> = row
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(j, &s)| (j as DocId, s))
                    .collect();
                list.sort_unstable_by(cmp_score_desc);
                list.into_iter().map(|(j, _)| j).collect()
            })
            .collect();
        debug!(docs = n, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "neighbor lists ranked");
        NeighborGraph { matrix, ranked }
    }

    #[inline]
    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// The `k` nearest documents of `doc` that are not in `exclude`,
    /// with their similarity.
    pub fn nearest(&self, doc: DocId, k: usize, exclude: &[DocId]) -> Vec<(DocId, f64)> {
        self.neighbors(doc)
            .iter()
            .copied()
            .filter(|j| !exclude.contains(j))
            .take(k)
            .filter_map(|j| self.matrix.get(doc, j).map(|s| (j, s)))
            .collect()
    }
}

impl NeighborSource for NeighborGraph {
    fn neighbors(&self, doc: DocId) -> &[DocId] {
        self.ranked.get(doc as usize).map_or(&[], Vec::as_slice)
    }

    /// 0 for ids outside the graph.
    fn similarity(&self, a: DocId, b: DocId) -> f64 {
        self.matrix.get(a, b).unwrap_or(0.0)
    }
}
