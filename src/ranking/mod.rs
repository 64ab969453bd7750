//! Two-tier result assembly.
//!
//! Principals come from query scores; each principal is then expanded with
//! its nearest documents from a precomputed neighbor source. Ids are never
//! repeated anywhere in one response.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::RankError, vectorizer::evaluate::scoring::Hits, DocId};

/// Precomputed document-document neighborhood.
pub trait NeighborSource {
    /// Every other document, most similar first.
    fn neighbors(&self, doc: DocId) -> &[DocId];
    /// Pairwise similarity of two documents.
    fn similarity(&self, a: DocId, b: DocId) -> f64;
}

/// Per-request ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    /// number of principal results
    pub principal: usize,
    /// additional results per principal
    pub additional: usize,
    /// additionals less similar than this to their principal are dropped
    pub min_similarity: f64,
    /// principals scoring below this are dropped
    pub min_query_score: Option<f64>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        RankingOptions {
            principal: 10,
            additional: 3,
            min_similarity: 0.1,
            min_query_score: None,
        }
    }
}

/// A document attached to a principal through precomputed similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Additional {
    pub doc: DocId,
    /// similarity to the anchoring principal
    pub similarity: f64,
}

/// A top-ranked document for the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub doc: DocId,
    /// 1-based position in the ranking
    pub rank: usize,
    pub score: f64,
    pub additional: Vec<Additional>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecommendationStats {
    pub principals: usize,
    pub additionals: usize,
    pub total_unique: usize,
}

/// Response of one query. Empty with a `reason` when the query could not be
/// scored.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Recommendations {
    pub principals: Vec<Principal>,
    pub reason: Option<RankError>,
}

impl Recommendations {
    pub fn empty(reason: RankError) -> Self {
        Recommendations {
            principals: Vec::new(),
            reason: Some(reason),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    pub fn stats(&self) -> RecommendationStats {
        let principals = self.principals.len();
        let additionals = self.principals.iter().map(|p| p.additional.len()).sum();
        RecommendationStats {
            principals,
            additionals,
            total_unique: principals + additionals,
        }
    }

    /// Every id of the response: each principal followed by its additionals.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.principals
            .iter()
            .flat_map(|p| std::iter::once(p.doc).chain(p.additional.iter().map(|a| a.doc)))
    }
}

/// Assemble the two-tier response.
///
/// 1. the first `options.principal` hits become principals and are marked seen
/// 2. each principal, in ranking order, walks its neighbor list and takes the
///    first `options.additional` unseen documents, marking each one seen at
///    once, so a document is attached to the first principal that reaches it
/// 3. the walk stops at the first neighbor below `options.min_similarity`
///
/// `hits` must already be in ranking order.
pub fn recommend<G>(hits: Result<Hits, RankError>, graph: &G, options: &RankingOptions) -> Recommendations
where
    G: NeighborSource + ?Sized,
{
    let hits = match hits {
        Ok(hits) => hits,
        Err(reason) => {
            debug!(code = reason.code(), "query produced no principals");
            return Recommendations::empty(reason);
        }
    };

    let principals: Vec<(DocId, f64)> = hits
        .list
        .into_iter()
        .filter(|&(_, score)| options.min_query_score.map_or(true, |min| score >= min))
        .take(options.principal)
        .collect();

    let mut seen: HashSet<DocId> = principals.iter().map(|&(doc, _)| doc).collect();
    let mut result = Vec::with_capacity(principals.len());
    for (rank, (doc, score)) in principals.into_iter().enumerate() {
        let mut additional = Vec::with_capacity(options.additional);
        if options.additional > 0 {
            for &candidate in graph.neighbors(doc) {
                let similarity = graph.similarity(doc, candidate);
                // 降順なので以降もすべて下限未満
                if similarity < options.min_similarity {
                    break;
                }
                if seen.insert(candidate) {
                    additional.push(Additional { doc: candidate, similarity });
                    if additional.len() >= options.additional {
                        break;
                    }
                }
            }
        }
        result.push(Principal {
            doc,
            rank: rank + 1,
            score,
            additional,
        });
    }

    Recommendations {
        principals: result,
        reason: None,
    }
}
