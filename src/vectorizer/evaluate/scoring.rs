use std::fmt::{self, Debug, Display};

use num::Float;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    error::RankError,
    utils::{math::vector::SpVec, sort},
    vectorizer::{tfidf::TFIDFEngine, TFIDFVectorizer},
    DocId,
};

/// Structure to store search results
#[derive(Clone, PartialEq, Serialize, Default)]
pub struct Hits {
    /// (Document ID, Score)
    pub list: Vec<(DocId, f64)>,
}

impl Hits {
    /// Create a new Hits instance
    pub fn new(list: Vec<(DocId, f64)>) -> Self {
        Hits { list }
    }

    /// Sort results by descending score, ascending id on ties.
    /// NaN scores are removed.
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list.retain(|(_, s)| !s.is_nan());
        sort::rank_desc(&mut self.list);
        self
    }

    /// Keep the `k` best results in ranking order.
    /// When `k` exceeds the number of results every result is kept.
    pub fn top_k(mut self, k: usize) -> Self {
        self.list.retain(|(_, s)| !s.is_nan());
        Hits {
            list: sort::top_k(self.list, k),
        }
    }

    /// Drop results scoring below `min`.
    pub fn retain_min_score(&mut self, min: f64) -> &mut Self {
        self.list.retain(|&(_, s)| s >= min);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DocId, f64)> {
        self.list.iter()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.list.iter().map(|&(doc, _)| doc)
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (doc, score) in &self.list {
                writeln!(f, "    {}: {:.6}", doc, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

impl Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (doc, score) in &self.list {
            writeln!(f, "{:.6}\t{}", score, doc)?;
        }
        Ok(())
    }
}

/// Query scoring
impl<N, E> TFIDFVectorizer<N, E>
where
    N: Float + Into<f64> + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    /// Cosine similarity of a normalized query vector against every
    /// document. Both sides are unit length (or zero), so this is a dot
    /// product per document. Results are in document order.
    pub fn score(&self, query: &SpVec<N>) -> Hits {
        let list = self
            .documents
            .par_iter()
            .enumerate()
            .map(|(doc, vec)| (doc as DocId, query.dot(vec).into()))
            .collect();
        Hits { list }
    }

    /// Vectorize `tokens` and score them against every document, ranked.
    pub fn similarity<T>(&self, tokens: &[T]) -> Result<Hits, RankError>
    where
        T: AsRef<str>,
    {
        let query = self.vectorize_query(tokens)?;
        let mut hits = self.score(&query);
        hits.sort_by_score();
        Ok(hits)
    }

    /// The `k` best documents for `tokens`.
    pub fn search<T>(&self, tokens: &[T], k: usize) -> Result<Hits, RankError>
    where
        T: AsRef<str>,
    {
        let query = self.vectorize_query(tokens)?;
        Ok(self.score(&query).top_k(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer() -> TFIDFVectorizer {
        TFIDFVectorizer::build(&[
            vec!["graph", "neural", "network"],
            vec!["graph", "database"],
            vec!["protein", "folding", "neural"],
            vec!["graph", "database", "index", "database"],
        ])
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let v = vectorizer();
        let hits = v.similarity(&["graph", "database"]).unwrap();
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|&(_, s)| (0.0..=1.0 + 1e-12).contains(&s)));
    }

    #[test]
    fn best_match_ranks_first() {
        let v = vectorizer();
        let hits = v.search(&["protein", "folding"], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits.list[0].0, 2);
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let v = vectorizer();
        let hits = v.search(&["graph"], 50).unwrap();
        assert_eq!(hits.len(), 4);
        let ids: Vec<DocId> = hits.doc_ids().collect();
        // the shortest graph document wins, the document without the term is last
        assert_eq!(ids, vec![1, 0, 3, 2]);
        assert_eq!(hits.list[3].1, 0.0);
    }

    #[test]
    fn ties_are_ordered_by_document_id() {
        let v: TFIDFVectorizer = TFIDFVectorizer::build(&[
            vec!["same", "words"],
            vec!["other"],
            vec!["same", "words"],
        ]);
        let hits = v.search(&["same"], 3).unwrap();
        let ids: Vec<DocId> = hits.doc_ids().collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert_eq!(hits.list[0].1, hits.list[1].1);
    }

    #[test]
    fn hits_helpers() {
        let mut hits = Hits::new(vec![(0, 0.2), (1, f64::NAN), (2, 0.7)]);
        hits.sort_by_score();
        assert_eq!(hits.list, vec![(2, 0.7), (0, 0.2)]);
        hits.retain_min_score(0.5);
        assert_eq!(hits.list, vec![(2, 0.7)]);
        assert_eq!(format!("{}", hits), "0.700000\t2\n");
    }
}
