pub mod corpus;
pub mod evaluate;
pub mod index;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use num::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    utils::math::vector::SpVec,
    vectorizer::{
        index::{TermDocMatrix, TermIndex},
        tfidf::{DefaultTFIDFEngine, IDFVector, TFIDFEngine},
    },
    DocId,
};

/// TF-IDF model over the (stemmed) abstract tokens of a corpus.
///
/// Built once from one token list per document and never mutated afterwards.
/// Holds:
/// - the term index (sorted vocabulary, inverted index with positions)
/// - the raw term-document frequency matrix
/// - the IDF vector
/// - one L2-normalized TF-IDF vector per document
///
/// `TFIDFVectorizer<N, E>`:
/// - `N`: vector value type (`f32`, `f64`)
/// - `E`: weighting engine (`DefaultTFIDFEngine`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TFIDFVectorizer<N = f64, E = DefaultTFIDFEngine> {
    /// term index
    pub index: TermIndex,
    /// raw frequencies, rows = terms, columns = documents
    pub tdm: TermDocMatrix,
    /// IDF Vector
    pub idf: IDFVector<N>,
    /// normalized TF-IDF vector per document (the matrix columns)
    pub documents: Vec<SpVec<N>>,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<N, E> TFIDFVectorizer<N, E>
where
    N: Float + Into<f64> + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    /// Build the model from one token list per document.
    /// Document ids are positions in `docs`. Never fails: an empty corpus
    /// gives empty structures, a document without tokens an all-zero column.
    pub fn build<T>(docs: &[Vec<T>]) -> Self
    where
        T: AsRef<str>,
    {
        let index = TermIndex::build(docs);
        let tdm = index.term_doc_matrix();
        let idf = E::idf_vec(&index.doc_freq(), index.doc_num() as u64);
        let documents = tdm
            .columns()
            .par_iter()
            .map(|col| E::tfidf_vec(col, &idf))
            .collect();
        TFIDFVectorizer {
            index,
            tdm,
            idf,
            documents,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.index.vocab_size()
    }

    /// Check if the token exists in the vocabulary
    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.index.dim_of(token).is_some()
    }

    /// Normalized TF-IDF vector of `doc`.
    #[inline]
    pub fn document(&self, doc: DocId) -> Option<&SpVec<N>> {
        self.documents.get(doc as usize)
    }

    /// Term-major view of the normalized matrix: per dimension, the
    /// `(doc, weight)` pairs with a non-zero weight, docs ascending.
    pub fn term_weights(&self) -> Vec<Vec<(DocId, N)>> {
        let mut rows = vec![Vec::new(); self.vocab_size()];
        for (doc, vec) in self.documents.iter().enumerate() {
            for (dim, w) in vec.raw_iter() {
                rows[dim].push((doc as DocId, w));
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(docs: &[Vec<&str>]) -> TFIDFVectorizer {
        TFIDFVectorizer::build(docs)
    }

    #[test]
    fn every_column_is_unit_length_or_all_zero() {
        let v = build(&[
            vec!["graph", "graph", "neural"],
            vec!["graph"],
            vec![],
            vec!["protein", "fold", "graph"],
        ]);
        assert_eq!(v.doc_num(), 4);
        for doc in &v.documents {
            let norm = doc.norm();
            if doc.nnz() == 0 {
                assert_eq!(norm, 0.0);
            } else {
                assert!((norm - 1.0).abs() < 1e-12, "norm = {norm}");
            }
        }
        // graph is in 3 of 4 docs, doc 1 only has graph
        assert_eq!(v.document(1).map(|d| d.nnz()), Some(1));
        assert_eq!(v.document(2).map(|d| d.nnz()), Some(0));
    }

    #[test]
    fn term_in_every_document_has_zero_weight() {
        let v = build(&[vec!["common", "alpha"], vec!["common", "beta"]]);
        let dim = v.index.dim_of("common").unwrap();
        assert_eq!(v.idf.get(dim), 0.0);
        assert!(v.documents.iter().all(|d| d.get(dim) == 0.0));
    }

    #[test]
    fn rebuild_is_bit_identical() {
        let docs = vec![vec!["a1", "b2", "a1"], vec!["b2", "c3"], vec!["c3", "d4", "a1"]];
        let first = build(&docs);
        let second = build(&docs);
        assert_eq!(first.idf, second.idf);
        assert_eq!(first.documents, second.documents);
    }

    #[test]
    fn term_weights_transpose_documents() {
        let v = build(&[vec!["x1", "y1"], vec!["y1", "z1"], vec!["z1"]]);
        let rows = v.term_weights();
        assert_eq!(rows.len(), v.vocab_size());
        for (dim, row) in rows.iter().enumerate() {
            for &(doc, w) in row {
                assert_eq!(v.documents[doc as usize].get(dim), w);
            }
        }
    }

    #[test]
    fn empty_corpus() {
        let v = build(&[]);
        assert_eq!(v.doc_num(), 0);
        assert_eq!(v.vocab_size(), 0);
        assert!(v.idf.is_empty());
    }
}
