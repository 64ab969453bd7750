use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::DocId;

/// Inverted index over the stemmed abstract tokens.
///
/// The vocabulary is kept sorted; a term's position in that order is its
/// dimension in every vector built from this index. The order is part of
/// the contract: two indexes built from the same token lists assign the
/// same dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermIndex {
    /// sorted vocabulary (position = dimension)
    vocab: IndexSet<Box<str>>,
    /// per dimension: doc -> 1-based token positions, docs ascending
    postings: Vec<IndexMap<DocId, Vec<u32>>>,
    doc_num: usize,
}

impl TermIndex {
    /// Build the index from one token list per document.
    /// Document ids are the positions in `docs`.
    pub fn build<T>(docs: &[Vec<T>]) -> Self
    where
        T: AsRef<str>,
    {
        let mut inverted: HashMap<&str, IndexMap<DocId, Vec<u32>>> = HashMap::new();
        for (doc_id, tokens) in docs.iter().enumerate() {
            for (pos, token) in tokens.iter().enumerate() {
                inverted
                    .entry(token.as_ref())
                    .or_default()
                    .entry(doc_id as DocId)
                    .or_default()
                    .push(pos as u32 + 1);
            }
        }

        let mut terms: Vec<&str> = inverted.keys().copied().collect();
        terms.sort_unstable();
        let postings = terms
            .iter()
            .map(|term| inverted.remove(term).unwrap_or_default())
            .collect();
        let vocab = terms.into_iter().map(Box::<str>::from).collect();

        TermIndex {
            vocab,
            postings,
            doc_num: docs.len(),
        }
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.doc_num
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Dimension of `term`, if it is part of the vocabulary.
    #[inline]
    pub fn dim_of(&self, term: &str) -> Option<usize> {
        self.vocab.get_index_of(term)
    }

    /// Term at dimension `dim`.
    #[inline]
    pub fn term(&self, dim: usize) -> Option<&str> {
        self.vocab.get_index(dim).map(|t| &**t)
    }

    /// Sorted vocabulary.
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.vocab.iter().map(|t| &**t)
    }

    /// 1-based positions of `term` inside document `doc`.
    pub fn positions(&self, term: &str, doc: DocId) -> Option<&[u32]> {
        let dim = self.dim_of(term)?;
        self.postings[dim].get(&doc).map(Vec::as_slice)
    }

    /// Documents containing the term at `dim`, ascending.
    pub fn docs_with(&self, dim: usize) -> impl Iterator<Item = DocId> + '_ {
        self.postings
            .get(dim)
            .into_iter()
            .flat_map(|posting| posting.keys().copied())
    }

    /// Raw frequency of the term at `dim` in `doc`.
    pub fn tf(&self, dim: usize, doc: DocId) -> u32 {
        self.postings
            .get(dim)
            .and_then(|posting| posting.get(&doc))
            .map_or(0, |positions| positions.len() as u32)
    }

    /// Number of documents containing each term, by dimension.
    /// Every entry is in `1..=doc_num` since terms only enter the vocabulary
    /// through a document.
    pub fn doc_freq(&self) -> Vec<u32> {
        self.postings.iter().map(|posting| posting.len() as u32).collect()
    }

    /// Materialize the term-document frequency matrix.
    pub fn term_doc_matrix(&self) -> TermDocMatrix {
        let mut columns = vec![Vec::new(); self.doc_num];
        // dims ascending, so each column comes out sorted by dim
        for (dim, posting) in self.postings.iter().enumerate() {
            for (&doc, positions) in posting {
                columns[doc as usize].push((dim as u32, positions.len() as u32));
            }
        }
        TermDocMatrix {
            rows: self.vocab_size(),
            columns,
        }
    }
}

/// Raw term frequencies, rows = vocabulary dimensions, columns = documents.
/// Stored column-wise and sparse: only non-zero cells are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermDocMatrix {
    rows: usize,
    columns: Vec<Vec<(u32, u32)>>,
}

impl TermDocMatrix {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    /// Cell value; zero outside the stored entries.
    pub fn get(&self, dim: usize, doc: DocId) -> u32 {
        self.columns
            .get(doc as usize)
            .and_then(|col| {
                col.binary_search_by_key(&(dim as u32), |&(d, _)| d)
                    .ok()
                    .map(|pos| col[pos].1)
            })
            .unwrap_or(0)
    }

    /// Non-zero `(dim, tf)` cells of one document, ascending by dim.
    pub fn column(&self, doc: DocId) -> &[(u32, u32)] {
        self.columns.get(doc as usize).map_or(&[], Vec::as_slice)
    }

    pub fn columns(&self) -> &[Vec<(u32, u32)>] {
        &self.columns
    }
}
