//! Semantic ranking over externally supplied dense vectors.
//!
//! Vectors come from an [`EmbeddingProvider`]; the engine only normalizes,
//! compares and ranks them. The document-document neighborhood and the
//! two-tier assembly are the same as for the lexical path.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{BuildError, EmbeddingError, RankError},
    ranking::{recommend, RankingOptions, Recommendations},
    similarity::{NeighborGraph, SimilarityMatrix},
    utils::math::vector::math::{dot_dense, normalize_dense},
    vectorizer::evaluate::scoring::Hits,
    DocId,
};

/// Source of dense text vectors.
pub trait EmbeddingProvider {
    /// One vector per text, in input order.
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Persistent store of document vectors.
pub trait EmbeddingCache {
    /// `None` when nothing usable is stored: missing, unreadable, or not
    /// `rows x dim`.
    fn load(&self, rows: usize, dim: usize) -> Option<Vec<Vec<f32>>>;
    fn store(&self, vectors: &[Vec<f32>]) -> Result<(), BuildError>;
}

/// [`EmbeddingCache`] in a single CBOR file.
#[derive(Debug, Clone)]
pub struct CborEmbeddingCache {
    path: PathBuf,
}

impl CborEmbeddingCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CborEmbeddingCache { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EmbeddingCache for CborEmbeddingCache {
    fn load(&self, rows: usize, dim: usize) -> Option<Vec<Vec<f32>>> {
        let file = File::open(&self.path).ok()?;
        let vectors: Vec<Vec<f32>> = match serde_cbor::from_reader(BufReader::new(file)) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "embedding cache unreadable");
                return None;
            }
        };
        if vectors.len() != rows || vectors.iter().any(|v| v.len() != dim) {
            warn!(path = %self.path.display(), found = vectors.len(), expected = rows, "embedding cache shape mismatch");
            return None;
        }
        Some(vectors)
    }

    fn store(&self, vectors: &[Vec<f32>]) -> Result<(), BuildError> {
        let file = File::create(&self.path)?;
        serde_cbor::to_writer(BufWriter::new(file), &vectors)?;
        debug!(path = %self.path.display(), rows = vectors.len(), "embedding cache written");
        Ok(())
    }
}

/// Thresholds of the semantic path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticOptions {
    /// principals scoring below this are dropped
    pub min_query_score: f64,
    /// additionals less similar than this to their principal are dropped
    pub min_similarity: f64,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        SemanticOptions {
            min_query_score: 0.15,
            min_similarity: 0.1,
        }
    }
}

fn check_dims(vectors: &[Vec<f32>], dim: usize) -> Result<(), RankError> {
    match vectors.iter().find(|v| v.len() != dim) {
        Some(bad) => Err(RankError::DimensionMismatch { expected: dim, found: bad.len() }),
        None => Ok(()),
    }
}

/// Normalized document vectors plus their cosine neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
    graph: NeighborGraph,
}

impl SemanticIndex {
    /// Index one vector per document. Every vector must have length `dim`;
    /// zero vectors are kept and score 0 against everything.
    pub fn from_vectors(mut vectors: Vec<Vec<f32>>, dim: usize) -> Result<Self, RankError> {
        check_dims(&vectors, dim)?;
        let start = Instant::now();
        vectors.par_iter_mut().for_each(|v| normalize_dense(v));

        let n = vectors.len();
        let matrix = SimilarityMatrix::from_rows(n, |i, row| {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = dot_dense(&vectors[i], &vectors[j]) as f64;
            }
        });
        let graph = NeighborGraph::new(matrix);
        info!(docs = n, dim, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "semantic index built");
        Ok(SemanticIndex { dim, vectors, graph })
    }

    /// Use cached vectors when they fit, otherwise embed `texts`, store the
    /// result and index it.
    pub fn load_or_build<C, P>(cache: &C, provider: &P, texts: &[String], dim: usize) -> Result<Self, BuildError>
    where
        C: EmbeddingCache + ?Sized,
        P: EmbeddingProvider + ?Sized,
    {
        if let Some(vectors) = cache.load(texts.len(), dim) {
            info!(docs = texts.len(), "document embeddings loaded from cache");
            return Ok(Self::from_vectors(vectors, dim).map_err(EmbeddingError::from)?);
        }

        info!(docs = texts.len(), "generating document embeddings");
        let vectors = provider.embed_documents(texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch { expected: texts.len(), found: vectors.len() }.into());
        }
        // 不正な行はキャッシュに書かない
        check_dims(&vectors, dim).map_err(EmbeddingError::from)?;
        cache.store(&vectors)?;
        Ok(Self::from_vectors(vectors, dim).map_err(EmbeddingError::from)?)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    /// Cosine of `query` against every document, in document order.
    ///
    /// # Errors
    /// * `EmptyCorpus` - nothing is indexed
    /// * `DimensionMismatch` - `query` is not `dim` long
    pub fn score_vector(&self, query: &[f32]) -> Result<Hits, RankError> {
        if self.vectors.is_empty() {
            return Err(RankError::EmptyCorpus);
        }
        if query.len() != self.dim {
            return Err(RankError::DimensionMismatch { expected: self.dim, found: query.len() });
        }
        let mut query = query.to_vec();
        normalize_dense(&mut query);
        let list = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(doc, v)| (doc as DocId, dot_dense(&query, v) as f64))
            .collect();
        Ok(Hits::new(list))
    }

    /// Two-tier recommendations for a query vector. Counts come from
    /// `ranking`, thresholds from `semantic`.
    pub fn search(&self, query: &[f32], ranking: &RankingOptions, semantic: &SemanticOptions) -> Recommendations {
        let options = RankingOptions {
            min_similarity: semantic.min_similarity,
            min_query_score: Some(semantic.min_query_score),
            ..*ranking
        };
        let hits = self.score_vector(query).map(|hits| hits.top_k(options.principal));
        recommend(hits, &self.graph, &options)
    }

    /// Embed `text` with `provider`, then [`SemanticIndex::search`].
    pub fn search_text<P>(
        &self,
        provider: &P,
        text: &str,
        ranking: &RankingOptions,
        semantic: &SemanticOptions,
    ) -> Result<Recommendations, EmbeddingError>
    where
        P: EmbeddingProvider + ?Sized,
    {
        let query = provider.embed_query(text)?;
        Ok(self.search(&query, ranking, semantic))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// counts of 'a', 'b', 'c' in the text
    #[derive(Default)]
    struct LetterProvider {
        calls: Cell<usize>,
    }

    fn letters(text: &str) -> Vec<f32> {
        ['a', 'b', 'c'].iter().map(|&c| text.chars().filter(|&x| x == c).count() as f32).collect()
    }

    impl EmbeddingProvider for LetterProvider {
        fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.set(self.calls.get() + 1);
            Ok(texts.iter().map(|t| letters(t)).collect())
        }
        fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(letters(text))
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn embed_documents(&self, _: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Provider("quota exceeded".into()))
        }
        fn embed_query(&self, _: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Provider("quota exceeded".into()))
        }
    }

    fn index() -> SemanticIndex {
        SemanticIndex::from_vectors(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.99, 0.01, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
            3,
        )
        .unwrap()
    }

    #[test]
    fn rows_of_wrong_length_are_rejected() {
        let err = SemanticIndex::from_vectors(vec![vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert_eq!(err, RankError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn query_of_wrong_length_is_rejected() {
        let err = index().score_vector(&[1.0, 0.0]).unwrap_err();
        assert_eq!(err, RankError::DimensionMismatch { expected: 3, found: 2 });
    }

    #[test]
    fn empty_index_reports_empty_corpus() {
        let empty = SemanticIndex::from_vectors(Vec::new(), 3).unwrap();
        assert_eq!(empty.score_vector(&[1.0, 0.0, 0.0]).unwrap_err(), RankError::EmptyCorpus);
        let rec = empty.search(&[1.0, 0.0, 0.0], &RankingOptions::default(), &SemanticOptions::default());
        assert_eq!(rec.reason, Some(RankError::EmptyCorpus));
    }

    #[test]
    fn scores_are_cosines() {
        let hits = index().score_vector(&[2.0, 0.0, 0.0]).unwrap();
        assert!((hits.list[0].1 - 1.0).abs() < 1e-6);
        assert!(hits.list[1].1 > 0.99);
        assert_eq!(hits.list[2].1, 0.0);
    }

    #[test]
    fn zero_vectors_score_zero() {
        let index = SemanticIndex::from_vectors(vec![vec![0.0, 0.0], vec![1.0, 1.0]], 2).unwrap();
        let hits = index.score_vector(&[1.0, 0.0]).unwrap();
        assert_eq!(hits.list[0], (0, 0.0));
    }

    #[test]
    fn thresholds_drop_weak_principals_and_additionals() {
        let rec = index().search(&[1.0, 0.0, 0.0], &RankingOptions::default(), &SemanticOptions::default());
        let ids: Vec<DocId> = rec.doc_ids().collect();
        // docs 2 and 3 are orthogonal to the query and to both principals
        assert_eq!(ids, vec![0, 1]);
        assert!(rec.principals.iter().all(|p| p.additional.is_empty()));
    }

    #[test]
    fn additionals_come_from_the_vector_neighborhood() {
        let ranking = RankingOptions { principal: 1, additional: 2, ..Default::default() };
        let rec = index().search(&[1.0, 0.0, 0.0], &ranking, &SemanticOptions::default());
        assert_eq!(rec.principals.len(), 1);
        let extra: Vec<DocId> = rec.principals[0].additional.iter().map(|a| a.doc).collect();
        assert_eq!(extra, vec![1]);
    }

    #[test]
    fn cache_is_filled_then_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CborEmbeddingCache::new(dir.path().join("embeddings.cbor"));
        let texts: Vec<String> = vec!["aab".into(), "ccc".into(), "abc".into()];

        let provider = LetterProvider::default();
        let first = SemanticIndex::load_or_build(&cache, &provider, &texts, 3).unwrap();
        assert_eq!(provider.calls.get(), 1);

        let provider = LetterProvider::default();
        let second = SemanticIndex::load_or_build(&cache, &provider, &texts, 3).unwrap();
        assert_eq!(provider.calls.get(), 0);
        assert_eq!(first, second);
    }

    #[test]
    fn cache_of_another_shape_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CborEmbeddingCache::new(dir.path().join("embeddings.cbor"));
        cache.store(&[vec![1.0, 0.0]]).unwrap();
        assert!(cache.load(1, 3).is_none());
        assert!(cache.load(2, 2).is_none());
        assert!(cache.load(1, 2).is_some());
    }

    #[test]
    fn provider_failure_aborts_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CborEmbeddingCache::new(dir.path().join("missing.cbor"));
        let err = SemanticIndex::load_or_build(&cache, &FailingProvider, &["a".to_string()], 3).unwrap_err();
        assert!(matches!(err, BuildError::Embedding(EmbeddingError::Provider(_))));
        assert!(!cache.path().exists());
    }

    struct ShortProvider;

    impl EmbeddingProvider for ShortProvider {
        fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn embed_query(&self, _: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn wrong_dimension_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CborEmbeddingCache::new(dir.path().join("embeddings.cbor"));
        let texts: Vec<String> = vec!["a".into(), "b".into()];
        let err = SemanticIndex::load_or_build(&cache, &ShortProvider, &texts, 3).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Embedding(EmbeddingError::Rank(RankError::DimensionMismatch { expected: 3, found: 2 }))
        ));
        assert!(!cache.path().exists());
    }

    #[test]
    fn search_text_uses_the_provider() {
        let texts: Vec<String> = vec!["aaa".into(), "bbb".into()];
        let vectors = LetterProvider::default().embed_documents(&texts).unwrap();
        let index = SemanticIndex::from_vectors(vectors, 3).unwrap();
        let rec = index
            .search_text(&LetterProvider::default(), "bb", &RankingOptions::default(), &SemanticOptions::default())
            .unwrap();
        assert_eq!(rec.principals[0].doc, 1);
    }
}
