use serde::Serialize;
use thiserror::Error;

/// Request-level failures.
/// None of these are fatal: the ranking layer turns them into an empty
/// result carrying the error as its reason code.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RankError {
    /// tokenization produced no tokens at all
    #[error("the query contains no valid terms")]
    EmptyQuery,
    /// tokens exist but none of them is part of the vocabulary
    #[error("no query term matches the vocabulary")]
    NoVocabularyMatch,
    /// the model was built over zero documents
    #[error("the corpus is empty")]
    EmptyCorpus,
    /// an external vector does not have the indexed dimensionality
    #[error("vector dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

impl RankError {
    /// Stable reason code, identical to the serialized `code` tag.
    pub fn code(&self) -> &'static str {
        match self {
            RankError::EmptyQuery => "empty_query",
            RankError::NoVocabularyMatch => "no_vocabulary_match",
            RankError::EmptyCorpus => "empty_corpus",
            RankError::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

/// Failures of an external embedding provider or of the vectors it returns.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(String),
    #[error("provider returned {found} vectors for {expected} texts")]
    CountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Rank(#[from] RankError),
}

/// Startup failures. Any of these aborts model construction; a partially
/// built model is never served.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("corpus columns differ in length: titles={titles}, keywords={keywords}, abstracts={abstracts}")]
    ColumnLengthMismatch {
        titles: usize,
        keywords: usize,
        abstracts: usize,
    },
    #[error("the abstracts of {docs} documents produced an empty vocabulary")]
    EmptyVocabulary { docs: usize },
    #[error("missing CSV column `{0}`")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_cbor::Error),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
