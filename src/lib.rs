//! Ranking engine for academic paper search.
//!
//! A corpus of papers (title, keywords, abstract) is turned once into an
//! immutable [`Model`]: a TF-IDF index over the abstracts and a static
//! document-document similarity matrix combining title overlap, keyword
//! overlap and abstract cosine. Each query then yields a two-tier result:
//! the best matching papers ("principals"), each followed by its most similar
//! papers not shown anywhere else in the response ("additionals").
//!
//! ```
//! use scholar_rank::{Corpus, Model, RankingOptions, SimilarityWeights, TextAnalyzer};
//!
//! let analyzer = TextAnalyzer::new();
//! let corpus = Corpus::from_columns(
//!     &["Graph neural networks", "Protein folding", "Graph databases"],
//!     &["graphs, learning", "biology", "graphs, storage"],
//!     &["Message passing over graphs.", "Predicting protein structures.", "Indexing graphs on disk."],
//!     &analyzer,
//! )
//! .unwrap();
//! let model = Model::build(corpus, &SimilarityWeights::default()).unwrap();
//!
//! let rec = model.search_text("protein structures", &analyzer, &RankingOptions::default());
//! assert_eq!(rec.principals[0].doc, 1);
//! ```

pub mod analyzer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod model;
pub mod ranking;
pub mod similarity;
pub mod snippet;
pub mod utils;
pub mod vectorizer;

/// Document id: the 0-based position of the paper in load order.
pub type DocId = u32;

/// TF-IDF Vectorizer
/// Converts the abstract token lists of a corpus into L2-normalized TF-IDF
/// vectors and scores queries against them.
///
/// Internally, it holds:
/// - The sorted vocabulary and the inverted index (token positions)
/// - The raw term-document frequency matrix
/// - The IDF vector
/// - One normalized sparse TF-IDF vector per document
///
/// `TFIDFVectorizer<N, E>` has the following generic parameters:
/// - `N`: Vector value type (`f32`, `f64`)
/// - `E`: TF-IDF calculation engine type (e.g., `DefaultTFIDFEngine`)
///
/// # Serialization
/// Supported, as part of a [`Model`] snapshot.
pub use vectorizer::TFIDFVectorizer;

/// TF-IDF calculation engine
/// Sublinear term frequency `1 + log10(tf)` and `idf = log10(N / df)`.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Token Frequency structure
/// Counts the occurrences of each token of one token sequence.
pub use vectorizer::token::TokenFrequency;

/// Corpus of papers
/// Documents are identified by their load position. Loads from parallel
/// text columns, from pre-tokenized documents or from a CSV file.
pub use vectorizer::corpus::{Corpus, Document};

/// Query scores
/// `(DocId, score)` pairs, ranked by descending score and ascending id.
pub use vectorizer::evaluate::scoring::Hits;

/// Text analysis
/// Default normalization/stopword pipeline and the seams for custom
/// tokenizers and stemmers.
pub use analyzer::{Analyzer, IdentityStemmer, SnowballStemmer, Stemmer, TextAnalyzer};

/// Built model
/// Read-only after construction; share it by reference across threads.
pub use model::Model;

/// Two-tier ranking
pub use ranking::{Additional, NeighborSource, Principal, RankingOptions, RecommendationStats, Recommendations};

/// Document similarity
pub use similarity::{NeighborGraph, SimilarityMatrix, SimilarityWeights};

/// Semantic ranking over external vectors
pub use embedding::{CborEmbeddingCache, EmbeddingCache, EmbeddingProvider, SemanticIndex, SemanticOptions};

pub use config::EngineConfig;
pub use error::{BuildError, EmbeddingError, RankError};
