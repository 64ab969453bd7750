use std::{fs::File, io::Read, path::Path};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use xxhash_rust::xxh64::Xxh64;

use crate::{analyzer::Analyzer, error::BuildError, DocId};

/// A paper of the corpus.
/// Immutable once the corpus is loaded; `id` is its load position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub keywords: String,
    pub abstract_text: String,
    pub title_tokens: Vec<String>,
    pub keyword_tokens: Vec<String>,
    /// stemmed abstract tokens, the input of the term index
    pub abstract_tokens: Vec<String>,
}

impl Document {
    /// Analyze the three text fields of a paper.
    pub fn analyze<A>(id: DocId, title: &str, keywords: &str, abstract_text: &str, analyzer: &A) -> Self
    where
        A: Analyzer + ?Sized,
    {
        Document {
            id,
            title: title.to_string(),
            keywords: keywords.to_string(),
            abstract_text: abstract_text.to_string(),
            title_tokens: analyzer.analyze(title),
            keyword_tokens: analyzer.analyze(keywords),
            abstract_tokens: analyzer.analyze(abstract_text),
        }
    }
}

/// The loaded document collection.
/// Ids are 0-based, contiguous and equal to the position in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self { documents: Vec::new() }
    }

    /// Build from parallel columns of raw text.
    ///
    /// # Errors
    /// `ColumnLengthMismatch` when the three columns differ in length.
    pub fn from_columns<S, A>(titles: &[S], keywords: &[S], abstracts: &[S], analyzer: &A) -> Result<Self, BuildError>
    where
        S: AsRef<str> + Sync,
        A: Analyzer + ?Sized,
    {
        if titles.len() != keywords.len() || titles.len() != abstracts.len() {
            return Err(BuildError::ColumnLengthMismatch {
                titles: titles.len(),
                keywords: keywords.len(),
                abstracts: abstracts.len(),
            });
        }
        let documents = (0..titles.len())
            .into_par_iter()
            .map(|i| {
                Document::analyze(
                    i as DocId,
                    titles[i].as_ref(),
                    keywords[i].as_ref(),
                    abstracts[i].as_ref(),
                    analyzer,
                )
            })
            .collect();
        Ok(Self { documents })
    }

    /// Build from already tokenized documents. Raw text fields are left
    /// empty except the title, which is the joined title tokens.
    pub fn from_tokens(docs: Vec<(Vec<String>, Vec<String>, Vec<String>)>) -> Self {
        let documents = docs
            .into_iter()
            .enumerate()
            .map(|(i, (title_tokens, keyword_tokens, abstract_tokens))| Document {
                id: i as DocId,
                title: title_tokens.join(" "),
                keywords: keyword_tokens.join(", "),
                abstract_text: abstract_tokens.join(" "),
                title_tokens,
                keyword_tokens,
                abstract_tokens,
            })
            .collect();
        Self { documents }
    }

    /// Load a headered CSV file with `title`, `keywords` and `abstract`
    /// columns.
    pub fn from_csv<P, A>(path: P, analyzer: &A) -> Result<Self, BuildError>
    where
        P: AsRef<Path>,
        A: Analyzer + ?Sized,
    {
        let path = path.as_ref();
        info!(path = %path.display(), "loading corpus");
        let file = File::open(path)?;
        Self::from_csv_reader(file, analyzer)
    }

    /// Same as [`Corpus::from_csv`] over any reader.
    /// Column names are matched case-insensitively; fields that are not
    /// valid UTF-8 are decoded as Latin-1.
    pub fn from_csv_reader<R, A>(reader: R, analyzer: &A) -> Result<Self, BuildError>
    where
        R: Read,
        A: Analyzer + ?Sized,
    {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.byte_headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| decode_field(h).trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
                .ok_or(BuildError::MissingColumn(name))
        };
        let (title_col, keywords_col, abstract_col) = (column("title")?, column("keywords")?, column("abstract")?);

        let mut titles = Vec::new();
        let mut keywords = Vec::new();
        let mut abstracts = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let field = |col: usize| record.get(col).map(decode_field).unwrap_or_default();
            titles.push(field(title_col));
            keywords.push(field(keywords_col));
            abstracts.push(field(abstract_col));
        }
        debug!(rows = titles.len(), "csv rows read");
        Self::from_columns(&titles, &keywords, &abstracts, analyzer)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// XXH64 (seed 0) of the raw text of every document, in order.
    /// The value is fixed across builds and toolchains, so a persisted model
    /// can be checked against the corpus it was built from.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        hasher.update(&(self.documents.len() as u64).to_le_bytes());
        for doc in &self.documents {
            for field in [&doc.title, &doc.keywords, &doc.abstract_text] {
                // 長さ接頭辞で区切る
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        hasher.digest()
    }
}

/// UTF-8 when valid, Latin-1 otherwise.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
