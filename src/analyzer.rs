//! Text normalization and token filtering.
//!
//! The ranking engine only consumes token lists. This module provides the
//! default text -> tokens pipeline used by the corpus loader and the binary;
//! any other tokenizer can be plugged in through [`Analyzer`].

use std::{collections::HashSet, fmt};

use rust_stemmers::Algorithm;
use unicode_normalization::UnicodeNormalization;

/// Stems tokens. Order-preserving, one output per input token.
pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;

    /// Stem a batch of documents.
    fn stem_batch(&self, docs: Vec<Vec<String>>) -> Vec<Vec<String>> {
        docs.into_iter()
            .map(|tokens| tokens.iter().map(|t| self.stem(t)).collect())
            .collect()
    }
}

/// Leaves tokens untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    #[inline]
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Snowball English stemmer, the default of [`TextAnalyzer`].
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        SnowballStemmer { inner: rust_stemmers::Stemmer::create(Algorithm::English) }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Debug for SnowballStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SnowballStemmer")
    }
}

impl Stemmer for SnowballStemmer {
    #[inline]
    fn stem(&self, token: &str) -> String {
        self.inner.stem(token).into_owned()
    }
}

/// Text -> token sequence.
pub trait Analyzer: Send + Sync {
    /// Lowercase, fold, split and drop stopwords. No stemming.
    fn normalize_and_filter(&self, text: &str) -> Vec<String>;

    /// Stem a token sequence produced by `normalize_and_filter`.
    fn stem_tokens(&self, tokens: Vec<String>) -> Vec<String>;

    /// `normalize_and_filter` followed by stemming.
    fn analyze(&self, text: &str) -> Vec<String> {
        self.stem_tokens(self.normalize_and_filter(text))
    }
}

/// Default analyzer for English/Spanish academic text.
/// Stems with [`SnowballStemmer`] unless another stemmer is given.
#[derive(Debug)]
pub struct TextAnalyzer<S = SnowballStemmer> {
    stopwords: HashSet<&'static str>,
    stemmer: S,
}

impl TextAnalyzer<SnowballStemmer> {
    pub fn new() -> Self {
        Self::with_stemmer(SnowballStemmer::english())
    }
}

impl Default for TextAnalyzer<SnowballStemmer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Stemmer> TextAnalyzer<S> {
    pub fn with_stemmer(stemmer: S) -> Self {
        TextAnalyzer {
            stopwords: ENGLISH_STOPWORDS.iter().chain(SPANISH_STOPWORDS).copied().collect(),
            stemmer,
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

impl<S: Stemmer> Analyzer for TextAnalyzer<S> {
    fn normalize_and_filter(&self, text: &str) -> Vec<String> {
        normalize_text(text)
            .split_whitespace()
            .filter(|t| t.chars().count() > 1 && !self.is_stopword(t))
            .map(str::to_string)
            .collect()
    }

    fn stem_tokens(&self, tokens: Vec<String>) -> Vec<String> {
        tokens.iter().map(|t| self.stemmer.stem(t)).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Letter,
    Digit,
    Other,
}

/// Lowercases, strips diacritics (keeping `ñ`), separates digit runs from
/// letter runs and blanks out everything outside `[a-zñ0-9]`.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = CharClass::Other;
    for c in text.nfd().flat_map(char::to_lowercase) {
        // combining marks are dropped, except the tilde of n + U+0303
        if ('\u{0300}'..='\u{036f}').contains(&c) {
            if c == '\u{0303}' && out.ends_with('n') {
                out.pop();
                out.push('ñ');
            }
            continue;
        }
        let class = match c {
            'a'..='z' | 'ñ' => CharClass::Letter,
            '0'..='9' => CharClass::Digit,
            _ => CharClass::Other,
        };
        match class {
            CharClass::Other => {
                // 空白類も含めてすべて区切りにする
                out.push(' ');
            }
            _ => {
                if prev != CharClass::Other && prev != class {
                    out.push(' ');
                }
                out.push(c);
            }
        }
        prev = class;
    }
    out
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "de", "la", "que", "el", "en", "y", "a", "los", "del", "se", "las", "por", "un", "para",
    "con", "no", "una", "su", "al", "lo", "como", "mas", "pero", "sus", "le", "ya", "o", "este",
    "si", "porque", "esta", "entre", "cuando", "muy", "sin", "sobre", "tambien", "me", "hasta",
    "hay", "donde", "quien", "desde", "todo", "nos", "durante", "todos", "uno", "les", "ni",
    "contra", "otros", "ese", "eso", "ante", "ellos", "e", "esto", "mi", "antes", "algunos",
    "que", "unos", "yo", "otro", "otras", "otra", "el", "tanto", "esa", "estos", "mucho",
    "quienes", "nada", "muchos", "cual", "poco", "ella", "estar", "estas", "algunas", "algo",
    "nosotros", "mis", "tu", "te", "ti", "tus", "ellas", "nosotras", "vosotros", "os", "mio",
    "mia", "tuyo", "tuya", "suyo", "suya", "nuestro", "nuestra", "esos", "esas", "es", "son",
    "fue", "ser", "ha", "han", "era", "sido", "estan", "estaba", "tiene", "tienen",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_but_keeps_enye() {
        assert_eq!(normalize_text("Canción Año"), "cancion año");
        assert_eq!(normalize_text("cancio\u{0301}n an\u{0303}o"), "cancion año");
    }

    #[test]
    fn folds_any_decomposable_accent() {
        assert_eq!(normalize_text("Dvořák"), "dvorak");
        assert_eq!(normalize_text("Škoda"), "skoda");
        assert_eq!(normalize_text("Gdańsk"), "gdansk");
        assert_eq!(normalize_text("Erdős"), "erdos");
        assert_eq!(normalize_text("ÑANDÚ"), "ñandu");
    }

    #[test]
    fn splits_digit_letter_boundaries() {
        assert_eq!(normalize_text("covid19 3d"), "covid 19 3 d");
    }

    #[test]
    fn drops_stopwords_punctuation_and_single_chars() {
        let analyzer = TextAnalyzer::new();
        let tokens = analyzer.normalize_and_filter("The analysis of x-ray images, para la detección!");
        assert_eq!(tokens, vec!["analysis", "ray", "images", "deteccion"]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let analyzer = TextAnalyzer::new();
        assert!(analyzer.analyze("").is_empty());
        assert!(analyzer.analyze("  the of a ").is_empty());
    }

    #[test]
    fn default_analyzer_stems_english() {
        let analyzer = TextAnalyzer::new();
        assert_eq!(analyzer.analyze("Training networks"), vec!["train", "network"]);
        assert_eq!(analyzer.analyze("network"), vec!["network"]);
        assert_eq!(IdentityStemmer.stem("networks"), "networks");
    }

    struct TruncatingStemmer;
    impl Stemmer for TruncatingStemmer {
        fn stem(&self, token: &str) -> String {
            token.chars().take(4).collect()
        }
    }

    #[test]
    fn analyze_applies_stemmer_in_order() {
        let analyzer = TextAnalyzer::with_stemmer(TruncatingStemmer);
        assert_eq!(analyzer.analyze("networks learning"), vec!["netw", "lear"]);
        let batch = TruncatingStemmer.stem_batch(vec![vec!["alpha".into()], vec![]]);
        assert_eq!(batch, vec![vec!["alph".to_string()], vec![]]);
    }
}
