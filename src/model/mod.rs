//! The built ranking model: corpus, TF-IDF index and document neighborhood.

pub mod snapshot;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    analyzer::Analyzer,
    error::BuildError,
    ranking::{recommend, NeighborSource, RankingOptions, Recommendations},
    similarity::{combined_matrix, NeighborGraph, SimilarityWeights},
    vectorizer::{
        corpus::{Corpus, Document},
        TFIDFVectorizer,
    },
    DocId,
};

/// Everything needed to answer queries.
/// Built once at startup; read-only afterwards and shared by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    corpus: Corpus,
    vectorizer: TFIDFVectorizer,
    graph: NeighborGraph,
    weights: SimilarityWeights,
}

impl Model {
    /// Build every structure of the model.
    ///
    /// An empty corpus gives an empty model whose queries all report
    /// `EmptyCorpus`.
    ///
    /// # Errors
    /// `EmptyVocabulary` when the corpus has documents but no abstract
    /// produced a single token.
    pub fn build(corpus: Corpus, weights: &SimilarityWeights) -> Result<Self, BuildError> {
        let total = Instant::now();
        info!(docs = corpus.len(), "building model");

        let start = Instant::now();
        let abstracts: Vec<Vec<&str>> = corpus
            .iter()
            .map(|d| d.abstract_tokens.iter().map(String::as_str).collect())
            .collect();
        let vectorizer: TFIDFVectorizer = TFIDFVectorizer::build(&abstracts);
        if !corpus.is_empty() && vectorizer.vocab_size() == 0 {
            return Err(BuildError::EmptyVocabulary { docs: corpus.len() });
        }
        info!(
            vocab = vectorizer.vocab_size(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "tf-idf index built"
        );

        let start = Instant::now();
        let matrix = combined_matrix(&corpus, &vectorizer, weights);
        info!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "similarity matrix built");

        let start = Instant::now();
        let graph = NeighborGraph::new(matrix);
        info!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "neighbor lists built");

        info!(elapsed_ms = total.elapsed().as_secs_f64() * 1000.0, "model ready");
        Ok(Model {
            corpus,
            vectorizer,
            graph,
            weights: *weights,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn document(&self, doc: DocId) -> Option<&Document> {
        self.corpus.get(doc)
    }

    pub fn vectorizer(&self) -> &TFIDFVectorizer {
        &self.vectorizer
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    /// Two-tier recommendations for already analyzed query tokens.
    /// Request errors are reported in [`Recommendations::reason`].
    pub fn search<T: AsRef<str>>(&self, tokens: &[T], options: &RankingOptions) -> Recommendations {
        let start = Instant::now();
        // 閾値は降順で単調なので先に top-k にしても結果は同じ
        let hits = self.vectorizer.search(tokens, options.principal);
        let rec = recommend(hits, &self.graph, options);
        debug!(
            tokens = tokens.len(),
            principals = rec.principals.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "query ranked"
        );
        rec
    }

    /// Analyze raw query text, then [`Model::search`].
    pub fn search_text<A>(&self, text: &str, analyzer: &A, options: &RankingOptions) -> Recommendations
    where
        A: Analyzer + ?Sized,
    {
        let tokens = analyzer.analyze(text);
        self.search(&tokens, options)
    }

    /// Documents most similar to `doc`, skipping `exclude`.
    /// Unknown ids give an empty list.
    pub fn related(&self, doc: DocId, k: usize, exclude: &[DocId]) -> Vec<(DocId, f64)> {
        self.graph.nearest(doc, k, exclude)
    }

    /// Precomputed similarity of two documents; `None` for an unknown id.
    pub fn similarity(&self, a: DocId, b: DocId) -> Option<f64> {
        self.graph.matrix().get(a, b)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{analyzer::TextAnalyzer, error::RankError};

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn graph_corpus() -> Corpus {
        Corpus::from_tokens(vec![
            (toks("graph learn"), toks("gnn graph"), toks("messag pass graph neural network")),
            (toks("graph learn"), toks("gnn graph"), toks("messag pass graph neural network")),
            (toks("protein fold"), toks("biolog"), toks("amino acid chain structur predict")),
        ])
    }

    fn five_doc_corpus() -> Corpus {
        Corpus::from_tokens(vec![
            (toks("deep learn vision"), toks("cnn"), toks("convolut network imag classif")),
            (toks("deep learn speech"), toks("rnn"), toks("recurr network audio transcript")),
            (toks("imag segment"), toks("cnn segment"), toks("convolut imag pixel label")),
            (toks("languag model"), toks("transform"), toks("attent network text generat")),
            (toks("speech synthes"), toks("audio"), toks("audio waveform generat")),
        ])
    }

    fn model(corpus: Corpus) -> Model {
        Model::build(corpus, &SimilarityWeights::default()).unwrap()
    }

    #[test]
    fn identical_documents_are_each_others_neighbors() {
        let model = model(graph_corpus());
        assert!((model.similarity(0, 1).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(model.similarity(0, 2), Some(0.0));
        assert_eq!(model.graph().neighbors(0)[0], 1);
        assert_eq!(model.graph().neighbors(1)[0], 0);

        let rec = model.search(&["amino", "acid"], &RankingOptions::default());
        assert_eq!(rec.principals[0].doc, 2);
    }

    #[test]
    fn unmatched_query_gets_reason_code() {
        let model = model(graph_corpus());
        let rec = model.search(&["quantum"], &RankingOptions::default());
        assert!(rec.is_empty());
        assert_eq!(rec.reason, Some(RankError::NoVocabularyMatch));

        let empty: [&str; 0] = [];
        let rec = model.search(&empty, &RankingOptions::default());
        assert_eq!(rec.reason, Some(RankError::EmptyQuery));
    }

    #[test]
    fn empty_corpus_builds_but_cannot_be_queried() {
        let model = model(Corpus::new());
        assert!(model.is_empty());
        let empty: [&str; 0] = [];
        assert_eq!(model.search(&empty, &RankingOptions::default()).reason, Some(RankError::EmptyCorpus));
        assert_eq!(model.search(&["graph"], &RankingOptions::default()).reason, Some(RankError::EmptyCorpus));
    }

    #[test]
    fn documents_without_any_abstract_token_are_rejected() {
        let corpus = Corpus::from_tokens(vec![(toks("title"), toks(""), toks("")), (toks("other"), toks(""), toks(""))]);
        let err = Model::build(corpus, &SimilarityWeights::default()).unwrap_err();
        assert!(matches!(err, BuildError::EmptyVocabulary { docs: 2 }));
    }

    #[test]
    fn two_principals_one_additional_each() {
        let model = model(five_doc_corpus());
        let options = RankingOptions { principal: 2, additional: 1, min_similarity: 0.0, ..Default::default() };
        let rec = model.search(&["convolut", "imag"], &options);

        assert_eq!(rec.principals.len(), 2);
        assert!(rec.principals.iter().all(|p| p.additional.len() == 1));
        let ids: Vec<DocId> = rec.doc_ids().collect();
        let unique: HashSet<DocId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(unique.len(), 4);
        assert_eq!(rec.stats().total_unique, 4);
    }

    #[test]
    fn principals_follow_query_scores() {
        let model = model(five_doc_corpus());
        let options = RankingOptions { principal: 2, additional: 0, ..Default::default() };
        let rec = model.search(&["audio"], &options);
        let ids: Vec<DocId> = rec.doc_ids().collect();
        // audio carries a larger share of doc 4's shorter abstract
        assert_eq!(ids, vec![4, 1]);
        assert!(rec.principals[0].score > rec.principals[1].score);
    }

    #[test]
    fn rebuild_is_bit_identical() {
        let a = model(five_doc_corpus());
        let b = model(five_doc_corpus());
        assert_eq!(a.graph(), b.graph());
        assert_eq!(a.vectorizer().documents, b.vectorizer().documents);
    }

    #[test]
    fn related_skips_excluded_documents() {
        let model = model(graph_corpus());
        let related = model.related(0, 2, &[1]);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].0, 2);
        assert!(model.related(42, 3, &[]).is_empty());
    }

    #[test]
    fn unknown_ids_do_not_panic() {
        let model = model(graph_corpus());
        assert_eq!(model.similarity(0, 5), None);
        assert_eq!(model.similarity(7, 0), None);
        assert!(model.related(5, 3, &[]).is_empty());
        assert!(model.document(5).is_none());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn model_is_shareable_across_threads() {
        assert_send_sync::<Model>();
        assert_send_sync::<TextAnalyzer>();

        let model = model(five_doc_corpus());
        let options = RankingOptions::default();
        let expected = model.search(&["audio"], &options);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| model.search(&["audio"], &options))).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn search_text_runs_the_analyzer() {
        let corpus = Corpus::from_columns(
            &["Graph networks", "Protein folding"],
            &["graphs", "biology"],
            &["Message passing on graphs.", "Predicting protein structures."],
            &TextAnalyzer::new(),
        )
        .unwrap();
        let model = model(corpus);
        let rec = model.search_text("The PROTEIN structures", &TextAnalyzer::new(), &RankingOptions::default());
        assert_eq!(rec.principals[0].doc, 1);
    }
}
