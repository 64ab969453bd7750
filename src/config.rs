//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "weights": { "abstract": 0.6, "keywords": 0.2 }, "ranking": { "additional": 5 } }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{embedding::SemanticOptions, ranking::RankingOptions, similarity::SimilarityWeights};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: SimilarityWeights,
    pub ranking: RankingOptions,
    pub semantic: SemanticOptions,
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, serde_json::Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(serde_json::Error::io)?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.weights.sum(), 1.0);
        assert_eq!(config.ranking.principal, 10);
        assert_eq!(config.ranking.additional, 3);
        assert_eq!(config.ranking.min_similarity, 0.1);
        assert_eq!(config.semantic.min_query_score, 0.15);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ranking": {{"additional": 5}}, "weights": {{"title": 0.1, "abstract": 0.6}}}}"#).unwrap();
        file.flush().unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.ranking.additional, 5);
        assert_eq!(config.ranking.principal, 10);
        assert_eq!(config.weights, SimilarityWeights { title: 0.1, keywords: 0.3, abstract_text: 0.6 });
        assert_eq!(config.semantic, SemanticOptions::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::from_json_file(dir.path().join("absent.json")).is_err());
    }
}
