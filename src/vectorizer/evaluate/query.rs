use num::Float;

use crate::{
    error::RankError,
    utils::{math::vector::SpVec, sort::radix_sort_u32_soa},
    vectorizer::{tfidf::TFIDFEngine, token::TokenFrequency, TFIDFVectorizer},
};

/// Query vectorization
impl<N, E> TFIDFVectorizer<N, E>
where
    N: Float + Into<f64> + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    /// Map query tokens (normalized and stemmed like the abstracts) into the
    /// document TF-IDF space.
    ///
    /// Out-of-vocabulary tokens are ignored. Matching tokens are counted,
    /// weighted and normalized exactly like a document column.
    ///
    /// # Errors
    /// * `EmptyCorpus` - the model holds no documents
    /// * `EmptyQuery` - `tokens` is empty
    /// * `NoVocabularyMatch` - no token is part of the vocabulary
    pub fn vectorize_query<T>(&self, tokens: &[T]) -> Result<SpVec<N>, RankError>
    where
        T: AsRef<str>,
    {
        if self.doc_num() == 0 {
            return Err(RankError::EmptyCorpus);
        }
        if tokens.is_empty() {
            return Err(RankError::EmptyQuery);
        }

        let mut freq = TokenFrequency::new();
        freq.add_tokens(tokens);
        let (mut dims, mut counts): (Vec<u32>, Vec<u32>) = freq
            .iter()
            .filter_map(|(token, count)| self.index.dim_of(token).map(|dim| (dim as u32, count)))
            .unzip();
        if dims.is_empty() {
            return Err(RankError::NoVocabularyMatch);
        }

        // トークン出現順 -> 次元昇順
        radix_sort_u32_soa(&mut dims, &mut counts);
        let pairs: Vec<(u32, u32)> = dims.into_iter().zip(counts).collect();
        Ok(E::tfidf_vec(&pairs, &self.idf))
    }
}
