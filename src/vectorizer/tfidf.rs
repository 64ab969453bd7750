use num::Float;
use serde::{Deserialize, Serialize};

use crate::utils::math::vector::SpVec;

/// IDF vector indexed by vocabulary dimension.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IDFVector<N = f64> {
    /// IDF Vector it is not sparse because it is mostly filled
    pub idf_vec: Vec<N>,
    /// document count
    pub doc_num: u64,
}

impl<N: Float> IDFVector<N> {
    pub fn new() -> Self {
        Self {
            idf_vec: Vec::new(),
            doc_num: 0,
        }
    }

    #[inline]
    pub fn get(&self, dim: usize) -> N {
        self.idf_vec.get(dim).copied().unwrap_or_else(N::zero)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.idf_vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idf_vec.is_empty()
    }
}

impl<N: Float> Default for IDFVector<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// TF-IDF weighting scheme.
///
/// Vectors produced through `tfidf_vec` are L2-normalized, so the cosine of
/// two of them is their dot product.
pub trait TFIDFEngine<N>
where
    N: Float,
{
    /// Weighted term frequency, zero for `tf == 0`.
    fn tf_weight(tf: u32) -> N;

    /// Inverse document frequency of a term found in `doc_freq` of `doc_num`
    /// documents.
    fn idf(doc_num: u64, doc_freq: u32) -> N;

    /// IDFベクトルを生成する
    /// # Arguments
    /// * `doc_freq` - document frequency per dimension
    /// * `doc_num` - corpus size
    fn idf_vec(doc_freq: &[u32], doc_num: u64) -> IDFVector<N> {
        IDFVector {
            idf_vec: doc_freq.iter().map(|&df| Self::idf(doc_num, df)).collect(),
            doc_num,
        }
    }

    /// Normalized TF-IDF vector from `(dim, tf)` counts sorted by dim.
    /// A vector without weight stays all-zero.
    fn tfidf_vec(counts: &[(u32, u32)], idf: &IDFVector<N>) -> SpVec<N> {
        let mut vec = SpVec::with_capacity(idf.len(), counts.len());
        for &(dim, tf) in counts {
            let w = Self::tf_weight(tf) * idf.get(dim as usize);
            if w != N::zero() {
                vec.push(dim, w);
            }
        }
        vec.normalize();
        vec.shrink_to_fit();
        vec
    }
}

/// デフォルトのTF-IDFエンジン
/// - `wtf(tf) = 1 + log10(tf)` for `tf > 0`
/// - `idf(t) = log10(N / df(t))`
///
/// `f32` and `f64` are supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine<f64> for DefaultTFIDFEngine {
    #[inline]
    fn tf_weight(tf: u32) -> f64 {
        if tf == 0 {
            0.0
        } else {
            1.0 + (tf as f64).log10()
        }
    }

    #[inline]
    fn idf(doc_num: u64, doc_freq: u32) -> f64 {
        // df = 0 cannot come out of the index; guard anyway so the value stays finite
        if doc_freq == 0 {
            return 0.0;
        }
        (doc_num as f64 / doc_freq as f64).log10()
    }
}

impl TFIDFEngine<f32> for DefaultTFIDFEngine {
    #[inline]
    fn tf_weight(tf: u32) -> f32 {
        <Self as TFIDFEngine<f64>>::tf_weight(tf) as f32
    }

    #[inline]
    fn idf(doc_num: u64, doc_freq: u32) -> f32 {
        <Self as TFIDFEngine<f64>>::idf(doc_num, doc_freq) as f32
    }
}
