pub mod math;

use num::Float;
use serde::{Deserialize, Serialize};

/// SpVecは0要素を疎とした疎ベクトルです
/// `inds` は非ゼロ要素のインデックス、`vals` はその値を保持します
///
/// Invariant: `inds` is strictly ascending and every index is `< len`.
/// Explicit zeros may be stored; they do not change any product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpVec<N = f64> {
    inds: Vec<u32>,
    vals: Vec<N>,
    len: usize,
}

impl<N> SpVec<N>
where
    N: Float,
{
    /// An all-zero vector of dimension `len`.
    #[inline]
    pub fn new(len: usize) -> Self {
        SpVec {
            inds: Vec::new(),
            vals: Vec::new(),
            len,
        }
    }

    #[inline]
    pub fn with_capacity(len: usize, nnz: usize) -> Self {
        SpVec {
            inds: Vec::with_capacity(nnz),
            vals: Vec::with_capacity(nnz),
            len,
        }
    }

    /// Append an element; `index` must be greater than every stored index.
    #[inline]
    pub fn push(&mut self, index: u32, value: N) {
        debug_assert!((index as usize) < self.len, "index {index} out of range {}", self.len);
        debug_assert!(self.inds.last().map_or(true, |&last| last < index), "indices must be ascending");
        self.inds.push(index);
        self.vals.push(value);
    }

    /// Logical dimension.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored elements.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    /// Iterate stored `(index, value)` pairs in ascending index order.
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.inds.iter().map(|&i| i as usize).zip(self.vals.iter().copied())
    }

    /// Value at `index`, zero when not stored.
    pub fn get(&self, index: usize) -> N {
        match self.inds.binary_search(&(index as u32)) {
            Ok(pos) => self.vals[pos],
            Err(_) => N::zero(),
        }
    }

    pub fn shrink_to_fit(&mut self) {
        self.inds.shrink_to_fit();
        self.vals.shrink_to_fit();
    }
}
