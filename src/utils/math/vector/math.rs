use std::cmp::Ordering;

use num::Float;

use super::SpVec;

impl<N> SpVec<N>
where
    N: Float,
{
    /// ドット積
    ///
    /// Merge walk over both index lists; products are accumulated in ascending
    /// index order, so `a.dot(&b)` and `b.dot(&a)` are bit-identical.
    pub fn dot(&self, other: &Self) -> N {
        debug_assert_eq!(self.len(), other.len(), "Vectors must be of the same length to compute dot product.");
        let mut a_it = self.raw_iter();
        let mut b_it = other.raw_iter();
        let mut a_next = a_it.next();
        let mut b_next = b_it.next();
        let mut result = N::zero();
        while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
            match ia.cmp(&ib) {
                Ordering::Equal => {
                    result = result + va * vb;
                    a_next = a_it.next();
                    b_next = b_it.next();
                }
                Ordering::Less => a_next = a_it.next(),
                Ordering::Greater => b_next = b_it.next(),
            }
        }
        result
    }

    /// L2 norm
    pub fn norm(&self) -> N {
        l2_norm(self.raw_iter().map(|(_, v)| v))
    }

    /// Scale to unit L2 norm.
    /// A zero vector stays zero (ゼロ除算ガード).
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > N::zero() {
            for v in self.vals.iter_mut() {
                *v = *v / norm;
            }
        }
    }
}

/// L2 norm of a value stream.
#[inline]
pub fn l2_norm<N: Float>(vals: impl Iterator<Item = N>) -> N {
    vals.fold(N::zero(), |acc, v| acc + v * v).sqrt()
}

/// Dense dot product; both slices must have the same length.
#[inline]
pub fn dot_dense<N: Float>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Scale a dense vector to unit L2 norm, zero vectors are left as they are.
pub fn normalize_dense<N: Float>(vec: &mut [N]) {
    let norm = l2_norm(vec.iter().copied());
    if norm > N::zero() {
        vec.iter_mut().for_each(|v| *v = *v / norm);
    }
}
