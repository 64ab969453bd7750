use std::cmp::Ordering;

use crate::DocId;

/// Stable LSD radix sort of a u32 key column with a paired value column (SoA).
/// - Sorts by `inds` ascending
/// - Reorders `vals` accordingly, equal keys keep their input order
///
/// Used to turn query term counts (collected in token order) into the
/// ascending index layout required by `SpVec`.
pub fn radix_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }
    // 小さい入力は挿入ソートの方が速い
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut tmp_inds = vec![0u32; n];
    let mut tmp_vals = vals.to_vec();

    // even pass: slices -> tmp, odd pass: tmp -> slices.
    // 4 passes, so the result ends up back in the caller's slices.
    for (pass, shift) in [0u32, 8, 16, 24].into_iter().enumerate() {
        let (src_i, src_v, dst_i, dst_v): (&[u32], &[N], &mut [u32], &mut [N]) = if pass % 2 == 0 {
            (&*inds, &*vals, &mut tmp_inds[..], &mut tmp_vals[..])
        } else {
            (&tmp_inds[..], &tmp_vals[..], &mut *inds, &mut *vals)
        };

        let mut count = [0usize; 256];
        for &k in src_i {
            count[((k >> shift) & 0xFF) as usize] += 1;
        }
        let mut sum = 0usize;
        for c in count.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }
        for (&k, &v) in src_i.iter().zip(src_v) {
            let bucket = ((k >> shift) & 0xFF) as usize;
            let pos = count[bucket];
            count[bucket] = pos + 1;
            dst_i[pos] = k;
            dst_v[pos] = v;
        }
    }
}

#[inline]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    for i in 1..inds.len() {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Ranking order: higher score first, ascending document id on ties.
#[inline]
pub fn cmp_score_desc(a: &(DocId, f64), b: &(DocId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Sort `(doc, score)` pairs into ranking order.
/// The order is total, so the result does not depend on the input order.
pub fn rank_desc(list: &mut [(DocId, f64)]) {
    list.sort_unstable_by(cmp_score_desc);
}

/// Keep the `k` best pairs in ranking order.
pub fn top_k(mut list: Vec<(DocId, f64)>, k: usize) -> Vec<(DocId, f64)> {
    if k == 0 {
        return Vec::new();
    }
    if k < list.len() {
        list.select_nth_unstable_by(k - 1, cmp_score_desc);
        list.truncate(k);
    }
    rank_desc(&mut list);
    list
}
