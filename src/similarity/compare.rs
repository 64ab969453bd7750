use std::cmp::Ordering;

use indexmap::IndexSet;

/// Turn one token list per document into sorted, deduplicated id sets.
/// Ids are only meaningful between the sets returned by the same call.
pub fn token_sets<'a, I, T>(fields: I) -> Vec<Vec<u32>>
where
    I: IntoIterator<Item = &'a [T]>,
    T: AsRef<str> + 'a,
{
    let mut interner: IndexSet<&'a str> = IndexSet::new();
    fields
        .into_iter()
        .map(|tokens| {
            let mut set: Vec<u32> = tokens
                .iter()
                .map(|t| interner.insert_full(t.as_ref()).0 as u32)
                .collect();
            set.sort_unstable();
            set.dedup();
            set
        })
        .collect()
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` of two sorted, deduplicated sets.
/// Two empty sets have similarity 0: there is no evidence of overlap.
pub fn jaccard(a: &[u32], b: &[u32]) -> f64 {
    let mut i = 0;
    let mut j = 0;
    let mut inter = 0usize;
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                inter += 1;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Jaccard similarity of two raw token lists.
pub fn jaccard_tokens<T: AsRef<str>>(a: &[T], b: &[T]) -> f64 {
    let sets = token_sets([a, b]);
    jaccard(&sets[0], &sets[1])
}
