//! Highlighted abstract excerpts for result display.

/// Returned for documents without abstract text.
pub const NO_ABSTRACT: &str = "No abstract available.";

/// Characters kept on each side of a match.
pub const CONTEXT_CHARS: usize = 40;
/// Occurrences used per query token.
pub const MATCHES_PER_TOKEN: usize = 3;
/// Windows joined into one snippet.
pub const MAX_WINDOWS: usize = 3;
pub const SNIPPET_LEN: usize = 300;
/// Length of the plain preview of additional results.
pub const PREVIEW_LEN: usize = 150;

/// Excerpt of `text` around the occurrences of `tokens`, matches wrapped in
/// `<b>..</b>`.
///
/// Tokens of 2 chars or less are ignored. Matching is case-insensitive and
/// keeps the original casing inside the tags. Without any match this is the
/// plain [`preview`] of the text.
pub fn make_snippet<T: AsRef<str>>(text: &str, tokens: &[T], max_len: usize) -> String {
    if text.is_empty() {
        return NO_ABSTRACT.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = chars.iter().map(|&c| fold_case(c)).collect();

    let mut windows = Vec::new();
    for token in tokens {
        let needle: Vec<char> = token.as_ref().chars().map(fold_case).collect();
        if needle.len() <= 2 {
            continue;
        }
        for pos in find_all(&lower, &needle).into_iter().take(MATCHES_PER_TOKEN) {
            let start = pos.saturating_sub(CONTEXT_CHARS);
            let end = (pos + needle.len() + CONTEXT_CHARS).min(chars.len());
            let mut window = highlight(&chars[start..end], &lower[start..end], &needle);
            if start > 0 {
                window.insert_str(0, "...");
            }
            if end < chars.len() {
                window.push_str("...");
            }
            windows.push(window);
        }
    }
    if windows.is_empty() {
        return preview(text, max_len);
    }

    let mut unique: Vec<String> = Vec::new();
    for w in windows {
        if w.chars().count() > 10 && !unique.contains(&w) {
            unique.push(w);
        }
    }
    unique.truncate(MAX_WINDOWS);
    truncate_chars(unique.join(" ... "), max_len)
}

/// Highlight terms of a raw query: lowercase words longer than 2 chars,
/// first occurrence only. Accents are kept so that they match the abstract
/// text as written.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if word.chars().count() > 2 && !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

/// First `max_len` chars of `text`, `...` appended when cut.
pub fn preview(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return NO_ABSTRACT.to_string();
    }
    truncate_chars(text.to_string(), max_len)
}

fn truncate_chars(mut s: String, max_len: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max_len) {
        s.truncate(idx);
        s.push_str("...");
    }
    s
}

/// Single-char lowercase so that positions in the folded text match the
/// original.
#[inline]
fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Non-overlapping occurrences, left to right.
fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut found = Vec::new();
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            found.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    found
}

fn highlight(window: &[char], lower: &[char], needle: &[char]) -> String {
    let mut out = String::with_capacity(window.len() + 16);
    let mut last = 0;
    for pos in find_all(lower, needle) {
        out.extend(&window[last..pos]);
        out.push_str("<b>");
        out.extend(&window[pos..pos + needle.len()]);
        out.push_str("</b>");
        last = pos + needle.len();
    }
    out.extend(&window[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_placeholder() {
        assert_eq!(make_snippet("", &["graph"], SNIPPET_LEN), NO_ABSTRACT);
        assert_eq!(preview("", PREVIEW_LEN), NO_ABSTRACT);
    }

    #[test]
    fn match_is_highlighted_with_original_case() {
        let text = "Graph Neural networks learn representations.";
        assert_eq!(
            make_snippet(text, &["neural"], SNIPPET_LEN),
            "Graph <b>Neural</b> networks learn representations."
        );
    }

    #[test]
    fn long_context_is_cut_with_ellipses() {
        let text = format!("{}target{}", "x".repeat(60), "y".repeat(60));
        let snippet = make_snippet(&text, &["target"], SNIPPET_LEN);
        assert_eq!(snippet, format!("...{}<b>target</b>{}...", "x".repeat(40), "y".repeat(40)));
    }

    #[test]
    fn short_tokens_are_ignored() {
        let text = "an ai system";
        assert_eq!(make_snippet(text, &["ai", "an"], SNIPPET_LEN), text);
    }

    #[test]
    fn no_match_falls_back_to_the_beginning() {
        let text = "z".repeat(400);
        let snippet = make_snippet(&text, &["absent"], SNIPPET_LEN);
        assert_eq!(snippet.len(), 303);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn at_most_three_windows() {
        let (a, b, c) = ("-".repeat(100), "=".repeat(100), "~".repeat(100));
        let text = format!("alpha{a}alpha{b}alpha{c}alpha");
        let snippet = make_snippet(&text, &["alpha"], 10_000);
        assert_eq!(snippet.matches("<b>alpha</b>").count(), 3);
        assert_eq!(snippet.matches(" ... ").count(), 2);
    }

    #[test]
    fn identical_windows_collapse() {
        let gap = "-".repeat(100);
        let text = format!("alpha{gap}alpha{gap}alpha{gap}alpha");
        let snippet = make_snippet(&text, &["alpha"], 10_000);
        // the 2nd and 3rd windows are the same text
        assert_eq!(snippet.matches("<b>alpha</b>").count(), 2);
        assert_eq!(snippet.matches(" ... ").count(), 1);
    }

    #[test]
    fn query_terms_keep_accents() {
        assert_eq!(query_terms("Detección de ÁRBOLES, de x-ray"), vec!["detección", "árboles", "ray"]);
        assert_eq!(query_terms("  "), Vec::<String>::new());

        let text = "Detección de objetos en imágenes.";
        let snippet = make_snippet(text, &query_terms("detección imágenes"), SNIPPET_LEN);
        assert!(snippet.contains("<b>Detección</b> de objetos"));
        assert!(snippet.contains("en <b>imágenes</b>."));
    }

    #[test]
    fn result_is_capped() {
        let text = format!("{}model{}", "a ".repeat(30), " b".repeat(30));
        let snippet = make_snippet(&text, &["model"], 20);
        assert_eq!(snippet.chars().count(), 23);
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        assert_eq!(preview("ñandú", 3), "ñan...");
        assert_eq!(preview("ñandú", 5), "ñandú");
    }
}
