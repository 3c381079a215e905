//! Overlapping character n-grams over Unicode scalar values.

/// All contiguous substrings of `n` chars, left to right, overlapping.
/// Yields nothing when the text is shorter than `n` or `n == 0`.
pub fn char_ngrams(text: &str, n: usize) -> impl Iterator<Item = &str> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    let chars = bounds.len() - 1;
    let count = if n == 0 || chars < n { 0 } else { chars - n + 1 };
    (0..count).map(move |start| &text[bounds[start]..bounds[start + n]])
}
