//! Text normalization and chunk splitting for corpus preparation

/// Collapse whitespace runs into single spaces and trim the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into windows of at most `chunk_size` characters.
///
/// Consecutive windows share `overlap` characters. A window prefers to end at
/// whitespace found in its second half, so words are rarely cut. Works on
/// chars, not bytes, so CJK text is never split inside a code point.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let mut end = (start + chunk_size).min(chars.len());

        if end < chars.len() {
            let floor = start + chunk_size / 2;
            if let Some(pos) = (floor..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = pos + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}
