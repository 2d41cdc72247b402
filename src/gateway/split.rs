//! Splitting long completions into Discord-sized messages.

/// Discord's per-message content limit, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Split `text` into ordered chunks of at most `limit` characters.
///
/// Concatenating the chunks gives back `text` exactly. A chunk ends after the
/// last newline (or failing that, the last whitespace) in its window when that
/// break falls in the second half of the window; otherwise it is cut hard.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `limit`-th char, or the whole remainder
        let Some((hard, _)) = rest.char_indices().nth(limit) else {
            chunks.push(rest);
            break;
        };

        let window = &rest[..hard];
        let min_break = window.len() / 2;
        let soft_break = |pred: fn(char) -> bool| {
            window
                .char_indices()
                .rev()
                .find(|&(_, c)| pred(c))
                .map(|(i, c)| i + c.len_utf8())
                .filter(|&end| end > min_break)
        };

        let cut = soft_break(|c| c == '\n')
            .or_else(|| soft_break(char::is_whitespace))
            .unwrap_or(hard);

        let (chunk, remainder) = rest.split_at(cut);
        chunks.push(chunk);
        rest = remainder;
    }

    chunks
}
