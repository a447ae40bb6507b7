//! Row-preserving reply chunker.
//!
//! Packs rendered rows into blocks that fit in a single outgoing message.
//! Rows are never split: a block ends as soon as the next row would push it
//! past `max_chars`, and that row opens the next block.
//!
//! # Algorithm
//!
//! 1. Each row is followed by a blank-line separator (`\n\n`).
//! 2. Rows accumulate into a buffer while `buffer + row + separator` stays
//!    within `max_chars` characters.
//! 3. When it would not, the buffer is flushed as a block and the row
//!    starts a new one.
//! 4. A row that alone exceeds `max_chars` becomes its own oversized block.
//! 5. Blocks are trimmed of trailing whitespace; the last non-empty buffer
//!    is always flushed.
//!
//! Lengths are counted in `char`s, not bytes, so accented text is measured
//! the way the messaging platform measures it.
//!
//! # Example
//!
//! ```rust
//! use saoke_bot::chunk::chunk_rows;
//!
//! let blocks = chunk_rows(&["A | 1", "B | 2"], 4000);
//! assert_eq!(blocks, vec!["A | 1\n\nB | 2"]);
//! ```

/// Default block size, kept under the platform's 4096-character message cap.
pub const DEFAULT_MAX_CHARS: usize = 4000;

const ROW_SEPARATOR: &str = "\n\n";

/// Split rows into size-bounded blocks without breaking any row.
pub fn chunk_rows<S: AsRef<str>>(rows: &[S], max_chars: usize) -> Vec<String> {
    let separator_len = ROW_SEPARATOR.chars().count();

    let mut blocks = Vec::new();
    let mut current_buf = String::new();
    let mut current_len = 0usize;

    for row in rows {
        let row = row.as_ref();
        let row_len = row.chars().count() + separator_len;

        // An empty buffer always accepts the row, so an oversized row
        // lands alone instead of flushing an empty block ahead of it.
        if !current_buf.is_empty() && current_len + row_len > max_chars {
            blocks.push(current_buf.trim_end().to_string());
            current_buf.clear();
            current_len = 0;
        }

        current_buf.push_str(row);
        current_buf.push_str(ROW_SEPARATOR);
        current_len += row_len;
    }

    if !current_buf.is_empty() {
        blocks.push(current_buf.trim_end().to_string());
    }

    blocks
}
