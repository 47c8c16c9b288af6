//! UTF-16 line/column lookup for sourcemaps.
//!
//! The rest of the crate works in byte offsets (tree-sitter's model), while sourcemap columns
//! are UTF-16 code units, which is what JavaScript consumers index strings by.

/// Line starts of a string, with byte-offset to `(line, utf16_col)` conversion.
#[derive(Debug, Clone)]
pub struct Utf16Index<'a> {
    s: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Utf16Index<'a> {
    pub fn new(s: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            s.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { s, line_starts }
    }

    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Return the 0-based line index that contains `byte`.
    ///
    /// Offsets past the end of the string belong to the final line.
    pub fn line_for_byte(&self, byte: usize) -> usize {
        match self.line_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// Convert a byte offset into a `(line, utf16_col)` pair.
    ///
    /// An offset inside a multi-byte character resolves to the column of that character's start.
    pub fn byte_to_line_utf16_col(&self, byte: usize) -> (usize, usize) {
        let line = self.line_for_byte(byte);
        let start = self.line_starts[line];

        let mut end = byte.min(self.s.len());
        while !self.s.is_char_boundary(end) {
            end -= 1;
        }

        let col = self.s[start..end.max(start)]
            .chars()
            .map(char::len_utf16)
            .sum();
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_starts_with_and_without_trailing_newline() {
        assert_eq!(Utf16Index::new("a\nbc\nd\n").line_starts(), &[0, 2, 5, 7]);
        assert_eq!(Utf16Index::new("a\nb").line_starts(), &[0, 2]);
    }

    #[test]
    fn ascii_columns_match_bytes() {
        let idx = Utf16Index::new("ab\ncde\nf");
        assert_eq!(idx.byte_to_line_utf16_col(0), (0, 0));
        assert_eq!(idx.byte_to_line_utf16_col(2), (0, 2));
        assert_eq!(idx.byte_to_line_utf16_col(3), (1, 0));
        assert_eq!(idx.byte_to_line_utf16_col(5), (1, 2));
        assert_eq!(idx.byte_to_line_utf16_col(7), (2, 0));
    }

    /// `é` is 2 bytes / 1 unit, `😀` is 4 bytes / 2 units.
    #[test]
    fn multibyte_columns_count_utf16_units() {
        let s = "é😀x";
        let idx = Utf16Index::new(s);
        assert_eq!(idx.byte_to_line_utf16_col(2), (0, 1));
        assert_eq!(idx.byte_to_line_utf16_col(6), (0, 3));
        assert_eq!(idx.byte_to_line_utf16_col(7), (0, 4));
        // Inside the emoji: clamps to its start.
        assert_eq!(idx.byte_to_line_utf16_col(4), (0, 1));
    }

    #[test]
    fn offsets_past_end_clamp_to_last_line() {
        let idx = Utf16Index::new("a\nbc");
        assert_eq!(idx.byte_to_line_utf16_col(100), (1, 2));
    }
}
