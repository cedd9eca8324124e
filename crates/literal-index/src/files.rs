/// Raw file content plus a line-start offset table.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub content: String,
    /// Byte offset of the start of each line. `line_starts[0] == 0` always.
    line_starts: Vec<usize>,
}

impl FileEntry {
    #[must_use]
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            content: content.to_string(),
            line_starts,
        }
    }

    /// Recover (1-based line, 0-based column) from a byte offset by binary
    /// search over the line table.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line_idx];
        (line_idx as u32 + 1, column as u32)
    }

    /// Text of a 1-based line, without the trailing newline.
    #[must_use]
    pub fn line_text(&self, line: u32) -> &str {
        let idx = line.saturating_sub(1) as usize;
        if idx >= self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |next| next - 1);
        &self.content[start..end.max(start)]
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Iterate lines as (1-based line number, text).
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        (1..=self.line_count() as u32).map(move |n| (n, self.line_text(n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_round_trip() {
        let entry = FileEntry::new("first\nsecond line\nthird\n");
        assert_eq!(entry.position_of(0), (1, 0));
        assert_eq!(entry.position_of(6), (2, 0));
        assert_eq!(entry.position_of(13), (2, 7));
        assert_eq!(entry.position_of(18), (3, 0));
    }

    #[test]
    fn line_text_excludes_newline() {
        let entry = FileEntry::new("alpha\nbeta\n");
        assert_eq!(entry.line_text(1), "alpha");
        assert_eq!(entry.line_text(2), "beta");
        assert_eq!(entry.line_text(99), "");
    }

    #[test]
    fn handles_missing_trailing_newline() {
        let entry = FileEntry::new("only line");
        assert_eq!(entry.line_text(1), "only line");
        assert_eq!(entry.position_of(5), (1, 5));
    }
}
