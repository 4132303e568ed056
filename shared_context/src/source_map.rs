use crate::Span;

/// Maps tree positions back to positions in the source text.
/// The middle end only records byte offsets; this is what turns them into
/// the line/column/caret form the driver renders.
pub struct SourceMap<'a> {
    source_code: &'a str, // The full source text
    file_name: &'a str,   // Name of the file the text came from
}

impl<'a> SourceMap<'a> {
    pub fn new(file_name: &'a str, source_code: &'a str) -> Self {
        Self {
            source_code,
            file_name,
        }
    }

    /// Formats a message with source context.
    /// Highlights the region indicated by `span` and appends the `message`.
    ///
    /// Example output:
    /// ```text
    /// main.acl --> line 3:5
    ///      |
    ///  3   | let x = 10;
    ///      |     ^~~ message
    /// ```
    pub fn format_message(&self, message: &str, span: Span) -> String {
        let line_text = self.get_line_text(span.start);
        let column = self.get_col_number(span.start);

        let mut marker_line = String::new();
        let marker_start = column.saturating_sub(1); // Column index starts at 0
        let marker_len = (span.end.saturating_sub(span.start)).max(1);

        // Construct a line with markers (^) and (~) showing the span
        for i in 0..=line_text.len() {
            if i == marker_start {
                marker_line.push('^');
                for _ in 1..marker_len {
                    marker_line.push('~');
                }
                marker_line.push(' ');
                marker_line.push_str(message);
                break;
            } else if line_text.as_bytes().get(i) == Some(&b'\t') {
                marker_line.push('\t'); // Preserve tab alignment
            } else {
                marker_line.push(' ');
            }
        }

        format!(
            "{} --> line {}:{}\n     |\n{:>4} | {}\n     | {}\n",
            self.file_name, span.line, column, span.line, line_text, marker_line
        )
    }

    /// Returns the text of the line containing the given offset.
    fn get_line_text(&self, offset: usize) -> &str {
        let offset = offset.min(self.source_code.len());
        let start = self.source_code[..offset]
            .rfind('\n')
            .map_or(0, |pos| pos + 1);
        let end = self.source_code[offset..]
            .find('\n')
            .map_or(self.source_code.len(), |pos| offset + pos);

        &self.source_code[start..end]
    }

    /// Returns the column number (1-based) corresponding to the given offset.
    fn get_col_number(&self, offset: usize) -> usize {
        let offset = offset.min(self.source_code.len());
        let last_newline_index = self.source_code[..offset]
            .char_indices()
            .rfind(|&(_, ch)| ch == '\n')
            .map(|(index, _)| index)
            .unwrap_or(0);

        self.source_code[last_newline_index..offset].len()
    }

    pub fn get_file_name(&self) -> &'a str {
        self.file_name
    }

    pub fn get_source_code(&self) -> &'a str {
        self.source_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_caret_under_the_span() {
        let source = "fn main() {\n    let x = y;\n}\n";
        let map = SourceMap::new("main.acl", source);
        let span = Span::new(20, 21, 2);
        let rendered = map.format_message("unknown symbol", span);
        assert!(rendered.contains("main.acl --> line 2:"));
        assert!(rendered.contains("let x = y;"));
        assert!(rendered.contains("^ unknown symbol"));
    }
}
