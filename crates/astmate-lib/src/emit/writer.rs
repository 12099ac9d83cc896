//! Auto-indenting output buffer for code emission.
//!
//! Multi-line writes indent every continuation line to the current level.
//! [`IndentedWriter::interpolate`] mixes literal chunks with callbacks; a
//! callback that writes nothing swallows the following newline, so optional
//! sections leave no blank line behind.

const INDENT_STEP: &str = "    ";

pub struct IndentedWriter {
    buf: String,
    level: usize,
    at_line_start: bool,
}

/// One piece of an interpolated write: literal text or an embedded callback.
pub enum Chunk<'a> {
    Text(&'a str),
    With(&'a dyn Fn(&mut IndentedWriter)),
}

impl IndentedWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            level: 0,
            at_line_start: true,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn unindent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Appends text; every line that starts at column zero gets the current
    /// indentation. Indentation is never written for empty lines.
    pub fn write(&mut self, text: &str) {
        let mut rest = text;
        while !rest.is_empty() {
            match rest.find('\n') {
                Some(pos) => {
                    let (line, tail) = rest.split_at(pos);
                    self.write_segment(line);
                    self.buf.push('\n');
                    self.at_line_start = true;
                    rest = &tail[1..];
                }
                None => {
                    self.write_segment(rest);
                    break;
                }
            }
        }
    }

    pub fn write_line(&mut self, text: &str) {
        self.write(text);
        self.buf.push('\n');
        self.at_line_start = true;
    }

    /// Writes literal chunks and embedded callbacks in sequence. A callback
    /// that produced no output elides the next chunk's leading newline.
    pub fn interpolate(&mut self, chunks: &[Chunk<'_>]) {
        let mut swallow_newline = false;
        for chunk in chunks {
            match chunk {
                Chunk::Text(text) => {
                    let text = if swallow_newline {
                        text.strip_prefix('\n').unwrap_or(text)
                    } else {
                        text
                    };
                    swallow_newline = false;
                    self.write(text);
                }
                Chunk::With(callback) => {
                    let before = self.buf.len();
                    callback(self);
                    if self.buf.len() == before {
                        swallow_newline = self.at_line_start;
                    }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn write_segment(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.level {
                self.buf.push_str(INDENT_STEP);
            }
            self.at_line_start = false;
        }
        self.buf.push_str(segment);
    }
}

impl Default for IndentedWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod writer_tests {
    use super::{Chunk, IndentedWriter};

    #[test]
    fn plain_writes_concatenate() {
        let mut w = IndentedWriter::new();
        w.write("hello ");
        w.write("world");
        assert_eq!(w.finish(), "hello world");
    }

    #[test]
    fn continuation_lines_are_indented() {
        let mut w = IndentedWriter::new();
        w.indent();
        w.write("a\nb\nc");
        assert_eq!(w.finish(), "    a\n    b\n    c");
    }

    #[test]
    fn empty_lines_stay_empty() {
        let mut w = IndentedWriter::new();
        w.indent();
        w.write_line("a");
        w.write_line("");
        w.write_line("b");
        assert_eq!(w.finish(), "    a\n\n    b\n");
    }

    #[test]
    fn indent_applies_per_line_not_per_write() {
        let mut w = IndentedWriter::new();
        w.write("if x {");
        w.indent();
        w.write("\ninner()");
        w.unindent();
        w.write("\n}");
        assert_eq!(w.finish(), "if x {\n    inner()\n}");
    }

    #[test]
    fn unindent_saturates() {
        let mut w = IndentedWriter::new();
        w.unindent();
        w.write_line("x");
        assert_eq!(w.finish(), "x\n");
    }

    #[test]
    fn interpolation_with_output() {
        let mut w = IndentedWriter::new();
        w.interpolate(&[
            Chunk::Text("header\n"),
            Chunk::With(&|w| w.write_line("body")),
            Chunk::Text("footer\n"),
        ]);
        assert_eq!(w.finish(), "header\nbody\nfooter\n");
    }

    #[test]
    fn empty_callback_leaves_no_blank_line() {
        let mut w = IndentedWriter::new();
        w.interpolate(&[
            Chunk::Text("header\n"),
            Chunk::With(&|_| {}),
            Chunk::Text("\nfooter\n"),
        ]);
        assert_eq!(w.finish(), "header\nfooter\n");
    }

    #[test]
    fn non_empty_callback_keeps_separator() {
        let mut w = IndentedWriter::new();
        w.interpolate(&[
            Chunk::Text("header\n"),
            Chunk::With(&|w| w.write("middle")),
            Chunk::Text("\nfooter\n"),
        ]);
        assert_eq!(w.finish(), "header\nmiddle\nfooter\n");
    }

    #[test]
    fn callback_block_is_indented_at_call_site() {
        let mut w = IndentedWriter::new();
        w.write_line("fn demo() {");
        w.indent();
        w.interpolate(&[Chunk::With(&|w| {
            w.write_line("first();");
            w.write_line("second();");
        })]);
        w.unindent();
        w.write_line("}");
        assert_eq!(
            w.finish(),
            "fn demo() {\n    first();\n    second();\n}"
                .to_string()
                + "\n"
        );
    }
}
