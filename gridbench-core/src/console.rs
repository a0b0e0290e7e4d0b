//! Grouped Console Output
//!
//! Mirrors the nesting of the work queue: a labeled scope per file and
//! per benchmark, indented rows for cases, and one summary block after
//! the final drain. Output goes to stdout for real runs or into an
//! internal buffer for embedding and tests.

/// Width of the throughput column in case rows.
const RESULT_WIDTH: usize = 12;

enum Sink {
    Stdout,
    Buffer(String),
}

/// Indenting scope writer for run progress.
pub struct Console {
    depth: usize,
    out: Sink,
}

impl Console {
    /// Console writing to stdout.
    pub fn stdout() -> Self {
        Console {
            depth: 0,
            out: Sink::Stdout,
        }
    }

    /// Console accumulating into an internal buffer.
    pub fn buffer() -> Self {
        Console {
            depth: 0,
            out: Sink::Buffer(String::new()),
        }
    }

    fn emit(&mut self, text: &str) {
        let line = if text.is_empty() {
            String::new()
        } else {
            format!("{}{}", "  ".repeat(self.depth), text)
        };
        match &mut self.out {
            Sink::Stdout => println!("{}", line),
            Sink::Buffer(buf) => {
                buf.push_str(&line);
                buf.push('\n');
            }
        }
    }

    /// Open a labeled scope; subsequent lines indent one level deeper.
    pub fn open_scope(&mut self, label: &str) {
        self.emit(label);
        self.depth += 1;
    }

    /// Close the innermost scope.
    pub fn close_scope(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Emit one blank separator line.
    pub fn blank(&mut self) {
        self.emit("");
    }

    /// Emit one indented line.
    pub fn line(&mut self, text: &str) {
        self.emit(text);
    }

    /// Emit a case row: right-aligned throughput, then labels.
    pub fn case_row(&mut self, throughput: u64, label: &str) {
        self.emit(&format!("{:>width$}  {}", throughput, label, width = RESULT_WIDTH));
    }

    /// Emit the column header printed above a multi-dimension sweep.
    pub fn header_row(&mut self, names: &[&str]) {
        self.emit(&format!("{:>width$}  {}", "", names.join("  "), width = RESULT_WIDTH));
    }

    /// Emit a formatted error line for a failed benchmark.
    pub fn error(&mut self, message: &str) {
        self.emit(&format!("error: {}", message));
    }

    /// Emit the final summary block.
    pub fn summary(&mut self, files: usize, benchmarks: usize, failed: usize) {
        self.emit("");
        self.emit("Summary");
        self.emit(&"-".repeat(60));
        self.emit(&format!(
            "  Files: {}  Benchmarks: {}  Failed: {}",
            files, benchmarks, failed
        ));
    }

    /// Buffered contents, if this console buffers. Drains the buffer.
    pub fn take_buffer(&mut self) -> Option<String> {
        match &mut self.out {
            Sink::Stdout => None,
            Sink::Buffer(buf) => Some(std::mem::take(buf)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_indent() {
        let mut console = Console::buffer();
        console.open_scope("file.rs");
        console.open_scope("bench");
        console.case_row(42, "fast");
        console.close_scope();
        console.close_scope();
        let out = console.take_buffer().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "file.rs");
        assert_eq!(lines[1], "  bench");
        assert!(lines[2].starts_with("    "));
        assert!(lines[2].ends_with("42  fast"));
    }

    #[test]
    fn test_close_below_zero_is_harmless() {
        let mut console = Console::buffer();
        console.close_scope();
        console.line("top");
        assert_eq!(console.take_buffer().unwrap(), "top\n");
    }

    #[test]
    fn test_blank_line_has_no_indent() {
        let mut console = Console::buffer();
        console.open_scope("scope");
        console.blank();
        let out = console.take_buffer().unwrap();
        assert_eq!(out, "scope\n\n");
    }

    #[test]
    fn test_summary_block() {
        let mut console = Console::buffer();
        console.summary(2, 5, 1);
        let out = console.take_buffer().unwrap();
        assert!(out.contains("Summary"));
        assert!(out.contains(&"-".repeat(60)));
        assert!(out.contains("  Files: 2  Benchmarks: 5  Failed: 1"));
    }

    #[test]
    fn test_header_row_aligns_with_labels() {
        let mut console = Console::buffer();
        console.header_row(&["A", "B"]);
        console.case_row(7, "x  y");
        let out = console.take_buffer().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let header_col = lines[0].find("A").unwrap();
        let label_col = lines[1].find("x").unwrap();
        assert_eq!(header_col, label_col);
    }

    #[test]
    fn test_stdout_console_has_no_buffer() {
        let mut console = Console::stdout();
        assert!(console.take_buffer().is_none());
    }
}
