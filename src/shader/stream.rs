//! Incremental parser for the shader compiler's error stream.
//!
//! The compiler writes plain log lines and structured diagnostics to the
//! same stream with no framing beyond newlines. A line whose first byte is
//! `#` is a structured diagnostic; the marker itself is not part of the
//! text. Input arrives in arbitrary chunks, so a line (or a multi-byte
//! character) may be split anywhere.

/// Classification of one completed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Info,
    StructuredError,
}

/// One line of compiler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub kind: DiagnosticKind,
    pub text: String,
}

impl DiagnosticRecord {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Info,
            text: text.into(),
        }
    }

    pub fn structured(text: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::StructuredError,
            text: text.into(),
        }
    }

    pub fn is_structured(&self) -> bool {
        self.kind == DiagnosticKind::StructuredError
    }
}

const MARKER: u8 = b'#';

/// Line state machine fed with raw stderr chunks.
#[derive(Debug)]
pub struct DiagnosticStream {
    line: Vec<u8>,
    at_line_start: bool,
    structured: bool,
}

impl Default for DiagnosticStream {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticStream {
    pub fn new() -> Self {
        Self {
            line: Vec::new(),
            at_line_start: true,
            structured: false,
        }
    }

    /// Consume a chunk, returning every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DiagnosticRecord> {
        let mut records = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                if let Some(record) = self.take_line() {
                    records.push(record);
                }
            } else if self.at_line_start && byte == MARKER {
                self.structured = true;
                self.at_line_start = false;
            } else {
                self.line.push(byte);
                self.at_line_start = false;
            }
        }

        records
    }

    /// End of stream: emit the unterminated last line, if any.
    pub fn flush(&mut self) -> Option<DiagnosticRecord> {
        if self.line.is_empty() && !self.structured {
            return None;
        }
        self.take_line()
    }

    fn take_line(&mut self) -> Option<DiagnosticRecord> {
        let text = String::from_utf8_lossy(&self.line).trim().to_string();
        let structured = self.structured;

        self.line.clear();
        self.at_line_start = true;
        self.structured = false;

        if structured {
            Some(DiagnosticRecord::structured(text))
        } else if text.is_empty() {
            None
        } else {
            Some(DiagnosticRecord::info(text))
        }
    }
}
