use std::ops::Range;

/// A problem found in a configuration or weights file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte range in the source text, when the parser could locate it.
    pub span: Option<Range<usize>>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Option<Range<usize>>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Option<Range<usize>>) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Build from a serde_json error, converting its line/column to a byte span.
    pub fn from_json(err: &serde_json::Error, source: &str) -> Self {
        let span = (err.line() > 0).then(|| {
            let start = byte_offset(source, err.line(), err.column());
            start..(start + 1).min(source.len()).max(start)
        });
        Self::error(format!("invalid JSON: {}", err), span)
    }

    /// Build from a toml deserialization error.
    pub fn from_toml(err: &toml::de::Error) -> Self {
        Self::error(err.message().to_string(), err.span())
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let offset = self.span.as_ref().map_or(0, |s| s.start);
        let mut report = Report::build(kind, filename, offset).with_message(&self.message);

        if let Some(span) = &self.span {
            report = report.with_label(
                Label::new((filename, span.clone()))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        // stderr closed: nothing left to report to
        let _ = report
            .finish()
            .eprint((filename, Source::from(source)));
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for note in &self.notes {
            write!(f, "; {}", note)?;
        }
        Ok(())
    }
}

/// Byte offset of a 1-based line/column position, clamped to the source.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len());
        }
        offset += text.len();
    }
    source.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let d = Diagnostic::error("bad scale".to_string(), Some(10..15));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "bad scale");
        assert_eq!(d.span, Some(10..15));
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::warning("hint".to_string(), None)
            .with_note("note 1".to_string())
            .with_help("help text".to_string())
            .with_note("note 2".to_string());
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes, vec!["note 1", "note 2"]);
        assert_eq!(d.help.as_deref(), Some("help text"));
        assert_eq!(d.to_string(), "hint; note 1; note 2");
    }

    #[test]
    fn test_byte_offset() {
        let src = "ab\ncde\nf";
        assert_eq!(byte_offset(src, 1, 1), 0);
        assert_eq!(byte_offset(src, 2, 2), 4);
        assert_eq!(byte_offset(src, 3, 1), 7);
        assert_eq!(byte_offset(src, 9, 1), src.len());
    }

    #[test]
    fn test_json_error_is_located() {
        let src = "{\n  \"scale\": ,\n}";
        let err = serde_json::from_str::<serde_json::Value>(src).unwrap_err();
        let d = Diagnostic::from_json(&err, src);
        let span = d.span.expect("json errors carry a position");
        assert!(span.start >= 2 && span.start < src.len());
        assert!(d.message.starts_with("invalid JSON"));
    }

    #[test]
    fn test_toml_error_is_located() {
        let src = "scale = \"nope\"\n";
        let err = toml::from_str::<std::collections::BTreeMap<String, i64>>(src).unwrap_err();
        let d = Diagnostic::from_toml(&err);
        assert!(d.span.is_some());
    }
}
