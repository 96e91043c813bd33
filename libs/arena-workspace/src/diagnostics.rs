/// Diagnostic Locator - Compiler Output to Editor Markers
///
/// **Core Responsibility:**
/// Turn raw compilation error text into line-addressed markers the editor can
/// render.
///
/// **Matching Rules:**
/// - Error text is processed line by line
/// - Each line is tried against an ordered list of named extractors, most
///   specific first; the first extractor that matches decides the line number
/// - A line number that is not positive or exceeds the document's line count
///   is discarded (the diagnostics may belong to older code)
/// - Every kept line becomes one marker spanning the whole source line
///
/// Compiler formats differ, so extractors are data: adding a format means
/// registering another extractor, never editing the cascade.
use arena_common::types::ExecutionResult;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// Editor annotation tying one error line to one source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticMarker {
    /// 1-based source line.
    pub line: u32,
    /// Marker span, 1-based and end-exclusive, covering the full line.
    pub start_column: u32,
    pub end_column: u32,
    /// Column reported by the compiler, when the format carries one.
    pub reported_column: Option<u32>,
    pub message: String,
    pub severity: Severity,
}

/// Position pulled out of one line of error text, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLocation {
    pub line: i64,
    pub column: Option<i64>,
}

/// A named pattern that recognizes one diagnostic format.
///
/// The first capture group is the line number, an optional second group the
/// column.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    name: &'static str,
    pattern: Regex,
}

impl LineExtractor {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` when the pattern does not match. A match with an unparsable
    /// number still reports a location (line 0) so the cascade stops here.
    pub fn extract(&self, text: &str) -> Option<RawLocation> {
        let caps = self.pattern.captures(text)?;
        let line = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0);
        let column = caps.get(2).and_then(|m| m.as_str().parse::<i64>().ok());
        Some(RawLocation { line, column })
    }
}

lazy_static! {
    static ref BUILTIN_EXTRACTORS: Vec<LineExtractor> = vec![
        // "at line 7, column 12: error ..."
        builtin("line_and_column", r"(?i)\bline\s+(\d+)\s*,\s*col(?:umn)?\s+(\d+)"),
        // rustc: " --> src/main.rs:4:5"
        builtin("rustc_arrow", r"-->\s*[^\s:][^:]*:(\d+):(\d+)"),
        // gcc / clang / javac -Xdiags: "main.cpp:7:5: error: ..."
        builtin("file_line_column", r"^\s*[^\s:][^:]*:(\d+):(\d+):"),
        // "main.cpp:7: error: ..." / "Main.java:5: error: ..."
        builtin("file_line", r"^\s*[^\s:][^:]*\.[A-Za-z0-9]+:(\d+):"),
        // Python traceback: 'File "main.py", line 3, in <module>'
        builtin("python_traceback", r#"File\s+"[^"]*",\s+line\s+(\d+)"#),
        // Anything mentioning a line number.
        builtin("line_reference", r"(?i)\bline\s*:?\s*(\d+)"),
    ];
}

fn builtin(name: &'static str, pattern: &str) -> LineExtractor {
    match LineExtractor::new(name, pattern) {
        Ok(extractor) => extractor,
        Err(e) => panic!("built-in diagnostic pattern {} is invalid: {}", name, e),
    }
}

/// Ordered extractor cascade.
#[derive(Debug, Clone)]
pub struct DiagnosticLocator {
    extractors: Vec<LineExtractor>,
}

impl Default for DiagnosticLocator {
    fn default() -> Self {
        Self {
            extractors: BUILTIN_EXTRACTORS.clone(),
        }
    }
}

impl DiagnosticLocator {
    /// A locator with no extractors; every input yields no markers.
    pub fn empty() -> Self {
        Self { extractors: Vec::new() }
    }

    /// Register an extractor ahead of all existing ones.
    pub fn prepend(mut self, extractor: LineExtractor) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    /// Register an extractor behind all existing ones.
    pub fn push(mut self, extractor: LineExtractor) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// First extractor in the cascade that recognizes `text`.
    pub fn match_line(&self, text: &str) -> Option<(&'static str, RawLocation)> {
        self.extractors
            .iter()
            .find_map(|e| e.extract(text).map(|loc| (e.name(), loc)))
    }

    /// Map compilation error text onto `document`.
    pub fn locate(&self, error_text: &str, document: &str) -> Vec<DiagnosticMarker> {
        let source_lines: Vec<&str> = document.split('\n').collect();
        let line_count = source_lines.len() as i64;

        let mut markers = Vec::new();
        for text in error_text.lines() {
            if text.trim().is_empty() {
                continue;
            }
            let Some((extractor, location)) = self.match_line(text) else {
                continue;
            };
            if location.line < 1 || location.line > line_count {
                debug!(
                    extractor,
                    line = location.line,
                    line_count,
                    "Discarding diagnostic outside document"
                );
                continue;
            }

            let source = source_lines[(location.line - 1) as usize].trim_end_matches('\r');
            markers.push(DiagnosticMarker {
                line: location.line as u32,
                start_column: 1,
                end_column: source.chars().count() as u32 + 1,
                reported_column: location.column.and_then(|c| u32::try_from(c).ok()).filter(|c| *c > 0),
                message: text.trim_end().to_string(),
                severity: Severity::Error,
            });
        }
        markers
    }

    /// Markers for the active result: only a compilation error produces any.
    pub fn markers_for(&self, result: &ExecutionResult, document: &str) -> Vec<DiagnosticMarker> {
        if !result.is_compilation_error() {
            return Vec::new();
        }
        let text = result
            .error
            .as_deref()
            .or_else(|| result.results.iter().find_map(|r| r.error.as_deref()));
        match text {
            Some(text) => self.locate(text, document),
            None => Vec::new(),
        }
    }
}
