//! Analysis Results
//!
//! A general purpose result item. The scheduler is generic over its result
//! type and never looks inside; this is what most bears emit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgent a result is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Normal,
    Major,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Normal => "NORMAL",
            Severity::Major => "MAJOR",
        })
    }
}

/// A span of lines in one file. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceRange {
    pub fn new(file: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            file: file.into(),
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// A range covering a single line.
    pub fn line(file: impl Into<String>, line: usize) -> Self {
        Self::new(file, line, line)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file, self.start_line)
        } else {
            write!(f, "{}:{}-{}", self.file, self.start_line, self.end_line)
        }
    }
}

/// A finding reported by a bear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Name of the bear that produced the result.
    pub origin: String,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_code: Vec<SourceRange>,
}

impl AnalysisResult {
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
            severity: Severity::default(),
            affected_code: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_affected(mut self, range: SourceRange) -> Self {
        self.affected_code.push(range);
        self
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.origin, self.message)?;
        for range in &self.affected_code {
            write!(f, " ({range})")?;
        }
        Ok(())
    }
}
