//! Bulk edge-list import from free-form text
//!
//! Each non-blank line contributes one edge built from the first two or three
//! numbers found on it: `source, target[, weight]`. Anything that is not a
//! number is ignored, so `1,2,5`, `1 -> 2 (5)` and `from 1 to 2 weight 5`
//! are equivalent. A bad line never stops the rest of the document.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GraphError, ParseReason};
use crate::graph::GraphMutator;
use crate::model::VertexId;

pub const DEFAULT_WEIGHT: f32 = 1.0;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?\d*\.?\d+").expect("number pattern is valid")
});

/// Something that went wrong on one line. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDiagnostic {
    pub line: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: GraphError,
}

fn serialize_error<S: serde::Serializer>(error: &GraphError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Non-blank lines examined.
    pub lines_processed: usize,
    pub vertices_created: usize,
    pub edges_added: usize,
    pub diagnostics: Vec<ImportDiagnostic>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn diagnose(&mut self, line: usize, error: GraphError) {
        warn!(line, %error, "import diagnostic");
        self.diagnostics.push(ImportDiagnostic { line, error });
    }
}

/// A parsed line, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: f32,
}

/// Split text on `\r\n`, `\r` or `\n`.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(['\r', '\n']) {
        lines.push(&rest[..pos]);
        let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + skip..];
    }
    lines.push(rest);
    lines
}

/// All numeric tokens on a line, left to right.
pub fn extract_numbers(line: &str) -> Vec<&str> {
    NUMBER.find_iter(line).map(|m| m.as_str()).collect()
}

/// Parse one line into an edge record.
///
/// The optional reason is a non-fatal problem (an unusable or negative weight);
/// an `Err` means the line must be skipped.
pub fn parse_line(line: &str) -> Result<(EdgeRecord, Option<ParseReason>), ParseReason> {
    let numbers = extract_numbers(line);
    if numbers.len() < 2 {
        return Err(ParseReason::NotEnoughNumbers {
            found: numbers.len(),
        });
    }
    let source: i64 = numbers[0]
        .parse()
        .map_err(|_| ParseReason::InvalidSourceId(numbers[0].to_string()))?;
    let target: i64 = numbers[1]
        .parse()
        .map_err(|_| ParseReason::InvalidTargetId(numbers[1].to_string()))?;

    let mut warning = None;
    let weight = match numbers.get(2) {
        None => DEFAULT_WEIGHT,
        Some(raw) => match raw.parse::<f32>() {
            Ok(w) if w.is_finite() && w >= 0.0 => w,
            _ => {
                warning = Some(ParseReason::InvalidWeight(raw.to_string()));
                DEFAULT_WEIGHT
            }
        },
    };

    Ok((
        EdgeRecord {
            source: VertexId(source),
            target: VertexId(target),
            weight,
        },
        warning,
    ))
}

/// Import a whole document.
pub fn import_document<G: GraphMutator + ?Sized>(graph: &mut G, text: &str) -> ImportReport {
    import_lines(graph, [text])
}

/// Import a sequence of lines. Items may themselves contain line breaks of
/// any style; line numbers in diagnostics count the lines after splitting.
pub fn import_lines<G, I, S>(graph: &mut G, lines: I) -> ImportReport
where
    G: GraphMutator + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<S> = lines.into_iter().collect();
    let mut report = ImportReport::default();

    let normalized = items.iter().flat_map(|item| split_lines(item.as_ref()));
    for (i, line) in normalized.enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        report.lines_processed += 1;

        let record = match parse_line(line) {
            Ok((record, warning)) => {
                if let Some(reason) = warning {
                    report.diagnose(line_no, GraphError::Parse { line: line_no, reason });
                }
                record
            }
            Err(reason) => {
                report.diagnose(line_no, GraphError::Parse { line: line_no, reason });
                continue;
            }
        };

        let mut endpoints_ready = true;
        for id in [record.source, record.target] {
            if graph.contains_vertex(id) {
                continue;
            }
            match graph.add_vertex(id) {
                Ok(()) => report.vertices_created += 1,
                Err(error) => {
                    report.diagnose(line_no, error);
                    endpoints_ready = false;
                    break;
                }
            }
        }
        if !endpoints_ready {
            continue;
        }

        match graph.add_edge(record.source, record.target, record.weight) {
            Ok(()) => {
                report.edges_added += 1;
                debug!(line = line_no, source = %record.source, target = %record.target, "imported edge");
            }
            Err(error) => report.diagnose(line_no, error),
        }
    }

    info!(
        lines = report.lines_processed,
        vertices = report.vertices_created,
        edges = report.edges_added,
        diagnostics = report.diagnostics.len(),
        "import finished"
    );
    report
}
