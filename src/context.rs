use crate::matcher::MatchSpan;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One line inside a [`MatchRecord`]: 1-based number, text without its
/// terminator, byte spans of the matches on it (empty for context lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    pub number: usize,
    pub text: String,
    pub spans: Vec<(usize, usize)>,
    pub is_context: bool,
}

/// A merged, contiguous block of matched and context lines, the unit handed
/// to the reporting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub path: PathBuf,
    pub start_line: usize,
    pub lines: Vec<ContextLine>,
}

/// Group match spans into records with `before`/`after` lines of context.
///
/// Each matched line contributes a window clamped to the file; windows that
/// share at least one line are merged, transitively. Windows that only touch
/// end-to-start stay separate records.
pub fn group(
    path: &Path,
    lines: &[String],
    spans: &[MatchSpan],
    before: usize,
    after: usize,
) -> Vec<MatchRecord> {
    if spans.is_empty() || lines.is_empty() {
        return Vec::new();
    }

    let mut spans_by_line: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    for span in spans {
        spans_by_line
            .entry(span.line)
            .or_default()
            .push((span.start, span.end));
    }

    let last = lines.len() - 1;
    let mut windows: Vec<(usize, usize)> = Vec::new();
    for &line in spans_by_line.keys() {
        let window = (line.saturating_sub(before), (line + after).min(last));
        match windows.last_mut() {
            Some(current) if window.0 <= current.1 => current.1 = current.1.max(window.1),
            _ => windows.push(window),
        }
    }

    windows
        .into_iter()
        .map(|(start, end)| MatchRecord {
            path: path.to_path_buf(),
            start_line: start + 1,
            lines: (start..=end)
                .map(|index| {
                    let spans = spans_by_line.get(&index).cloned().unwrap_or_default();
                    ContextLine {
                        number: index + 1,
                        is_context: spans.is_empty(),
                        text: lines[index].clone(),
                        spans,
                    }
                })
                .collect(),
        })
        .collect()
}
