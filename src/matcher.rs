use crate::config::SearchConfig;
use crate::error::Result;
use regex::{Regex, RegexBuilder};

/// One match within a file's decoded lines: the 0-based line index and the
/// byte span inside that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// The pattern, compiled once per run and reused across every file. All
/// modes funnel into a single regex: literal patterns are escaped, word mode
/// wraps the source in boundary assertions, case and ASCII handling are
/// builder switches.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut source = if config.fixed_string {
            regex::escape(&config.pattern)
        } else {
            config.pattern.clone()
        };
        if config.word {
            // The group keeps alternations inside the boundary assertions.
            source = format!(r"\b(?:{source})\b");
        }
        let regex = RegexBuilder::new(&source)
            .case_insensitive(config.ignore_case)
            .unicode(!config.ascii)
            .build()?;
        Ok(Self { regex })
    }

    /// All non-overlapping match spans, line by line, in ascending order.
    pub fn find_all(&self, lines: &[String]) -> Vec<MatchSpan> {
        let mut spans = Vec::new();
        for (line, text) in lines.iter().enumerate() {
            for m in self.regex.find_iter(text) {
                spans.push(MatchSpan {
                    line,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        spans
    }

}
