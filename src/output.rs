use crate::context::{ContextLine, MatchRecord};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// How matches are rendered. Built once in `main` from the CLI options and
/// the configuration file, then shared across every reported file.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub show_line_numbers: bool,
    pub show_filename: bool,
    pub emacs: bool,
    pub json: bool,
    pub use_color: bool,
    pub after_context: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
            show_filename: true,
            emacs: false,
            json: false,
            use_color: false,
            after_context: 0,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    path: &'a Path,
    records: &'a [MatchRecord],
}

/// Writes the report for one matching file. Records arrive in line order
/// and are separated by a blank line; `--emacs` and `--json` replace the
/// layout wholesale.
pub fn write_matches(
    out: &mut dyn Write,
    path: &Path,
    records: &[MatchRecord],
    options: &ReportOptions,
) -> io::Result<()> {
    if options.json {
        let report = JsonReport { path, records };
        serde_json::to_writer(&mut *out, &report)?;
        return writeln!(out);
    }
    if options.emacs {
        for record in records {
            for line in &record.lines {
                let text = render_text(line, options);
                writeln!(out, "{}:{}: {}", path.display(), line.number, text)?;
            }
        }
        return Ok(());
    }

    if options.show_filename {
        if options.use_color {
            let header = format!("{}:", path.display());
            writeln!(out, "{}", header.green().bold())?;
        } else {
            writeln!(out, "{}:", path.display())?;
        }
    }
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        write_record(out, record, options)?;
    }
    Ok(())
}

fn write_record(out: &mut dyn Write, record: &MatchRecord, options: &ReportOptions) -> io::Result<()> {
    let mut last_match: Option<usize> = None;
    for line in &record.lines {
        let sep = separator(line, last_match, options.after_context);
        if !line.is_context {
            last_match = Some(line.number);
        }
        let text = render_text(line, options);
        if options.show_line_numbers {
            writeln!(out, "{:>5} {} {}", line.number, sep, text)?;
        } else {
            writeln!(out, "{} {}", sep, text)?;
        }
    }
    Ok(())
}

/// `:` marks a matched line. Context takes `+` when it sits within
/// `after` lines below the nearest matched line above it, `-` otherwise,
/// so leading context and the overflow inside a merged record read as
/// leading material.
fn separator(line: &ContextLine, last_match: Option<usize>, after: usize) -> char {
    if !line.is_context {
        return ':';
    }
    match last_match {
        Some(matched) if line.number > matched && line.number - matched <= after => '+',
        _ => '-',
    }
}

fn render_text(line: &ContextLine, options: &ReportOptions) -> String {
    if !options.use_color || line.spans.is_empty() {
        return line.text.clone();
    }
    let mut rendered = String::with_capacity(line.text.len() + line.spans.len() * 16);
    let mut cursor = 0;
    for &(start, end) in &line.spans {
        rendered.push_str(&line.text[cursor..start]);
        let highlighted = line.text[start..end].black().on_yellow();
        rendered.push_str(&highlighted.to_string());
        cursor = end;
    }
    rendered.push_str(&line.text[cursor..]);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context_line(number: usize, text: &str) -> ContextLine {
        ContextLine {
            number,
            text: text.into(),
            spans: Vec::new(),
            is_context: true,
        }
    }

    fn matched_line(number: usize, text: &str, spans: Vec<(usize, usize)>) -> ContextLine {
        ContextLine {
            number,
            text: text.into(),
            spans,
            is_context: false,
        }
    }

    fn record(start_line: usize, lines: Vec<ContextLine>) -> MatchRecord {
        MatchRecord {
            path: PathBuf::from("logs/app.txt"),
            start_line,
            lines,
        }
    }

    fn render(records: &[MatchRecord], options: &ReportOptions) -> String {
        let mut out = Vec::new();
        write_matches(&mut out, Path::new("logs/app.txt"), records, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn default_layout_marks_match_and_context_lines() {
        let records = vec![record(
            3,
            vec![
                context_line(3, "alpha"),
                matched_line(4, "beta needle", vec![(5, 11)]),
                context_line(5, "gamma"),
            ],
        )];
        let options = ReportOptions {
            after_context: 1,
            ..ReportOptions::default()
        };
        let rendered = render(&records, &options);
        assert_eq!(
            rendered,
            "logs/app.txt:\n    3 - alpha\n    4 : beta needle\n    5 + gamma\n"
        );
    }

    #[test]
    fn context_beyond_after_keeps_the_leading_marker() {
        // A merged record can hold context farther below a match than
        // `after` reaches; those lines lead into the next match.
        let records = vec![record(
            4,
            vec![
                matched_line(4, "first", vec![(0, 5)]),
                context_line(5, "mid one"),
                context_line(6, "mid two"),
                matched_line(7, "second first", vec![(7, 12)]),
            ],
        )];
        let options = ReportOptions {
            after_context: 1,
            ..ReportOptions::default()
        };
        let rendered = render(&records, &options);
        assert_eq!(
            rendered,
            "logs/app.txt:\n    4 : first\n    5 + mid one\n    6 - mid two\n    7 : second first\n"
        );
    }

    #[test]
    fn records_are_separated_by_a_blank_line() {
        let records = vec![
            record(1, vec![matched_line(1, "one", vec![(0, 3)])]),
            record(9, vec![matched_line(9, "one more", vec![(0, 3)])]),
        ];
        let rendered = render(&records, &ReportOptions::default());
        assert_eq!(
            rendered,
            "logs/app.txt:\n    1 : one\n\n    9 : one more\n"
        );
    }

    #[test]
    fn line_numbers_and_filename_can_be_hidden() {
        let records = vec![record(2, vec![matched_line(2, "hit", vec![(0, 3)])])];
        let options = ReportOptions {
            show_line_numbers: false,
            show_filename: false,
            ..ReportOptions::default()
        };
        assert_eq!(render(&records, &options), ": hit\n");
    }

    #[test]
    fn emacs_layout_prefixes_every_line_with_path_and_number() {
        let records = vec![record(
            7,
            vec![
                context_line(7, "before"),
                matched_line(8, "needle", vec![(0, 6)]),
            ],
        )];
        let options = ReportOptions {
            emacs: true,
            ..ReportOptions::default()
        };
        assert_eq!(
            render(&records, &options),
            "logs/app.txt:7: before\nlogs/app.txt:8: needle\n"
        );
    }

    #[test]
    fn json_layout_is_one_object_per_file() {
        let records = vec![record(2, vec![matched_line(2, "needle", vec![(0, 6)])])];
        let options = ReportOptions {
            json: true,
            ..ReportOptions::default()
        };
        let rendered = render(&records, &options);
        let value: serde_json::Value = serde_json::from_str(rendered.trim_end()).unwrap();
        assert_eq!(value["path"], "logs/app.txt");
        assert_eq!(value["records"][0]["start_line"], 2);
        assert_eq!(value["records"][0]["lines"][0]["text"], "needle");
        assert_eq!(value["records"][0]["lines"][0]["spans"][0][0], 0);
    }

    #[test]
    fn highlighting_splices_spans_into_the_line() {
        colored::control::set_override(true);
        let line = matched_line(1, "say needle twice: needle", vec![(4, 10), (18, 24)]);
        let options = ReportOptions {
            use_color: true,
            ..ReportOptions::default()
        };
        let rendered = render_text(&line, &options);
        colored::control::unset_override();

        assert!(rendered.contains('\u{1b}'));
        assert!(rendered.starts_with("say "));
        assert!(rendered.contains(" twice: "));
    }
}
