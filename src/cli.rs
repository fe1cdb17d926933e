use crate::encoding::Encoding;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Write the log to this file instead of stderr
    #[clap(long, value_parser, global = true, overrides_with = "log")]
    pub log: Option<PathBuf>,

    /// When to color the report
    #[clap(long, value_parser, global = true, default_value_t = ColorMode::Auto, overrides_with = "color")]
    pub color: ColorMode,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search file contents for a pattern
    Search(SearchArgs),
    /// List the files a search would examine, without opening them
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Regular expression to search for
    pub pattern: String,

    /// Files and directories to search
    #[clap(value_parser, default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Treat the pattern as a literal string
    #[clap(short = 'F', long, value_parser, default_value_t = false, overrides_with = "fixed_string")]
    pub fixed_string: bool,

    /// Match without regard to case
    #[clap(short, long, value_parser, default_value_t = false, overrides_with = "ignore_case")]
    pub ignore_case: bool,

    /// Match only at word boundaries
    #[clap(short, long, value_parser, default_value_t = false, overrides_with = "word")]
    pub word: bool,

    /// Keep \b, \w and friends ASCII-only
    #[clap(long, value_parser, default_value_t = false, overrides_with = "ascii")]
    pub ascii: bool,

    /// Lines of context after each match
    #[clap(short = 'A', long, value_parser, value_name = "NUM", overrides_with = "after_context")]
    pub after_context: Option<usize>,

    /// Lines of context before each match
    #[clap(short = 'B', long, value_parser, value_name = "NUM", overrides_with = "before_context")]
    pub before_context: Option<usize>,

    /// Lines of context on both sides; overrides -A and -B
    #[clap(short = 'C', long, value_parser, value_name = "NUM", overrides_with = "context")]
    pub context: Option<usize>,

    /// Force this encoding instead of detecting one
    #[clap(short = 'x', long, value_parser, value_name = "ENCODING", overrides_with = "encoding")]
    pub encoding: Option<Encoding>,

    #[clap(flatten)]
    pub filters: FilterArgs,

    /// Print only the names of files with matches
    #[clap(
        short = 'l',
        long,
        value_parser,
        default_value_t = false,
        conflicts_with = "files_without_matches",
        overrides_with = "files_with_matches"
    )]
    pub files_with_matches: bool,

    /// Print only the names of files without matches
    #[clap(short = 'L', long, value_parser, default_value_t = false, overrides_with = "files_without_matches")]
    pub files_without_matches: bool,

    /// Do not print line numbers
    #[clap(short = 'N', long, value_parser, default_value_t = false, overrides_with = "no_line_numbers")]
    pub no_line_numbers: bool,

    /// Do not print the filename header
    #[clap(long, value_parser, default_value_t = false, overrides_with = "no_filename")]
    pub no_filename: bool,

    /// One path:lineno: line record per line, for M-x grep
    #[clap(long, value_parser, default_value_t = false, overrides_with = "emacs")]
    pub emacs: bool,

    /// Emit one JSON object per matching file
    #[clap(long, value_parser, default_value_t = false, conflicts_with = "emacs", overrides_with = "json")]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Search only files matching this glob (repeatable)
    #[clap(short = 'I', long = "include", value_parser, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable)
    #[clap(long = "exclude", value_parser, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Comma-separated directory names to prune, replacing the default set
    #[clap(
        short = 'd',
        long,
        value_parser,
        use_value_delimiter = true,
        value_name = "DIRS",
        overrides_with = "skip_dirs"
    )]
    pub skip_dirs: Option<Vec<String>>,

    /// Do not prune any directories
    #[clap(
        short = 'D',
        long,
        value_parser,
        default_value_t = false,
        conflicts_with = "skip_dirs",
        overrides_with = "no_skip_dirs"
    )]
    pub no_skip_dirs: bool,

    /// Comma-separated filename suffixes to skip, replacing the default set
    #[clap(
        short = 'e',
        long,
        value_parser,
        use_value_delimiter = true,
        value_name = "EXTS",
        overrides_with = "skip_exts"
    )]
    pub skip_exts: Option<Vec<String>>,

    /// Do not skip any filename suffixes
    #[clap(
        short = 'E',
        long,
        value_parser,
        default_value_t = false,
        conflicts_with = "skip_exts",
        overrides_with = "no_skip_exts"
    )]
    pub no_skip_exts: bool,

    /// Do not skip hidden files and directories
    #[clap(long, value_parser, default_value_t = false, overrides_with = "hidden")]
    pub hidden: bool,

    /// Follow symbolic links
    #[clap(long, value_parser, default_value_t = false, overrides_with = "follow")]
    pub follow: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list files whose name matches this glob
    pub glob: Option<String>,

    /// Directories to walk
    #[clap(long = "dirs", value_parser, default_value = ".", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    #[clap(flatten)]
    pub filters: FilterArgs,

    /// Separate paths with NUL instead of newline, for xargs -0
    #[clap(short = '0', long = "null", value_parser, default_value_t = false, overrides_with = "null")]
    pub null: bool,

    /// Show size and extension for each file
    #[clap(short, long, value_parser, default_value_t = false, overrides_with = "long")]
    pub long: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Auto => write!(f, "auto"),
            ColorMode::Always => write!(f, "always"),
            ColorMode::Never => write!(f, "never"),
        }
    }
}
