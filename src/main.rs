use clap::Parser;
use env_logger::{Builder, Env, Target};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use rzgrep::cli::{Cli, ColorMode, Commands, ListArgs, SearchArgs};
use rzgrep::config::{FileConfig, SearchConfig};
use rzgrep::error::{Result, RzgrepError};
use rzgrep::list::{self, ListOptions};
use rzgrep::output::{self, ReportOptions};
use rzgrep::walker::{self, TraversalResult};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse_from(argv_with_env());
    if let Err(err) = setup_logging(&cli) {
        eprintln!("rzgrep: {err}");
        return ExitCode::from(2);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        // A closed pipe downstream (`rzgrep ... | head`) is a normal end.
        Err(RzgrepError::Io(err)) if err.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rzgrep: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let file_config = FileConfig::load()?;
    match &cli.command {
        Commands::Search(args) => run_search(cli, args, &file_config),
        Commands::List(args) => run_list(args, &file_config),
    }
}

fn run_search(cli: &Cli, args: &SearchArgs, file_config: &FileConfig) -> Result<bool> {
    let config = SearchConfig::from_search_args(args, file_config);
    let use_color = resolve_color(cli.color, file_config.output.color);
    if use_color {
        colored::control::set_override(true);
    }

    let options = ReportOptions {
        show_line_numbers: !args.no_line_numbers && file_config.output.line_numbers,
        show_filename: !args.no_filename,
        emacs: args.emacs,
        json: args.json,
        use_color,
        after_context: config.after_context,
    };

    let start = Instant::now();
    info!(
        "searching for {:?} under {} root(s)",
        config.pattern,
        args.paths.len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut matched_files = 0usize;

    for (path, result) in walker::walk(&args.paths, &config)? {
        match result {
            TraversalResult::Matches(records) => {
                matched_files += 1;
                if args.files_with_matches {
                    writeln!(out, "{}", path.display())?;
                } else if !args.files_without_matches {
                    output::write_matches(&mut out, &path, &records, &options)?;
                }
            }
            TraversalResult::NoMatch => {
                if args.files_without_matches {
                    writeln!(out, "{}", path.display())?;
                }
            }
            TraversalResult::Binary => debug!("skipping binary file {}", path.display()),
            TraversalResult::GzipCorrupt => {
                warn!("corrupt gzip stream in {}", path.display());
            }
            TraversalResult::Unreadable { cause } => {
                warn!("cannot decode {}: {cause}", path.display());
            }
            TraversalResult::FileError { cause } => {
                warn!("cannot read {}: {cause}", path.display());
            }
        }
    }

    info!(
        "{} matching file(s), finished in {:.2?}",
        matched_files,
        start.elapsed()
    );
    Ok(matched_files > 0)
}

fn run_list(args: &ListArgs, file_config: &FileConfig) -> Result<bool> {
    let config = SearchConfig::from_filters(&args.filters, file_config);
    let options = ListOptions {
        long: args.long,
        null_separated: args.null,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in list::list_files(&args.dirs, &config, args.glob.as_deref())? {
        list::write_entry(&mut out, &path, &options)?;
    }
    Ok(true)
}

/// Options from `RZGREP_ARGS` are spliced in right after the subcommand,
/// before the real command line, so explicit flags keep the last word.
fn argv_with_env() -> Vec<OsString> {
    let argv: Vec<OsString> = env::args_os().collect();
    match env::var("RZGREP_ARGS") {
        Ok(extra) => splice_env_args(argv, &extra),
        Err(_) => argv,
    }
}

fn splice_env_args(mut argv: Vec<OsString>, extra: &str) -> Vec<OsString> {
    let injected: Vec<OsString> = extra.split_whitespace().map(OsString::from).collect();
    if injected.is_empty() {
        return argv;
    }
    let insert_at = argv
        .iter()
        .position(|arg| arg == "search" || arg == "list")
        .map(|index| index + 1)
        .unwrap_or(argv.len());
    argv.splice(insert_at..insert_at, injected);
    argv
}

fn resolve_color(cli_mode: ColorMode, file_mode: ColorMode) -> bool {
    let mode = if cli_mode == ColorMode::Auto {
        file_mode
    } else {
        cli_mode
    };
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal(),
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| RzgrepError::Other(e.to_string()))?;
    Ok(())
}
