use crate::cli::{ColorMode, FilterArgs, SearchArgs};
use crate::encoding::Encoding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "CVS",
    "RCS",
    ".svn",
    ".hg",
    ".bzr",
    "build",
    "dist",
    "target",
    "node_modules",
];

pub const DEFAULT_SKIP_EXTS: &[&str] = &[
    ".pyc", ".pyo", ".so", ".o", ".a", ".tgz", ".tar.gz", ".rar", ".zip", "~", "#", ".bak",
    ".png", ".jpg", ".gif", ".bmp", ".tif", ".tiff", ".pyd", ".dll", ".exe", ".obj", ".lib",
    ".class",
];

/// How many leading bytes the binary heuristic samples.
pub const DEFAULT_BINARY_SAMPLE: usize = 8192;

/// The immutable engine configuration. Built once by the CLI layer, then
/// shared read-only by every component for the whole run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub pattern: String,
    pub fixed_string: bool,
    pub ignore_case: bool,
    pub word: bool,
    pub ascii: bool,
    pub before_context: usize,
    pub after_context: usize,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub skip_dirs: BTreeSet<String>,
    pub skip_exts: Vec<String>,
    pub skip_hidden: bool,
    pub follow_symlinks: bool,
    pub encoding: Option<Encoding>,
    pub binary_sample: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            fixed_string: false,
            ignore_case: false,
            word: false,
            ascii: false,
            before_context: 0,
            after_context: 0,
            include: Vec::new(),
            exclude: Vec::new(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            skip_exts: DEFAULT_SKIP_EXTS.iter().map(|s| s.to_string()).collect(),
            skip_hidden: true,
            follow_symlinks: false,
            encoding: None,
            binary_sample: DEFAULT_BINARY_SAMPLE,
        }
    }
}

impl SearchConfig {
    /// Resolve the filter-related options. Command-line flags win over the
    /// configuration file, which wins over the built-in defaults.
    pub fn from_filters(filters: &FilterArgs, file: &FileConfig) -> Self {
        let skip_dirs: BTreeSet<String> = if filters.no_skip_dirs {
            BTreeSet::new()
        } else if let Some(dirs) = &filters.skip_dirs {
            dirs.iter().filter(|s| !s.is_empty()).cloned().collect()
        } else {
            file.filters.skip_dirs.iter().cloned().collect()
        };
        let skip_exts: Vec<String> = if filters.no_skip_exts {
            Vec::new()
        } else if let Some(exts) = &filters.skip_exts {
            exts.iter().filter(|s| !s.is_empty()).cloned().collect()
        } else {
            file.filters.skip_exts.clone()
        };
        Self {
            include: filters.include.clone(),
            exclude: filters.exclude.clone(),
            skip_dirs,
            skip_exts,
            skip_hidden: !(filters.hidden || file.filters.hidden),
            follow_symlinks: filters.follow || file.filters.follow,
            ..Self::default()
        }
    }

    pub fn from_search_args(args: &SearchArgs, file: &FileConfig) -> Self {
        let mut config = Self::from_filters(&args.filters, file);
        config.pattern = args.pattern.clone();
        config.fixed_string = args.fixed_string;
        config.ignore_case = args.ignore_case;
        config.word = args.word;
        config.ascii = args.ascii;
        config.encoding = args.encoding;
        let (before, after) = match args.context {
            Some(both) => (both, both),
            None => (
                args.before_context.unwrap_or(file.search.context_before),
                args.after_context.unwrap_or(file.search.context_after),
            ),
        };
        config.before_context = before;
        config.after_context = after;
        config
    }
}

/// Optional on-disk configuration. Every field is defaulted, so a missing or
/// empty file behaves like the built-in defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub search: SearchDefaults,
    pub filters: FilterDefaults,
    pub output: OutputDefaults,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub context_before: usize,
    pub context_after: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    pub skip_dirs: Vec<String>,
    pub skip_exts: Vec<String>,
    pub hidden: bool,
    pub follow: bool,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            skip_exts: DEFAULT_SKIP_EXTS.iter().map(|s| s.to_string()).collect(),
            hidden: false,
            follow: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputDefaults {
    pub color: ColorMode,
    pub line_numbers: bool,
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            line_numbers: true,
        }
    }
}

impl FileConfig {
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("rzgrep/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".rzgrep.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".rzgrep.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skip_sets_are_populated() {
        let config = SearchConfig::default();
        assert!(config.skip_dirs.contains("node_modules"));
        assert!(config.skip_dirs.contains(".svn"));
        assert!(config.skip_exts.iter().any(|e| e == ".pyc"));
        assert!(config.skip_exts.iter().any(|e| e == "~"));
        assert!(config.skip_hidden);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn empty_file_config_matches_defaults() {
        let parsed: FileConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.filters.skip_dirs, FilterDefaults::default().skip_dirs);
        assert!(parsed.output.line_numbers);
        assert_eq!(parsed.search.context_before, 0);
    }

    #[test]
    fn partial_file_config_keeps_other_defaults() {
        let parsed: FileConfig = toml::from_str(
            r#"
            [search]
            context_after = 2

            [filters]
            hidden = true
            "#,
        )
        .unwrap();
        assert_eq!(parsed.search.context_after, 2);
        assert_eq!(parsed.search.context_before, 0);
        assert!(parsed.filters.hidden);
        assert!(!parsed.filters.skip_dirs.is_empty());
    }

    #[test]
    fn malformed_file_config_is_an_error() {
        assert!(toml::from_str::<FileConfig>("filters = 3").is_err());
    }

    #[test]
    fn file_config_round_trips_through_toml() {
        let config = FileConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: FileConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.filters.skip_exts, config.filters.skip_exts);
    }

    #[test]
    fn save_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = FileConfig::default();
        config.search.context_after = 3;
        config.save(&path).unwrap();
        let loaded = FileConfig::load_from(&path).unwrap();
        assert_eq!(loaded.search.context_after, 3);
    }
}
