use crate::config::SearchConfig;
use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use walkdir::DirEntry;

/// Pure name/metadata predicates deciding what the walker descends and
/// opens. Consulted before any file I/O, so excluded entries cost nothing.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    skip_dirs: BTreeSet<String>,
    skip_exts: Vec<String>,
    skip_hidden: bool,
    follow_symlinks: bool,
}

impl PathFilter {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            include: build_glob_set(&config.include)?,
            exclude: build_glob_set(&config.exclude)?,
            skip_dirs: config.skip_dirs.clone(),
            skip_exts: config.skip_exts.clone(),
            skip_hidden: config.skip_hidden,
            follow_symlinks: config.follow_symlinks,
        })
    }

    pub fn should_descend(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if self.skip_hidden && name.starts_with('.') {
            return false;
        }
        if !self.follow_symlinks && entry.path_is_symlink() {
            return false;
        }
        !self.skip_dirs.contains(name.as_ref())
    }

    pub fn should_search(&self, entry: &DirEntry) -> bool {
        if !self.follow_symlinks && entry.path_is_symlink() {
            return false;
        }
        self.name_allowed(&entry.file_name().to_string_lossy())
    }

    /// The name-based file rules on their own. Extension rules are
    /// suffix-based so entries like `~`, `#` and `.tar.gz` behave.
    pub fn name_allowed(&self, name: &str) -> bool {
        if self.skip_hidden && name.starts_with('.') {
            return false;
        }
        if self.has_skip_extension(name) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return false;
            }
        }
        true
    }

    fn has_skip_extension(&self, name: &str) -> bool {
        if self.skip_exts.iter().any(|ext| name.ends_with(ext.as_str())) {
            return true;
        }
        // Extensions opening with ".~" mark editor backups like `foo.~1~`.
        match name.rfind('.') {
            Some(dot) if dot > 0 => name[dot..].starts_with(".~"),
            _ => false,
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}
