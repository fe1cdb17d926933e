use crate::classify::{classify, ClassifiedContent};
use crate::config::SearchConfig;
use crate::context::{group, MatchRecord};
use crate::error::Result;
use crate::filter::PathFilter;
use crate::matcher::CompiledPattern;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::vec;
use walkdir::WalkDir;

/// Outcome of visiting one file during a traversal.
///
/// Every file the walker opens yields exactly one of these, paired with
/// its path. Entries the filter rejects yield nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalResult {
    /// Text file with at least one match; one record per merged context
    /// region, in line order.
    Matches(Vec<MatchRecord>),
    /// Text file the pattern never matched.
    NoMatch,
    /// The content sample failed the text heuristic.
    Binary,
    /// Gzip magic was present but the stream would not inflate.
    GzipCorrupt,
    /// The bytes could not be decoded under the resolved encoding.
    Unreadable { cause: String },
    /// The file could not be opened or the directory entry read.
    FileError { cause: String },
}

pub(crate) type DirIter = Box<dyn Iterator<Item = walkdir::Result<walkdir::DirEntry>>>;

/// Filtered, name-sorted recursive iterator over one directory root.
/// Shared by search and list so both traverse identically.
pub(crate) fn filtered_entries(root: &Path, filter: &PathFilter, follow_symlinks: bool) -> DirIter {
    let filter = filter.clone();
    let entries = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_type().is_dir() {
                filter.should_descend(entry)
            } else {
                filter.should_search(entry)
            }
        });
    Box::new(entries)
}

/// Lazy traversal over a set of roots. Files are classified and searched
/// one at a time as the iterator is driven, so a consumer that stops
/// early leaves the rest of the tree untouched.
pub struct Walk<'a> {
    config: &'a SearchConfig,
    pattern: CompiledPattern,
    filter: PathFilter,
    roots: vec::IntoIter<PathBuf>,
    current: Option<DirIter>,
}

/// Builds a [`Walk`] over `roots`. Pattern and glob compilation happen
/// here, before any I/O, so a bad configuration fails the run as a whole
/// instead of once per file.
pub fn walk<'a>(roots: &[PathBuf], config: &'a SearchConfig) -> Result<Walk<'a>> {
    Ok(Walk {
        pattern: CompiledPattern::new(config)?,
        filter: PathFilter::new(config)?,
        config,
        roots: roots.to_vec().into_iter(),
        current: None,
    })
}

impl Walk<'_> {
    /// Dispatches one root. File roots are searched directly: a path named
    /// explicitly is exempt from the name rules that apply inside a
    /// directory walk, though classification still applies to its content.
    fn enter_root(&mut self, root: PathBuf) -> Option<(PathBuf, TraversalResult)> {
        let metadata = match fs::symlink_metadata(&root) {
            Ok(metadata) => metadata,
            Err(err) => {
                let cause = err.to_string();
                return Some((root, TraversalResult::FileError { cause }));
            }
        };

        let file_type = if metadata.file_type().is_symlink() {
            if !self.config.follow_symlinks {
                debug!("skipping symlink root {}", root.display());
                return None;
            }
            match fs::metadata(&root) {
                Ok(resolved) => resolved.file_type(),
                Err(err) => {
                    let cause = err.to_string();
                    return Some((root, TraversalResult::FileError { cause }));
                }
            }
        } else {
            metadata.file_type()
        };

        if file_type.is_file() {
            let result = self.process_file(&root);
            return Some((root, result));
        }
        if file_type.is_dir() {
            let entries = filtered_entries(&root, &self.filter, self.config.follow_symlinks);
            self.current = Some(entries);
            return None;
        }
        debug!("skipping non-regular root {}", root.display());
        None
    }

    fn process_file(&self, path: &Path) -> TraversalResult {
        match classify(path, self.config) {
            Err(err) => TraversalResult::FileError {
                cause: err.to_string(),
            },
            Ok(ClassifiedContent::Binary) => TraversalResult::Binary,
            Ok(ClassifiedContent::GzipCorrupt) => TraversalResult::GzipCorrupt,
            Ok(ClassifiedContent::Unreadable { cause }) => TraversalResult::Unreadable { cause },
            Ok(ClassifiedContent::Text { lines, .. }) => {
                let spans = self.pattern.find_all(&lines);
                if spans.is_empty() {
                    TraversalResult::NoMatch
                } else {
                    let records = group(
                        path,
                        &lines,
                        &spans,
                        self.config.before_context,
                        self.config.after_context,
                    );
                    TraversalResult::Matches(records)
                }
            }
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = (PathBuf, TraversalResult);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.current.as_mut() {
                Some(entries) => match entries.next() {
                    Some(Ok(entry)) => {
                        // Directories and non-regular files are never opened.
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let path = entry.into_path();
                        let result = self.process_file(&path);
                        return Some((path, result));
                    }
                    Some(Err(err)) => {
                        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                        let cause = err.to_string();
                        return Some((path, TraversalResult::FileError { cause }));
                    }
                    None => self.current = None,
                },
                None => {
                    let root = self.roots.next()?;
                    if let Some(item) = self.enter_root(root) {
                        return Some(item);
                    }
                }
            }
        }
    }
}
