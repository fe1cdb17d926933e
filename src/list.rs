use crate::config::SearchConfig;
use crate::error::Result;
use crate::filter::PathFilter;
use crate::walker::{filtered_entries, DirIter};
use globset::{Glob, GlobMatcher};
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::vec;

/// Iterator over the files a search with the same filters would open,
/// in the same order, without any content I/O. Unreadable entries are
/// passed over silently.
pub struct FileList {
    filter: PathFilter,
    follow_symlinks: bool,
    name_glob: Option<GlobMatcher>,
    roots: vec::IntoIter<PathBuf>,
    current: Option<DirIter>,
}

pub fn list_files(
    roots: &[PathBuf],
    config: &SearchConfig,
    name_glob: Option<&str>,
) -> Result<FileList> {
    let name_glob = match name_glob {
        Some(pattern) => Some(Glob::new(pattern)?.compile_matcher()),
        None => None,
    };
    Ok(FileList {
        filter: PathFilter::new(config)?,
        follow_symlinks: config.follow_symlinks,
        name_glob,
        roots: roots.to_vec().into_iter(),
        current: None,
    })
}

impl FileList {
    fn matches_glob(&self, path: &Path) -> bool {
        match (&self.name_glob, path.file_name()) {
            (Some(glob), Some(name)) => glob.is_match(name),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn enter_root(&mut self, root: PathBuf) -> Option<PathBuf> {
        let metadata = match fs::symlink_metadata(&root) {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!("passing over {}: {err}", root.display());
                return None;
            }
        };

        let file_type = if metadata.file_type().is_symlink() {
            if !self.follow_symlinks {
                debug!("skipping symlink root {}", root.display());
                return None;
            }
            match fs::metadata(&root) {
                Ok(resolved) => resolved.file_type(),
                Err(err) => {
                    debug!("passing over {}: {err}", root.display());
                    return None;
                }
            }
        } else {
            metadata.file_type()
        };

        if file_type.is_file() {
            if self.matches_glob(&root) {
                return Some(root);
            }
            return None;
        }
        if file_type.is_dir() {
            self.current = Some(filtered_entries(&root, &self.filter, self.follow_symlinks));
        }
        None
    }
}

impl Iterator for FileList {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.current.as_mut() {
                Some(entries) => match entries.next() {
                    Some(Ok(entry)) => {
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let path = entry.into_path();
                        if self.matches_glob(&path) {
                            return Some(path);
                        }
                    }
                    Some(Err(err)) => debug!("passing over directory entry: {err}"),
                    None => self.current = None,
                },
                None => {
                    let root = self.roots.next()?;
                    if let Some(path) = self.enter_root(root) {
                        return Some(path);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub long: bool,
    pub null_separated: bool,
}

pub fn write_entry(out: &mut dyn Write, path: &Path, options: &ListOptions) -> io::Result<()> {
    if options.long {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        write!(
            out,
            "{:<60} {:>8} KB {}",
            path.display(),
            size / 1024,
            extension
        )?;
    } else {
        write!(out, "{}", path.display())?;
    }
    if options.null_separated {
        out.write_all(b"\0")?;
    } else {
        writeln!(out)?;
    }
    Ok(())
}
