use crate::builder::WalkOrder;
use crate::entry::WalkEntry;
use crate::error::WalkError;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Depth-first iterator over filesystem entries.
pub struct Walker {
    follow_symlinks: bool,
    order: WalkOrder,
    pending_root: Option<WalkEntry>,
    stack: Vec<DirectoryState>,
    finished: bool,
}

impl Walker {
    pub(crate) fn new(
        root: PathBuf,
        follow_symlinks: bool,
        include_root: bool,
        order: WalkOrder,
    ) -> Result<Self, WalkError> {
        let root = absolutize(root)?;
        trace!(target: "walk", ?root, ?order, "starting traversal");

        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;

        let mut walker = Self {
            follow_symlinks,
            order,
            pending_root: None,
            stack: Vec::new(),
            finished: false,
        };

        let resolved = walker.resolve(&root, &metadata)?;
        let entry = WalkEntry {
            full_path: root.clone(),
            relative_path: PathBuf::new(),
            metadata,
            resolved,
            depth: 0,
            is_root: true,
        };

        walker.pending_root = if entry.is_dir() {
            walker.descend(root, PathBuf::new(), 0, include_root.then_some(entry))?
        } else {
            include_root.then_some(entry)
        };

        Ok(walker)
    }

    fn resolve(
        &self,
        path: &Path,
        metadata: &fs::Metadata,
    ) -> Result<Option<fs::Metadata>, WalkError> {
        if !(self.follow_symlinks && metadata.file_type().is_symlink()) {
            return Ok(None);
        }
        match fs::metadata(path) {
            Ok(target) => Ok(Some(target)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                trace!(target: "walk", ?path, "dangling symlink");
                Ok(None)
            }
            Err(error) => Err(WalkError::metadata(path.to_path_buf(), error)),
        }
    }

    /// Pushes a directory onto the stack and returns the entry that should be
    /// yielded right away, if any.
    fn descend(
        &mut self,
        fs_path: PathBuf,
        relative_prefix: PathBuf,
        depth: usize,
        entry: Option<WalkEntry>,
    ) -> Result<Option<WalkEntry>, WalkError> {
        let canonical = fs::canonicalize(&fs_path)
            .map_err(|error| WalkError::canonicalize(fs_path.clone(), error))?;
        // Only a directory on the current path forms a cycle; siblings that
        // reach the same directory are walked again.
        if self.stack.iter().any(|state| state.canonical == canonical) {
            trace!(target: "walk", ?fs_path, "skipping symlink back to an ancestor");
            return Ok(entry);
        }

        let mut state = DirectoryState::new(fs_path, canonical, relative_prefix, depth)?;
        let yielded = match self.order {
            WalkOrder::PreOrder => entry,
            WalkOrder::PostOrder => {
                state.deferred = entry;
                None
            }
        };
        self.stack.push(state);
        Ok(yielded)
    }

    fn visit(
        &mut self,
        full_path: PathBuf,
        relative_path: PathBuf,
        depth: usize,
    ) -> Result<Option<WalkEntry>, WalkError> {
        let metadata = fs::symlink_metadata(&full_path)
            .map_err(|error| WalkError::metadata(full_path.clone(), error))?;
        let resolved = self.resolve(&full_path, &metadata)?;

        let entry = WalkEntry {
            full_path: full_path.clone(),
            relative_path: relative_path.clone(),
            metadata,
            resolved,
            depth,
            is_root: false,
        };

        if entry.is_dir() {
            self.descend(full_path, relative_path, depth, Some(entry))
        } else {
            Ok(Some(entry))
        }
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(entry) = self.pending_root.take() {
            return Some(Ok(entry));
        }

        loop {
            let next = {
                let state = self.stack.last_mut()?;
                match state.next_name() {
                    Some(name) => {
                        let full_path = state.fs_path.join(&name);
                        let relative_path = state.relative_prefix.join(&name);
                        Some((full_path, relative_path, state.depth + 1))
                    }
                    None => None,
                }
            };

            let Some((full_path, relative_path, depth)) = next else {
                if let Some(entry) = self.stack.pop().and_then(|state| state.deferred) {
                    return Some(Ok(entry));
                }
                continue;
            };

            match self.visit(full_path, relative_path, depth) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

#[derive(Debug)]
struct DirectoryState {
    fs_path: PathBuf,
    canonical: PathBuf,
    relative_prefix: PathBuf,
    entries: Vec<OsString>,
    index: usize,
    depth: usize,
    deferred: Option<WalkEntry>,
}

impl DirectoryState {
    fn new(
        fs_path: PathBuf,
        canonical: PathBuf,
        relative_prefix: PathBuf,
        depth: usize,
    ) -> Result<Self, WalkError> {
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;
        let mut entries = read_dir
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;
        entries.sort();

        trace!(target: "walk", ?fs_path, count = entries.len(), "entering directory");

        Ok(Self {
            fs_path,
            canonical,
            relative_prefix,
            entries,
            index: 0,
            depth,
            deferred: None,
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        let name = self.entries.get(self.index).cloned();
        if name.is_some() {
            self.index += 1;
        }
        name
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir()
            .map_err(|error| WalkError::canonicalize(PathBuf::from("."), error))?;
        Ok(cwd.join(path))
    }
}
