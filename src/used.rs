// Used-set store: the plain-text record of memes that were already posted,
// one file name per line, only ever appended to.

use crate::errors::{MemeError, MemeResult};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Snapshot of every meme that has already been posted, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedSet {
    items: Vec<String>,
}

impl UsedSet {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|used| used == item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

/// Append-only, one-identifier-per-line store backing the used-set.
#[derive(Debug, Clone)]
pub struct UsedStore {
    path: PathBuf,
}

impl UsedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole store. A store that does not exist yet is an empty set;
    /// any other read failure is reported.
    pub fn load(&self) -> MemeResult<UsedSet> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No used-set at {}, starting with an empty one",
                    self.path.display()
                );
                return Ok(UsedSet::default());
            }
            Err(e) => return Err(self.storage_error(e)),
        };
        // Names are matched byte for byte; only a CRLF line ending is undone.
        let items = raw
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(UsedSet::new(items))
    }

    /// Append `items`, one per line. Existing content is neither reread nor
    /// deduplicated, so callers must only pass items not already in the set.
    pub fn commit(&self, items: &[String]) -> MemeResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
            }
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.storage_error(e))?;

        let mut buf = String::new();
        if !ends_with_newline(&mut file).map_err(|e| self.storage_error(e))? {
            buf.push('\n');
        }
        for item in items {
            buf.push_str(item);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| self.storage_error(e))?;
        log::debug!("Appended {} item(s) to {}", items.len(), self.path.display());
        Ok(())
    }

    fn storage_error(&self, source: io::Error) -> MemeError {
        MemeError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

// An empty file counts as terminated.
fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
