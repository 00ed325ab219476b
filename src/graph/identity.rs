//
//  identity.rs
//  Blast
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical key for a file in the dependency graph.
///
/// Always relative to the project root (when one is known) and always
/// forward-slash separated, whatever the host OS uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentity(String);

impl FileIdentity {
    /// Build an identity from an already-normalized key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(unify_separators(&key.into()))
    }

    /// Normalize a filesystem path into an identity.
    ///
    /// Absolute paths under `root` become root-relative. Relative paths are
    /// taken to be root-relative already. `.` and `..` segments are folded.
    pub fn from_path(path: &Path, root: Option<&Path>) -> Self {
        let relative = match root {
            Some(root) if path.is_absolute() => {
                let cleaned_root = clean_path(root);
                let cleaned = clean_path(path);
                match cleaned.strip_prefix(&cleaned_root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => cleaned,
                }
            }
            _ => clean_path(path),
        };
        Self::new(relative.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension (lowercased, without the dot).
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.0)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FileIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FileIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileIdentity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for FileIdentity {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl PartialEq<str> for FileIdentity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FileIdentity {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn unify_separators(key: &str) -> String {
    key.replace('\\', "/")
}

/// Lexically fold `.` and `..` components without touching the filesystem.
///
/// Leading `..` on a relative path is preserved; `..` above an absolute
/// root is dropped.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
