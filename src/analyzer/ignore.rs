//
//  ignore.rs
//  Blast
//
//  Created by hak (tharun)
//

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

use crate::error::{BlastError, Result};

/// Gitignore-style exclusion rules applied before any file is read.
///
/// `dir/` patterns exclude a directory wherever it appears, `*.ext`
/// patterns match file names at any depth, and `!pattern` re-includes.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    matcher: Gitignore,
}

impl IgnorePolicy {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder
                .add_line(None, pattern.as_ref())
                .map_err(|e| BlastError::Pattern(e.to_string()))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| BlastError::Pattern(e.to_string()))?;
        Ok(Self { matcher })
    }

    /// Whether a root-relative path, or any directory above it, is excluded.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(Path::new(relative), is_dir)
            .is_ignore()
    }
}
