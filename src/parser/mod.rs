//
//  mod.rs
//  Blast
//
//  Created by hak (tharun)
//

pub mod imports;
pub mod language;

pub use imports::ImportExtractor;
pub use language::{SupportedLanguage, CANDIDATE_EXTENSIONS};

use std::fs;
use std::path::Path;

use crate::error::{BlastError, Result};

/// Read a source file as UTF-8 text.
///
/// Binary content is reported as [`BlastError::NotUtf8`] rather than decoded
/// lossily.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| BlastError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| BlastError::NotUtf8(path.to_path_buf()))
}
