//
//  language.rs
//  Blast
//
//  Created by hak (tharun)
//

use std::path::Path;

/// Extensions tried, in order, when resolving an extensionless specifier.
pub const CANDIDATE_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "vue", "py"];

/// Source languages the import scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLanguage {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
    Vue,
    Python,
}

impl SupportedLanguage {
    /// Map a file extension (case-insensitive, no dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "js" => Some(Self::JavaScript),
            "ts" => Some(Self::TypeScript),
            "jsx" => Some(Self::Jsx),
            "tsx" => Some(Self::Tsx),
            "vue" => Some(Self::Vue),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(SupportedLanguage::from_extension("TSX"), Some(SupportedLanguage::Tsx));
        assert_eq!(SupportedLanguage::from_path(Path::new("a/b.vue")), Some(SupportedLanguage::Vue));
        assert_eq!(SupportedLanguage::from_path(Path::new("README.md")), None);
        assert_eq!(SupportedLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_every_candidate_extension_is_supported() {
        for ext in CANDIDATE_EXTENSIONS {
            assert!(SupportedLanguage::from_extension(ext).is_some(), "{ext}");
        }
    }
}
