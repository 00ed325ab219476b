//
//  resolver.rs
//  Blast
//
//  Created by hak (tharun)
//

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::graph::{clean_path, FileIdentity};
use crate::parser::{SupportedLanguage, CANDIDATE_EXTENSIONS};

/// Read access to files in a remote copy of the repository.
///
/// Implementations swallow their own transport errors and return `None`.
pub trait RemoteFileAccessor: Send + Sync {
    fn file_content(&self, repo_key: &str, path: &str, git_ref: &str) -> Option<String>;
}

/// A remote accessor bound to one repository and ref.
#[derive(Clone)]
pub struct RemoteSource {
    accessor: Arc<dyn RemoteFileAccessor>,
    pub repo_key: String,
    pub git_ref: String,
}

impl RemoteSource {
    pub fn new(
        accessor: Arc<dyn RemoteFileAccessor>,
        repo_key: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            accessor,
            repo_key: repo_key.into(),
            git_ref: git_ref.into(),
        }
    }

    /// Fetch a root-relative file from the remote repository.
    pub fn fetch(&self, id: &FileIdentity) -> Option<String> {
        debug!(repo = %self.repo_key, path = %id, git_ref = %self.git_ref, "fetching remote file");
        self.accessor
            .file_content(&self.repo_key, id.as_str(), &self.git_ref)
    }
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource")
            .field("repo_key", &self.repo_key)
            .field("git_ref", &self.git_ref)
            .finish_non_exhaustive()
    }
}

/// Maps raw import specifiers to file identities inside a project.
///
/// Resolution order, first hit wins:
/// 1. relative (`./`, `../`) against the importing file's directory,
///    as-is, with each candidate extension, then as a directory `index` file;
/// 2. under `<root>/` and `<root>/src/`, for bare specifiers and for
///    relative ones that missed rule 1;
/// 3. Python dotted modules translated to path form, retried through 1–2;
/// 4. the remote fallback, when a remote source is configured.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    remote: Option<RemoteSource>,
    verify_remote: bool,
}

impl PathResolver {
    /// `root` should be absolute; relative source paths are joined onto it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remote: None,
            verify_remote: false,
        }
    }

    /// Enable the remote fallback.
    ///
    /// With `verify` off, a guessed remote path is accepted without a
    /// round-trip and only checked when its content is fetched later. With
    /// `verify` on, each guess costs one remote request.
    pub fn with_remote(mut self, remote: RemoteSource, verify: bool) -> Self {
        self.remote = Some(remote);
        self.verify_remote = verify;
        self
    }

    /// Resolve `specifier`, found in `source_file`, to a project file.
    ///
    /// `None` is the normal answer for third-party packages.
    pub fn resolve(&self, source_file: &Path, specifier: &str) -> Option<FileIdentity> {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            return None;
        }
        let source = self.absolute(source_file);

        if let Some(found) = self.resolve_local(&source, specifier) {
            return Some(self.identity(&found));
        }

        if SupportedLanguage::from_path(&source) == Some(SupportedLanguage::Python) {
            if let Some(module) = python_module_path(specifier) {
                if let Some(found) = self.resolve_local(&source, &module) {
                    return Some(self.identity(&found));
                }
            }
        }

        self.resolve_remote(&source, specifier)
    }

    fn resolve_local(&self, source: &Path, specifier: &str) -> Option<PathBuf> {
        if is_relative(specifier) {
            let base = source.parent().unwrap_or(self.root.as_path()).join(specifier);
            if let Some(found) = probe_file(&base).or_else(|| probe_index(&base)) {
                return Some(found);
            }
        }

        // Bases that climb out of the root are never project files.
        let bare = specifier.trim_start_matches('/');
        let root = clean_path(&self.root);
        let bases: Vec<PathBuf> = [root.join(bare), root.join("src").join(bare)]
            .iter()
            .map(|base| clean_path(base))
            .filter(|base| base.starts_with(&root))
            .collect();
        if has_candidate_extension(bare) {
            if let Some(found) = bases.iter().find(|b| b.is_file()) {
                return Some(found.clone());
            }
        }
        CANDIDATE_EXTENSIONS.iter().find_map(|ext| {
            bases
                .iter()
                .map(|base| with_extension(base, ext))
                .find(|candidate| candidate.is_file())
        })
    }

    fn resolve_remote(&self, source: &Path, specifier: &str) -> Option<FileIdentity> {
        let remote = self.remote.as_ref()?;

        let mut shapes: Vec<PathBuf> = Vec::with_capacity(3);
        if is_relative(specifier) {
            let source_id = self.identity(source);
            let dir = Path::new(source_id.as_str())
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            shapes.push(clean_path(&dir.join(specifier)));
        }
        shapes.push(clean_path(Path::new(specifier.trim_start_matches('/'))));
        shapes.push(clean_path(&Path::new("src").join(specifier.trim_start_matches('/'))));

        for shape in &shapes {
            for ext in CANDIDATE_EXTENSIONS {
                let candidate = FileIdentity::from_path(&with_extension(shape, ext), None);
                if self.root.join(candidate.as_str()).exists() {
                    continue;
                }
                if !self.verify_remote {
                    debug!(specifier, path = %candidate, "assuming file exists in remote repository");
                    return Some(candidate);
                }
                if remote.fetch(&candidate).is_some() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn identity(&self, path: &Path) -> FileIdentity {
        FileIdentity::from_path(path, Some(&self.root))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn has_candidate_extension(specifier: &str) -> bool {
    Path::new(specifier)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CANDIDATE_EXTENSIONS.contains(&e))
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn probe_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| with_extension(base, ext))
        .find(|candidate| candidate.is_file())
}

fn probe_index(dir: &Path) -> Option<PathBuf> {
    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("index.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Translate a dotted Python module into a path-style specifier.
///
/// `pkg.mod` -> `pkg/mod`, `.sibling` -> `./sibling`, `..up.mod` -> `../up/mod`.
fn python_module_path(specifier: &str) -> Option<String> {
    if specifier.contains('/') {
        return None;
    }
    let dots = specifier.chars().take_while(|&c| c == '.').count();
    let rest = &specifier[dots..];
    if rest.is_empty() || (dots == 0 && !rest.contains('.')) {
        return None;
    }
    let module = rest.replace('.', "/");
    let prefix = match dots {
        0 => String::new(),
        1 => "./".to_string(),
        n => "../".repeat(n - 1),
    };
    Some(format!("{prefix}{module}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    fn project(files: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        dir
    }

    #[derive(Default)]
    struct FakeRemote {
        files: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl RemoteFileAccessor for FakeRemote {
        fn file_content(&self, _repo_key: &str, path: &str, _git_ref: &str) -> Option<String> {
            self.requests.lock().unwrap().push(path.to_string());
            self.files.get(path).cloned()
        }
    }

    #[test]
    fn test_relative_specifier_gets_extension() {
        let dir = project(&["src/app.py", "src/util.py"]);
        let resolver = PathResolver::new(dir.path());
        let id = resolver.resolve(Path::new("src/app.py"), "./util");
        assert_eq!(id, Some(FileIdentity::from("src/util.py")));
    }

    #[test]
    fn test_relative_specifier_from_absolute_source() {
        let dir = project(&["src/views/home.vue", "src/api/user.ts"]);
        let resolver = PathResolver::new(dir.path());
        let source = dir.path().join("src/views/home.vue");
        let id = resolver.resolve(&source, "../api/user");
        assert_eq!(id, Some(FileIdentity::from("src/api/user.ts")));
    }

    #[test]
    fn test_relative_specifier_with_explicit_extension() {
        let dir = project(&["src/a.js", "src/b.vue"]);
        let resolver = PathResolver::new(dir.path());
        let id = resolver.resolve(Path::new("src/a.js"), "./b.vue");
        assert_eq!(id, Some(FileIdentity::from("src/b.vue")));
    }

    #[test]
    fn test_relative_directory_index() {
        let dir = project(&["src/main.ts", "src/store/index.ts"]);
        let resolver = PathResolver::new(dir.path());
        let id = resolver.resolve(Path::new("src/main.ts"), "./store");
        assert_eq!(id, Some(FileIdentity::from("src/store/index.ts")));
    }

    #[test]
    fn test_extension_order_prefers_js() {
        let dir = project(&["src/main.ts", "src/lib.js", "src/lib.ts"]);
        let resolver = PathResolver::new(dir.path());
        let id = resolver.resolve(Path::new("src/main.ts"), "./lib");
        assert_eq!(id, Some(FileIdentity::from("src/lib.js")));
    }

    #[test]
    fn test_bare_specifier_under_root_and_src() {
        let dir = project(&["config.js", "src/services/auth.ts", "src/main.ts"]);
        let resolver = PathResolver::new(dir.path());
        assert_eq!(
            resolver.resolve(Path::new("src/main.ts"), "config"),
            Some(FileIdentity::from("config.js"))
        );
        assert_eq!(
            resolver.resolve(Path::new("src/main.ts"), "services/auth"),
            Some(FileIdentity::from("src/services/auth.ts"))
        );
    }

    #[test]
    fn test_relative_miss_falls_back_to_root_and_src() {
        let dir = project(&["src/pages/home.js", "src/util.js", "shared.ts"]);
        let resolver = PathResolver::new(dir.path());
        let source = Path::new("src/pages/home.js");
        assert_eq!(resolver.resolve(source, "./util"), Some(FileIdentity::from("src/util.js")));
        assert_eq!(resolver.resolve(source, "./shared"), Some(FileIdentity::from("shared.ts")));
        assert_eq!(resolver.resolve(source, "../../../outside"), None);
    }

    #[test]
    fn test_third_party_package_is_unresolved() {
        let dir = project(&["src/main.js"]);
        let resolver = PathResolver::new(dir.path());
        assert_eq!(resolver.resolve(Path::new("src/main.js"), "lodash"), None);
        assert_eq!(resolver.resolve(Path::new("src/main.js"), "./missing"), None);
        assert_eq!(resolver.resolve(Path::new("src/main.js"), "  "), None);
    }

    #[test]
    fn test_python_dotted_modules() {
        let dir = project(&["app/main.py", "app/models.py", "app/core/db.py", "shared/log.py"]);
        let resolver = PathResolver::new(dir.path());
        let source = Path::new("app/main.py");
        assert_eq!(resolver.resolve(source, ".models"), Some(FileIdentity::from("app/models.py")));
        assert_eq!(resolver.resolve(source, "app.core.db"), Some(FileIdentity::from("app/core/db.py")));
        assert_eq!(resolver.resolve(source, "..shared.log"), Some(FileIdentity::from("shared/log.py")));
        assert_eq!(resolver.resolve(source, "os"), None);
    }

    #[test]
    fn test_remote_fallback_is_optimistic_by_default() {
        let dir = project(&["src/main.ts"]);
        let remote = Arc::new(FakeRemote::default());
        let resolver = PathResolver::new(dir.path())
            .with_remote(RemoteSource::new(remote.clone(), "42", "main"), false);

        let id = resolver.resolve(Path::new("src/main.ts"), "./components/Nav");
        assert_eq!(id, Some(FileIdentity::from("src/components/Nav.js")));
        assert!(remote.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_fallback_with_verification() {
        let dir = project(&["src/main.ts"]);
        let mut fake = FakeRemote::default();
        fake.files
            .insert("src/components/Nav.vue".to_string(), "<template/>".to_string());
        let remote = Arc::new(fake);
        let resolver = PathResolver::new(dir.path())
            .with_remote(RemoteSource::new(remote.clone(), "42", "main"), true);

        let id = resolver.resolve(Path::new("src/main.ts"), "./components/Nav");
        assert_eq!(id, Some(FileIdentity::from("src/components/Nav.vue")));
        assert!(resolver.resolve(Path::new("src/main.ts"), "lodash").is_none());
    }

    #[test]
    fn test_python_module_path_translation() {
        assert_eq!(python_module_path("a.b.c").as_deref(), Some("a/b/c"));
        assert_eq!(python_module_path(".x").as_deref(), Some("./x"));
        assert_eq!(python_module_path("...x.y").as_deref(), Some("../../x/y"));
        assert_eq!(python_module_path("plain"), None);
        assert_eq!(python_module_path("."), None);
        assert_eq!(python_module_path("./x"), None);
    }
}
