//
//  config.rs
//  Blast
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{BlastError, Result};

/// Top-level configuration. Built once and handed to the analyzers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlastConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Project-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root directory to scan (relative to the config file).
    #[serde(default = "default_root")]
    pub root: String,
}

/// Graph building and query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Reverse-edge rounds for affected files and scoring.
    #[serde(default = "default_depth")]
    pub default_depth: usize,
    /// Reverse-edge rounds for "which pages use this file".
    #[serde(default = "default_pages_depth")]
    pub pages_depth: usize,
    /// Gitignore-style patterns excluded from scanning.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Also honor .gitignore files while walking.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
    /// Scan files on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

/// Graph snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// `.bin` selects bincode, anything else JSON.
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

/// Remote repository (GitLab) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub project_id: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Confirm guessed remote paths with a request instead of assuming them.
    #[serde(default)]
    pub verify_resolution: bool,
}

/// Which narrative generator to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Stub,
    OpenAi,
}

/// LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProvider,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Chat webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub mentioned: Vec<String>,
}

/// Incoming push-event settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_allowed_branches")]
    pub allowed_branches: Vec<String>,
    pub token: Option<String>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_depth() -> usize {
    2
}

fn default_pages_depth() -> usize {
    3
}

fn default_ignore() -> Vec<String> {
    [
        "node_modules/",
        "dist/",
        "build/",
        "venv/",
        ".venv/",
        "__pycache__/",
        ".git/",
        ".idea/",
        ".vscode/",
        "*.test.js",
        "*.spec.js",
        "*.test.ts",
        "*.spec.ts",
        "*.test.tsx",
        "*.spec.tsx",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_snapshot_path() -> String {
    ".blast/graph.json".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_allowed_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string(), "develop".to_string()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            pages_depth: default_pages_depth(),
            ignore: default_ignore(),
            respect_gitignore: true,
            parallel: true,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            token: None,
            project_id: None,
            branch: default_branch(),
            verify_resolution: false,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            allowed_branches: default_allowed_branches(),
            token: None,
        }
    }
}

impl BlastConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents)?;
                info!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(BlastError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Overlay secrets and endpoints from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup` (an environment-like source).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CHAT_WEBHOOK_URL") {
            self.notification.webhook_url = Some(url);
            info!("chat webhook URL taken from environment");
        }
        if let Some(key) = lookup("AI_API_KEY") {
            self.ai.api_key = Some(key);
            info!("AI API key taken from environment");
        }
        if let Some(token) = lookup("GITLAB_TOKEN") {
            self.remote.token = Some(token);
            info!("GitLab token taken from environment");
        }
        if let Some(url) = lookup("GITLAB_API_URL") {
            self.remote.api_url = Some(url);
            info!("GitLab API URL taken from environment");
        }
    }

    /// Resolve the project root relative to the config file's directory.
    pub fn resolve_root(&self, config_path: &Path) -> PathBuf {
        let parent = config_path.parent().unwrap_or(Path::new("."));
        parent.join(&self.project.root)
    }

    /// Resolve the snapshot path relative to the project root.
    pub fn resolve_snapshot_path(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshot.path)
    }

    /// Read a scalar setting by dotted key, e.g. `"analysis.default_depth"`.
    ///
    /// Tables and arrays are not returned; unknown keys yield `None`.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut value = toml::Value::try_from(self).ok()?;
        for part in key.split('.') {
            value = value.get(part)?.clone();
        }
        match value {
            toml::Value::String(s) => Some(s),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
