//
//  event.rs
//  Blast
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::config::WebhookConfig;

/// GitLab push hook payload. Only the fields the analysis needs are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub object_kind: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub checkout_sha: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub total_commits_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Summary of the newest commit of a push, for reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub author: String,
    pub email: String,
    pub time: String,
    pub branch: String,
    pub message: String,
    pub commit_id: String,
    pub total_commits: u64,
    pub project_id: String,
    pub project_name: String,
}

impl PushEvent {
    pub fn from_json(payload: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    fn kind(&self) -> Option<&str> {
        self.event_name.as_deref().or(self.object_kind.as_deref())
    }

    /// Branch name from `refs/heads/<branch>`.
    pub fn branch(&self) -> Option<&str> {
        let git_ref = self.git_ref.as_deref()?;
        Some(
            git_ref
                .strip_prefix("refs/heads/")
                .unwrap_or_else(|| git_ref.rsplit('/').next().unwrap_or(git_ref)),
        )
    }

    /// Every path added, modified or removed by any commit, sorted and unique.
    pub fn changed_files(&self) -> Vec<String> {
        self.commits
            .iter()
            .flat_map(|c| c.added.iter().chain(&c.modified).chain(&c.removed))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn commit_info(&self) -> CommitInfo {
        let last = self.commits.last();
        let author = last.and_then(|c| c.author.as_ref());
        CommitInfo {
            author: self
                .user_name
                .clone()
                .or_else(|| author.map(|a| a.name.clone()))
                .unwrap_or_else(|| "unknown".to_string()),
            email: author.map(|a| a.email.clone()).unwrap_or_default(),
            time: last.map(|c| c.timestamp.clone()).unwrap_or_default(),
            branch: self.branch().unwrap_or_default().to_string(),
            message: last.map(|c| c.message.trim().to_string()).unwrap_or_default(),
            commit_id: last.map(|c| c.id.clone()).unwrap_or_default(),
            total_commits: self.total_commits_count,
            project_id: self
                .project_id
                .or_else(|| self.project.as_ref().and_then(|p| p.id))
                .map(|id| id.to_string())
                .unwrap_or_default(),
            project_name: self
                .project
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        }
    }
}

/// What to do with an incoming hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDecision {
    /// Analyze the push on this branch.
    Accept { branch: String },
    /// Acknowledge without analysis.
    Ignore(String),
    /// Refuse: bad token or unusable payload.
    Reject(String),
}

/// Token and branch filter for push hooks.
#[derive(Debug, Clone)]
pub struct WebhookPolicy {
    allowed_branches: Vec<String>,
    token: Option<String>,
}

impl WebhookPolicy {
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            allowed_branches: config.allowed_branches.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// `presented_token` is the `X-Gitlab-Token` header value, if any.
    pub fn evaluate(&self, event: &PushEvent, presented_token: Option<&str>) -> WebhookDecision {
        if let Some(expected) = &self.token {
            if presented_token != Some(expected.as_str()) {
                warn!("webhook token mismatch");
                return WebhookDecision::Reject("token mismatch".to_string());
            }
        }
        match event.kind() {
            Some("push") => {}
            other => {
                let kind = other.unwrap_or("unknown");
                info!(kind, "ignoring non-push event");
                return WebhookDecision::Ignore(format!("not a push event: {kind}"));
            }
        }
        let Some(branch) = event.branch() else {
            return WebhookDecision::Reject("push event without ref".to_string());
        };
        if !self.allowed_branches.iter().any(|b| b == branch) {
            info!(branch, "ignoring push to branch outside the allow list");
            return WebhookDecision::Ignore(format!("branch not allowed: {branch}"));
        }
        WebhookDecision::Accept {
            branch: branch.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "object_kind": "push",
        "event_name": "push",
        "ref": "refs/heads/main",
        "user_name": "Jordan",
        "project_id": 15,
        "project": {"id": 15, "name": "web-portal"},
        "total_commits_count": 2,
        "commits": [
            {"id": "a1", "message": "add api", "timestamp": "2026-10-01T10:00:00+00:00",
             "author": {"name": "Jordan", "email": "j@example.com"},
             "added": ["src/api/user.ts"], "modified": ["src/main.ts"], "removed": []},
            {"id": "b2", "message": "fix nav\n", "timestamp": "2026-10-01T11:00:00+00:00",
             "author": {"name": "Jordan", "email": "j@example.com"},
             "added": [], "modified": ["src/main.ts", "src/components/Nav.vue"], "removed": ["src/old.js"]}
        ]
    }"#;

    fn policy(token: Option<&str>) -> WebhookPolicy {
        WebhookPolicy::new(&WebhookConfig {
            token: token.map(String::from),
            ..WebhookConfig::default()
        })
    }

    #[test]
    fn test_changed_files_are_unique_and_sorted() {
        let event = PushEvent::from_json(PAYLOAD).unwrap();
        assert_eq!(
            event.changed_files(),
            vec!["src/api/user.ts", "src/components/Nav.vue", "src/main.ts", "src/old.js"]
        );
    }

    #[test]
    fn test_commit_info_uses_last_commit() {
        let info = PushEvent::from_json(PAYLOAD).unwrap().commit_info();
        assert_eq!(info.author, "Jordan");
        assert_eq!(info.branch, "main");
        assert_eq!(info.message, "fix nav");
        assert_eq!(info.commit_id, "b2");
        assert_eq!(info.total_commits, 2);
        assert_eq!(info.project_id, "15");
        assert_eq!(info.project_name, "web-portal");
    }

    #[test]
    fn test_policy_accepts_allowed_branch() {
        let event = PushEvent::from_json(PAYLOAD).unwrap();
        assert_eq!(
            policy(None).evaluate(&event, None),
            WebhookDecision::Accept { branch: "main".to_string() }
        );
    }

    #[test]
    fn test_policy_token_and_branch_filters() {
        let mut event = PushEvent::from_json(PAYLOAD).unwrap();
        let guarded = policy(Some("s3cret"));
        assert!(matches!(guarded.evaluate(&event, None), WebhookDecision::Reject(_)));
        assert!(matches!(guarded.evaluate(&event, Some("nope")), WebhookDecision::Reject(_)));
        assert!(matches!(guarded.evaluate(&event, Some("s3cret")), WebhookDecision::Accept { .. }));

        event.git_ref = Some("refs/heads/feature/login".to_string());
        assert_eq!(
            policy(None).evaluate(&event, None),
            WebhookDecision::Ignore("branch not allowed: feature/login".to_string())
        );

        event.event_name = Some("tag_push".to_string());
        assert!(matches!(policy(None).evaluate(&event, None), WebhookDecision::Ignore(_)));
    }

    #[test]
    fn test_missing_ref_is_rejected() {
        let event = PushEvent {
            event_name: Some("push".to_string()),
            ..PushEvent::default()
        };
        assert!(matches!(policy(None).evaluate(&event, None), WebhookDecision::Reject(_)));
    }
}
