//
//  report.rs
//  Blast
//
//  Created by hak (tharun)
//

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::config::NotificationConfig;
use crate::error::{BlastError, Result};
use crate::event::CommitInfo;
use crate::graph::ImpactResult;

const LISTED_FILES: usize = 10;
const NARRATIVE_EXCERPT: usize = 300;
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything known about one push, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    pub commit: CommitInfo,
    pub changed_files: Vec<String>,
    pub impact: ImpactResult,
    pub assessment: Option<String>,
    pub impact_analysis: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ImpactReport {
    pub fn new(commit: CommitInfo, changed_files: Vec<String>, impact: ImpactResult) -> Self {
        Self {
            commit,
            changed_files,
            impact,
            assessment: None,
            impact_analysis: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_narrative(mut self, assessment: String, impact_analysis: String) -> Self {
        self.assessment = Some(assessment);
        self.impact_analysis = Some(impact_analysis);
        self
    }

    pub fn render_markdown(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImpactReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.commit;
        writeln!(f, "# Change impact report\n")?;
        writeln!(f, "## Commit")?;
        writeln!(f, "- **Author**: {}", c.author)?;
        writeln!(f, "- **Time**: {}", c.time)?;
        writeln!(f, "- **Branch**: {}", c.branch)?;
        writeln!(f, "- **Message**: {}", c.message)?;
        writeln!(f, "- **Changed files**: {}\n", self.changed_files.len())?;

        writeln!(f, "## Changed files")?;
        for file in self.changed_files.iter().take(LISTED_FILES) {
            writeln!(f, "- `{file}`")?;
        }
        if self.changed_files.len() > LISTED_FILES {
            writeln!(f, "- ... {} more", self.changed_files.len() - LISTED_FILES)?;
        }
        writeln!(f)?;

        writeln!(f, "## Blast radius")?;
        writeln!(f, "- **Impact score**: {}", self.impact.impact_score)?;
        let downstream: Vec<String> = self
            .impact
            .downstream()
            .take(LISTED_FILES)
            .map(|file| format!("`{file}`"))
            .collect();
        if downstream.is_empty() {
            writeln!(f, "- **Affected files**: none beyond the change")?;
        } else {
            writeln!(f, "- **Affected files**: {}", downstream.join(", "))?;
        }
        for path in &self.impact.critical_paths {
            writeln!(f, "- `{}` ← `{}`", path.source, path.dependent)?;
        }

        if let Some(text) = &self.assessment {
            writeln!(f, "\n## Assessment\n{}", excerpt(text))?;
        }
        if let Some(text) = &self.impact_analysis {
            writeln!(f, "\n## Impact analysis\n{}", excerpt(text))?;
        }
        writeln!(f, "\n_Generated {}_", self.generated_at.to_rfc3339())
    }
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(NARRATIVE_EXCERPT).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Posts markdown messages to a group-chat robot webhook.
#[derive(Debug, Clone)]
pub struct ChatNotifier {
    webhook_url: String,
    mentioned: Vec<String>,
    http: Client,
}

impl ChatNotifier {
    pub fn new(webhook_url: &str, mentioned: Vec<String>) -> Result<Self> {
        if webhook_url.trim().is_empty() {
            return Err(BlastError::Config("chat webhook URL is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| BlastError::Notification(e.to_string()))?;
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            mentioned,
            http,
        })
    }

    /// `None` when no webhook URL is configured.
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>> {
        match config.webhook_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                Self::new(url, config.mentioned.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn send_markdown(&self, content: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&markdown_payload(content, &self.mentioned))
            .send()
            .map_err(|e| BlastError::Notification(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlastError::Notification(format!("webhook returned {status}")));
        }
        let body: serde_json::Value = response
            .json()
            .map_err(|e| BlastError::Notification(e.to_string()))?;
        match body.get("errcode").and_then(|c| c.as_i64()) {
            Some(0) | None => {
                info!("chat notification sent");
                Ok(())
            }
            Some(code) => Err(BlastError::Notification(format!(
                "webhook error {code}: {}",
                body.get("errmsg").and_then(|m| m.as_str()).unwrap_or("unknown")
            ))),
        }
    }
}

fn markdown_payload(content: &str, mentioned: &[String]) -> serde_json::Value {
    json!({
        "msgtype": "markdown",
        "markdown": {
            "content": content,
            "mentioned_list": mentioned,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CriticalPath, FileIdentity};

    fn report(files: usize) -> ImpactReport {
        let changed: Vec<String> = (0..files).map(|i| format!("src/f{i:02}.ts")).collect();
        let impact = ImpactResult {
            changed_files: [FileIdentity::from("src/f00.ts")].into_iter().collect(),
            affected_files: [FileIdentity::from("src/f00.ts"), FileIdentity::from("src/page.vue")]
                .into_iter()
                .collect(),
            impact_score: 2.0,
            critical_paths: vec![CriticalPath {
                source: "src/f00.ts".into(),
                dependent: "src/page.vue".into(),
            }],
        };
        let commit = CommitInfo {
            author: "Jordan".into(),
            branch: "main".into(),
            message: "fix nav".into(),
            ..CommitInfo::default()
        };
        ImpactReport::new(commit, changed, impact)
    }

    #[test]
    fn test_markdown_lists_first_ten_files() {
        let md = report(12).render_markdown();
        assert!(md.contains("- **Author**: Jordan"));
        assert!(md.contains("`src/f09.ts`"));
        assert!(!md.contains("`src/f10.ts`"));
        assert!(md.contains("... 2 more"));
        assert!(md.contains("- **Impact score**: 2"));
        assert!(md.contains("- **Affected files**: `src/page.vue`"));
        assert!(md.contains("`src/f00.ts` ← `src/page.vue`"));
        assert!(!md.contains("## Assessment"));
    }

    #[test]
    fn test_narrative_is_truncated() {
        let md = report(1)
            .with_narrative("a".repeat(400), "short".to_string())
            .render_markdown();
        assert!(md.contains(&format!("{}...", "a".repeat(300))));
        assert!(md.contains("## Impact analysis\nshort\n"));
    }

    #[test]
    fn test_display_renders_every_section_in_order() {
        let report = report(1).with_narrative("risky".to_string(), "check nav".to_string());
        let md = format!("{report}");
        assert_eq!(md, report.render_markdown());
        let order = ["## Commit", "## Changed files", "## Blast radius", "## Assessment", "## Impact analysis", "_Generated "];
        let positions: Vec<usize> = order.iter().map(|h| md.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(md.ends_with("_\n"));
    }

    #[test]
    fn test_payload_shape() {
        let payload = markdown_payload("# hi", &["@all".to_string()]);
        assert_eq!(payload["msgtype"], "markdown");
        assert_eq!(payload["markdown"]["content"], "# hi");
        assert_eq!(payload["markdown"]["mentioned_list"][0], "@all");
    }

    #[test]
    fn test_notifier_configuration() {
        assert!(ChatNotifier::from_config(&NotificationConfig::default()).unwrap().is_none());
        assert!(matches!(ChatNotifier::new("  ", vec![]), Err(BlastError::Config(_))));
        let notifier = ChatNotifier::new("http://127.0.0.1:9/hook", vec![]).unwrap();
        assert!(matches!(notifier.send_markdown("x"), Err(BlastError::Notification(_))));
    }
}
