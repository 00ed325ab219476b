//
//  narrative.rs
//  Blast
//
//  Created by hak (tharun)
//

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{AiConfig, AiProvider};
use crate::error::{BlastError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Produces prose about a code change.
pub trait NarrativeGenerator: Send + Sync {
    /// General review of the change.
    fn assess(&self, change: &str) -> Result<String>;

    /// System-level impact of the change, given surrounding context.
    fn analyze_impact(&self, change: &str, context: &str) -> Result<String>;
}

/// Build the generator selected by `[ai] provider`.
pub fn from_config(config: &AiConfig) -> Result<Box<dyn NarrativeGenerator>> {
    match config.provider {
        AiProvider::Stub => {
            info!("using offline stub narrator");
            Ok(Box::new(StubNarrator))
        }
        AiProvider::OpenAi => Ok(Box::new(ChatCompletionNarrator::from_config(config)?)),
    }
}

// ─── Stub ───────────────────────────────────────────────────

/// Deterministic offline narrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubNarrator;

impl NarrativeGenerator for StubNarrator {
    fn assess(&self, change: &str) -> Result<String> {
        let lines = change.lines().count();
        Ok(format!(
            "## Assessment\nNo language model configured. The change description has {lines} lines."
        ))
    }

    fn analyze_impact(&self, _change: &str, context: &str) -> Result<String> {
        Ok(format!(
            "## Impact\n{}\n## Risk level\nunknown\n",
            context.trim()
        ))
    }
}

// ─── Chat Completions ───────────────────────────────────────

const ASSESS_PROMPT: &str = "You are an experienced code reviewer assessing the impact of a code change.

Analyze the change below and report on:
1. Summary: what the change does and why
2. Scope: functional modules, interfaces and dependencies it may touch
3. Risks: potential bugs, performance or compatibility problems
4. Code quality: readability, maintainability, conventions
5. Suggestions: concrete improvements for any problems found

Change details:
{change}";

const IMPACT_PROMPT: &str = "You are an experienced system architect assessing the system-wide impact of a code change.

Analyze the change below and report on:
1. Module impact
2. Interface impact: APIs and call relationships
3. Business impact: affected flows and features
4. Risk level: low, medium or high
5. Test suggestions: a targeted test strategy and test cases

Change details:
{change}
Related system information:
{context}";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Narrator backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionNarrator {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    http: Client,
}

impl ChatCompletionNarrator {
    /// Model, API key and base URL are all required.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let (Some(model), Some(api_key), Some(base_url)) =
            (&config.model, &config.api_key, &config.base_url)
        else {
            return Err(BlastError::Config(
                "ai provider \"openai\" needs model, api_key and base_url".to_string(),
            ));
        };
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlastError::Narrative(e.to_string()))?;
        info!(%model, %base_url, "chat completion narrator ready");
        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.clone(),
            model: model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn complete(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| BlastError::Narrative(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| BlastError::Narrative(e.to_string()))?;
        if !status.is_success() {
            return Err(BlastError::Narrative(format!("{status}: {}", excerpt(&body))));
        }
        parse_completion(&body)
    }
}

impl NarrativeGenerator for ChatCompletionNarrator {
    fn assess(&self, change: &str) -> Result<String> {
        self.complete(ASSESS_PROMPT.replace("{change}", change))
    }

    fn analyze_impact(&self, change: &str, context: &str) -> Result<String> {
        self.complete(
            IMPACT_PROMPT
                .replace("{context}", context)
                .replace("{change}", change),
        )
    }
}

/// First non-empty message content of a chat completion body.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| BlastError::Narrative(format!("{e}: {}", excerpt(body))))?;
    parsed
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.and_then(|m| m.content))
        .find(|content| !content.trim().is_empty())
        .ok_or_else(|| BlastError::Narrative("completion had no content".to_string()))
}

fn excerpt(body: &str) -> String {
    body.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_openai_config_fails_fast() {
        let config = AiConfig {
            provider: AiProvider::OpenAi,
            model: Some("deepseek-chat".into()),
            ..AiConfig::default()
        };
        assert!(matches!(from_config(&config), Err(BlastError::Config(_))));
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let config = AiConfig {
            provider: AiProvider::OpenAi,
            model: Some("deepseek-chat".into()),
            api_key: Some("sk-test".into()),
            base_url: Some("https://api.deepseek.com/v1/".into()),
            ..AiConfig::default()
        };
        let narrator = ChatCompletionNarrator::from_config(&config).unwrap();
        assert_eq!(narrator.endpoint(), "https://api.deepseek.com/v1/chat/completions");
    }

    #[test]
    fn test_stub_is_default_provider() {
        let narrator = from_config(&AiConfig::default()).unwrap();
        let text = narrator.analyze_impact("file: a.ts", "2 pages").unwrap();
        assert!(text.contains("2 pages"));
        assert!(narrator.assess("a\nb").unwrap().contains("2 lines"));
    }

    #[test]
    fn test_parse_completion() {
        let body = r###"{"choices":[{"message":{"content":""}},{"message":{"content":"## Risk level\nlow"}}]}"###;
        assert_eq!(parse_completion(body).unwrap(), "## Risk level\nlow");
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(BlastError::Narrative(_))
        ));
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let config = AiConfig {
            provider: AiProvider::OpenAi,
            model: Some("m".into()),
            api_key: Some("k".into()),
            base_url: Some("http://127.0.0.1:9".into()),
            ..AiConfig::default()
        };
        let narrator = ChatCompletionNarrator::from_config(&config).unwrap();
        assert!(matches!(narrator.assess("x"), Err(BlastError::Narrative(_))));
    }
}
