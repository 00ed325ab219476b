//
//  remote.rs
//  Blast
//
//  Created by hak (tharun)
//

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::{BlastError, Result};
use crate::resolver::RemoteFileAccessor;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything except RFC 3986 unreserved characters, `/` included.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// GitLab REST client for raw file contents.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    api_url: String,
    token: String,
    http: Client,
}

impl GitLabClient {
    /// `api_url` is the v4 API base, e.g. `https://gitlab.example.com/api/v4`.
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlastError::Remote(e.to_string()))?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    /// Build a client from config; `None` when URL or token is missing.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>> {
        match (&config.api_url, &config.token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Self::new(url, token).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// URL of the raw-file endpoint for `path` in `project`.
    pub fn raw_file_url(&self, project: &str, path: &str) -> String {
        format!(
            "{}/projects/{}/repository/files/{}/raw",
            self.api_url,
            encode_segment(project),
            encode_segment(path)
        )
    }

    fn fetch_raw(&self, project: &str, path: &str, git_ref: &str) -> Result<String> {
        let url = self.raw_file_url(project, path);
        debug!(%url, git_ref, "requesting GitLab file");
        let response = self
            .http
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("ref", git_ref)])
            .send()
            .map_err(|e| BlastError::Remote(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlastError::Remote(format!("{url} returned {status}")));
        }
        response
            .text()
            .map_err(|e| BlastError::Remote(e.to_string()))
    }
}

impl RemoteFileAccessor for GitLabClient {
    fn file_content(&self, repo_key: &str, path: &str, git_ref: &str) -> Option<String> {
        match self.fetch_raw(repo_key, path, git_ref) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(project = repo_key, path, error = %e, "could not fetch file from GitLab");
                None
            }
        }
    }
}

fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}
