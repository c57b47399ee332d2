use crate::config::USER_AGENT;
use crate::models::{DumpEntry, RenderedEntry};
use crate::stats::RunStats;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Span the remote scripting engine emits in place of content it failed to render
static SCRIPT_ERROR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<span.*>Lua error.*?</span>").unwrap());

/// Longest response body excerpt kept in a status error
const BODY_EXCERPT_CHARS: usize = 200;

/// Why a single endpoint failed to render an entry
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status not 200 OK: {status} {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no parse.text field")]
    MissingText,
    #[error("Lua error detected: {0}")]
    ScriptError(String),
}

#[derive(Deserialize)]
struct ParseResponse {
    parse: ParsedSection,
}

#[derive(Deserialize)]
struct ParsedSection {
    text: HashMap<String, String>,
}

/// Parses and validates endpoint base URLs, keeping their order.
pub fn parse_endpoints(urls: &[String]) -> Result<Arc<[Url]>> {
    if urls.is_empty() {
        bail!("At least one rendering endpoint URL is required");
    }
    urls.iter()
        .map(|raw| {
            Url::parse(raw).with_context(|| format!("Invalid rendering endpoint URL: {raw}"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Arc::from)
}

/// Returns the rendering-error marker if the HTML contains one.
pub fn find_script_error(html: &str) -> Option<&str> {
    SCRIPT_ERROR_REGEX.find(html).map(|m| m.as_str())
}

/// Renders entries through an ordered list of parse API endpoints.
///
/// Each render worker owns one of these, and with it its own HTTP client.
pub struct Renderer {
    client: Client,
    endpoints: Arc<[Url]>,
}

impl Renderer {
    pub fn new(endpoints: Arc<[Url]>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// Tries each endpoint in order and returns the first clean render.
    ///
    /// Failures are logged and counted; `None` means every endpoint failed.
    pub async fn render(&self, entry: &DumpEntry, stats: &RunStats) -> Option<RenderedEntry> {
        for endpoint in self.endpoints.iter() {
            match self.request(endpoint, entry).await {
                Ok(html) => return Some(RenderedEntry::from_entry(entry, html)),
                Err(e) => {
                    stats.inc_endpoint_failures();
                    warn!(
                        endpoint = %endpoint,
                        revision_id = %entry.revision_id,
                        error = %e,
                        "Endpoint failed"
                    );
                }
            }
        }
        None
    }

    /// One `action=parse` request for the entry's revision and section.
    pub async fn request(
        &self,
        endpoint: &Url,
        entry: &DumpEntry,
    ) -> Result<String, RenderError> {
        let section = entry.section.to_string();
        let request = self
            .client
            .get(endpoint.clone())
            .query(&[
                ("action", "parse"),
                ("format", "json"),
                ("oldid", entry.revision_id.as_str()),
                ("section", section.as_str()),
                ("disablelimitreport", "true"),
                ("disableeditsection", "true"),
                ("disablestylededuplication", "true"),
            ])
            .build()?;
        debug!(url = %request.url(), "Connecting");

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status {
                status,
                body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
            });
        }

        let bytes = response.bytes().await?;
        let mut parsed: ParseResponse = serde_json::from_slice(&bytes)?;
        let html = parsed
            .parse
            .text
            .remove("*")
            .ok_or(RenderError::MissingText)?;

        if let Some(marker) = find_script_error(&html) {
            return Err(RenderError::ScriptError(marker.to_string()));
        }

        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lua_error_span() {
        let html = r#"<p>x</p><strong class="error"><span class="scribunto-error" id="mw-scribunto-error-0">Lua error in Module:ko at line 5: bad.</span></strong>"#;
        let marker = find_script_error(html).unwrap();
        assert!(marker.starts_with("<span"));
        assert!(marker.contains("Lua error"));
        assert!(marker.ends_with("</span>"));
    }

    #[test]
    fn clean_html_has_no_marker() {
        assert_eq!(find_script_error("<p>hi</p>"), None);
        assert_eq!(find_script_error("<span>fine</span> Lua error"), None);
    }

    #[test]
    fn parse_endpoints_keeps_order() {
        let urls = vec![
            "https://a.example/w/api.php".to_string(),
            "https://b.example/w/api.php".to_string(),
        ];
        let endpoints = parse_endpoints(&urls).unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].host_str(), Some("a.example"));
        assert_eq!(endpoints[1].host_str(), Some("b.example"));
    }

    #[test]
    fn parse_endpoints_rejects_empty_list() {
        assert!(parse_endpoints(&[]).is_err());
    }

    #[test]
    fn parse_endpoints_rejects_invalid_url() {
        let err = parse_endpoints(&["not a url".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn decodes_parse_response() {
        let body = br#"{"parse":{"title":"hi","revid":3,"text":{"*":"<p>hi</p>"}}}"#;
        let mut parsed: ParseResponse = serde_json::from_slice(body).unwrap();
        assert_eq!(parsed.parse.text.remove("*").as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn api_error_body_does_not_decode() {
        let body = br#"{"error":{"code":"nosuchrevid","info":"There is no revision with ID 1."}}"#;
        assert!(serde_json::from_slice::<ParseResponse>(body).is_err());
    }

    #[test]
    fn status_error_message() {
        let err = RenderError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "status not 200 OK: 500 Internal Server Error boom");
    }
}
