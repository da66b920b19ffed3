use crate::prelude::*;
use codacy_semgrep_core::codacy::{
    coding_standards_path, tools_path, CodingStandard, Page, Provider, Tool,
};
use serde::de::DeserializeOwned;

/// Default Codacy API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.codacy.com/api/v3";

/// Codacy connection settings
#[derive(Debug, Clone)]
pub struct CodacyConfig {
    pub base_url: String,
    pub api_token: String,
}

impl CodacyConfig {
    /// Build the configuration from CLI/environment values
    ///
    /// The token is required; a missing or blank token fails before any request is made.
    pub fn new(base_url: Option<String>, api_token: Option<String>) -> Result<Self> {
        let api_token = api_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_eyre("CODACY_API_TOKEN environment variable is not set")?;

        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

/// Create an HTTP client sending the Codacy `api-token` header on every request
pub fn create_authenticated_client(config: &CodacyConfig) -> Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};

    let mut headers = HeaderMap::new();
    let mut token = HeaderValue::from_str(&config.api_token)
        .map_err(|e| eyre!("Invalid header value: {}", e))?;
    token.set_sensitive(true);
    headers.insert(HeaderName::from_static("api-token"), token);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Read access to the Codacy API
///
/// `path` is relative to the API base URL and may carry a query string.
#[allow(async_fn_in_trait)]
pub trait CodacyApi {
    async fn get_json(&self, path: &str) -> Result<serde_json::Value>;
}

/// [`CodacyApi`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpCodacyApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCodacyApi {
    pub fn new(config: &CodacyConfig) -> Result<Self> {
        Ok(Self {
            client: create_authenticated_client(config)?,
            base_url: config.base_url.clone(),
        })
    }
}

impl CodacyApi for HttpCodacyApi {
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::debug!("GET {} failed with {}", url, status);
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(parse_body(&url, &body)?)
    }
}

/// Parse a successful response body as JSON
fn parse_body(url: &str, body: &str) -> std::result::Result<serde_json::Value, Error> {
    serde_json::from_str(body).map_err(|e| Error::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch a path and deserialize the JSON body
pub async fn get<T: DeserializeOwned>(api: &impl CodacyApi, path: &str) -> Result<T> {
    let value = api.get_json(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Unexpected response shape from {}", path))
}

/// List the coding standards of an organization
pub async fn list_coding_standards(
    api: &impl CodacyApi,
    provider: Provider,
    organization: &str,
) -> Result<Vec<CodingStandard>> {
    let page: Page<CodingStandard> = get(api, &coding_standards_path(provider, organization))
        .await
        .context("Failed to fetch coding standards")?;
    Ok(page.data)
}

/// List the tools configured in a coding standard
pub async fn list_tools(
    api: &impl CodacyApi,
    provider: Provider,
    organization: &str,
    coding_standard_id: &str,
) -> Result<Vec<Tool>> {
    let page: Page<Tool> = get(api, &tools_path(provider, organization, coding_standard_id))
        .await
        .context("Failed to fetch tools for coding standard")?;
    Ok(page.data)
}
