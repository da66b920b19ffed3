//! Codacy API payloads and the pure functions that work on them
//!
//! The shell fetches JSON from the Codacy v3 API and deserializes it into the
//! types below. Request paths are built here too, so the HTTP layer only has to
//! join them onto a base URL.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Page size requested from the patterns endpoint.
pub const PATTERNS_PAGE_LIMIT: usize = 1000;

/// UUID of the Semgrep tool on Codacy.
pub const SEMGREP_TOOL_UUID: &str = "6792c561-236d-41b7-ba5e-9d6bee0d548b";

// =============================================================================
// Providers
// =============================================================================

/// Git provider hosting the Codacy organization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    GitHubEnterprise,
    Bitbucket,
    GitLab,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown provider '{0}', expected one of gh, ghe, bb, gl")]
pub struct ProviderError(pub String);

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::GitHub,
        Provider::GitHubEnterprise,
        Provider::Bitbucket,
        Provider::GitLab,
    ];

    /// Short code used in Codacy API paths
    pub fn code(self) -> &'static str {
        match self {
            Provider::GitHub => "gh",
            Provider::GitHubEnterprise => "ghe",
            Provider::Bitbucket => "bb",
            Provider::GitLab => "gl",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::GitHub => "GitHub",
            Provider::GitHubEnterprise => "GitHub Enterprise",
            Provider::Bitbucket => "Bitbucket",
            Provider::GitLab => "GitLab",
        }
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|provider| provider.code() == code)
            .ok_or_else(|| ProviderError(s.to_string()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Paginated envelope used by every Codacy list endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<PaginationInfo>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaginationInfo {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Cursor for the next page, if the service reported one.
    ///
    /// An empty cursor is treated as the end of the listing.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.cursor.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}

/// Coding standard configured on a Codacy organization
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodingStandard {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_draft: Option<bool>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// Tool attached to a coding standard
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

/// Pattern configuration of a tool within a coding standard
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub pattern_definition: PatternDefinition,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PatternDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
}

impl PatternDefinition {
    /// Declared languages, lower-cased and deduplicated
    pub fn normalized_languages(&self) -> BTreeSet<String> {
        self.languages.iter().map(|l| l.to_lowercase()).collect()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

// =============================================================================
// Request paths
// =============================================================================

fn organization_path(provider: Provider, organization: &str) -> String {
    format!(
        "/organizations/{}/{}",
        provider.code(),
        urlencoding::encode(organization)
    )
}

/// Path listing the coding standards of an organization
pub fn coding_standards_path(provider: Provider, organization: &str) -> String {
    format!("{}/coding-standards", organization_path(provider, organization))
}

/// Path listing the tools of a coding standard
pub fn tools_path(provider: Provider, organization: &str, coding_standard_id: &str) -> String {
    format!(
        "{}/{}/tools",
        coding_standards_path(provider, organization),
        urlencoding::encode(coding_standard_id)
    )
}

/// Identifies the pattern listing of one tool inside one coding standard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternQuery {
    pub provider: Provider,
    pub organization: String,
    pub coding_standard_id: String,
    pub tool_uuid: String,
}

impl PatternQuery {
    /// Path of one page of patterns, continuing from `cursor` when given
    pub fn page_path(&self, cursor: Option<&str>) -> String {
        let mut path = format!(
            "{}/{}/patterns?limit={}",
            tools_path(self.provider, &self.organization, &self.coding_standard_id),
            urlencoding::encode(&self.tool_uuid),
            PATTERNS_PAGE_LIMIT
        );

        if let Some(cursor) = cursor {
            path.push_str(&format!("&cursor={}", urlencoding::encode(cursor)));
        }

        path
    }
}

// =============================================================================
// Transformations
// =============================================================================

/// Find a tool by its UUID
pub fn find_tool_by_uuid<'a>(tools: &'a [Tool], uuid: &str) -> Option<&'a Tool> {
    tools.iter().find(|tool| tool.uuid.eq_ignore_ascii_case(uuid))
}

/// Find a coding standard by id, or by name ignoring case
pub fn find_coding_standard<'a>(
    standards: &'a [CodingStandard],
    needle: &str,
) -> Option<&'a CodingStandard> {
    let needle = needle.trim();
    standards
        .iter()
        .find(|standard| standard.id == needle)
        .or_else(|| {
            standards
                .iter()
                .find(|standard| standard.name.eq_ignore_ascii_case(needle))
        })
}

/// Keep only the patterns enabled in the coding standard
pub fn filter_enabled(patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns.into_iter().filter(|p| p.enabled).collect()
}

/// Distinct lower-cased languages across all patterns, sorted ascending
pub fn distinct_languages(patterns: &[Pattern]) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|p| p.pattern_definition.normalized_languages())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
