//! The `.releaser.yaml` document.
//!
//! ```yaml
//! searchReplace:
//!   - search: us-west-2
//!     replace: us-east-1
//! regexSearchReplace:
//!   - lineRegexMatch: " # .*:autoupdate.*"
//!     replaceWith: ""
//!     fileNameMatch: "*.yaml"
//! metadata:
//!   applicationName: a1
//!   releaseName: 01-staging
//!   originalRelease:
//!     creationTime: 2024-05-01T10:00:00Z
//!     gitSha: 0a1b2c3
//!   currentRelease:
//!     creationTime: 2024-05-02T08:30:00Z
//!     author: Jane Doe
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Literal substitution: every occurrence of `search` becomes `replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralRule {
    pub search: String,
    /// Missing means delete the match.
    #[serde(default)]
    pub replace: String,
}

impl LiteralRule {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Regex substitution, optionally restricted to files whose name matches a glob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexRule {
    #[serde(rename = "lineRegexMatch")]
    pub pattern: String,
    /// Replacement template. `$1` and `${name}` refer to capture groups.
    #[serde(rename = "replaceWith", default)]
    pub replacement: String,
    /// Shell-style pattern on the bare file name. Sets negate with `[!x]`;
    /// the `[^x]` spelling is accepted and read the same way.
    #[serde(rename = "fileNameMatch", default, skip_serializing_if = "String::is_empty")]
    pub file_glob: String,
}

impl RegexRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            file_glob: String::new(),
        }
    }

    pub fn for_files(mut self, glob: impl Into<String>) -> Self {
        self.file_glob = glob.into();
        self
    }
}

/// Ordered substitution rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "searchReplace", default, skip_serializing_if = "Vec::is_empty")]
    pub literal: Vec<LiteralRule>,
    #[serde(rename = "regexSearchReplace", default, skip_serializing_if = "Vec::is_empty")]
    pub regex: Vec<RegexRule>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.literal.is_empty() && self.regex.is_empty()
    }

    /// Append `other`'s rules after this set's rules.
    pub fn merged(mut self, other: RuleSet) -> RuleSet {
        self.literal.extend(other.literal);
        self.regex.extend(other.regex);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalRelease {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    /// Revision of the source stage content this release was first cut from.
    #[serde(rename = "gitSha", default, skip_serializing_if = "String::is_empty")]
    pub source_revision: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRelease {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
}

/// Provenance of the content held by a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_name: String,
    #[serde(default)]
    pub original_release: OriginalRelease,
    #[serde(default)]
    pub current_release: CurrentRelease,
}

impl ReleaseMetadata {
    pub fn is_empty(&self) -> bool {
        *self == ReleaseMetadata::default()
    }
}

/// A parsed `.releaser.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(rename = "searchReplace", default, skip_serializing_if = "Vec::is_empty")]
    pub literal: Vec<LiteralRule>,
    #[serde(rename = "regexSearchReplace", default, skip_serializing_if = "Vec::is_empty")]
    pub regex: Vec<RegexRule>,
    #[serde(default, skip_serializing_if = "ReleaseMetadata::is_empty")]
    pub metadata: ReleaseMetadata,
}

impl ReleaseConfig {
    /// The substitution rules declared in this document.
    pub fn rules(&self) -> RuleSet {
        RuleSet {
            literal: self.literal.clone(),
            regex: self.regex.clone(),
        }
    }

    /// Parse a document read from `path`. Blank documents are empty configs.
    pub fn parse(path: &str, content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(self).map_err(ConfigError::Serialize)
    }

    /// Replace only the metadata, keeping hand-authored rules.
    pub fn with_metadata(mut self, metadata: ReleaseMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
