pub mod account;
pub mod auth;
pub mod conversations;
pub mod files;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Every successful backend response nests its payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Body-less acknowledgement returned by the delete endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Selector for `/get_all_files`: every document of the account, or one.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFilter {
    #[default]
    #[serde(rename = "*")]
    All,
    #[serde(untagged)]
    Id(String),
}

impl FileFilter {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl Display for FileFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

impl From<&str> for FileFilter {
    fn from(s: &str) -> Self {
        match s {
            "*" => FileFilter::All,
            _ => FileFilter::Id(s.to_string()),
        }
    }
}

impl From<String> for FileFilter {
    fn from(s: String) -> Self {
        FileFilter::from(s.as_str())
    }
}

/// Account identifier. The backend emits it as a string in some responses
/// and as a bare number in others.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Ok(Self(s)),
            Raw::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_filter_serializes_as_bare_string() {
        assert_eq!(serde_json::to_string(&FileFilter::All).unwrap(), "\"*\"");
        assert_eq!(
            serde_json::to_string(&FileFilter::Id("abc".into())).unwrap(),
            "\"abc\""
        );
        assert_eq!(FileFilter::from("*"), FileFilter::All);
        assert_eq!(FileFilter::from("abc").to_string(), "abc");
    }

    #[test]
    fn account_id_accepts_numbers_and_strings() {
        let id: AccountId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: AccountId = serde_json::from_str("\"u-7\"").unwrap();
        assert_eq!(id.as_str(), "u-7");

        assert!(AccountId::new("  ").is_blank());
    }

    #[test]
    fn acknowledgement_tolerates_arbitrary_payloads() {
        let ack: Acknowledgement = serde_json::from_str(r#"{"data": {"ok": true}}"#).unwrap();
        assert!(ack.data.is_some());

        let ack: Acknowledgement = serde_json::from_str("{}").unwrap();
        assert!(ack.data.is_none());
    }
}
