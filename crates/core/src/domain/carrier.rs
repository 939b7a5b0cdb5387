use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Motor-carrier docket number. Always a non-empty run of ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct McNumber(pub String);

impl McNumber {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(DomainError::InvalidMcNumber(raw.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Pulls every digit out of a spoken utterance ("MC 12-34" -> "1234").
    pub fn from_utterance(text: &str) -> Option<Self> {
        let digits = crate::negotiation::parse::extract_digits(text);
        (!digits.is_empty()).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for McNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized registry answer for one MC number.
///
/// `error` is only populated when the registry itself could not answer
/// (upstream 5xx, timeout). A carrier that is missing or not active comes
/// back as `valid = false` with no error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CarrierVerification {
    pub fn active(carrier_name: impl Into<String>, authority_status: impl Into<String>) -> Self {
        Self {
            valid: true,
            carrier_name: Some(carrier_name.into()),
            authority_status: Some(authority_status.into()),
            error: None,
        }
    }

    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self { error: Some(error.into()), ..Self::default() }
    }
}
