//! Validation service result types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AddressRecord;

/// Error code returned by the validation service.
///
/// The service is inconsistent about the wire type, so both numbers and strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Text(String),
}

impl ErrorCode {
    /// `0` or `"0"`: the address was accepted as-is.
    pub fn is_accepted(&self) -> bool {
        match self {
            Self::Numeric(code) => *code == 0,
            Self::Text(code) => code == "0",
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::Numeric(0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(code) => write!(f, "{code}"),
            Self::Text(code) => f.write_str(code),
        }
    }
}

/// Address status reported by the validation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressStatus {
    /// Same address found in the system
    Valid,
    /// A similar (amended) address was found
    ValidAmended,
    /// No matching address was found
    Invalid,
    Unvalidated,
    Obsolete,
}

/// Result of a `validate_address` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub error_code: ErrorCode,

    /// Candidate corrections (the accepted address when `error_code` is 0)
    #[serde(default)]
    pub valid_address_list: Vec<AddressRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AddressStatus>,
}

impl ValidationResult {
    /// Accepted result carrying the normalized address.
    #[must_use]
    pub fn accepted(address: AddressRecord) -> Self {
        Self {
            error_code: ErrorCode::Numeric(0),
            valid_address_list: vec![address],
            status: Some(AddressStatus::Valid),
        }
    }

    /// Rejected result with the given candidate corrections.
    #[must_use]
    pub fn with_candidates(error_code: i64, candidates: Vec<AddressRecord>) -> Self {
        Self {
            error_code: ErrorCode::Numeric(error_code),
            valid_address_list: candidates,
            status: None,
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.valid_address_list.len()
    }

    pub fn first_candidate(&self) -> Option<&AddressRecord> {
        self.valid_address_list.first()
    }
}
