//! Soft-delete lifecycle shared by stock items and admin accounts.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Lifecycle state of a persisted record.
///
/// Records are never physically removed; deleting one flips it to
/// `Deleted`. On the wire and in storage the state is the integer `1`
/// (active) or `0` (deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted,
}

impl RecordStatus {
    pub fn code(self) -> u8 {
        match self {
            RecordStatus::Active => 1,
            RecordStatus::Deleted => 0,
        }
    }

    pub fn is_active(self) -> bool {
        self == RecordStatus::Active
    }
}

impl From<RecordStatus> for u8 {
    fn from(value: RecordStatus) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for RecordStatus {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RecordStatus::Active),
            0 => Ok(RecordStatus::Deleted),
            other => Err(DomainError::validation(format!(
                "status must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl TryFrom<i16> for RecordStatus {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| DomainError::validation(format!("status must be 0 or 1, got {value}")))
            .and_then(RecordStatus::try_from)
    }
}

impl core::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordStatus::Active => f.write_str("active"),
            RecordStatus::Deleted => f.write_str("deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_integer_code() {
        assert_eq!(serde_json::to_string(&RecordStatus::Active).unwrap(), "1");
        assert_eq!(serde_json::to_string(&RecordStatus::Deleted).unwrap(), "0");
    }

    #[test]
    fn deserializes_known_codes_only() {
        let active: RecordStatus = serde_json::from_str("1").unwrap();
        let deleted: RecordStatus = serde_json::from_str("0").unwrap();
        assert_eq!(active, RecordStatus::Active);
        assert_eq!(deleted, RecordStatus::Deleted);
        assert!(serde_json::from_str::<RecordStatus>("2").is_err());
    }

    #[test]
    fn storage_code_conversion_rejects_out_of_range() {
        assert_eq!(RecordStatus::try_from(1i16).unwrap(), RecordStatus::Active);
        assert!(RecordStatus::try_from(-1i16).is_err());
        assert!(RecordStatus::try_from(7i16).is_err());
    }
}
