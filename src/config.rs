use serde::{Deserialize, Serialize};

use crate::error::SignalResult;

/// What to do with bytes that do not fill a whole frame, and with frames that
/// do not fill a whole epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Drop the incomplete tail and carry on (logged at `warn`)
    #[default]
    Permissive,
    /// Fail with `SignalError::Structural`
    Strict,
}

impl TruncationPolicy {
    pub fn is_strict(self) -> bool {
        self == TruncationPolicy::Strict
    }
}

/// Options applied to a whole decode session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub truncation: TruncationPolicy,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            truncation: TruncationPolicy::Strict,
        }
    }

    pub fn from_json_str(json: &str) -> SignalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_permissive() {
        let options = DecodeOptions::default();
        assert_eq!(options.truncation, TruncationPolicy::Permissive);
        assert!(!options.truncation.is_strict());
    }

    #[test]
    fn test_options_from_json() {
        let options = DecodeOptions::from_json_str(r#"{"truncation": "strict"}"#).unwrap();
        assert_eq!(options, DecodeOptions::strict());

        // Missing keys fall back to defaults
        let options = DecodeOptions::from_json_str("{}").unwrap();
        assert_eq!(options, DecodeOptions::default());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(DecodeOptions::from_json_str(r#"{"truncation": "lenient"}"#).is_err());
    }
}
