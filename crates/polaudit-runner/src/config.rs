//! Configuration for audit runs

use polaudit_domain::IdentityHash;
use serde::{Deserialize, Serialize};

/// Configuration for the audit scheduler and output store
///
/// # Examples
///
/// ```
/// use polaudit_runner::RunnerConfig;
/// use polaudit_domain::IdentityHash;
///
/// let config = RunnerConfig::default();
/// assert_eq!(config.workers, 1);
/// assert_eq!(config.identity_hash, IdentityHash::Sha1);
/// assert!(config.fsync);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Documents audited concurrently
    /// Default: 1
    pub workers: usize,

    /// Hash function deriving record identities from URLs
    /// Default: sha1, compatible with existing output stores
    pub identity_hash: IdentityHash,

    /// Sync every appended line to disk before counting it as written
    /// Default: true
    pub fsync: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            identity_hash: IdentityHash::Sha1,
            fsync: true,
        }
    }
}

impl RunnerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = RunnerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config: RunnerConfig =
            serde_json::from_str(r#"{"workers": 4, "identity_hash": "sha256"}"#).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.identity_hash, IdentityHash::Sha256);
        assert!(config.fsync);

        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: RunnerConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
