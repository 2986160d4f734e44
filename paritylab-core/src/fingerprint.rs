//! Deterministic run identification.
//!
//! Two runs with the same strategy, session settings, and bar data must
//! produce identical hashes, on any platform. Config hashing goes through
//! `serde_json::Value`, whose object keys are sorted, so formatting and
//! field order in the source config file cannot perturb the hash. Dataset
//! hashing feeds raw little-endian float bytes straight into BLAKE3.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::engine::SessionConfig;
use crate::strategy::StrategyConfig;

/// Hash of a (strategy, session) configuration pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a bar series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one run: what was configured and what it ran over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
}

impl RunId {
    pub fn new(config_hash: ConfigHash, dataset_hash: DatasetHash) -> Self {
        Self {
            config_hash,
            dataset_hash,
        }
    }

    /// Collapse both components into one hex digest.
    pub fn hash(&self) -> String {
        let canonical = serde_json::json!({
            "config_hash": &self.config_hash.0,
            "dataset_hash": &self.dataset_hash.0,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// Twelve-character prefix of `hash()`, for directory and log names.
    pub fn short(&self) -> String {
        let mut hash = self.hash();
        hash.truncate(12);
        hash
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.config_hash, self.dataset_hash)
    }
}

/// Hash a configuration pair into its canonical identity.
pub fn hash_config(strategy: &StrategyConfig, session: &SessionConfig) -> ConfigHash {
    let canonical = serde_json::json!({
        "session": session,
        "strategy": strategy,
    });
    let hash = blake3::hash(canonical.to_string().as_bytes());
    ConfigHash(hash.to_hex().to_string())
}

/// Hash a bar series. Order-sensitive: the same bars in a different order
/// are a different dataset.
pub fn hash_dataset(bars: &[Bar]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.index.to_le_bytes());
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}
