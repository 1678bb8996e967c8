//! Per-network deployment record, written once when the KYC contract is deployed.

use crate::address::checksummed;
use crate::error::{KycError, KycResult};
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    #[serde(with = "checksummed")]
    pub contract_address: Address,
    #[serde(with = "checksummed")]
    pub admin_address: Address,
    pub deployment_time: DateTime<Utc>,
    pub block_number: u64,
}

impl DeploymentRecord {
    pub fn file_name(network: &str) -> String {
        format!("{network}-deployment.json")
    }

    pub fn path_in(dir: &Path, network: &str) -> PathBuf {
        dir.join(Self::file_name(network))
    }

    pub fn write_to_dir(&self, dir: &Path) -> KycResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .map_err(|e| KycError::Deployment(format!("{}: {e}", dir.display())))?;

        let path = Self::path_in(dir, &self.network);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KycError::Deployment(e.to_string()))?;
        std::fs::write(&path, json)
            .map_err(|e| KycError::Deployment(format!("{}: {e}", path.display())))?;

        Ok(path)
    }

    /// `Ok(None)` if no record has been written for `network`.
    pub fn read_from_dir(dir: &Path, network: &str) -> KycResult<Option<Self>> {
        let path = Self::path_in(dir, network);
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)
            .map_err(|e| KycError::Deployment(format!("{}: {e}", path.display())))?;
        let record = serde_json::from_str(&json)
            .map_err(|e| KycError::Deployment(format!("{}: {e}", path.display())))?;
        Ok(Some(record))
    }
}
