use chrono::{DateTime, Utc};
use fhe_kyc::config::NetworkProfile;
use fhe_kyc::constants::{DOCUMENT_TYPES, NATIONALITIES};
use fhe_kyc::types::{EncryptedKyc, TxHash};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub network: String,
    pub chain_id: u64,
    pub contract_address: String,
    pub sdk_url: String,
    pub encrypt_timeout_secs: u64,
    pub profile: NetworkProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    pub code: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub nationalities: Vec<OptionItem>,
    pub document_types: Vec<OptionItem>,
}

impl OptionsResponse {
    pub fn from_tables() -> Self {
        let items = |table: &[(&str, u8)]| {
            table
                .iter()
                .map(|(label, code)| OptionItem { label: label.to_string(), code: *code })
                .collect()
        };
        Self {
            nationalities: items(&NATIONALITIES),
            document_types: items(&DOCUMENT_TYPES),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletConnectRequest {
    /// Provider name; defaults to `ethereum`.
    pub name: Option<String>,
    pub chain_id: u64,
    pub account: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    pub user_address: String,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub encrypted: EncryptedKyc,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub submission_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub contract_address: String,
    pub chain_id: u64,
    pub tx_hash: String,
    pub block_number: u64,
    pub age_handle: String,
    pub nationality_handle: String,
    pub doc_type_handle: String,
    pub input_proof: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionListResponse {
    pub user_address: String,
    pub submissions: Vec<SubmissionItem>,
}
