//! Error taxonomy for the encrypted KYC flow.

use crate::types::{Notification, NotificationVariant};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KycError {
    #[error("failed to load FHE SDK: {0}")]
    SdkLoad(String),

    #[error("ethereum provider not found, connect a wallet first")]
    ProviderNotFound,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("encryption timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("must be at least {min_age} years old (computed age {age})")]
    AgeRequirement { age: u32, min_age: u32 },

    #[error("wrong network: expected chain id {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("KYC contract address is not configured")]
    ContractNotDeployed,

    #[error("encryption session is bound to {bound}, refusing transport {requested}")]
    TransportConflict { bound: String, requested: String },

    /// Failure reported by the SDK itself (as opposed to [`KycError::Timeout`]).
    #[error("FHE SDK error: {0}")]
    Sdk(String),

    #[error("invalid form input: {0}")]
    InvalidForm(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("KYC already verified, start a new verification first")]
    AlreadyVerified,

    #[error("deployment record: {0}")]
    Deployment(String),
}

pub type KycResult<T> = Result<T, KycError>;

impl KycError {
    /// User-facing title for the notification raised by this error.
    pub fn title(&self) -> &'static str {
        match self {
            KycError::WalletNotConnected => "Wallet Not Connected",
            KycError::ContractNotDeployed => "Contract Not Deployed",
            KycError::WrongNetwork { .. } => "Wrong Network",
            KycError::AgeRequirement { .. } => "Age Requirement",
            KycError::InvalidForm(_) => "Invalid Form",
            KycError::ProviderNotFound => "Wallet Provider Not Found",
            KycError::SdkLoad(_) => "Encryption Unavailable",
            KycError::Timeout(_) => "Encryption Timed Out",
            KycError::Transaction(_) => "Transaction Failed",
            KycError::AlreadyVerified => "Already Verified",
            _ => "Submission Failed",
        }
    }

    pub fn notification(&self) -> Notification {
        let description = match self {
            KycError::WalletNotConnected => {
                "Please connect your wallet to submit KYC information.".to_string()
            }
            KycError::ContractNotDeployed => {
                "Please deploy the PrivacyKYC contract first and update the contract address."
                    .to_string()
            }
            KycError::WrongNetwork { expected, .. } => {
                format!("Please switch your wallet to chain id {expected}.")
            }
            KycError::AgeRequirement { min_age, .. } => {
                format!("You must be at least {min_age} years old to submit KYC.")
            }
            other => other.to_string(),
        };

        Notification {
            title: self.title().to_string(),
            description,
            variant: NotificationVariant::Destructive,
        }
    }
}
