//! Wallet-style transport the SDK signs and routes requests through.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Identity of a transport, used to tell whether a session is bound to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportDescriptor {
    pub name: String,
    pub chain_id: u64,
    pub account: Option<Address>,
}

impl std::fmt::Display for TransportDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.account {
            Some(a) => write!(f, "{}@{} ({})", self.name, self.chain_id, a.to_checksum(None)),
            None => write!(f, "{}@{}", self.name, self.chain_id),
        }
    }
}

pub trait Transport: Send + Sync {
    /// Name of the provider global (or a label for an explicitly supplied transport).
    fn name(&self) -> &str;

    fn chain_id(&self) -> u64;

    /// Connected accounts, primary first.
    fn accounts(&self) -> Vec<Address>;

    fn descriptor(&self) -> TransportDescriptor {
        TransportDescriptor {
            name: self.name().to_string(),
            chain_id: self.chain_id(),
            account: self.accounts().first().copied(),
        }
    }
}
