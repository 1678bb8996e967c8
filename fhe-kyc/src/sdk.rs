//! Seams to the FHE relayer SDK.
//!
//! The SDK exposes an async setup entry point, a per-network default profile, and an instance
//! factory. An instance opens encrypted-input accumulators scoped to one
//! `(contract, user)` pair; each accumulator is consumed by exactly one `encrypt` call.

use crate::config::NetworkProfile;
use crate::error::KycResult;
use crate::transport::Transport;
use crate::types::EncryptedBatch;
use alloy_primitives::Address;
use std::future::Future;
use std::sync::Arc;

/// Profile merged with the resolved transport, passed to [`RelayerSdk::create_instance`].
#[derive(Clone)]
pub struct InstanceConfig {
    pub profile: NetworkProfile,
    pub network: Arc<dyn Transport>,
}

pub trait RelayerSdk: Send + Sync + 'static {
    type Instance: FheInstance;

    /// One-time async setup (WASM/key material download in the browser SDK).
    fn init_sdk(&self) -> impl Future<Output = KycResult<()>> + Send;

    /// The SDK's built-in profile for the target network.
    fn default_profile(&self) -> NetworkProfile;

    fn create_instance(
        &self,
        config: InstanceConfig,
    ) -> impl Future<Output = KycResult<Self::Instance>> + Send;
}

pub trait FheInstance: Send + Sync + 'static {
    type Input: EncryptedInput;

    fn create_encrypted_input(&self, contract: Address, user: Address) -> Self::Input;
}

/// Ordered accumulator of plaintext scalars.
pub trait EncryptedInput: Send {
    fn add_bool(&mut self, value: bool);
    fn add8(&mut self, value: u8);
    fn add16(&mut self, value: u16);
    fn add32(&mut self, value: u32);
    fn add64(&mut self, value: u64);

    /// Number of values added so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encrypt all added values in one batch: one handle per value plus one joint proof.
    fn encrypt(self) -> impl Future<Output = KycResult<EncryptedBatch>> + Send;
}
