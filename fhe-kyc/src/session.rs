//! Encryption-session lifecycle.
//!
//! A [`SessionManager`] is owned by the application context (the form controller, or the
//! backend's state) rather than living in a process-wide global. It memoizes one
//! [`FheSession`] and coalesces concurrent initializations into a single construction.

use crate::config::NetworkProfile;
use crate::constants::{DEFAULT_ENCRYPT_TIMEOUT, PROVIDER_PREFERENCE};
use crate::encrypt;
use crate::error::{KycError, KycResult};
use crate::host::ScriptHost;
use crate::loader::SdkLoader;
use crate::sdk::{InstanceConfig, RelayerSdk};
use crate::transport::{Transport, TransportDescriptor};
use crate::types::{EncryptedKyc, EncryptedValue};
use alloy_primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

pub type SdkInstance<H> = <<H as ScriptHost>::Sdk as RelayerSdk>::Instance;

/// An SDK instance bound to one network profile and one transport.
#[derive(Debug)]
pub struct FheSession<I> {
    instance: I,
    profile: NetworkProfile,
    transport: TransportDescriptor,
}

impl<I> FheSession<I> {
    pub fn new(instance: I, profile: NetworkProfile, transport: TransportDescriptor) -> Self {
        Self { instance, profile, transport }
    }

    pub fn instance(&self) -> &I {
        &self.instance
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn transport(&self) -> &TransportDescriptor {
        &self.transport
    }
}

pub struct SessionManager<H: ScriptHost> {
    loader: Arc<SdkLoader<H>>,
    profile: Option<NetworkProfile>,
    encrypt_timeout: Duration,
    session: OnceCell<Arc<FheSession<SdkInstance<H>>>>,
}

impl<H: ScriptHost> SessionManager<H> {
    pub fn new(loader: Arc<SdkLoader<H>>) -> Self {
        Self {
            loader,
            profile: None,
            encrypt_timeout: DEFAULT_ENCRYPT_TIMEOUT,
            session: OnceCell::new(),
        }
    }

    /// Use `profile` instead of the SDK's built-in profile for the target network.
    pub fn with_profile(mut self, profile: NetworkProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_encrypt_timeout(mut self, timeout: Duration) -> Self {
        self.encrypt_timeout = timeout;
        self
    }

    pub fn encrypt_timeout(&self) -> Duration {
        self.encrypt_timeout
    }

    pub fn loader(&self) -> &Arc<SdkLoader<H>> {
        &self.loader
    }

    pub fn current(&self) -> Option<Arc<FheSession<SdkInstance<H>>>> {
        self.session.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }

    /// Drop the current session so the next [`SessionManager::initialize`] builds a new one.
    pub fn reset(&mut self) -> Option<Arc<FheSession<SdkInstance<H>>>> {
        let old = self.session.take();
        if let Some(s) = &old {
            info!(transport = %s.transport(), "encryption session released");
        }
        old
    }

    /// Return the session, creating it on first use.
    ///
    /// Once a session exists, passing a different explicit transport fails with
    /// [`KycError::TransportConflict`]; call [`SessionManager::reset`] to rebind.
    pub async fn initialize(
        &self,
        transport: Option<Arc<dyn Transport>>,
    ) -> KycResult<Arc<FheSession<SdkInstance<H>>>> {
        let session = self
            .session
            .get_or_try_init(|| self.create(transport.clone()))
            .await?
            .clone();

        if let Some(requested) = transport.map(|t| t.descriptor()) {
            if requested != *session.transport() {
                return Err(KycError::TransportConflict {
                    bound: session.transport().to_string(),
                    requested: requested.to_string(),
                });
            }
        }

        Ok(session)
    }

    fn discover_provider(&self) -> KycResult<Arc<dyn Transport>> {
        let host = self.loader.host();
        PROVIDER_PREFERENCE
            .iter()
            .find_map(|name| host.injected_provider(name))
            .ok_or(KycError::ProviderNotFound)
    }

    async fn create(
        &self,
        transport: Option<Arc<dyn Transport>>,
    ) -> KycResult<Arc<FheSession<SdkInstance<H>>>> {
        if !self.loader.host().has_document() {
            return Err(KycError::SdkLoad(
                "FHE SDK requires a browser environment".to_string(),
            ));
        }

        let transport = match transport {
            Some(t) => t,
            None => self.discover_provider()?,
        };
        info!(provider = transport.name(), chain_id = transport.chain_id(), "using ethereum provider");

        let sdk = self.loader.load().await?;
        sdk.init_sdk().await?;

        let profile = match &self.profile {
            Some(p) => p.clone(),
            None => sdk.default_profile(),
        };
        profile.validate()?;

        let descriptor = transport.descriptor();
        let instance = sdk
            .create_instance(InstanceConfig {
                profile: profile.clone(),
                network: transport,
            })
            .await?;

        info!(chain_id = profile.chain_id, transport = %descriptor, "FHE instance initialized");

        Ok(Arc::new(FheSession::new(instance, profile, descriptor)))
    }

    /// Ensure a session exists, then encrypt the three KYC attributes in one batch.
    pub async fn encrypt_kyc(
        &self,
        age: u32,
        nationality: u8,
        document_type: u8,
        contract_address: &str,
        user_address: Address,
        transport: Option<Arc<dyn Transport>>,
    ) -> KycResult<EncryptedKyc> {
        let session = self.initialize(transport).await?;
        encrypt::encrypt_kyc(
            &session,
            age,
            nationality,
            document_type,
            contract_address,
            user_address,
            self.encrypt_timeout,
        )
        .await
    }

    pub async fn encrypt_age(
        &self,
        age: u32,
        contract_address: &str,
        user_address: Address,
        transport: Option<Arc<dyn Transport>>,
    ) -> KycResult<EncryptedValue> {
        let session = self.initialize(transport).await?;
        encrypt::encrypt_age(&session, age, contract_address, user_address, self.encrypt_timeout).await
    }

    pub async fn encrypt_uint8(
        &self,
        value: u8,
        contract_address: &str,
        user_address: Address,
        transport: Option<Arc<dyn Transport>>,
    ) -> KycResult<EncryptedValue> {
        let session = self.initialize(transport).await?;
        encrypt::encrypt_uint8(&session, value, contract_address, user_address, self.encrypt_timeout)
            .await
    }
}
