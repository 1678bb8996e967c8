use super::proof::{build_handle, encode_input_proof, handle_prefix};
use crate::config::NetworkProfile;
use crate::error::{KycError, KycResult};
use crate::sdk::{EncryptedInput, FheInstance, InstanceConfig, RelayerSdk};
use crate::types::{EncryptedBatch, FheType, Handle};
use alloy_primitives::Address;
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Total plaintext bits one encrypted input may carry.
pub const MAX_INPUT_BITS: u32 = 2048;

/// Values one encrypted input may carry; the proof's count byte must hold the total.
pub const MAX_INPUT_VALUES: usize = u8::MAX as usize;

#[derive(Debug, Default)]
struct Shared {
    batches: AtomicUsize,
    fail_next_encrypt: AtomicBool,
    encrypt_latency_ms: AtomicU64,
    drop_next_handle: AtomicBool,
    next_handle_len: AtomicUsize,
}

#[derive(Debug)]
pub struct LocalRelayerSdk {
    profile: NetworkProfile,
    init_calls: AtomicUsize,
    instances_created: AtomicUsize,
    fail_next_init: AtomicBool,
    shared: Arc<Shared>,
}

impl LocalRelayerSdk {
    pub fn new(profile: NetworkProfile) -> Self {
        Self {
            profile,
            init_calls: AtomicUsize::new(0),
            instances_created: AtomicUsize::new(0),
            fail_next_init: AtomicBool::new(false),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn instances_created(&self) -> usize {
        self.instances_created.load(Ordering::SeqCst)
    }

    pub fn batches_encrypted(&self) -> usize {
        self.shared.batches.load(Ordering::SeqCst)
    }

    pub fn fail_next_init(&self) {
        self.fail_next_init.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_encrypt(&self) {
        self.shared.fail_next_encrypt.store(true, Ordering::SeqCst);
    }

    /// Make the next `encrypt` return one handle fewer than values added.
    pub fn drop_next_handle(&self) {
        self.shared.drop_next_handle.store(true, Ordering::SeqCst);
    }

    /// Make the next `encrypt` return a first handle of `len` bytes.
    pub fn set_next_handle_len(&self, len: usize) {
        self.shared.next_handle_len.store(len, Ordering::SeqCst);
    }

    /// Simulated relayer round trip applied to every `encrypt` call.
    pub fn set_encrypt_latency(&self, latency: Duration) {
        self.shared
            .encrypt_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for LocalRelayerSdk {
    fn default() -> Self {
        Self::new(NetworkProfile::sepolia())
    }
}

impl RelayerSdk for LocalRelayerSdk {
    type Instance = LocalInstance;

    async fn init_sdk(&self) -> KycResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_init.swap(false, Ordering::SeqCst) {
            return Err(KycError::Sdk("initSDK failed to fetch TFHE parameters".to_string()));
        }
        Ok(())
    }

    fn default_profile(&self) -> NetworkProfile {
        self.profile.clone()
    }

    async fn create_instance(&self, config: InstanceConfig) -> KycResult<LocalInstance> {
        let provider_chain = config.network.chain_id();
        if provider_chain != config.profile.chain_id {
            return Err(KycError::Sdk(format!(
                "provider is on chain {provider_chain}, profile targets {}",
                config.profile.chain_id
            )));
        }

        // Let concurrent callers pile up behind the in-flight construction.
        tokio::task::yield_now().await;

        self.instances_created.fetch_add(1, Ordering::SeqCst);
        Ok(LocalInstance {
            chain_id: config.profile.chain_id,
            shared: self.shared.clone(),
        })
    }
}

#[derive(Debug)]
pub struct LocalInstance {
    chain_id: u64,
    shared: Arc<Shared>,
}

impl LocalInstance {
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl FheInstance for LocalInstance {
    type Input = LocalEncryptedInput;

    fn create_encrypted_input(&self, contract: Address, user: Address) -> LocalEncryptedInput {
        LocalEncryptedInput {
            contract,
            user,
            chain_id: self.chain_id,
            values: Vec::new(),
            shared: self.shared.clone(),
        }
    }
}

pub struct LocalEncryptedInput {
    contract: Address,
    user: Address,
    chain_id: u64,
    values: Vec<(FheType, u64)>,
    shared: Arc<Shared>,
}

impl LocalEncryptedInput {
    fn push(&mut self, ty: FheType, value: u64) {
        self.values.push((ty, value));
    }

    fn total_bits(&self) -> u32 {
        self.values.iter().map(|(ty, _)| ty.bits()).sum()
    }
}

impl EncryptedInput for LocalEncryptedInput {
    fn add_bool(&mut self, value: bool) {
        self.push(FheType::Bool, value as u64);
    }

    fn add8(&mut self, value: u8) {
        self.push(FheType::Uint8, value as u64);
    }

    fn add16(&mut self, value: u16) {
        self.push(FheType::Uint16, value as u64);
    }

    fn add32(&mut self, value: u32) {
        self.push(FheType::Uint32, value as u64);
    }

    fn add64(&mut self, value: u64) {
        self.push(FheType::Uint64, value);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    async fn encrypt(self) -> KycResult<EncryptedBatch> {
        let latency = self.shared.encrypt_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.shared.fail_next_encrypt.swap(false, Ordering::SeqCst) {
            return Err(KycError::Sdk("relayer rejected the encrypted input".to_string()));
        }
        if self.values.is_empty() {
            return Err(KycError::Sdk("encrypted input is empty".to_string()));
        }
        if self.values.len() > MAX_INPUT_VALUES {
            return Err(KycError::Sdk(format!(
                "encrypted input carries {} values, limit is {MAX_INPUT_VALUES}",
                self.values.len()
            )));
        }
        if self.total_bits() > MAX_INPUT_BITS {
            return Err(KycError::Sdk(format!(
                "encrypted input carries {} bits, limit is {MAX_INPUT_BITS}",
                self.total_bits()
            )));
        }

        let handles = self
            .values
            .iter()
            .enumerate()
            .map(|(i, (ty, value))| {
                let index = u8::try_from(i)
                    .map_err(|_| KycError::Sdk(format!("handle index {i} out of range")))?;
                let mut nonce = [0u8; 32];
                OsRng.fill_bytes(&mut nonce);
                let prefix = handle_prefix(&nonce, *value, *ty, index, self.chain_id, &self.contract, &self.user);
                Ok(build_handle(&prefix, index, self.chain_id, *ty))
            })
            .collect::<KycResult<Vec<Handle>>>()?;

        let input_proof = encode_input_proof(&self.contract, &self.user, self.chain_id, &handles)?;
        self.shared.batches.fetch_add(1, Ordering::SeqCst);

        debug!(values = handles.len(), proof_len = input_proof.len(), "local relayer encrypted input");

        let mut raw: Vec<Vec<u8>> = handles.iter().map(|h| h.0.to_vec()).collect();
        if self.shared.drop_next_handle.swap(false, Ordering::SeqCst) {
            raw.pop();
        }
        let len = self.shared.next_handle_len.swap(0, Ordering::SeqCst);
        if len > 0 {
            if let Some(first) = raw.first_mut() {
                first.resize(len, 0);
            }
        }

        Ok(EncryptedBatch {
            handles: raw,
            input_proof,
        })
    }
}
