use super::proof::verify_input_proof;
use crate::contract::{KycContract, decode_submit_kyc, encode_submit_kyc};
use crate::deployment::DeploymentRecord;
use crate::error::{KycError, KycResult};
use crate::types::{Handle, KycSubmission, TxHash, TxReceipt};
use alloy_primitives::{Address, B256};
use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// The encrypted attributes stored for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KycRecord {
    pub age_handle: Handle,
    pub nationality_handle: Handle,
    pub doc_type_handle: Handle,
    pub block_number: u64,
}

struct PendingTx {
    from: Address,
    calldata: Vec<u8>,
}

struct ChainState {
    block_number: u64,
    rng: ChaCha20Rng,
    pending: HashMap<TxHash, PendingTx>,
    receipts: HashMap<TxHash, TxReceipt>,
    records: HashMap<Address, KycRecord>,
}

/// In-memory KYC contract on a single-node chain that mines one block per confirmed transaction.
pub struct LocalKycContract {
    address: Address,
    admin: Address,
    chain_id: u64,
    confirmation_delay: Duration,
    reject_next: AtomicBool,
    submit_calls: AtomicUsize,
    state: Mutex<ChainState>,
}

/// Deterministic per-contract transaction-hash stream.
fn tx_seed(address: &Address) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&0x4b59_435f_4c4f_4341u64.to_le_bytes()); // "KYC_LOCA"
    seed[8..28].copy_from_slice(address.as_slice());
    seed
}

impl LocalKycContract {
    /// Deploy from `admin` (nonce 0) on a chain whose head is `start_block`.
    pub fn deploy(admin: Address, chain_id: u64, start_block: u64) -> Self {
        Self::at(admin.create(0), admin, chain_id, start_block)
    }

    pub fn at(address: Address, admin: Address, chain_id: u64, start_block: u64) -> Self {
        Self {
            address,
            admin,
            chain_id,
            confirmation_delay: Duration::ZERO,
            reject_next: AtomicBool::new(false),
            submit_calls: AtomicUsize::new(0),
            state: Mutex::new(ChainState {
                block_number: start_block,
                rng: ChaCha20Rng::from_seed(tx_seed(&address)),
                pending: HashMap::new(),
                receipts: HashMap::new(),
                records: HashMap::new(),
            }),
        }
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Make the wallet reject the next `submitKYC` request.
    pub fn reject_next_submission(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    /// Number of `submitKYC` requests that reached the wallet.
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn block_number(&self) -> u64 {
        self.lock().block_number
    }

    pub fn record(&self, user: &Address) -> Option<KycRecord> {
        self.lock().records.get(user).cloned()
    }

    pub fn deployment_record(&self, network: &str) -> DeploymentRecord {
        DeploymentRecord {
            network: network.to_string(),
            contract_address: self.address,
            admin_address: self.admin,
            deployment_time: Utc::now(),
            block_number: self.block_number(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, state: &mut ChainState, tx: &PendingTx) -> bool {
        let Ok(call) = decode_submit_kyc(&tx.calldata) else {
            return false;
        };
        let handles = call.handles();
        if !verify_input_proof(&call.input_proof, &self.address, &tx.from, self.chain_id, &handles) {
            return false;
        }

        state.records.insert(
            tx.from,
            KycRecord {
                age_handle: call.age_handle,
                nationality_handle: call.nationality_handle,
                doc_type_handle: call.doc_type_handle,
                block_number: state.block_number,
            },
        );
        true
    }
}

impl KycContract for LocalKycContract {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn submit_kyc(&self, from: Address, submission: &KycSubmission) -> KycResult<TxHash> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(KycError::Transaction("user rejected the request".to_string()));
        }

        let calldata = encode_submit_kyc(submission);
        let mut state = self.lock();
        let mut hash = [0u8; 32];
        state.rng.fill_bytes(&mut hash);
        let tx_hash = B256::from(hash);
        state.pending.insert(tx_hash, PendingTx { from, calldata });

        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> KycResult<TxReceipt> {
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }

        let mut state = self.lock();
        if let Some(receipt) = state.receipts.get(&tx_hash) {
            return Ok(receipt.clone());
        }

        let tx = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| KycError::Transaction(format!("unknown transaction {tx_hash}")))?;

        state.block_number += 1;
        let status = self.execute(&mut state, &tx);
        let receipt = TxReceipt {
            tx_hash,
            block_number: state.block_number,
            status,
        };
        state.receipts.insert(tx_hash, receipt.clone());

        if status {
            info!(%tx_hash, block = receipt.block_number, from = %tx.from, "submitKYC confirmed");
        } else {
            warn!(%tx_hash, from = %tx.from, "submitKYC reverted: invalid input proof");
        }

        Ok(receipt)
    }
}
