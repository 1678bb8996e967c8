//! The KYC contract's write surface.

use crate::error::{KycError, KycResult};
use crate::types::{Handle, KycSubmission, TxHash, TxReceipt};
use alloy_primitives::{Address, keccak256};
use std::future::Future;

/// Canonical signature of the write entry point; the encrypted handle types are `bytes32` on the wire.
pub const SUBMIT_KYC_SIGNATURE: &str = "submitKYC(bytes32,bytes32,bytes32,bytes)";

pub trait KycContract: Send + Sync + 'static {
    fn address(&self) -> Address;

    /// Chain the contract is deployed on; submissions from any other chain are refused.
    fn chain_id(&self) -> u64;

    /// Send `submitKYC` from `from`. Resolves once the wallet approved and broadcast the
    /// transaction; a wallet rejection is a [`KycError::Transaction`].
    fn submit_kyc(
        &self,
        from: Address,
        submission: &KycSubmission,
    ) -> impl Future<Output = KycResult<TxHash>> + Send;

    fn wait_for_receipt(&self, tx_hash: TxHash) -> impl Future<Output = KycResult<TxReceipt>> + Send;
}

pub fn submit_kyc_selector() -> [u8; 4] {
    let hash = keccak256(SUBMIT_KYC_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode a `submitKYC` call: selector, three static words, the proof offset, then the
/// length-prefixed proof padded to a word boundary.
pub fn encode_submit_kyc(submission: &KycSubmission) -> Vec<u8> {
    let proof = &submission.input_proof;
    let padded = proof.len().div_ceil(32) * 32;

    let mut out = Vec::with_capacity(4 + 32 * 5 + padded);
    out.extend_from_slice(&submit_kyc_selector());
    for h in submission.handles() {
        out.extend_from_slice(h.as_bytes());
    }
    out.extend_from_slice(&word(4 * 32));
    out.extend_from_slice(&word(proof.len() as u64));
    out.extend_from_slice(proof);
    out.resize(out.len() + (padded - proof.len()), 0);
    out
}

pub fn decode_submit_kyc(calldata: &[u8]) -> KycResult<KycSubmission> {
    let invalid = |msg: &str| KycError::Transaction(format!("malformed submitKYC calldata: {msg}"));

    if calldata.len() < 4 + 32 * 5 {
        return Err(invalid("too short"));
    }
    if calldata[..4] != submit_kyc_selector() {
        return Err(invalid("unknown selector"));
    }
    let args = &calldata[4..];

    let handle_at = |i: usize| Handle::from_slice(&args[i * 32..(i + 1) * 32]);
    let offset = read_word(&args[96..128]).ok_or_else(|| invalid("offset overflow"))?;
    let len_end = offset.checked_add(32).ok_or_else(|| invalid("offset overflow"))?;
    if args.len() < len_end {
        return Err(invalid("offset out of range"));
    }
    let len = read_word(&args[offset..len_end]).ok_or_else(|| invalid("length overflow"))?;
    let end = len_end.checked_add(len).ok_or_else(|| invalid("length overflow"))?;
    if args.len() < end {
        return Err(invalid("proof out of range"));
    }

    Ok(KycSubmission {
        age_handle: handle_at(0)?,
        nationality_handle: handle_at(1)?,
        doc_type_handle: handle_at(2)?,
        input_proof: args[len_end..end].to_vec(),
    })
}

fn word(v: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&v.to_be_bytes());
    w
}

fn read_word(w: &[u8]) -> Option<usize> {
    if w[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&w[24..32]);
    usize::try_from(u64::from_be_bytes(be)).ok()
}
