//! Handle layout and input-proof binding for the local relayer.

use crate::error::{KycError, KycResult};
use crate::types::{FheType, Handle};
use alloy_primitives::Address;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds};
use ark_ff::{BigInteger, PrimeField};
use std::sync::OnceLock;

pub const HANDLE_VERSION: u8 = 0;

// Width-3 sponge (rate 2, capacity 1), the usual BN254 instantiation.
const POSEIDON_RATE: usize = 2;
const POSEIDON_CAPACITY: usize = 1;
const POSEIDON_FULL_ROUNDS: usize = 8;
const POSEIDON_PARTIAL_ROUNDS: usize = 57;
const POSEIDON_ALPHA: u64 = 5;

// Domain separators so a handle digest can never double as a proof binding.
const HANDLE_DOMAIN: u64 = 0x4b59_435f_4854_444c; // "KYC_HTDL"
const PROOF_DOMAIN: u64 = 0x4b59_435f_5052_4f46; // "KYC_PROF"

fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            POSEIDON_RATE,
            POSEIDON_FULL_ROUNDS as u64,
            POSEIDON_PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig::new(
            POSEIDON_FULL_ROUNDS,
            POSEIDON_PARTIAL_ROUNDS,
            POSEIDON_ALPHA,
            mds,
            ark,
            POSEIDON_RATE,
            POSEIDON_CAPACITY,
        )
    })
}

/// Poseidon digest of `inputs`, as the 32 little-endian bytes of the squeezed field element.
pub(crate) fn digest(inputs: &[Fr]) -> [u8; 32] {
    let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
    for x in inputs {
        sponge.absorb(x);
    }
    let out: Vec<Fr> = sponge.squeeze_field_elements(1);

    let mut bytes = [0u8; 32];
    let le = out[0].into_bigint().to_bytes_le();
    bytes[..le.len()].copy_from_slice(&le);
    bytes
}

pub(crate) fn address_fr(a: &Address) -> Fr {
    Fr::from_be_bytes_mod_order(a.as_slice())
}

pub(crate) fn handle_prefix(
    nonce: &[u8; 32],
    value: u64,
    ty: FheType,
    index: u8,
    chain_id: u64,
    contract: &Address,
    user: &Address,
) -> [u8; 32] {
    digest(&[
        Fr::from(HANDLE_DOMAIN),
        Fr::from_le_bytes_mod_order(nonce),
        Fr::from(value),
        Fr::from(ty as u64),
        Fr::from(index as u64),
        Fr::from(chain_id),
        address_fr(contract),
        address_fr(user),
    ])
}

/// Lay out a handle: 21 digest bytes, batch index, big-endian chain id, type byte, version.
pub fn build_handle(prefix: &[u8; 32], index: u8, chain_id: u64, ty: FheType) -> Handle {
    let mut h = [0u8; 32];
    h[..21].copy_from_slice(&prefix[..21]);
    h[21] = index;
    h[22..30].copy_from_slice(&chain_id.to_be_bytes());
    h[30] = ty as u8;
    h[31] = HANDLE_VERSION;
    Handle(h)
}

pub fn handle_index(h: &Handle) -> u8 {
    h.0[21]
}

pub fn handle_chain_id(h: &Handle) -> u64 {
    let mut be = [0u8; 8];
    be.copy_from_slice(&h.0[22..30]);
    u64::from_be_bytes(be)
}

pub fn handle_type(h: &Handle) -> Option<FheType> {
    FheType::from_byte(h.0[30])
}

pub fn input_binding(contract: &Address, user: &Address, chain_id: u64, handles: &[Handle]) -> [u8; 32] {
    let mut inputs = Vec::with_capacity(4 + handles.len());
    inputs.push(Fr::from(PROOF_DOMAIN));
    inputs.push(address_fr(contract));
    inputs.push(address_fr(user));
    inputs.push(Fr::from(chain_id));
    inputs.extend(handles.iter().map(|h| Fr::from_be_bytes_mod_order(&h.0)));
    digest(&inputs)
}

/// `[count][handle; count][binding]`. The count is one byte, so at most 255 handles fit.
pub fn encode_input_proof(
    contract: &Address,
    user: &Address,
    chain_id: u64,
    handles: &[Handle],
) -> KycResult<Vec<u8>> {
    let count = u8::try_from(handles.len())
        .map_err(|_| KycError::Sdk(format!("{} handles do not fit one input proof", handles.len())))?;

    let mut out = Vec::with_capacity(1 + 32 * handles.len() + 32);
    out.push(count);
    for h in handles {
        out.extend_from_slice(&h.0);
    }
    out.extend_from_slice(&input_binding(contract, user, chain_id, handles));
    Ok(out)
}

/// Check that `proof` covers exactly `handles`, in order, for this contract, user and chain.
pub fn verify_input_proof(
    proof: &[u8],
    contract: &Address,
    user: &Address,
    chain_id: u64,
    handles: &[Handle],
) -> bool {
    let n = handles.len();
    if proof.len() != 1 + 32 * n + 32 || proof[0] as usize != n {
        return false;
    }

    let embedded = proof[1..1 + 32 * n].chunks_exact(32);
    if embedded.zip(handles).any(|(e, h)| e != h.0.as_slice()) {
        return false;
    }

    if handles
        .iter()
        .enumerate()
        .any(|(i, h)| handle_index(h) as usize != i || handle_chain_id(h) != chain_id)
    {
        return false;
    }

    proof[1 + 32 * n..] == input_binding(contract, user, chain_id, handles)
}
