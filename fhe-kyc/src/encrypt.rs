//! Encrypted-input construction for the KYC attributes.
//!
//! The handle sequence returned by the SDK is positional, so the add order here is the contract
//! argument order: age (`euint32`), nationality (`euint8`), document type (`euint8`).

use crate::address::normalize_address;
use crate::bytes::{expect_bytes32, hexlify};
use crate::error::{KycError, KycResult};
use crate::sdk::{EncryptedInput, FheInstance};
use crate::session::FheSession;
use crate::types::{EncryptedBatch, EncryptedKyc, EncryptedValue};
use alloy_primitives::Address;
use std::time::Duration;
use tracing::debug;

/// Encrypt age, nationality and document type under one joint input proof.
pub async fn encrypt_kyc<I: FheInstance>(
    session: &FheSession<I>,
    age: u32,
    nationality: u8,
    document_type: u8,
    contract_address: &str,
    user_address: Address,
    timeout: Duration,
) -> KycResult<EncryptedKyc> {
    let (contract, checksummed) = normalize_address(contract_address)?;

    let mut input = session.instance().create_encrypted_input(contract, user_address);
    input.add32(age);
    input.add8(nationality);
    input.add8(document_type);

    let batch = encrypt_with_timeout(input, timeout).await?;
    let [age_handle, nationality_handle, doc_type_handle] = hex_handles::<3>(&batch)?;

    debug!(
        contract = %checksummed,
        user = %user_address,
        proof_len = batch.input_proof.len(),
        "encrypted KYC batch"
    );

    Ok(EncryptedKyc {
        age_handle,
        nationality_handle,
        doc_type_handle,
        proof: hexlify(&batch.input_proof),
    })
}

pub async fn encrypt_age<I: FheInstance>(
    session: &FheSession<I>,
    age: u32,
    contract_address: &str,
    user_address: Address,
    timeout: Duration,
) -> KycResult<EncryptedValue> {
    let (contract, _) = normalize_address(contract_address)?;
    let mut input = session.instance().create_encrypted_input(contract, user_address);
    input.add32(age);
    single(input, timeout).await
}

pub async fn encrypt_uint8<I: FheInstance>(
    session: &FheSession<I>,
    value: u8,
    contract_address: &str,
    user_address: Address,
    timeout: Duration,
) -> KycResult<EncryptedValue> {
    let (contract, _) = normalize_address(contract_address)?;
    let mut input = session.instance().create_encrypted_input(contract, user_address);
    input.add8(value);
    single(input, timeout).await
}

async fn single<E: EncryptedInput>(input: E, timeout: Duration) -> KycResult<EncryptedValue> {
    let batch = encrypt_with_timeout(input, timeout).await?;
    let [handle] = hex_handles::<1>(&batch)?;
    Ok(EncryptedValue {
        handle,
        proof: hexlify(&batch.input_proof),
    })
}

/// Run the batched encrypt, failing with [`KycError::Timeout`] if it outlives `limit`.
async fn encrypt_with_timeout<E: EncryptedInput>(input: E, limit: Duration) -> KycResult<EncryptedBatch> {
    let expected = input.len();

    let batch = tokio::time::timeout(limit, input.encrypt())
        .await
        .map_err(|_| KycError::Timeout(limit))??;

    if batch.handles.len() != expected {
        return Err(KycError::Sdk(format!(
            "expected {expected} handles, SDK returned {}",
            batch.handles.len()
        )));
    }

    Ok(batch)
}

fn hex_handles<const N: usize>(batch: &EncryptedBatch) -> KycResult<[String; N]> {
    let hexes = batch
        .handles
        .iter()
        .map(|h| expect_bytes32(h))
        .collect::<KycResult<Vec<_>>>()?;

    hexes
        .try_into()
        .map_err(|v: Vec<String>| KycError::Sdk(format!("expected {N} handles, got {}", v.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_SDK_URL, SEPOLIA_CHAIN_ID};
    use crate::host::ScriptHost;
    use crate::loader::SdkLoader;
    use crate::local::{LocalHost, LocalWallet, handle_chain_id, handle_index, handle_type};
    use crate::session::{SdkInstance, SessionManager};
    use crate::transport::Transport;
    use crate::types::{FheType, Handle};
    use alloy_primitives::address;
    use std::sync::Arc;

    const CONTRACT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const USER: Address = address!("fb6916095ca1df60bb79ce92ce3ea74c37c5d359");

    async fn session(host: &Arc<LocalHost>) -> Arc<FheSession<SdkInstance<LocalHost>>> {
        let sessions = SessionManager::new(Arc::new(SdkLoader::new(host.clone(), DEFAULT_SDK_URL)));
        let w: Arc<dyn Transport> = Arc::new(LocalWallet::new("ethereum", SEPOLIA_CHAIN_ID, USER));
        sessions.initialize(Some(w)).await.unwrap()
    }

    #[tokio::test]
    async fn kyc_batch_has_three_positional_handles() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        let s = session(&host).await;

        let out = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60)).await.unwrap();

        let handles = [&out.age_handle, &out.nationality_handle, &out.doc_type_handle]
            .map(|h| Handle::from_hex(h).unwrap());
        let types = handles.map(|h| handle_type(&h));
        assert_eq!(types, [Some(FheType::Uint32), Some(FheType::Uint8), Some(FheType::Uint8)]);
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(handle_index(h), i as u8);
            assert_eq!(handle_chain_id(h), SEPOLIA_CHAIN_ID);
        }
        assert!(out.proof.starts_with("0x") && out.proof.len() > 2);
    }

    #[tokio::test]
    async fn repeated_encryption_is_randomized_but_well_formed() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        let s = session(&host).await;

        let a = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60)).await.unwrap();
        let b = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60)).await.unwrap();

        assert_ne!(a.age_handle, b.age_handle);
        for h in [&b.age_handle, &b.nationality_handle, &b.doc_type_handle] {
            assert_eq!(h.len(), 66);
        }
    }

    #[tokio::test]
    async fn malformed_contract_address_fails_before_encrypting() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        let s = session(&host).await;

        let err = encrypt_kyc(&s, 25, 1, 1, "0xdeadbeef", USER, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::InvalidAddress(_)));
        assert_eq!(host.sdk().batches_encrypted(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_encrypt_times_out() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        host.sdk().set_encrypt_latency(Duration::from_secs(120));
        let s = session(&host).await;

        let err = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::Timeout(d) if d == Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn sdk_failure_is_not_a_timeout() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        host.sdk().fail_next_encrypt();
        let s = session(&host).await;

        let err = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::Sdk(_)));
    }

    #[tokio::test]
    async fn missing_handle_is_an_sdk_error() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        host.sdk().drop_next_handle();
        let s = session(&host).await;

        let err = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::Sdk(ref m) if m.contains("expected 3 handles")));
    }

    #[tokio::test]
    async fn wrong_length_handle_is_rejected() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        host.sdk().set_next_handle_len(40);
        let s = session(&host).await;

        let err = encrypt_kyc(&s, 25, 1, 1, CONTRACT, USER, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::LengthMismatch { expected: 32, got: 40 }));

        host.sdk().set_next_handle_len(2);
        let err = encrypt_age(&s, 25, CONTRACT, USER, Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, KycError::LengthMismatch { expected: 32, got: 2 }));
    }

    #[tokio::test]
    async fn single_value_variants() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        let s = session(&host).await;

        let age = encrypt_age(&s, 30, CONTRACT, USER, Duration::from_secs(60)).await.unwrap();
        let nat = encrypt_uint8(&s, 255, CONTRACT, USER, Duration::from_secs(60)).await.unwrap();

        let age_h = Handle::from_hex(&age.handle).unwrap();
        let nat_h = Handle::from_hex(&nat.handle).unwrap();
        assert_eq!(handle_type(&age_h), Some(FheType::Uint32));
        assert_eq!(handle_type(&nat_h), Some(FheType::Uint8));
        assert_eq!(handle_index(&nat_h), 0);
        assert!(host.global_sdk().is_some());
    }
}
