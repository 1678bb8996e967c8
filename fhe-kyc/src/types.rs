//! Types shared between the encryption flow, the contract seam and the controller.

use crate::bytes::{decode_hex, hexlify};
use crate::constants::HANDLE_LEN;
use crate::error::{KycError, KycResult};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

pub type TxHash = B256;

/// Encrypted scalar types the KYC flow can add to an input batch.
///
/// The discriminants are the type bytes embedded in a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FheType {
    Bool = 0,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
}

impl FheType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(FheType::Bool),
            2 => Some(FheType::Uint8),
            3 => Some(FheType::Uint16),
            4 => Some(FheType::Uint32),
            5 => Some(FheType::Uint64),
            _ => None,
        }
    }

    /// Plaintext width in bits.
    pub fn bits(self) -> u32 {
        match self {
            FheType::Bool => 1,
            FheType::Uint8 => 8,
            FheType::Uint16 => 16,
            FheType::Uint32 => 32,
            FheType::Uint64 => 64,
        }
    }
}

/// Opaque reference to a ciphertext, used in place of the plaintext in contract calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(pub [u8; HANDLE_LEN]);

impl Handle {
    pub fn from_slice(bytes: &[u8]) -> KycResult<Self> {
        let arr: [u8; HANDLE_LEN] = bytes.try_into().map_err(|_| KycError::LengthMismatch {
            expected: HANDLE_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> KycResult<Self> {
        Self::from_slice(&decode_hex(s)?)
    }

    pub fn to_hex(&self) -> String {
        hexlify(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; HANDLE_LEN] {
        &self.0
    }
}

impl Serialize for Handle {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Handle::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Output of one batched encrypt call, as returned by the SDK.
///
/// Handles are positional: `handles[i]` corresponds to the i-th value added to the input.
#[derive(Clone, Debug)]
pub struct EncryptedBatch {
    pub handles: Vec<Vec<u8>>,
    pub input_proof: Vec<u8>,
}

/// A single encrypted scalar with its own input proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedValue {
    pub handle: String,
    pub proof: String,
}

/// The three KYC attributes encrypted in one batch, hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKyc {
    pub age_handle: String,
    pub nationality_handle: String,
    pub doc_type_handle: String,
    pub proof: String,
}

impl EncryptedKyc {
    /// Parse the hex strings into the typed arguments of `submitKYC`.
    pub fn to_submission(&self) -> KycResult<KycSubmission> {
        Ok(KycSubmission {
            age_handle: Handle::from_hex(&self.age_handle)?,
            nationality_handle: Handle::from_hex(&self.nationality_handle)?,
            doc_type_handle: Handle::from_hex(&self.doc_type_handle)?,
            input_proof: decode_hex(&self.proof)?,
        })
    }
}

/// Positional arguments of the contract's `submitKYC` entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KycSubmission {
    pub age_handle: Handle,
    pub nationality_handle: Handle,
    pub doc_type_handle: Handle,
    pub input_proof: Vec<u8>,
}

impl KycSubmission {
    pub fn handles(&self) -> [Handle; 3] {
        [self.age_handle, self.nationality_handle, self.doc_type_handle]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `false` if the transaction reverted.
    pub status: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A user-visible toast: every failure and progress step surfaces as one of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_hex_parse_is_strict() {
        let h = Handle([0xab; 32]);
        assert_eq!(Handle::from_hex(&h.to_hex()).unwrap(), h);
        assert!(matches!(
            Handle::from_hex("0xabcd"),
            Err(KycError::LengthMismatch { expected: 32, got: 2 })
        ));
    }

    #[test]
    fn encrypted_kyc_to_submission_rejects_short_handle() {
        let good = Handle([1; 32]).to_hex();
        let enc = EncryptedKyc {
            age_handle: good.clone(),
            nationality_handle: "0x0102".to_string(),
            doc_type_handle: good,
            proof: "0x00".to_string(),
        };
        assert!(enc.to_submission().is_err());
    }

    #[test]
    fn fhe_type_byte_roundtrip() {
        for t in [FheType::Bool, FheType::Uint8, FheType::Uint16, FheType::Uint32, FheType::Uint64] {
            assert_eq!(FheType::from_byte(t as u8), Some(t));
        }
        assert_eq!(FheType::from_byte(1), None);
    }
}
