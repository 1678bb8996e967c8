//! Network profile handed to the SDK when an encryption instance is created.

use crate::constants::{SEPOLIA_CHAIN_ID, SEPOLIA_GATEWAY_CHAIN_ID, SEPOLIA_RELAYER_URL};
use crate::error::{KycError, KycResult};
use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Host-chain and gateway contracts the relayer needs to build and verify encrypted inputs.
///
/// Every field is required; [`NetworkProfile::validate`] runs whenever a profile is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkProfile {
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub acl_contract_address: Address,
    pub kms_contract_address: Address,
    pub input_verifier_contract_address: Address,
    pub verifying_contract_address_decryption: Address,
    pub verifying_contract_address_input_verification: Address,
    pub relayer_url: String,
}

impl NetworkProfile {
    pub fn sepolia() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            gateway_chain_id: SEPOLIA_GATEWAY_CHAIN_ID,
            acl_contract_address: address!("687820221192c5b662b25367f70076a37bc79b6c"),
            kms_contract_address: address!("1364cbbf2cdf5032c47d8226a6f6fbd2afcdacac"),
            input_verifier_contract_address: address!("bc91f3dad1a5f19f8390c400196e58073b6a0bc4"),
            verifying_contract_address_decryption: address!("b6e160b1ff80d67bfe90a85ee06ce0a2613607d1"),
            verifying_contract_address_input_verification: address!(
                "7048c39f048125eda9d678aebadfb22f7900a29f"
            ),
            relayer_url: SEPOLIA_RELAYER_URL.to_string(),
        }
    }

    pub fn validate(&self) -> KycResult<()> {
        if self.chain_id == 0 || self.gateway_chain_id == 0 {
            return Err(KycError::Config("chain ids must be non-zero".to_string()));
        }

        let contracts = [
            ("aclContractAddress", &self.acl_contract_address),
            ("kmsContractAddress", &self.kms_contract_address),
            ("inputVerifierContractAddress", &self.input_verifier_contract_address),
            ("verifyingContractAddressDecryption", &self.verifying_contract_address_decryption),
            (
                "verifyingContractAddressInputVerification",
                &self.verifying_contract_address_input_verification,
            ),
        ];
        for (name, addr) in contracts {
            if addr.is_zero() {
                return Err(KycError::Config(format!("{name} must not be the zero address")));
            }
        }

        if !(self.relayer_url.starts_with("https://") || self.relayer_url.starts_with("http://")) {
            return Err(KycError::Config(format!(
                "relayerUrl must be an http(s) URL, got {:?}",
                self.relayer_url
            )));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> KycResult<Self> {
        let profile: NetworkProfile =
            serde_json::from_str(json).map_err(|e| KycError::Config(format!("network profile: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> KycResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| KycError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepolia_profile_is_valid() {
        NetworkProfile::sepolia().validate().unwrap();
    }

    #[test]
    fn json_roundtrip_validates() {
        let json = serde_json::to_string(&NetworkProfile::sepolia()).unwrap();
        assert!(json.contains("\"aclContractAddress\""));
        assert_eq!(NetworkProfile::from_json(&json).unwrap(), NetworkProfile::sepolia());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut v = serde_json::to_value(NetworkProfile::sepolia()).unwrap();
        v["network"] = serde_json::json!("https://rpc.example");
        assert!(NetworkProfile::from_json(&v.to_string()).is_err());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut v = serde_json::to_value(NetworkProfile::sepolia()).unwrap();
        v.as_object_mut().unwrap().remove("kmsContractAddress");
        assert!(NetworkProfile::from_json(&v.to_string()).is_err());
    }

    #[test]
    fn zero_address_is_rejected() {
        let mut p = NetworkProfile::sepolia();
        p.kms_contract_address = Address::ZERO;
        assert!(matches!(p.validate(), Err(KycError::Config(_))));
    }

    #[test]
    fn relayer_url_must_be_http() {
        let mut p = NetworkProfile::sepolia();
        p.relayer_url = "relayer.testnet".to_string();
        assert!(p.validate().is_err());
    }
}
