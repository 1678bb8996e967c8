use alloy_primitives::{Address, address};
use fhe_kyc::address::parse_address;
use fhe_kyc::config::NetworkProfile;
use fhe_kyc::constants::{DEFAULT_ENCRYPT_TIMEOUT, DEFAULT_SDK_URL};
use fhe_kyc::{KycError, KycResult};
use std::path::PathBuf;
use std::time::Duration;

/// Account that deploys the local KYC contract when `KYC_ADMIN_ADDRESS` is unset.
pub const DEV_ADMIN: Address = address!("fb6916095ca1df60bb79ce92ce3ea74c37c5d359");

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub addr: String,
    pub data_dir: PathBuf,
    pub network: String,
    pub profile_path: Option<PathBuf>,
    pub sdk_url: String,
    pub encrypt_timeout: Duration,
    pub admin_address: Address,
    pub api_key: String,
}

impl AppConfig {
    pub fn from_env() -> KycResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> KycResult<Self> {
        let encrypt_timeout = match get("KYC_ENCRYPT_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .map_err(|_| KycError::Config(format!("KYC_ENCRYPT_TIMEOUT_SECS: {v:?}")))?;
                if secs == 0 {
                    return Err(KycError::Config("KYC_ENCRYPT_TIMEOUT_SECS must be > 0".to_string()));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_ENCRYPT_TIMEOUT,
        };

        let admin_address = match get("KYC_ADMIN_ADDRESS") {
            Some(v) => parse_address(&v)?,
            None => DEV_ADMIN,
        };

        Ok(Self {
            addr: get("BACKEND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            data_dir: PathBuf::from(get("KYC_DATA_DIR").unwrap_or_else(|| "data".to_string())),
            network: get("KYC_NETWORK").unwrap_or_else(|| "sepolia".to_string()),
            profile_path: get("KYC_NETWORK_PROFILE").map(PathBuf::from),
            sdk_url: get("KYC_SDK_URL").unwrap_or_else(|| DEFAULT_SDK_URL.to_string()),
            encrypt_timeout,
            admin_address,
            // In production, this should be a strong secret.
            api_key: get("API_KEY").unwrap_or_else(|| "dev-secret-key".to_string()),
        })
    }

    /// The built-in Sepolia profile unless an override file is configured.
    pub fn network_profile(&self) -> KycResult<NetworkProfile> {
        match &self.profile_path {
            Some(path) => NetworkProfile::load(path),
            None => Ok(NetworkProfile::sepolia()),
        }
    }

    pub fn deployments_dir(&self) -> PathBuf {
        self.data_dir.join("deployments")
    }

    pub fn db_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.data_dir.join("kyc.sqlite").to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let c = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.addr, "127.0.0.1:8080");
        assert_eq!(c.network, "sepolia");
        assert_eq!(c.encrypt_timeout, Duration::from_secs(60));
        assert_eq!(c.admin_address, DEV_ADMIN);
        assert_eq!(c.deployments_dir(), PathBuf::from("data/deployments"));
        assert_eq!(c.network_profile().unwrap(), NetworkProfile::sepolia());
    }

    #[test]
    fn overrides_and_rejections() {
        let c = AppConfig::from_lookup(lookup(&[
            ("KYC_ENCRYPT_TIMEOUT_SECS", "5"),
            ("KYC_ADMIN_ADDRESS", "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
        ]))
        .unwrap();
        assert_eq!(c.encrypt_timeout, Duration::from_secs(5));

        assert!(AppConfig::from_lookup(lookup(&[("KYC_ENCRYPT_TIMEOUT_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("KYC_ADMIN_ADDRESS", "0x1234")])).is_err());
    }

    #[test]
    fn profile_override_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let mut json = serde_json::to_value(NetworkProfile::sepolia()).unwrap();
        json["chainId"] = serde_json::json!(0);
        std::fs::write(&path, json.to_string()).unwrap();

        let c = AppConfig::from_lookup(lookup(&[("KYC_NETWORK_PROFILE", path.to_str().unwrap())])).unwrap();
        assert!(c.network_profile().is_err());
    }
}
