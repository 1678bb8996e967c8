//! Crate-wide constants shared by the encryption flow and the form controller.

use std::time::Duration;

/// Versioned relayer SDK bundle loaded into the host page.
pub const DEFAULT_SDK_URL: &str = "https://cdn.zama.ai/relayer-sdk-js/0.2.0/relayer-sdk-js.js";

/// Sepolia, the only network the KYC contract is deployed on.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Chain id of the FHE gateway paired with Sepolia.
pub const SEPOLIA_GATEWAY_CHAIN_ID: u64 = 55_815;

pub const SEPOLIA_RELAYER_URL: &str = "https://relayer.testnet.zama.cloud";

/// Length of a ciphertext handle.
pub const HANDLE_LEN: usize = 32;

/// Minimum age (in whole years) accepted by the form controller.
pub const MIN_AGE: u32 = 18;

/// Upper bound on the batched encrypt call, including the relayer round trip.
pub const DEFAULT_ENCRYPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Wallet provider globals looked up on the host, most preferred first.
pub const PROVIDER_PREFERENCE: [&str; 4] = [
    "ethereum",
    "okxwallet.provider",
    "okxwallet",
    "coinbaseWalletExtension",
];

/// Nationality label -> plaintext code encrypted as a `euint8`.
pub const NATIONALITIES: [(&str, u8); 11] = [
    ("United States", 1),
    ("United Kingdom", 2),
    ("Canada", 3),
    ("Australia", 4),
    ("Germany", 5),
    ("France", 6),
    ("Japan", 7),
    ("China", 8),
    ("India", 9),
    ("Brazil", 10),
    ("Other", 255),
];

/// Code used for any nationality label not in [`NATIONALITIES`].
pub const NATIONALITY_OTHER: u8 = 255;

/// Document-type label -> plaintext code encrypted as a `euint8`.
pub const DOCUMENT_TYPES: [(&str, u8); 3] = [
    ("Passport", 1),
    ("National ID", 2),
    ("Driver's License", 3),
];

/// Code used for any document label not in [`DOCUMENT_TYPES`] (passport).
pub const DOCUMENT_TYPE_FALLBACK: u8 = 1;
