//! In-process stand-ins for the external seams, used by the backend's development mode and by
//! tests.
//!
//! The local relayer does NOT perform homomorphic encryption. It produces handles with the
//! relayer's byte layout (hash prefix, index, chain id, type, version) from a randomized Poseidon
//! digest, and an input proof that binds the handles to `(contract, user, chain id)`. The local
//! contract checks that binding before accepting a submission.

mod contract;
mod host;
mod proof;
mod sdk;
mod wallet;

pub use contract::{KycRecord, LocalKycContract};
pub use host::LocalHost;
pub use proof::{
    HANDLE_VERSION, build_handle, encode_input_proof, handle_chain_id, handle_index, handle_type,
    input_binding, verify_input_proof,
};
pub use sdk::{LocalEncryptedInput, LocalInstance, LocalRelayerSdk, MAX_INPUT_BITS, MAX_INPUT_VALUES};
pub use wallet::LocalWallet;
