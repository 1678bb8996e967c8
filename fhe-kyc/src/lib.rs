//! Client-side encrypted KYC submission.
//!
//! This crate contains:
//! - The seams to an FHE relayer SDK, the host page it is loaded into, the wallet transport and
//!   the KYC contract.
//! - SDK loading and encryption-session management with coalesced initialization.
//! - Batched encrypted-input construction (age, nationality, document type) with strict 32-byte
//!   handle formatting.
//! - The KYC form model and the submission controller state machine.
//! - In-process development stand-ins for every external seam (`local`).

pub mod address;
pub mod bytes;
pub mod config;
pub mod constants;
pub mod contract;
pub mod controller;
pub mod deployment;
pub mod encrypt;
pub mod error;
pub mod form;
pub mod host;
pub mod loader;
pub mod local;
pub mod sdk;
pub mod session;
pub mod transport;
pub mod types;

pub use error::{KycError, KycResult};
