//! KYC form controller.
//!
//! Drives one submission through wallet, network and age gates, encryption, the contract write
//! and confirmation. Every failure becomes a destructive [`Notification`] and returns the
//! controller to [`FormState::Idle`] (or [`FormState::AwaitingWalletConnect`] when no wallet is
//! connected) so the user can retry.
//!
//! Notifications are per attempt: starting a submission clears the previous attempt's toasts.
//! Observers that must not wait on an in-flight submission read a [`ControllerSnapshot`] from
//! [`KycController::subscribe`], republished on every change.

use crate::address::checksum;
use crate::contract::KycContract;
use crate::encrypt::encrypt_kyc;
use crate::error::{KycError, KycResult};
use crate::form::KycFormState;
use crate::host::ScriptHost;
use crate::session::SessionManager;
use crate::transport::{Transport, TransportDescriptor};
use crate::types::{EncryptedKyc, Notification, TxHash, TxReceipt};
use alloy_primitives::Address;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Most recent states kept by [`KycController::history`].
pub const HISTORY_LIMIT: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Encrypting,
    AwaitingWalletApproval,
    Confirming,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FormState {
    Idle,
    AwaitingWalletConnect,
    AwaitingFheInit,
    Submitting { phase: SubmissionPhase },
    Verified { tx_hash: TxHash, block_number: u64 },
}

impl FormState {
    /// Whether the submit action is enabled.
    pub fn accepts_submission(&self) -> bool {
        matches!(self, FormState::Idle | FormState::AwaitingWalletConnect)
    }
}

/// What a confirmed submission produced. Carries no plaintext.
#[derive(Clone, Debug, Serialize)]
pub struct SubmissionOutcome {
    pub user: Address,
    pub contract: Address,
    pub chain_id: u64,
    pub encrypted: EncryptedKyc,
    pub receipt: TxReceipt,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub state: FormState,
    pub wallet: Option<TransportDescriptor>,
    pub session_initialized: bool,
    pub form: KycFormState,
    pub notifications: Vec<Notification>,
}

pub struct KycController<H: ScriptHost, C: KycContract> {
    sessions: SessionManager<H>,
    contract: Arc<C>,
    wallet: Option<Arc<dyn Transport>>,
    form: KycFormState,
    state: FormState,
    history: Vec<FormState>,
    notifications: Vec<Notification>,
    snapshot: watch::Sender<ControllerSnapshot>,
}

impl<H: ScriptHost, C: KycContract> KycController<H, C> {
    pub fn new(sessions: SessionManager<H>, contract: Arc<C>) -> Self {
        let (snapshot, _) = watch::channel(ControllerSnapshot {
            state: FormState::Idle,
            wallet: None,
            session_initialized: sessions.is_initialized(),
            form: KycFormState::default(),
            notifications: Vec::new(),
        });
        Self {
            sessions,
            contract,
            wallet: None,
            form: KycFormState::default(),
            state: FormState::Idle,
            history: vec![FormState::Idle],
            notifications: Vec::new(),
            snapshot,
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state.clone(),
            wallet: self.wallet(),
            session_initialized: self.sessions.is_initialized(),
            form: self.form.clone(),
            notifications: self.notifications.clone(),
        }
    }

    /// Follow the controller's state without borrowing it.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// The last [`HISTORY_LIMIT`] states entered since construction or the last
    /// [`KycController::reset`].
    pub fn history(&self) -> &[FormState] {
        &self.history
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn form(&self) -> &KycFormState {
        &self.form
    }

    pub fn set_form(&mut self, form: KycFormState) {
        self.form = form;
        self.publish();
    }

    pub fn sessions(&self) -> &SessionManager<H> {
        &self.sessions
    }

    pub fn contract(&self) -> &Arc<C> {
        &self.contract
    }

    pub fn wallet(&self) -> Option<TransportDescriptor> {
        self.wallet.as_ref().map(|w| w.descriptor())
    }

    /// Attach a wallet. Switching to a different wallet releases the current encryption session.
    pub fn connect_wallet(&mut self, wallet: Arc<dyn Transport>) {
        let descriptor = wallet.descriptor();
        if let Some(session) = self.sessions.current() {
            if *session.transport() != descriptor {
                self.sessions.reset();
            }
        }

        info!(wallet = %descriptor, "wallet connected");
        self.wallet = Some(wallet);
        if self.state == FormState::AwaitingWalletConnect {
            self.transition(FormState::Idle);
        }
        self.publish();
    }

    pub fn disconnect_wallet(&mut self) {
        if let Some(w) = self.wallet.take() {
            info!(wallet = %w.descriptor(), "wallet disconnected");
        }
        self.sessions.reset();
        self.publish();
    }

    /// Return to the initial empty form.
    pub fn reset(&mut self) {
        self.form = KycFormState::default();
        self.notifications.clear();
        self.history.clear();
        self.transition(FormState::Idle);
    }

    pub async fn submit(&mut self) -> KycResult<SubmissionOutcome> {
        self.submit_on(Utc::now().date_naive()).await
    }

    /// Submit the current form, computing the age as of `today`.
    pub async fn submit_on(&mut self, today: NaiveDate) -> KycResult<SubmissionOutcome> {
        self.notifications.clear();
        self.publish();

        match self.run_submission(today).await {
            Ok(outcome) => {
                self.transition(FormState::Verified {
                    tx_hash: outcome.receipt.tx_hash,
                    block_number: outcome.receipt.block_number,
                });
                self.notify(Notification::info(
                    "KYC Submitted Successfully",
                    "Your encrypted information has been submitted to the blockchain.",
                ));
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "KYC submission failed");
                self.notify(e.notification());
                match e {
                    KycError::AlreadyVerified => {}
                    KycError::WalletNotConnected => self.transition(FormState::AwaitingWalletConnect),
                    _ => self.transition(FormState::Idle),
                }
                Err(e)
            }
        }
    }

    async fn run_submission(&mut self, today: NaiveDate) -> KycResult<SubmissionOutcome> {
        if matches!(self.state, FormState::Verified { .. }) {
            return Err(KycError::AlreadyVerified);
        }

        let wallet = self.wallet.clone().ok_or(KycError::WalletNotConnected)?;
        let user = wallet
            .accounts()
            .first()
            .copied()
            .ok_or(KycError::WalletNotConnected)?;

        let contract = self.contract.address();
        if contract.is_zero() {
            return Err(KycError::ContractNotDeployed);
        }

        let expected = self.contract.chain_id();
        if wallet.chain_id() != expected {
            return Err(KycError::WrongNetwork {
                expected,
                actual: wallet.chain_id(),
            });
        }

        let attrs = self.form.attributes_on(today)?;

        self.transition(FormState::AwaitingFheInit);
        let session = self.sessions.initialize(Some(wallet.clone())).await?;

        self.transition(FormState::Submitting { phase: SubmissionPhase::Encrypting });
        self.notify(Notification::info(
            "Encrypting Data",
            "Encrypting your KYC information using FHE...",
        ));
        let encrypted = encrypt_kyc(
            &session,
            attrs.age,
            attrs.nationality,
            attrs.document_type,
            &checksum(&contract),
            user,
            self.sessions.encrypt_timeout(),
        )
        .await?;
        self.notify(Notification::info(
            "Encryption Complete",
            "Your data has been encrypted. Ready to submit to blockchain.",
        ));

        let submission = encrypted.to_submission()?;

        self.transition(FormState::Submitting { phase: SubmissionPhase::AwaitingWalletApproval });
        let tx_hash = self.contract.submit_kyc(user, &submission).await?;

        self.transition(FormState::Submitting { phase: SubmissionPhase::Confirming });
        let receipt = self.contract.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            return Err(KycError::Transaction(format!("transaction {tx_hash} reverted")));
        }

        info!(%user, %tx_hash, block = receipt.block_number, "KYC verified on-chain");

        Ok(SubmissionOutcome {
            user,
            contract,
            chain_id: expected,
            encrypted,
            receipt,
        })
    }

    fn transition(&mut self, next: FormState) {
        debug!(from = ?self.state, to = ?next, "form state");
        self.state = next.clone();
        self.history.push(next);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        self.publish();
    }

    fn notify(&mut self, n: Notification) {
        self.notifications.push(n);
        self.publish();
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.snapshot());
    }
}
