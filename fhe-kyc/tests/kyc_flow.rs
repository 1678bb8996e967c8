use alloy_primitives::{Address, address};
use chrono::NaiveDate;
use fhe_kyc::address::checksum;
use fhe_kyc::constants::{DEFAULT_SDK_URL, SEPOLIA_CHAIN_ID};
use fhe_kyc::contract::{KycContract, decode_submit_kyc, encode_submit_kyc};
use fhe_kyc::controller::{FormState, KycController};
use fhe_kyc::deployment::DeploymentRecord;
use fhe_kyc::form::KycFormState;
use fhe_kyc::loader::SdkLoader;
use fhe_kyc::local::{LocalHost, LocalKycContract, LocalWallet, verify_input_proof};
use fhe_kyc::session::SessionManager;
use fhe_kyc::transport::Transport;
use fhe_kyc::types::NotificationVariant;
use fhe_kyc::KycError;
use std::sync::Arc;
use std::time::Duration;

const ADMIN: Address = address!("fb6916095ca1df60bb79ce92ce3ea74c37c5d359");
const USER: Address = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn form(dob: &str) -> KycFormState {
    KycFormState {
        full_name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        date_of_birth: dob.to_string(),
        nationality: "United Kingdom".to_string(),
        document_type: "National ID".to_string(),
    }
}

struct Harness {
    host: Arc<LocalHost>,
    contract: Arc<LocalKycContract>,
    controller: KycController<LocalHost, LocalKycContract>,
}

fn harness(contract: LocalKycContract) -> Harness {
    let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
    let contract = Arc::new(contract);
    let sessions = SessionManager::new(Arc::new(SdkLoader::new(host.clone(), DEFAULT_SDK_URL)))
        .with_encrypt_timeout(Duration::from_secs(60));
    let controller = KycController::new(sessions, contract.clone());
    Harness {
        host,
        contract,
        controller,
    }
}

fn sepolia_wallet() -> Arc<dyn Transport> {
    Arc::new(LocalWallet::new("ethereum", SEPOLIA_CHAIN_ID, USER))
}

#[tokio::test]
async fn adult_submission_is_stored_on_chain() {
    let mut h = harness(LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 7_000_000));
    h.controller.connect_wallet(sepolia_wallet());
    h.controller.set_form(form("1990-05-20"));

    let outcome = h.controller.submit_on(today()).await.unwrap();

    assert!(outcome.receipt.status);
    assert_eq!(outcome.receipt.block_number, 7_000_001);
    assert_eq!(outcome.user, USER);

    let record = h.contract.record(&USER).unwrap();
    let submission = outcome.encrypted.to_submission().unwrap();
    assert_eq!(record.age_handle, submission.age_handle);
    assert_eq!(record.nationality_handle, submission.nationality_handle);
    assert_eq!(record.doc_type_handle, submission.doc_type_handle);

    // The proof binds the handles to this contract and this user only.
    let handles = submission.handles();
    assert!(verify_input_proof(
        &submission.input_proof,
        &h.contract.address(),
        &USER,
        SEPOLIA_CHAIN_ID,
        &handles
    ));
    assert!(!verify_input_proof(
        &submission.input_proof,
        &h.contract.address(),
        &ADMIN,
        SEPOLIA_CHAIN_ID,
        &handles
    ));

    let calldata = encode_submit_kyc(&submission);
    assert_eq!(decode_submit_kyc(&calldata).unwrap(), submission);

    let titles: Vec<_> = h.controller.notifications().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Encrypting Data", "Encryption Complete", "KYC Submitted Successfully"]
    );
    assert!(h
        .controller
        .notifications()
        .iter()
        .all(|n| n.variant == NotificationVariant::Default));
}

#[tokio::test]
async fn sdk_script_is_fetched_once_across_submissions() {
    let mut h = harness(LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 0));
    h.controller.connect_wallet(sepolia_wallet());

    for _ in 0..3 {
        h.controller.set_form(form("1990-05-20"));
        h.controller.submit_on(today()).await.unwrap();
        h.controller.reset();
    }

    assert_eq!(h.host.script_fetches(), 1);
    assert_eq!(h.host.sdk().init_calls(), 1);
    assert_eq!(h.host.sdk().instances_created(), 1);
    assert_eq!(h.host.sdk().batches_encrypted(), 3);
    assert_eq!(h.contract.block_number(), 3);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_sdk() {
    let mut h = harness(LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 0));
    h.controller.connect_wallet(sepolia_wallet());
    let mut f = form("1990-05-20");
    f.email = "not-an-email".to_string();
    h.controller.set_form(f);

    let err = h.controller.submit_on(today()).await.unwrap_err();

    assert!(matches!(err, KycError::InvalidForm(_)));
    assert_eq!(h.controller.state(), &FormState::Idle);
    assert_eq!(h.host.script_fetches(), 0);
    assert_eq!(h.contract.submit_calls(), 0);
}

#[tokio::test]
async fn failed_sdk_init_is_retried_on_next_submit() {
    let mut h = harness(LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 0));
    h.controller.connect_wallet(sepolia_wallet());
    h.controller.set_form(form("1990-05-20"));
    h.host.sdk().fail_next_init();

    let err = h.controller.submit_on(today()).await.unwrap_err();
    assert!(matches!(err, KycError::Sdk(_)));
    assert!(!h.controller.sessions().is_initialized());
    assert_eq!(h.controller.state(), &FormState::Idle);

    h.controller.submit_on(today()).await.unwrap();
    assert_eq!(h.host.sdk().init_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn encryption_timeout_surfaces_as_notification() {
    let mut h = harness(LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 0));
    h.controller.connect_wallet(sepolia_wallet());
    h.controller.set_form(form("1990-05-20"));
    h.host.sdk().set_encrypt_latency(Duration::from_secs(61));

    let err = h.controller.submit_on(today()).await.unwrap_err();

    assert!(matches!(err, KycError::Timeout(_)));
    let last = h.controller.notifications().last().unwrap();
    assert_eq!(last.title, "Encryption Timed Out");
    assert_eq!(last.variant, NotificationVariant::Destructive);
    assert_eq!(h.contract.submit_calls(), 0);
}

#[test]
fn deployment_record_round_trips_through_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let contract = LocalKycContract::deploy(ADMIN, SEPOLIA_CHAIN_ID, 12);
    let record = contract.deployment_record("sepolia");

    let path = record.write_to_dir(dir.path()).unwrap();
    let json = std::fs::read_to_string(path).unwrap();
    assert!(json.contains(&checksum(&ADMIN)));
    assert!(json.contains("\"blockNumber\": 12"));

    let read = DeploymentRecord::read_from_dir(dir.path(), "sepolia").unwrap().unwrap();
    assert_eq!(read, record);
    assert!(DeploymentRecord::read_from_dir(dir.path(), "mainnet").unwrap().is_none());
}
