use crate::config::AppConfig;
use crate::db::Db;
use crate::errors::ApiError;
use fhe_kyc::config::NetworkProfile;
use fhe_kyc::controller::{ControllerSnapshot, KycController};
use fhe_kyc::deployment::DeploymentRecord;
use fhe_kyc::loader::SdkLoader;
use fhe_kyc::local::{LocalHost, LocalKycContract, LocalRelayerSdk};
use fhe_kyc::session::SessionManager;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub type Controller = KycController<LocalHost, LocalKycContract>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<AppConfig>,
    pub profile: Arc<NetworkProfile>,
    pub host: Arc<LocalHost>,
    pub contract: Arc<LocalKycContract>,
    pub deployment: Arc<DeploymentRecord>,
    /// The single form controller for the local user. Submissions hold the lock end to end.
    pub controller: Arc<Mutex<Controller>>,
    /// Latest controller view; readable while a submission holds the lock.
    pub snapshot: watch::Receiver<ControllerSnapshot>,
}

impl AppState {
    /// Deploy the local KYC contract and wire a controller to it.
    ///
    /// Writes the deployment record under the data directory unless `persist_deployment` is
    /// false.
    pub fn new(
        db: Db,
        config: AppConfig,
        profile: NetworkProfile,
        persist_deployment: bool,
    ) -> Result<Self, ApiError> {
        let host = Arc::new(
            LocalHost::new(config.sdk_url.clone()).with_sdk(LocalRelayerSdk::new(profile.clone())),
        );
        let contract = Arc::new(LocalKycContract::deploy(
            config.admin_address,
            profile.chain_id,
            0,
        ));

        let deployment = contract.deployment_record(&config.network);
        if persist_deployment {
            let path = deployment.write_to_dir(&config.deployments_dir())?;
            tracing::info!(path = %path.display(), contract = %deployment.contract_address, "deployment record written");
        }

        let loader = Arc::new(SdkLoader::new(host.clone(), config.sdk_url.clone()));
        let sessions = SessionManager::new(loader)
            .with_profile(profile.clone())
            .with_encrypt_timeout(config.encrypt_timeout);
        let controller = KycController::new(sessions, contract.clone());
        let snapshot = controller.subscribe();

        Ok(Self {
            db,
            config: Arc::new(config),
            profile: Arc::new(profile),
            host,
            contract,
            deployment: Arc::new(deployment),
            controller: Arc::new(Mutex::new(controller)),
            snapshot,
        })
    }
}
