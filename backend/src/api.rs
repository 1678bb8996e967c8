use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use fhe_kyc::address::{checksum, parse_address};
use fhe_kyc::controller::ControllerSnapshot;
use fhe_kyc::deployment::DeploymentRecord;
use fhe_kyc::form::KycFormState;
use fhe_kyc::local::LocalWallet;
use fhe_kyc::transport::Transport;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/wallet/connect", post(connect_wallet))
        .route("/api/v1/wallet/disconnect", post(disconnect_wallet))
        .route("/api/v1/kyc/submit", post(submit_kyc))
        .route("/api/v1/kyc/reset", post(reset_kyc))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/options", get(get_options))
        .route("/api/v1/deployment", get(get_deployment))
        .route("/api/v1/kyc/state", get(get_kyc_state))
        .route("/api/v1/kyc/submissions/:address", get(list_submissions))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn authorized(headers: &HeaderMap, expected_key: &str) -> bool {
    headers
        .get("X-API-KEY")
        .is_some_and(|provided| provided == expected_key)
}

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if authorized(&headers, &state.config.api_key) {
        return Ok(next.run(request).await);
    }

    tracing::warn!("unauthorized access attempt");
    Err(StatusCode::UNAUTHORIZED)
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        network: state.config.network.clone(),
        chain_id: state.profile.chain_id,
        contract_address: checksum(&state.deployment.contract_address),
        sdk_url: state.config.sdk_url.clone(),
        encrypt_timeout_secs: state.config.encrypt_timeout.as_secs(),
        profile: state.profile.as_ref().clone(),
    })
}

async fn get_options() -> Json<OptionsResponse> {
    Json(OptionsResponse::from_tables())
}

async fn get_deployment(State(state): State<AppState>) -> Json<DeploymentRecord> {
    Json(state.deployment.as_ref().clone())
}

async fn get_kyc_state(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    Json(state.snapshot.borrow().clone())
}

fn busy() -> ApiError {
    ApiError::Conflict("a KYC submission is in progress".to_string())
}

async fn connect_wallet(
    State(state): State<AppState>,
    Json(req): Json<WalletConnectRequest>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    let account = parse_address(&req.account)?;
    let name = req.name.unwrap_or_else(|| "ethereum".to_string());
    let wallet: Arc<dyn Transport> = Arc::new(LocalWallet::new(name.clone(), req.chain_id, account));

    {
        let mut controller = state.controller.try_lock().map_err(|_| busy())?;
        if let Some(previous) = controller.wallet() {
            state.host.remove_provider(&previous.name);
        }
        state.host.inject_provider(&name, wallet.clone());
        controller.connect_wallet(wallet);
    }

    Ok(get_kyc_state(State(state)).await)
}

async fn disconnect_wallet(State(state): State<AppState>) -> Result<Json<ControllerSnapshot>, ApiError> {
    {
        let mut controller = state.controller.try_lock().map_err(|_| busy())?;
        if let Some(previous) = controller.wallet() {
            state.host.remove_provider(&previous.name);
        }
        controller.disconnect_wallet();
    }

    Ok(get_kyc_state(State(state)).await)
}

async fn submit_kyc(
    State(state): State<AppState>,
    Json(form): Json<KycFormState>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut controller = state.controller.clone().try_lock_owned().map_err(|_| busy())?;
    let db = state.db.clone();

    // Detached so a dropped client connection cannot cancel the flow between the contract write
    // and the receipt.
    let task = tokio::spawn(async move {
        controller.set_form(form);
        let outcome = controller.submit().await?;
        let submission_id = db::insert_submission(&db, &outcome).await?;

        Ok::<_, ApiError>(SubmitResponse {
            submission_id,
            user_address: checksum(&outcome.user),
            tx_hash: outcome.receipt.tx_hash,
            block_number: outcome.receipt.block_number,
            encrypted: outcome.encrypted,
        })
    });

    let res = task.await.map_err(|_| ApiError::Internal)??;
    Ok(Json(res))
}

async fn reset_kyc(State(state): State<AppState>) -> Result<Json<ControllerSnapshot>, ApiError> {
    state.controller.try_lock().map_err(|_| busy())?.reset();
    Ok(get_kyc_state(State(state)).await)
}

async fn list_submissions(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let user_address = checksum(&parse_address(&address)?);
    let rows = db::list_submissions(&state.db, &user_address).await?;

    let submissions = rows
        .into_iter()
        .map(|r| SubmissionItem {
            submission_id: r.id,
            created_at: r.created_at,
            contract_address: r.contract_address,
            chain_id: r.chain_id,
            tx_hash: r.tx_hash,
            block_number: r.block_number,
            age_handle: r.age_handle,
            nationality_handle: r.nationality_handle,
            doc_type_handle: r.doc_type_handle,
            input_proof: r.input_proof,
        })
        .collect();

    Ok(Json(SubmissionListResponse {
        user_address,
        submissions,
    }))
}
