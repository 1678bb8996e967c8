//! The environment the SDK is loaded into.

use crate::error::KycResult;
use crate::sdk::RelayerSdk;
use crate::transport::Transport;
use std::future::Future;
use std::sync::Arc;

pub trait ScriptHost: Send + Sync + 'static {
    type Sdk: RelayerSdk;

    /// `false` when there is no document to attach a script to (e.g. server-side rendering).
    fn has_document(&self) -> bool;

    /// Fetch and evaluate the script at `url`. Resolves once the load event fired.
    fn load_script(&self, url: &str) -> impl Future<Output = KycResult<()>> + Send;

    /// The global SDK handle, if a loaded script has populated it.
    fn global_sdk(&self) -> Option<Arc<Self::Sdk>>;

    /// Look up an injected wallet provider by its global name.
    fn injected_provider(&self, name: &str) -> Option<Arc<dyn Transport>>;
}
