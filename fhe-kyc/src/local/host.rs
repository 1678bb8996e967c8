use super::sdk::LocalRelayerSdk;
use crate::error::{KycError, KycResult};
use crate::host::ScriptHost;
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

/// A host that "serves" the local relayer SDK at one script URL and exposes injected wallet
/// providers by name.
pub struct LocalHost {
    sdk: Arc<LocalRelayerSdk>,
    script_url: String,
    document: bool,
    populates_global: bool,
    fetch_delay: Duration,
    global_loaded: AtomicBool,
    script_fetches: AtomicUsize,
    providers: RwLock<HashMap<String, Arc<dyn Transport>>>,
}

impl LocalHost {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            sdk: Arc::new(LocalRelayerSdk::default()),
            script_url: script_url.into(),
            document: true,
            populates_global: true,
            fetch_delay: Duration::ZERO,
            global_loaded: AtomicBool::new(false),
            script_fetches: AtomicUsize::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_sdk(mut self, sdk: LocalRelayerSdk) -> Self {
        self.sdk = Arc::new(sdk);
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Simulate a host without a document (server-side rendering).
    pub fn without_document(mut self) -> Self {
        self.document = false;
        self
    }

    /// Simulate a bundle that loads but never sets the SDK global.
    pub fn with_broken_bundle(mut self) -> Self {
        self.populates_global = false;
        self
    }

    /// Simulate a page where the SDK global is already present.
    pub fn with_preloaded_sdk(self) -> Self {
        self.global_loaded.store(true, Ordering::SeqCst);
        self
    }

    pub fn sdk(&self) -> &Arc<LocalRelayerSdk> {
        &self.sdk
    }

    pub fn script_fetches(&self) -> usize {
        self.script_fetches.load(Ordering::SeqCst)
    }

    pub fn inject_provider(&self, name: &str, transport: Arc<dyn Transport>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.to_string(), transport);
    }

    pub fn remove_provider(&self, name: &str) -> Option<Arc<dyn Transport>> {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.remove(name)
    }
}

impl ScriptHost for LocalHost {
    type Sdk = LocalRelayerSdk;

    fn has_document(&self) -> bool {
        self.document
    }

    async fn load_script(&self, url: &str) -> KycResult<()> {
        self.script_fetches.fetch_add(1, Ordering::SeqCst);
        debug!(url, "fetching script");

        if self.fetch_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.fetch_delay).await;
        }

        if url != self.script_url {
            return Err(KycError::SdkLoad(format!("Failed to load FHE SDK from {url}")));
        }
        if self.populates_global {
            self.global_loaded.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn global_sdk(&self) -> Option<Arc<LocalRelayerSdk>> {
        self.global_loaded
            .load(Ordering::SeqCst)
            .then(|| self.sdk.clone())
    }

    fn injected_provider(&self, name: &str) -> Option<Arc<dyn Transport>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(name).cloned()
    }
}
