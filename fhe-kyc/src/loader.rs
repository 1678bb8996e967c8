//! Lazy, coalesced loading of the relayer SDK script.

use crate::error::{KycError, KycResult};
use crate::host::ScriptHost;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub struct SdkLoader<H: ScriptHost> {
    host: Arc<H>,
    url: String,
    sdk: OnceCell<Arc<H::Sdk>>,
}

impl<H: ScriptHost> SdkLoader<H> {
    pub fn new(host: Arc<H>, url: impl Into<String>) -> Self {
        Self {
            host,
            url: url.into(),
            sdk: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_loaded(&self) -> bool {
        self.sdk.initialized()
    }

    /// Load the SDK, or return the handle from an earlier load.
    ///
    /// Concurrent callers share a single script fetch. A failed load leaves the loader empty;
    /// nothing is retried until the next call.
    pub async fn load(&self) -> KycResult<Arc<H::Sdk>> {
        if !self.host.has_document() {
            return Err(KycError::SdkLoad(
                "FHE SDK requires a browser environment".to_string(),
            ));
        }

        self.sdk
            .get_or_try_init(|| async {
                // Another copy of the bundle may already have populated the global.
                if let Some(sdk) = self.host.global_sdk() {
                    return Ok(sdk);
                }

                debug!(url = %self.url, "loading FHE SDK script");
                if let Err(e) = self.host.load_script(&self.url).await {
                    warn!(url = %self.url, error = %e, "FHE SDK script failed to load");
                    return Err(match e {
                        KycError::SdkLoad(_) => e,
                        other => KycError::SdkLoad(other.to_string()),
                    });
                }

                self.host.global_sdk().ok_or_else(|| {
                    KycError::SdkLoad("relayerSDK unavailable after load".to_string())
                })
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_SDK_URL;
    use crate::local::LocalHost;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_loads_share_one_fetch() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL).with_fetch_delay(Duration::from_millis(20)));
        let loader = SdkLoader::new(host.clone(), DEFAULT_SDK_URL);

        let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(host.script_fetches(), 1);

        loader.load().await.unwrap();
        assert_eq!(host.script_fetches(), 1);
    }

    #[tokio::test]
    async fn no_document_fails_without_fetching() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL).without_document());
        let loader = SdkLoader::new(host.clone(), DEFAULT_SDK_URL);

        assert!(matches!(loader.load().await, Err(KycError::SdkLoad(_))));
        assert_eq!(host.script_fetches(), 0);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL));
        let loader = SdkLoader::new(host.clone(), "https://cdn.invalid/relayer-sdk-js.js");

        assert!(matches!(loader.load().await, Err(KycError::SdkLoad(_))));
        assert!(!loader.is_loaded());
        assert!(matches!(loader.load().await, Err(KycError::SdkLoad(_))));
        assert_eq!(host.script_fetches(), 2);
    }

    #[tokio::test]
    async fn missing_global_after_load_fails() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL).with_broken_bundle());
        let loader = SdkLoader::new(host, DEFAULT_SDK_URL);

        let err = loader.load().await.unwrap_err();
        assert!(err.to_string().contains("unavailable after load"));
    }

    #[tokio::test]
    async fn existing_global_skips_fetch() {
        let host = Arc::new(LocalHost::new(DEFAULT_SDK_URL).with_preloaded_sdk());
        let loader = SdkLoader::new(host.clone(), DEFAULT_SDK_URL);

        loader.load().await.unwrap();
        assert_eq!(host.script_fetches(), 0);
    }
}
