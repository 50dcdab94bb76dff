//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, Passbolt login and Kubernetes client setup.

use crate::cache::{Cacher, InMemoryCache};
use crate::config::{ControllerConfig, PassboltCredentials};
use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::controller::reconciler::{KubeSecretStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::conversion::CacheLookup;
use crate::crd::PassboltSecret;
use crate::observability::{Metrics, VaultMetrics};
use crate::provider::passbolt::{GpgKeyring, PassboltHttpApi, VaultClient};
use crate::provider::SecretResolver;
use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::{api::Api, Client};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// `PassboltSecret` objects in all namespaces
    pub secrets: Api<PassboltSecret>,
    /// Secrets in all namespaces, watched for owned objects
    pub owned: Api<Secret>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Logged-in Passbolt client owning the name cache
    pub vault: Arc<VaultClient>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field(
                "server_ready",
                &self.server_state.is_ready.load(Ordering::Relaxed),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Passbolt login and first cache load (fatal when it fails or runs late)
/// - Kubernetes client creation
/// - Reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passbolt_secret_controller=info".into()),
        )
        .init();

    info!("Starting Passbolt Secret Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env();
    let credentials =
        PassboltCredentials::from_env().context("Failed to load Passbolt credentials")?;
    info!("Passbolt instance: {}", credentials.url);

    let metrics = Metrics::new().context("Failed to register metrics")?;
    let cache: Arc<dyn Cacher> = Arc::new(InMemoryCache::new());

    let server_state = Arc::new(ServerState::new(
        metrics.registry.clone(),
        Arc::new(CacheLookup::new(Arc::clone(&cache))),
        config.enable_webhooks,
    ));

    // Start server in background task
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let vault = tokio::time::timeout(
        config.startup_timeout(),
        connect_vault(&credentials, cache, metrics.vault.clone()),
    )
    .await
    .map_err(|_| {
        anyhow!(
            "Passbolt login and cache load did not finish within {} seconds",
            config.startup_timeout_secs
        )
    })??;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let secrets: Api<PassboltSecret> = Api::all(client.clone());
    let owned: Api<Secret> = Api::all(client.clone());

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&vault) as Arc<dyn SecretResolver>,
        Arc::new(KubeSecretStore::new(client.clone())),
        config.clone(),
        metrics.controller.clone(),
    ));

    server_state.is_ready.store(true, Ordering::Relaxed);
    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        secrets,
        owned,
        reconciler,
        vault,
        server_state,
        config,
    })
}

/// Import the key, log in and load the name cache
async fn connect_vault(
    credentials: &PassboltCredentials,
    cache: Arc<dyn Cacher>,
    metrics: VaultMetrics,
) -> Result<Arc<VaultClient>> {
    let keyring = GpgKeyring::import(&credentials.private_key, credentials.passphrase.clone())
        .await
        .context("Failed to import the Passbolt private key")?;
    let api = PassboltHttpApi::new(
        &credentials.url,
        keyring,
        Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
    )?;
    let vault = VaultClient::connect(Arc::new(api), cache, metrics)
        .await
        .context("Failed to log in to Passbolt")?;
    let count = vault
        .refresh_cache()
        .await
        .context("Failed to load the Passbolt name cache")?;
    info!("Loaded {} Passbolt resource names", count);
    Ok(Arc::new(vault))
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(config.server_startup_timeout_secs);
    let poll_interval = Duration::from_millis(config.server_poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow!("HTTP server failed to start"));
        }

        if server_state.is_serving.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
