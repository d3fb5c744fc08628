//! # tgc_service
//!
//! HTTP front end for the TrustGraph configurator.
//!
//! Serves the configuration wizard: catalog queries, the static dialog
//! resources the wizard walks, and archive generation. Every generation
//! request gets its own packager on a blocking worker, so a slow template
//! evaluation never stalls the runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tgc_catalog::VersionIndex;
//! use tgc_packager::{AssetLayout, JsonnetCommand};
//! use tgc_service::{run_service, ServiceConfig, ServiceState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let layout = AssetLayout::new("templates", "resources");
//!     let index = VersionIndex::load(layout.catalog_path())?;
//!     let state = ServiceState::new(index, layout, Arc::new(JsonnetCommand::default()));
//!     run_service(ServiceConfig::default(), state).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{ServiceConfig, DEFAULT_BIND};
pub use error::{ServiceError, ServiceResult};
pub use router::build_router;
pub use state::ServiceState;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Run the HTTP service until Ctrl-C.
pub async fn run_service(config: ServiceConfig, state: ServiceState) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}': expected host:port", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve listen address")?;

    info!(
        "Listening on {} (engine={}, templates={:?})",
        local_addr,
        state.engine.name(),
        state.layout.templates_dir
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("service exited unexpectedly")?;

    info!("Service stopped");
    Ok(())
}
