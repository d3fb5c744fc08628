//! Serve command - Run the configuration HTTP service.

use anyhow::Result;
use clap::Args;
use tgc_service::{run_service, ServiceConfig, ServiceState, DEFAULT_BIND};
use tracing::info;

use super::AssetArgs;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "TGC_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,
}

pub async fn execute(args: ServeArgs, assets: &AssetArgs) -> Result<()> {
    info!("Starting...");

    let index = assets.load_index()?;
    let state = ServiceState::new(index, assets.layout(), assets.engine());

    run_service(ServiceConfig::new(args.bind), state).await
}
