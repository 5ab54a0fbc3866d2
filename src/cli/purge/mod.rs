//! Purge command - removes a cached entry from both tiers

use clap::Args;
use tracing::info;

use super::RequestArgs;
use crate::domain::cache::ExpireTime;
use crate::infrastructure::cache::CacheFactory;

/// Arguments for the purge command
#[derive(Args, Clone, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

/// Run the purge command
pub async fn run(args: PurgeArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    args.request.apply(&mut config);

    let cache = CacheFactory::new().create(&config.to_cache_config())?;
    let key = cache.key_for(&args.request.endpoint(), &args.request.request_params());
    let existed = cache.exists(&key, ExpireTime::Never).await;

    cache.remove(&key).await;

    info!(key = %key, existed, "Purged cache entry");
    println!("{}", serde_json::json!({ "key": key, "removed": existed }));

    Ok(())
}
