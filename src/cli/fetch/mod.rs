//! Fetch command - runs one fetch and prints each outcome as a JSON line

use clap::Args;
use serde_json::json;
use tracing::info;

use super::RequestArgs;
use crate::domain::cache::ExpireTime;
use crate::domain::fetch::{FetchMode, FetchOutcome, Strategy};

/// Arguments for the fetch command
#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Fetch mode; when repeated the highest precedence mode wins
    #[arg(long = "mode", value_name = "MODE")]
    pub modes: Vec<FetchMode>,

    /// Maximum entry age: seconds, "never" or "always"
    #[arg(long)]
    pub ttl: Option<ExpireTime>,

    /// Do not write the network response to the cache
    #[arg(long)]
    pub no_update: bool,

    /// Delete the cache entry once the fetch has completed
    #[arg(long)]
    pub delete_after: bool,
}

impl FetchArgs {
    pub fn strategy(&self) -> Strategy {
        let mut strategy = Strategy::from_modes(self.modes.iter().copied());

        if self.no_update {
            strategy = strategy.with_suppressed_cache_update();
        }
        if self.delete_after {
            strategy = strategy.with_delete_after_completion();
        }

        strategy
    }
}

/// Run the fetch command
pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    args.request.apply(&mut config);

    let client = crate::build_fetch_client(&config)?;
    let strategy = args.strategy();

    info!(
        endpoint = %args.request.endpoint(),
        mode = %strategy.mode,
        namespace = %config.cache.namespace,
        "Fetching"
    );

    let request = client.request(
        args.request.endpoint(),
        args.request.request_params(),
        args.ttl,
        strategy,
    );

    let mut handle = client.fetch(request);
    let mut last = None;

    while let Some(outcome) = handle.next().await {
        println!("{}", outcome_to_json(&outcome));
        last = Some(outcome);
    }

    match last.and_then(|outcome| outcome.error) {
        Some(error) => Err(anyhow::anyhow!("Fetch failed: {}", error)),
        None => Ok(()),
    }
}

fn outcome_to_json(outcome: &FetchOutcome) -> serde_json::Value {
    json!({
        "source": outcome.source,
        "payload": outcome.payload,
        "error": outcome.error.as_ref().map(|e| e.to_string()),
        "cached_at": outcome.cached_at,
    })
}
