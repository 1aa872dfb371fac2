use std::sync::Arc;

use stake_history::archive::source_from_config;
use stake_history::{ArchiveCache, ArchiveConfig, LookupOutcome, WalletLookupService};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(wallet) = std::env::args().nth(1) else {
        eprintln!("usage: stake-history <wallet-address>");
        std::process::exit(2);
    };

    let config = ArchiveConfig::from_env();
    let source = match source_from_config(&config) {
        Ok(source) => source,
        Err(e) => {
            log::error!("{} (set STAKE_ARCHIVE_URL)", e);
            std::process::exit(1);
        }
    };

    let service = WalletLookupService::new(
        Arc::new(ArchiveCache::new()),
        Arc::from(source),
        config.debounce(),
    );

    match service.lookup(&wallet).await {
        LookupOutcome::Completed(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                println!("{}", json);
                if !response.found {
                    std::process::exit(1);
                }
            }
            Err(e) => {
                log::error!("Failed to serialize response: {}", e);
                std::process::exit(1);
            }
        },
        LookupOutcome::Superseded => {
            log::error!("Lookup was superseded");
            std::process::exit(1);
        }
    }
}
