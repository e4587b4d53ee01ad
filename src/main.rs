//! cartgate - authenticated tool server
//!
//! Main entry point: loads configuration, wires the shared HTTP client into
//! every component, and dispatches the selected command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cartgate::auth::{KeySetCache, SignInGateway, TokenVerifier};
use cartgate::cli::{Cli, Commands};
use cartgate::config::Config;
use cartgate::store::SessionStoreClient;
use cartgate::{server, tools};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    config.validate()?;

    // One shared client; its timeout bounds both key-set fetches and store
    // calls so a slow collaborator cannot pin a worker indefinitely.
    let http = Arc::new(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()?,
    );

    let keys = Arc::new(KeySetCache::with_min_refresh_interval(
        http.clone(),
        config.auth.jwks_url(),
        Duration::from_secs(config.auth.min_key_refresh_seconds),
    ));
    let verifier = Arc::new(TokenVerifier::new(
        keys,
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
    ));
    let gateway = Arc::new(SignInGateway::new(http.clone(), &config.auth));
    let store = Arc::new(SessionStoreClient::new(http, &config.store));

    let registry = tools::build_registry(gateway, verifier, store);

    match cli.command {
        Commands::Serve => {
            tracing::info!("starting stdio serve loop");
            server::serve(registry).await
        }
        Commands::Tools => {
            let definitions = registry.all_definitions();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cartgate=debug" } else { "cartgate=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
