use log::{error, info};
use std::env;
use tiny_http_core::routes::default_router;
use tiny_http_core::{Server, ServerConfig, ServerError, ServerResult};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Also installs the bridge that forwards `log` records.
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ServerResult<()> {
    init_logging();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    if args.get(1).map(String::as_str) == Some("--write-default-config") {
        let path = args.get(2).ok_or_else(|| {
            ServerError::Config("usage: --write-default-config <path>".to_string())
        })?;
        return save_default_config(path);
    }

    let config = match args.get(1) {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::new(),
    };
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = Server::bind(&config, default_router())?;
        info!(
            "Server listening on http://{} with {} worker threads, serving {}",
            server.local_addr()?,
            config.worker_threads,
            config.static_root.display()
        );

        server
            .run_until(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for shutdown signal: {}", err);
                }
            })
            .await
    })
}

// Save default configuration to a file
fn save_default_config(path: &str) -> ServerResult<()> {
    let config = ServerConfig::new();
    config.save_to_json_file(path)?;
    info!("Default configuration saved to: {}", path);
    Ok(())
}
