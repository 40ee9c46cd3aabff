use elfa_mcp_server::config::{RuntimeConfig, RuntimeState, ServerConfig};
use elfa_mcp_server::env::EnvLoader;
use elfa_mcp_server::server::{McpServer, ServerState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Stdout carries JSON-RPC only; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let env_loader = EnvLoader::from_process();
    let env_info = env_loader.load();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let runtime = RuntimeState::new(RuntimeConfig::from_env(None), env_info);
    let state = match ServerState::new(&config, runtime, env_loader) {
        Ok(s) => s,
        Err(e) => {
            error!("startup error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        tools = state.catalogue.definitions().len(),
        base = %state.runtime().config.base_url,
        has_key = !state.runtime().config.auth.key.is_empty(),
        "elfa-mcp-server starting"
    );

    let server = McpServer::new(state, &config);
    if let Err(e) = server.run().await {
        error!("fatal error: {e}");
        std::process::exit(1);
    }
}
