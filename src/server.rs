//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! document store, the unified memory facade, and the MCP tool handler.

use anyhow::Result;
use concord::config::ConcordConfig;
use concord::db;
use concord::memory::{MemorySettings, UnifiedMemory};
use concord::store::{DocumentStore, MemoryStore, SqliteStore};
use concord::tools::ConcordTools;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: open the store and build the facade around it.
fn setup_memory(config: &ConcordConfig, ephemeral: bool) -> Result<Arc<UnifiedMemory>> {
    let store: Arc<dyn DocumentStore> = if ephemeral {
        tracing::warn!("using in-memory store; nothing will be persisted");
        Arc::new(MemoryStore::new())
    } else {
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");
        Arc::new(SqliteStore::new(conn))
    };

    let settings = MemorySettings::from(config);
    tracing::info!(
        message_selection = ?settings.message_selection,
        upsert_strategy = ?settings.upsert_strategy,
        "memory settings"
    );

    Ok(Arc::new(UnifiedMemory::new(store, settings)))
}

/// Start the server on the transport named in `server.transport`.
pub async fn serve(config: ConcordConfig, ephemeral: bool) -> Result<()> {
    match config.server.transport.as_str() {
        "stdio" => serve_stdio(config, ephemeral).await,
        "http" => serve_http(config, ephemeral).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: ConcordConfig, ephemeral: bool) -> Result<()> {
    tracing::info!("starting concord MCP server on stdio");

    let memory = setup_memory(&config, ephemeral)?;
    let tools = ConcordTools::new(memory);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: ConcordConfig, ephemeral: bool) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting concord MCP server on HTTP");

    let memory = setup_memory(&config, ephemeral)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(ConcordTools::new(Arc::clone(&memory))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
