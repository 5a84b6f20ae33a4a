//! Support RAG server binary
//!
//! Run with: cargo run -p support-rag --bin support-rag-server

use support_rag::{config::SupportConfig, server::SupportServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "support_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Support RAG System                    ║
║      Customer Support Answers from Technical Manuals      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = SupportConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dims)",
        config.embeddings.backend,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!(
        "  - Generation: {:?} {} (temperature {})",
        config.generation.backend,
        config.generation.model,
        config.generation.temperature
    );
    tracing::info!(
        "  - Knowledge base: {}/{}/{}",
        config.knowledge_store.url,
        config.knowledge_store.database,
        config.knowledge_store.collection
    );
    tracing::info!(
        "  - Retrieval: top_k {}, threshold {}",
        config.retrieval.top_k,
        config.retrieval.similarity_threshold
    );

    let server = SupportServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Ready: http://{}/ready", server.address());
    println!("\nEndpoints:");
    println!("  POST /support-query - Answer a support question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
