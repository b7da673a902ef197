use std::sync::Arc;

use counsel_api::{build_router, config::Config, init_logging, state::AppState};
use counsel_identity::StaticTokenProvider;
use counsel_llm::OpenAIClient;
use counsel_persist::PersistClient;
use counsel_workflow::Workflow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Counsel API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!("Initializing model client");
    let mut model_client = OpenAIClient::new(config.openai_api_key.clone())?;
    if !config.model.base_url.is_empty() {
        model_client = model_client.with_base_url(config.model.base_url.clone());
    }
    let model_client: Arc<dyn counsel_llm::ModelClient> = Arc::new(model_client);

    tracing::info!("Connecting to MongoDB");
    let persist = PersistClient::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    tracing::info!("MongoDB connected");

    let workflow = Arc::new(Workflow::new(model_client));

    // TODO: swap StaticTokenProvider for the hosted identity verifier once
    // its JWKS endpoint is reachable from this deployment.
    let identity = Arc::new(
        StaticTokenProvider::new()
            .with_token(std::env::var("API_TOKEN").unwrap_or_default(), "local-user"),
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(persist.threads()),
        Arc::new(persist.items()),
        Arc::new(persist.users()),
        identity,
        workflow,
    ));

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
