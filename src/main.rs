//! Restaurant ordering chat assistant web service
//!
//! (c) Broadway Pizza 2025

use restaurant_chatbot_api::api;
use restaurant_chatbot_api::core::assistant::OpenRouterClient;
use restaurant_chatbot_api::core::services::MyChatService;
use restaurant_chatbot_api::core::session::SessionStore;
use restaurant_chatbot_api::core::settings;
use restaurant_chatbot_api::infrastructure::database::{self, DatabaseConnection};
use restaurant_chatbot_api::infrastructure::repositories::{
    DbConversationRepository, DbMenuRepository, DbOrderRepository,
};

use axum::Router;
use axum::http::{HeaderValue, Method};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::{error, info};
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        // Fatal startup path: a missing connection string or an
        // unreachable store halts the service before it accepts traffic.
        if let Err(e) = database::initialize().await {
            error!("database is not connected: {e:#}");
            return Err(e);
        }

        web_server_task().await
    })
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = ServiceCollection::new()
        .add(DatabaseConnection::singleton())
        .add(SessionStore::singleton())
        .add(OpenRouterClient::singleton())
        .add(DbMenuRepository::scoped())
        .add(DbOrderRepository::scoped())
        .add(DbConversationRepository::scoped())
        .add(MyChatService::scoped())
        .build_provider()
        .expect("failed to build service provider");

    // build our application with a route
    let app = Router::new()
        .nest("/session", api::session::router())
        .nest("/chat", api::chat::router())
        .nest("/menu", api::menu::router())
        .nest("/orders", api::orders::router())
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_origin([
                    "http://localhost:3000".parse::<HeaderValue>().unwrap(),
                    "http://localhost:5173".parse::<HeaderValue>().unwrap(),
                ]),
        )
        .with_provider(provider);

    let bind_addr = settings::get_setting("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
