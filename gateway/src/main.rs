use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fire_risk::{FireRiskService, FirmsClient, HotspotCache};

mod config;
mod fire_routes;

use config::GatewayConfig;
use fire_routes::FireState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "fire_risk_gateway=debug,fire_risk=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    // One cache per process, shared by every request
    let cache = Arc::new(HotspotCache::new());

    let service = match &config.firms {
        Some(firms) => {
            tracing::info!(
                "   FIRMS source {} ({} day window, {}s timeout)",
                firms.source,
                firms.day_range,
                firms.timeout_sec
            );
            FireRiskService::new(Arc::new(FirmsClient::new(firms.clone())?), cache)
        }
        None => {
            tracing::warn!("   FIRMS_MAP_KEY not set - serving fallback assessments only");
            FireRiskService::unconfigured(cache)
        }
    };

    let state = FireState {
        service: Arc::new(service),
        default_radius_km: config.default_radius_km,
        admin_token: config.admin_token.clone(),
    };
    if state.admin_token.is_none() {
        tracing::info!("   FIRE_RISK_ADMIN_TOKEN not set - cache clear disabled");
    }

    let addr = config.bind_addr();
    tracing::info!("🔥 Fire risk gateway starting on {}", addr);
    tracing::info!("   Default search radius: {} km", config.default_radius_km);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: FireState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .merge(fire_routes::fire_risk_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health(State(state): State<FireState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fire-risk-gateway",
        "firms_configured": state.service.is_configured(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
