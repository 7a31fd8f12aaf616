//! Fire risk API routes
//!
//! - POST /api/v1/fire-risk (alias /nasa-fire-risk): assess a coordinate
//! - GET  /api/v1/fire-risk/cache: hotspot snapshot stats
//! - POST /api/v1/fire-risk/cache/clear: drop the snapshot (admin token)
//!
//! Only malformed coordinates produce a non-200 status. Everything else
//! degrades to a placeholder assessment tagged with its provenance.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use fire_risk::{CacheStats, FailureReason, FireRiskService, RiskAssessment, RiskQuery};

#[derive(Clone)]
pub struct FireState {
    pub service: Arc<FireRiskService>,
    pub default_radius_km: f64,
    /// Expected `x-admin-token` value; `None` disables admin routes
    pub admin_token: Option<String>,
}

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub fn fire_risk_router(state: FireState) -> Router {
    Router::new()
        .route("/api/v1/fire-risk", post(assess_fire_risk))
        .route("/nasa-fire-risk", post(assess_fire_risk))
        .route("/api/v1/fire-risk/cache", get(cache_stats))
        .route("/api/v1/fire-risk/cache/clear", post(clear_cache))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireRiskResponse {
    pub fire_risk: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

fn require_admin(state: &FireState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(api_error(StatusCode::FORBIDDEN, "Admin routes are disabled"));
    };
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected) {
        warn!("Rejected admin request: bad or missing {}", ADMIN_TOKEN_HEADER);
        return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid admin token"));
    }
    Ok(())
}

/// Reads an optional numeric field; `null` counts as absent
fn numeric_field(body: &Value, name: &str) -> Result<Option<f64>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| bad_request(format!("{} must be a number", name))),
    }
}

fn parse_query(body: &Value, default_radius_km: f64) -> Result<RiskQuery, ApiError> {
    let latitude = numeric_field(body, "latitude")?;
    let longitude = numeric_field(body, "longitude")?;
    let radius_km = numeric_field(body, "radiusKm")?;

    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(bad_request("Latitude and longitude are required")),
    };

    RiskQuery::new(
        latitude,
        longitude,
        Some(radius_km.unwrap_or(default_radius_km)),
    )
    .map_err(|e| bad_request(e.to_string()))
}

fn fallback_response(reason: &FailureReason) -> FireRiskResponse {
    let fire_risk = reason.fallback_assessment(Utc::now());
    match reason {
        FailureReason::MissingCredential => {
            error!("FIRMS map key not configured");
            FireRiskResponse {
                fire_risk,
                warning: Some("NASA API key not configured, using fallback data".to_string()),
                error: None,
            }
        }
        FailureReason::MalformedRequest(detail) => {
            warn!("Fire risk analysis error: {}", detail);
            FireRiskResponse {
                fire_risk,
                warning: None,
                error: Some("Fire risk analysis failed, using fallback data".to_string()),
            }
        }
    }
}

/// Assess fire risk for `{ latitude, longitude, radiusKm? }`
pub async fn assess_fire_risk(
    State(state): State<FireState>,
    body: Bytes,
) -> Result<Json<FireRiskResponse>, ApiError> {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let reason = FailureReason::MalformedRequest(e.to_string());
            return Ok(Json(fallback_response(&reason)));
        }
    };

    let query = parse_query(&body, state.default_radius_km)?;

    match state.service.assess(query, Utc::now()).await {
        Ok(fire_risk) => Ok(Json(FireRiskResponse {
            fire_risk,
            warning: None,
            error: None,
        })),
        Err(reason) => Ok(Json(fallback_response(&reason))),
    }
}

pub async fn cache_stats(State(state): State<FireState>) -> Json<CacheStats> {
    Json(state.service.cache().stats(Utc::now()).await)
}

/// Drop the hotspot snapshot so the next request refetches.
///
/// Forces an upstream call against the rate-limited map key, so it needs
/// `x-admin-token` matching `FIRE_RISK_ADMIN_TOKEN`.
pub async fn clear_cache(
    State(state): State<FireState>,
    headers: HeaderMap,
) -> Result<Json<CacheStats>, ApiError> {
    require_admin(&state, &headers)?;
    let cache = state.service.cache();
    cache.clear().await;
    info!("Hotspot cache cleared");
    Ok(Json(cache.stats(Utc::now()).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use fire_risk::{HotspotCache, HotspotRecord, HotspotSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct StaticSource {
        records: Vec<HotspotRecord>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HotspotSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self) -> fire_risk::Result<Vec<HotspotRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
    }

    fn live_state(records: Vec<HotspotRecord>) -> (FireState, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            records,
            calls: AtomicUsize::new(0),
        });
        let service = FireRiskService::new(source.clone(), Arc::new(HotspotCache::new()));
        let state = FireState {
            service: Arc::new(service),
            default_radius_km: 50.0,
            admin_token: Some("letmein".to_string()),
        };
        (state, source)
    }

    fn unconfigured_state() -> FireState {
        FireState {
            service: Arc::new(FireRiskService::unconfigured(Arc::new(HotspotCache::new()))),
            default_radius_km: 50.0,
            admin_token: None,
        }
    }

    async fn post(state: FireState, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn clear(state: FireState, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/fire-risk/cache/clear");
        if let Some(token) = token {
            request = request.header(ADMIN_TOKEN_HEADER, token);
        }
        send(state, request.body(Body::empty()).unwrap()).await
    }

    async fn send(state: FireState, request: Request<Body>) -> (StatusCode, Value) {
        let response = fire_risk_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_live_assessment() {
        let (state, source) = live_state(vec![
            HotspotRecord::new(-33.90, 151.20, 40.0),
            HotspotRecord::new(-25.0, 135.0, 800.0),
        ]);
        let (status, json) = post(
            state,
            "/api/v1/fire-risk",
            r#"{"latitude": -33.87, "longitude": 151.21}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let risk = &json["fireRisk"];
        assert_eq!(risk["dataSource"], "live");
        assert_eq!(risk["nearbyFires"], 1);
        assert_eq!(risk["totalFRP"], 40.0);
        assert_eq!(risk["riskLevel"], "Low");
        assert!(risk["lastUpdated"].is_string());
        assert!(json.get("warning").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_alias_route_and_radius() {
        let (state, _) = live_state(vec![HotspotRecord::new(-33.90, 151.20, 40.0)]);
        let (status, json) = post(
            state,
            "/nasa-fire-risk",
            r#"{"latitude": -33.87, "longitude": 151.21, "radiusKm": 1}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fireRisk"]["dataSource"], "no-nearby-fires");
    }

    #[tokio::test]
    async fn test_missing_coordinates_is_400() {
        let (state, source) = live_state(vec![]);
        let (status, json) = post(state, "/api/v1/fire-risk", r#"{"latitude": -33.87}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Latitude and longitude are required");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_are_400() {
        for body in [
            r#"{"latitude": "north", "longitude": 151.21}"#,
            r#"{"latitude": 95.0, "longitude": 151.21}"#,
            r#"{"latitude": -33.87, "longitude": 151.21, "radiusKm": -5}"#,
            r#"{"latitude": null, "longitude": 151.21}"#,
        ] {
            let (status, json) = post(unconfigured_state(), "/api/v1/fire-risk", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_zero_coordinates_are_valid() {
        let (status, json) = post(
            unconfigured_state(),
            "/api/v1/fire-risk",
            r#"{"latitude": 0, "longitude": 0}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fireRisk"]["dataSource"], "fallback");
    }

    #[tokio::test]
    async fn test_missing_credential_fallback() {
        let (status, json) = post(
            unconfigured_state(),
            "/api/v1/fire-risk",
            r#"{"latitude": -33.87, "longitude": 151.21}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fireRisk"]["dataSource"], "fallback");
        assert_eq!(json["fireRisk"]["riskLevel"], "Medium");
        assert_eq!(json["fireRisk"]["riskScore"], 0.4);
        assert!(json["warning"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_error_fallback() {
        let (state, source) = live_state(vec![]);
        let (status, json) = post(state, "/api/v1/fire-risk", "{not json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fireRisk"]["dataSource"], "error-fallback");
        assert_eq!(json["fireRisk"]["riskLevel"], "Medium");
        assert!(json["error"].is_string());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_stats_and_clear() {
        let (state, _) = live_state(vec![HotspotRecord::new(-33.90, 151.20, 40.0)]);
        post(
            state.clone(),
            "/api/v1/fire-risk",
            r#"{"latitude": -33.87, "longitude": 151.21}"#,
        )
        .await;

        let request = Request::builder()
            .uri("/api/v1/fire-risk/cache")
            .body(Body::empty())
            .unwrap();
        let response = fire_risk_router(state.clone()).oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stats: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stats["populated"], true);
        assert_eq!(stats["record_count"], 1);

        let (status, cleared) = clear(state, Some("letmein")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["populated"], false);
    }

    async fn populate(state: &FireState) {
        let records = vec![HotspotRecord::new(-33.90, 151.20, 40.0)];
        state.service.cache().replace(records, Utc::now()).await;
    }

    async fn populated_state() -> FireState {
        let (state, _) = live_state(vec![]);
        populate(&state).await;
        state
    }

    #[tokio::test]
    async fn test_clear_with_bad_token_is_401() {
        let state = populated_state().await;

        for token in [None, Some("wrong"), Some("")] {
            let (status, json) = clear(state.clone(), token).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "token: {:?}", token);
            assert!(json["error"].is_string());
        }
        assert!(state.service.cache().latest().await.is_some());
    }

    #[tokio::test]
    async fn test_clear_disabled_without_configured_token() {
        let state = unconfigured_state();
        populate(&state).await;

        let (status, _) = clear(state.clone(), Some("anything")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(state.service.cache().latest().await.is_some());
    }

    #[tokio::test]
    async fn test_clear_with_token() {
        let state = populated_state().await;
        let (status, json) = clear(state.clone(), Some("letmein")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["populated"], false);
        assert!(state.service.cache().latest().await.is_none());
    }
}
