use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use relay_core::{CurrentWeather, RelayError, WeatherQuery, WeatherRelay};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Every failure leaves the server as `{"error": ...}` JSON.
#[derive(Debug)]
pub enum ApiError {
    Relay(RelayError),
    Query(QueryRejection),
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self::Relay(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Query(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Relay(err) if err.is_client_error() => {
                tracing::info!(error = %err, "Rejecting weather request");
                (StatusCode::BAD_REQUEST, err.user_message().to_string())
            }
            ApiError::Relay(err) => {
                tracing::warn!(error = ?err, "Upstream weather lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.user_message().to_string())
            }
            ApiError::Query(rejection) => {
                tracing::info!(error = %rejection, "Malformed query string");
                (rejection.status(), rejection.body_text())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Query keys are read as raw pairs so a repeated `city` or `state` keeps its
/// first value instead of failing extraction.
async fn weather(
    State(relay): State<Arc<WeatherRelay>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let Query(pairs) = query?;
    let query = WeatherQuery::from_pairs(pairs);
    Ok(Json(relay.current_weather(&query).await?))
}

/// Routes with permissive CORS: any origin, method and header.
pub fn router(relay: Arc<WeatherRelay>) -> Router {
    Router::new()
        .route("/weather", get(weather))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

pub async fn serve(relay: WeatherRelay, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    tracing::info!("Weather relay listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(Arc::new(relay)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Config;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Runs the router on an ephemeral port with both providers pointed at `upstream`.
    async fn spawn_relay(upstream: &MockServer) -> String {
        let mut config = Config::default();
        config.geocoder.base_url = upstream.uri();
        config.forecast.base_url = upstream.uri();
        spawn_relay_with(&config).await
    }

    async fn spawn_relay_with(config: &Config) -> String {
        let relay = WeatherRelay::from_config(config).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(relay))).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn mount_forecast(upstream: &MockServer, lat: &str, lon: &str, current: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", lat))
            .and(query_param("longitude", lon))
            .and(query_param("current_weather", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "current_weather": current })),
            )
            .expect(1)
            .mount(upstream)
            .await;
    }

    #[tokio::test]
    async fn campinas_round_trip() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("city", "Campinas"))
            .and(query_param("state", "SP"))
            .and(query_param("country", "Brazil"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"lat": "-22.9", "lon": "-47.06"}])),
            )
            .expect(1)
            .mount(&upstream)
            .await;
        mount_forecast(&upstream, "-22.9", "-47.06", json!({"temperature": 25.1, "windspeed": 10}))
            .await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&state=SP")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"temperature": 25.1, "windspeed": 10}));
    }

    #[tokio::test]
    async fn no_params_use_default_coordinates() {
        let upstream = MockServer::start().await;
        mount_forecast(&upstream, "-23.55", "-46.63", json!({"temperature": 21.0})).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"temperature": 21.0}));
    }

    async fn mount_geocoder(upstream: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(template)
            .mount(upstream)
            .await;
    }

    #[tokio::test]
    async fn lone_city_and_coordinate_params_are_ignored() {
        let upstream = MockServer::start().await;
        mount_forecast(&upstream, "-23.55", "-46.63", json!({"temperature": 21.0})).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&latitude=1&longitude=2"))
            .await
            .unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"temperature": 21.0}));
    }

    #[tokio::test]
    async fn lone_state_uses_default_coordinates() {
        let upstream = MockServer::start().await;
        mount_forecast(&upstream, "-23.55", "-46.63", json!({"temperature": 19.5})).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?state=SP")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"temperature": 19.5}));
    }

    #[tokio::test]
    async fn repeated_keys_use_first_value() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("city", "Campinas"))
            .and(query_param("state", "SP"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"lat": "-22.9", "lon": "-47.06"}])),
            )
            .expect(1)
            .mount(&upstream)
            .await;
        mount_forecast(&upstream, "-22.9", "-47.06", json!({"temperature": 25.1})).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&city=Other&state=SP"))
            .await
            .unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"temperature": 25.1}));
    }

    #[tokio::test]
    async fn blank_geocoded_coordinates_are_bad_request() {
        let upstream = MockServer::start().await;
        mount_geocoder(
            &upstream,
            ResponseTemplate::new(200).set_body_json(json!([{"lat": "", "lon": ""}])),
        )
        .await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&state=SP")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Cidade ou estado não encontrados"}));
    }

    #[tokio::test]
    async fn malformed_geocoder_body_is_internal_error() {
        let upstream = MockServer::start().await;
        mount_geocoder(&upstream, ResponseTemplate::new(200).set_body_string("<html>")).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&state=SP")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Erro ao buscar dados"}));
    }

    #[tokio::test]
    async fn unreachable_geocoder_is_internal_error() {
        let upstream = MockServer::start().await;
        let closed = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let mut config = Config::default();
        config.geocoder.base_url = closed;
        config.forecast.base_url = upstream.uri();

        let base = spawn_relay_with(&config).await;
        let res = reqwest::get(format!("{base}/weather?city=Campinas&state=SP")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Erro ao buscar dados"}));
    }

    #[tokio::test]
    async fn array_forecast_body_is_internal_error() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"temperature": 1}])))
            .mount(&upstream)
            .await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn null_current_weather_passes_through() {
        let upstream = MockServer::start().await;
        mount_forecast(&upstream, "-23.55", "-46.63", Value::Null).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn unknown_place_is_bad_request() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&upstream)
            .await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather?city=Atlantis&state=XX")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Cidade ou estado não encontrados"}));
    }

    #[tokio::test]
    async fn forecast_failure_is_internal_error() {
        let upstream = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&upstream)
            .await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::get(format!("{base}/weather")).await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": "Erro ao buscar dados"}));
    }

    #[tokio::test]
    async fn any_origin_is_allowed() {
        let upstream = MockServer::start().await;
        mount_forecast(&upstream, "-23.55", "-46.63", json!({})).await;

        let base = spawn_relay(&upstream).await;
        let res = reqwest::Client::new()
            .get(format!("{base}/weather"))
            .header("Origin", "http://example.test")
            .send()
            .await
            .unwrap();

        let allow = res.headers().get("access-control-allow-origin").unwrap();
        assert_eq!(allow, "*");
    }
}
