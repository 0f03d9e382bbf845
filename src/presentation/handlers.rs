// HTTP request handlers
use crate::domain::dashboard::DashboardId;
use crate::domain::session::SessionContext;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Deserialize)]
pub struct SelectQuery {
    pub dashboard_id: Option<String>,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards))
        .route("/home", get(select_dashboard).post(submit_query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Dashboards (sites) available for selection
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.query_service.list_dashboards().await)
}

/// Select a dashboard for this session and return its entity catalog
pub async fn select_dashboard(
    headers: HeaderMap,
    Query(query): Query<SelectQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let existing = session_key(&headers);
    let key = existing.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let requested = query
        .dashboard_id
        .filter(|id| !id.trim().is_empty())
        .map(|id| DashboardId::new(id.trim()));

    let dashboard_id = match requested {
        Some(id) => {
            state.sessions.set(&key, SessionContext::with_dashboard(id.clone()));
            id
        }
        None => match state.sessions.get(&key).selected_dashboard {
            Some(id) => id,
            None => return bad_request("dashboard_id is required"),
        },
    };

    tracing::info!(dashboard_id = %dashboard_id, "Dashboard selected");
    let view = state.query_service.select_site(&dashboard_id).await;

    let mut response = Json(view).into_response();
    if existing.is_none() {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, key, state.session_ttl_secs
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// Answer a free-text question in the context of the session's dashboard
pub async fn submit_query(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Option<Json<QueryRequest>>,
) -> Response {
    let query = body
        .and_then(|Json(request)| request.query)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    let Some(query) = query else {
        return bad_request("Query is required");
    };

    let session = session_key(&headers)
        .map(|key| state.sessions.get(&key))
        .unwrap_or_default();

    let answer = state.query_service.answer(&query, &session).await;
    tracing::info!(decision = ?answer.decision, "Query answered");

    Json(QueryResponse {
        response: answer.response,
        devices: answer.devices,
    })
    .into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query_service::QueryService;
    use crate::application::test_support::{StubCompletion, StubRepository};
    use crate::infrastructure::config::AssistantSettings;
    use crate::infrastructure::session_store::InMemorySessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_SESSION_TTL_SECS: u64 = 600;

    fn create_test_app(completion: StubCompletion) -> Router {
        let repository = StubRepository::new()
            .with_device("42", "Server Room Sensor", "temperature", &[("temperature", "21.5")])
            .with_dashboard("site-1", "Head Office", &["42"]);
        let state = AppState {
            query_service: QueryService::new(
                Arc::new(repository),
                Arc::new(completion),
                &AssistantSettings::default(),
            ),
            sessions: Arc::new(InMemorySessionStore::new(Duration::from_secs(TEST_SESSION_TTL_SECS))),
            session_ttl_secs: TEST_SESSION_TTL_SECS,
        };
        create_router(Arc::new(state))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_query(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/home")
            .header("Content-Type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn test_session_key_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session_id=abc-123"));
        assert_eq!(session_key(&headers).as_deref(), Some("abc-123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("session_id="));
        assert!(session_key(&empty).is_none());
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let app = create_test_app(StubCompletion::replying("unused"));

        let response = app.oneshot(post_query(r#"{"query": "   "}"#, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Query is required");
    }

    #[tokio::test]
    async fn test_missing_query_field_is_rejected() {
        let app = create_test_app(StubCompletion::replying("unused"));

        let response = app.oneshot(post_query("{}", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_selecting_dashboard_sets_cookie_and_lists_entities() {
        let app = create_test_app(StubCompletion::replying("unused"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/home?dashboard_id=site-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session_id="));
        assert!(cookie.contains("Max-Age=600"));

        let body = json_body(response).await;
        assert_eq!(body["dashboard_title"], "Head Office");
        assert_eq!(body["entities"][0]["label"], "Server Room Sensor");
    }

    #[tokio::test]
    async fn test_home_without_selection_is_rejected() {
        let app = create_test_app(StubCompletion::replying("unused"));

        let response = app
            .oneshot(Request::builder().uri("/home").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_query_uses_selected_dashboard() {
        let app = create_test_app(StubCompletion::new(|prompt| {
            let answer = if prompt.contains("respond with ONLY 'YES'") {
                "YES"
            } else if prompt.contains("return ONLY the corresponding ID") {
                "42"
            } else {
                "It is 21.5 degrees."
            };
            Ok(answer.to_string())
        }));

        let select = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/home?dashboard_id=site-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = select
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();

        let response = app
            .oneshot(post_query(r#"{"query": "How warm is the server room?"}"#, Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], "It is 21.5 degrees.");
        assert_eq!(body["devices"][0], "Server Room Sensor, temperature");
    }

    #[tokio::test]
    async fn test_query_without_session_answers_directly() {
        let app = create_test_app(StubCompletion::replying("Hello there."));

        let response = app.oneshot(post_query(r#"{"query": "hi"}"#, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], "Hello there.");
        assert!(body.get("devices").is_none());
    }
}
