//! HTTP server: transport webhooks, the web chat surface, and admin endpoints.
//!
//! Webhooks acknowledge immediately and run the turn in a spawned task.
//! The web chat runs the turn inline and returns what the engine sent.

use crate::gateway::Gateway;
use axum::{
    body::Bytes,
    extract::{
        rejection::{FormRejection, JsonRejection},
        Form, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chatlingo_channels::{
    sms::{SmsAdapter, EMPTY_TWIML},
    telegram::{self, TelegramAdapter, TgUpdate},
    web::WebAdapter,
    whatsapp::{self, WhatsAppAdapter},
};
use chatlingo_core::{
    config::{ApiConfig, Config},
    identity,
    message::{InboundEvent, InboundKind},
    model::Platform,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

type ApiError = (StatusCode, Json<Value>);

/// The concrete transports the HTTP layer parses for.
///
/// The same adapters are registered with the gateway for sending.
#[derive(Clone, Default)]
pub struct Transports {
    pub whatsapp: Option<Arc<WhatsAppAdapter>>,
    pub telegram: Option<Arc<TelegramAdapter>>,
    pub sms: Option<Arc<SmsAdapter>>,
    pub web: Arc<WebAdapter>,
}

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<Gateway>,
    transports: Transports,
    api_key: Option<String>,
    environment: String,
    nudge_concurrency: usize,
    uptime: Instant,
}

impl ApiState {
    pub fn new(gateway: Arc<Gateway>, transports: Transports, config: &Config) -> Self {
        let api_key = if config.api.api_key.is_empty() {
            None
        } else {
            Some(config.api.api_key.clone())
        };
        Self {
            gateway,
            transports,
            api_key,
            environment: config.chatlingo.environment.clone(),
            nudge_concurrency: config.nudge.max_concurrency,
            uptime: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: String,
    user_msg: String,
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    session_id: String,
}

/// Constant-time string comparison to prevent timing attacks on API token validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<ApiError> {
    let key = api_key.as_ref()?;

    let value = match headers.get(header::AUTHORIZATION).map(|h| h.to_str()) {
        None => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "missing Authorization header"})),
            ))
        }
        Some(Err(_)) => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid Authorization header"})),
            ))
        }
        Some(Ok(v)) => v,
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None,
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
    }
}

fn not_configured(transport: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("{transport} not configured")})),
    )
}

/// Run one turn in the background; errors are logged, never returned.
fn spawn_turn(gateway: Arc<Gateway>, event: InboundEvent) {
    tokio::spawn(async move {
        let platform = event.platform;
        if let Err(e) = gateway.handle_event(event).await {
            error!("api: {platform} turn failed: {e}");
        }
    });
}

/// `GET /health`: liveness.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.environment,
        "uptime_secs": state.uptime.elapsed().as_secs(),
    }))
}

/// `GET /whatsapp-webhook`: Meta subscription handshake.
async fn whatsapp_verify(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(wa) = &state.transports.whatsapp else {
        return not_configured("whatsapp").into_response();
    };
    match whatsapp::verify_subscription(
        params.get("hub.mode").map(String::as_str),
        params.get("hub.verify_token").map(String::as_str),
        params.get("hub.challenge").map(String::as_str),
        &wa.config().verify_token,
    ) {
        Some(challenge) => {
            info!("whatsapp: webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!("whatsapp: webhook verification rejected");
            (StatusCode::FORBIDDEN, "Verification failed").into_response()
        }
    }
}

/// `POST /whatsapp-webhook`: inbound messages and status callbacks.
async fn whatsapp_inbound(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let wa = state
        .transports
        .whatsapp
        .clone()
        .ok_or_else(|| not_configured("whatsapp"))?;

    match whatsapp::parse_webhook(&body) {
        Some(event) => {
            let gateway = state.gateway.clone();
            tokio::spawn(async move {
                if let Some(id) = &event.message_id {
                    if let Err(e) = wa.mark_read(id).await {
                        debug!("whatsapp: mark_read failed: {e}");
                    }
                }
                if let Err(e) = gateway.handle_event(event).await {
                    error!("api: whatsapp turn failed: {e}");
                }
            });
        }
        None => debug!("whatsapp: no message in payload, dropped"),
    }
    Ok(Json(json!({"status": "received"})))
}

/// `POST /telegram-webhook`: Bot API updates.
async fn telegram_inbound(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<TgUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let tg = state
        .transports
        .telegram
        .clone()
        .ok_or_else(|| not_configured("telegram"))?;

    let secret = headers
        .get(telegram::SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !tg.secret_matches(secret) {
        warn!("telegram: webhook secret mismatch");
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "invalid secret token"})),
        ));
    }

    let update = match body {
        Ok(Json(update)) => update,
        Err(e) => {
            debug!("telegram: unparseable update dropped: {e}");
            return Ok(Json(json!({"status": "ok"})));
        }
    };

    match telegram::parse_update(&update) {
        Some(event) => {
            let gateway = state.gateway.clone();
            tokio::spawn(async move {
                if let (InboundKind::Button(_), Some(id)) = (&event.kind, &event.message_id) {
                    if let Err(e) = tg.answer_callback_query(id).await {
                        debug!("telegram: answerCallbackQuery failed: {e}");
                    }
                }
                if let Err(e) = gateway.handle_event(event).await {
                    error!("api: telegram turn failed: {e}");
                }
            });
        }
        None => debug!("telegram: update {} has no usable content", update.update_id),
    }
    Ok(Json(json!({"status": "ok"})))
}

/// `POST /sms-webhook`: Twilio form post. Replies go out via the REST API,
/// so the TwiML response is always empty.
async fn sms_inbound(
    State(state): State<ApiState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Response, ApiError> {
    let sms = state
        .transports
        .sms
        .clone()
        .ok_or_else(|| not_configured("sms"))?;

    match form {
        Ok(Form(form)) => match sms.parse_form(&form) {
            Some(event) => spawn_turn(state.gateway.clone(), event),
            None => debug!("sms: form without sender or body dropped"),
        },
        Err(e) => debug!("sms: unparseable webhook body dropped: {e}"),
    }
    Ok(([(header::CONTENT_TYPE, "text/xml")], EMPTY_TWIML).into_response())
}

/// `POST /api/nudges/send`: run the nudge sweep now.
async fn send_nudges(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ApiError> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    let report = state
        .gateway
        .run_nudge_sweep(state.nudge_concurrency)
        .await
        .map_err(|e| {
            error!("api: manual nudge sweep failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("nudge sweep failed: {e}")})),
            )
        })?;

    Ok(Json(json!({
        "response": "Daily nudges sent successfully",
        "report": report,
    })))
}

/// `POST /api/chat`: one synchronous web chat turn.
async fn web_chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid request: {e}")})),
        )
    })?;
    if request.session_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "session_id must not be empty"})),
        ));
    }

    let contact = identity::normalize_address(Platform::Web, &request.session_id);
    let event = InboundEvent::text(Platform::Web, request.session_id.as_str(), request.user_msg);
    let outcome = state.gateway.handle_event(event).await;
    let replies = state.transports.web.drain(&contact);

    if let Err(e) = outcome {
        error!("api: web chat turn failed: {e}");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "chat turn failed"})),
        ));
    }

    let response = replies
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(Json(json!({
        "response": response,
        "replies": replies,
    })))
}

/// `POST /api/reset`: forget a web chat session's history.
async fn web_reset(
    State(state): State<ApiState>,
    body: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid request: {e}")})),
        )
    })?;
    if request.session_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "session_id must not be empty"})),
        ));
    }

    let cleared = state
        .gateway
        .reset_user(Platform::Web, &request.session_id)
        .await
        .map_err(|e| {
            error!("api: reset failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "reset failed"})),
            )
        })?;
    Ok(Json(json!({"status": "reset", "cleared": cleared})))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/whatsapp-webhook",
            get(whatsapp_verify).post(whatsapp_inbound),
        )
        .route("/telegram-webhook", post(telegram_inbound))
        .route("/sms-webhook", post(sms_inbound))
        .route("/api/nudges/send", post(send_nudges))
        .route("/api/chat", post(web_chat))
        .route("/api/reset", post(web_reset))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("API server failed to bind to {addr}: {e}"))?;

    info!("API server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{scenario, MockProvider, RecordingAdapter, Sent};
    use axum::body::Body;
    use axum::http::Request;
    use chatlingo_core::{
        config::{Prompts, SmsConfig, TelegramConfig, WhatsAppConfig},
        curriculum::Curriculum,
        model::Mode,
        traits::PlatformAdapter,
    };
    use chatlingo_memory::Store;
    use chatlingo_providers::LlmGateway;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Nothing listens here; outbound calls from real adapters fail fast.
    const DEAD_URL: &str = "http://127.0.0.1:9";

    struct TestApp {
        state: ApiState,
        gateway: Arc<Gateway>,
        whatsapp: Arc<RecordingAdapter>,
        telegram: Arc<RecordingAdapter>,
        sms: Arc<RecordingAdapter>,
    }

    impl TestApp {
        fn router(&self) -> Router {
            build_router(self.state.clone())
        }
    }

    fn test_config(api_key: &str) -> Config {
        let mut config = Config::default();
        config.api.api_key = api_key.to_string();
        config.chatlingo.environment = "test".into();
        config.channel.whatsapp = Some(WhatsAppConfig {
            enabled: true,
            verify_token: "verify-me".into(),
            phone_number_id: "123".into(),
            ..Default::default()
        });
        config.channel.telegram = Some(TelegramConfig {
            enabled: true,
            webhook_secret: "s3cret".into(),
            ..Default::default()
        });
        config.channel.sms = Some(SmsConfig {
            enabled: true,
            ..Default::default()
        });
        config
    }

    async fn test_app(config: Config) -> TestApp {
        let store = Store::in_memory().await.unwrap();
        store
            .upsert_scenarios(&[scenario(1, "Auto ride")])
            .await
            .unwrap();

        let whatsapp = Arc::new(RecordingAdapter::new(Platform::WhatsApp));
        let telegram = Arc::new(RecordingAdapter::new(Platform::Telegram));
        let sms = Arc::new(RecordingAdapter::new(Platform::Sms));
        let web = Arc::new(WebAdapter::new());

        let prompts = Prompts::default();
        let llm = LlmGateway::new(Arc::new(MockProvider::default()), &prompts);
        let adapters: Vec<Arc<dyn PlatformAdapter>> = vec![
            whatsapp.clone(),
            telegram.clone(),
            sms.clone(),
            web.clone(),
        ];
        let gateway = Arc::new(Gateway::new(
            &config,
            store,
            llm,
            Curriculum::bundled(),
            prompts,
            adapters,
        ));

        let channel = &config.channel;
        let transports = Transports {
            whatsapp: channel
                .whatsapp
                .clone()
                .map(|c| Arc::new(WhatsAppAdapter::with_base_url(c, DEAD_URL))),
            telegram: channel
                .telegram
                .clone()
                .map(|c| Arc::new(TelegramAdapter::with_api_url(c, DEAD_URL))),
            sms: channel
                .sms
                .clone()
                .map(|c| Arc::new(SmsAdapter::with_api_url(c, DEAD_URL))),
            web,
        };

        TestApp {
            state: ApiState::new(gateway.clone(), transports, &config),
            gateway,
            whatsapp,
            telegram,
            sms,
        }
    }

    async fn body_json(resp: axum::http::Response<Body>) -> Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(resp: axum::http::Response<Body>) -> String {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Background turns finish shortly after the webhook returns.
    async fn wait_for(adapter: &RecordingAdapter, count: usize) -> Vec<Sent> {
        for _ in 0..200 {
            let sent = adapter.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        adapter.sent()
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_health() {
        let app = test_app(test_config("")).await;
        let resp = app
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["environment"], "test");
    }

    // -----------------------------------------------------------------------
    // WhatsApp
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_whatsapp_verify_echoes_challenge() {
        let app = test_app(test_config("")).await;
        let req = Request::get(
            "/whatsapp-webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=4242",
        )
        .body(Body::empty())
        .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "4242");
    }

    #[tokio::test]
    async fn test_whatsapp_verify_rejects_bad_token() {
        let app = test_app(test_config("")).await;
        let req = Request::get(
            "/whatsapp-webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=4242",
        )
        .body(Body::empty())
        .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_whatsapp_inbound_acknowledges_and_replies() {
        let app = test_app(test_config("")).await;
        let payload = json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "919845012345",
                            "id": "wamid.1",
                            "type": "text",
                            "text": { "body": "hi" }
                        }]
                    }
                }]
            }]
        });
        let resp = app
            .router()
            .oneshot(post_json("/whatsapp-webhook", payload))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "received");

        let sent = wait_for(&app.whatsapp, 1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to(), "919845012345");
        assert!(matches!(sent[0], Sent::Buttons { .. }));
    }

    #[tokio::test]
    async fn test_whatsapp_status_callback_acknowledged_and_dropped() {
        let app = test_app(test_config("")).await;
        let payload = json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "read" }] } }] }]
        });
        let resp = app
            .router()
            .oneshot(post_json("/whatsapp-webhook", payload))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(app.whatsapp.sent().is_empty());
        assert_eq!(app.gateway.store().user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_whatsapp_garbage_body_still_acknowledged() {
        let app = test_app(test_config("")).await;
        let req = Request::post("/whatsapp-webhook")
            .body(Body::from("not json"))
            .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unconfigured_transport_is_not_found() {
        let mut config = test_config("");
        config.channel.whatsapp = None;
        let app = test_app(config).await;
        let req = Request::get("/whatsapp-webhook?hub.mode=subscribe")
            .body(Body::empty())
            .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Telegram
    // -----------------------------------------------------------------------

    fn telegram_request(secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post("/telegram-webhook").header("Content-Type", "application/json");
        if let Some(s) = secret {
            builder = builder.header(telegram::SECRET_HEADER, s);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_telegram_secret_mismatch_forbidden() {
        let app = test_app(test_config("")).await;
        let update = json!({"update_id": 1});
        let resp = app
            .router()
            .oneshot(telegram_request(Some("wrong"), update.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app
            .router()
            .oneshot(telegram_request(None, update))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_telegram_start_command_runs_turn() {
        let app = test_app(test_config("")).await;
        let update = json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": { "id": 777, "first_name": "Asha" },
                "chat": { "id": 777 },
                "text": "/start"
            }
        });
        let resp = app
            .router()
            .oneshot(telegram_request(Some("s3cret"), update))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");

        let sent = wait_for(&app.telegram, 1).await;
        assert_eq!(sent[0].to(), "777");
        assert!(matches!(sent[0], Sent::Buttons { .. }));
    }

    #[tokio::test]
    async fn test_telegram_callback_selects_scenario() {
        let app = test_app(test_config("")).await;
        let update = json!({
            "update_id": 11,
            "callback_query": {
                "id": "cb-1",
                "from": { "id": 777, "first_name": "Asha" },
                "message": { "message_id": 6, "chat": { "id": 777 } },
                "data": "scenario_1"
            }
        });
        let resp = app
            .router()
            .oneshot(telegram_request(Some("s3cret"), update))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = wait_for(&app.telegram, 1).await;
        assert_eq!(sent.len(), 1);
        let key = identity::user_key(Platform::Telegram, "777");
        let user = app.gateway.store().get_user(&key).await.unwrap().unwrap();
        assert_eq!(user.current_mode, Mode::PracticeScenario);
    }

    #[tokio::test]
    async fn test_telegram_malformed_update_acknowledged() {
        let app = test_app(test_config("")).await;
        let resp = app
            .router()
            .oneshot(telegram_request(Some("s3cret"), json!({"nope": true})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // -----------------------------------------------------------------------
    // SMS
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_sms_webhook_returns_empty_twiml() {
        let app = test_app(test_config("")).await;
        let req = Request::post("/sms-webhook")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("From=%2B919845012345&Body=menu&MessageSid=SM1"))
            .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/xml"
        );
        assert_eq!(body_text(resp).await, EMPTY_TWIML);

        let sent = wait_for(&app.sms, 1).await;
        assert_eq!(sent[0].to(), "919845012345");
    }

    #[tokio::test]
    async fn test_sms_webhook_acknowledges_non_form_body() {
        let app = test_app(test_config("")).await;
        for (content_type, body) in [
            ("application/json", r#"{"From":"+919845012345","Body":"menu"}"#),
            ("text/plain", "menu"),
        ] {
            let req = Request::post("/sms-webhook")
                .header("Content-Type", content_type)
                .body(Body::from(body))
                .unwrap();
            let resp = app.router().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{content_type}");
            assert_eq!(body_text(resp).await, EMPTY_TWIML);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(app.sms.sent().is_empty());
    }

    // -----------------------------------------------------------------------
    // Nudges
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_nudges_require_token() {
        let app = test_app(test_config("admin-key")).await;
        let req = Request::post("/api/nudges/send").body(Body::empty()).unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::post("/api/nudges/send")
            .header("Authorization", "Bearer wrong-key")
            .body(Body::empty())
            .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nudges_run_sweep() {
        let app = test_app(test_config("admin-key")).await;
        app.gateway
            .handle_event(InboundEvent::text(Platform::Telegram, "777", "menu"))
            .await
            .unwrap();
        app.telegram.clear();

        let req = Request::post("/api/nudges/send")
            .header("Authorization", "Bearer admin-key")
            .body(Body::empty())
            .unwrap();
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["response"], "Daily nudges sent successfully");
        assert_eq!(json["report"]["sent"], 1);
        assert_eq!(app.telegram.sent_to("777").len(), 1);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }

    // -----------------------------------------------------------------------
    // Web chat
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_web_chat_returns_replies_inline() {
        let app = test_app(test_config("")).await;
        let resp = app
            .router()
            .oneshot(post_json(
                "/api/chat",
                json!({"session_id": "browser-1", "user_msg": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["response"], Prompts::default().welcome);
        assert_eq!(json["replies"][0]["options"].as_array().unwrap().len(), 3);

        let resp = app
            .router()
            .oneshot(post_json(
                "/api/chat",
                json!({"session_id": "browser-1", "user_msg": "random_chat"}),
            ))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["response"], "bot reply #1");
    }

    #[tokio::test]
    async fn test_web_chat_rejects_bad_body() {
        let app = test_app(test_config("")).await;
        let resp = app
            .router()
            .oneshot(post_json("/api/chat", json!({"user_msg": "hi"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .router()
            .oneshot(post_json(
                "/api/chat",
                json!({"session_id": "  ", "user_msg": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_web_reset_clears_history() {
        let app = test_app(test_config("")).await;
        for msg in ["random_chat", "namaskara"] {
            app.router()
                .oneshot(post_json(
                    "/api/chat",
                    json!({"session_id": "browser-1", "user_msg": msg}),
                ))
                .await
                .unwrap();
        }

        let resp = app
            .router()
            .oneshot(post_json("/api/reset", json!({"session_id": "browser-1"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "reset");
        assert_eq!(json["cleared"], 3);

        let key = identity::user_key(Platform::Web, "browser-1");
        let user = app.gateway.store().get_user(&key).await.unwrap().unwrap();
        assert_eq!(user.current_mode, Mode::Menu);
    }
}
