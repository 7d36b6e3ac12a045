#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use orchard_api::{
    auth::AuthService,
    config::{AppConfig, PaymentConfig},
    db::{self, DbConfig},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Harness spinning up the application over a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    pub auth_service: Arc<AuthService>,
    pub user_id: Uuid,
    token: String,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

pub fn test_config() -> AppConfig {
    let db_file = std::env::temp_dir().join(format!("orchard_test_{}.db", Uuid::new_v4()));
    let upload_dir = std::env::temp_dir().join(format!("orchard_slips_{}", Uuid::new_v4()));

    AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_file.display()),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        jwt_secret: "test_secret_key_for_testing_purposes_only_32chars".to_string(),
        jwt_expiration: 3600,
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        upload_dir: upload_dir.display().to_string(),
        pending_order_expiry_secs: 24 * 3600,
        expiry_sweep_interval_secs: 900,
        payment: PaymentConfig {
            secret_key: "sk_test_orchard".to_string(),
            webhook_secret: Some("whsec_orchard_test".to_string()),
            webhook_tolerance_secs: 300,
            api_base: "http://127.0.0.1:9".to_string(),
            currency: "usd".to_string(),
            success_url: "http://localhost:5173/payment-success".to_string(),
            cancel_url: "http://localhost:5173/payment-failed".to_string(),
            min_charge_minor_units: 50,
        },
    }
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = test_config();

        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let redis_client = Arc::new(
            redis::Client::open(cfg.redis_url.clone()).expect("invalid redis url for tests"),
        );

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg);

        let auth_service = Arc::new(AuthService::new(&cfg.jwt_secret, cfg.jwt_expiration));

        let state = Arc::new(AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            redis: redis_client,
        });

        let user_id = Uuid::new_v4();
        let token = auth_service
            .issue_token(user_id, vec![])
            .expect("issue user token");
        let admin_token = auth_service
            .issue_token(Uuid::new_v4(), vec!["admin".to_string()])
            .expect("issue admin token");

        let router = Router::new()
            .merge(orchard_api::base_routes())
            .nest("/api/v1", orchard_api::api_v1_routes(auth_service.clone()))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            user_id,
            token,
            admin_token,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request with the default user's bearer token.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request_with_token(method, uri, body, Some(&self.token))
            .await
    }

    /// Send a request with the admin bearer token.
    pub async fn request_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let token = self.admin_token.clone();
        self.request_with_token(method, uri, body, Some(&token))
            .await
    }

    /// Send a request without credentials.
    pub async fn request_anonymous(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        self.request_with_token(method, uri, body, None).await
    }

    async fn request_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Send a raw-body request (webhook style) with arbitrary headers.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, String)],
        body: Vec<u8>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        let request = builder.body(Body::from(body)).expect("build raw request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

/// Reads a response body as JSON.
pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
