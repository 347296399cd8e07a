//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::access::{AccessEngine, GateRequirements};
use crate::domains::identity::IdentityProvider;
use crate::domains::mugshots::{MugshotListingCache, MugshotStore};
use crate::domains::payments::webhook::{self, WebhookState};
use crate::domains::payments::{PaymentGateway, PaymentStore, WebhookStore};
use crate::server::gate::gate_middleware;
use crate::server::middleware::session_auth_middleware;
use crate::server::routes::{health_handler, mugshots, payments, session};

/// How long the public listing is served from cache.
const LISTING_CACHE_TTL: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mugshots: Arc<dyn MugshotStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub webhooks: Arc<dyn WebhookStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub engine: Arc<AccessEngine>,
    pub listing_cache: Arc<MugshotListingCache>,
}

impl AppState {
    /// Wire up shared state from its collaborators. The access engine is
    /// built over the same identity provider and stores the handlers use.
    pub fn new(
        db_pool: Option<PgPool>,
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        mugshots: Arc<dyn MugshotStore>,
        payments: Arc<dyn PaymentStore>,
        webhooks: Arc<dyn WebhookStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let engine = Arc::new(AccessEngine::new(
            identity.clone(),
            mugshots.clone(),
            payments.clone(),
        ));
        Self {
            db_pool,
            config: Arc::new(config),
            identity,
            mugshots,
            payments,
            webhooks,
            gateway,
            engine,
            listing_cache: Arc::new(MugshotListingCache::new(LISTING_CACHE_TTL)),
        }
    }
}

/// Attach the gate to a sub-router with fixed requirements.
fn gated(router: Router, state: AppState, requirements: GateRequirements) -> Router {
    router.route_layer(middleware::from_fn(move |req, next| {
        gate_middleware(state.clone(), requirements, req, next)
    }))
}

/// Build the Axum application router
///
/// Gated routes declare `{requires_profile, requires_payment}` here; the
/// gate middleware renders the remediation response for denials. Layers
/// are applied in reverse order - the last added runs first.
pub fn build_app(state: AppState) -> Router {
    // Member-only features: full gate.
    let member_routes = gated(
        Router::new().route("/wall", get(payments::wall_handler)),
        state.clone(),
        GateRequirements::MEMBER,
    );

    // Checkout needs a signed-in user with a mugshot, but no payment yet.
    let checkout_routes = gated(
        Router::new().route("/payments/checkout", post(payments::start_checkout_handler)),
        state.clone(),
        GateRequirements::PROFILE,
    );

    // Profile management only needs a session.
    let profile_routes = gated(
        Router::new()
            .route("/mugshots", post(mugshots::create_mugshot_handler))
            .route(
                "/mugshots/me",
                get(mugshots::my_mugshot_handler).put(mugshots::update_mugshot_handler),
            )
            .route("/mugshots/:id", delete(mugshots::delete_mugshot_handler)),
        state.clone(),
        GateRequirements::LOGIN_ONLY,
    );

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/mugshots", get(mugshots::list_mugshots_handler))
        .route(
            "/auth/session",
            post(session::sign_in_handler).delete(session::sign_out_handler),
        )
        .route("/auth/me", get(session::me_handler));

    let webhook_routes = webhook::router(WebhookState {
        payments: state.payments.clone(),
        webhooks: state.webhooks.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let session_state = state.clone();

    let mut app = public_routes
        .merge(profile_routes)
        .merge(checkout_routes)
        .merge(member_routes)
        .merge(webhook_routes)
        .layer(middleware::from_fn(move |req, next| {
            session_auth_middleware(session_state.clone(), req, next)
        }));

    if state.config.rate_limit_enabled {
        // 10 req/sec with a burst of 20, keyed on the client IP.
        let rate_limit_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(10)
                .burst_size(20)
                .use_headers()
                .finish()
                .expect("Rate limiter configuration is valid and should never fail"),
        );
        app = app.layer(GovernorLayer {
            config: rate_limit_config,
        });
    }

    app.layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
