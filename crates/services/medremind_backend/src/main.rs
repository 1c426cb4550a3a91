use axum::{routing::get, Router};
use medremind_common::{logging, MedremindError};
use medremind_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod app_state;

use app_state::AppState;

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            // no subscriber yet
            eprintln!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    let _log_guard = logging::init_from_config(config.logging.as_ref());

    if let Err(err) = run(config).await {
        error!("Server terminated: {}", err);
        std::process::exit(1);
    }
}

async fn run(config: Arc<medremind_config::AppConfig>) -> Result<(), MedremindError> {
    let state = AppState::new(config).await?;

    let api_router = Router::new().nest("/api", {
        let mut router = Router::new().route("/", get(|| async { "Welcome to MedRemind API!" }));
        if let Some(push) = state.push.clone() {
            router = router.merge(medremind_push::routes(push));
        }
        router
    });

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = api_router.layer(TraceLayer::new_for_http());

    #[cfg(feature = "openapi")]
    {
        use medremind_push::openapi::PushApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "MedRemind API",
                version = "0.1.0",
                description = "Device registration and alarm push delivery",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(PushApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| MedremindError::ConfigError(format!("cannot bind {}: {}", addr, e)))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| MedremindError::InternalError(format!("server error: {}", e)))
}
