//! The backend service object: one per process, built by [`Backend::init`] and torn down by
//! [`Backend::shutdown`]. Request handlers reach it through router state.

use crate::api::Api;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::media::MediaStore;
use crate::migration::apply_migrations;
use crate::routes::api_routes;
use crate::schema::{app_schema, resolve, SchemaDefinition};
use crate::state::AppState;
use crate::store::{connect, ensure_sys_tables};
use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;

/// Options for [`Backend::api`].
#[derive(Clone, Debug, Default)]
pub struct ApiOptions {
    /// Require a verified session in `headers`; fail with `Authentication` otherwise.
    pub verify_session: bool,
    /// Request headers; `Authorization` and `Cookie` are forwarded to the backend.
    pub headers: HeaderMap,
}

pub struct Backend {
    state: AppState,
    router: Router,
}

impl Backend {
    /// Initialize with the application schema.
    pub async fn init(config: AppConfig) -> Result<Arc<Self>, AppError> {
        Self::init_with_schema(config, app_schema()).await
    }

    /// Open the database, migrate `schema`, seed auth and build the backend router.
    pub async fn init_with_schema(config: AppConfig, schema: SchemaDefinition) -> Result<Arc<Self>, AppError> {
        let pool = connect(&config).await?;
        ensure_sys_tables(&pool).await?;
        let report = apply_migrations(&pool, &schema).await?;
        let model = resolve(&schema)?;

        let auth = AuthService::new(pool.clone(), config.auth.clone());
        auth.seed().await?;

        let media = if config.media.enabled {
            Some(MediaStore::open(&config.media).await?)
        } else {
            None
        };

        let state = AppState {
            pool,
            model: Arc::new(model),
            config: Arc::new(config),
            auth,
            media,
        };
        let router = api_routes(state.clone());
        tracing::info!(
            schema_version = report.version,
            entities = ?state.model.entity_names(),
            auth = state.auth.enabled(),
            media = state.media.is_some(),
            "backend initialized"
        );
        Ok(Arc::new(Backend { state, router }))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }

    /// The `/api` router. Cheap to clone.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Client handle for server-side code. With `verify_session` the session in `headers`
    /// must verify; without it the handle carries no user.
    pub fn api(&self, options: ApiOptions) -> Result<Api, AppError> {
        let user = if options.verify_session {
            Some(self.state.auth.verify_headers(&options.headers)?)
        } else {
            None
        };
        Ok(Api::new(self.router(), &options.headers, user))
    }

    /// Close the pool. Further database calls fail with `transport_error`.
    pub async fn shutdown(&self) {
        self.state.pool.close().await;
        tracing::info!("backend shut down");
    }
}
