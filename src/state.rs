//! Shared state for the backend routes.

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::media::MediaStore;
use crate::schema::ResolvedModel;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Resolved once at startup; the schema is static for the life of the process.
    pub model: Arc<ResolvedModel>,
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    /// `None` when media is disabled.
    pub media: Option<MediaStore>,
}
