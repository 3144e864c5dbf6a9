//! todo-start: a schema-driven CRUD backend (SQLite, password auth, local media) with the
//! todo demo application on top of it.

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod extractors;
pub mod functions;
pub mod handlers;
pub mod media;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod web;

pub use api::{Api, DataApi, ReadQuery};
pub use auth::{AuthService, SessionUser};
pub use backend::{ApiOptions, Backend};
pub use config::AppConfig;
pub use error::{AppError, ConfigError, ErrorKind};
pub use migration::{apply_migrations, MigrationReport};
pub use response::{success_many, success_one};
pub use schema::{app_schema, resolve, EntityDefinition, Field, FieldKind, ResolvedEntity, ResolvedModel, SchemaDefinition};
pub use service::CrudService;
pub use state::AppState;
pub use web::app_router;
