pub mod auth;
pub mod entity;
pub mod media;
pub mod system;
