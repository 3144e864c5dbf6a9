//! Password strategy and session tokens.
//!
//! Users live in `_sys_users` with Argon2 PHC hashes. A successful login issues an HS256 JWT
//! which is returned in the body and set as an `HttpOnly` cookie; either can be presented later.

mod session;

pub use session::{cookie_value, token_from_headers, Claims, SessionUser, ISSUER};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::store::{count_users, find_user_by_email, insert_user, UserRow};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Verified in place of a stored hash when the email is unknown, so both failures cost one
/// Argon2 run. Same parameters as `Argon2::default()`.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$zkMVKa7XXYT3idVWJ2Jahg$JLP5zUqHP4TULFJesIQbWTsB91ivC5kOhe+pkveEmVY";

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        AuthService {
            pool,
            config,
            encoding,
            decoding,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn allow_register(&self) -> bool {
        self.config.enabled && self.config.allow_register
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<SessionUser, AppError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let hash = hash_password(password.to_string()).await?;
        let row = insert_user(&self.pool, &email, &hash, None).await?;
        tracing::info!(user_id = row.id, "user registered");
        Ok(user_from_row(row))
    }

    /// Check credentials. Unknown email and wrong password fail the same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AppError> {
        let invalid = || AppError::Authentication("invalid credentials".into());
        let email = normalize_email(email).map_err(|_| invalid())?;
        let row = find_user_by_email(&self.pool, &email).await?;
        let hash = row
            .as_ref()
            .map_or(DUMMY_HASH, |r| r.password_hash.as_str())
            .to_string();
        let verified = verify_password(password.to_string(), hash).await?;
        match row {
            Some(row) if verified => Ok(user_from_row(row)),
            _ => Err(invalid()),
        }
    }

    pub fn issue_token(&self, user: &SessionUser) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + self.config.token_ttl_secs as i64,
            iss: ISSUER.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<SessionUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AppError::Authentication(format!("invalid session token: {}", e)))?;
        data.claims.into_user()
    }

    /// Verify the session carried by request headers (bearer token or cookie).
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<SessionUser, AppError> {
        if !self.config.enabled {
            return Err(AppError::Authentication("authentication is disabled".into()));
        }
        let token = token_from_headers(headers, &self.config.cookie_name)?
            .ok_or_else(|| AppError::Authentication("no session".into()))?;
        self.verify_token(&token)
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.config.cookie_name, token, self.config.token_ttl_secs
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.config.cookie_name)
    }

    /// Create the configured seed user when the user table is empty.
    pub async fn seed(&self) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (&self.config.seed_email, &self.config.seed_password) else {
            return Ok(());
        };
        if !self.config.enabled || count_users(&self.pool).await? > 0 {
            return Ok(());
        }
        let user = self.register(email, password).await?;
        tracing::warn!(email = %user.email, "seeded initial user from AUTH_SEED_EMAIL/AUTH_SEED_PASSWORD");
        Ok(())
    }
}

fn user_from_row(row: UserRow) -> SessionUser {
    SessionUser {
        id: row.id,
        email: row.email,
        role: row.role,
        verified: true,
    }
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(AppError::Validation("email must be a valid email".into()));
    }
    Ok(email)
}

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}
