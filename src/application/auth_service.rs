use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::session_repository::SessionRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, session::Session, user::User};
use crate::infrastructure::security::{JwtKeys, TOKEN_TTL_SECS, hash_password, verify_password};
use crate::presentation::utils::AuthenticatedUser;

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Clone)]
pub struct AuthService<U: UserRepository + 'static, S: SessionRepository + 'static> {
    users: Arc<U>,
    sessions: Arc<S>,
    keys: JwtKeys,
}

impl<U, S> AuthService<U, S>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    pub fn new(users: Arc<U>, sessions: Arc<S>, keys: JwtKeys) -> Self {
        Self {
            users,
            sessions,
            keys,
        }
    }

    #[instrument(skip(self, password, password_confirmation))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
        password_confirmation: String,
    ) -> Result<User, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::Validation("username must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(DomainError::Validation("email must be a valid address".into()));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::Validation(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        if password != password_confirmation {
            return Err(DomainError::Validation(
                "password confirmation does not match".into(),
            ));
        }

        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.to_lowercase(), hash);
        self.users.create(user).await
    }

    /// Issues a bearer token backed by a fresh session row.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DomainError> {
        if email.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(
                "email and password are required".into(),
            ));
        }

        let user = self
            .users
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let session = self
            .sessions
            .create(Session::new(user.id, TOKEN_TTL_SECS))
            .await?;

        self.keys
            .generate_token(user.id, session.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Drops the session; the token stops resolving even before `exp`.
    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: Uuid) -> Result<(), DomainError> {
        self.sessions.delete(session_id).await
    }

    /// Resolves a bearer token to its user. Every failure collapses to
    /// `Unauthorized` so callers learn nothing about which check tripped.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, DomainError> {
        let claims = self
            .keys
            .verify_token(token)
            .map_err(|_| DomainError::Unauthorized)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;
        let session_id = Uuid::parse_str(&claims.jti).map_err(|_| DomainError::Unauthorized)?;

        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        if session.user_id != user_id || session.is_expired() {
            return Err(DomainError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
            session_id,
        })
    }
}
