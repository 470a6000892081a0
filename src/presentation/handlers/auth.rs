use actix_web::{HttpResponse, Responder, Scope, post, web};
use serde_json::json;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::data::session_repository::PostgresSessionRepository;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::security::TOKEN_TTL_SECS;
use crate::presentation::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::presentation::utils::AuthenticatedUser;

type ConfiguredAuthService = AuthService<PostgresUserRepository, PostgresSessionRepository>;

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(register)
        .service(login)
        .service(web::scope("").wrap(JwtAuthMiddleware).service(logout))
}

#[post("/register")]
async fn register(
    service: web::Data<ConfiguredAuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, DomainError> {
    let payload = payload.into_inner();
    let password = payload.password.clone();

    let user = service
        .register(
            payload.username,
            payload.email,
            payload.password,
            payload.password_confirmation,
        )
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");

    let jwt = service.login(&user.email, &password).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: jwt,
        expires_in: TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
    }))
}

#[post("/login")]
async fn login(
    service: web::Data<ConfiguredAuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let jwt = service.login(&payload.email, &payload.password).await?;

    info!(email = %payload.email, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
    }))
}

#[post("/logout")]
async fn logout(
    service: web::Data<ConfiguredAuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, DomainError> {
    service.logout(user.session_id).await?;

    info!(user_id = %user.id, username = %user.username, "user logged out");

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully" })))
}
