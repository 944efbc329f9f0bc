use crate::{
    auth::{
        auth::bearer_token,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{
        role::Role,
        user::{NewUser, User},
    },
    models::{LoginReqDto, RegisterReq, TokenResponse, TokenType},
    repository::{RefreshTokenRepository, UserRepository},
    utils::validation::{Validator, normalize_email},
};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::DateTime;
use tracing::{debug, info, instrument};

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::Internal(format!("failed to sign token: {e}"))
}

/// Signs a fresh access/refresh pair and records the refresh token.
async fn issue_tokens(
    user: &User,
    tokens: &dyn RefreshTokenRepository,
    config: &Config,
) -> Result<TokenResponse, AppError> {
    let access_token = generate_access_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    let expires_at = DateTime::from_timestamp(refresh_claims.exp as i64, 0)
        .ok_or_else(|| AppError::Internal("refresh token expiry out of range".into()))?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");
    tokens.store(user.id, &refresh_claims.jti, expires_at).await?;

    Ok(TokenResponse {
        token_type: "Bearer".to_string(),
        access_token,
        refresh_token,
        expires_in: config.access_token_ttl,
        user: user.into(),
    })
}

/// Register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists", body = Object, example = json!({
            "code": 409,
            "message": "\"email\" already exists"
        }))
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    users: web::Data<dyn UserRepository>,
    tokens: web::Data<dyn RefreshTokenRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let email = normalize_email(&payload.email);

    Validator::new()
        .email("email", &email)
        .password("password", &payload.password)
        .name("name", payload.name.as_deref())
        .finish()?;

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::duplicate_email());
    }

    // signup never grants more than the default role
    let user = users
        .insert(NewUser {
            email,
            password: hash_password(&payload.password)?,
            name: payload.name,
            role: Role::User,
        })
        .await?;

    info!(user_id = user.id, "User registered");

    let body = issue_tokens(&user, tokens.get_ref(), &config).await?;
    Ok(HttpResponse::Created().json(body))
}

/// Login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(users, tokens, config, payload),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    users: web::Data<dyn UserRepository>,
    tokens: web::Data<dyn RefreshTokenRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let invalid = || AppError::Unauthorized("Incorrect email or password".into());

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(invalid());
    }

    let user = match users.find_by_email(&normalize_email(&payload.email)).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid());
        }
    };

    if let Err(e) = verify_password(&payload.password, &user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }

    let body = issue_tokens(&user, tokens.get_ref(), &config).await?;

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(body))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    users: web::Data<dyn UserRepository>,
    tokens: web::Data<dyn RefreshTokenRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let rejected = || AppError::Unauthorized("Invalid refresh token".into());

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header)?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|_| rejected())?;
    if claims.token_type != TokenType::Refresh {
        return Err(rejected());
    }

    match tokens.find(&claims.jti).await? {
        Some(stored) if !stored.revoked && stored.user_id == claims.user_id => {}
        _ => return Err(rejected()),
    }

    // revoke old refresh token; losing this race means another refresh won
    if !tokens.revoke(&claims.jti).await? {
        return Err(rejected());
    }

    // role and email may have changed since the token was issued
    let user = users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(rejected)?;

    let body = issue_tokens(&user, tokens.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(body))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out (also returned for unknown tokens)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    tokens: web::Data<dyn RefreshTokenRepository>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let claims = match bearer_token(header)
        .ok()
        .and_then(|token| verify_token(token, &config.jwt_secret).ok())
    {
        Some(c) => c,
        None => return Ok(HttpResponse::NoContent().finish()),
    };

    // only refresh tokens can logout
    if claims.token_type == TokenType::Refresh {
        tokens.revoke(&claims.jti).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}
