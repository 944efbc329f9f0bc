use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::AppError,
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The caller behind a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Authorization header must start with Bearer".into())
    })
}

/// Verifies an access token. Refresh tokens are not accepted here.
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthUser, AppError> {
    let token = bearer_token(header)?;

    let claims = verify_token(token, secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {e}")))?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    Ok(claims.into())
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".into()))),
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(authenticate(header, &config.jwt_secret))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    /// Logged-in users may only act on their own record; admins on any.
    pub fn require_self_or_admin(&self, user_id: u64) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 2,
            email: "budi@company.com".into(),
            role,
        }
    }

    #[test]
    fn ownership_rule() {
        assert!(user(Role::User).require_self_or_admin(2).is_ok());
        assert!(user(Role::User).require_self_or_admin(3).is_err());
        assert!(user(Role::Admin).require_self_or_admin(3).is_ok());
        assert!(user(Role::User).require_admin().is_err());
    }

    #[test]
    fn authenticate_accepts_access_tokens_only() {
        let access = generate_access_token(2, "budi@company.com", Role::User, "k", 60).unwrap();
        let (refresh, _) = generate_refresh_token(2, "budi@company.com", Role::User, "k", 60).unwrap();

        let header = format!("Bearer {access}");
        let caller = authenticate(Some(&header), "k").unwrap();
        assert_eq!(caller.user_id, 2);
        assert_eq!(caller.email, "budi@company.com");

        let header = format!("Bearer {refresh}");
        assert!(matches!(
            authenticate(Some(&header), "k"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn authenticate_requires_bearer_scheme() {
        assert!(authenticate(None, "k").is_err());
        assert!(authenticate(Some("Basic Zm9vOmJhcg=="), "k").is_err());
    }
}
