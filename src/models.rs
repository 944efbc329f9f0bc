use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{role::Role, user::UserResponse};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "budi@company.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    #[schema(example = "Budi Santoso")]
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "budi@company.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// access token lifetime in seconds
    #[schema(example = 900)]
    pub expires_in: usize,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// user email
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
