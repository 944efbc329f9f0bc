//! Persistence seam.
//!
//! Handlers only see these traits (shared as `web::Data<dyn Trait>`), so the
//! MySQL implementations can be swapped for the in-memory ones under test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    model::{
        leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
        user::{NewUser, User, UserFilter},
    },
};

pub mod leave_requests;
#[cfg(test)]
pub mod memory;
pub mod refresh_tokens;
pub mod users;

pub use leave_requests::MySqlLeaveRepository;
pub use refresh_tokens::MySqlRefreshTokenRepository;
pub use users::MySqlUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Fails with a conflict when the email is already registered.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;
    /// Writes every mutable column of `user` back to the store.
    async fn save(&self, user: &User) -> Result<(), AppError>;
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError>;
    /// Returns false when no user had this id.
    async fn delete(&self, id: u64) -> Result<bool, AppError>;
    async fn set_avatar(&self, id: u64, picture: &str, avatar_link: &str)
    -> Result<bool, AppError>;
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn insert(&self, leave: NewLeaveRequest) -> Result<LeaveRequest, AppError>;
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, AppError>;
    async fn list_all(&self) -> Result<Vec<LeaveRequest>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Vec<LeaveRequest>, AppError>;
    async fn find_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, AppError>;
    async fn find_by_responder(&self, responder: &str) -> Result<Vec<LeaveRequest>, AppError>;
    /// Moves a `submitted` request to `status`, recording who responded.
    /// Returns false when the request is missing or was already processed.
    async fn respond(
        &self,
        id: u64,
        status: LeaveStatus,
        responder: &str,
    ) -> Result<bool, AppError>;
    async fn delete_all(&self) -> Result<u64, AppError>;
    /// Removes every record and resets id allocation.
    async fn drop_all(&self) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub user_id: u64,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn store(&self, user_id: u64, jti: &str, expires_at: DateTime<Utc>)
    -> Result<(), AppError>;
    async fn find(&self, jti: &str) -> Result<Option<StoredRefreshToken>, AppError>;
    /// Idempotent; returns true only if the token was active.
    async fn revoke(&self, jti: &str) -> Result<bool, AppError>;
}
