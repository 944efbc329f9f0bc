//! In-memory repositories backing the handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{LeaveRepository, RefreshTokenRepository, StoredRefreshToken, UserRepository};
use crate::{
    error::AppError,
    model::{
        leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
        user::{NewUser, User, UserFilter},
    },
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::duplicate_email());
        }

        let stored = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            email: user.email,
            password: user.password,
            name: user.name,
            role: user.role,
            picture: None,
            avatar_link: None,
            created_at: Utc::now(),
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::duplicate_email());
        }

        if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
            *slot = user.clone();
        }
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .rev()
            .filter(|u| filter.name.is_none() || u.name == filter.name)
            .filter(|u| filter.email.as_deref().is_none_or(|e| u.email == e))
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .skip(filter.offset() as usize)
            .take(filter.per_page() as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn set_avatar(
        &self,
        id: u64,
        picture: &str,
        avatar_link: &str,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.picture = Some(picture.to_string());
                user.avatar_link = Some(avatar_link.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryLeaveRepository {
    leaves: Mutex<Vec<LeaveRequest>>,
    next_id: Mutex<u64>,
}

impl MemoryLeaveRepository {
    fn matching(&self, keep: impl Fn(&LeaveRequest) -> bool) -> Vec<LeaveRequest> {
        self.leaves
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|l| keep(l))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LeaveRepository for MemoryLeaveRepository {
    async fn insert(&self, leave: NewLeaveRequest) -> Result<LeaveRequest, AppError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let stored = LeaveRequest {
            id: *next_id,
            email: leave.email,
            name: leave.name,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason,
            status: LeaveStatus::Submitted,
            responded_by: None,
            responded_at: None,
            created_at: Utc::now(),
        };
        self.leaves.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        Ok(self.matching(|l| l.id == id).into_iter().next())
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.matching(|_| true))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.matching(|l| l.email == email))
    }

    async fn find_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.matching(|l| l.status == status))
    }

    async fn find_by_responder(&self, responder: &str) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.matching(|l| l.responded_by.as_deref() == Some(responder)))
    }

    async fn respond(
        &self,
        id: u64,
        status: LeaveStatus,
        responder: &str,
    ) -> Result<bool, AppError> {
        let mut leaves = self.leaves.lock().unwrap();
        match leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Submitted)
        {
            Some(leave) => {
                leave.status = status;
                leave.responded_by = Some(responder.to_string());
                leave.responded_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut leaves = self.leaves.lock().unwrap();
        let removed = leaves.len() as u64;
        leaves.clear();
        Ok(removed)
    }

    async fn drop_all(&self) -> Result<(), AppError> {
        self.leaves.lock().unwrap().clear();
        *self.next_id.lock().unwrap() = 0;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenRepository {
    tokens: Mutex<Vec<StoredRefreshToken>>,
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn store(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.tokens.lock().unwrap().push(StoredRefreshToken {
            user_id,
            jti: jti.to_string(),
            expires_at,
            revoked: false,
        });
        Ok(())
    }

    async fn find(&self, jti: &str) -> Result<Option<StoredRefreshToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.jti == jti)
            .cloned())
    }

    async fn revoke(&self, jti: &str) -> Result<bool, AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.jti == jti && !t.revoked) {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
