use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::role::Role;

/// A stored account. `password` always holds an argon2 hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role: Role,
    /// Local path of the stored avatar file
    pub picture: Option<String>,
    /// Public URL of the avatar
    pub avatar_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Public projection of a user; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Budi Santoso",
    "email": "budi@company.com",
    "role": "user",
    "picture": "public/uploads/images/2026-01-01T00:00:00.000Zbudi.png",
    "avatar_link": "http://localhost:3000/uploads/2026-01-01T00:00:00.000Zbudi.png",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct UserResponse {
    pub id: u64,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub picture: Option<String>,
    pub avatar_link: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            picture: user.picture.clone(),
            avatar_link: user.avatar_link.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            picture: user.picture,
            avatar_link: user.avatar_link,
            created_at: user.created_at,
        }
    }
}

/// Equality filters and paging accepted by the user listing.
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 30)]
    /// Items per page
    pub per_page: Option<u64>,
    /// Filter by exact name
    pub name: Option<String>,
    /// Filter by exact email
    pub email: Option<String>,
    /// Filter by role
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(30).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        let filter = UserFilter::default();
        assert_eq!((filter.page(), filter.per_page(), filter.offset()), (1, 30, 0));

        let filter = UserFilter {
            page: Some(3),
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(filter.per_page(), 100);
        assert_eq!(filter.offset(), 200);
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let filter = UserFilter {
            page: Some(u64::MAX),
            per_page: Some(100),
            ..Default::default()
        };
        assert_eq!(filter.offset(), u64::MAX);
    }
}
