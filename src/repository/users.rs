use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::UserRepository;
use crate::{
    error::AppError,
    model::{
        role::Role,
        user::{NewUser, User, UserFilter},
    },
};

const USER_COLUMNS: &str =
    "id, email, password, name, role, picture, avatar_link, created_at";

#[derive(FromRow)]
struct UserRow {
    id: u64, // BIGINT UNSIGNED
    email: String,
    password: String,
    name: Option<String>,
    role: String,
    picture: Option<String>,
    avatar_link: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(|_| {
            AppError::Internal(format!("user {} has unknown role {:?}", row.id, row.role))
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            password: row.password,
            name: row.name,
            role,
            picture: row.picture,
            avatar_link: row.avatar_link,
            created_at: row.created_at,
        })
    }
}

pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password, name, role)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.role.to_string())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {id} vanished after insert")))
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, password = ?, name = ?, role = ?, picture = ?, avatar_link = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(&user.picture)
        .bind(&user.avatar_link)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        // ---------- build WHERE clause dynamically ----------
        let mut conditions = Vec::new();
        let mut bindings: Vec<String> = Vec::new();

        if let Some(name) = filter.name.as_deref() {
            conditions.push("name = ?");
            bindings.push(name.to_string());
        }

        if let Some(email) = filter.email.as_deref() {
            conditions.push("email = ?");
            bindings.push(email.to_string());
        }

        if let Some(role) = filter.role {
            conditions.push("role = ?");
            bindings.push(role.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {where_clause} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %sql, bindings = ?bindings, "Listing users");

        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for b in bindings {
            query = query.bind(b);
        }

        query
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_avatar(
        &self,
        id: u64,
        picture: &str,
        avatar_link: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET picture = ?, avatar_link = ? WHERE id = ?")
            .bind(picture)
            .bind(avatar_link)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
