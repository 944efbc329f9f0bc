use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::LeaveRepository;
use crate::{
    error::AppError,
    model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
};

const LEAVE_COLUMNS: &str = "id, email, name, start_date, end_date, reason, status, responded_by, responded_at, created_at";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    email: String,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    responded_by: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            AppError::Internal(format!(
                "leave request {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            email: row.email,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status,
            responded_by: row.responded_by,
            responded_at: row.responded_at,
            created_at: row.created_at,
        })
    }
}

fn into_leaves(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>, AppError> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

pub struct MySqlLeaveRepository {
    pool: MySqlPool,
}

impl MySqlLeaveRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, column: &str, value: &str) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE {column} = ? ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        into_leaves(rows)
    }
}

#[async_trait]
impl LeaveRepository for MySqlLeaveRepository {
    async fn insert(&self, leave: NewLeaveRequest) -> Result<LeaveRequest, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (email, name, start_date, end_date, reason, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&leave.email)
        .bind(&leave.name)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(LeaveStatus::Submitted.to_string())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Internal(format!("leave request {id} vanished after insert"))
        })
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        into_leaves(rows)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<LeaveRequest>, AppError> {
        self.fetch_where("email", email).await
    }

    async fn find_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, AppError> {
        self.fetch_where("status", &status.to_string()).await
    }

    async fn find_by_responder(&self, responder: &str) -> Result<Vec<LeaveRequest>, AppError> {
        self.fetch_where("responded_by", responder).await
    }

    async fn respond(
        &self,
        id: u64,
        status: LeaveStatus,
        responder: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, responded_by = ?, responded_at = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(status.to_string())
        .bind(responder)
        .bind(Utc::now())
        .bind(id)
        .bind(LeaveStatus::Submitted.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM leave_requests")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn drop_all(&self) -> Result<(), AppError> {
        sqlx::query("TRUNCATE TABLE leave_requests")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
