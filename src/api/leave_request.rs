use std::str::FromStr;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    repository::LeaveRepository,
    utils::validation::{Validator, normalize_email},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SubmitLeave {
    /// Requester email; defaults to the caller, only admins may name someone else
    #[schema(example = "budi@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DeleteAllResponse {
    #[schema(example = "Leave requests deleted")]
    pub message: String,
    #[schema(example = 12)]
    pub deleted: u64,
}

fn leave_not_found() -> AppError {
    AppError::NotFound("Leave request not found".into())
}

/* =========================
Submit leave request
========================= */
/// Submit a leave request
#[utoipa::path(
    post,
    path = "/cuti",
    request_body(
        content = SubmitLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn submit_leave(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    payload: web::Json<SubmitLeave>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();

    let email = match payload.email.as_deref().map(normalize_email) {
        Some(email) if email != auth.email => {
            auth.require_admin()?;
            email
        }
        _ => auth.email.clone(),
    };

    Validator::new()
        .email("email", &email)
        .not_blank("name", &payload.name)
        .not_blank("reason", &payload.reason)
        .check(
            payload.start_date <= payload.end_date,
            "end_date",
            "\"end_date\" must not be before \"start_date\"",
        )
        .finish()?;

    let leave = leaves
        .insert(NewLeaveRequest {
            email,
            name: payload.name.trim().to_string(),
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        })
        .await?;

    info!(leave_id = leave.id, email = %leave.email, "Leave request submitted");
    Ok(HttpResponse::Created().json(leave))
}

/// List every leave request
#[utoipa::path(
    get,
    path = "/cuti",
    responses(
        (status = 200, description = "All leave requests, newest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn list_leaves(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(leaves.list_all().await?))
}

/// Get one leave request
#[utoipa::path(
    get,
    path = "/cuti/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found, or not the caller's", body = Object, example = json!({
            "code": 404,
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn get_leave(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    // someone else's request looks the same as a missing one
    let leave = leaves
        .find_by_id(leave_id)
        .await?
        .filter(|leave| auth.is_admin() || leave.email == auth.email)
        .ok_or_else(leave_not_found)?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Find leave requests by requester email
#[utoipa::path(
    get,
    path = "/cuti/email/{email}",
    params(
        ("email" = String, Path, description = "Requester email")
    ),
    responses(
        (status = 200, description = "Leave requests of that requester", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Users may only look up their own email")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn find_by_email(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let email = normalize_email(&path.into_inner());
    if email != auth.email {
        auth.require_admin()?;
    }

    Ok(HttpResponse::Ok().json(leaves.find_by_email(&email).await?))
}

/// Shared accept/decline flow. Only `submitted` requests can be answered.
async fn respond(
    auth: &AuthUser,
    leaves: &dyn LeaveRepository,
    leave_id: u64,
    status: LeaveStatus,
) -> Result<LeaveRequest, AppError> {
    auth.require_admin()?;

    let current = leaves.find_by_id(leave_id).await?.ok_or_else(leave_not_found)?;
    if current.status != LeaveStatus::Submitted {
        return Err(AppError::Conflict(format!(
            "Leave request already {}",
            current.status
        )));
    }

    // the conditional update loses if another admin answered in between
    if !leaves.respond(leave_id, status, &auth.email).await? {
        return Err(AppError::Conflict("Leave request already processed".into()));
    }

    info!(leave_id, %status, responded_by = %auth.email, "Leave request answered");

    leaves.find_by_id(leave_id).await?.ok_or_else(leave_not_found)
}

/* =========================
Accept leave (Admin)
========================= */
/// Accept a submitted leave request
#[utoipa::path(
    put,
    path = "/cuti/{leave_id}/accept",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to accept")
    ),
    responses(
        (status = 200, description = "Leave accepted", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "code": 409,
            "message": "Leave request already declined"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn accept_leave(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = respond(&auth, leaves.get_ref(), path.into_inner(), LeaveStatus::Accepted).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Decline leave (Admin)
========================= */
/// Decline a submitted leave request
#[utoipa::path(
    put,
    path = "/cuti/{leave_id}/decline",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decline")
    ),
    responses(
        (status = 200, description = "Leave declined", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn decline_leave(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = respond(&auth, leaves.get_ref(), path.into_inner(), LeaveStatus::Declined).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Find leave requests by status
#[utoipa::path(
    get,
    path = "/cuti/status/{status}",
    params(
        ("status" = LeaveStatus, Path, description = "submitted, accepted or declined")
    ),
    responses(
        (status = 200, description = "Leave requests with that status", body = [LeaveRequest]),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn find_by_status(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let raw = path.into_inner();
    let status = LeaveStatus::from_str(&raw.to_lowercase()).map_err(|_| {
        AppError::BadRequest(format!(
            "Unknown status {raw:?}; expected submitted, accepted or declined"
        ))
    })?;

    Ok(HttpResponse::Ok().json(leaves.find_by_status(status).await?))
}

/// Find leave requests answered by a given admin
#[utoipa::path(
    get,
    path = "/cuti/respondent/{respondent}",
    params(
        ("respondent" = String, Path, description = "Email of the admin who answered")
    ),
    responses(
        (status = 200, description = "Leave requests answered by that admin", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn find_by_respondent(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let respondent = normalize_email(&path.into_inner());
    Ok(HttpResponse::Ok().json(leaves.find_by_responder(&respondent).await?))
}

/// Delete every leave request
#[utoipa::path(
    delete,
    path = "/cuti",
    responses(
        (status = 200, description = "Leave requests deleted", body = DeleteAllResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn delete_all(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let deleted = leaves.delete_all().await?;
    info!(deleted, by = %auth.email, "Deleted all leave requests");

    Ok(HttpResponse::Ok().json(DeleteAllResponse {
        message: "Leave requests deleted".into(),
        deleted,
    }))
}

/// Drop the leave request collection
#[utoipa::path(
    delete,
    path = "/cuti/collection",
    responses(
        (status = 200, description = "Collection dropped", body = Object, example = json!({
            "message": "Leave request collection dropped"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cuti"
)]
pub async fn drop_collection(
    auth: AuthUser,
    leaves: web::Data<dyn LeaveRepository>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    leaves.drop_all().await?;
    info!(by = %auth.email, "Dropped leave request collection");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request collection dropped"
    })))
}
