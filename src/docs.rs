use crate::api::leave_request::{DeleteAllResponse, SubmitLeave};
use crate::api::users::{
    AvatarResponse, AvatarUpload, AvatarUploadResponse, CreateUser, UpdateUser,
};
use crate::error::FieldError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use crate::model::user::{UserFilter, UserResponse};
use crate::models::{LoginReqDto, RegisterReq, TokenResponse};
use crate::utils::upload::StoredFile;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cuti API",
        version = "1.0.0",
        description = r#"
## Leave Request (Cuti) Service

Backend for employee leave requests ("cuti") with user accounts and avatars.

### 🔹 Key Features
- **Authentication**
  - Register, login, refresh token rotation and logout
- **User Management**
  - Admin CRUD over user accounts, self-service profile, avatar upload
- **Leave Requests**
  - Submit, review (accept/decline) and query leave requests

### 🔐 Security
Everything outside `/auth` requires a **JWT Bearer** access token.
Only **admin** accounts may list every user or answer leave requests.

### 📦 Response Format
- JSON bodies; errors carry `code`, `message` and optional field `errors`
- Avatars are served from `/uploads`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::profile,
        crate::api::users::get_user,
        crate::api::users::replace_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        crate::api::users::upload_avatar,
        crate::api::users::get_avatar,

        crate::api::leave_request::submit_leave,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::find_by_email,
        crate::api::leave_request::accept_leave,
        crate::api::leave_request::decline_leave,
        crate::api::leave_request::find_by_status,
        crate::api::leave_request::find_by_respondent,
        crate::api::leave_request::delete_all,
        crate::api::leave_request::drop_collection
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenResponse,
            Role,
            UserResponse,
            UserFilter,
            CreateUser,
            UpdateUser,
            AvatarUpload,
            AvatarUploadResponse,
            AvatarResponse,
            StoredFile,
            LeaveStatus,
            LeaveRequest,
            SubmitLeave,
            DeleteAllResponse,
            FieldError
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and token APIs"),
        (name = "User", description = "User management APIs"),
        (name = "Cuti", description = "Leave request APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
