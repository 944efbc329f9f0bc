use crate::{
    auth::{auth::AuthUser, password::hash_password},
    config::Config,
    error::AppError,
    model::{
        role::Role,
        user::{NewUser, User, UserFilter, UserResponse},
    },
    repository::UserRepository,
    utils::{
        upload::{AVATAR_FIELD, StoredFile, read_image, remove_stored, store_image},
        validation::{Validator, normalize_email},
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "budi@company.com", format = "email")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    #[schema(example = "Budi Santoso")]
    pub name: Option<String>,
    /// Only honored for admin callers
    pub role: Option<Role>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "budi@company.com", format = "email")]
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    /// Only honored for admin callers
    pub role: Option<Role>,
}

/// Multipart form accepted by the avatar upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct AvatarUpload {
    /// JPEG or PNG image, at most 5 MB
    #[schema(value_type = String, format = Binary)]
    pub avatar: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct AvatarUploadResponse {
    pub file: StoredFile,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    /// Public avatar URL
    #[schema(example = "http://localhost:3000/uploads/2026-01-01T08-30-00.000Zbudi.png")]
    pub file: Option<String>,
    /// Stored file path
    pub path: Option<String>,
}

/// Loads the user addressed by a `{user_id}` route segment.
pub async fn load_user(users: &dyn UserRepository, user_id: u64) -> Result<User, AppError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))
}

/// Non-admin callers cannot set roles; the field is dropped rather than rejected.
fn permitted_role(caller: &AuthUser, requested: Option<Role>) -> Option<Role> {
    if caller.is_admin() {
        return requested;
    }
    if requested.is_some() {
        debug!(user_id = caller.user_id, "Ignoring role change from non-admin caller");
    }
    None
}

/// List users
#[utoipa::path(
    get,
    path = "/v1/users",
    params(UserFilter),
    responses(
        (status = 200, description = "Users matching the filters", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    query: web::Query<UserFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let found = users.list(&query).await?;
    let body: Vec<UserResponse> = found.into_iter().map(UserResponse::from).collect();

    Ok(HttpResponse::Ok().json(body))
}

/// Create user
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already exists", body = Object, example = json!({
            "code": 409,
            "message": "\"email\" already exists"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let email = normalize_email(&payload.email);

    Validator::new()
        .email("email", &email)
        .password("password", &payload.password)
        .name("name", payload.name.as_deref())
        .finish()?;

    let user = users
        .insert(NewUser {
            email,
            password: hash_password(&payload.password)?,
            name: payload.name,
            role: payload.role.unwrap_or_default(),
        })
        .await?;

    info!(user_id = user.id, created_by = auth.user_id, "User created");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Get logged in user info
#[utoipa::path(
    get,
    path = "/v1/users/profile",
    responses(
        (status = 200, description = "The caller's own record", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn profile(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(users.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Get user
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let user = load_user(users.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Replace user
#[utoipa::path(
    put,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body = CreateUser,
    responses(
        (status = 200, description = "User replaced", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn replace_user(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    path: web::Path<u64>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let mut user = load_user(users.get_ref(), user_id).await?;
    let payload = payload.into_inner();
    let email = normalize_email(&payload.email);

    Validator::new()
        .email("email", &email)
        .password("password", &payload.password)
        .name("name", payload.name.as_deref())
        .finish()?;

    user.email = email;
    user.password = hash_password(&payload.password)?;
    user.name = payload.name;
    match permitted_role(&auth, payload.role) {
        Some(role) => user.role = role,
        // a replaced record falls back to the default role
        None if auth.is_admin() => user.role = Role::default(),
        None => {}
    }

    users.save(&user).await?;

    info!(user_id, updated_by = auth.user_id, "User replaced");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Update user
#[utoipa::path(
    patch,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let mut user = load_user(users.get_ref(), user_id).await?;
    let payload = payload.into_inner();
    let email = payload.email.as_deref().map(normalize_email);

    let mut validator = Validator::new().name("name", payload.name.as_deref());
    if let Some(email) = email.as_deref() {
        validator = validator.email("email", email);
    }
    if let Some(password) = payload.password.as_deref() {
        validator = validator.password("password", password);
    }
    validator.finish()?;

    if let Some(email) = email {
        user.email = email;
    }
    if let Some(password) = payload.password.as_deref() {
        user.password = hash_password(password)?;
    }
    if payload.name.is_some() {
        user.name = payload.name;
    }
    if let Some(role) = permitted_role(&auth, payload.role) {
        user.role = role;
    }

    users.save(&user).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    if !users.delete(user_id).await? {
        return Err(AppError::NotFound("User does not exist".into()));
    }

    info!(user_id, deleted_by = auth.user_id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Upload user's avatar
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/avatar",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body(content = AvatarUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar stored", body = AvatarUploadResponse),
        (status = 400, description = "Only JPEG and PNG images are allowed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist or file is empty", body = Object, example = json!({
            "code": 404,
            "message": "File is Empty"
        })),
        (status = 413, description = "File larger than 5 MB")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn upload_avatar(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let previous = load_user(users.get_ref(), user_id).await?.picture;

    let image = read_image(payload, AVATAR_FIELD, config.upload_max_bytes)
        .await?
        .ok_or_else(|| AppError::NotFound("File is Empty".into()))?;

    let file = store_image(&config.upload_dir, image).await?;
    let avatar_link = format!("{}/uploads/{}", config.public_base_url, file.filename);

    match users.set_avatar(user_id, &file.path, &avatar_link).await {
        Ok(true) => {}
        Ok(false) => {
            remove_stored(&file.path).await;
            return Err(AppError::NotFound("User does not exist".into()));
        }
        Err(e) => {
            remove_stored(&file.path).await;
            return Err(e);
        }
    }

    if let Some(previous) = previous.filter(|p| *p != file.path) {
        remove_stored(&previous).await;
    }

    info!(user_id, file = %file.filename, "Avatar uploaded");

    let user = load_user(users.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(AvatarUploadResponse {
        file,
        user: user.into(),
    }))
}

/// Get user's avatar
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/avatar",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Stored avatar link and path", body = AvatarResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn get_avatar(
    auth: AuthUser,
    users: web::Data<dyn UserRepository>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let user = load_user(users.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(AvatarResponse {
        file: user.avatar_link,
        path: user.picture,
    }))
}
