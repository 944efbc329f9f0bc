//! Shared fixtures for handler tests: the real route table over in-memory
//! repositories.

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use actix_web::{
    App,
    body::{BoxBody, MessageBody},
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    test,
    web::Data,
};
use serde::de::DeserializeOwned;

use crate::{
    auth::{jwt::generate_access_token, password::hash_password},
    config::Config,
    model::{
        role::Role,
        user::{NewUser, User},
    },
    repository::{
        LeaveRepository, RefreshTokenRepository, UserRepository,
        memory::{MemoryLeaveRepository, MemoryRefreshTokenRepository, MemoryUserRepository},
    },
    routes,
};

pub const TEST_PASSWORD: &str = "secret123";

pub struct TestApp {
    pub config: Config,
    pub users: Arc<MemoryUserRepository>,
    pub leaves: Arc<MemoryLeaveRepository>,
    pub tokens: Arc<MemoryRefreshTokenRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = std::env::temp_dir().join(format!("cuti-api-test-{}", uuid::Uuid::new_v4()));

        Self {
            config: Config {
                database_url: String::new(),
                jwt_secret: "test-secret".into(),
                server_addr: "127.0.0.1:0".into(),
                access_token_ttl: 900,
                refresh_token_ttl: 604_800,
                rate_login_per_min: 10_000,
                rate_register_per_min: 10_000,
                rate_refresh_per_min: 10_000,
                rate_protected_per_min: 10_000,
                api_prefix: "/v1".into(),
                cuti_prefix: "/cuti".into(),
                upload_dir: upload_dir.to_string_lossy().into_owned(),
                upload_max_bytes: 5 * 1024 * 1024,
                public_base_url: "http://localhost:3000".into(),
                log_dir: "logs".into(),
                log_level: tracing::Level::DEBUG,
            },
            users: Arc::default(),
            leaves: Arc::default(),
            tokens: Arc::default(),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<BoxBody>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let users: Arc<dyn UserRepository> = self.users.clone();
        let leaves: Arc<dyn LeaveRepository> = self.leaves.clone();
        let tokens: Arc<dyn RefreshTokenRepository> = self.tokens.clone();
        let config = self.config.clone();

        App::new()
            .app_data(Data::new(self.config.clone()))
            .app_data(Data::from(users))
            .app_data(Data::from(leaves))
            .app_data(Data::from(tokens))
            .configure(move |cfg| routes::configure(cfg, config))
    }

    /// Inserts a user whose password is [`TEST_PASSWORD`].
    pub async fn seed_user(&self, email: &str, role: Role) -> User {
        self.users
            .insert(NewUser {
                email: email.to_string(),
                password: hash_password(TEST_PASSWORD).unwrap(),
                name: None,
                role,
            })
            .await
            .unwrap()
    }

    /// `Authorization` header value carrying an access token for `user`.
    pub fn bearer(&self, user: &User) -> String {
        let token = generate_access_token(
            user.id,
            &user.email,
            user.role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
        .unwrap();
        format!("Bearer {token}")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.config.upload_dir).ok();
    }
}

/// The rate limiter keys on the peer address, which test requests lack by default.
pub fn request(req: test::TestRequest) -> test::TestRequest {
    req.peer_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, 40_000)))
}

pub async fn read_json<T, B>(resp: ServiceResponse<B>) -> T
where
    T: DeserializeOwned,
    B: MessageBody,
{
    test::read_body_json(resp).await
}

/// Builds a single-part multipart body; returns the `Content-Type` header and the bytes.
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "----cuti-api-test-boundary";

    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}
