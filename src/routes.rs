use crate::{
    api::{leave_request, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter.clone()) // rate limiting
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    // must precede /users/{user_id}
                    .service(web::resource("/profile").route(web::get().to(users::profile)))
                    // /users/{user_id}
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::replace_user))
                            .route(web::patch().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    )
                    // /users/{user_id}/avatar
                    .service(
                        web::resource("/{user_id}/avatar")
                            .route(web::post().to(users::upload_avatar))
                            .route(web::get().to(users::get_avatar)),
                    ),
            ),
    );

    cfg.service(
        web::scope(&config.cuti_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            // /cuti
            .service(
                web::resource("")
                    .route(web::post().to(leave_request::submit_leave))
                    .route(web::get().to(leave_request::list_leaves))
                    .route(web::delete().to(leave_request::delete_all)),
            )
            // literal segments before /cuti/{id}
            .service(
                web::resource("/collection")
                    .route(web::delete().to(leave_request::drop_collection)),
            )
            .service(
                web::resource("/email/{email}").route(web::get().to(leave_request::find_by_email)),
            )
            .service(
                web::resource("/status/{status}")
                    .route(web::get().to(leave_request::find_by_status)),
            )
            .service(
                web::resource("/respondent/{respondent}")
                    .route(web::get().to(leave_request::find_by_respondent)),
            )
            // /cuti/{id}
            .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
            // /cuti/{id}/accept
            .service(
                web::resource("/{id}/accept").route(web::put().to(leave_request::accept_leave)),
            )
            // /cuti/{id}/decline
            .service(
                web::resource("/{id}/decline").route(web::put().to(leave_request::decline_leave)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token
