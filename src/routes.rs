use crate::{
    api::{approval, attendance_request, project, user},
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
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
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
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/projects")
                    // /projects
                    .service(
                        web::resource("")
                            .route(web::post().to(project::create_project))
                            .route(web::get().to(project::list_projects)),
                    )
                    // /projects/{id}/owners/{user_id}
                    .service(
                        web::resource("/{id}/owners/{user_id}")
                            .route(web::delete().to(project::remove_project_owner)),
                    )
                    // /projects/{id}/owners
                    .service(
                        web::resource("/{id}/owners")
                            .route(web::post().to(project::assign_owner))
                            .route(web::get().to(project::list_project_owners)),
                    )
                    // /projects/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(project::get_project))
                            .route(web::put().to(project::update_project))
                            .route(web::delete().to(project::deactivate_project)),
                    ),
            )
            .service(
                web::scope("/attendance-requests")
                    // /attendance-requests
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance_request::create_request))
                            .route(web::get().to(attendance_request::list_requests)),
                    )
                    // /attendance-requests/pending
                    .service(
                        web::resource("/pending")
                            .route(web::get().to(attendance_request::pending_requests)),
                    )
                    // /attendance-requests/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance_request::get_request)),
                    ),
            )
            .service(
                web::scope("/attendance-approvals")
                    // /attendance-approvals
                    .service(
                        web::resource("")
                            .route(web::post().to(approval::record_decision))
                            .route(web::get().to(approval::approval_history)),
                    )
                    // /attendance-approvals/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(approval::update_approval))
                            .route(web::delete().to(approval::delete_approval)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::get().to(user::list_users)))
                    // /users/{id}
                    .service(web::resource("/{id}").route(web::get().to(user::get_user))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
