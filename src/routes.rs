use crate::{
    api::{attendance, branch},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let ingest_limiter = Arc::new(build_limiter(config.rate_ingest_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Terminal ingestion, guarded by the optional terminal key instead of a user token
    cfg.service(
        web::resource(format!("{}/attendance", config.api_prefix))
            .wrap(ingest_limiter)
            .route(web::post().to(attendance::record_attendance)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::me)
            .service(
                web::scope("/branches")
                    // /branches
                    .service(web::resource("").route(web::get().to(branch::list_branches)))
                    // /branches/{id}
                    .service(web::resource("/{id}").route(web::get().to(branch::get_branch)))
                    // /branches/{id}/export/{format}
                    .service(
                        web::resource("/{id}/export/{format}")
                            .route(web::get().to(branch::export_branch)),
                    ),
            ),
    );
}

// LOGIN
//  └─ access_token (15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token

// TERMINAL
//  └─ POST /api/attendance  (X-Terminal-Key when configured)
