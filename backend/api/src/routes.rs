//! Route configuration.
//!
//! Every domain registers itself under `/api/v1`; literal paths are
//! registered before parameterized ones so they win dispatch.

use actix_web::web;

use crate::handlers;
use crate::middleware::{JwtAuthMiddleware, RequireRole};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::health::health_check))
        .route("/health", web::get().to(handlers::health::health_check))
        .route("/health/ready", web::get().to(handlers::health::readiness))
        .service(
            web::scope("/api/v1")
                .configure(routes::auth::configure)
                .configure(routes::songs::configure)
                .configure(routes::playlists::configure)
                .configure(routes::folders::configure)
                .configure(routes::favorites::configure)
                .configure(routes::comments::configure)
                .configure(routes::reports::configure)
                .configure(routes::artists::configure)
                .configure(routes::verification::configure)
                .configure(routes::subscriptions::configure)
                .configure(routes::uploads::configure)
                .configure(routes::admin::configure),
        );
}

mod routes {
    use super::*;

    pub mod auth {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route("/login", web::post().to(handlers::auth::login))
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .route("/me", web::get().to(handlers::auth::me))
                            .route("/profile", web::put().to(handlers::auth::update_profile))
                            .route(
                                "/password/request-code",
                                web::post().to(handlers::auth::request_password_code),
                            )
                            .route(
                                "/password/change",
                                web::post().to(handlers::auth::change_password),
                            ),
                    ),
            );
        }
    }

    pub mod songs {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/songs")
                    .service(
                        web::resource("/upload")
                            .wrap(RequireRole::admin())
                            .wrap(JwtAuthMiddleware)
                            .route(web::post().to(handlers::songs::upload_song)),
                    )
                    .route("", web::get().to(handlers::songs::list_songs))
                    .route(
                        "/{id}/play",
                        web::post().to(handlers::songs::register_play),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(handlers::songs::get_song))
                            .route(web::put().to(handlers::songs::update_song))
                            .route(web::delete().to(handlers::songs::delete_song)),
                    ),
            );
        }
    }

    pub mod playlists {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/playlists")
                    .wrap(JwtAuthMiddleware)
                    .route("", web::post().to(handlers::playlists::create_playlist))
                    .route("/me", web::get().to(handlers::playlists::my_playlists))
                    .route(
                        "/{id}/image",
                        web::put().to(handlers::playlists::set_playlist_image),
                    )
                    .route(
                        "/{id}/songs",
                        web::get().to(handlers::playlists::playlist_songs),
                    )
                    .service(
                        web::resource("/{playlist_id}/songs/{song_id}")
                            .route(web::post().to(handlers::playlists::add_song_to_playlist))
                            .route(
                                web::delete().to(handlers::playlists::remove_song_from_playlist),
                            ),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(handlers::playlists::update_playlist))
                            .route(web::delete().to(handlers::playlists::delete_playlist)),
                    ),
            );
        }
    }

    pub mod folders {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/folders")
                    .wrap(JwtAuthMiddleware)
                    .route("", web::post().to(handlers::folders::create_folder))
                    .route("/me", web::get().to(handlers::folders::my_folders))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(handlers::folders::update_folder))
                            .route(web::delete().to(handlers::folders::delete_folder)),
                    ),
            );
        }
    }

    pub mod favorites {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/favorites")
                    .wrap(JwtAuthMiddleware)
                    .route("/songs", web::get().to(handlers::favorites::favorite_songs))
                    .route(
                        "/{song_id}",
                        web::delete().to(handlers::favorites::remove_favorite),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::favorites::list_favorites))
                            .route(web::post().to(handlers::favorites::add_favorite)),
                    ),
            );
        }
    }

    pub mod comments {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/comments")
                    .service(
                        web::resource("/{id}/like")
                            .wrap(JwtAuthMiddleware)
                            .route(web::post().to(handlers::comments::like_comment))
                            .route(web::delete().to(handlers::comments::unlike_comment)),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::comments::delete_comment),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::comments::list_comments))
                            .route(web::post().to(handlers::comments::create_comment)),
                    ),
            );
        }
    }

    pub mod reports {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/reports")
                    .wrap(JwtAuthMiddleware)
                    .service(
                        web::resource("/group")
                            .wrap(RequireRole::admin())
                            .route(web::get().to(handlers::reports::grouped_reports)),
                    )
                    .service(
                        web::scope("/comment").wrap(RequireRole::admin()).route(
                            "/{comment_id}",
                            web::delete().to(handlers::reports::purge_reported_comment),
                        ),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::post().to(handlers::reports::create_report))
                            .route(web::delete().to(handlers::reports::delete_report)),
                    )
                    .service(
                        web::resource("")
                            .wrap(RequireRole::admin())
                            .route(web::get().to(handlers::reports::list_reports)),
                    ),
            );
        }
    }

    pub mod artists {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/artists")
                    .service(
                        web::scope("/me")
                            .wrap(RequireRole::artist())
                            .wrap(JwtAuthMiddleware)
                            .route("/profile", web::get().to(handlers::artists::my_profile))
                            .route(
                                "/profile",
                                web::put().to(handlers::artists::update_my_profile),
                            )
                            .route(
                                "/image/{type}",
                                web::post().to(handlers::artists::upload_image),
                            )
                            .route("/stats", web::get().to(handlers::artists::my_stats))
                            .service(
                                web::resource("/songs")
                                    .route(web::get().to(handlers::artists::my_songs))
                                    .route(web::post().to(handlers::artists::upload_my_song)),
                            )
                            .service(
                                web::resource("/songs/{id}")
                                    .route(web::put().to(handlers::artists::update_my_song))
                                    .route(web::delete().to(handlers::artists::delete_my_song)),
                            )
                            .service(
                                web::resource("/albums")
                                    .route(web::get().to(handlers::artists::my_albums))
                                    .route(web::post().to(handlers::artists::create_album)),
                            )
                            .service(
                                web::resource("/albums/{id}")
                                    .route(web::put().to(handlers::artists::update_album))
                                    .route(web::delete().to(handlers::artists::delete_album)),
                            ),
                    )
                    .service(
                        web::resource("/{id}/follow")
                            .wrap(JwtAuthMiddleware)
                            .route(web::post().to(handlers::artists::toggle_follow)),
                    )
                    .route(
                        "/{id}/songs",
                        web::get().to(handlers::artists::artist_songs),
                    )
                    .route(
                        "/{id}/albums",
                        web::get().to(handlers::artists::artist_albums),
                    )
                    .route("/{id}", web::get().to(handlers::artists::get_artist))
                    .route("", web::get().to(handlers::artists::list_artists)),
            );
        }
    }

    pub mod verification {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/artist-verification")
                    .service(
                        web::scope("/admin")
                            .wrap(RequireRole::admin())
                            .wrap(JwtAuthMiddleware)
                            .route(
                                "/requests",
                                web::get().to(handlers::verification::admin_list),
                            )
                            .route(
                                "/requests/{id}/approve",
                                web::post().to(handlers::verification::approve_request),
                            )
                            .route(
                                "/requests/{id}/reject",
                                web::post().to(handlers::verification::reject_request),
                            )
                            .route(
                                "/requests/{id}",
                                web::get().to(handlers::verification::admin_detail),
                            )
                            .route(
                                "/stats",
                                web::get().to(handlers::verification::admin_stats),
                            ),
                    )
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .route(
                                "/request",
                                web::post().to(handlers::verification::submit_request),
                            )
                            .route(
                                "/my-requests",
                                web::get().to(handlers::verification::my_requests),
                            ),
                    ),
            );
        }
    }

    pub mod subscriptions {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/subscription")
                    .route(
                        "/tiers",
                        web::get().to(handlers::subscriptions::list_tiers),
                    )
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .route(
                                "/me",
                                web::get().to(handlers::subscriptions::my_subscription),
                            )
                            .route(
                                "/upgrade",
                                web::post().to(handlers::subscriptions::upgrade),
                            ),
                    ),
            );
        }
    }

    pub mod uploads {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/upload")
                    .wrap(JwtAuthMiddleware)
                    .route("/song", web::post().to(handlers::uploads::upload_song))
                    .route("/avatar", web::post().to(handlers::uploads::upload_avatar)),
            );
        }
    }

    pub mod admin {
        use super::*;

        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/admin")
                    .route("/login", web::post().to(handlers::admin::login))
                    .service(
                        web::scope("/users")
                            .wrap(RequireRole::admin())
                            .wrap(JwtAuthMiddleware)
                            .route("", web::get().to(handlers::admin::list_users))
                            .route("/{id}", web::delete().to(handlers::admin::delete_user)),
                    ),
            );
        }
    }
}
