mod context;
mod core;
mod error;
mod handlers;
mod impls;
mod middlewares;
mod response;

use actix_web::middleware::Logger;
use actix_web::web::{get, post, put, resource, scope, Data};
use actix_web::HttpServer;
use impls::cache::local_file::LocalFileCache;
use impls::renderer::pdf::PdfRenderer;
use middlewares::jwt::{Jwt, JWT_SECRET};
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let database_url = dotenv::var("DATABASE_URL")?;
    let secret = dotenv::var(JWT_SECRET)?;
    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let cache_dir = dotenv::var("DRAFT_CACHE_PATH").unwrap_or_else(|_| ".".to_string());
    let pool = PgPoolOptions::new().max_connections(5).connect(&database_url).await?;
    log::info!("listening on {bind_addr}");
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(LocalFileCache::new(&cache_dir)))
            .app_data(Data::new(PdfRenderer))
            .service(resource("/analytics/{survey_id}").route(post().to(handlers::analytics::generate)))
            .service(resource("/export/pdf/{survey_id}").route(post().to(handlers::export::pdf)))
            .service(
                scope("/surveys")
                    .route("/{survey_id}", get().to(handlers::survey::detail))
                    .route("/{survey_id}/responses", post().to(handlers::response::submit))
                    .service(
                        scope("")
                            .wrap(Jwt::new(secret.as_bytes().to_vec()))
                            .route("", post().to(handlers::survey::save))
                            .route("", get().to(handlers::survey::list))
                            .route("/draft/recover", get().to(handlers::survey::recover_draft))
                            .route("/{survey_id}", put().to(handlers::survey::save_existing))
                            .route("/{survey_id}/publish", post().to(handlers::survey::publish)),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;
    Ok(())
}
