use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use backend::detection::HttpDetectionClient;
use backend::{Config, UploadOrchestrator, configure_routes};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    match &config.backend_url {
        Some(url) => log::info!("Detection services at {}", url),
        None => log::warn!(
            "BACKEND_URL is not set. Uploads will fail until it points at the detection services."
        ),
    }
    if config.backend_api_key.is_none() {
        log::info!("BACKEND_API_KEY not set, outbound calls are unauthenticated");
    }
    log::info!(
        "Backend calls time out after {}s",
        config.upload_timeout.as_secs()
    );

    let bind_address = config.bind_address();
    let orchestrator = web::Data::new(UploadOrchestrator::new(
        config,
        Arc::new(HttpDetectionClient::new()),
    ));

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(orchestrator.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
