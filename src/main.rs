use actix_web::{middleware::Logger, web, App, HttpServer};

use chiron_server::{
    app_state::AppState,
    config::Config,
    handlers::{configure, cors, cors_headers},
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if let Err(err) = config.validate() {
        log::error!("Invalid configuration: {}", err);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, err));
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    log::info!(
        "Completion models: {}",
        config.model_candidates().join(", ")
    );

    let state = web::Data::new(AppState::new(config));

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(cors_headers())
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
