mod check;
mod config;
mod inference;
mod llm;
mod routes;
#[cfg(test)]
mod testing;
mod triage;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use check::CheckPipeline;
use check::intake::IntakeLimits;
use config::Settings;
use inference::LocalInferenceClient;
use llm::{CredentialSource, EnvCredential, LlmGateway, OpenAiChatClient};
use routes::{ServiceInfo, configure_routes};
use std::io;
use std::sync::Arc;

fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // reqwest's blocking client must be built outside the async runtime
    let chat_client = OpenAiChatClient::new(&settings.llm).map_err(|e| {
        log::error!("Failed to build LLM client: {}", e);
        io::Error::other(e)
    })?;

    actix_web::rt::System::new().block_on(serve(settings, chat_client))
}

async fn serve(settings: Settings, chat_client: OpenAiChatClient) -> io::Result<()> {
    let local_inference = LocalInferenceClient::new(
        &settings.local_inference.url,
        settings.local_inference.timeout,
    )
    .map_err(|e| {
        log::error!("Failed to build local inference client: {}", e);
        io::Error::other(e)
    })?;

    log::info!("Local inference backend: {}", local_inference.predict_url());
    log::info!(
        "LLM backend: {} (model {}, {} workers, key from ${})",
        settings.llm.base_url,
        chat_client.model(),
        settings.llm.workers,
        settings.llm.api_key_var
    );
    let credential = EnvCredential::new(settings.llm.api_key_var.clone());
    if credential.resolve().is_none() {
        log::warn!(
            "{} is not set; /check will fail until it is",
            credential.name()
        );
    }

    let llm = LlmGateway::new(
        Arc::new(chat_client),
        Arc::new(credential),
        settings.llm.workers,
    );
    let pipeline = web::Data::new(CheckPipeline::new(local_inference, llm));
    let limits = web::Data::new(IntakeLimits {
        max_upload_bytes: settings.server.max_upload_bytes,
    });
    let service_info = web::Data::new(ServiceInfo::now());

    let bind_address = settings.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(pipeline.clone())
            .app_data(limits.clone())
            .app_data(service_info.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
