use std::{io, path::PathBuf};

use actix_web::{get, middleware::Logger, post, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use hmmtagger::{HmmModel, Model};
use serde::{Deserialize, Serialize};

/// Serve a tagging model over HTTP
#[derive(Debug, Parser)]
struct Argv {
    /// read a model from a file (MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: PathBuf,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    words: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("health")
}

#[post("/predict")]
async fn predict(model: web::Data<HmmModel>, req: web::Json<PredictRequest>) -> impl Responder {
    match model.tagger().and_then(|tagger| tagger.tag(&req.words)) {
        Ok(tags) => HttpResponse::Ok().json(PredictResponse { tags }),
        Err(e) => {
            log::warn!("predict failed: {e}");
            HttpResponse::BadRequest().json(ErrorResponse { error: e.to_string() })
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let argv = Argv::parse();
    let model = HmmModel::from_path(&argv.model)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    log::info!(
        "loaded {} ({} labels, {} words)",
        argv.model.display(),
        model.num_labels(),
        model.num_words()
    );
    let model = web::Data::new(model);
    HttpServer::new(move || {
        App::new()
            .app_data(model.clone())
            .wrap(Logger::default())
            .service(health)
            .service(predict)
    })
    .bind((argv.host.as_str(), argv.port))?
    .run()
    .await
}
