use actix_web::{
    body::BoxBody,
    error, get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer,
};
use blackjack_sim::prelude::*;
use env_logger::Env;
use log::{error, info};
use serde::Serialize;

/// Upper bound on the games a single request may ask for per policy and mode.
const MAX_ITERATIONS: u64 = 1_000_000;

/// Settings shared by every handler.
#[derive(Debug, Clone, Copy)]
struct ApiSettings {
    max_iterations: u64,
}

/// An enum that will handle user facing errors
#[derive(Debug)]
enum UserError {
    InternalError,
    BadInput(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occurred"),
            UserError::BadInput(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// A struct describing one policy, serialized into the response of `GET /policies`.
#[derive(Serialize)]
struct PolicyJson {
    number: usize,
    name: &'static str,
    description: &'static str,
}

impl From<PlayerPolicy> for PolicyJson {
    fn from(policy: PlayerPolicy) -> Self {
        PolicyJson {
            number: policy.number(),
            name: policy.name(),
            description: policy.description(),
        }
    }
}

/// Helper function that rejects configurations the server will not run.
fn validate(config: &BlackjackSimulatorConfig, settings: &ApiSettings) -> Result<(), UserError> {
    match config.iterations {
        0 => Err(UserError::BadInput(String::from(
            "iterations must be greater than zero",
        ))),
        n if n > settings.max_iterations => Err(UserError::BadInput(format!(
            "iterations must be at most {}",
            settings.max_iterations
        ))),
        _ => Ok(()),
    }
}

/// A handler listing every policy the simulator knows about.
#[get("/policies")]
async fn list_policies() -> Result<HttpResponse, UserError> {
    let policies: Vec<PolicyJson> = PlayerPolicy::ALL.into_iter().map(PolicyJson::from).collect();
    let body = serde_json::to_string(&policies).map_err(|_| UserError::InternalError)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// A handler that runs the requested simulations and responds with the JSON `Report`.
/// Omitted modes or policies mean all of them.
#[post("/simulate")]
async fn simulate(
    request: web::Json<SimulationRequest>,
    settings: web::Data<ApiSettings>,
) -> Result<HttpResponse, UserError> {
    let simulator = request.into_inner().simulator(true);
    validate(&simulator.config, &settings)?;
    info!(
        "simulating {} pair(s) of {} games, seed {}",
        simulator.simulations().len(),
        simulator.config.iterations,
        simulator.config.seed
    );

    let report = web::block(move || simulator.report())
        .await
        .map_err(|e| {
            error!("simulation task failed: {}", e);
            UserError::InternalError
        })?
        .map_err(|e| {
            error!("simulation failed: {}", e);
            UserError::InternalError
        })?;

    let body = serde_json::to_string(&report).map_err(|_| UserError::InternalError)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let address = "127.0.0.1";
    let port = 8080;
    info!("listening at {}:{}", address, port);

    let settings = web::Data::new(ApiSettings {
        max_iterations: MAX_ITERATIONS,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .service(list_policies)
            .service(simulate)
    })
    .bind((address, port))?
    .run()
    .await
}
