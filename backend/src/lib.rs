use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub mod compose;
pub mod config;
pub mod delivery;
pub mod error;
pub mod event;
pub mod mailer;

pub use compose::{compose, compose_all, Notification};
pub use config::{Config, ConfigError, MailSettings};
pub use delivery::{deliver_all, DeliveryFailure, DeliveryReport};
pub use error::ApiError;
pub use event::{ExchangeEvent, GiftPrice, Member};
pub use mailer::{DeliveryError, Mailer, SmtpMailer};

#[derive(Clone, Default)]
pub struct AppState {
    mail: Option<MailHandle>,
}

#[derive(Clone)]
struct MailHandle {
    sender: String,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Builds the SMTP transport when mail settings are present. Without them
    /// the server still starts, but every draw request is refused.
    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        match &config.mail {
            Some(settings) => {
                let mailer = SmtpMailer::new(settings)?;
                info!(host = %settings.host, port = settings.port, "smtp relay configured");
                Ok(Self::with_mailer(settings.address.clone(), Arc::new(mailer)))
            }
            None => {
                warn!("MAIL_ADDRESS / MAIL_PASSWORD not set; draws cannot be sent");
                Ok(Self::default())
            }
        }
    }

    pub fn with_mailer(sender: impl Into<String>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mail: Some(MailHandle {
                sender: sender.into(),
                mailer,
            }),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/email", post(send_draw))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Deserialize)]
struct DrawParams {
    seed: Option<u64>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn send_draw(
    State(state): State<AppState>,
    query: Result<Query<DrawParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<DeliveryReport>, ApiError> {
    let Query(params) = query.map_err(|rejection| {
        warn!(error = %rejection, "invalid query string");
        ApiError::bad_request(rejection.body_text())
    })?;
    let event = parse_event(&body)?;

    let participants = event.participants();
    let mut rng = params
        .seed
        .map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy);
    let assignments = draw_core::assign(&participants, &mut rng)?;

    let Some(mail) = state.mail.as_ref() else {
        error!("mail credentials not configured");
        return Err(ApiError::internal("Mail credentials not configured on server"));
    };

    if let Err(err) = mail.mailer.verify().await {
        error!(error = %err, "smtp verify failed");
        return Err(ApiError::internal("SMTP configuration invalid"));
    }

    draw_core::check_ring(&participants, &assignments)?;

    let notifications = compose_all(&event, &assignments, &mail.sender);
    let report = deliver_all(mail.mailer.as_ref(), &notifications).await;

    info!(
        event = %event.name,
        participants = participants.len(),
        sent = report.sent,
        failed = report.failed_count,
        "draw delivered"
    );
    Ok(Json(report))
}

/// Some clients post the JSON document as a JSON string; unwrap it once.
/// The body must carry a non-empty `participants` array before it is typed.
fn parse_event(body: &[u8]) -> Result<ExchangeEvent, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(invalid_json)?;
    let value = match value {
        serde_json::Value::String(raw) => serde_json::from_str(&raw).map_err(invalid_json)?,
        other => other,
    };

    let has_participants = value
        .get("participants")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|members| !members.is_empty());
    if !has_participants {
        return Err(ApiError::bad_request(
            "Invalid payload: participants array is required",
        ));
    }

    serde_json::from_value(value).map_err(invalid_json)
}

fn invalid_json(err: serde_json::Error) -> ApiError {
    warn!(error = %err, "invalid JSON body");
    ApiError::bad_request("Invalid JSON body")
}
