//! Axum route handlers for the Prompt API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::engine::{GenerationOutput, GenerationRequest};
use crate::generation::options::DomainOptions;
use crate::knowledge::domain::Domain;
use crate::knowledge::style_variables::available_styles;
use crate::models::generation::ChannelSelection;
use crate::state::AppState;

const DEFAULT_ENHANCE_LIMIT: u32 = 5;
const MAX_ENHANCE_LIMIT: u32 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeneratePromptRequest {
    pub description: String,
    pub domain: String,
    #[serde(default)]
    pub options: serde_json::Value,
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(flatten)]
    pub channels: ChannelSelection,
    #[serde(default = "default_true")]
    pub enable_enhance: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct GeneratePromptResponse {
    pub request_id: Uuid,
    pub domain: Domain,
    pub model: String,
    #[serde(flatten)]
    pub output: GenerationOutput,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EnhancePromptRequest {
    pub prompt: String,
    pub domain: String,
    pub limit: Option<u32>,
    pub design_style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnhancePromptResponse {
    pub prompt: String,
    pub enhanced: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub default_model: String,
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub styles: Vec<&'static str>,
}

pub(crate) fn parse_domain(raw: &str) -> Result<Domain, AppError> {
    raw.parse::<Domain>().map_err(AppError::Validation)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prompts/generate
///
/// Full pipeline: fragment context → instruction payload → streamed completion →
/// channel parsing → consistency check. Transport failures surface as 502.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GeneratePromptRequest>,
) -> Result<Json<GeneratePromptResponse>, AppError> {
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("description cannot be empty".to_string()));
    }
    let domain = parse_domain(&request.domain)?;
    let options = DomainOptions::from_json(domain, request.options)
        .map_err(|e| AppError::Validation(format!("Invalid options for {domain}: {e}")))?;

    let service = state
        .config
        .service(request.api_base_url, request.api_key, request.model);
    let model = service.model.clone();
    let generation = GenerationRequest {
        user_text: request.description,
        options,
        service,
        channels: request.channels,
        expand: request.enable_enhance,
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("generate", %request_id, %domain);

    async move {
        let mut engine = state.engine();
        let result = engine.generate(&generation).await;
        engine.close().await;
        let output = result?;

        info!("Generated prompt with {} warning(s)", output.warnings.len());

        Ok::<_, AppError>(Json(GeneratePromptResponse {
            request_id,
            domain,
            model,
            output,
            generated_at: Utc::now(),
        }))
    }
    .instrument(span)
    .await
}

/// POST /api/v1/prompts/enhance
///
/// Appends short top-ranked fragments, then an optional design-style run.
pub async fn handle_enhance(
    State(state): State<AppState>,
    Json(request): Json<EnhancePromptRequest>,
) -> Result<Json<EnhancePromptResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    let domain = parse_domain(&request.domain)?;
    let limit = request
        .limit
        .unwrap_or(DEFAULT_ENHANCE_LIMIT)
        .min(MAX_ENHANCE_LIMIT);

    let mut engine = state.engine();
    let mut prompt = engine
        .enhance_with_fragments(&request.prompt, domain.as_str(), limit)
        .await;
    if let Some(style) = request.design_style.as_deref() {
        prompt = engine.enhance_with_style(&prompt, style);
    }
    engine.close().await;

    let enhanced = prompt != request.prompt;
    Ok(Json(EnhancePromptResponse { prompt, enhanced }))
}

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default_model: state.config.llm_model.clone(),
        models: state.config.llm_models.clone(),
    })
}

/// GET /api/v1/styles
pub async fn handle_list_styles() -> Json<StylesResponse> {
    Json(StylesResponse {
        styles: available_styles(),
    })
}
