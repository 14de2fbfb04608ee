//! Prompt Engine — orchestrates one generation call.
//!
//! Flow: lazily open fragment store → build fragment context → build system
//!       prompt → stream completion → parse channels → advisory consistency check.
//!
//! One engine serves one caller. The store connection is opened on first use
//! and must be released with `close()` on every exit path.

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::fragments::store::{CategoryCount, FragmentStore};
use crate::generation::context_builder::build_fragment_context;
use crate::generation::options::DomainOptions;
use crate::knowledge::constraints::{check_consistency, ConsistencyWarning};
use crate::knowledge::style_variables::{prompt_enhancement, Language, RandomSource, ThreadRandom};
use crate::llm_client::parser::parse_channels;
use crate::llm_client::prompts::build_system_prompt;
use crate::llm_client::{CompletionClient, CompletionService, LlmError, ServiceConfig};
use crate::models::generation::{Channel, ChannelSelection, GenerationResult};

/// Short templates only; longer ones read as sentences when appended.
const ENHANCE_MAX_TEMPLATE_CHARS: usize = 100;
const ENHANCE_MAX_FRAGMENTS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Everything needed for one generation call. The domain is implied by `options`.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_text: String,
    pub options: DomainOptions,
    pub service: ServiceConfig,
    pub channels: ChannelSelection,
    pub expand: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(flatten)]
    pub result: GenerationResult,
    pub warnings: Vec<ConsistencyWarning>,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

pub struct PromptEngine {
    db_path: String,
    store: OnceCell<FragmentStore>,
    rng: Box<dyn RandomSource>,
}

impl PromptEngine {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self::with_random(db_path, Box::new(ThreadRandom))
    }

    /// Engine with an explicit random source, for deterministic flavour sampling.
    pub fn with_random(db_path: impl Into<String>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            db_path: db_path.into(),
            store: OnceCell::new(),
            rng,
        }
    }

    async fn store(&self) -> &FragmentStore {
        self.store
            .get_or_init(|| FragmentStore::open(&self.db_path))
            .await
    }

    /// Runs the full pipeline against the configured completion service.
    pub async fn generate(
        &mut self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, LlmError> {
        if request.channels.is_empty() {
            info!("No output channels requested, skipping generation");
            return Ok(GenerationOutput::default());
        }
        let client = CompletionClient::new(request.service.clone())?;
        self.generate_with(&client, request).await
    }

    /// Runs the full pipeline against any completion service.
    pub async fn generate_with(
        &mut self,
        service: &dyn CompletionService,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, LlmError> {
        if request.channels.is_empty() {
            return Ok(GenerationOutput::default());
        }

        let domain = request.options.domain().as_str();
        let store = self
            .store
            .get_or_init(|| FragmentStore::open(&self.db_path))
            .await;
        let context =
            build_fragment_context(store, domain, &request.options, self.rng.as_mut()).await;

        let system = build_system_prompt(
            domain,
            &request.options,
            &context,
            &request.channels,
            request.expand,
        );
        info!(
            "Generating {domain} prompt: channels={}, context_chars={}, expand={}",
            request.channels.requested().len(),
            context.chars().count(),
            request.expand
        );

        let text = service.complete(&system, &request.user_text).await?;
        let result = parse_channels(&text, &request.channels);

        let warnings = match request.options.ethnicity() {
            Some(ethnicity) => {
                let generated = Channel::ALL
                    .iter()
                    .map(|c| result.get(*c))
                    .collect::<Vec<_>>()
                    .join("\n");
                check_consistency(ethnicity, &generated)
            }
            None => Vec::new(),
        };
        if !warnings.is_empty() {
            info!("Consistency check raised {} warning(s)", warnings.len());
        }

        Ok(GenerationOutput { result, warnings })
    }

    /// Appends up to three short top-ranked templates of the domain to `prompt`.
    /// Returns `prompt` unchanged when nothing qualifies.
    pub async fn enhance_with_fragments(&self, prompt: &str, domain: &str, limit: u32) -> String {
        let additions: Vec<String> = self
            .store()
            .await
            .top_by_domain(domain, limit)
            .await
            .into_iter()
            .map(|f| f.template_text)
            .filter(|t| !t.is_empty() && t.chars().count() < ENHANCE_MAX_TEMPLATE_CHARS)
            .take(ENHANCE_MAX_FRAGMENTS)
            .collect();

        debug!("Enhancing prompt with {} fragment(s)", additions.len());
        if additions.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt}, {}", additions.join(", "))
        }
    }

    /// Appends a short design-style keyword run to `prompt`.
    pub fn enhance_with_style(&mut self, prompt: &str, style: &str) -> String {
        let addition = prompt_enhancement(style, Language::En, self.rng.as_mut());
        if addition.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt}, {addition}")
        }
    }

    /// Per-category fragment counts, or `None` when the store is unavailable.
    pub async fn category_stats(&self, domain: &str) -> Option<Vec<CategoryCount>> {
        let store = self.store().await;
        if !store.is_available() {
            return None;
        }
        Some(store.category_stats(domain).await)
    }

    /// Releases the store connection if one was opened.
    pub async fn close(self) {
        if let Some(store) = self.store.into_inner() {
            store.close().await;
        }
    }
}
