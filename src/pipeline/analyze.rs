//! Analysis: run the configured crew task over a document and parse the
//! model's answer into an [`AnalysisResult`].
//!
//! A "crew run" here is exactly one agent executing one task, which is one
//! chat completion: the agent persona as the system message, the task (with
//! the document inlined) as the user message. No retries: a failed call
//! fails the request, and retry policy is whatever the provider library does
//! by default.

use crate::config::{BriefConfig, DEFAULT_MODEL};
use crate::crew::CrewConfig;
use crate::error::BriefError;
use crate::output::AnalysisResult;
use crate::prompts::build_analysis_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Turns document Markdown into a structured briefing.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, markdown: &str) -> Result<AnalysisResult, BriefError>;
}

/// Production analyser: one crew task executed through an `edgequake-llm` provider.
pub struct CrewAnalyzer {
    provider: Arc<dyn LLMProvider>,
    crew: CrewConfig,
    options: CompletionOptions,
}

impl CrewAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &BriefConfig) -> Self {
        Self {
            provider,
            crew: config.crew.clone(),
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and build the analyser.
    pub fn from_config(config: &BriefConfig) -> Result<Self, BriefError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }
}

#[async_trait]
impl DocumentAnalyzer for CrewAnalyzer {
    async fn analyze(&self, markdown: &str) -> Result<AnalysisResult, BriefError> {
        let start = Instant::now();
        let prompt = build_analysis_prompt(&self.crew, markdown)?;
        let messages = vec![
            ChatMessage::system(prompt.system.as_str()),
            ChatMessage::user(prompt.user.as_str()),
        ];

        info!(
            "Running task '{}' on {} chars of Markdown",
            self.crew.task,
            markdown.len()
        );

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| BriefError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "Analysis: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        parse_analysis(&response.content)
    }
}

/// Build `CompletionOptions` from the briefing config.
fn build_options(config: &BriefConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

static RE_FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n(.*?)\n\s*```").unwrap());

/// Parse the model's reply into an [`AnalysisResult`].
///
/// Models asked for bare JSON still sometimes wrap it in a ```json fence or
/// add a sentence before it. Accepted shapes, tried in order:
///
/// 1. the whole reply is the JSON object;
/// 2. the first fenced block contains it;
/// 3. the span from the first `{` to the last `}` contains it.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, BriefError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BriefError::MalformedAnalysis {
            detail: "model returned an empty response".into(),
        });
    }

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(caps) = RE_FENCED_JSON.captures(trimmed) {
        if let Some(inner) = caps.get(1) {
            candidates.push(inner.as_str());
        }
    }
    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            candidates.push(&trimmed[open..=close]);
        }
    }

    let mut first_error = None;
    for candidate in candidates {
        match serde_json::from_str::<AnalysisResult>(candidate) {
            Ok(result) => return Ok(result),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(BriefError::MalformedAnalysis {
        detail: format!(
            "{} (response starts with: {:?})",
            first_error.map(|e| e.to_string()).unwrap_or_default(),
            trimmed.chars().take(120).collect::<String>()
        ),
    })
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, BriefError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        BriefError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Either variable holds a Gemini key; the provider library accepts both.
const GEMINI_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Pick `(provider, model)` from environment variables, or `None` to fall
/// through to auto-detection. Empty values count as unset.
fn provider_from_vars(
    model: &str,
    var: impl Fn(&str) -> Option<String>,
) -> Option<(String, String)> {
    let set = |name: &str| var(name).filter(|value| !value.is_empty());

    if let (Some(prov), Some(env_model)) = (set("EDGEQUAKE_LLM_PROVIDER"), set("EDGEQUAKE_MODEL")) {
        return Some((prov, env_model));
    }

    if GEMINI_KEY_VARS.iter().any(|name| set(name).is_some()) {
        return Some(("gemini".to_string(), model.to_string()));
    }

    None
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider + model** (`config.provider_name`): the factory reads
///    the matching API key (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Gemini key present** (`GEMINI_API_KEY` or `GOOGLE_API_KEY`): Gemini
///    with [`DEFAULT_MODEL`], the model this service's prompts were tuned on.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &BriefConfig) -> Result<Arc<dyn LLMProvider>, BriefError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let Some((name, model)) = provider_from_vars(model, |name| std::env::var(name).ok()) {
        return create_provider(&name, &model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| BriefError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or GOOGLE_API_KEY), OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
