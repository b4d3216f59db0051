//! Configuration types for the briefing pipeline and the HTTP server.
//!
//! Pipeline behaviour is controlled through [`BriefConfig`], built via its
//! [`BriefConfigBuilder`]; server behaviour through [`ServerConfig`]. The two
//! are separate because the pipeline is also used without HTTP (`pdf2brief
//! run`, library callers).

use crate::crew::CrewConfig;
use crate::error::BriefError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when a provider is named without a model, and for the
/// `GEMINI_API_KEY` fallback.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Port the service listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 5010;

/// Default request-body cap for uploads: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Configuration for the convert → analyse pipeline.
///
/// # Example
/// ```rust
/// use pdf2brief::BriefConfig;
///
/// let config = BriefConfig::builder()
///     .provider_name("gemini")
///     .model("gemini-2.0-flash")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BriefConfig {
    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-mini".
    /// If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the analysis call. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate for the briefing. Default: 4096.
    ///
    /// The extended summary alone can run to a thousand tokens. Too low a cap
    /// truncates the JSON mid-string and the reply fails to parse.
    pub max_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Separator between pages in the converted Markdown. Default: horizontal rule.
    pub page_separator: PageSeparator,

    /// Agents and tasks the analyser runs.
    pub crew: CrewConfig,

    /// Explicit pdfium library to bind. If None, pdfium-auto resolves
    /// (and if needed downloads) one.
    pub pdfium_library: Option<PathBuf>,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            password: None,
            page_separator: PageSeparator::HorizontalRule,
            crew: CrewConfig::default(),
            pdfium_library: None,
        }
    }
}

impl fmt::Debug for BriefConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BriefConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("page_separator", &self.page_separator)
            .field("task", &self.crew.task)
            .field("pdfium_library", &self.pdfium_library)
            .finish()
    }
}

impl BriefConfig {
    /// Create a new builder for `BriefConfig`.
    pub fn builder() -> BriefConfigBuilder {
        BriefConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BriefConfig`].
#[derive(Debug)]
pub struct BriefConfigBuilder {
    config: BriefConfig,
}

impl BriefConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn crew(mut self, crew: CrewConfig) -> Self {
        self.config.crew = crew;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BriefConfig, BriefError> {
        if self.config.max_tokens == 0 {
            return Err(BriefError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        self.config.crew.validate()?;
        Ok(self.config)
    }
}

/// How to separate pages in the converted Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n".
    None,
    /// Horizontal rule: "\n\n---\n\n" (default)
    #[default]
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }

    /// Parse the CLI spelling: `none`, `hr`, `comment`, anything else is custom.
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => PageSeparator::None,
            "hr" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            custom => PageSeparator::Custom(custom.to_string()),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Which browser origins may call the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin, with credentials. The request's origin, method and headers
    /// are mirrored back, since browsers reject a literal `*` alongside
    /// `Access-Control-Allow-Credentials: true`.
    #[default]
    AnyOrigin,
    /// Only these exact origins (e.g. `https://app.example.org`), with credentials.
    AllowList(Vec<String>),
}

impl CorsPolicy {
    /// An empty list means "any origin".
    pub fn from_origins(origins: Vec<String>) -> Self {
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsPolicy::AnyOrigin
        } else {
            CorsPolicy::AllowList(origins)
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors: CorsPolicy,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: local_ip(),
            port: DEFAULT_PORT,
            cors: CorsPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Best guess at this machine's LAN address, so other devices on the
/// network can reach the service.
///
/// Connecting a UDP socket sends no packets; it only asks the OS which local
/// interface would route to the target. Falls back to loopback when there
/// is no route (offline machines, sandboxes).
pub fn local_ip() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
