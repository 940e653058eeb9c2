//! Language-model platform selection and chat client.
//!
//! Every supported platform is reached through an OpenAI-compatible chat
//! endpoint, so a single client type covers all of them; only the API base
//! and the credential variable differ.

use std::fmt;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::warn;

use crate::error::{Error, Result};

const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";
const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Sampling temperature used for every chat call.
const TEMPERATURE: f32 = 0.7;

/// A selectable language-model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    OpenAi,
    DeepSeek,
    Google,
}

impl Platform {
    /// Parse a platform name from the settings file.
    ///
    /// Unrecognized names fall back to OpenAI rather than failing; the
    /// fallback is logged so the decision is visible to the operator.
    pub fn parse_or_default(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Platform::OpenAi,
            "deepseek" => Platform::DeepSeek,
            "google" => Platform::Google,
            other => {
                warn!(platform = other, "unrecognized ai_platform, falling back to openai");
                Platform::OpenAi
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::OpenAi => "openai",
            Platform::DeepSeek => "deepseek",
            Platform::Google => "google",
        }
    }

    /// Environment variable holding this platform's API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            Platform::OpenAi => "OPENAI_API_KEY",
            Platform::DeepSeek => "DEEPSEEK_API_KEY",
            Platform::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved API credentials for one platform.
///
/// Resolved once at startup; the pipeline never re-reads the environment
/// mid-run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_base: Option<String>,
}

impl Credentials {
    /// Read the platform's credential from the process environment.
    ///
    /// A missing or empty key surfaces as [`Error::MissingCredential`]
    /// before any network attempt is made.
    pub fn from_env(platform: Platform) -> Result<Self> {
        let var = platform.credential_var();
        let api_key = std::env::var(var).ok().filter(|k| !k.is_empty()).ok_or(
            Error::MissingCredential {
                platform: platform.name(),
                var,
            },
        )?;
        let api_base = match platform {
            Platform::OpenAi => None,
            Platform::DeepSeek => Some(
                std::env::var("DEEPSEEK_BASE_URL")
                    .ok()
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| DEEPSEEK_API_BASE.to_string()),
            ),
            Platform::Google => Some(GOOGLE_API_BASE.to_string()),
        };
        Ok(Self { api_key, api_base })
    }
}

/// A chat-completion handle bound to one platform and model.
pub struct ChatClient {
    client: Client<OpenAIConfig>,
    platform: Platform,
    model: String,
}

impl ChatClient {
    /// Build a client for the given platform and model.
    pub fn resolve(platform: Platform, model: impl Into<String>, credentials: &Credentials) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(&credentials.api_key);
        if let Some(base) = &credentials.api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: Client::with_config(config),
            platform,
            model: model.into(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one chat completion and return the first choice's content.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(TEMPERATURE)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::EmptyCompletion {
                model: self.model.clone(),
            })
    }
}
