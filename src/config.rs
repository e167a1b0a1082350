use std::env;
use std::fmt;
use std::str::FromStr;

/// Which upstream API shape the chat endpoint talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    HuggingFace,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::HuggingFace => "huggingface",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub api_base: String,
    pub firestore_base: String,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    pub static_dir: String,
    pub template_glob: String,
    pub provider: ProviderSettings,
    pub auth: AuthSettings,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI career advisor.";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_HF_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

impl Settings {
    /// Reads everything from the environment. Missing keys are not fatal
    /// here; they surface per-request so the server always starts.
    pub fn from_env() -> Self {
        let kind = env_var("CHAT_PROVIDER")
            .and_then(|v| v.parse().ok())
            .unwrap_or(ProviderKind::OpenAi);

        let (api_key, api_base, default_model) = match kind {
            ProviderKind::OpenAi => (
                env_var("OPENAI_API_KEY"),
                env_or("OPENAI_API_BASE", "https://api.openai.com"),
                DEFAULT_OPENAI_MODEL,
            ),
            ProviderKind::HuggingFace => (
                env_var("HF_API_TOKEN"),
                env_or("HF_API_BASE", "https://api-inference.huggingface.co"),
                DEFAULT_HF_MODEL,
            ),
        };

        Settings {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1"),
            port: env_parse_or("PORT", 3000),
            static_dir: env_or("STATIC_DIR", "./static"),
            template_glob: env_or("TEMPLATE_GLOB", "templates/**/*"),
            provider: ProviderSettings {
                kind,
                api_key,
                api_base,
                model: env_or("CHAT_MODEL", default_model),
                system_prompt: env_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
                max_tokens: env_parse_or("MAX_TOKENS", 300),
            },
            auth: AuthSettings {
                api_base: env_or("AUTH_API_BASE", "https://identitytoolkit.googleapis.com"),
                firestore_base: env_or("FIRESTORE_API_BASE", "https://firestore.googleapis.com"),
                api_key: env_var("AUTH_API_KEY"),
                project_id: env_var("AUTH_PROJECT_ID"),
            },
        }
    }
}

/// Empty values count as unset so a blank line in .env behaves like a
/// missing key.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_var(name).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T: FromStr>(name: &str, default: T) -> T {
    env_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
