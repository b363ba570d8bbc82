use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const CONFIG_PATH_VAR: &str = "SKINCHECK_CONFIG";

const DEFAULT_LOCAL_INFERENCE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_LLM_BASE_URL: &str = "https://api.studio.nebius.ai/v1/";
const DEFAULT_LLM_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct-fast";
const DEFAULT_LLM_API_KEY_VAR: &str = "NEBIUS_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub local_inference: UpstreamSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: Url,
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself is
    /// read on every call, never stored here.
    pub api_key_var: String,
    pub timeout: Duration,
    pub workers: usize,
}

/// Optional YAML overlay. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub server: FileServer,
    pub local_inference: FileUpstream,
    pub llm: FileLlm,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileUpstream {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLlm {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_var: Option<String>,
    pub timeout_secs: Option<u64>,
    pub workers: Option<usize>,
}

impl FileSettings {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })
    }
}

impl Settings {
    /// Reads the optional YAML file named by `SKINCHECK_CONFIG`, then lets the
    /// process environment override it.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let file = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                log::info!("Loading configuration from {}", path);
                FileSettings::load(&path)?
            }
            None => FileSettings::default(),
        };
        Self::from_sources(file, lookup)
    }

    pub fn from_sources<F>(file: FileSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerSettings {
            host: lookup("HOST")
                .or(file.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: pick(&lookup, "PORT", file.server.port, 8090)?,
            max_upload_bytes: pick(
                &lookup,
                "MAX_UPLOAD_BYTES",
                file.server.max_upload_bytes,
                20 * 1024 * 1024,
            )?,
        };
        if server.max_upload_bytes == 0 {
            return Err(invalid("MAX_UPLOAD_BYTES", "must be greater than zero"));
        }

        let local_inference = UpstreamSettings {
            url: base_url(
                "LOCAL_INFERENCE_URL",
                lookup("LOCAL_INFERENCE_URL")
                    .or(file.local_inference.url)
                    .as_deref()
                    .unwrap_or(DEFAULT_LOCAL_INFERENCE_URL),
            )?,
            timeout: timeout(
                &lookup,
                "LOCAL_INFERENCE_TIMEOUT_SECS",
                file.local_inference.timeout_secs,
                60,
            )?,
        };

        let llm = LlmSettings {
            base_url: base_url(
                "LLM_BASE_URL",
                lookup("LLM_BASE_URL")
                    .or(file.llm.base_url)
                    .as_deref()
                    .unwrap_or(DEFAULT_LLM_BASE_URL),
            )?,
            model: lookup("LLM_MODEL")
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_key_var: lookup("LLM_API_KEY_VAR")
                .or(file.llm.api_key_var)
                .unwrap_or_else(|| DEFAULT_LLM_API_KEY_VAR.to_string()),
            timeout: timeout(&lookup, "LLM_TIMEOUT_SECS", file.llm.timeout_secs, 120)?,
            workers: pick(&lookup, "LLM_WORKERS", file.llm.workers, 4)?,
        };
        if llm.workers == 0 {
            return Err(invalid("LLM_WORKERS", "must be at least 1"));
        }
        if llm.model.trim().is_empty() {
            return Err(invalid("LLM_MODEL", "must not be empty"));
        }
        if llm.api_key_var.trim().is_empty() {
            return Err(invalid("LLM_API_KEY_VAR", "must not be empty"));
        }

        Ok(Self {
            server,
            local_inference,
            llm,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.into(),
    }
}

fn pick<F, T>(lookup: &F, key: &'static str, file: Option<T>, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, format!("{:?}: {}", raw, e))),
        None => Ok(file.unwrap_or(default)),
    }
}

fn timeout<F>(
    lookup: &F,
    key: &'static str,
    file: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = pick(lookup, key, file, default)?;
    if secs == 0 {
        return Err(invalid(key, "timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a base URL and makes sure it ends with `/` so relative joins keep
/// the last path segment.
fn base_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(key, format!("{:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(key, format!("unsupported scheme {:?}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
