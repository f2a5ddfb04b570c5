use anyhow::{Context, Result, bail};
use fnol_flow::{OrchestratorConfig, PipelineConfig};
use std::time::Duration;

const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_MAX_CONCURRENCY: usize = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Configuration for the claims service, read from the environment
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub openrouter_api_key: String,
    pub model: String,
    pub max_concurrency: usize,
    pub call_timeout: Duration,
    pub classify_timeout: Duration,
    pub bind_addr: String,
    pub allowed_origin: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let openrouter_api_key = lookup("OPENROUTER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("OPENROUTER_API_KEY not set")?;

        let max_concurrency = parse_or(&lookup, "FNOL_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;
        if max_concurrency == 0 {
            bail!("FNOL_MAX_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            openrouter_api_key,
            model: lookup("FNOL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_concurrency,
            call_timeout: Duration::from_secs(parse_or(
                &lookup,
                "FNOL_CALL_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            classify_timeout: Duration::from_secs(parse_or(
                &lookup,
                "FNOL_CLASSIFY_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            bind_addr: lookup("FNOL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            allowed_origin: lookup("FNOL_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            orchestrator: OrchestratorConfig {
                max_concurrency: self.max_concurrency,
                call_timeout: self.call_timeout,
            },
            classify_timeout: self.classify_timeout,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
