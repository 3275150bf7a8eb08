use clap::Parser;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_MAX_TOKENS: u32 = 100;
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
const SETTINGS_FILE: &str = ".env";

#[derive(Debug, Parser)]
#[clap(
    name = "whisk",
    version,
    about = "Send a prompt to an OpenAI-compatible chat model and print the reply."
)]
pub struct Cli {
    #[clap(
        long,
        value_name = "MODEL_ID",
        help = "Model to request the completion from",
        default_value = DEFAULT_MODEL
    )]
    pub model: String,

    #[clap(
        long,
        value_name = "F32",
        help = "Sampling temperature for the completion",
        default_value_t = DEFAULT_TEMPERATURE
    )]
    pub temperature: f32,

    #[clap(
        long,
        value_name = "INT",
        help = "Maximum number of tokens to generate",
        default_value_t = DEFAULT_MAX_TOKENS
    )]
    pub max_tokens: u32,

    #[clap(
        long,
        value_name = "API_KEY",
        help = "API key for the service; if empty, OPENAI_API_KEY is read from .env or the environment",
        default_value = ""
    )]
    pub api_key: String,

    #[clap(value_name = "PROMPT", help = "Prompt words, joined with single spaces")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key provided; set --api-key or OPENAI_API_KEY in .env or the environment")]
    MissingCredential,
    #[error("no prompt provided; pass the message as trailing arguments, e.g. `whisk \"your prompt here\"`")]
    MissingPrompt,
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn capture() -> Self {
        let mut vars: HashMap<String, String> = env::vars().collect();
        merge_settings_file(&mut vars, Path::new(SETTINGS_FILE));
        Self { vars }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            vars: pairs.into_iter().collect(),
        }
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

// Process variables take precedence over settings-file pairs.
fn merge_settings_file(vars: &mut HashMap<String, String>, path: &Path) {
    match dotenvy::from_path_iter(path) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok((key, value)) => {
                        vars.entry(key).or_insert(value);
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "skipping malformed settings file entry"
                        );
                    }
                }
            }
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "settings file not loaded"
            );
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: String,
    pub base_url: String,
    pub prompt: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("prompt", &self.prompt)
            .finish()
    }
}

impl Config {
    pub fn resolve(cli: Cli, env: &Environment) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&cli.api_key, env).ok_or(ConfigError::MissingCredential)?;
        if cli.prompt.is_empty() {
            return Err(ConfigError::MissingPrompt);
        }

        Ok(Self {
            model: cli.model,
            temperature: cli.temperature,
            max_tokens: cli.max_tokens,
            api_key,
            base_url: resolve_base_url(env),
            prompt: join_prompt(&cli.prompt),
        })
    }
}

fn resolve_api_key(flag_value: &str, env: &Environment) -> Option<String> {
    if !flag_value.is_empty() {
        return Some(flag_value.to_string());
    }

    env.var(API_KEY_VAR)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn resolve_base_url(env: &Environment) -> String {
    env.var(BASE_URL_VAR)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}

fn join_prompt(words: &[String]) -> String {
    words.join(" ")
}
