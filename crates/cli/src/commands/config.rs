use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use shopchat_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl Field {
    fn new(key: &'static str, env_keys: &'static [&'static str], value: impl Into<String>) -> Self {
        Self { key, env_keys, value: value.into() }
    }
}

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }
    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let optional = |value: Option<&str>| value.unwrap_or("<unset>").to_string();

    vec![
        Field::new("database.url", &["SHOPCHAT_DATABASE_URL"], &config.database.url),
        Field::new(
            "database.max_connections",
            &["SHOPCHAT_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        Field::new(
            "database.timeout_secs",
            &["SHOPCHAT_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        Field::new("llm.provider", &["SHOPCHAT_LLM_PROVIDER"], config.llm.provider.as_str()),
        Field::new(
            "llm.api_key",
            &["SHOPCHAT_LLM_API_KEY"],
            redact_secret(config.llm.api_key.as_ref().map(|key| key.expose_secret())),
        ),
        Field::new("llm.base_url", &["SHOPCHAT_LLM_BASE_URL"], optional(config.llm.base_url.as_deref())),
        Field::new("llm.model", &["SHOPCHAT_LLM_MODEL"], &config.llm.model),
        Field::new(
            "llm.timeout_secs",
            &["SHOPCHAT_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        Field::new("llm.max_tokens", &["SHOPCHAT_LLM_MAX_TOKENS"], config.llm.max_tokens.to_string()),
        Field::new(
            "llm.temperature",
            &["SHOPCHAT_LLM_TEMPERATURE"],
            config.llm.temperature.to_string(),
        ),
        Field::new("cache.enabled", &["SHOPCHAT_CACHE_ENABLED"], config.cache.enabled.to_string()),
        Field::new("cache.ttl_secs", &["SHOPCHAT_CACHE_TTL_SECS"], config.cache.ttl_secs.to_string()),
        Field::new(
            "assistant.shop_name",
            &["SHOPCHAT_ASSISTANT_SHOP_NAME"],
            &config.assistant.shop_name,
        ),
        Field::new(
            "assistant.support_contact",
            &["SHOPCHAT_ASSISTANT_SUPPORT_CONTACT"],
            &config.assistant.support_contact,
        ),
        Field::new(
            "assistant.product_url_prefix",
            &["SHOPCHAT_ASSISTANT_PRODUCT_URL_PREFIX"],
            &config.assistant.product_url_prefix,
        ),
        Field::new(
            "assistant.owner_scope",
            &["SHOPCHAT_ASSISTANT_OWNER_SCOPE"],
            optional(config.assistant.owner_scope.as_deref()),
        ),
        Field::new(
            "logging.level",
            &["SHOPCHAT_LOGGING_LEVEL", "SHOPCHAT_LOG_LEVEL"],
            &config.logging.level,
        ),
        Field::new(
            "logging.format",
            &["SHOPCHAT_LOGGING_FORMAT", "SHOPCHAT_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn detect_config_path(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path);
    }
    [PathBuf::from("shopchat.toml"), PathBuf::from("config/shopchat.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, field.key)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a short provider prefix such as `sk-` visible so operators can tell keys apart.
fn redact_secret(secret: Option<&str>) -> String {
    let Some(secret) = secret.map(str::trim) else {
        return "<unset>".to_string();
    };
    if secret.is_empty() {
        return "<empty>".to_string();
    }
    match secret.split_once('-') {
        Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}
