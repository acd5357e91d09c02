use crate::config::types::{
    Config, EngineConfig, HttpConfig, OutputConfig, ScrapConfig, TransportKind, BrowserConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_http_config(&config.http)?;
    validate_browser_config(config.engine.transport, config.browser.as_ref())?;
    validate_scraps(&config.scraps)?;
    Ok(())
}

fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.retry_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_limit must be >= 1, got {}",
            config.retry_limit
        )));
    }
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

fn validate_browser_config(
    transport: TransportKind,
    config: Option<&BrowserConfig>,
) -> Result<(), ConfigError> {
    let config = match (transport, config) {
        (TransportKind::Browser, None) => {
            return Err(ConfigError::Validation(
                "transport = \"browser\" requires a [browser] section".to_string(),
            ));
        }
        (_, None) => return Ok(()),
        (_, Some(config)) => config,
    };

    if let Some(remote) = &config.remote_url {
        let url = Url::parse(remote)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid browser remote-url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(ConfigError::InvalidUrl(format!(
                "browser remote-url must be http(s) or ws(s), got {}",
                remote
            )));
        }
    }

    Ok(())
}

fn validate_scraps(scraps: &[ScrapConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for scrap in scraps {
        if scrap.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "scrap name cannot be empty".to_string(),
            ));
        }

        if !names.insert(scrap.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate scrap name '{}'",
                scrap.name
            )));
        }

        validate_scrap(scrap)?;
    }

    Ok(())
}

fn validate_scrap(scrap: &ScrapConfig) -> Result<(), ConfigError> {
    if scrap.seeds.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Scrap '{}' must have at least one seed URL",
            scrap.name
        )));
    }

    for seed in &scrap.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }

    if let Some(limit) = scrap.retry_limit {
        if limit < 1 {
            return Err(ConfigError::Validation(format!(
                "Scrap '{}': retry_limit must be >= 1, got {}",
                scrap.name, limit
            )));
        }
    }

    if scrap.fields.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Scrap '{}' must define at least one field",
            scrap.name
        )));
    }

    if let Some(selector) = &scrap.item_selector {
        validate_selector(selector)?;
    }
    if let Some(selector) = &scrap.follow_selector {
        validate_selector(selector)?;
    }

    let mut field_names = HashSet::new();
    for field in &scrap.fields {
        if field.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Scrap '{}' has a field without a name",
                scrap.name
            )));
        }
        if !field_names.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Scrap '{}' defines field '{}' twice",
                scrap.name, field.name
            )));
        }
        validate_selector(&field.selector)?;
    }

    for key in &scrap.unique_by {
        if !field_names.contains(key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Scrap '{}': unique-by key '{}' is not a field",
                scrap.name, key
            )));
        }
    }

    for output in &scrap.outputs {
        validate_output(scrap, output)?;
    }

    Ok(())
}

fn validate_output(scrap: &ScrapConfig, output: &OutputConfig) -> Result<(), ConfigError> {
    match output {
        OutputConfig::Json { path } => validate_path(scrap, path),
        OutputConfig::Csv { path, delimiter } => {
            validate_path(scrap, path)?;
            if delimiter.len() != 1 || !delimiter.is_ascii() {
                return Err(ConfigError::Validation(format!(
                    "Scrap '{}': csv delimiter must be a single ASCII character, got '{}'",
                    scrap.name, delimiter
                )));
            }
            Ok(())
        }
        OutputConfig::Sqlite { path, table } => {
            validate_path(scrap, path)?;
            validate_identifier(table)?;
            for field in &scrap.fields {
                validate_identifier(&field.name)?;
            }
            Ok(())
        }
        OutputConfig::Log => Ok(()),
    }
}

fn validate_path(scrap: &ScrapConfig, path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Scrap '{}': output path cannot be empty",
            scrap.name
        )));
    }
    Ok(())
}

/// Validates a CSS selector by compiling it
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", selector, e)))
}

/// Plain SQL identifier: a letter or underscore, then letters, digits, underscores
fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "'{}' is not a valid SQL identifier",
            name
        )));
    }
    Ok(())
}
