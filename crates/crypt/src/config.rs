//! Configuration loading and validation for one `crypt` invocation.
//!
//! All values are read from `CRYPT_`-prefixed environment variables at
//! startup. The process exits with a clear error message if any required
//! variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated invocation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `e`/`encrypt` or `d`/`decrypt`. **Required.** Parsed when the
    /// cipher is prepared, so an invalid value surfaces as an invalid-mode
    /// failure rather than a configuration failure.
    pub mode: String,

    /// Path of the PEM key file, relative to the working directory.
    /// **Required.** Also the realm under which its password is stored.
    pub key: String,

    /// The private key file is password-protected.
    #[serde(default)]
    pub keyencryption: bool,

    /// Use randomized rather than deterministic padding when encrypting.
    #[serde(default)]
    pub randpadding: bool,

    /// Names of the fields to transform (comma-separated). **Required.**
    pub fields: Vec<String>,

    /// Invoking principal. **Required.**
    pub principal: String,

    /// YAML or JSON identity directory. **Required.**
    pub identity_file: String,

    /// YAML or JSON key password store.
    #[serde(default)]
    pub credentials_file: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(source)
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.fields = normalize_fields(c.fields);
        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.mode, "CRYPT_MODE")?;
        ensure_non_empty(&self.key, "CRYPT_KEY")?;
        ensure_non_empty(&self.principal, "CRYPT_PRINCIPAL")?;
        ensure_non_empty(&self.identity_file, "CRYPT_IDENTITY_FILE")?;

        if self.fields.is_empty() {
            anyhow::bail!("CRYPT_FIELDS must name at least one field");
        }
        if let Some(path) = &self.credentials_file {
            ensure_non_empty(path, "CRYPT_CREDENTIALS_FILE")?;
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("CRYPT")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("fields")
}

/// Trim names and drop empty entries left by stray commas.
fn normalize_fields(fields: Vec<String>) -> Vec<String> {
    fields
        .into_iter()
        .map(|f| f.trim().to_owned())
        .filter(|f| !f.is_empty())
        .collect()
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CRYPT_MODE", "e"),
            ("CRYPT_KEY", "lib/keys/public.pem"),
            ("CRYPT_FIELDS", "ssn, name,,card"),
            ("CRYPT_PRINCIPAL", "alice"),
            ("CRYPT_IDENTITY_FILE", "identities.yaml"),
        ]
    }

    fn valid() -> Config {
        Config {
            mode: "e".into(),
            key: "lib/keys/public.pem".into(),
            keyencryption: false,
            randpadding: false,
            fields: vec!["ssn".into()],
            principal: "alice".into(),
            identity_file: "identities.yaml".into(),
            credentials_file: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "info");
        let cfg = Config::from_environment(env(&required())).unwrap();
        assert!(!cfg.keyencryption);
        assert!(!cfg.randpadding);
        assert!(cfg.credentials_file.is_none());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn loads_fields_as_trimmed_list() {
        let cfg = Config::from_environment(env(&required())).unwrap();
        assert_eq!(cfg.fields, ["ssn", "name", "card"]);
    }

    #[test]
    fn parses_boolean_flags() {
        let mut vars = required();
        vars.push(("CRYPT_KEYENCRYPTION", "true"));
        vars.push(("CRYPT_RANDPADDING", "true"));
        vars.push(("CRYPT_CREDENTIALS_FILE", "passwords.yaml"));
        let cfg = Config::from_environment(env(&vars)).unwrap();
        assert!(cfg.keyencryption);
        assert!(cfg.randpadding);
        assert_eq!(cfg.credentials_file.as_deref(), Some("passwords.yaml"));
    }

    #[test]
    fn missing_required_variable_is_rejected() {
        let vars: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "CRYPT_KEY")
            .collect();
        assert!(Config::from_environment(env(&vars)).is_err());
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_principal() {
        let cfg = Config {
            principal: "  ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_no_fields() {
        let cfg = Config {
            fields: Vec::new(),
            ..valid()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("CRYPT_FIELDS"));
    }

    #[test]
    fn mode_is_not_validated_here() {
        let cfg = Config {
            mode: "x".into(),
            ..valid()
        };
        assert!(cfg.validate().is_ok());
    }
}
