use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use jemput_assistant::client::{DEFAULT_API_URL, DEFAULT_MODEL, MODELS};

/// Runtime settings read from the environment and an optional `.env` file.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub data_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    /// Username and password for the first admin; only used on an empty store.
    pub admin: Option<(String, String)>,
    pub mistral_api_key: Option<String>,
    pub mistral_api_url: String,
    pub mistral_model: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mistral_model = env::var("MISTRAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        if !MODELS.contains(&mistral_model.as_str()) {
            bail!(
                "invalid MISTRAL_MODEL: {mistral_model} (expected one of {})",
                MODELS.join(", ")
            );
        }

        Ok(Self {
            data_file: parse_or_default("JEMPUT_DATA_FILE", PathBuf::from("jemput.json"))?,
            log_file: parse_or_default("JEMPUT_LOG_FILE", PathBuf::from("jemput.log"))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            admin: admin_credentials(
                non_blank_var("JEMPUT_ADMIN_USERNAME"),
                non_blank_var("JEMPUT_ADMIN_PASSWORD"),
            )?,
            mistral_api_key: non_blank_var("MISTRAL_API_KEY"),
            mistral_api_url: env::var("MISTRAL_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_owned()),
            mistral_model,
        })
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Pair the bootstrap admin settings. Either both are set or neither.
fn admin_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<Option<(String, String)>> {
    match (username, password) {
        (Some(username), Some(password)) => Ok(Some((username, password))),
        (None, None) => Ok(None),
        (Some(_), None) => bail!("JEMPUT_ADMIN_USERNAME is set but JEMPUT_ADMIN_PASSWORD is not"),
        (None, Some(_)) => bail!("JEMPUT_ADMIN_PASSWORD is set but JEMPUT_ADMIN_USERNAME is not"),
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Err(anyhow!("invalid {key}: value is empty")),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow!("invalid {key}: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_credentials_have_no_default() {
        assert!(admin_credentials(None, None).expect("valid").is_none());
        assert_eq!(
            admin_credentials(Some("kepala".to_owned()), Some("s3cret".to_owned()))
                .expect("valid"),
            Some(("kepala".to_owned(), "s3cret".to_owned()))
        );
        assert!(admin_credentials(Some("kepala".to_owned()), None).is_err());
        assert!(admin_credentials(None, Some("s3cret".to_owned())).is_err());
    }
}
