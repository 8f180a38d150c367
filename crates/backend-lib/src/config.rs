// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Environment variable prefix, e.g. `SSO_ACCESS_SECRET`
pub const ENV_PREFIX: &str = "SSO_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// HMAC secret for access tokens
    #[serde(deserialize_with = "scalar::string")]
    pub access_secret: String,
    /// HMAC secret for refresh tokens
    #[serde(deserialize_with = "scalar::string")]
    pub refresh_secret: String,
    /// Characters generated passwords are drawn from
    #[serde(deserialize_with = "scalar::string")]
    pub password_alphabet: String,
    /// Characters generated handles are drawn from
    #[serde(deserialize_with = "scalar::string")]
    pub handle_alphabet: String,
    /// Static tag in front of every generated handle
    #[serde(deserialize_with = "scalar::string")]
    pub handle_prefix: String,
    /// scrypt cost parameter (log2 of N)
    pub password_hash_log_n: u8,
    /// Shared key callers must present in `App-Identification`; unset disables the check
    #[serde(deserialize_with = "scalar::optional_string")]
    pub app_identification: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            access_secret: String::new(),
            refresh_secret: String::new(),
            password_alphabet: "abcdefghijkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789".to_string(),
            handle_alphabet: "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".to_string(),
            handle_prefix: "DRD-".to_string(),
            password_hash_log_n: 15,
            app_identification: None,
        }
    }
}

// secrets stay out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .field("access_secret", &redact(&self.access_secret))
            .field("refresh_secret", &redact(&self.refresh_secret))
            .field("password_alphabet", &self.password_alphabet)
            .field("handle_alphabet", &self.handle_alphabet)
            .field("handle_prefix", &self.handle_prefix)
            .field("password_hash_log_n", &self.password_hash_log_n)
            .field(
                "app_identification",
                &self.app_identification.as_deref().map(redact),
            )
            .finish()
    }
}

impl Settings {
    /// Check the settings are usable by a running server
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.access_secret.is_empty() {
            bail!("access_secret must be set");
        }
        if self.refresh_secret.is_empty() {
            bail!("refresh_secret must be set");
        }
        if self.password_alphabet.is_empty() {
            bail!("password_alphabet must not be empty");
        }
        if self.handle_alphabet.is_empty() {
            bail!("handle_alphabet must not be empty");
        }
        if self.handle_prefix.is_empty() {
            bail!("handle_prefix must not be empty");
        }
        if !(1..=20).contains(&self.password_hash_log_n) {
            bail!(
                "password_hash_log_n must be between 1 and 20, got {}",
                self.password_hash_log_n
            );
        }
        if self.access_secret == self.refresh_secret {
            tracing::warn!("access and refresh tokens share one secret; class separation relies on the subject claim alone");
        }
        Ok(())
    }
}

/// Load settings from a TOML file layered under `SSO_*` environment variables.
///
/// A missing file is not an error; defaults fill any key neither source sets.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let settings: Settings = Figment::new()
        .merge(Toml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;

    settings.validate()?;
    Ok(settings)
}

// `Env` parses `SSO_ACCESS_SECRET=123456` as a number; keys and alphabets
// take any scalar as its textual form
mod scalar {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;

    struct ScalarString(String);

    struct ScalarVisitor;

    impl Visitor<'_> for ScalarVisitor {
        type Value = ScalarString;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(ScalarString(value))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_i128<E: de::Error>(self, value: i128) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_char<E: de::Error>(self, value: char) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }
    }

    impl<'de> Deserialize<'de> for ScalarString {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(ScalarVisitor)
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        ScalarString::deserialize(deserializer).map(|scalar| scalar.0)
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Option::<ScalarString>::deserialize(deserializer).map(|scalar| scalar.map(|s| s.0))
    }
}
