use std::path::PathBuf;

use thiserror::Error;

use crate::quiz::engine::ReloadPolicy;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/";
pub const DEFAULT_DATABASE_NAME: &str = "history_quiz_db";
pub const DEFAULT_QUESTIONS_COLLECTION_NAME: &str = "questions";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is set but empty")]
    Empty { name: &'static str },

    #[error("QUIZ_RELOAD_POLICY: {0}")]
    ReloadPolicy(String),
}

/// Where questions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Mongo {
        uri: String,
        database: String,
        collection: String,
    },
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store: StoreConfig,
    pub reload_policy: ReloadPolicy,
}

impl Config {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let setting = |name: &'static str, default: &str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { name }),
                Some(value) => Ok(value),
                None => Ok(default.to_string()),
            }
        };

        let store = match lookup("QUESTIONS_FILE") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    name: "QUESTIONS_FILE",
                })
            }
            Some(path) => StoreConfig::File(PathBuf::from(path)),
            None => StoreConfig::Mongo {
                uri: setting("MONGO_URI", DEFAULT_MONGO_URI)?,
                database: setting("DATABASE_NAME", DEFAULT_DATABASE_NAME)?,
                collection: setting(
                    "QUESTIONS_COLLECTION_NAME",
                    DEFAULT_QUESTIONS_COLLECTION_NAME,
                )?,
            },
        };

        let reload_policy = match lookup("QUIZ_RELOAD_POLICY") {
            Some(policy) => policy
                .parse::<ReloadPolicy>()
                .map_err(ConfigError::ReloadPolicy)?,
            None => ReloadPolicy::default(),
        };

        Ok(Self {
            store,
            reload_policy,
        })
    }
}
