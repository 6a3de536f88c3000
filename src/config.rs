//! Session configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::identity::Role;

/// Identifier stamped on local messages before the visitor has one.
pub const DEFAULT_FALLBACK_NICK: &str = "visitor:";

pub const FALLBACK_NICK_ENV: &str = "LIVECHAT_FALLBACK_NICK";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} does not classify as a visitor identifier")]
    FallbackNotVisitor { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub fallback_nick: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_nick: DEFAULT_FALLBACK_NICK.to_owned(),
        }
    }
}

impl SessionConfig {
    /// Build session config from environment variables.
    ///
    /// Optional:
    /// - `LIVECHAT_FALLBACK_NICK`: default `visitor:`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FallbackNotVisitor`] when the fallback would
    /// not classify as a visitor.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let fallback_nick = lookup(FALLBACK_NICK_ENV)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_FALLBACK_NICK.to_owned());

        if !Role::classify(&fallback_nick).is_visitor() {
            return Err(ConfigError::FallbackNotVisitor {
                var: FALLBACK_NICK_ENV,
                value: fallback_nick,
            });
        }

        Ok(Self { fallback_nick })
    }
}
