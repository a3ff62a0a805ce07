//! Process settings read once at startup.
//!
//! Backend credentials (OpenAI, Supabase, SurrealDB) are read by the config
//! types of the crates that own those clients; this module holds everything
//! else.

use std::net::SocketAddr;
use std::str::FromStr;

use repo_loader::{RecursiveSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use serde::Serialize;
use tracing::Level;

use crate::error::SettingsError;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Vector store implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    Supabase,
    Surreal,
}

impl FromStr for VectorBackend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(VectorBackend::Supabase),
            "surreal" | "surrealdb" => Ok(VectorBackend::Surreal),
            _ => Err(SettingsError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub vector_backend: VectorBackend,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub log_level: Level,
    pub log_format: LogFormat,
    pub bind_addr: SocketAddr,
}

impl Settings {
    /// Load `.env` (if present) and then read the environment.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Reads:
    /// - `VECTOR_BACKEND` (default: `supabase` when `SUPABASE_URL` is set, else `surreal`)
    /// - `MAX_CHUNK_SIZE` (default: 1000), `CHUNK_OVERLAP` (default: 200)
    /// - `LOG_LEVEL` (default: `info`), `LOG_FORMAT` (`text` or `json`)
    /// - `REPO_INTEL_BIND` (default: `0.0.0.0:8000`)
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let vector_backend = match lookup("VECTOR_BACKEND") {
            Some(value) => value.parse()?,
            None if lookup("SUPABASE_URL").is_some() => VectorBackend::Supabase,
            None => VectorBackend::Surreal,
        };

        let chunk_size = number(&lookup, "MAX_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = number(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        RecursiveSplitter::new(chunk_size, chunk_overlap)?;

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => value
                .parse::<Level>()
                .map_err(|_| SettingsError::InvalidLogLevel(value))?,
            None => Level::INFO,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let bind = lookup("REPO_INTEL_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|_| SettingsError::InvalidBind(bind))?;

        Ok(Settings {
            vector_backend,
            chunk_size,
            chunk_overlap,
            log_level,
            log_format,
            bind_addr,
        })
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == LogFormat::Json
    }
}

fn number(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, SettingsError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.vector_backend, VectorBackend::Surreal);
        assert_eq!(s.chunk_size, 1000);
        assert_eq!(s.chunk_overlap, 200);
        assert_eq!(s.log_level, Level::INFO);
        assert!(!s.json_logs());
        assert_eq!(s.bind_addr.port(), 8000);
    }

    #[test]
    fn test_supabase_url_selects_supabase() {
        let s = settings(&[("SUPABASE_URL", "https://x.supabase.co")]).unwrap();
        assert_eq!(s.vector_backend, VectorBackend::Supabase);

        let s = settings(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("VECTOR_BACKEND", "SurrealDB"),
        ])
        .unwrap();
        assert_eq!(s.vector_backend, VectorBackend::Surreal);
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("MAX_CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "JSON"),
            ("REPO_INTEL_BIND", "127.0.0.1:9100"),
        ])
        .unwrap();
        assert_eq!(s.chunk_size, 500);
        assert_eq!(s.chunk_overlap, 50);
        assert_eq!(s.log_level, Level::DEBUG);
        assert!(s.json_logs());
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:9100");
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        assert!(matches!(
            settings(&[("MAX_CHUNK_SIZE", "big")]),
            Err(SettingsError::InvalidNumber { var: "MAX_CHUNK_SIZE", .. })
        ));
        assert!(matches!(
            settings(&[("VECTOR_BACKEND", "chroma")]),
            Err(SettingsError::UnknownBackend(_))
        ));
        assert!(matches!(
            settings(&[("CHUNK_OVERLAP", "2000")]),
            Err(SettingsError::Chunking(_))
        ));
        assert!(matches!(
            settings(&[("LOG_LEVEL", "loud")]),
            Err(SettingsError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            settings(&[("REPO_INTEL_BIND", "nowhere")]),
            Err(SettingsError::InvalidBind(_))
        ));
    }
}
