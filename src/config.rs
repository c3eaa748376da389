use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;

const MEGABYTE: usize = 1024 * 1024;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_upload_bytes() -> usize {
    // 500 MB in bytes
    500 * MEGABYTE
}

fn default_infer_schema_rows() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_infer_schema_rows")]
    pub infer_schema_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            infer_schema_rows: default_infer_schema_rows(),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and the process environment once at startup.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = parse_var::<SocketAddr, _>(&lookup, "REPORT_BIND_ADDR")? {
            config.bind_addr = addr;
        }

        if let Some(mb) = parse_var::<usize, _>(&lookup, "REPORT_MAX_UPLOAD_MB")? {
            if mb == 0 {
                anyhow::bail!("REPORT_MAX_UPLOAD_MB must be greater than zero");
            }
            config.max_upload_bytes = mb
                .checked_mul(MEGABYTE)
                .context("REPORT_MAX_UPLOAD_MB is too large")?;
        }

        if let Some(rows) = parse_var::<usize, _>(&lookup, "REPORT_INFER_SCHEMA_ROWS")? {
            config.infer_schema_rows = rows.max(1);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}={:?}: {}", key, raw, e)),
        _ => Ok(None),
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    tracing::info!(
        "Loaded configuration: bind_addr={}, max_upload={}MB, infer_schema_rows={}",
        config.bind_addr,
        config.max_upload_bytes / MEGABYTE,
        config.infer_schema_rows
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_allow_500mb_uploads() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.max_upload_bytes, 500 * 1024 * 1024);
        assert_eq!(config.bind_addr, default_bind_addr());
        assert_eq!(config.infer_schema_rows, 10_000);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("REPORT_BIND_ADDR", "0.0.0.0:8080"),
            ("REPORT_MAX_UPLOAD_MB", "1024"),
            ("REPORT_INFER_SCHEMA_ROWS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_upload_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.infer_schema_rows, 250);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("REPORT_MAX_UPLOAD_MB", "lots")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("REPORT_MAX_UPLOAD_MB", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("REPORT_BIND_ADDR", "nowhere")])).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("REPORT_MAX_UPLOAD_MB", "  ")])).unwrap();
        assert_eq!(config.max_upload_bytes, default_max_upload_bytes());
    }
}
