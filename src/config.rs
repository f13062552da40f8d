//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ## Variables
//!
//! Everything has a default; a bare `tinylink` starts on port 3000 with a
//! SQLite file under `./data`.
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `DATA_DIR` - Directory for the database, dump token, whitelist, and TLD
//!   cache files (default: `./data`)
//! - `DATABASE_URL` - SQLite URL (default: `sqlite://<DATA_DIR>/links.db?mode=rwc`)
//! - `CHECK_FLAGS` - Enabled reputation stages, comma-separated out of
//!   `whitelist`, `surbl`, `reachability` (default: `whitelist,reachability`)
//! - `WHITELIST_SOURCE` - Whitelist file path or http(s) URL
//!   (default: `<DATA_DIR>/whitelist.conf`)
//! - `CHECK_CACHE_TTL_SECONDS` - Reputation verdict cache TTL (default: 60, min: 1)
//! - `CONNECT_TIMEOUT_MS` / `READ_TIMEOUT_MS` - Outbound network timeouts
//!   (defaults: 10000 / 30000, min: 1000)
//! - `SURBL_ZONE` - Blocklist zone to query (default: `multi.surbl.org`)
//! - `TWO_LEVEL_TLD_URL` / `THREE_LEVEL_TLD_URL` - TLD table sources
//! - `DNS_SERVERS` - Resolvers for blocklist queries, comma-separated
//!   `ip[:port]` (default: Google public DNS, which SURBL refuses for bulk
//!   traffic; production setups should run their own resolver)
//! - `DUMP_KEY` - Fixed dump endpoint token (default: generated and persisted)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write as _};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Reputation stages enabled via `CHECK_FLAGS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckFlags {
    pub whitelist: bool,
    pub surbl: bool,
    pub reachability: bool,
    /// Tokens that matched no known stage; reported at startup and ignored.
    pub unknown: Vec<String>,
}

impl CheckFlags {
    /// Parses a comma-separated flag list. Tokens are trimmed and
    /// case-insensitive; empty tokens are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut flags = Self::default();
        for token in raw.split(',') {
            let token = token.trim().to_lowercase();
            match token.as_str() {
                "" => {}
                "whitelist" => flags.whitelist = true,
                "surbl" => flags.surbl = true,
                "reachability" => flags.reachability = true,
                _ => flags.unknown.push(token),
            }
        }
        flags
    }

    /// Whether any stage is enabled at all.
    pub fn any_enabled(&self) -> bool {
        self.whitelist || self.surbl || self.reachability
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub log_level: String,
    pub log_format: String,
    pub checks: CheckFlags,
    /// Whitelist location: a file path or an http(s) URL. A missing file
    /// leaves the whitelist unloaded, which accepts every host.
    pub whitelist_source: String,
    /// TTL for cached per-host reputation verdicts, in seconds.
    pub check_cache_ttl_seconds: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// DNS zone queried by the blocklist stage.
    pub surbl_zone: String,
    pub two_level_tld_url: String,
    pub three_level_tld_url: String,
    /// Resolvers for blocklist queries. Empty means the built-in public
    /// fallback.
    pub dns_servers: Vec<SocketAddr>,
    /// Fixed dump endpoint token. When unset, a token is generated once and
    /// persisted under the data directory.
    pub dump_key: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Out-of-range numeric values are clamped to their minimums rather
    /// than rejected; the effective values appear in the startup summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a `DNS_SERVERS` entry does not parse.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/links.db?mode=rwc", data_dir.display()));

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let checks = CheckFlags::parse(
            &env::var("CHECK_FLAGS").unwrap_or_else(|_| "whitelist,reachability".to_string()),
        );

        let whitelist_source = env::var("WHITELIST_SOURCE")
            .unwrap_or_else(|_| data_dir.join("whitelist.conf").display().to_string());

        let check_cache_ttl_seconds = env::var("CHECK_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60)
            .max(1);

        let connect_timeout_ms = env::var("CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000)
            .max(1_000);

        let read_timeout_ms = env::var("READ_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000)
            .max(1_000);

        let surbl_zone = env::var("SURBL_ZONE").unwrap_or_else(|_| "multi.surbl.org".to_string());

        let two_level_tld_url = env::var("TWO_LEVEL_TLD_URL")
            .unwrap_or_else(|_| "http://george.surbl.org/two-level-tlds".to_string());
        let three_level_tld_url = env::var("THREE_LEVEL_TLD_URL")
            .unwrap_or_else(|_| "http://george.surbl.org/three-level-tlds".to_string());

        let dns_servers = Self::load_dns_servers()?;

        let dump_key = env::var("DUMP_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            listen_addr,
            data_dir,
            database_url,
            log_level,
            log_format,
            checks,
            whitelist_source,
            check_cache_ttl_seconds,
            connect_timeout_ms,
            read_timeout_ms,
            surbl_zone,
            two_level_tld_url,
            three_level_tld_url,
            dns_servers,
            dump_key,
        })
    }

    /// Parses `DNS_SERVERS` as a comma-separated list of `ip[:port]` entries.
    /// A bare IP gets port 53.
    fn load_dns_servers() -> Result<Vec<SocketAddr>> {
        let Ok(raw) = env::var("DNS_SERVERS") else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                parse_dns_server(entry).with_context(|| {
                    format!("DNS_SERVERS entry '{entry}' is not an ip or ip:port")
                })
            })
            .collect()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is invalid
    /// - `database_url` is not a SQLite URL
    /// - `surbl_zone` is empty
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!(
                "DATABASE_URL must start with 'sqlite:', got '{}'",
                self.database_url
            );
        }

        if self.surbl_zone.is_empty() {
            anyhow::bail!("SURBL_ZONE must not be empty");
        }

        Ok(())
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Data directory: {}", self.data_dir.display());
        tracing::info!("  Database: {}", self.database_url);
        tracing::info!(
            "  Checks: whitelist={} surbl={} reachability={}",
            self.checks.whitelist,
            self.checks.surbl,
            self.checks.reachability
        );

        if self.checks.whitelist {
            tracing::info!("  Whitelist source: {}", self.whitelist_source);
        }
        if self.checks.surbl {
            tracing::info!("  Blocklist zone: {}", self.surbl_zone);
            if self.dns_servers.is_empty() {
                tracing::info!("  DNS servers: public fallback");
            } else {
                tracing::info!("  DNS servers: {:?}", self.dns_servers);
            }
        }

        tracing::info!("  Check cache TTL: {}s", self.check_cache_ttl_seconds);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);

        for token in &self.checks.unknown {
            tracing::warn!("Ignoring unknown CHECK_FLAGS token '{token}'");
        }
    }
}

fn parse_dns_server(entry: &str) -> Option<SocketAddr> {
    entry
        .parse::<SocketAddr>()
        .ok()
        .or_else(|| entry.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, 53)))
}

/// Characters used for generated dump tokens. Ambiguous glyphs (`0`, `O`,
/// `1`, `l`, `I`) are left out so tokens survive manual transcription.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

/// Length of a generated dump token.
const TOKEN_LENGTH: usize = 64;

/// Returns the dump endpoint token, in order of preference: the `DUMP_KEY`
/// override, the persisted `<data_dir>/dump.key` file, or a freshly
/// generated token written to that file with owner-only permissions.
///
/// # Errors
///
/// Returns an error when the token file cannot be read or written, or the
/// OS random source fails.
pub fn load_or_create_dump_token(data_dir: &Path, configured: Option<&str>) -> Result<String> {
    if let Some(token) = configured
        && !token.is_empty()
    {
        return Ok(token.to_string());
    }

    let path = data_dir.join("dump.key");
    match fs::read_to_string(&path) {
        Ok(existing) => {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    }

    let token = random_token(TOKEN_LENGTH)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(token.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Generated dump token at {}", path.display());
    Ok(token)
}

/// Generates a token via rejection sampling so every alphabet character is
/// equally likely. 228 is the largest multiple of the 57-character alphabet
/// that fits in a byte.
fn random_token(length: usize) -> Result<String> {
    const LIMIT: u8 = (u8::MAX / TOKEN_ALPHABET.len() as u8) * TOKEN_ALPHABET.len() as u8;

    let mut token = Vec::with_capacity(length);
    let mut buf = [0u8; 128];
    while token.len() < length {
        getrandom::fill(&mut buf).context("OS random source unavailable")?;
        for &b in &buf {
            if b < LIMIT && token.len() < length {
                token.push(TOKEN_ALPHABET[(b % TOKEN_ALPHABET.len() as u8) as usize]);
            }
        }
    }
    String::from_utf8(token).context("Token alphabet is not ASCII")
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn base_config() -> Config {
        Config {
            listen_addr: "0.0.0.0:3000".to_string(),
            data_dir: PathBuf::from("./data"),
            database_url: "sqlite://./data/links.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            checks: CheckFlags::parse("whitelist,reachability"),
            whitelist_source: "./data/whitelist.conf".to_string(),
            check_cache_ttl_seconds: 60,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 30_000,
            surbl_zone: "multi.surbl.org".to_string(),
            two_level_tld_url: "http://george.surbl.org/two-level-tlds".to_string(),
            three_level_tld_url: "http://george.surbl.org/three-level-tlds".to_string(),
            dns_servers: Vec::new(),
            dump_key: None,
        }
    }

    #[test]
    fn test_check_flags_parse() {
        let flags = CheckFlags::parse("whitelist,reachability");
        assert!(flags.whitelist);
        assert!(!flags.surbl);
        assert!(flags.reachability);
        assert!(flags.unknown.is_empty());

        let flags = CheckFlags::parse(" SURBL , whitelist ");
        assert!(flags.whitelist);
        assert!(flags.surbl);
        assert!(!flags.reachability);

        let flags = CheckFlags::parse("");
        assert!(!flags.any_enabled());

        let flags = CheckFlags::parse("whitelist,teapot");
        assert!(flags.whitelist);
        assert_eq!(flags.unknown, vec!["teapot".to_string()]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        // Test invalid log format
        config.log_format = "invalid".to_string();
        assert!(config.validate().is_err());

        config.log_format = "json".to_string();
        assert!(config.validate().is_ok());

        // Test invalid listen address
        config.listen_addr = "3000".to_string();
        assert!(config.validate().is_err());

        config.listen_addr = "0.0.0.0:3000".to_string();

        // Test invalid database URL
        config.database_url = "postgres://localhost/test".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_dns_server() {
        assert_eq!(
            parse_dns_server("127.0.0.1:5353"),
            Some("127.0.0.1:5353".parse().unwrap())
        );
        assert_eq!(
            parse_dns_server("9.9.9.9"),
            Some("9.9.9.9:53".parse().unwrap())
        );
        assert_eq!(parse_dns_server("not-an-ip"), None);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            for var in [
                "LISTEN",
                "DATA_DIR",
                "DATABASE_URL",
                "CHECK_FLAGS",
                "WHITELIST_SOURCE",
                "CHECK_CACHE_TTL_SECONDS",
                "CONNECT_TIMEOUT_MS",
                "READ_TIMEOUT_MS",
                "SURBL_ZONE",
                "DNS_SERVERS",
                "DUMP_KEY",
            ] {
                env::remove_var(var);
            }
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.database_url, "sqlite://./data/links.db?mode=rwc");
        assert_eq!(config.whitelist_source, "./data/whitelist.conf");
        assert!(config.checks.whitelist);
        assert!(!config.checks.surbl);
        assert!(config.checks.reachability);
        assert_eq!(config.check_cache_ttl_seconds, 60);
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert_eq!(config.read_timeout_ms, 30_000);
        assert_eq!(config.surbl_zone, "multi.surbl.org");
        assert!(config.dns_servers.is_empty());
        assert!(config.dump_key.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_and_clamps() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("CHECK_FLAGS", "surbl");
            env::set_var("CHECK_CACHE_TTL_SECONDS", "0");
            env::set_var("CONNECT_TIMEOUT_MS", "10");
            env::set_var("READ_TIMEOUT_MS", "1");
            env::set_var("DNS_SERVERS", "127.0.0.1:5353, 9.9.9.9");
        }

        let config = Config::from_env().unwrap();

        assert!(config.checks.surbl);
        assert!(!config.checks.whitelist);
        assert!(!config.checks.reachability);
        assert_eq!(config.check_cache_ttl_seconds, 1);
        assert_eq!(config.connect_timeout_ms, 1_000);
        assert_eq!(config.read_timeout_ms, 1_000);
        assert_eq!(
            config.dns_servers,
            vec![
                "127.0.0.1:5353".parse().unwrap(),
                "9.9.9.9:53".parse().unwrap()
            ]
        );

        // Cleanup
        unsafe {
            env::remove_var("CHECK_FLAGS");
            env::remove_var("CHECK_CACHE_TTL_SECONDS");
            env::remove_var("CONNECT_TIMEOUT_MS");
            env::remove_var("READ_TIMEOUT_MS");
            env::remove_var("DNS_SERVERS");
        }
    }

    #[test]
    fn test_random_token_length_and_charset() {
        let token = random_token(TOKEN_LENGTH).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));

        // Two draws are effectively never equal.
        assert_ne!(token, random_token(TOKEN_LENGTH).unwrap());
    }

    #[test]
    fn test_dump_token_configured_override_wins() {
        let dir = tempfile::tempdir().unwrap();

        let token = load_or_create_dump_token(dir.path(), Some("fixed-token")).unwrap();

        assert_eq!(token, "fixed-token");
        assert!(!dir.path().join("dump.key").exists());
    }

    #[test]
    fn test_dump_token_is_generated_and_persisted() {
        let dir = tempfile::tempdir().unwrap();

        let first = load_or_create_dump_token(dir.path(), None).unwrap();
        let second = load_or_create_dump_token(dir.path(), None).unwrap();

        assert_eq!(first.len(), TOKEN_LENGTH);
        assert_eq!(first, second);
        assert!(dir.path().join("dump.key").exists());
    }

    #[test]
    fn test_dump_token_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dump.key"), "stored-token\n").unwrap();

        let token = load_or_create_dump_token(dir.path(), None).unwrap();

        assert_eq!(token, "stored-token");
    }

    #[cfg(unix)]
    #[test]
    fn test_dump_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        load_or_create_dump_token(dir.path(), None).unwrap();

        let mode = fs::metadata(dir.path().join("dump.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
