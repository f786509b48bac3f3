//! Start-up configuration read from `CMDMAIL_*` environment variables.
//!
//! The configuration is loaded once, before the command runs, and handed
//! explicitly to the backend. There is no per-invocation override.

use std::path::PathBuf;
use std::str::FromStr;

use lettre::Address;
use log::debug;
use thiserror::Error;

pub const ENV_FROM: &str = "CMDMAIL_FROM";
pub const ENV_SMTP_SERVER: &str = "CMDMAIL_SMTP_SERVER";
pub const ENV_SMTP_USER: &str = "CMDMAIL_SMTP_USER";
pub const ENV_SMTP_PASS: &str = "CMDMAIL_SMTP_PASS";
pub const ENV_FILE_PATH: &str = "CMDMAIL_FILE_PATH";
pub const ENV_SHELL: &str = "CMDMAIL_SHELL";
pub const ENV_VERBOSITY: &str = "CMDMAIL_VERBOSITY";

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SHELL: &str = "/bin/sh";
const DEFAULT_SENDER: &str = "nobody@localhost";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid sender address in CMDMAIL_FROM: {0}")]
    InvalidSender(String),
    #[error("Invalid SMTP server '{0}', expected host:port")]
    InvalidServer(String),
    #[error("Invalid SMTP port '{0}'")]
    InvalidPort(String),
    #[error("CMDMAIL_SMTP_USER and CMDMAIL_SMTP_PASS must both be set to authenticate")]
    MissingCredentials,
    #[error("No backend configured. Please set CMDMAIL_SMTP_SERVER or CMDMAIL_FILE_PATH")]
    NoBackend,
    #[error("Invalid verbosity '{0}', expected a number from 0 to 3")]
    InvalidVerbosity(String),
}

/// SMTP relay the report is submitted to.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    File { path: PathBuf },
    Smtp(SmtpConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sender: Address,
    pub shell: String,
    pub backend: BackendConfig,
}

impl Config {
    /// Build the configuration from `(name, value)` environment pairs.
    ///
    /// The file backend wins when `CMDMAIL_FILE_PATH` is set; otherwise an
    /// SMTP server and both credentials are required.
    pub fn from_env(envs: &[(String, String)]) -> Result<Self, ConfigError> {
        let backend = if let Some(path) = lookup(envs, ENV_FILE_PATH) {
            debug!("Config: file backend path={}", path);
            BackendConfig::File {
                path: PathBuf::from(path),
            }
        } else if let Some(server) = lookup(envs, ENV_SMTP_SERVER) {
            let (host, port) = parse_server(server.trim())?;
            let (Some(username), Some(password)) =
                (lookup(envs, ENV_SMTP_USER), lookup(envs, ENV_SMTP_PASS))
            else {
                return Err(ConfigError::MissingCredentials);
            };
            debug!("Config: smtp host={} port={} user={}", host, port, username);
            BackendConfig::Smtp(SmtpConfig {
                host,
                port,
                username: username.to_string(),
                password: password.to_string(),
            })
        } else {
            return Err(ConfigError::NoBackend);
        };

        let sender = match lookup(envs, ENV_FROM) {
            Some(from) => Address::from_str(from.trim())
                .map_err(|_| ConfigError::InvalidSender(from.to_string()))?,
            None => lookup(envs, ENV_SMTP_USER)
                .and_then(|user| Address::from_str(user.trim()).ok())
                .map_or_else(default_sender, Ok)?,
        };
        debug!("Config: sender={}", sender);

        let shell = lookup(envs, ENV_SHELL).unwrap_or(DEFAULT_SHELL).to_string();

        Ok(Self {
            sender,
            shell,
            backend,
        })
    }
}

/// Log verbosity, read separately so logging is up before the rest of the
/// configuration is validated.
pub fn verbosity_from_env(envs: &[(String, String)]) -> Result<u8, ConfigError> {
    match lookup(envs, ENV_VERBOSITY) {
        None => Ok(0),
        Some(value) => value
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidVerbosity(value.to_string())),
    }
}

fn default_sender() -> Result<Address, ConfigError> {
    Address::from_str(DEFAULT_SENDER).map_err(|_| ConfigError::InvalidSender(DEFAULT_SENDER.into()))
}

/// Last value wins, blank values count as unset. Values are returned as
/// given: credentials and paths may legitimately carry surrounding spaces.
fn lookup<'a>(envs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    envs.iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

/// Split `host:port`, accepting a bracketed IPv6 host and a missing port.
fn parse_server(server: &str) -> Result<(String, u16), ConfigError> {
    let (host, port) = if let Some(rest) = server.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| ConfigError::InvalidServer(server.to_string()))?;
        match tail.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if tail.is_empty() => (host, None),
            None => return Err(ConfigError::InvalidServer(server.to_string())),
        }
    } else {
        match server.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (server, None),
        }
    };

    if host.is_empty() {
        return Err(ConfigError::InvalidServer(server.to_string()));
    }
    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.to_string()))?,
        None => DEFAULT_SMTP_PORT,
    };
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn smtp_envs() -> Vec<(String, String)> {
        envs(&[
            (ENV_FROM, "reports@example.com"),
            (ENV_SMTP_SERVER, "smtp.example.com:2525"),
            (ENV_SMTP_USER, "mailer"),
            (ENV_SMTP_PASS, "hunter2"),
        ])
    }

    #[test]
    fn test_smtp_config() {
        let config = Config::from_env(&smtp_envs()).unwrap();
        assert_eq!(config.sender.to_string(), "reports@example.com");
        assert_eq!(config.shell, DEFAULT_SHELL);
        assert_eq!(
            config.backend,
            BackendConfig::Smtp(SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 2525,
                username: "mailer".to_string(),
                password: "hunter2".to_string(),
            })
        );
    }

    #[test]
    fn test_port_defaults_to_submission() {
        let mut vars = smtp_envs();
        vars.push((ENV_SMTP_SERVER.to_string(), "smtp.example.com".to_string()));
        let config = Config::from_env(&vars).unwrap();
        let BackendConfig::Smtp(smtp) = config.backend else {
            panic!("expected smtp backend");
        };
        assert_eq!(smtp.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_ipv6_server() {
        assert_eq!(parse_server("[::1]:25").unwrap(), ("::1".to_string(), 25));
        assert_eq!(parse_server("[::1]").unwrap(), ("::1".to_string(), 587));
        assert!(parse_server("[::1").is_err());
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(
            parse_server("smtp.example.com:smtp"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_server("smtp.example.com:70000"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_server(":25"),
            Err(ConfigError::InvalidServer(_))
        ));
    }

    #[test]
    fn test_missing_password() {
        let vars = envs(&[
            (ENV_SMTP_SERVER, "smtp.example.com:587"),
            (ENV_SMTP_USER, "mailer"),
        ]);
        assert!(matches!(
            Config::from_env(&vars),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let mut vars = smtp_envs();
        vars.push((ENV_SMTP_PASS.to_string(), "  ".to_string()));
        assert!(matches!(
            Config::from_env(&vars),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_credentials_keep_surrounding_spaces() {
        let mut vars = smtp_envs();
        vars.push((ENV_SMTP_USER.to_string(), " mailer ".to_string()));
        vars.push((ENV_SMTP_PASS.to_string(), "  pa ss  ".to_string()));
        let config = Config::from_env(&vars).unwrap();
        let BackendConfig::Smtp(smtp) = config.backend else {
            panic!("expected smtp backend");
        };
        assert_eq!(smtp.username, " mailer ");
        assert_eq!(smtp.password, "  pa ss  ");
    }

    #[test]
    fn test_server_and_sender_tolerate_padding() {
        let mut vars = smtp_envs();
        vars.push((ENV_SMTP_SERVER.to_string(), " smtp.example.com:25 ".to_string()));
        vars.push((ENV_FROM.to_string(), " reports@example.com ".to_string()));
        let config = Config::from_env(&vars).unwrap();
        assert_eq!(config.sender.to_string(), "reports@example.com");
        let BackendConfig::Smtp(smtp) = config.backend else {
            panic!("expected smtp backend");
        };
        assert_eq!((smtp.host.as_str(), smtp.port), ("smtp.example.com", 25));
    }

    #[test]
    fn test_file_path_is_not_trimmed() {
        let vars = envs(&[(ENV_FILE_PATH, "/tmp/report .eml ")]);
        assert_eq!(
            Config::from_env(&vars).unwrap().backend,
            BackendConfig::File {
                path: PathBuf::from("/tmp/report .eml ")
            }
        );
    }

    #[test]
    fn test_no_backend() {
        let vars = envs(&[(ENV_FROM, "reports@example.com")]);
        assert!(matches!(Config::from_env(&vars), Err(ConfigError::NoBackend)));
    }

    #[test]
    fn test_file_backend_wins() {
        let mut vars = smtp_envs();
        vars.push((ENV_FILE_PATH.to_string(), "/tmp/report.eml".to_string()));
        let config = Config::from_env(&vars).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::File {
                path: PathBuf::from("/tmp/report.eml")
            }
        );
    }

    #[test]
    fn test_sender_falls_back_to_username() {
        let vars = envs(&[
            (ENV_SMTP_SERVER, "smtp.example.com"),
            (ENV_SMTP_USER, "me@example.com"),
            (ENV_SMTP_PASS, "secret"),
        ]);
        let config = Config::from_env(&vars).unwrap();
        assert_eq!(config.sender.to_string(), "me@example.com");
    }

    #[test]
    fn test_sender_defaults_to_nobody() {
        let vars = envs(&[(ENV_FILE_PATH, "/tmp/out.eml")]);
        let config = Config::from_env(&vars).unwrap();
        assert_eq!(config.sender.to_string(), "nobody@localhost");
    }

    #[test]
    fn test_invalid_sender() {
        let vars = envs(&[(ENV_FILE_PATH, "/tmp/out.eml"), (ENV_FROM, "not an address")]);
        assert!(matches!(
            Config::from_env(&vars),
            Err(ConfigError::InvalidSender(_))
        ));
    }

    #[test]
    fn test_custom_shell() {
        let vars = envs(&[(ENV_FILE_PATH, "/tmp/out.eml"), (ENV_SHELL, "/bin/bash")]);
        assert_eq!(Config::from_env(&vars).unwrap().shell, "/bin/bash");
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = Config::from_env(&smtp_envs()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(verbosity_from_env(&[]).unwrap(), 0);
        assert_eq!(
            verbosity_from_env(&envs(&[(ENV_VERBOSITY, "2")])).unwrap(),
            2
        );
        assert!(verbosity_from_env(&envs(&[(ENV_VERBOSITY, "loud")])).is_err());
    }
}
