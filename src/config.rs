//! Configuration from environment variables, optionally seeded from a `.env` file.
//!
//! | Variable | Default | Used by |
//! |---|---|---|
//! | `WAYPOST_ADDR` | `0.0.0.0:8080` | every server binary |
//! | `DBUSER`, `DBPASS`, `DBNAME` | required | `albums`, `todo` |
//! | `DBHOST` | required, `host`, `host:port`, `[v6]` or `[v6]:port` | `albums`, `todo` |
//! | `DB_CA_CERT` | `/etc/ssl/cert.pem` | `albums`, `todo` |
//! | `WIKI_DIR` | `.` | `wiki` |
//!
//! Every loader has a `from_lookup` twin taking the variable source as a
//! closure, so tests never touch the process environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CA_CERT: &str = "/etc/ssl/cert.pem";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Loads `.env` from the working directory or its parents. A missing file is
/// not an error.
pub fn load_dotenv() -> Result<(), Error> {
    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, Error> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(Error::MissingEnv(name))
}

/// Where a server binary listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let raw = lookup("WAYPOST_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr = raw.parse().map_err(|_| Error::InvalidEnv { name: "WAYPOST_ADDR", value: raw.clone() })?;
        Ok(Self { addr })
    }
}

/// MySQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// PEM bundle used to verify the server certificate.
    pub ca_cert: PathBuf,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let user = required(&lookup, "DBUSER")?;
        let password = lookup("DBPASS").unwrap_or_default();
        let name = required(&lookup, "DBNAME")?;
        let raw_host = required(&lookup, "DBHOST")?;

        let (host, port) = split_host_port(&raw_host)?;

        let ca_cert = lookup("DB_CA_CERT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CA_CERT));

        Ok(Self { user, password, host, port, name, ca_cert })
    }
}

/// Splits `DBHOST`. An IPv6 address takes a port only in brackets; a bare
/// one such as `::1` is the whole host, on the default port.
fn split_host_port(raw: &str) -> Result<(String, u16), Error> {
    let invalid = || Error::InvalidEnv { name: "DBHOST", value: raw.to_owned() };

    let (host, port) = match raw.strip_prefix('[') {
        Some(rest) => {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, None),
                _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        }
        None => match raw.split_once(':') {
            Some((host, port)) if !port.contains(':') => (host, Some(port)),
            _ => (raw, None),
        },
    };

    if host.is_empty() {
        return Err(invalid());
    }
    let port = match port {
        Some(port) => port.parse().map_err(|_| invalid())?,
        None => DEFAULT_MYSQL_PORT,
    };
    Ok((host.to_owned(), port))
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("ca_cert", &self.ca_cert)
            .finish()
    }
}

/// Directory the wiki keeps its `<title>.txt` pages in.
pub fn wiki_dir_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("WIKI_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

pub fn wiki_dir() -> PathBuf {
    wiki_dir_from_lookup(env)
}
