//! # Connection strings
//!
//! Builds the libpq-style `key=value` string handed to a driver and parses it
//! back on the driver side.
//!
//! The string always carries `sslmode=require`; transport encryption is not
//! configurable.
//!
//! ```rust
//! use dbhandle::config::DatabaseConfig;
//! use dbhandle::conninfo;
//!
//! let config = DatabaseConfig {
//!     driver: "postgres".to_string(),
//!     host: "localhost".to_string(),
//!     port: 5432,
//!     user: "u".to_string(),
//!     password: "p".to_string(),
//!     password_env: None,
//!     name: "db".to_string(),
//!     schema: "public".to_string(),
//! };
//!
//! assert_eq!(
//!     conninfo::build(&config, "p"),
//!     "host=localhost port=5432 user=u password='p' dbname=db search_path=public sslmode=require"
//! );
//! ```

use crate::config::DatabaseConfig;
use crate::error::ConnInfoError;
use std::borrow::Cow;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

/// TLS mode embedded in every connection string
pub const SSL_MODE: &str = "require";

const REDACTED_PASSWORD: &str = "'********'";

/// Format the connection string for `config` using an already resolved password
#[must_use]
pub fn build(config: &DatabaseConfig, password: &str) -> String {
    format!(
        "host={} port={} user={} password={} dbname={} search_path={} sslmode={}",
        quote_if_needed(&config.host),
        config.port,
        quote_if_needed(&config.user),
        quote(password),
        quote_if_needed(&config.name),
        quote_if_needed(&config.schema),
        SSL_MODE,
    )
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn quote_if_needed(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if needs_quotes {
        Cow::Owned(quote(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Parsed `key=value` connection string, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnInfo {
    params: Vec<(String, String)>,
}

impl ConnInfo {
    /// Value for `key`, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over all parameters in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether no parameters were given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render the parameters with the password masked, safe for logs
    #[must_use]
    pub fn redacted(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| {
                if key == "password" {
                    format!("{key}={REDACTED_PASSWORD}")
                } else {
                    format!("{key}={}", quote_if_needed(value))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ConnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

type Cursor<'a> = Peekable<CharIndices<'a>>;

fn skip_whitespace(chars: &mut Cursor<'_>) {
    while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}

fn read_keyword(chars: &mut Cursor<'_>) -> String {
    let mut keyword = String::new();
    while let Some((_, c)) = chars.next_if(|&(_, c)| c != '=' && !c.is_whitespace()) {
        keyword.push(c);
    }
    keyword
}

fn read_quoted(chars: &mut Cursor<'_>, keyword: &str) -> Result<String, ConnInfoError> {
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, '\'')) => return Ok(value),
            Some((_, '\\')) => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(ConnInfoError::UnterminatedQuote(keyword.to_string())),
            },
            Some((_, c)) => value.push(c),
            None => return Err(ConnInfoError::UnterminatedQuote(keyword.to_string())),
        }
    }
}

fn read_bare(chars: &mut Cursor<'_>) -> String {
    let mut value = String::new();
    while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
        if c == '\\' {
            if let Some((_, escaped)) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

impl FromStr for ConnInfo {
    type Err = ConnInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut chars = s.char_indices().peekable();

        loop {
            skip_whitespace(&mut chars);
            let Some(&(offset, _)) = chars.peek() else {
                break;
            };

            let keyword = read_keyword(&mut chars);
            if keyword.is_empty() {
                return Err(ConnInfoError::EmptyKeyword(offset));
            }

            skip_whitespace(&mut chars);
            if chars.next_if(|&(_, c)| c == '=').is_none() {
                return Err(ConnInfoError::MissingEquals(keyword));
            }
            skip_whitespace(&mut chars);

            let value = if chars.next_if(|&(_, c)| c == '\'').is_some() {
                read_quoted(&mut chars, &keyword)?
            } else {
                read_bare(&mut chars)
            };

            if params.iter().any(|(k, _)| *k == keyword) {
                return Err(ConnInfoError::DuplicateKeyword(keyword));
            }
            params.push((keyword, value));
        }

        Ok(Self { params })
    }
}
