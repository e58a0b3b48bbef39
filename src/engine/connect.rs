//! Connection parameters and connection-string parsing.
//!
//! Connection strings are `key=value` pairs separated by `;`, e.g.
//! `database=localhost:/var/db/test.fdb; username=sysdba; timezone=-07:00;`.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::engine::constants::DEFAULT_PAGE_SIZE;
use crate::error::{Error, Result};

/// Time zone attached to DATE, TIME and TIMESTAMP values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
    /// An IANA zone such as `US/Arizona`, with its daylight saving rules.
    Named(Tz),
}

impl Zone {
    /// Zone for UTC.
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Attach this zone to a local date and time.
    ///
    /// An ambiguous local time (a DST fall-back) takes the earlier instant.
    /// Returns `None` for a local time skipped by a DST gap.
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Fixed(offset) => offset.from_local_datetime(naive).single(),
            Zone::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::utc()
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Named(tz)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fixed(offset) => write!(f, "{}", offset),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    /// Database location, optionally prefixed with `host:`.
    pub database: String,
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Connection character set, empty if unset.
    pub charset: String,
    /// SQL role, empty if unset.
    pub role: String,
    /// Time zone as written in the connection string, empty if unset.
    pub time_zone_name: String,
    /// Default time zone attached to DATE/TIME/TIMESTAMP values (default: UTC).
    pub time_zone: Zone,
    /// Fold column names to lowercase.
    pub lowercase_names: bool,
    /// Page size for newly created databases, if set.
    pub page_size: Option<u32>,
}

impl ConnectParams {
    /// Create new connection parameters for a database location.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            username: String::new(),
            password: String::new(),
            charset: String::new(),
            role: String::new(),
            time_zone_name: String::new(),
            time_zone: Zone::utc(),
            lowercase_names: false,
            page_size: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set the default time zone.
    ///
    /// # Example
    ///
    /// ```
    /// use dbcursor::ConnectParams;
    /// use chrono::FixedOffset;
    ///
    /// let params = ConnectParams::new("/tmp/test.db")
    ///     .with_time_zone(FixedOffset::west_opt(7 * 3600).unwrap());
    /// assert_eq!(params.time_zone_name, "-07:00");
    /// ```
    pub fn with_time_zone(mut self, time_zone: impl Into<Zone>) -> Self {
        let time_zone = time_zone.into();
        self.time_zone_name = time_zone.to_string();
        self.time_zone = time_zone;
        self
    }

    pub fn with_lowercase_names(mut self, lowercase_names: bool) -> Self {
        self.lowercase_names = lowercase_names;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Parse a connection string.
    ///
    /// Keys are case-insensitive; unknown keys are ignored.
    pub fn parse(conn_str: &str) -> Result<Self> {
        let map = parse_connection_string(conn_str)?;
        let database = map.get("database").ok_or_else(|| Error::InvalidConnectString {
            message: "Missing key: database".to_string(),
        })?;

        let mut params = Self::new(database.clone());
        for (key, value) in &map {
            match key.as_str() {
                "database" => {}
                "username" | "user" => params.username = value.clone(),
                "password" => params.password = value.clone(),
                "charset" => params.charset = value.clone(),
                "role" => params.role = value.clone(),
                "timezone" => {
                    params.time_zone = parse_time_zone(value)?;
                    params.time_zone_name = value.clone();
                }
                "lowercase_names" => params.lowercase_names = parse_bool(key, value)?,
                "page_size" => {
                    let size = value.parse::<u32>().map_err(|_| Error::InvalidConnectString {
                        message: format!("Invalid page_size: {}", value),
                    })?;
                    params.page_size = Some(size);
                }
                _ => debug!(key = %key, "ignoring unknown connection string key"),
            }
        }
        Ok(params)
    }

    /// Host part of `database`, if it has one.
    pub fn host(&self) -> Option<&str> {
        self.split_database().0
    }

    /// Path part of `database`.
    pub fn path(&self) -> &str {
        self.split_database().1
    }

    fn split_database(&self) -> (Option<&str>, &str) {
        match self.database.split_once(':') {
            // A single letter is a drive, not a host.
            Some((host, path))
                if host.len() > 1 && !host.contains(['/', '\\']) && !path.is_empty() =>
            {
                (Some(host), path)
            }
            _ => (None, &self.database),
        }
    }

    /// Build the `CREATE DATABASE` statement for these parameters.
    pub fn create_statement(&self) -> String {
        let mut stmt = format!(
            "CREATE DATABASE '{}' USER '{}' PASSWORD '{}' PAGE_SIZE = {}",
            self.database,
            self.username,
            self.password,
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
        );
        if !self.charset.is_empty() {
            stmt.push_str(" DEFAULT CHARACTER SET ");
            stmt.push_str(&self.charset);
        }
        stmt.push(';');
        stmt
    }
}

/// Split a connection string into a key/value map.
///
/// Keys are lowercased; keys and values are trimmed. Empty segments are
/// skipped, so a trailing `;` is fine.
pub fn parse_connection_string(conn_str: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for part in conn_str.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').ok_or_else(|| Error::InvalidConnectString {
            message: format!("Expected key=value, got: {}", part),
        })?;
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(Error::InvalidConnectString {
                message: format!("Empty key in: {}", part),
            });
        }
        map.insert(key, value.trim().to_string());
    }
    Ok(map)
}

/// Parse a time zone.
///
/// Accepts `UTC`, `GMT`, `Z`, a fixed offset (`+07:00`, `-0700`, `+07`) or
/// an IANA zone name (`US/Arizona`, `Europe/Berlin`).
pub fn parse_time_zone(zone: &str) -> Result<Zone> {
    let trimmed = zone.trim();
    if let Some(offset) = parse_offset(trimmed) {
        return Ok(Zone::Fixed(offset));
    }
    trimmed
        .parse::<Tz>()
        .map(Zone::Named)
        .map_err(|_| Error::InvalidTimeZone {
            zone: zone.to_string(),
        })
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if zone.eq_ignore_ascii_case("utc") || zone.eq_ignore_ascii_case("gmt") || zone == "Z" {
        return Some(Utc.fix());
    }

    let (sign, rest) = match zone.as_bytes().first() {
        Some(b'+') => (1, &zone[1..]),
        Some(b'-') => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConnectString {
            message: format!("Invalid boolean for {}: {}", key, value),
        }),
    }
}
