//! String formats understood by Kubernetes schemas
//!
//! Formats are registered with the JSON Schema validator under a `k8s-`
//! prefix so they replace the validator's own interpretation. Formats not
//! listed here are ignored, as they are by the API server.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::duration::parse_format_duration;

/// Prefix used when handing formats to the JSON Schema validator
pub const FORMAT_PREFIX: &str = "k8s-";

pub type FormatCheck = fn(&str) -> bool;

static FORMATS: &[(&str, FormatCheck)] = &[
    ("byte", is_byte),
    ("cidr", is_cidr),
    ("date", is_date),
    ("date-time", is_date_time),
    ("datetime", is_date_time),
    ("duration", is_duration),
    ("email", is_email),
    ("hostname", is_hostname),
    ("int-or-string", is_int_or_string),
    ("ipv4", is_ipv4),
    ("ipv6", is_ipv6),
    ("mac", is_mac),
    ("uri", is_uri),
    ("uuid", is_uuid),
    ("uuid3", is_uuid),
    ("uuid4", is_uuid),
    ("uuid5", is_uuid),
];

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.?$")
        .expect("valid regex")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12}$")
        .expect("valid regex")
});

static MAC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$|^([0-9A-Fa-f]{2}[:-]){7}[0-9A-Fa-f]{2}$|^([0-9A-Fa-f]{2}[:-]){19}[0-9A-Fa-f]{2}$|^([0-9A-Fa-f]{4}\.){2}[0-9A-Fa-f]{4}$",
    )
    .expect("valid regex")
});

/// The checker for a schema format, if it is one the API server validates
pub fn lookup(format: &str) -> Option<FormatCheck> {
    FORMATS
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, check)| *check)
}

pub fn all() -> impl Iterator<Item = (&'static str, FormatCheck)> {
    FORMATS.iter().copied()
}

fn is_byte(value: &str) -> bool {
    STANDARD.decode(value).is_ok()
}

fn is_cidr(value: &str) -> bool {
    let Some((ip, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_duration(value: &str) -> bool {
    parse_format_duration(value).is_some()
}

fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

fn is_hostname(value: &str) -> bool {
    value.len() <= 255 && HOSTNAME.is_match(value)
}

fn is_int_or_string(_: &str) -> bool {
    true
}

fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

fn is_mac(value: &str) -> bool {
    MAC.is_match(value)
}

fn is_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

fn is_uuid(value: &str) -> bool {
    UUID.is_match(value)
}
