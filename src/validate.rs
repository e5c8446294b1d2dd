//! Format rules shared by the record plugins.
//!
//! These are deliberately plain string checks: zone definitions are written
//! by hand, and each rule here corresponds to a mistake worth reporting with
//! the offending value in the message.

use std::net::{IpAddr, Ipv4Addr};

/// Classes accepted in the optional class column. The empty string means "no class".
pub const CLASSES: [&str; 5] = ["IN", "CS", "CH", "HS", ""];

/// Stand-in for the zone origin, always accepted as a record name.
pub const WILDCARD: &str = "@";

const MAX_LABEL_LENGTH: usize = 63;
const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("value/comment and values are mutually exclusive")]
    ValueConflict,

    #[error("{rtype} record expects a single value")]
    ExpectedSingle { rtype: String },

    #[error("{rtype} record expects a list of values")]
    ExpectedMulti { rtype: String },

    #[error("invalid class '{0}', expected one of IN, CS, CH, HS")]
    InvalidClass(String),

    #[error("invalid domain name '{0}'")]
    InvalidName(String),

    #[error("invalid IP address '{0}'")]
    InvalidAddress(String),

    #[error("'{0}' is not an IPv4 address")]
    NotIpv4(String),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("{field} must be a non-negative integer, found '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    #[error("expected {expected} values, found {found}")]
    WrongValueCount { expected: &'static str, found: usize },
}

/// Check the optional class column.
pub fn check_class(class: Option<&str>) -> Result<(), ValidationError> {
    match class {
        Some(class) if !CLASSES.contains(&class) => {
            Err(ValidationError::InvalidClass(class.to_owned()))
        }
        _ => Ok(()),
    }
}

/// RFC 1035 name syntax, with an optional trailing dot.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }

    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return false;
    }

    name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// A valid name, or the `@` origin wildcard.
pub fn is_valid_name_or_wildcard(name: &str) -> bool {
    name == WILDCARD || is_valid_name(name)
}

/// A valid name that ends in a dot and contains at least two dots.
pub fn is_fully_qualified(name: &str) -> bool {
    is_valid_name(name) && name.ends_with('.') && name.matches('.').count() >= 2
}

pub fn check_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(name.to_owned()))
    }
}

pub fn check_name_or_wildcard(name: &str) -> Result<(), ValidationError> {
    if is_valid_name_or_wildcard(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(name.to_owned()))
    }
}

pub fn is_ip_address(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Parse an A record address. IPv6 addresses are reported separately from
/// values that are not addresses at all.
pub fn parse_ipv4(value: &str) -> Result<Ipv4Addr, ValidationError> {
    if !is_ip_address(value) {
        return Err(ValidationError::InvalidAddress(value.to_owned()));
    }
    value
        .parse()
        .map_err(|_| ValidationError::NotIpv4(value.to_owned()))
}

/// Convert an administrator email address to its SOA name form.
///
/// Dots in the local part are escaped, the `@` becomes a label separator and a
/// trailing dot is added: `first.last@example.com` becomes
/// `first\.last.example.com.`. Input without an `@` is taken to already be in
/// name form and only gains the trailing dot.
pub fn format_soa_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let mut formatted = match email.split_once('@') {
        Some((local_part, domain)) => {
            if local_part.is_empty() || !is_valid_name(domain) {
                return Err(ValidationError::InvalidEmail(email.to_owned()));
            }
            format!("{}.{domain}", local_part.replace('.', r"\."))
        }
        None if email.is_empty() => return Err(ValidationError::InvalidEmail(email.to_owned())),
        None => email.to_owned(),
    };

    if !formatted.ends_with('.') {
        formatted.push('.');
    }
    Ok(formatted)
}

/// Timer fields (refresh, retry, expire, minimum) and explicit serials.
pub fn check_non_negative_integer(field: &'static str, value: &str) -> Result<u32, ValidationError> {
    value.parse().map_err(|_| ValidationError::NotAnInteger {
        field,
        value: value.to_owned(),
    })
}
