use regex::Regex;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("MAC address is empty")]
    EmptyMac,
    #[error("MAC address must be six hex pairs (e.g. 00:11:22:aa:bb:cc)")]
    InvalidMac,
    #[error("property must be given as key=value")]
    MissingEquals,
    #[error("property key is empty")]
    EmptyKey,
    #[error("property keys and values must not contain '|'")]
    PipeInProperty,
}

lazy_static::lazy_static! {
    /// Six hex pairs with a consistent ':' or '-' separator, or none at all
    static ref MAC_RE: Regex =
        Regex::new(r"^(?:[0-9a-fA-F]{2}(?:([:-])[0-9a-fA-F]{2}){5}|[0-9a-fA-F]{12})$").unwrap();
}

/// Normalize a MAC address to lowercase colon notation.
pub fn validate_mac(mac: &str) -> Result<String, InputError> {
    let mac = mac.trim();
    if mac.is_empty() {
        return Err(InputError::EmptyMac);
    }
    if !MAC_RE.is_match(mac) {
        return Err(InputError::InvalidMac);
    }
    let separators = mac.matches([':', '-']).collect::<Vec<_>>();
    if separators.windows(2).any(|w| w[0] != w[1]) {
        return Err(InputError::InvalidMac);
    }

    let hex: String = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let pairs: Vec<&str> = (0..6).map(|i| &hex[i * 2..i * 2 + 2]).collect();
    Ok(pairs.join(":"))
}

/// Parse one `-p key=value` override. The value may be empty.
pub fn parse_property_override(raw: &str) -> Result<(String, String), InputError> {
    let (key, value) = raw.split_once('=').ok_or(InputError::MissingEquals)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(InputError::EmptyKey);
    }
    if key.contains('|') || value.contains('|') {
        return Err(InputError::PipeInProperty);
    }
    Ok((key.to_string(), value.to_string()))
}
