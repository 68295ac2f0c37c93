use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::{
    consts::TOTP_PERIOD_SECS,
    error::{Result, SafeApiError},
};

/// Validates a user supplied address and returns it parsed.
///
/// Accepts any casing; the returned [Address] displays as EIP-55.
pub fn normalize_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .filter(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));

    match hex {
        Some(_) => trimmed.parse().map_err(|_| SafeApiError::InvalidAddress(input.to_string())),
        None => Err(SafeApiError::InvalidAddress(input.to_string())),
    }
}

/// The hour bucket the transaction service expects as `totp`.
pub fn authorization_token(unix_seconds: u64) -> u64 {
    unix_seconds / TOTP_PERIOD_SECS
}

/// Shortens a hex string to `0x` + `start` chars + `...` + `end` chars.
pub fn shorten_hex(value: &str, start: usize, end: usize) -> String {
    if value.len() <= start + end + 2 {
        return value.to_string();
    }
    format!("{}...{}", &value[..start + 2], &value[value.len() - end..])
}

/// Human readable age of `date` relative to `now`, e.g. `2d3h`, `4h12m`, `7m`.
pub fn format_age(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(date) = date else {
        return "--".to_string();
    };

    let elapsed = now.signed_duration_since(date);
    if elapsed.num_milliseconds() < 0 {
        return "--".to_string();
    }

    let minutes = elapsed.num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        return match hours % 24 {
            0 => format!("{}d", days),
            h => format!("{}d{}h", days, h),
        };
    }
    if hours > 0 {
        return format!("{}h{}m", hours, minutes % 60);
    }
    format!("{}m", minutes)
}

/// Deserializes a `u64` sent either as a JSON number or a decimal string.
pub(crate) fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
    }
}
