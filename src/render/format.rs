//! Locale-aware display formatting for counts and dates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display locale for counts and dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// `1,234,567` and `3/15/2024`.
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    /// `1,234,567` and `15/03/2024`.
    #[serde(rename = "en-GB")]
    EnGb,
    /// `1.234.567` and `15.3.2024`.
    #[serde(rename = "de-DE")]
    DeDe,
    /// `1 234 567` (narrow no-break space) and `15/03/2024`.
    #[serde(rename = "fr-FR")]
    FrFr,
}

/// A locale tag that is not supported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl Locale {
    /// BCP 47 tag of this locale.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
        }
    }

    /// Primary language subtag, for the `lang` attribute.
    #[must_use]
    pub fn language(self) -> &'static str {
        match self {
            Self::EnUs | Self::EnGb => "en",
            Self::DeDe => "de",
            Self::FrFr => "fr",
        }
    }

    fn group_separator(self) -> &'static str {
        match self {
            Self::EnUs | Self::EnGb => ",",
            Self::DeDe => ".",
            Self::FrFr => "\u{202f}",
        }
    }

    fn date_pattern(self) -> &'static str {
        match self {
            Self::EnUs => "%-m/%-d/%Y",
            Self::EnGb | Self::FrFr => "%d/%m/%Y",
            Self::DeDe => "%-d.%-m.%Y",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::EnUs),
            "en-gb" => Ok(Self::EnGb),
            "de" | "de-de" => Ok(Self::DeDe),
            "fr" | "fr-fr" => Ok(Self::FrFr),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// Format a count with the locale's digit grouping.
#[must_use]
pub fn format_count(n: u64, locale: Locale) -> String {
    let digits = n.to_string();
    let separator = locale.group_separator();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Format a timestamp as the locale's short date.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates, using the UTC
/// calendar day. Empty or unparsable input yields an empty string.
#[must_use]
pub fn format_date(timestamp: &str, locale: Locale) -> String {
    parse_day(timestamp.trim())
        .map(|day| day.format(locale.date_pattern()).to_string())
        .unwrap_or_default()
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
