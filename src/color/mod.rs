//! Color-string normalization shared by the inventory normalizer and the
//! requirement matcher.
//!
//! Telemetry reports slot colors as 6- or 8-digit hex strings, with or
//! without a leading `#` marker; slicer metadata uses the same format.
//! Matching compares the normalized form: marker stripped, alpha channel
//! discarded, 6 uppercase hex digits. Anything that does not parse
//! normalizes to `None` and therefore never color-matches: a malformed
//! color falls through to the type-only tier instead of erroring.

/// Normalize a raw color string to its canonical 6-hex-digit uppercase
/// form.
///
/// Accepts `RRGGBB` and `RRGGBBAA`, optionally prefixed with `#`. The
/// alpha channel, if present, is discarded. Returns `None` for strings
/// that are too short, too long, or contain non-hex characters.
///
/// # Examples
///
/// ```
/// use traymap::color::normalize_color;
///
/// assert_eq!(normalize_color("#00ae42ff"), Some("00AE42".to_string()));
/// assert_eq!(normalize_color("00AE42"), Some("00AE42".to_string()));
/// assert_eq!(normalize_color("red"), None);
/// ```
pub fn normalize_color(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !(6..=8).contains(&hex.len()) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex[..6].to_ascii_uppercase())
}

/// Whether a loaded slot's (already normalized) color equals a raw
/// required color. A colorless slot never matches.
pub fn colors_match(loaded: Option<&str>, required: &str) -> bool {
    match (loaded, normalize_color(required)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
