/// Utility functions for timestamp formatting and value rounding
use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime};

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    format_with(dt, "[day].[month].[year] - [hour]:[minute]:[second]")
}

/// Calendar date of a reading, DD.MM.YYYY
pub fn format_date(dt: &OffsetDateTime) -> String {
    format_with(dt, "[day].[month].[year]")
}

/// Wall-clock time of a reading, HH:MM
pub fn format_time(dt: &OffsetDateTime) -> String {
    format_with(dt, "[hour]:[minute]")
}

/// Machine-readable timestamp for published payloads
pub fn format_rfc3339(dt: &OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

fn format_with(dt: &OffsetDateTime, description: &str) -> String {
    match format_description::parse(description) {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Round to a fixed number of decimal places for display and publishing
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Topic-safe form of a user identifier (`a.b@c.d` -> `a_b_at_c_d`)
pub fn sanitize_user(user: &str) -> String {
    user.replace('@', "_at_").replace('.', "_")
}

/// Topic-safe form of a device address (`AA:BB` -> `AA_BB`)
pub fn sanitize_address(address: &str) -> String {
    address.replace(':', "_")
}
