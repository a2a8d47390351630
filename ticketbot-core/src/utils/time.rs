use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Timestamp format used in staff notifications.
pub const NOTIFICATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a UTC instant as wall-clock time in `tz`.
pub fn format_in_timezone(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(NOTIFICATION_FORMAT).to_string()
}
