//! Structured logging hooks for the handle lifecycle.
//!
//! The `log_metric!` macro renders key-value pairs as a one-line JSON-ish record
//! and hands it to the `log` facade at debug level. Formatting is skipped when
//! debug logging is disabled.

/// Logs a structured key-value metric string at debug level.
///
/// # Example
/// ```ignore
/// log_metric!("event"="open", "file"=&filename, "sfhref"=sfhref);
/// ```
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("SFH_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
