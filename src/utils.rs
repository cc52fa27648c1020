use crate::FetchError;
use std::time::Duration;
use url::Url;

/// Short form used for pauses: `500ms`, `2.5s` or `1m 5s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Elapsed time with two decimals, as used in run reports
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Parse an API base URL, accepting only http and https
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url)
        .map_err(|e| FetchError::Configuration(format!("invalid base URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchError::Configuration(format!(
            "unsupported URL scheme '{scheme}' in '{url}', expected http or https"
        ))),
    }
}
