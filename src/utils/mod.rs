use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Current UTC time as an ISO-8601 string with a `Z` suffix, the timestamp
/// format every stored record uses.
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads a string field from a JSON body, treating absent, null and empty
/// values alike.
pub fn non_empty_field(body: &Value, name: &str) -> Option<String> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_are_utc_with_z_suffix() {
        let ts = utc_now_iso();
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn empty_and_null_fields_read_as_absent() {
        let body = json!({"a": "x", "b": "", "c": null, "d": 5});
        assert_eq!(non_empty_field(&body, "a").as_deref(), Some("x"));
        assert_eq!(non_empty_field(&body, "b"), None);
        assert_eq!(non_empty_field(&body, "c"), None);
        assert_eq!(non_empty_field(&body, "d"), None);
        assert_eq!(non_empty_field(&body, "missing"), None);
    }
}
