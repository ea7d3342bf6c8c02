//! Client identity resolution from proxy headers

use std::collections::HashMap;

/// Shared bucket for requests that arrive with no usable address header.
/// Unidentified clients sharing one budget is intentional.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Proxy-supplied address headers, most trustworthy first
const IDENTITY_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Resolve a client identity from request headers.
///
/// Walks the header priority list, taking the first non-empty value; for
/// comma-separated lists (`x-forwarded-for`) the first hop wins. Header name
/// matching is case-insensitive.
pub fn resolve_identity(headers: &HashMap<String, String>) -> String {
    for name in IDENTITY_HEADERS {
        let value = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value);
        if let Some(raw) = value {
            let candidate = raw.split(',').next().unwrap_or("").trim();
            if !candidate.is_empty() {
                return candidate.to_string();
            }
        }
    }
    UNKNOWN_IDENTITY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_priority_order() {
        let resolved = resolve_identity(&headers(&[
            ("x-forwarded-for", "9.9.9.9"),
            ("cf-connecting-ip", "1.1.1.1"),
        ]));
        assert_eq!(resolved, "1.1.1.1");
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let resolved = resolve_identity(&headers(&[("x-forwarded-for", "2.2.2.2, 10.0.0.1")]));
        assert_eq!(resolved, "2.2.2.2");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let resolved = resolve_identity(&headers(&[("X-Real-IP", "3.3.3.3")]));
        assert_eq!(resolved, "3.3.3.3");
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(resolve_identity(&headers(&[])), UNKNOWN_IDENTITY);
        assert_eq!(
            resolve_identity(&headers(&[("x-forwarded-for", "  ")])),
            UNKNOWN_IDENTITY
        );
    }
}
