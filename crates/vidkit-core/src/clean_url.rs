//! Vendor URL normalization.
//!
//! Vendor responses append a cache-busting `updatedAt` query parameter to
//! every URL they return. Persisted asset documents must never carry it, so
//! it is stripped on every write path. All other query parameters
//! (transformations, signed-URL tokens) are preserved verbatim.

use serde_json::Value;

use crate::constants::CACHE_BUSTING_PARAM;

/// Remove the cache-busting query parameter from a vendor URL.
///
/// Unparseable input is returned unchanged. Idempotent.
pub fn clean_vendor_url(url: &str) -> String {
    if url.is_empty() {
        return url.to_string();
    }

    let mut parsed = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    if parsed.query().is_none() {
        return url.to_string();
    }

    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != CACHE_BUSTING_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if retained.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(retained.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    parsed.to_string()
}

/// Recursively clean every `url` / `thumbnailUrl` string field in a JSON value.
pub fn clean_vendor_urls_in_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key == "url" || key == "thumbnailUrl" {
                    if let Value::String(url) = entry {
                        *url = clean_vendor_url(url);
                        continue;
                    }
                }
                clean_vendor_urls_in_value(entry);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                clean_vendor_urls_in_value(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_cache_busting_param_only() {
        assert_eq!(
            clean_vendor_url("https://x/y?updatedAt=5&tag=a"),
            "https://x/y?tag=a"
        );
    }

    #[test]
    fn test_preserves_urls_without_query() {
        assert_eq!(
            clean_vendor_url("https://ik.imagekit.io/demo/video.mp4"),
            "https://ik.imagekit.io/demo/video.mp4"
        );
    }

    #[test]
    fn test_removes_query_entirely_when_nothing_remains() {
        assert_eq!(
            clean_vendor_url("https://x/y?updatedAt=1700000000"),
            "https://x/y"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = clean_vendor_url("https://x/y?updatedAt=5&tag=a&tr=w-300");
        let twice = clean_vendor_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unparseable_input_unchanged() {
        assert_eq!(clean_vendor_url("not a url"), "not a url");
        assert_eq!(clean_vendor_url(""), "");
    }

    #[test]
    fn test_cleans_nested_json_fields() {
        let mut value = json!({
            "url": "https://x/y?updatedAt=5",
            "name": "clip.mp4",
            "data": {
                "url": "https://x/y?updatedAt=5&tag=a",
                "thumbnailUrl": "https://x/t.png?updatedAt=9",
                "size": 42
            }
        });

        clean_vendor_urls_in_value(&mut value);

        assert_eq!(value["url"], "https://x/y");
        assert_eq!(value["data"]["url"], "https://x/y?tag=a");
        assert_eq!(value["data"]["thumbnailUrl"], "https://x/t.png");
        assert_eq!(value["data"]["size"], 42);
    }
}
