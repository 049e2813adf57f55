use crate::error::{Error, Result};

/// Parse and re-serialize without whitespace. Key order is preserved.
pub fn minify_json(source: &str, origin: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| Error::minify_failed(origin, e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| Error::internal_json(e.to_string(), Some(origin.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_keeps_key_order() {
        let source = "{\n  \"name\": \"__MSG_name__\",\n  \"version\": \"1.0.0\",\n  \"a\": [1, 2]\n}\n";
        assert_eq!(
            minify_json(source, "manifest.json").unwrap(),
            r#"{"name":"__MSG_name__","version":"1.0.0","a":[1,2]}"#
        );
    }

    #[test]
    fn invalid_json_is_a_minify_error() {
        let err = minify_json("{ \"a\": }", "_locales/en/messages.json").unwrap_err();
        assert_eq!(err.code.as_str(), "minify.failed");
        assert_eq!(err.details["path"], "_locales/en/messages.json");
    }
}
