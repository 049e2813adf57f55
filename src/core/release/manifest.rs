//! Manifest rewrite rules and browser version feed parsing.

use serde::Deserialize;

use crate::error::{Error, FeedMissingDataDetails, Result};
use crate::replace::ReplacementRule;

/// `$` is the only character with meaning in a replacement template.
fn literal(value: &str) -> String {
    value.replace('$', "$$")
}

/// Production rewrite of the manifest for a build of `version` whose merged
/// content script is published at `script`.
pub fn manifest_rules(script: &str, version: &str) -> Vec<ReplacementRule> {
    vec![
        ReplacementRule::new(
            r#"("content_scripts":[\s\S]*?"js":\s?\[)([\s\S]*?)(\])"#,
            format!("${{1}}\"{}\"${{3}}", literal(script)),
        ),
        ReplacementRule::new(
            r#"("version":[\s]*")[^"]*("[\s]*,)"#,
            format!("${{1}}{}${{2}}", literal(version)),
        ),
        ReplacementRule::new(r#""version_name":[^,]*,"#, ""),
        ReplacementRule::new(r"(img/icon/)dev/(.*?)\.png", "${1}${2}.webp"),
    ]
}

pub fn min_version_rule(minimum: u32) -> ReplacementRule {
    ReplacementRule::new(
        r#"("minimum_chrome_version":[\s]*")[^"]*("[\s]*,)"#,
        format!("${{1}}{}${{2}}", minimum),
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPlatform {
    pub os: String,
    #[serde(default)]
    pub versions: Vec<FeedVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedVersion {
    pub channel: String,
    pub version: String,
}

/// Which feed entry to read and how far behind it to stay.
#[derive(Debug, Clone, Copy)]
pub struct FeedQuery<'a> {
    pub url: &'a str,
    pub platform: &'a str,
    pub channel: &'a str,
    pub offset: u32,
}

impl FeedQuery<'_> {
    fn missing(&self, problem: impl Into<String>) -> Error {
        Error::feed_missing_data(FeedMissingDataDetails {
            url: self.url.to_string(),
            platform: self.platform.to_string(),
            channel: self.channel.to_string(),
            problem: problem.into(),
        })
    }
}

/// Parse the feed and compute `major(current) - offset`.
///
/// Only the first entry for the platform is consulted, and within it the
/// first entry for the channel.
pub fn minimum_version(feed: &str, query: &FeedQuery) -> Result<u32> {
    let platforms: Vec<FeedPlatform> = serde_json::from_str(feed)
        .map_err(|e| query.missing(format!("feed is not a platform list: {}", e)))?;

    let platform = platforms
        .iter()
        .find(|p| p.os == query.platform)
        .ok_or_else(|| query.missing("platform not found in feed"))?;

    let current = platform
        .versions
        .iter()
        .find(|v| v.channel == query.channel)
        .ok_or_else(|| query.missing("channel not found for platform"))?;

    let major = major_version(&current.version)
        .ok_or_else(|| query.missing(format!("unparseable version '{}'", current.version)))?;

    major
        .checked_sub(query.offset)
        .ok_or_else(|| query.missing(format!("major version {} is below offset {}", major, query.offset)))
}

fn major_version(version: &str) -> Option<u32> {
    let digits: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replace::apply_rules;

    const MANIFEST: &str = r#"{
  "manifest_version": 3,
  "name": "__MSG_extName__",
  "version": "1.0.0",
  "version_name": "Dev",
  "minimum_chrome_version": "100",
  "icons": {
    "16": "img/icon/dev/icon16.png",
    "128": "img/icon/dev/icon128.png"
  },
  "content_scripts": [
    {
      "matches": ["<all_urls>"],
      "js": ["a.js","b.js"]
    }
  ]
}"#;

    fn query(offset: u32) -> FeedQuery<'static> {
        FeedQuery {
            url: "https://feed.test/all.json",
            platform: "win64",
            channel: "stable",
            offset,
        }
    }

    const FEED: &str = r#"[
        {"os": "mac", "versions": [{"channel": "stable", "version": "99.0.1"}]},
        {"os": "win64", "versions": [
            {"channel": "beta", "version": "115.0.5790.24"},
            {"channel": "stable", "version": "114.0.5735.198"}
        ]}
    ]"#;

    #[test]
    fn rewrites_manifest_for_production() {
        let out = apply_rules(MANIFEST, &manifest_rules("js/extension.js", "2.3.1")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["version"], "2.3.1");
        assert!(value.get("version_name").is_none());
        assert_eq!(value["content_scripts"][0]["js"], serde_json::json!(["js/extension.js"]));
        assert_eq!(value["icons"]["16"], "img/icon/icon16.webp");
        assert_eq!(value["icons"]["128"], "img/icon/icon128.webp");
        assert_eq!(value["minimum_chrome_version"], "100");
    }

    #[test]
    fn rewrite_is_deterministic() {
        let rules = manifest_rules("js/extension.js", "2.3.1");
        assert_eq!(apply_rules(MANIFEST, &rules).unwrap(), apply_rules(MANIFEST, &rules).unwrap());
    }

    #[test]
    fn icon_rule_rewrites_dev_path() {
        let rules = manifest_rules("js/extension.js", "1.0.0");
        assert_eq!(
            apply_rules("img/icon/dev/icon16.png", &rules).unwrap(),
            "img/icon/icon16.webp"
        );
    }

    #[test]
    fn min_version_is_rewritten_in_place() {
        let out = apply_rules(MANIFEST, &[min_version_rule(110)]).unwrap();
        assert!(out.contains(r#""minimum_chrome_version": "110","#));
        assert!(out.contains(r#""version": "1.0.0","#));
    }

    #[test]
    fn minimum_is_stable_major_minus_offset() {
        assert_eq!(minimum_version(FEED, &query(4)).unwrap(), 110);
    }

    #[test]
    fn missing_platform_is_fatal() {
        let err = minimum_version(r#"[{"os": "linux", "versions": []}]"#, &query(4)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.details["problem"], "platform not found in feed");
    }

    #[test]
    fn missing_channel_is_fatal() {
        let feed = r#"[{"os": "win64", "versions": [{"channel": "dev", "version": "116.0"}]}]"#;
        let err = minimum_version(feed, &query(4)).unwrap_err();
        assert_eq!(err.code.as_str(), "release.feed_missing_data");
    }

    #[test]
    fn offset_larger_than_major_is_fatal() {
        let feed = r#"[{"os": "win64", "versions": [{"channel": "stable", "version": "3.0"}]}]"#;
        assert!(minimum_version(feed, &query(4)).unwrap_err().is_fatal());
    }
}
