//! Product metadata read from the project's `package.json`.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;

pub const PACKAGE_FILENAME: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub license: Option<String>,
}

#[derive(Deserialize)]
struct RawPackage {
    name: Option<String>,
    version: Option<String>,
    author: Option<Value>,
    license: Option<String>,
}

impl PackageInfo {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PACKAGE_FILENAME);
        let content = io::read_file(&path, "read package.json")?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, source: &str) -> Result<Self> {
        let raw: RawPackage = serde_json::from_str(content)
            .map_err(|e| Error::config_invalid_json(source, e))?;

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::config_missing_key("name", Some(source.to_string())))?;

        let version = raw
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config_missing_key("version", Some(source.to_string())))?;

        semver::Version::parse(&version).map_err(|e| {
            Error::config_invalid_value("version", Some(version.clone()), e.to_string())
        })?;

        // npm allows "Name <mail> (url)" strings or { "name": ... } objects.
        let author = raw.author.and_then(|a| match a {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("name").and_then(|n| n.as_str()).map(String::from),
            _ => None,
        });

        Ok(Self {
            name,
            version,
            author,
            license: raw.license,
        })
    }

    /// `<name>_<version>.zip`
    pub fn archive_name(&self) -> String {
        format!("{}_{}.zip", self.name, self.version)
    }

    /// License banner prepended to minified scripts, when both parts are known.
    pub fn banner(&self) -> Option<String> {
        match (&self.author, &self.license) {
            (Some(author), Some(license)) => {
                Some(format!("/*! (c) {} under {} */\n", author, license))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_version_and_string_author() {
        let info = PackageInfo::parse(
            r#"{ "name": "bookmark-sidebar", "version": "1.19.3", "author": "Philipp König", "license": "GPL-3.0" }"#,
            "package.json",
        )
        .unwrap();

        assert_eq!(info.archive_name(), "bookmark-sidebar_1.19.3.zip");
        assert_eq!(
            info.banner().unwrap(),
            "/*! (c) Philipp König under GPL-3.0 */\n"
        );
    }

    #[test]
    fn author_object_uses_name_field() {
        let info = PackageInfo::parse(
            r#"{ "name": "ext", "version": "2.0.0", "author": { "name": "Jane", "email": "j@x.io" } }"#,
            "package.json",
        )
        .unwrap();
        assert_eq!(info.author.as_deref(), Some("Jane"));
        assert_eq!(info.banner(), None);
    }

    #[test]
    fn missing_version_is_reported() {
        let err = PackageInfo::parse(r#"{ "name": "ext" }"#, "package.json").unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
        assert_eq!(err.details["key"], "version");
    }

    #[test]
    fn non_semver_version_is_rejected() {
        let err = PackageInfo::parse(r#"{ "name": "ext", "version": "1.2" }"#, "package.json")
            .unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }
}
