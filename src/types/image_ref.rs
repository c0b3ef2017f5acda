// ABOUTME: Parsed container image reference (registry/name:tag@digest).
// ABOUTME: Normalizes bare references by defaulting the tag to "latest".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: '{0}'")]
    InvalidChar(char),

    #[error("image reference has an empty tag")]
    EmptyTag,

    #[error("image reference has an empty digest")]
    EmptyDigest,
}

/// A container image reference such as `nginx`, `app:v2`, or
/// `registry.example.com:5000/team/app:v2@sha256:...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    registry: Option<String>,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageRefError::Empty);
        }
        if let Some(bad) = input.chars().find(|c| {
            !(c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '-' | '_' | '@'))
        }) {
            return Err(ImageRefError::InvalidChar(bad));
        }

        let (rest, digest) = match input.rsplit_once('@') {
            Some((_, d)) if d.is_empty() => return Err(ImageRefError::EmptyDigest),
            Some((r, d)) => (r, Some(d.to_string())),
            None => (input, None),
        };

        // A trailing colon segment is a tag only when it contains no slash;
        // otherwise the colon belongs to a registry port.
        let (rest, tag) = match rest.rsplit_once(':') {
            Some((r, t)) if !t.contains('/') => {
                if t.is_empty() {
                    return Err(ImageRefError::EmptyTag);
                }
                (r, Some(t.to_string()))
            }
            _ => (rest, None),
        };

        // The first path segment is a registry when it looks like a host:
        // contains a dot or port, or is exactly "localhost".
        let (registry, repository) = match rest.split_once('/') {
            Some((head, tail))
                if head.contains('.') || head.contains(':') || head == "localhost" =>
            {
                (Some(head.to_string()), tail.to_string())
            }
            _ => (None, rest.to_string()),
        };

        // Bare references get an explicit tag so two loads of the same
        // manifest always compare equal.
        let tag = match (tag, &digest) {
            (None, None) => Some("latest".to_string()),
            (t, _) => t,
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageRef::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_latest() {
        let r = ImageRef::parse("nginx").unwrap();
        assert_eq!(r.repository(), "nginx");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.registry(), None);
        assert_eq!(r.to_string(), "nginx:latest");
    }

    #[test]
    fn name_and_tag() {
        let r = ImageRef::parse("app:v2").unwrap();
        assert_eq!(r.repository(), "app");
        assert_eq!(r.tag(), Some("v2"));
    }

    #[test]
    fn registry_with_port() {
        let r = ImageRef::parse("registry.example.com:5000/team/app:v2").unwrap();
        assert_eq!(r.registry(), Some("registry.example.com:5000"));
        assert_eq!(r.repository(), "team/app");
        assert_eq!(r.tag(), Some("v2"));
    }

    #[test]
    fn namespaced_without_registry() {
        let r = ImageRef::parse("library/nginx").unwrap();
        assert_eq!(r.registry(), None);
        assert_eq!(r.repository(), "library/nginx");
    }

    #[test]
    fn localhost_is_a_registry() {
        let r = ImageRef::parse("localhost/app:dev").unwrap();
        assert_eq!(r.registry(), Some("localhost"));
        assert_eq!(r.repository(), "app");
    }

    #[test]
    fn digest_without_tag_stays_untagged() {
        let r = ImageRef::parse("app@sha256:abcd").unwrap();
        assert_eq!(r.tag(), None);
        assert_eq!(r.digest(), Some("sha256:abcd"));
        assert_eq!(r.to_string(), "app@sha256:abcd");
    }

    #[test]
    fn rejects_empty_and_bad_chars() {
        assert_eq!(ImageRef::parse(""), Err(ImageRefError::Empty));
        assert_eq!(ImageRef::parse("app image"), Err(ImageRefError::InvalidChar(' ')));
        assert_eq!(ImageRef::parse("app:"), Err(ImageRefError::EmptyTag));
    }

    #[test]
    fn display_round_trips() {
        for input in ["app:v2", "ghcr.io/acme/app:v2", "app@sha256:abcd"] {
            let parsed = ImageRef::parse(input).unwrap();
            let reparsed = ImageRef::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed);
        }
    }
}
