// ABOUTME: Validated container/service name following RFC 1123 label rules.
// ABOUTME: Used for container naming, lock files, and proxy upstream names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerNameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name exceeds 63 characters")]
    TooLong,

    #[error("name must start and end with an alphanumeric character")]
    BadBoundary,

    #[error("invalid character in name: '{0}' (allowed: lowercase alphanumeric and '-')")]
    InvalidChar(char),
}

/// The name a release deploys under. Doubles as the container name prefix,
/// the lock file name, and the default proxy upstream name, so it is held to
/// DNS label rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        if value.is_empty() {
            return Err(ContainerNameError::Empty);
        }
        if value.len() > 63 {
            return Err(ContainerNameError::TooLong);
        }

        let first = value.chars().next().unwrap_or('-');
        let last = value.chars().last().unwrap_or('-');
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(ContainerNameError::BadBoundary);
        }

        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(ContainerNameError::InvalidChar(bad));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ContainerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContainerName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ContainerName::new(&raw).map_err(serde::de::Error::custom)
    }
}
