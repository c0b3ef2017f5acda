// ABOUTME: Port binding parsing for "host:container[/proto]" manifest entries.
// ABOUTME: Validates both port numbers against the 1-65535 range.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortBindingError {
    #[error("port binding must be of the form \"host:container[/proto]\", got \"{0}\"")]
    BadFormat(String),

    #[error("port \"{0}\" is not a number within 1-65535")]
    OutOfRange(String),

    #[error("unknown protocol \"{0}\" (expected tcp or udp)")]
    BadProtocol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// One host-to-container port mapping, ordered as written in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortBinding {
    pub host: u16,
    pub container: u16,
    pub protocol: Protocol,
}

fn parse_port(raw: &str) -> Result<u16, PortBindingError> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(PortBindingError::OutOfRange(raw.to_string())),
        Ok(n) => Ok(n),
    }
}

impl FromStr for PortBinding {
    type Err = PortBindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ports, protocol) = match s.split_once('/') {
            Some((p, "tcp")) => (p, Protocol::Tcp),
            Some((p, "udp")) => (p, Protocol::Udp),
            Some((_, proto)) => return Err(PortBindingError::BadProtocol(proto.to_string())),
            None => (s, Protocol::Tcp),
        };

        let Some((host, container)) = ports.split_once(':') else {
            return Err(PortBindingError::BadFormat(s.to_string()));
        };

        Ok(Self {
            host: parse_port(host)?,
            container: parse_port(container)?,
            protocol,
        })
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)?;
        if self.protocol == Protocol::Udp {
            write!(f, "/udp")?;
        }
        Ok(())
    }
}

impl Serialize for PortBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortBinding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
