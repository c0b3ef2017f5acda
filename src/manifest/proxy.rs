// ABOUTME: Reverse-proxy notifier settings in the release manifest.
// ABOUTME: Points at the nginx include file and the reload command to run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySpec {
    /// Upstream block name. Defaults to the service name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// File the rendered upstream block is written to, typically an nginx
    /// include under conf.d.
    pub config_path: PathBuf,

    /// Shell command that makes the proxy pick up the new config.
    #[serde(default = "default_reload_command")]
    pub reload_command: String,
}

fn default_reload_command() -> String {
    "nginx -s reload".to_string()
}
