// ABOUTME: Writes a starter relevo.yml into a directory.
// ABOUTME: Refuses to overwrite an existing manifest unless forced.

use super::{MANIFEST_FILENAME, ManifestError};
use crate::types::{ContainerName, ImageRef};
use std::path::{Path, PathBuf};

/// Create a starter manifest in `dir` and return its path.
pub fn init_manifest(
    dir: &Path,
    service: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<PathBuf, ManifestError> {
    let path = dir.join(MANIFEST_FILENAME);
    if path.exists() && !force {
        return Err(ManifestError::AlreadyExists(path));
    }

    // Validate overrides before writing anything.
    let service = match service {
        Some(s) => ContainerName::new(s)
            .map_err(|e| ManifestError::Invalid(e.to_string()))?
            .to_string(),
        None => "my-app".to_string(),
    };
    let image = match image {
        Some(i) => ImageRef::parse(i)
            .map_err(|e| ManifestError::Invalid(e.to_string()))?
            .to_string(),
        None => "ghcr.io/example/my-app:latest".to_string(),
    };

    let template = format!(
        r#"service: {service}
image: {image}
ports:
  - "8080:80"
env: []
health:
  path: /health
  port: 8080
  interval: 2s
  timeout: 2m
  retries: 3
# proxy:
#   config_path: /etc/nginx/conf.d/{service}.conf
#   reload_command: nginx -s reload
"#
    );

    std::fs::write(&path, template)?;
    Ok(path)
}
