// ABOUTME: The logs command: tail or follow output from the active container.
// ABOUTME: Stdout and stderr from the container stay on their respective streams.

use crate::error::{Error, Result};
use crate::manifest::ReleaseDescriptor;
use crate::rollout::find_active_container;
use crate::runtime::{
    BollardDriver, ContainerError, LogOps, LogOptions, LogSource, detect_local,
};
use futures::StreamExt;
use std::io::Write;
use std::path::Path;

pub async fn logs(manifest_path: &Path, tail: Option<u64>, follow: bool) -> Result<()> {
    let descriptor = ReleaseDescriptor::load(manifest_path)?;

    let info = detect_local()?;
    let driver = BollardDriver::connect(&info)?;

    let container = find_active_container(&driver, &descriptor.service)
        .await?
        .ok_or_else(|| {
            Error::Container(ContainerError::NotFound(format!(
                "no running container for {}",
                descriptor.service
            )))
        })?;

    let opts = LogOptions {
        follow,
        timestamps: false,
        tail,
    };
    let mut stream = driver.container_logs(&container.id, &opts).await?;

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    while let Some(item) = stream.next().await {
        let line = item?;
        match line.source {
            LogSource::Stdout => {
                let mut out = stdout.lock();
                let _ = out.write_all(line.content.as_bytes());
                let _ = out.flush();
            }
            LogSource::Stderr => {
                let mut err = stderr.lock();
                let _ = err.write_all(line.content.as_bytes());
                let _ = err.flush();
            }
        }
    }

    Ok(())
}
