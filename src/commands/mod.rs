// ABOUTME: Command handlers behind the CLI: deploy, status, and logs.
// ABOUTME: Each handler loads the manifest, connects to the runtime, and reports via Output.

mod deploy;
mod logs;
mod status;

pub use deploy::deploy;
pub use logs::logs;
pub use status::status;
