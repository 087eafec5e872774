// backupper/src/remote/mod.rs
pub mod ssh;

use crate::errors::Result;
use std::path::Path;

/// Narrow seam over the remote-shell transport: open an authenticated
/// session against a `[username@]host[:port]` address.
pub trait RemoteTransport {
    fn connect(&self, url: &str, password: Option<&str>) -> Result<Box<dyn RemoteSession>>;
}

/// One open session: run a command, pull a file back. A non-zero exit status
/// anywhere in a piped command must surface as an error, not be masked by
/// the last pipeline stage.
pub trait RemoteSession {
    fn execute(&mut self, command: &str) -> Result<()>;
    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<()>;
}
