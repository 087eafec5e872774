// backupper/src/remote/ssh.rs
use super::{RemoteSession, RemoteTransport};
use crate::errors::{BackupError, Result};
use ssh2::Session;
use std::fs::File;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Applied uniformly to every connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parsed form of the address the resolver derives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub username: Option<String>,
    pub host: String,
    pub port: u16,
}

impl RemoteUrl {
    /// Parses `[username@]host[:port]`; the port defaults to 22. IPv6 hosts
    /// are accepted bare (`::1`) or bracketed when a port follows (`[::1]:22`).
    pub fn parse(url: &str) -> Result<Self> {
        let (username, rest) = match url.split_once('@') {
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, url),
        };
        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            match bracketed.split_once(']') {
                Some((host, "")) => (host.to_string(), 22),
                Some((host, suffix)) => {
                    let port_str = suffix.strip_prefix(':').ok_or_else(|| {
                        BackupError::Connection(
                            url.to_string(),
                            format!("unexpected '{}' after bracketed host", suffix),
                        )
                    })?;
                    let port = port_str.parse::<u16>().map_err(|_| {
                        BackupError::Connection(
                            url.to_string(),
                            format!("invalid port '{}'", port_str),
                        )
                    })?;
                    (host.to_string(), port)
                }
                None => {
                    return Err(BackupError::Connection(
                        url.to_string(),
                        "unclosed '[' in host".to_string(),
                    ));
                }
            }
        } else if rest.matches(':').count() > 1 {
            // Bare IPv6 literal; a port would need brackets.
            (rest.to_string(), 22)
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse::<u16>().map_err(|_| {
                        BackupError::Connection(url.to_string(), format!("invalid port '{}'", port))
                    })?;
                    (host.to_string(), port)
                }
                None => (rest.to_string(), 22),
            }
        };
        if host.is_empty() {
            return Err(BackupError::Connection(
                url.to_string(),
                "missing host".to_string(),
            ));
        }
        Ok(RemoteUrl {
            username,
            host,
            port,
        })
    }
}

/// SSH-backed transport. Password authentication when the target configures
/// one, agent/key authentication otherwise.
pub struct SshTransport;

impl RemoteTransport for SshTransport {
    fn connect(&self, url: &str, password: Option<&str>) -> Result<Box<dyn RemoteSession>> {
        let remote = RemoteUrl::parse(url)?;
        let addr = (remote.host.as_str(), remote.port)
            .to_socket_addrs()
            .map_err(|e| BackupError::Connection(url.to_string(), e.to_string()))?
            .next()
            .ok_or_else(|| {
                BackupError::Connection(url.to_string(), "could not resolve address".to_string())
            })?;
        let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .map_err(|e| BackupError::Connection(url.to_string(), e.to_string()))?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        let username = remote
            .username
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string());
        match password {
            Some(pass) => session.userauth_password(&username, pass)?,
            None => session.userauth_agent(&username)?,
        }

        Ok(Box::new(SshSession { session }))
    }
}

struct SshSession {
    session: Session,
}

impl RemoteSession for SshSession {
    fn execute(&mut self, command: &str) -> Result<()> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        // Drain both streams in lockstep; a chatty stderr left unread could
        // exhaust the channel window and stall the command.
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n_out = channel.read(&mut buf)?;
            stdout.extend_from_slice(&buf[..n_out]);
            let n_err = channel.stderr().read(&mut buf)?;
            stderr.extend_from_slice(&buf[..n_err]);
            if n_out == 0 && n_err == 0 {
                break;
            }
        }

        channel.wait_close()?;
        let status = channel.exit_status()?;
        if status != 0 {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(BackupError::Command {
                status,
                stderr: stderr.trim_end().to_string(),
            });
        }
        Ok(())
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        let (mut remote_file, _stat) = self
            .session
            .scp_recv(Path::new(remote_path))
            .map_err(|e| BackupError::Transfer(remote_path.to_string(), e.to_string()))?;

        let mut local_file = File::create(local_path)?;
        std::io::copy(&mut remote_file, &mut local_file)
            .map_err(|e| BackupError::Transfer(remote_path.to_string(), e.to_string()))?;

        remote_file.send_eof()?;
        remote_file.wait_eof()?;
        remote_file.close()?;
        remote_file.wait_close()?;
        Ok(())
    }
}
