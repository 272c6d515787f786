//! Run a single command on a remote device over SSH

use std::convert::TryFrom;
use std::fmt;
use std::io::{self, Read};
use std::net::TcpStream;
use std::time::Duration;

use derive_more::From;
use log::debug;
use ssh2::Session;

#[derive(Debug, From)]
pub enum SshError {
    /// Errors on the TCP connection
    Io(io::Error),
    /// Errors reported by libssh2 (handshake, auth, channel)
    Ssh(ssh2::Error),
    /// The server accepted the password call but we're still not logged in
    #[from(ignore)]
    NotAuthenticated(String),
}

impl fmt::Display for SshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SshError::Io(ref e) => write!(f, "{}", e),
            SshError::Ssh(ref e) => write!(f, "{}", e),
            SshError::NotAuthenticated(ref user) => {
                write!(f, "authentication failed for user '{}'", user)
            }
        }
    }
}

impl std::error::Error for SshError {}

/// Something that can run a command and hand back what it printed
pub trait RemoteShell {
    fn run(&mut self, command: &str) -> Result<String, SshError>;
}

/// A password-authenticated SSH session
pub struct SshShell {
    session: Session,
}

impl SshShell {
    pub fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<SshShell, SshError> {
        debug!("connecting to {}@{}:{}", username, host, port);
        let tcp = TcpStream::connect((host, port))?;
        let mut session = Session::new()?;
        session.set_timeout(timeout_millis(timeout));
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_password(username, password)?;
        if !session.authenticated() {
            return Err(SshError::NotAuthenticated(username.to_owned()));
        }
        Ok(SshShell { session })
    }

    pub fn disconnect(self) {
        if let Err(e) = self.session.disconnect(None, "check finished", None) {
            debug!("error while disconnecting: {}", e);
        }
    }
}

/// libssh2 takes its timeout as a `u32` of milliseconds, longer ones saturate
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

impl RemoteShell for SshShell {
    fn run(&mut self, command: &str) -> Result<String, SshError> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;
        let mut raw = Vec::new();
        channel.read_to_end(&mut raw)?;
        channel.wait_close()?;
        debug!(
            "'{}' exited with status {}, {} bytes of output",
            command,
            channel.exit_status()?,
            raw.len()
        );
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::timeout_millis;

    #[test]
    fn timeouts_saturate() {
        assert_eq!(timeout_millis(Duration::from_secs(10)), 10_000);
        assert_eq!(timeout_millis(Duration::from_secs(5_000_000)), u32::MAX);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), u32::MAX);
    }
}
