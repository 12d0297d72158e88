use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::netconf::SessionError;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Validate a hostname.
/// Allows alphanumeric, hyphens, dots, and underscores. No path separators or shell metacharacters.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }
    hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Uses the ssh2 crate (libssh2).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(
    host: &str,
    port: u16,
    user: &str,
    pass: &str,
    timeout_secs: u64,
) -> Result<ssh2::Session, SessionError> {
    let timeout = Duration::from_secs(timeout_secs);
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| SessionError::Connect(format!("Cannot resolve {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| SessionError::Connect(format!("No address found for {}:{}", host, port)))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| SessionError::Connect(format!("TCP connection to {} failed: {}", addr, e)))?;

    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = ssh2::Session::new()?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
    session.handshake()?;

    // Try password auth first
    match session.userauth_password(user, pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        Ok(_) => {}
        Err(e) => tracing::debug!("Password authentication failed for {}: {}", user, e),
    }

    // Try keyboard-interactive auth (some IOS-XE AAA setups only offer this)
    let mut prompter = PasswordPrompt { password: pass.to_string() };
    if let Err(e) = session.userauth_keyboard_interactive(user, &mut prompter) {
        tracing::debug!("Keyboard-interactive authentication failed for {}: {}", user, e);
    }

    if session.authenticated() {
        Ok(session)
    } else {
        Err(SessionError::Auth(format!(
            "SSH authentication failed for {}: all methods exhausted",
            user
        )))
    }
}
