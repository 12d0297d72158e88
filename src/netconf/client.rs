use std::io::{self, Read, Write};

use uuid::Uuid;

use super::framing::{FramedStream, Framing};
use super::rpc::{self, RpcReply, ServerHello, CAP_BASE_1_0, CAP_BASE_1_1};
use super::session::DeviceSession;
use super::SessionError;
use crate::config::DeviceEndpoint;
use crate::snippets::Fragment;
use crate::utils::ssh_connect;

/// The `netconf` SSH subsystem channel. Keeps its session alive.
pub struct SshChannel {
    channel: ssh2::Channel,
    _session: ssh2::Session,
}

impl Read for SshChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.channel.read(buf)
    }
}

impl Write for SshChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.channel.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.channel.flush()
    }
}

/// Open an SSH connection to the device and start a NETCONF session on it.
/// Blocking; call from a spawn_blocking context.
pub fn connect(endpoint: &DeviceEndpoint) -> Result<NetconfClient<SshChannel>, SessionError> {
    tracing::info!("Connecting to {}:{}", endpoint.host, endpoint.port);
    let session = ssh_connect(
        &endpoint.host,
        endpoint.port,
        &endpoint.username,
        &endpoint.password,
        endpoint.timeout_secs,
    )?;

    let mut channel = session.channel_session()?;
    channel.subsystem("netconf")?;

    let client = NetconfClient::establish(SshChannel {
        channel,
        _session: session,
    })?;
    tracing::debug!(
        "Device advertised {} capabilities, using {:?} framing",
        client.server_hello().capabilities.len(),
        client.framing()
    );
    Ok(client)
}

/// A NETCONF session over any byte transport.
pub struct NetconfClient<T: Read + Write> {
    stream: FramedStream<T>,
    hello: ServerHello,
}

impl<T: Read + Write> NetconfClient<T> {
    /// Exchange hellos and settle on a framing.
    pub fn establish(transport: T) -> Result<Self, SessionError> {
        let mut stream = FramedStream::new(transport);
        stream.send(&rpc::client_hello())?;
        let hello = rpc::parse_hello(&stream.recv()?)?;

        if hello.supports(CAP_BASE_1_1) {
            stream.set_framing(Framing::Chunked);
        } else if !hello.supports(CAP_BASE_1_0) {
            return Err(SessionError::Protocol(
                "device advertises neither base:1.0 nor base:1.1".to_string(),
            ));
        }

        match hello.session_id {
            Some(id) => tracing::info!(
                "NETCONF session {} established ({:?} framing)",
                id,
                stream.framing()
            ),
            None => tracing::warn!("Device hello carried no session-id"),
        }

        Ok(Self { stream, hello })
    }

    pub fn server_hello(&self) -> &ServerHello {
        &self.hello
    }

    pub fn framing(&self) -> Framing {
        self.stream.framing()
    }

    /// Send one operation and wait for its reply.
    fn rpc(&mut self, operation: &str) -> Result<RpcReply, SessionError> {
        let message_id = format!("urn:uuid:{}", Uuid::new_v4());
        self.stream.send(&rpc::rpc(&message_id, operation))?;
        let reply = rpc::parse_reply(&self.stream.recv()?)?;

        match reply.message_id.as_deref() {
            Some(id) if id != message_id => Err(SessionError::Protocol(format!(
                "reply message-id {} does not match request {}",
                id, message_id
            ))),
            _ => Ok(reply),
        }
    }

    fn expect_ok(&mut self, operation: &'static str, body: &str) -> Result<(), SessionError> {
        let reply = self.rpc(body)?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(SessionError::Rejected {
                operation,
                reason: reply.error_summary(),
            })
        }
    }
}

impl<T: Read + Write> DeviceSession for NetconfClient<T> {
    fn lock(&mut self, target: &str) -> Result<(), SessionError> {
        self.expect_ok("lock", &rpc::lock(target))
    }

    fn unlock(&mut self, target: &str) -> Result<(), SessionError> {
        self.expect_ok("unlock", &rpc::unlock(target))
    }

    fn edit_config(&mut self, target: &str, config: &Fragment) -> Result<RpcReply, SessionError> {
        self.rpc(&rpc::edit_config(target, config.as_str()))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.expect_ok("close-session", &rpc::close_session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netconf::framing::encode;
    use crate::netconf::RUNNING;
    use std::io::Cursor;

    struct Loopback {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn server_hello(caps: &[&str]) -> String {
        let caps: String = caps
            .iter()
            .map(|c| format!("<capability>{c}</capability>"))
            .collect();
        format!(
            r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities>{caps}</capabilities><session-id>12</session-id></hello>"#
        )
    }

    const OK: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><ok/></rpc-reply>"#;

    /// A device that sends `hello`, then `replies` in the given framing.
    fn device(caps: &[&str], framing: Framing, replies: &[&str]) -> Loopback {
        let mut wire = encode(Framing::EndOfMessage, &server_hello(caps));
        for reply in replies {
            wire.extend_from_slice(&encode(framing, reply));
        }
        Loopback {
            input: Cursor::new(wire),
            written: Vec::new(),
        }
    }

    fn sent(client: &NetconfClient<Loopback>) -> String {
        String::from_utf8_lossy(&client.stream.get_ref().written).into_owned()
    }

    fn fragment() -> Fragment {
        Fragment::from("<config><native/></config>".to_string())
    }

    #[test]
    fn test_base_1_0_device_keeps_eom_framing() {
        let mut client = NetconfClient::establish(device(
            &[CAP_BASE_1_0],
            Framing::EndOfMessage,
            &[OK, OK, OK, OK],
        ))
        .unwrap();
        assert_eq!(client.framing(), Framing::EndOfMessage);
        assert_eq!(client.server_hello().session_id, Some(12));

        client.lock(RUNNING).unwrap();
        assert!(client.edit_config(RUNNING, &fragment()).unwrap().is_ok());
        client.unlock(RUNNING).unwrap();
        client.close().unwrap();

        let wire = sent(&client);
        assert_eq!(wire.matches("]]>]]>").count(), 5);
        assert!(!wire.contains("\n##\n"));
        assert!(wire.contains("<lock><target><running/></target></lock>"));
        assert!(wire.contains("<edit-config><target><running/></target><config><native/></config></edit-config>"));
        assert!(wire.contains("<unlock><target><running/></target></unlock>"));
        assert!(wire.contains("<close-session/>"));
        assert_eq!(wire.matches(r#"message-id="urn:uuid:"#).count(), 4);
    }

    #[test]
    fn test_base_1_1_device_switches_to_chunked() {
        let mut client = NetconfClient::establish(device(
            &[CAP_BASE_1_0, CAP_BASE_1_1],
            Framing::Chunked,
            &[OK],
        ))
        .unwrap();
        assert_eq!(client.framing(), Framing::Chunked);

        client.lock(RUNNING).unwrap();

        let wire = sent(&client);
        // hello goes out EOM-framed, everything after it chunked
        assert_eq!(wire.matches("]]>]]>").count(), 1);
        assert!(wire.contains("\n#"));
        assert!(wire.ends_with("\n##\n"));
    }

    #[test]
    fn test_lock_denied_is_rejected() {
        let denied = r#"<rpc-reply><rpc-error><error-type>protocol</error-type><error-tag>lock-denied</error-tag><error-severity>error</error-severity></rpc-error></rpc-reply>"#;
        let mut client =
            NetconfClient::establish(device(&[CAP_BASE_1_0], Framing::EndOfMessage, &[denied]))
                .unwrap();
        match client.lock(RUNNING) {
            Err(SessionError::Rejected { operation, reason }) => {
                assert_eq!(operation, "lock");
                assert!(reason.contains("lock-denied"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_config_returns_reply_without_ok() {
        let mut client = NetconfClient::establish(device(
            &[CAP_BASE_1_0],
            Framing::EndOfMessage,
            &["<rpc-reply><rpc-error><error-tag>invalid-value</error-tag></rpc-error></rpc-reply>"],
        ))
        .unwrap();
        let reply = client.edit_config(RUNNING, &fragment()).unwrap();
        assert!(!reply.is_ok());
        assert_eq!(reply.errors[0].tag, "invalid-value");
    }

    #[test]
    fn test_mismatched_message_id_is_protocol_error() {
        let mut client = NetconfClient::establish(device(
            &[CAP_BASE_1_0],
            Framing::EndOfMessage,
            &[r#"<rpc-reply message-id="urn:uuid:someone-else"><ok/></rpc-reply>"#],
        ))
        .unwrap();
        assert!(matches!(client.lock(RUNNING), Err(SessionError::Protocol(_))));
    }

    #[test]
    fn test_device_hanging_up_mid_session() {
        let mut client =
            NetconfClient::establish(device(&[CAP_BASE_1_0], Framing::EndOfMessage, &[])).unwrap();
        assert!(matches!(client.lock(RUNNING), Err(SessionError::Closed)));
    }

    #[test]
    fn test_device_without_base_capability() {
        let result = NetconfClient::establish(device(
            &["urn:ietf:params:netconf:capability:candidate:1.0"],
            Framing::EndOfMessage,
            &[],
        ));
        assert!(matches!(result, Err(SessionError::Protocol(_))));
    }
}
