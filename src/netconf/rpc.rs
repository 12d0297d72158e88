//! NETCONF base-protocol messages: the client hello, the four RPCs the
//! provisioning run needs, and parsers for what comes back.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::SessionError;

pub const BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
pub const CAP_BASE_1_0: &str = "urn:ietf:params:netconf:base:1.0";
pub const CAP_BASE_1_1: &str = "urn:ietf:params:netconf:base:1.1";

/// The only datastore this tool edits.
pub const RUNNING: &str = "running";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub fn client_hello() -> String {
    format!(
        r#"{XML_DECL}<hello xmlns="{BASE_NS}"><capabilities><capability>{CAP_BASE_1_0}</capability><capability>{CAP_BASE_1_1}</capability></capabilities></hello>"#
    )
}

/// Wrap an operation element in an `<rpc>` envelope.
pub fn rpc(message_id: &str, operation: &str) -> String {
    format!(
        r#"{XML_DECL}<rpc xmlns="{BASE_NS}" message-id="{}">{operation}</rpc>"#,
        escape(message_id)
    )
}

pub fn lock(target: &str) -> String {
    format!("<lock><target><{target}/></target></lock>")
}

pub fn unlock(target: &str) -> String {
    format!("<unlock><target><{target}/></target></unlock>")
}

/// `config` must already be a `<config>` element.
pub fn edit_config(target: &str, config: &str) -> String {
    format!("<edit-config><target><{target}/></target>{config}</edit-config>")
}

pub fn close_session() -> String {
    "<close-session/>".to_string()
}

/// What the device announced in its hello.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerHello {
    pub session_id: Option<u32>,
    pub capabilities: Vec<String>,
}

impl ServerHello {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.split('?').next() == Some(capability))
    }
}

/// One `<rpc-error>` from a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcError {
    pub error_type: String,
    pub tag: String,
    pub severity: String,
    pub message: String,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.tag.is_empty() { "rpc-error" } else { &self.tag })?;
        if !self.error_type.is_empty() || !self.severity.is_empty() {
            write!(f, " ({} {})", self.error_type, self.severity)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcReply {
    pub message_id: Option<String>,
    pub ok: bool,
    pub errors: Vec<RpcError>,
}

impl RpcReply {
    /// True only when the reply carries `<ok/>`.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "reply did not contain <ok/>".to_string();
        }
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn xml_err(e: impl std::fmt::Display) -> SessionError {
    SessionError::Xml(e.to_string())
}

fn name_of(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, SessionError> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(xml_err)?.into_owned()));
        }
    }
    Ok(None)
}

enum Node<'a, 'x> {
    Element(&'a BytesStart<'x>),
    Text(String),
}

/// Walk `xml`, handing each element and text node to `visit` along with the
/// names of its open ancestors. Returns whether any element was seen.
fn walk(
    xml: &str,
    mut visit: impl FnMut(&[String], Node<'_, '_>) -> Result<(), SessionError>,
) -> Result<bool, SessionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                saw_root = true;
                visit(&path, Node::Element(&e))?;
                path.push(name_of(&e));
            }
            Event::Empty(e) => {
                saw_root = true;
                visit(&path, Node::Element(&e))?;
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?;
                visit(&path, Node::Text(text.into_owned()))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(saw_root)
}

fn expect_root(path: &[String], e: &BytesStart, root: &str) -> Result<bool, SessionError> {
    if !path.is_empty() {
        return Ok(false);
    }
    let name = name_of(e);
    if name != root {
        return Err(SessionError::Protocol(format!(
            "expected <{}>, got <{}>",
            root, name
        )));
    }
    Ok(true)
}

pub fn parse_hello(xml: &str) -> Result<ServerHello, SessionError> {
    let mut hello = ServerHello::default();
    let mut session_id = None;

    let saw_root = walk(xml, |path, node| {
        match node {
            Node::Element(e) => {
                expect_root(path, e, "hello")?;
            }
            Node::Text(text) => match path {
                [_, caps, cap] if caps == "capabilities" && cap == "capability" => {
                    hello.capabilities.push(text)
                }
                [_, sid] if sid == "session-id" => session_id = Some(text),
                _ => {}
            },
        }
        Ok(())
    })?;
    if !saw_root {
        return Err(SessionError::Protocol("empty hello".to_string()));
    }

    if let Some(sid) = session_id {
        hello.session_id = Some(
            sid.parse()
                .map_err(|_| SessionError::Protocol(format!("bad session-id {:?}", sid)))?,
        );
    }
    Ok(hello)
}

pub fn parse_reply(xml: &str) -> Result<RpcReply, SessionError> {
    let mut message_id = None;
    let mut ok = false;
    let mut errors: Vec<RpcError> = Vec::new();

    let saw_root = walk(xml, |path, node| {
        match node {
            Node::Element(e) => {
                if expect_root(path, e, "rpc-reply")? {
                    message_id = attribute(e, b"message-id")?;
                } else if path.len() == 1 {
                    match name_of(e).as_str() {
                        "ok" => ok = true,
                        "rpc-error" => errors.push(RpcError::default()),
                        _ => {}
                    }
                }
            }
            Node::Text(text) => {
                let [_, parent, field] = path else {
                    return Ok(());
                };
                if parent != "rpc-error" {
                    return Ok(());
                }
                if let Some(err) = errors.last_mut() {
                    match field.as_str() {
                        "error-type" => err.error_type = text,
                        "error-tag" => err.tag = text,
                        "error-severity" => err.severity = text,
                        "error-message" => err.message = text,
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    })?;
    if !saw_root {
        return Err(SessionError::Protocol("empty rpc-reply".to_string()));
    }

    Ok(RpcReply {
        message_id,
        ok,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        assert_eq!(lock(RUNNING), "<lock><target><running/></target></lock>");
        assert_eq!(unlock(RUNNING), "<unlock><target><running/></target></unlock>");
        assert_eq!(
            edit_config(RUNNING, "<config/>"),
            "<edit-config><target><running/></target><config/></edit-config>"
        );
        assert_eq!(close_session(), "<close-session/>");

        let hello = client_hello();
        assert!(hello.contains(CAP_BASE_1_0));
        assert!(hello.contains(CAP_BASE_1_1));
    }

    #[test]
    fn test_rpc_envelope_carries_message_id() {
        let msg = rpc("urn:uuid:1234", "<close-session/>");
        assert!(msg.contains(r#"message-id="urn:uuid:1234""#));
        assert!(msg.ends_with("<close-session/></rpc>"));
        assert!(rpc("a\"b", "<x/>").contains(r#"message-id="a&quot;b""#));
    }

    #[test]
    fn test_parse_ok_reply() {
        let reply = parse_reply(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="urn:uuid:42">
  <ok/>
</rpc-reply>"#,
        )
        .unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.message_id.as_deref(), Some("urn:uuid:42"));
        assert!(reply.errors.is_empty());
    }

    #[test]
    fn test_parse_prefixed_and_open_close_ok() {
        let reply = parse_reply(
            r#"<nc:rpc-reply xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0"><nc:ok></nc:ok></nc:rpc-reply>"#,
        )
        .unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.message_id, None);
    }

    #[test]
    fn test_parse_rpc_error() {
        let reply = parse_reply(
            r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="7">
  <rpc-error>
    <error-type>protocol</error-type>
    <error-tag>lock-denied</error-tag>
    <error-severity>error</error-severity>
    <error-info><session-id>12</session-id></error-info>
    <error-message xml:lang="en">Lock failed, lock is already held</error-message>
  </rpc-error>
</rpc-reply>"#,
        )
        .unwrap();
        assert!(!reply.is_ok());
        assert_eq!(
            reply.errors,
            vec![RpcError {
                error_type: "protocol".to_string(),
                tag: "lock-denied".to_string(),
                severity: "error".to_string(),
                message: "Lock failed, lock is already held".to_string(),
            }]
        );
        assert_eq!(
            reply.error_summary(),
            "lock-denied (protocol error): Lock failed, lock is already held"
        );
    }

    #[test]
    fn test_reply_without_ok_is_not_success() {
        let reply = parse_reply(
            r#"<rpc-reply message-id="1"><data><native><ok/></native></data></rpc-reply>"#,
        )
        .unwrap();
        assert!(!reply.is_ok());
        assert_eq!(reply.error_summary(), "reply did not contain <ok/>");
    }

    #[test]
    fn test_parse_reply_rejects_other_documents() {
        assert!(matches!(
            parse_reply("<hello><capabilities/></hello>"),
            Err(SessionError::Protocol(_))
        ));
        assert!(matches!(parse_reply(""), Err(SessionError::Protocol(_))));
        assert!(matches!(
            parse_reply("<rpc-reply><ok/></rpc-rep>"),
            Err(SessionError::Xml(_))
        ));
    }

    #[test]
    fn test_parse_hello() {
        let hello = parse_hello(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
    <capability>urn:ietf:params:netconf:base:1.1</capability>
    <capability>urn:ietf:params:netconf:capability:writable-running:1.0</capability>
    <capability>http://cisco.com/ns/yang/Cisco-IOS-XE-native?module=Cisco-IOS-XE-native&amp;revision=2019-11-01</capability>
  </capabilities>
  <session-id>3127</session-id>
</hello>"#,
        )
        .unwrap();
        assert_eq!(hello.session_id, Some(3127));
        assert_eq!(hello.capabilities.len(), 4);
        assert!(hello.supports(CAP_BASE_1_1));
        assert!(hello.supports("http://cisco.com/ns/yang/Cisco-IOS-XE-native"));
        assert!(!hello.supports("urn:ietf:params:netconf:capability:candidate:1.0"));
    }

    #[test]
    fn test_parse_hello_bad_session_id() {
        assert!(matches!(
            parse_hello("<hello><session-id>abc</session-id></hello>"),
            Err(SessionError::Protocol(_))
        ));
    }
}
