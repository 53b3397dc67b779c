use std::fmt;

/// One wire reply. Every request gets exactly one reply line, always
/// CRLF-terminated regardless of how the request line was terminated.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Ok,
    Null,
    Value(String),
    Err(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK\r\n"),
            Reply::Null => write!(f, "NULL\r\n"),
            Reply::Value(value) => write!(f, "{}\r\n", value),
            Reply::Err(message) => write!(f, "ERR {}\r\n", message),
        }
    }
}

impl From<Reply> for Vec<u8> {
    fn from(reply: Reply) -> Vec<u8> {
        reply.to_string().into_bytes()
    }
}
