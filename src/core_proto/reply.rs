use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core_pipe::DuplexPipe;

/// A control-channel response: an RFC 959 code and one or more text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The handler already produced its replies (deferred transfer
    /// completion); the dispatcher writes nothing.
    None,
    Single {
        code: u16,
        text: String,
    },
    Multi {
        code: u16,
        lines: Vec<String>,
        tail: String,
    },
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Reply::Single {
            code,
            text: text.into(),
        }
    }

    pub fn multi(code: u16, lines: Vec<String>, tail: impl Into<String>) -> Self {
        Reply::Multi {
            code,
            lines,
            tail: tail.into(),
        }
    }

    pub fn none() -> Self {
        Reply::None
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Reply::None => None,
            Reply::Single { code, .. } | Reply::Multi { code, .. } => Some(*code),
        }
    }

    /// Wire form: `NNN SP text CRLF` for a single line; `NNN-` heading,
    /// continuation lines (space-prefixed when they begin with three
    /// digits), and a final `NNN SP tail CRLF` for multi-line replies.
    pub fn to_wire(&self) -> String {
        match self {
            Reply::None => String::new(),
            Reply::Single { code, text } => format!("{} {}\r\n", code, text),
            Reply::Multi { code, lines, tail } => {
                let mut out = String::new();
                let mut iter = lines.iter();
                match iter.next() {
                    Some(first) => out.push_str(&format!("{}-{}\r\n", code, first)),
                    None => return format!("{} {}\r\n", code, tail),
                }
                for line in iter {
                    if line.len() >= 3 && line.as_bytes()[..3].iter().all(u8::is_ascii_digit) {
                        out.push(' ');
                    }
                    out.push_str(line);
                    out.push_str("\r\n");
                }
                out.push_str(&format!("{} {}\r\n", code, tail));
                out
            }
        }
    }
}

/// The only writer of control-channel responses.
///
/// The inner mutex is held for the duration of one response, which is what
/// serialises replies between the control task and transfer tasks. A TLS
/// upgrade swaps the target pipe under the same lock.
pub struct ReplyWriter {
    pipe: Mutex<Arc<DuplexPipe>>,
}

impl ReplyWriter {
    pub fn new(pipe: Arc<DuplexPipe>) -> Self {
        Self {
            pipe: Mutex::new(pipe),
        }
    }

    pub async fn send(&self, reply: &Reply) -> io::Result<()> {
        let wire = reply.to_wire();
        if wire.is_empty() {
            return Ok(());
        }
        let pipe = self.pipe.lock().await;
        log::trace!("<<< {}", wire.trim_end());
        pipe.output.write_all(wire.as_bytes()).await
    }

    /// Retarget the writer after an adapter-chain change.
    pub async fn swap_pipe(&self, pipe: Arc<DuplexPipe>) {
        *self.pipe.lock().await = pipe;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_wire_format() {
        let reply = Reply::new(220, "Service ready.");
        assert_eq!(reply.to_wire(), "220 Service ready.\r\n");
    }

    #[test]
    fn multi_line_wire_format() {
        let reply = Reply::multi(
            211,
            vec!["Features:".to_string(), " SIZE".to_string()],
            "End",
        );
        assert_eq!(reply.to_wire(), "211-Features:\r\n SIZE\r\n211 End\r\n");
    }

    #[test]
    fn continuation_line_starting_with_digits_is_escaped() {
        let reply = Reply::multi(
            211,
            vec!["Status:".to_string(), "226 looks like a code".to_string()],
            "End",
        );
        assert_eq!(
            reply.to_wire(),
            "211-Status:\r\n 226 looks like a code\r\n211 End\r\n"
        );
    }

    #[test]
    fn empty_multi_collapses_to_single() {
        let reply = Reply::multi(211, vec![], "End");
        assert_eq!(reply.to_wire(), "211 End\r\n");
    }
}
