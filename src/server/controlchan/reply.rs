//! FTP reply construction and wire encoding (§4.9, §6).

use std::fmt;

/// The numeric reply codes this crate ever sends (§6): the closed set this
/// command table actually uses, rather than the full RFC 959 table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ReplyCode {
    FileStatusOkay = 150,
    CommandOkay = 200,
    FileStatus = 213,
    SystemType = 215,
    ServiceReady = 220,
    ClosingControlConnection = 221,
    ClosingDataConnection = 226,
    EnteringPassiveMode = 227,
    EnteringExtendedPassiveMode = 229,
    UserLoggedIn = 230,
    FileActionOkay = 250,
    DirCreated = 257,
    NeedPassword = 331,
    FileActionPending = 350,
    ServiceNotAvailable = 421,
    CantOpenDataConnection = 425,
    ConnectionClosed = 426,
    LocalError = 451,
    ParameterSyntaxError = 501,
    CommandNotImplemented = 502,
    BadCommandSequence = 503,
    NotLoggedIn = 530,
    FileError = 550,
}

/// A reply to the FTP client.
#[derive(Debug, Clone)]
pub enum Reply {
    /// No reply at all — used where a gate has already queued its own
    /// failure reply and the caller must not double-reply.
    None,
    /// `code message`, single line.
    Single {
        /// The reply's numeric code.
        code: ReplyCode,
        /// The human-readable line following the code.
        message: String,
    },
    /// `code-first` / ` continuation...` / `code last`, the FTP
    /// multi-line and list-style reply convention (§4.9); both `FEAT`'s
    /// capability list and `LIST`'s preliminary/terminal framing use this
    /// shape.
    Multi {
        /// The reply's numeric code, repeated on the first and last line.
        code: ReplyCode,
        /// One or more lines; a single-element vector degrades to the
        /// single-line form.
        lines: Vec<String>,
    },
}

impl Reply {
    /// A single-line reply.
    pub fn single(code: ReplyCode, message: impl Into<String>) -> Reply {
        Reply::Single { code, message: message.into() }
    }

    /// A multi-line reply; panics if `lines` is empty; a reply with no
    /// content is a caller bug, not a runtime condition.
    pub fn multi(code: ReplyCode, lines: Vec<String>) -> Reply {
        assert!(!lines.is_empty(), "Reply::multi requires at least one line");
        Reply::Multi { code, lines }
    }

    /// Renders the full wire representation, CRLF-terminated, ready to be
    /// written directly to the control stream.
    pub fn render(&self) -> String {
        match self {
            Reply::None => String::new(),
            Reply::Single { code, message } => format!("{} {}\r\n", *code as u32, message),
            Reply::Multi { code, lines } => {
                let code = *code as u32;
                if lines.len() == 1 {
                    return format!("{code} {}\r\n", lines[0]);
                }
                let (last, head) = lines.split_last().expect("non-empty, checked at construction");
                let mut out = format!("{code}-{}\r\n", head[0]);
                for line in &head[1..] {
                    out.push_str(&format!(" {line}\r\n"));
                }
                out.push_str(&format!("{code} {last}\r\n"));
                out
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_reply() {
        let r = Reply::single(ReplyCode::UserLoggedIn, "ok");
        assert_eq!(r.render(), "230 ok\r\n");
    }

    #[test]
    fn multi_line_reply_uses_continuation_convention() {
        let r = Reply::multi(ReplyCode::CommandOkay, vec!["UTF8".to_string(), "SIZE".to_string(), "end".to_string()]);
        assert_eq!(r.render(), "200-UTF8\r\n SIZE\r\n200 end\r\n");
    }

    #[test]
    fn single_element_multi_degrades_to_single_line() {
        let r = Reply::multi(ReplyCode::CommandOkay, vec!["only".to_string()]);
        assert_eq!(r.render(), "200 only\r\n");
    }
}
