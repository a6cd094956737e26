//! Control-channel line decoding and reply encoding (§4.9).
//!
//! Input decoding: read a CRLF (or bare LF)-terminated line; try UTF-8,
//! falling back to Latin-1 (which, unlike UTF-8, can never fail to decode
//! a byte sequence) if the bytes are not valid UTF-8; NFC-normalize the
//! result; split on the first space into `(cmd.lower(), rest)`.

use crate::path::normalize_unicode;
use crate::server::controlchan::reply::Reply;
use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Decodes raw control-channel bytes into `(lowercased verb, remaining
/// argument string)` pairs, one per CRLF-terminated line.
#[derive(Default)]
pub struct FtpCodec {
    next_index: usize,
}

impl FtpCodec {
    /// A fresh codec with no buffered partial line.
    pub fn new() -> FtpCodec {
        FtpCodec { next_index: 0 }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };
    normalize_unicode(text.trim_end_matches(['\r', '\n']))
}

/// Splits a decoded line on its first space into `(cmd.lower(), rest)`.
pub fn split_command(line: &str) -> (String, String) {
    match line.split_once(' ') {
        Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim().to_string()),
        None => (line.to_lowercase(), String::new()),
    }
}

impl Decoder for FtpCodec {
    type Item = (String, String);
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = buf.len();
            return Ok(None);
        };
        let newline_index = newline_offset + self.next_index;
        let line = buf.split_to(newline_index + 1);
        self.next_index = 0;
        let decoded = decode_line(&line);
        Ok(Some(split_command(&decoded)))
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = io::Error;

    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.extend_from_slice(reply.render().as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_space_and_lowercases_verb() {
        assert_eq!(split_command("USER alice"), ("user".to_string(), "alice".to_string()));
        assert_eq!(split_command("PWD"), ("pwd".to_string(), String::new()));
        assert_eq!(split_command("STOR a b c"), ("stor".to_string(), "a b c".to_string()));
    }

    #[test]
    fn decode_falls_back_to_latin1_on_invalid_utf8() {
        let bytes = [0xe9, b'\r', b'\n']; // Latin-1 'é', not valid UTF-8 alone
        let decoded = decode_line(&bytes);
        assert_eq!(decoded, "é");
    }

    #[test]
    fn decoder_yields_one_command_per_line() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(&b"USER alice\r\nPASS secret\r\n"[..]);
        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first, ("user".to_string(), "alice".to_string()));
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second, ("pass".to_string(), "secret".to_string()));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
