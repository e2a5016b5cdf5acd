//! RouterOS API framing
//!
//! A *word* is a length prefix followed by that many bytes. A *sentence* is
//! a sequence of words terminated by a zero-length word. The length prefix
//! uses one to five bytes:
//!
//! | length               | encoding                       |
//! |----------------------|--------------------------------|
//! | `< 0x80`             | 1 byte                         |
//! | `< 0x4000`           | 2 bytes, `len \| 0x8000`       |
//! | `< 0x20_0000`        | 3 bytes, `len \| 0xC0_0000`    |
//! | `< 0x1000_0000`      | 4 bytes, `len \| 0xE000_0000`  |
//! | otherwise            | `0xF0` followed by 4 bytes     |

use fwdsync_core::{Error, Result};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest word accepted from the router
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Encode a word length prefix
pub fn encode_length(len: usize) -> Vec<u8> {
    let len = len as u32;
    match len {
        0..=0x7F => vec![len as u8],
        0x80..=0x3FFF => {
            let v = len | 0x8000;
            vec![(v >> 8) as u8, v as u8]
        }
        0x4000..=0x1F_FFFF => {
            let v = len | 0xC0_0000;
            vec![(v >> 16) as u8, (v >> 8) as u8, v as u8]
        }
        0x20_0000..=0x0FFF_FFFF => (len | 0xE000_0000).to_be_bytes().to_vec(),
        _ => {
            let mut out = vec![0xF0];
            out.extend_from_slice(&len.to_be_bytes());
            out
        }
    }
}

/// Encode a complete sentence, including the terminating empty word
pub fn encode_sentence<W: AsRef<str>>(words: &[W]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        out.extend_from_slice(&encode_length(bytes.len()));
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

/// Read a word length prefix
pub async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> Result<usize> {
    let first = reader.read_u8().await?;

    let (extra, mut len) = if first & 0x80 == 0x00 {
        return Ok(first as usize);
    } else if first & 0xC0 == 0x80 {
        (1, u32::from(first & 0x3F))
    } else if first & 0xE0 == 0xC0 {
        (2, u32::from(first & 0x1F))
    } else if first & 0xF0 == 0xE0 {
        (3, u32::from(first & 0x0F))
    } else if first == 0xF0 {
        (4, 0)
    } else {
        return Err(Error::protocol(format!(
            "unsupported length control byte 0x{first:02X}"
        )));
    };

    for _ in 0..extra {
        len = (len << 8) | u32::from(reader.read_u8().await?);
    }

    Ok(len as usize)
}

/// Read one word
pub async fn read_word<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let len = read_length(reader).await?;
    if len > MAX_WORD_LEN {
        return Err(Error::protocol(format!(
            "word of {len} bytes exceeds limit of {MAX_WORD_LEN}"
        )));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read one sentence (without the terminating empty word)
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(reader).await?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

/// Write one sentence and flush
pub async fn write_sentence<W, S>(writer: &mut W, words: &[S]) -> Result<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    writer.write_all(&encode_sentence(words)).await?;
    writer.flush().await?;
    Ok(())
}

/// Reply sentence type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `!re`: one row of data
    Re,
    /// `!done`: the command finished
    Done,
    /// `!trap`: the command failed; `!done` follows
    Trap,
    /// `!fatal`: the router is closing the connection
    Fatal,
    /// `!empty`: the command has no rows; `!done` follows (RouterOS 7.18+)
    Empty,
}

/// A parsed reply sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply type
    pub kind: ReplyKind,
    /// `=key=value` attributes
    pub attributes: HashMap<String, String>,
    /// `.tag=` value, if present
    pub tag: Option<String>,
}

impl Reply {
    /// Parse a reply from its words
    pub fn parse(words: Vec<String>) -> Result<Self> {
        let mut iter = words.into_iter();
        let kind = match iter.next().as_deref() {
            Some("!re") => ReplyKind::Re,
            Some("!done") => ReplyKind::Done,
            Some("!trap") => ReplyKind::Trap,
            Some("!fatal") => ReplyKind::Fatal,
            Some("!empty") => ReplyKind::Empty,
            Some(other) => {
                return Err(Error::protocol(format!("unexpected reply word '{other}'")));
            }
            None => return Err(Error::protocol("empty reply sentence")),
        };

        let mut attributes = HashMap::new();
        let mut tag = None;

        for word in iter {
            if let Some(value) = word.strip_prefix(".tag=") {
                tag = Some(value.to_string());
            } else if let Some(pair) = word.strip_prefix('=') {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                attributes.insert(key.to_string(), value.to_string());
            } else if kind == ReplyKind::Fatal {
                // !fatal carries a bare reason word
                attributes.insert("message".to_string(), word);
            }
        }

        Ok(Self {
            kind,
            attributes,
            tag,
        })
    }

    /// Attribute value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Error or reason text (`=message=` or the bare `!fatal` word)
    pub fn message(&self) -> &str {
        self.get("message").unwrap_or("no message")
    }
}
