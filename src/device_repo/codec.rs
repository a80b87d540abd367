// RouterOS API sentence codec: length-prefixed words, empty word ends a sentence.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::Record;

/// Appends the variable-length prefix for a word of `len` bytes.
pub fn encode_length(len: usize, out: &mut BytesMut) {
    let len = len as u32;
    if len < 0x80 {
        out.put_u8(len as u8);
    } else if len < 0x4000 {
        out.put_u16(len as u16 | 0x8000);
    } else if len < 0x20_0000 {
        let v = len | 0xC0_0000;
        out.put_u8((v >> 16) as u8);
        out.put_u16(v as u16);
    } else if len < 0x1000_0000 {
        out.put_u32(len | 0xE000_0000);
    } else {
        out.put_u8(0xF0);
        out.put_u32(len);
    }
}

/// Encodes a full sentence, including the terminating empty word.
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> BytesMut {
    let mut out = BytesMut::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut out);
        out.put_slice(bytes);
    }
    out.put_u8(0);
    out
}

async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<usize> {
    let first = reader.read_u8().await? as u32;
    let len = if first & 0x80 == 0 {
        first
    } else if first & 0xC0 == 0x80 {
        ((first & 0x3F) << 8) | reader.read_u8().await? as u32
    } else if first & 0xE0 == 0xC0 {
        ((first & 0x1F) << 16) | reader.read_u16().await? as u32
    } else if first & 0xF0 == 0xE0 {
        let b = reader.read_u8().await? as u32;
        let rest = reader.read_u16().await? as u32;
        ((first & 0x0F) << 24) | (b << 16) | rest
    } else if first == 0xF0 {
        reader.read_u32().await?
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reserved length control byte 0x{first:02X}"),
        ));
    };
    Ok(len as usize)
}

/// Reads one word. An empty string marks the end of a sentence.
pub async fn read_word<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<String> {
    let len = read_length(reader).await?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Reads words until the terminating empty word.
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(reader).await?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// One data row.
    Re(Record),
    Done(Record),
    /// Command-level error; the connection stays usable.
    Trap(Record),
    /// Device is closing the connection.
    Fatal(String),
}

impl Reply {
    /// Parses a reply sentence. Attribute words are `=key=value`; the value may contain `=`.
    pub fn parse(words: Vec<String>) -> io::Result<Self> {
        let mut iter = words.into_iter();
        let kind = iter
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty reply sentence"))?;
        if kind == "!fatal" {
            let reason = iter.collect::<Vec<_>>().join(" ");
            return Ok(Reply::Fatal(reason));
        }
        let mut record: Record = HashMap::new();
        for word in iter {
            if let Some(attr) = word.strip_prefix('=') {
                match attr.split_once('=') {
                    Some((key, value)) => record.insert(key.to_string(), value.to_string()),
                    None => record.insert(attr.to_string(), String::new()),
                };
            }
            // `.tag=` and other API words are not used by this client.
        }
        match kind.as_str() {
            "!re" => Ok(Reply::Re(record)),
            "!done" => Ok(Reply::Done(record)),
            "!trap" => Ok(Reply::Trap(record)),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown reply type {other}"),
            )),
        }
    }
}
