//! LSP Transport Layer
//!
//! Content-Length framing over any async byte stream. The client uses the
//! server's stdio; tests drive it with in-memory buffers.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::Message;

/// Reads framed messages from a server
pub struct Transport<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> Transport<R> {
    pub fn new(stream: R) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    /// Read the next message from the server
    ///
    /// LSP messages are framed with headers:
    /// ```text
    /// Content-Length: 123\r\n
    /// \r\n
    /// {"jsonrpc":"2.0",...}
    /// ```
    pub async fn read_message(&mut self) -> io::Result<Message> {
        let content_length = self.read_headers().await?;

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        let json =
            String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        tracing::trace!("LSP <- {}", json);

        Message::parse(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn read_headers(&mut self) -> io::Result<usize> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Server closed connection",
                ));
            }

            let header = line.trim();
            if header.is_empty() {
                // A blank line before any header is stray output; keep reading
                if content_length.is_some() {
                    break;
                }
                continue;
            }

            if let Some((name, value)) = header.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                content_length = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
                );
            }
        }

        content_length
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing Content-Length"))
    }
}

/// Serialize and write one framed message (request, notification or
/// response)
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tracing::trace!("LSP -> {}", json);

    let frame = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::lsp::protocol::{Notification, Request};

    fn frame(json: &str) -> Vec<u8> {
        format!("Content-Length: {}\r\n\r\n{}", json.len(), json).into_bytes()
    }

    #[tokio::test]
    async fn test_reads_consecutive_frames() {
        let mut bytes = frame(r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        bytes.extend(frame(r#"{"jsonrpc":"2.0","method":"$/progress"}"#));
        let mut transport = Transport::new(bytes.as_slice());

        assert!(matches!(
            transport.read_message().await.unwrap(),
            Message::Response(_)
        ));
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Message::Notification(_)
        ));
        let eof = transport.read_message().await.unwrap_err();
        assert_eq!(eof.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_extra_headers_ignored() {
        let json = r#"{"jsonrpc":"2.0","id":3,"result":[]}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
            json.len(),
            json
        );
        let mut transport = Transport::new(raw.as_bytes());
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Message::Response(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_length_is_invalid() {
        let raw = "Content-Type: text\r\n\r\n{}";
        let mut transport = Transport::new(raw.as_bytes());
        // The blank line does not end headers without a length, so the body
        // is read as a header line and the stream then ends.
        assert!(transport.read_message().await.is_err());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let mut buf: Vec<u8> = Vec::new();
        let request = Request::new(
            9,
            "workspace/symbol",
            Some(serde_json::json!({"query": "x"})),
        );
        write_message(&mut buf, &request).await.unwrap();
        write_message(&mut buf, &Notification::new("initialized", None))
            .await
            .unwrap();

        assert!(buf.starts_with(b"Content-Length: "));

        let mut transport = Transport::new(buf.as_slice());
        match transport.read_message().await.unwrap() {
            Message::Request(req) => assert_eq!(req.method, "workspace/symbol"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Message::Notification(_)
        ));
    }
}
