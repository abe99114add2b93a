//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP uses newline-delimited JSON over stdin/stdout. Nothing else may be
//! written to stdout while the server runs; logs go to stderr.

use std::io::{self, BufRead, Write};

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Transport for reading/writing JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self {
            reader: Box::new(io::BufReader::new(io::stdin())),
            writer: Box::new(io::stdout()),
        }
    }

    /// Create a transport over any reader/writer pair.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read the next JSON-RPC message. Blank lines are skipped; `Ok(None)`
    /// means EOF.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            tracing::debug!(message = message, "Received");

            // Requests carry an id, notifications do not
            if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(message) {
                return Ok(Some(IncomingMessage::Request(request)));
            }
            if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(message) {
                return Ok(Some(IncomingMessage::Notification(notification)));
            }

            tracing::warn!(message = message, "Failed to parse message");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid JSON-RPC message: {}", message),
            ));
        }
    }

    /// Write a JSON-RPC response as one line.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        tracing::debug!(message = %json, "Sending");

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Writer whose output stays readable after the transport takes it.
    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn transport(input: &str) -> StdioTransport {
        StdioTransport::new(
            Box::new(Cursor::new(input.to_string())),
            Box::new(io::sink()),
        )
    }

    #[test]
    fn test_read_request() {
        let mut transport =
            transport("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Request(req)) => {
                assert_eq!(req.method, "tools/list");
                assert_eq!(req.id, RequestId::Number(1));
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_read_notification() {
        let mut transport =
            transport("{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Notification(notif)) => {
                assert_eq!(notif.method, "notifications/initialized");
            }
            other => panic!("Expected notification, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let mut transport =
            transport("\n\n{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"ping\"}\n\n");

        assert!(matches!(
            transport.read_message().unwrap(),
            Some(IncomingMessage::Request(_))
        ));
        assert!(transport.read_message().unwrap().is_none());
    }

    #[test]
    fn test_invalid_message() {
        let mut transport = transport("not json\n");
        let err = transport.read_message().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_eof() {
        let mut transport = transport("");
        assert!(transport.read_message().unwrap().is_none());
    }

    #[test]
    fn test_write_response() {
        let writer = SharedWriter::default();
        let mut transport =
            StdioTransport::new(Box::new(Cursor::new(Vec::new())), Box::new(writer.clone()));

        let response =
            JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        transport.write_response(&response).unwrap();

        let output = String::from_utf8(writer.0.lock().unwrap().clone()).unwrap();
        assert!(output.ends_with('\n'));
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"id\":1"));
    }
}
