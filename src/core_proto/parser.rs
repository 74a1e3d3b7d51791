use bytes::BytesMut;
use std::sync::Arc;

use super::request::Request;
use crate::core_pipe::{DuplexPipe, PipeRead};

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Request(Request),
    /// The read was paused via cancel-pending-read (TLS upgrade in flight).
    Cancelled,
    /// A line exceeded the configured cap; the offending input has been
    /// discarded up to the next CRLF.
    Oversize,
    Eof,
}

/// Reads CRLF-terminated command lines from the top of the adapter chain.
pub struct RequestReader {
    pipe: Arc<DuplexPipe>,
    buf: BytesMut,
    max_line: usize,
    discarding: bool,
}

impl RequestReader {
    pub fn new(pipe: Arc<DuplexPipe>, max_line: usize) -> Self {
        Self {
            pipe,
            buf: BytesMut::new(),
            max_line,
            discarding: false,
        }
    }

    /// Resume reading from a different pipe after an adapter-chain change.
    /// Buffered cleartext is dropped: the pause protocol guarantees the
    /// buffer is empty at the swap point.
    pub fn swap_pipe(&mut self, pipe: Arc<DuplexPipe>) {
        self.pipe = pipe;
        self.buf.clear();
        self.discarding = false;
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub async fn next(&mut self) -> ReadOutcome {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(pos + 1);
                if self.discarding {
                    self.discarding = false;
                    return ReadOutcome::Oversize;
                }
                let text = String::from_utf8_lossy(&line);
                return ReadOutcome::Request(Request::parse(&text));
            }

            if self.buf.len() > self.max_line {
                self.buf.clear();
                self.discarding = true;
            }

            match self.pipe.input.read_chunk().await {
                PipeRead::Data(chunk) => self.buf.extend_from_slice(&chunk),
                PipeRead::Cancelled => return ReadOutcome::Cancelled,
                PipeRead::Closed => return ReadOutcome::Eof,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_with_pipe(max_line: usize) -> (RequestReader, Arc<DuplexPipe>) {
        let pipe = Arc::new(DuplexPipe::new());
        (RequestReader::new(Arc::clone(&pipe), max_line), pipe)
    }

    #[tokio::test]
    async fn reads_requests_across_chunk_boundaries() {
        let (mut reader, pipe) = reader_with_pipe(512);
        pipe.input.write_all(b"USER al").await.unwrap();
        pipe.input.write_all(b"ice\r\nPASS secret\r\n").await.unwrap();

        match reader.next().await {
            ReadOutcome::Request(req) => {
                assert_eq!(req.verb, "USER");
                assert_eq!(req.arg, "alice");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        match reader.next().await {
            ReadOutcome::Request(req) => {
                assert_eq!(req.verb, "PASS");
                assert_eq!(req.arg, "secret");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversize_line_is_rejected_then_resynced() {
        let (mut reader, pipe) = reader_with_pipe(8);
        pipe.input
            .write_all(b"AAAAAAAAAAAAAAAAAAAA\r\nNOOP\r\n")
            .await
            .unwrap();

        assert_eq!(reader.next().await, ReadOutcome::Oversize);
        match reader.next().await {
            ReadOutcome::Request(req) => assert_eq!(req.verb, "NOOP"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_pauses_reader() {
        let (mut reader, pipe) = reader_with_pipe(512);
        pipe.input.cancel_pending_read();
        assert_eq!(reader.next().await, ReadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn buffered_line_surfaces_before_cancel_sentinel() {
        // A command pipelined behind another lands in the reader's buffer;
        // pausing then yields the buffered request, not Cancelled, which is
        // how a dirty TLS upgrade is detected.
        let (mut reader, pipe) = reader_with_pipe(512);
        pipe.input.write_all(b"AUTH TLS\r\nNOOP\r\n").await.unwrap();
        match reader.next().await {
            ReadOutcome::Request(req) => assert_eq!(req.verb, "AUTH"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        pipe.input.cancel_pending_read();
        match reader.next().await {
            ReadOutcome::Request(req) => assert_eq!(req.verb, "NOOP"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        // The sentinel was never consumed; roll it back like the upgrade
        // path does and the pipe reads normally again.
        pipe.input.clear_cancel_pending();
        pipe.input.write_all(b"QUIT\r\n").await.unwrap();
        match reader.next().await {
            ReadOutcome::Request(req) => assert_eq!(req.verb, "QUIT"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn eof_on_close() {
        let (mut reader, pipe) = reader_with_pipe(512);
        pipe.input.close();
        assert_eq!(reader.next().await, ReadOutcome::Eof);
    }
}
