use bytes::Bytes;
use std::collections::VecDeque;
use std::future::poll_fn;
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::constants::PIPE_CAPACITY;

/// Outcome of a read on a [`BytePipe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeRead {
    Data(Bytes),
    /// A pending read was woken by [`BytePipe::cancel_pending_read`]. The
    /// pipe stays open and any buffered bytes stay put for the next reader.
    Cancelled,
    /// The pipe was closed and the buffer is drained.
    Closed,
}

struct PipeState {
    buffer: VecDeque<Bytes>,
    buffered: usize,
    capacity: usize,
    closed: bool,
    cancel_pending: bool,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
}

/// A bounded in-memory byte queue connecting two tasks.
///
/// Writers suspend while the buffer is at capacity, readers suspend while it
/// is empty. `cancel_pending_read` wakes a suspended reader with a
/// [`PipeRead::Cancelled`] sentinel without disturbing buffered bytes, which
/// is how a reader is paused across a TLS upgrade.
#[derive(Clone)]
pub struct BytePipe {
    state: Arc<Mutex<PipeState>>,
}

impl BytePipe {
    pub fn new() -> Self {
        Self::with_capacity(PIPE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(PipeState {
                buffer: VecDeque::new(),
                buffered: 0,
                capacity,
                closed: false,
                cancel_pending: false,
                read_waker: None,
                write_waker: None,
            })),
        }
    }

    /// Cancellation takes priority over buffered data: a paused reader must
    /// stop before it can consume bytes that belong to the next layer.
    pub fn poll_read_chunk(&self, cx: &mut Context<'_>) -> Poll<PipeRead> {
        let mut state = self.state.lock().unwrap();
        if state.cancel_pending {
            state.cancel_pending = false;
            return Poll::Ready(PipeRead::Cancelled);
        }
        if let Some(chunk) = state.buffer.pop_front() {
            state.buffered -= chunk.len();
            if let Some(waker) = state.write_waker.take() {
                waker.wake();
            }
            return Poll::Ready(PipeRead::Data(chunk));
        }
        if state.closed {
            return Poll::Ready(PipeRead::Closed);
        }
        state.read_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    pub fn poll_write_chunk(&self, cx: &mut Context<'_>, chunk: &Bytes) -> Poll<io::Result<()>> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe closed",
            )));
        }
        if state.buffered >= state.capacity {
            state.write_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        state.buffered += chunk.len();
        state.buffer.push_back(chunk.clone());
        if let Some(waker) = state.read_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(()))
    }

    pub async fn read_chunk(&self) -> PipeRead {
        poll_fn(|cx| self.poll_read_chunk(cx)).await
    }

    pub async fn write_chunk(&self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        poll_fn(|cx| self.poll_write_chunk(cx, &chunk)).await
    }

    pub async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        self.write_chunk(Bytes::copy_from_slice(data)).await
    }

    /// Wake a suspended reader with [`PipeRead::Cancelled`]. If no read is
    /// pending, the next read observes the sentinel instead.
    pub fn cancel_pending_read(&self) {
        let mut state = self.state.lock().unwrap();
        state.cancel_pending = true;
        if let Some(waker) = state.read_waker.take() {
            waker.wake();
        }
    }

    /// Drop a cancel sentinel nobody consumed. The flag is one-shot and not
    /// scoped to a reader, so a caller rolling back the pause that set it
    /// must clear it, or the next reader of the pipe sees a stale
    /// [`PipeRead::Cancelled`].
    pub fn clear_cancel_pending(&self) {
        self.state.lock().unwrap().cancel_pending = false;
    }

    /// Close the pipe. Readers drain buffered bytes and then observe
    /// [`PipeRead::Closed`]; writers observe `BrokenPipe`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        if let Some(waker) = state.read_waker.take() {
            waker.wake();
        }
        if let Some(waker) = state.write_waker.take() {
            waker.wake();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

impl Default for BytePipe {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipe pair for one boundary between two layers of the connection stack.
///
/// `input` carries inbound bytes (socket towards the parser), `output`
/// carries outbound bytes (responses towards the socket). The lower layer
/// writes `input` and reads `output`; the upper layer does the reverse.
pub struct DuplexPipe {
    pub input: BytePipe,
    pub output: BytePipe,
}

impl DuplexPipe {
    pub fn new() -> Self {
        Self {
            input: BytePipe::new(),
            output: BytePipe::new(),
        }
    }

    pub fn close(&self) {
        self.input.close();
        self.output.close();
    }
}

impl Default for DuplexPipe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let pipe = BytePipe::new();
        pipe.write_all(b"hello").await.unwrap();
        match pipe.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"hello"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn read_suspends_until_write() {
        let pipe = BytePipe::new();
        let reader = pipe.clone();
        let handle = tokio::spawn(async move { reader.read_chunk().await });
        tokio::task::yield_now().await;
        pipe.write_all(b"late").await.unwrap();
        match handle.await.unwrap() {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"late"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_wakes_blocked_reader_without_closing() {
        let pipe = BytePipe::new();
        let reader = pipe.clone();
        let handle = tokio::spawn(async move { reader.read_chunk().await });
        tokio::task::yield_now().await;
        pipe.cancel_pending_read();
        assert_eq!(handle.await.unwrap(), PipeRead::Cancelled);

        // The pipe is still usable afterwards.
        pipe.write_all(b"after").await.unwrap();
        match pipe.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"after"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_takes_priority_over_buffered_data() {
        let pipe = BytePipe::new();
        pipe.write_all(b"handshake bytes").await.unwrap();
        pipe.cancel_pending_read();
        assert_eq!(pipe.read_chunk().await, PipeRead::Cancelled);
        // Buffered bytes survive for the next layer.
        match pipe.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"handshake bytes"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn cleared_cancel_is_not_observed() {
        let pipe = BytePipe::new();
        pipe.cancel_pending_read();
        pipe.clear_cancel_pending();
        pipe.write_all(b"clean").await.unwrap();
        match pipe.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"clean"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn close_drains_then_reports_closed() {
        let pipe = BytePipe::new();
        pipe.write_all(b"tail").await.unwrap();
        pipe.close();
        match pipe.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"tail"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
        assert_eq!(pipe.read_chunk().await, PipeRead::Closed);
        assert!(pipe.write_all(b"x").await.is_err());
    }

    #[tokio::test]
    async fn writer_suspends_at_capacity() {
        let pipe = BytePipe::with_capacity(4);
        pipe.write_all(b"1234").await.unwrap();

        let writer = pipe.clone();
        let handle = tokio::spawn(async move { writer.write_all(b"5678").await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        // Draining makes room and wakes the writer.
        let _ = pipe.read_chunk().await;
        handle.await.unwrap().unwrap();
    }
}
