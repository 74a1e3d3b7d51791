use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::pipe::{BytePipe, DuplexPipe, PipeRead};

/// Adapts one endpoint of a [`DuplexPipe`] to `AsyncRead + AsyncWrite` so a
/// TLS engine can run on top of it.
pub struct PipeStream {
    read_pipe: BytePipe,
    write_pipe: BytePipe,
    /// Bytes from the last chunk that did not fit the caller's buffer.
    leftover: Option<Bytes>,
}

impl PipeStream {
    pub fn new(read_pipe: BytePipe, write_pipe: BytePipe) -> Self {
        Self {
            read_pipe,
            write_pipe,
            leftover: None,
        }
    }

    /// The upper-layer view of a boundary pipe: inbound bytes are read from
    /// `input`, outbound bytes are written to `output`.
    pub fn upper(pipe: &DuplexPipe) -> Self {
        Self::new(pipe.input.clone(), pipe.output.clone())
    }

    fn fill(&mut self, buf: &mut ReadBuf<'_>, mut chunk: Bytes) {
        let take = chunk.len().min(buf.remaining());
        buf.put_slice(&chunk.split_to(take));
        if !chunk.is_empty() {
            self.leftover = Some(chunk);
        }
    }
}

impl AsyncRead for PipeStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(chunk) = self.leftover.take() {
            self.fill(buf, chunk);
            return Poll::Ready(Ok(()));
        }
        match self.read_pipe.poll_read_chunk(cx) {
            Poll::Ready(PipeRead::Data(chunk)) => {
                self.fill(buf, chunk);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(PipeRead::Closed) => Poll::Ready(Ok(())),
            Poll::Ready(PipeRead::Cancelled) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "pipe read cancelled",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl AsyncWrite for PipeStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        let chunk = Bytes::copy_from_slice(buf);
        match self.write_pipe.poll_write_chunk(cx, &chunk) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(buf.len())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.write_pipe.close();
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn stream_reads_and_writes_through_pipes() {
        let boundary = DuplexPipe::new();
        let mut stream = PipeStream::upper(&boundary);

        boundary.input.write_all(b"inbound").await.unwrap();
        let mut buf = [0u8; 16];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"inbound");

        stream.write_all(b"outbound").await.unwrap();
        match boundary.output.read_chunk().await {
            PipeRead::Data(chunk) => assert_eq!(&chunk[..], b"outbound"),
            other => panic!("unexpected read outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn short_reads_keep_leftover_bytes() {
        let boundary = DuplexPipe::new();
        let mut stream = PipeStream::upper(&boundary);

        boundary.input.write_all(b"abcdef").await.unwrap();
        let mut buf = [0u8; 4];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abcd");
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ef");
    }

    #[tokio::test]
    async fn eof_after_close() {
        let boundary = DuplexPipe::new();
        let mut stream = PipeStream::upper(&boundary);
        boundary.input.close();
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
    }
}
