//! Line reader over a child pipe.
//!
//! Yields complete lines as raw bytes so pass-through stays byte-exact.
//! A line split across many underlying reads is reassembled by
//! `read_until`; the trailing `\n` (and a `\r` before it) is stripped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Next complete line, `None` at end-of-stream.
    ///
    /// A final line without a terminating newline is still returned.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(std::mem::take(&mut self.buf)))
    }
}
