use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Provides a facility to read LF-terminated lines from a stream. A CR
/// immediately before the LF is dropped too, so CRLF scripts read the same.
pub struct LineReader<T: AsyncRead + Unpin> {
    /// Stores data that's been read in but lacks an LF.
    buf: BytesMut,
    /// Index in buf before which no LF has been seen.
    scanned: usize,
    /// Data source
    reader: T,
    /// On a reading error, this field is set and its value returned once the
    /// buffer is drained of pending lines.
    pending_error: Option<io::Error>,
}

impl<T: AsyncRead + Unpin> LineReader<T> {
    /// Reads a line from the internal buffer and/or reader. On an end-of-stream
    /// condition, returns any unterminated final line, then `None`.
    ///
    /// This function is cancel-safe: its only async operation is a `read_buf`
    /// against the internal `reader`, and so it has the same guarantees:
    /// either a complete read occurs and is processed, or this is cancelled.
    ///
    /// On a read error, the error value is returned after processing all
    /// pending lines in the internal buffer.
    pub async fn read_line(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            // Only scan bytes we haven't looked at before, keeping
            // O(bytes_read) behaviour across partial reads.
            if let Some(eol) =
                self.buf[self.scanned..].iter().position(|&c| c == b'\n')
            {
                let line = self.buf.split_to(self.scanned + eol + 1).freeze();
                self.scanned = 0;

                return Ok(Some(trim_line_ending(line)));
            }

            self.scanned = self.buf.len();

            // Try reading from the reader and accumulating in the buffer; if we
            // receive no bytes, assume the stream is finished.
            let n_bytes_read = match self.reader.read_buf(&mut self.buf).await
            {
                Ok(n) => n,
                Err(e) => {
                    self.pending_error = Some(e);
                    0
                },
            };

            if n_bytes_read == 0 {
                if let Some(e) = self.pending_error.take() {
                    return Err(e);
                }

                // A script's last line may lack its LF.
                if self.buf.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                let line = self.buf.split().freeze();
                return Ok(Some(trim_line_ending(line)));
            }
        }
    }
}

fn trim_line_ending(mut line: Bytes) -> Bytes {
    if line.last() == Some(&b'\n') {
        line.truncate(line.len() - 1);
    }
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line
}

impl<T: AsyncRead + Unpin> From<T> for LineReader<T> {
    fn from(value: T) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            reader: value,
            pending_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{self, AsyncWriteExt};
    use tokio::task::yield_now;

    #[tokio::test]
    async fn test() {
        // When properly read, each nth line should read b"test:{n}".
        let tests: &[&[u8]] = &[
            // Simple reassembly
            b"test:",
            b"1\n",
            // CRLF split across reads
            b"test:",
            b"2\r",
            b"\n",
            // Several lines in one read
            b"test:3\ntest:4\r\ntest:5\n",
            // Line ending starts the next read
            b"test:6",
            b"\ntest:7\n",
            // Final line without LF
            b"test:8",
        ];

        // Set the buffer large enough that our tests will never overflow it.
        // We can ensure correct fragmentation of reads by explicitly yielding
        // between each.
        let (mut client, server) = io::duplex(4096);

        tokio::spawn(async move {
            for buf in tests {
                client.write_all(buf).await.unwrap();
                yield_now().await;
            }
        });

        let mut lr: LineReader<_> = server.into();

        for n in 1..=8 {
            assert_eq!(
                lr.read_line().await.unwrap().unwrap(),
                format!("test:{n}")
            );
        }

        assert!(lr.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_lines_preserved() {
        let mut lr: LineReader<_> = (&b"a\n\n\r\nb\n"[..]).into();

        for expected in ["a", "", "", "b"] {
            assert_eq!(lr.read_line().await.unwrap().unwrap(), expected);
        }
        assert!(lr.read_line().await.unwrap().is_none());
    }
}
