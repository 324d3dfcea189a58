//! Line splitting over an async byte source.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::error::{FramingError, WatchError};

/// Longest line accepted before the stream is treated as malformed.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Pull-based line reader.
///
/// Lines are split on `\n` with a trailing `\r` removed, so both LF and CRLF
/// terminated input produce the same lines. A final unterminated line is
/// still returned.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    limit: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_LINE_BYTES)
    }

    /// Create a reader with a custom line length limit.
    #[must_use]
    pub fn with_limit(inner: R, limit: usize) -> Self {
        Self { inner, limit }
    }

    /// Read the next line without its terminator.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Io` on read failure and
    /// `FramingError::LineTooLong` if a line exceeds the limit.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, WatchError> {
        let mut line = Vec::new();
        let max = u64::try_from(self.limit).unwrap_or(u64::MAX).saturating_add(2);
        let read = (&mut self.inner)
            .take(max)
            .read_until(b'\n', &mut line)
            .await?;

        if read == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }

        if line.len() > self.limit {
            return Err(FramingError::LineTooLong { limit: self.limit }.into());
        }

        Ok(Some(line))
    }
}
