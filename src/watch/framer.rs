//! Chunk framer for the watch response body.
//!
//! Every record on the wire is three lines: a hexadecimal length header, the
//! payload, and a trailing marker that is discarded. The declared length
//! counts one delimiter byte that is not part of the extracted payload, so a
//! valid record satisfies `declared == payload.len() + 1`.

use tokio::io::AsyncBufRead;

use super::error::{FramingError, WatchError};
use super::lines::LineReader;

/// Payload bytes extracted from one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Vec<u8>);

impl RawFrame {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a chunk length header as base-16.
///
/// # Errors
///
/// Returns `FramingError::InvalidLength` if the header is not hexadecimal.
pub fn parse_length(header: &[u8]) -> Result<u64, FramingError> {
    let text = String::from_utf8_lossy(header);
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    // from_str_radix alone would also take a leading sign.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FramingError::InvalidLength(trimmed.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| FramingError::InvalidLength(trimmed.to_string()))
}

/// Check a payload against its declared chunk length.
///
/// # Errors
///
/// Returns `FramingError::LengthMismatch` unless `declared == payload + 1`.
pub fn check_length(declared: u64, payload: &[u8]) -> Result<(), FramingError> {
    let actual = payload.len() as u64;
    if declared == actual + 1 {
        Ok(())
    } else {
        Err(FramingError::LengthMismatch {
            expected: declared,
            actual,
        })
    }
}

/// Pull-based frame sequence over one response body.
///
/// The sequence is finite per connection and not restartable. It ends cleanly
/// when the body is exhausted, including when the last record is incomplete.
/// After an error every further pull reports end-of-sequence.
#[derive(Debug)]
pub struct ChunkFramer<R> {
    lines: LineReader<R>,
    done: bool,
}

impl<R: AsyncBufRead + Unpin> ChunkFramer<R> {
    #[must_use]
    pub fn new(body: R) -> Self {
        Self {
            lines: LineReader::new(body),
            done: false,
        }
    }

    /// Read the next frame.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Framing` when a record violates the length
    /// contract and `WatchError::Io` when reading the body fails.
    pub async fn next_frame(&mut self) -> Result<Option<RawFrame>, WatchError> {
        if self.done {
            return Ok(None);
        }

        let result = self.read_record().await;
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    async fn read_record(&mut self) -> Result<Option<RawFrame>, WatchError> {
        let Some(header) = self.lines.next_line().await? else {
            return Ok(None);
        };
        let Some(data) = self.lines.next_line().await? else {
            return Ok(None);
        };
        if self.lines.next_line().await?.is_none() {
            return Ok(None);
        }

        let declared = parse_length(&header)?;
        check_length(declared, &data)?;

        Ok(Some(RawFrame::new(data)))
    }
}
