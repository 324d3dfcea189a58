//! Watch stream client.
//!
//! Turns a long-lived chunked HTTP response into decoded change events:
//!
//! ```text
//! raw bytes -> ChunkFramer -> RawFrame -> ChangeEvent::decode -> StreamReader
//!                                                   -> ReconnectingSource (never ends)
//! ```

mod error;
mod events;
mod framer;
mod lines;
mod reader;
mod source;
mod transport;

pub use error::{ErrorKind, FramingError, WatchError};
pub use events::{ChangeEvent, ChangeType, Resource};
pub use framer::{check_length, parse_length, ChunkFramer, RawFrame};
pub use lines::{LineReader, MAX_LINE_BYTES};
pub use reader::StreamReader;
pub use source::{ReconnectingSource, SourceState};
pub use transport::{
    parse_status_line, read_head, request_head, Body, HttpTransport, WatchTransport,
    MAX_HEAD_LINE_BYTES,
};
