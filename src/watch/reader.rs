//! Stream reader for a single watch connection.

use futures_core::Stream;
use url::Url;

use super::error::WatchError;
use super::events::ChangeEvent;
use super::framer::ChunkFramer;
use super::transport::{Body, WatchTransport};

/// Decoded events from one open connection.
///
/// The first failure is terminal: it is returned once, the connection is
/// dropped, and every later pull reports end-of-sequence. The reader never
/// reconnects on its own.
pub struct StreamReader {
    url: Url,
    framer: Option<ChunkFramer<Body>>,
    events_read: u64,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("url", &self.url.as_str())
            .field("open", &self.is_open())
            .field("events_read", &self.events_read)
            .finish()
    }
}

impl StreamReader {
    /// Open a watch connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the request cannot be issued or the
    /// server does not answer with a 2xx status.
    pub async fn connect<T>(transport: &T, url: &Url) -> Result<Self, WatchError>
    where
        T: WatchTransport + ?Sized,
    {
        let body = transport.open(url).await?;
        Ok(Self::from_body(url.clone(), body))
    }

    /// Wrap an already open response body.
    #[must_use]
    pub fn from_body(url: Url, body: Body) -> Self {
        Self {
            url,
            framer: Some(ChunkFramer::new(body)),
            events_read: 0,
        }
    }

    /// Returns true while the connection is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.framer.is_some()
    }

    /// Number of events decoded so far.
    #[must_use]
    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    /// Pull the next event.
    ///
    /// # Errors
    ///
    /// Returns a framing, decode or transport error at most once; the
    /// connection is released before the error is returned.
    pub async fn next_event(&mut self) -> Result<Option<ChangeEvent>, WatchError> {
        let Some(framer) = self.framer.as_mut() else {
            return Ok(None);
        };

        let result = match framer.next_frame().await {
            Ok(Some(frame)) => ChangeEvent::decode(&frame).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(event)) => {
                self.events_read += 1;
                Ok(Some(event))
            }
            other => {
                self.framer = None;
                other
            }
        }
    }

    /// Turn the reader into a stream that ends after its first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ChangeEvent, WatchError>> {
        futures_util::stream::unfold(self, |mut reader| async move {
            match reader.next_event().await {
                Ok(Some(event)) => Some((Ok(event), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }
}
