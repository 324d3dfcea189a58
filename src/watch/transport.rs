//! Streaming GET transport.
//!
//! The framer consumes the body with its chunked transfer framing intact, so
//! the transport hands back the raw connection once the status line and
//! headers have been read.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use url::Url;

use super::error::{FramingError, WatchError};
use super::lines::LineReader;

/// Timeout for establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of response header lines accepted.
const MAX_HEADER_LINES: usize = 128;

/// Longest status or header line accepted.
pub const MAX_HEAD_LINE_BYTES: usize = 64 * 1024;

/// Response body of an open watch request.
///
/// Dropping it releases the connection.
pub type Body = Box<dyn AsyncBufRead + Send + Unpin>;

/// Opens one long-lived streaming GET request.
#[async_trait]
pub trait WatchTransport: Send + Sync {
    /// Issue the request and return its body once a 2xx status was received.
    async fn open(&self, url: &Url) -> Result<Body, WatchError>;
}

/// HTTP/1.1 transport over plain TCP.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport;

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Build the request head for a watch GET.
#[must_use]
pub fn request_head(url: &Url) -> String {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host = url.host_str().unwrap_or_default();
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    format!(
        "GET {target} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Accept: application/json\r\n\
         User-Agent: {}/{}\r\n\
         Connection: close\r\n\
         \r\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    )
}

/// Parse an HTTP status line into its code and reason phrase.
///
/// # Errors
///
/// Returns `WatchError::InvalidResponse` if the line is not an HTTP status line.
pub fn parse_status_line(line: &str) -> Result<(u16, String), WatchError> {
    let line = line.trim_end();
    let mut parts = line.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(WatchError::InvalidResponse(format!(
            "bad status line: {line:?}"
        )));
    }

    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| WatchError::InvalidResponse(format!("bad status code: {line:?}")))?;
    let reason = parts.next().unwrap_or_default().to_string();

    Ok((status, reason))
}

/// Read the status line and headers, leaving the reader at the body.
///
/// Every line is bounded by [`MAX_HEAD_LINE_BYTES`] and at most
/// `MAX_HEADER_LINES` headers are accepted.
///
/// # Errors
///
/// Returns `WatchError::InvalidResponse` if the head is malformed, too large
/// or cut short, and `WatchError::Io` on read failure.
pub async fn read_head<R>(reader: &mut R) -> Result<(u16, String), WatchError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LineReader::with_limit(reader, MAX_HEAD_LINE_BYTES);

    let status_line = next_head_line(&mut lines).await?.ok_or_else(|| {
        WatchError::InvalidResponse("connection closed before status line".to_string())
    })?;
    let (status, reason) = parse_status_line(&status_line)?;

    for _ in 0..MAX_HEADER_LINES {
        let Some(header) = next_head_line(&mut lines).await? else {
            return Err(WatchError::InvalidResponse(
                "connection closed inside headers".to_string(),
            ));
        };
        if header.is_empty() {
            return Ok((status, reason));
        }
        tracing::trace!(header = %header, "Response header");
    }

    Err(WatchError::InvalidResponse(format!(
        "more than {MAX_HEADER_LINES} header lines"
    )))
}

async fn next_head_line<R>(lines: &mut LineReader<R>) -> Result<Option<String>, WatchError>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(line) => Ok(line.map(|l| String::from_utf8_lossy(&l).into_owned())),
        Err(WatchError::Framing(FramingError::LineTooLong { limit })) => Err(
            WatchError::InvalidResponse(format!("response head line exceeds {limit} bytes")),
        ),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl WatchTransport for HttpTransport {
    async fn open(&self, url: &Url) -> Result<Body, WatchError> {
        if url.scheme() != "http" {
            return Err(WatchError::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| WatchError::MissingHost(url.to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{host}:{port}");

        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(WatchError::Connect { addr, source }),
            Err(_) => {
                return Err(WatchError::Connect {
                    addr,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connection timed out",
                    ),
                })
            }
        };

        let mut stream = BufReader::new(stream);
        stream
            .get_mut()
            .write_all(request_head(url).as_bytes())
            .await?;

        let (status, reason) = read_head(&mut stream).await?;
        if !(200..300).contains(&status) {
            return Err(WatchError::Status { status, reason });
        }

        tracing::debug!(url = %url, status, "Watch stream opened");
        Ok(Box::new(stream))
    }
}
