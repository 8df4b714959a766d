use std::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use bytes::{BufMut, Bytes, BytesMut};
use http::{Method, Request, Response, Uri, header, response};
use itertools::Itertools;
use log::{debug, trace};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf},
    net::{TcpStream, lookup_host},
};
use tokio_native_tls::{TlsConnector as TokioTlsConnector, TlsStream, native_tls::TlsConnector};

const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("URL error: no host name")]
    NoHost,
    #[error("I/O error: all connection attempts failed")]
    ConnectFailed,
    #[error("HTTP error: response is incomplete")]
    IncompleteResponse,
}

pub enum MaybeTlsStream<S> {
    Plain(S),
    Tls(TlsStream<S>),
}

// Both variants are plain tokio streams; every poll method forwards to
// whichever one we hold.
macro_rules! forward_poll {
    ($self:ident.$method:ident($($arg:ident),*)) => {
        match $self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).$method($($arg),*),
            MaybeTlsStream::Tls(s) => Pin::new(s).$method($($arg),*),
        }
    };
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncRead for MaybeTlsStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        forward_poll!(self.poll_read(cx, buf))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncWrite for MaybeTlsStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        forward_poll!(self.poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        forward_poll!(self.poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        forward_poll!(self.poll_shutdown(cx))
    }
}

/// Build a one-shot GET request for `uri`. The connection is closed after the
/// response, which lets the reader treat EOF as end of body.
pub fn get_request(uri: &str) -> anyhow::Result<Request<()>> {
    let uri = uri.parse::<Uri>()?;
    let host = uri.host().ok_or(HttpError::NoHost)?;

    if host.is_empty() {
        return Err(HttpError::NoHost.into());
    }

    let host_header = match uri.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };

    let req = Request::builder()
        .method(Method::GET)
        .header(header::HOST, host_header)
        .header(header::CONNECTION, "close")
        .header(header::ACCEPT, "application/json")
        .header(header::ACCEPT_ENCODING, "identity")
        .uri(&uri)
        .body(())?;

    Ok(req)
}

/// Send `req` and read the full response. Each call opens a fresh connection;
/// the panel endpoints are tiny and polled on the order of seconds, so
/// keep-alive buys nothing.
pub async fn send_request(
    req: Request<()>,
    tls: bool,
    prefer_ipv6: bool,
) -> anyhow::Result<Response<Bytes>> {
    let domain = req.uri().host().ok_or(HttpError::NoHost)?;
    let port = req.uri().port_u16().unwrap_or(if tls { 443 } else { 80 });

    trace!("connecting to ({domain}, {port})");
    let stream = connect((domain, port), prefer_ipv6).await?;

    let mut stream = if tls {
        let connector = TokioTlsConnector::from(TlsConnector::new()?);
        MaybeTlsStream::Tls(connector.connect(domain, stream).await?)
    } else {
        MaybeTlsStream::Plain(stream)
    };

    stream.write_all(&assemble_request(&req)).await?;
    stream.flush().await?;

    let mut buffer = BytesMut::with_capacity(512);
    while stream.read_buf(&mut buffer).await? != 0 {}

    let buffer = buffer.freeze();
    trace!("Response: {:?}", String::from_utf8_lossy(&buffer));

    parse_response(buffer)
}

/// Resolve and connect, interleaving address families so one broken family
/// cannot starve the other, trying each candidate in turn with a short
/// per-attempt timeout.
async fn connect(addr: (&str, u16), prefer_ipv6: bool) -> anyhow::Result<TcpStream> {
    let addrs = {
        let (v4, v6): (Vec<_>, Vec<_>) = lookup_host(addr).await?.partition(|a| a.is_ipv4());

        let (first, second) = if prefer_ipv6 { (v6, v4) } else { (v4, v6) };
        first.into_iter().interleave(second).collect::<Vec<_>>()
    };

    for addr in addrs {
        match tokio::time::timeout(CONNECT_ATTEMPT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!("connection established with {addr}");
                return Ok(stream);
            }
            Ok(Err(e)) => trace!("connection attempt to {addr} failed: {e}"),
            Err(_) => trace!("connection attempt to {addr} timed out"),
        }
    }

    Err(HttpError::ConnectFailed.into())
}

fn assemble_request(req: &Request<()>) -> Bytes {
    let mut buffer = BytesMut::with_capacity(128);

    buffer.put_slice(
        format!(
            "{} {} {:?}\r\n",
            req.method(),
            req.uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/"),
            req.version()
        )
        .as_bytes(),
    );

    for (name, value) in req.headers() {
        buffer.put_slice(name.as_str().as_bytes());
        buffer.put_slice(b": ");
        buffer.put(value.as_bytes());
        buffer.put_slice(b"\r\n");
    }

    buffer.put_slice(b"\r\n");

    trace!("Request: {:?}", String::from_utf8_lossy(&buffer));

    buffer.freeze()
}

fn parse_response(bytes: Bytes) -> anyhow::Result<Response<Bytes>> {
    const MAX_HEADERS: usize = 64;
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut headers);

    let body_start = match parsed.parse(&bytes)? {
        httparse::Status::Complete(index) => index,
        httparse::Status::Partial => return Err(HttpError::IncompleteResponse.into()),
    };

    // httparse only speaks HTTP/1.x; anything but an explicit 1.0 is 1.1.
    let version = match parsed.version {
        Some(0) => http::Version::HTTP_10,
        _ => http::Version::HTTP_11,
    };

    let mut builder = response::Builder::new()
        .status(parsed.code.unwrap_or(200))
        .version(version);
    for header in parsed.headers.iter() {
        builder = builder.header(header.name, header.value);
    }

    Ok(builder.body(bytes.slice(body_start..))?)
}
