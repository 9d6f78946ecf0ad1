//! Per-connection request handling.

use crate::STREAM_CHUNK_SIZE;
use crate::context::CoreContext;
use crate::error::locator::LocatorError;
use crate::error::server::ServerError;
use crate::locator::OpenedResource;
use crate::mime::ensure_mime_type;
use crate::server::request::RequestLine;
use crate::server::response::ResponseHead;
use crate::virtual_path::ResourceLocation;

use common::HttpStatusCode;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

const MAX_LINE_LENGTH: u64 = 8 * 1024;
const MAX_HEADER_LINES: usize = 128;
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Accept connections until shutdown is signalled or the server is dropped.
///
/// Each connection runs in its own task and is cancelled by the same signal.
pub(crate) async fn accept_loop(
    listener: TcpListener,
    context: Arc<CoreContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("Client connecting from {}", addr);
                    let context = Arc::clone(&context);
                    let mut connection_shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_connection(stream, addr, context) => {
                                if let Err(e) = result {
                                    error!("Error handling request from {}: {}", addr, e);
                                }
                            }
                            _ = connection_shutdown.changed() => {
                                debug!("Connection from {} cancelled by shutdown", addr);
                            }
                        }
                    });
                }
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }
    }

    info!("Accept loop stopped, listener closed");
}

/// Serve one request on `stream`, then close it.
///
/// Protocol errors are answered with a status code; I/O errors after the response
/// head has been written simply end the connection.
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    context: Arc<CoreContext>,
) -> Result<(), ServerError> {
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {}", addr);
        return Ok(());
    }

    let (read_half, write_half) = stream.split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    let Some(line) = read_line(&mut reader).await? else {
        debug!("Client {} closed before sending a request", addr);
        return Ok(());
    };
    debug!("Request line: {}", line);

    let request = RequestLine::parse(&line);
    if request.is_ok() {
        consume_headers(&mut reader).await?;
    }

    match request {
        Err(e) => {
            debug!("Bad request from {}: {}", addr, e);
            send_status(&mut writer, HttpStatusCode::BAD_REQUEST, "Malformed request").await?;
        }
        Ok(request) if !request.is_get() => {
            send_status(
                &mut writer,
                HttpStatusCode::METHOD_NOT_ALLOWED,
                "Only GET supported",
            )
            .await?;
        }
        Ok(request) => serve_path(&mut writer, &context, &request.path).await?,
    }

    writer.shutdown().await.ok();
    Ok(())
}

/// Resolve `raw_path`, open it, and stream it back.
async fn serve_path<W>(
    writer: &mut W,
    context: &CoreContext,
    raw_path: &str,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    debug!("Serving path {}", raw_path);
    let resolver = context.resolver();

    let Some(target) = resolver.resolve(raw_path) else {
        warn!("No target resolved for {}", raw_path);
        return send_status(writer, HttpStatusCode::NOT_FOUND, "Not Found").await;
    };

    let (resource, serving) = match open(context, &target).await {
        Ok(resource) => (resource, target),
        Err(e) if e.is_not_found() && resolver.is_default_document_request(&target) => {
            let fallback = resolver.default_location();
            debug!("{} not found, falling back to {}", target, fallback);
            match open(context, &fallback).await {
                Ok(resource) => (resource, fallback),
                Err(e) => return send_locator_error(writer, raw_path, e).await,
            }
        }
        Err(e) => return send_locator_error(writer, raw_path, e).await,
    };

    let content_type = ensure_mime_type(serving.as_str(), resource.content_type.as_deref());
    let head = ResponseHead::new(HttpStatusCode::OK, content_type)
        .with_content_length(resource.length);

    writer.write_all(&head.to_bytes()).await?;
    stream_body(writer, resource).await?;
    writer.flush().await?;

    debug!("Served {} from {}", raw_path, serving);
    Ok(())
}

async fn open(
    context: &CoreContext,
    location: &ResourceLocation,
) -> Result<OpenedResource, LocatorError> {
    context.locator().open(location).await
}

async fn stream_body<W>(writer: &mut W, mut resource: OpenedResource) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let read = resource.reader.read(&mut buffer).await?;
        if read == 0 {
            return Ok(());
        }
        writer.write_all(&buffer[..read]).await?;
    }
}

async fn send_locator_error<W>(
    writer: &mut W,
    raw_path: &str,
    error: LocatorError,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    if error.is_not_found() {
        warn!("File not found for {}: {}", raw_path, error);
        send_status(writer, HttpStatusCode::NOT_FOUND, "Not Found").await
    } else {
        error!("Failed serving {}: {}", raw_path, error);
        send_status(writer, HttpStatusCode::INTERNAL_SERVER_ERROR, "Error").await
    }
}

async fn send_status<W>(
    writer: &mut W,
    status: HttpStatusCode,
    message: &str,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    if status.is_server_error() {
        warn!("Responding {} for {}", status, message);
    } else if status.is_client_error() {
        debug!("Responding {} for {}", status, message);
    }
    let head = ResponseHead::new(status, "text/plain")
        .with_content_length(Some(message.len() as u64));

    writer.write_all(&head.to_bytes()).await?;
    writer.write_all(message.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one CRLF- or LF-terminated line, or `None` at end of stream.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buffer = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH)
        .read_until(b'\n', &mut buffer)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    while matches!(buffer.last(), Some(b'\n' | b'\r')) {
        buffer.pop();
    }

    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

/// Discard header lines up to the blank terminator.
async fn consume_headers<R>(reader: &mut R) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
{
    for _ in 0..MAX_HEADER_LINES {
        match read_line(reader).await? {
            Some(header) if !header.is_empty() => trace!("Header: {}", header),
            _ => return Ok(()),
        }
    }
    Ok(())
}
