//! Cancelable send-then-receive exchange.
//!
//! The exchange (greeting, write, read, decode) runs on its own task. The
//! caller races that task against the deadline; when the deadline wins the
//! caller signals the task, which drops the stream (closing the socket and
//! aborting any pending read or write), and the caller joins it before
//! reporting the timeout. No task outlives the call.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;

use crate::domain::{Command, FieldMap};
use crate::trans::{decoder, encoder, TransError, BUSY_MESSAGE, END_MESSAGE, WELCOME_MESSAGE};

/// Run one protocol exchange for `command` on `stream`, bounded by `deadline`.
///
/// The stream is consumed: it is closed when the call returns, whatever the
/// outcome.
pub async fn exchange<S>(stream: S, command: &Command, deadline: Duration) -> Result<FieldMap, TransError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let request = encoder::encode(command);
    let (close_tx, close_rx) = oneshot::channel::<()>();

    let mut task = tokio::spawn(async move {
        let mut stream = stream;
        tokio::select! {
            result = converse(&mut stream, &request) => result,
            // Fires on an explicit close and when the caller goes away.
            _ = close_rx => Err(TransError::Io(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "connection closed before the exchange completed",
            ))),
        }
    });

    tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::time::sleep(deadline) => {
            let _ = close_tx.send(());
            if let Err(e) = task.await {
                tracing::error!(command = %command.name, error = %e, "Exchange task failed after close");
            }
            Err(TransError::Timeout(deadline))
        }
    }
}

/// Longest greeting line accepted; anything longer is a protocol error.
const MAX_GREETING_LEN: u64 = 64;

async fn converse<S>(stream: &mut S, request: &[u8]) -> Result<FieldMap, TransError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    let mut greeting = Vec::with_capacity(WELCOME_MESSAGE.len());
    (&mut reader)
        .take(MAX_GREETING_LEN)
        .read_until(b'\n', &mut greeting)
        .await?;
    if greeting != WELCOME_MESSAGE {
        if greeting == BUSY_MESSAGE {
            return Err(TransError::Busy);
        }
        return Err(TransError::Protocol {
            greeting: String::from_utf8_lossy(&greeting).into_owned(),
        });
    }

    let writer = reader.get_mut();
    writer.write_all(request).await?;
    writer.flush().await?;

    let body = read_body(&mut reader).await?;
    tracing::trace!(bytes = body.len(), "Trans response received");
    Ok(decoder::decode(&body)?)
}

/// Read until the peer closes or a complete body followed by `end\n` has
/// arrived. Returns the body with the marker stripped.
async fn read_body<R>(reader: &mut R) -> Result<Vec<u8>, TransError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(512);
    loop {
        if reader.read_buf(&mut buf).await? == 0 {
            if buf.ends_with(END_MESSAGE) {
                buf.truncate(buf.len() - END_MESSAGE.len());
            }
            return Ok(buf);
        }
        if let Some(len) = complete_body(&buf) {
            buf.truncate(len);
            return Ok(buf);
        }
    }
}

/// Length of the body if `buf` holds a whole response.
///
/// A trailing `end\n` may sit inside a blob that is still arriving, so the
/// marker only counts when everything before it decodes.
fn complete_body(buf: &[u8]) -> Option<usize> {
    let at_line_start = buf == END_MESSAGE
        || (buf.ends_with(END_MESSAGE) && buf[..buf.len() - END_MESSAGE.len()].ends_with(b"\n"));
    if !at_line_start {
        return None;
    }
    let len = buf.len() - END_MESSAGE.len();
    decoder::for_each_field(&buf[..len], |_, _| {}).ok().map(|_| len)
}
