//! Newline-delimited JSON transport.
//!
//! One connection, one `serve` call: requests and commands arrive on
//! the read side one JSON object per line, replies and events leave on
//! the write side the same way. Each request runs on its own task so a
//! slow scan cannot stall an unrelated read; a single writer task owns
//! the output stream. The event listener registered here lives exactly
//! as long as the connection.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use super::gateway::Gateway;
use super::protocol::{Command, Reply, Request};
use crate::error::HostError;

/// Serve one presentation-layer connection until its input closes.
pub async fn serve<R, W>(gateway: Arc<Gateway>, input: R, output: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_loop(output, out_rx));

    let mut events = gateway.subscribe();
    let event_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if event_tx.send(json).is_err() {
                        break;
                    }
                }
                // At-most-once delivery: a lagging listener loses
                // events rather than stalling the producers.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event listener lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        dispatch_line(&gateway, &line, &out_tx);
    }

    // Input closed: deregister this connection's listener and let the
    // writer drain.
    forwarder.abort();
    drop(out_tx);
    let _ = writer.await;
    Ok(())
}

async fn write_loop<W>(mut output: W, mut out_rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = out_rx.recv().await {
        if output.write_all(line.as_bytes()).await.is_err()
            || output.write_all(b"\n").await.is_err()
            || output.flush().await.is_err()
        {
            break;
        }
    }
}

/// Messages carrying an `id` are requests awaiting a correlated reply;
/// messages without one are fire-and-forget commands.
fn dispatch_line(gateway: &Arc<Gateway>, line: &str, out_tx: &mpsc::UnboundedSender<String>) {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "discarding unparseable message");
            return;
        }
    };

    match value.get("id").and_then(|id| id.as_u64()) {
        Some(id) => {
            let request = match serde_json::from_value::<Request>(strip_id(value)) {
                Ok(request) => request,
                Err(err) => {
                    let err = HostError::InvalidArgument(format!("malformed request: {err}"));
                    send_line(out_tx, &Reply::error(id, &err));
                    return;
                }
            };
            let gateway = Arc::clone(gateway);
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                let reply = match gateway.handle_request(request).await {
                    Ok(response) => Reply::ok(id, response),
                    Err(err) => Reply::error(id, &err),
                };
                send_line(&out_tx, &reply);
            });
        }
        None => match serde_json::from_value::<Command>(value) {
            Ok(command) => gateway.handle_command(command),
            Err(err) => {
                warn!(error = %err, "discarding unknown fire-and-forget message");
            }
        },
    }
}

fn strip_id(mut value: serde_json::Value) -> serde_json::Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    value
}

fn send_line<T: serde::Serialize>(out_tx: &mpsc::UnboundedSender<String>, message: &T) {
    match serde_json::to_string(message) {
        Ok(json) => {
            let _ = out_tx.send(json);
        }
        Err(err) => warn!(error = %err, "failed to serialize outgoing message"),
    }
}
