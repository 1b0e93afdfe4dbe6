use crate::dispatch::dispatch;
use crate::registry::Registry;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use leaseq_protocol::{FrameCodec, ProtocolError, Response};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

/// Accept loop: one spawned task per connection, shared registry.
///
/// Runs until ctrl-c. A connection may carry any number of sequential
/// frames; each is dispatched and answered before the next is read.
pub async fn run(addr: &str, registry: Arc<Registry>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let registry = registry.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(registry, stream).await {
                                warn!(%peer, error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Serve one connection: read a frame, dispatch, write the response.
///
/// Parse-level protocol errors are answered inline by the dispatcher;
/// only framing violations (oversized frame, invalid UTF-8) end the
/// session, after a final error response.
async fn handle_connection(
    registry: Arc<Registry>,
    stream: TcpStream,
) -> Result<(), ProtocolError> {
    let mut framed = Framed::new(stream, FrameCodec::new());

    while let Some(frame) = framed.next().await {
        match frame {
            Ok(frame) => {
                let response = dispatch(&registry, &frame, Utc::now());
                framed.send(response).await?;
            }
            Err(e) => {
                let _ = framed.send(Response::Error(e.to_string())).await;
                return Err(e);
            }
        }
    }

    Ok(())
}
