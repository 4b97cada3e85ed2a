use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::{codec::MessageCodec, core::error::Result, router::SyncRoutingState};

/// Accepts connections forever, answering repair requests from `state`.
///
/// Each connection is handled on its own task and may carry any number of requests. Returns
/// only if accepting a connection fails.
pub async fn serve(listener: TcpListener, state: SyncRoutingState) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                debug!(%addr, "dropping connection: {e}");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, state: SyncRoutingState) -> Result<()> {
    let mut framed = Framed::new(stream, MessageCodec::new());

    while let Some(message) = framed.next().await {
        let message = message?;
        trace!("processing {}", message.variant_as_str());

        match state.respond(message) {
            Some(response) => framed.send(response).await?,
            None => debug!("ignoring unsolicited response"),
        }
    }

    Ok(())
}
