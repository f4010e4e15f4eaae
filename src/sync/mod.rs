//! Header chain synchronization: bulk chunk sync, backward reconnection and
//! the coordinating worker loop.

mod chunks;
mod reconnect;
mod worker;

pub use chunks::ChunkSyncer;
pub use reconnect::ChainReconnector;
pub use worker::{HeaderAnnouncement, SyncWorker};

use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{NetworkError, SyncError, SyncResult};
use crate::network::{Peer, PeerRequest, PeerResponse};

/// Submit `request` to `peer` and wait for the response.
///
/// The wait is bounded by `wait` but a timeout is not a failure: the worker
/// logs and keeps waiting on the same channel, giving a slow peer as long
/// as it needs. Only shutdown (observed between waits) or the peer dropping
/// the channel ends the wait early.
pub(crate) async fn request(
    peer: &dyn Peer,
    request: PeerRequest,
    wait: Duration,
    shutdown: &CancellationToken,
) -> SyncResult<PeerResponse> {
    let mut rx: oneshot::Receiver<PeerResponse> = peer.send_request(request).await?;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Err(SyncError::Stopped),
            outcome = tokio::time::timeout(wait, &mut rx) => match outcome {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(_)) => {
                    return Err(NetworkError::ResponseChannelClosed(peer.id()).into());
                }
                Err(_) => {
                    tracing::debug!("response timeout from {}, still waiting", peer.id());
                }
            },
        }
    }
}
