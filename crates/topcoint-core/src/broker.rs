use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::detail::DetailFetcher;
use crate::directory::AssetDirectory;
use crate::query::Query;
use crate::resolver::{resolve, Resolution};
use crate::wire::Response;

/// Queue depth for pending client requests. Sessions await queue space on
/// submit; the worker itself never blocks on a slow client.
pub const QUEUE_CAPACITY: usize = 64;

/// One queued lookup together with its reply slot. The broker owns the
/// request while queued; the reply slot hands the response back to the
/// originating session.
#[derive(Debug)]
pub struct ClientRequest {
    pub query: Query,
    pub reply: oneshot::Sender<Response>,
}

/// The broker task has shut down and can accept no more requests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("request broker is no longer running")]
pub struct BrokerClosed;

/// Submit handle for the serialized request worker.
///
/// All connections funnel through one queue consumed by a single task, so
/// resolution and upstream calls happen one at a time in submission order
/// and need no further synchronization.
#[derive(Clone)]
pub struct RequestBroker {
    queue: mpsc::Sender<ClientRequest>,
}

impl RequestBroker {
    /// Spawn the worker task and return the submit handle. The worker
    /// exits once every handle is dropped.
    pub fn spawn(
        directory: Arc<AssetDirectory>,
        fetcher: DetailFetcher,
    ) -> (Self, JoinHandle<()>) {
        let (queue, requests) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(run(requests, directory, fetcher));
        (Self { queue }, worker)
    }

    /// Enqueue a lookup and return the channel its response will arrive on.
    ///
    /// Exactly one response is delivered per accepted request, even on
    /// error. Dropping the returned receiver abandons the reply; the
    /// broker treats that as a no-op.
    pub async fn submit(&self, query: Query) -> Result<oneshot::Receiver<Response>, BrokerClosed> {
        let (reply, receiver) = oneshot::channel();
        self.queue
            .send(ClientRequest { query, reply })
            .await
            .map_err(|_| BrokerClosed)?;
        Ok(receiver)
    }
}

async fn run(
    mut requests: mpsc::Receiver<ClientRequest>,
    directory: Arc<AssetDirectory>,
    fetcher: DetailFetcher,
) {
    while let Some(request) = requests.recv().await {
        let response = process(&request.query, &directory, &fetcher).await;
        // Abandoned reply channel (client gone) is a no-op.
        let _ = request.reply.send(response);
    }
}

/// Validate, resolve, and fetch for one request. Validation failures skip
/// the directory and upstream entirely.
async fn process(query: &Query, directory: &AssetDirectory, fetcher: &DetailFetcher) -> Response {
    if let Err(error) = query.validate() {
        return Response::Validation(error);
    }

    let snapshot = directory.current();
    match resolve(&query.raw_text, &snapshot) {
        Resolution::Suggestions(records) => Response::Suggestions { symbols: records },
        Resolution::Resolved(symbol) => {
            let result = fetcher
                .fetch_detail(&symbol, query.page_or_default(), query.page_size_or_default())
                .await;
            match result {
                Ok(payload) => Response::Detail(payload),
                Err(error) => Response::Upstream(error),
            }
        }
    }
}
