use anyhow::Result;
use quizboard_core::{models::GameData, SnapshotSink, SnapshotStore};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, warn};

#[derive(Debug)]
enum PersistRequest {
    Write(Box<GameData>),
    Clear,
}

/// Forwards engine snapshots to a background writer task.
///
/// Requests are applied in order; the engine never waits for them.
pub struct SnapshotWriter {
    sender: mpsc::UnboundedSender<PersistRequest>,
}

impl SnapshotWriter {
    /// Start the writer task. The returned handle completes once every
    /// `SnapshotWriter` has been dropped and pending writes are flushed.
    pub fn spawn(store: SnapshotStore) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(store, receiver));
        (Self { sender }, handle)
    }

    fn send(&self, request: PersistRequest) {
        if self.sender.send(request).is_err() {
            warn!("Snapshot writer has stopped; dropping request");
        }
    }
}

impl SnapshotSink for SnapshotWriter {
    fn persist(&mut self, snapshot: &GameData) {
        self.send(PersistRequest::Write(Box::new(snapshot.clone())));
    }

    fn clear(&mut self) {
        self.send(PersistRequest::Clear);
    }
}

async fn run_writer(store: SnapshotStore, mut receiver: mpsc::UnboundedReceiver<PersistRequest>) {
    while let Some(mut request) = receiver.recv().await {
        // Only the newest of a burst of writes matters.
        while let PersistRequest::Write(_) = request {
            match receiver.try_recv() {
                Ok(next @ PersistRequest::Write(_)) => request = next,
                Ok(PersistRequest::Clear) => {
                    request = PersistRequest::Clear;
                    break;
                }
                Err(_) => break,
            }
        }

        let task_store = store.clone();
        let outcome = tokio::task::spawn_blocking(move || apply(&task_store, request)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(?err, "Snapshot write failed"),
            Err(err) => error!(?err, "Snapshot writer task panicked"),
        }
    }
    debug!("Snapshot writer finished");
}

fn apply(store: &SnapshotStore, request: PersistRequest) -> Result<()> {
    match request {
        PersistRequest::Write(data) => store.write_snapshot(&data),
        PersistRequest::Clear => store.clear(),
    }
}
