use std::sync::Arc;
use std::time::Duration;

use procvisor::{CleanupHandler, DataHandler, LifecycleEvent, ProcessDescriptor};
use tokio::sync::mpsc;

/// One invocation of the data handler, with the error flattened to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCall {
    pub error: Option<String>,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl DataCall {
    pub fn stdout_str(&self) -> Option<String> {
        self.stdout
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn stderr_str(&self) -> Option<String> {
        self.stderr
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Receiving side of a pair of recording callbacks.
///
/// Every data / cleanup invocation is pushed onto a channel so tests can
/// await them in order.
pub struct Recorder {
    data_rx: mpsc::UnboundedReceiver<DataCall>,
    cleanup_rx: mpsc::UnboundedReceiver<(LifecycleEvent, ProcessDescriptor)>,
}

/// Build recording `DataHandler` / `CleanupHandler` callbacks.
pub fn recorder() -> (DataHandler, CleanupHandler, Recorder) {
    let (data_tx, data_rx) = mpsc::unbounded_channel();
    let (cleanup_tx, cleanup_rx) = mpsc::unbounded_channel();

    let data: DataHandler = Arc::new(move |err, stdout, stderr| {
        let _ = data_tx.send(DataCall {
            error: err.map(|e| e.to_string()),
            stdout,
            stderr,
        });
    });
    let cleanup: CleanupHandler =
        Arc::new(move |event: LifecycleEvent, descriptor: &ProcessDescriptor| {
            let _ = cleanup_tx.send((event, descriptor.clone()));
        });

    (data, cleanup, Recorder { data_rx, cleanup_rx })
}

impl Recorder {
    /// Next data call, or `None` after 5 seconds.
    pub async fn next_data(&mut self) -> Option<DataCall> {
        tokio::time::timeout(Duration::from_secs(5), self.data_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next lifecycle event, or `None` after 5 seconds.
    pub async fn next_cleanup(&mut self) -> Option<(LifecycleEvent, ProcessDescriptor)> {
        tokio::time::timeout(Duration::from_secs(5), self.cleanup_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Data calls received so far, without waiting.
    pub fn drain_data(&mut self) -> Vec<DataCall> {
        let mut out = Vec::new();
        while let Ok(call) = self.data_rx.try_recv() {
            out.push(call);
        }
        out
    }

    /// Whether a lifecycle event arrives within `wait`.
    pub async fn cleanup_within(&mut self, wait: Duration) -> bool {
        matches!(
            tokio::time::timeout(wait, self.cleanup_rx.recv()).await,
            Ok(Some(_))
        )
    }
}
