//! Background network worker.
//!
//! The UI thread never blocks on HTTP. It pushes [`ApiCommand`]s into the
//! worker and drains [`ApiMessage`]s once per frame. The worker owns a
//! single-threaded tokio runtime on its own OS thread.

use std::thread;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::api::ApiClient;
use crate::error::ApiError;
use crate::model::task::{DateUpdate, Task, TaskDetail, TaskUpdate, UpdateResponse};

#[derive(Debug, Clone)]
pub enum ApiCommand {
    /// Reload the project's task list. `seq` tags the reply so older replies
    /// can be discarded.
    LoadTasks { project_id: String, seq: u64 },
    LoadTask { task_id: String },
    UpdateTask { task_id: String, form: TaskUpdate },
    UpdateDates(DateUpdate),
}

#[derive(Debug)]
pub enum ApiMessage {
    TasksLoaded { seq: u64, result: Result<Vec<Task>, ApiError> },
    TaskLoaded { task_id: String, result: Result<TaskDetail, ApiError> },
    TaskUpdated { task_id: String, result: Result<UpdateResponse, ApiError> },
    DatesUpdated { update: DateUpdate, result: Result<UpdateResponse, ApiError> },
}

/// UI-side ends of the worker channels.
pub struct WorkerHandle {
    cmd_tx: UnboundedSender<ApiCommand>,
    msg_rx: UnboundedReceiver<ApiMessage>,
}

impl WorkerHandle {
    /// Queue a command. Returns false once the worker has shut down.
    pub fn send(&self, cmd: ApiCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    /// Next finished request, without blocking.
    pub fn try_recv(&mut self) -> Option<ApiMessage> {
        self.msg_rx.try_recv().ok()
    }

    /// A handle with no thread behind it. The test holds the other channel ends.
    #[cfg(test)]
    pub fn detached() -> (Self, UnboundedReceiver<ApiCommand>, UnboundedSender<ApiMessage>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        (Self { cmd_tx, msg_rx }, cmd_rx, msg_tx)
    }
}

/// Start the worker thread. `notify` runs after every reply so the UI can wake up.
pub fn spawn<F>(client: ApiClient, notify: F) -> std::io::Result<WorkerHandle>
where
    F: Fn() + Send + Sync + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("api-worker".into())
        .spawn(move || runtime.block_on(run(client, cmd_rx, msg_tx, notify)))?;

    Ok(WorkerHandle { cmd_tx, msg_rx })
}

async fn run<F>(
    client: ApiClient,
    mut rx: UnboundedReceiver<ApiCommand>,
    tx: UnboundedSender<ApiMessage>,
    notify: F,
) where
    F: Fn() + Send + Sync + 'static,
{
    let notify = std::sync::Arc::new(notify);
    while let Some(cmd) = rx.recv().await {
        tracing::debug!(?cmd, "api command");
        let client = client.clone();
        let tx = tx.clone();
        let notify = notify.clone();
        // Requests run concurrently; ordering is restored by the seq tag.
        tokio::spawn(async move {
            let msg = execute(&client, cmd).await;
            if tx.send(msg).is_ok() {
                notify();
            }
        });
    }
    tracing::debug!("api worker stopped");
}

async fn execute(client: &ApiClient, cmd: ApiCommand) -> ApiMessage {
    match cmd {
        ApiCommand::LoadTasks { project_id, seq } => ApiMessage::TasksLoaded {
            seq,
            result: client.fetch_project_tasks(&project_id).await,
        },
        ApiCommand::LoadTask { task_id } => {
            let result = client.fetch_task(&task_id).await;
            ApiMessage::TaskLoaded { task_id, result }
        }
        ApiCommand::UpdateTask { task_id, form } => {
            let result = client.update_task(&task_id, &form).await;
            ApiMessage::TaskUpdated { task_id, result }
        }
        ApiCommand::UpdateDates(update) => {
            let result = client.update_task_dates(&update).await;
            if let Err(err) = &result {
                tracing::warn!(task = %update.task_id, %err, "date update failed");
            }
            ApiMessage::DatesUpdated { update, result }
        }
    }
}

/// Tracks the newest task-list request so stale replies can be dropped.
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn only_latest_request_is_current() {
        let mut seq = RequestSeq::default();
        let first = seq.next();
        let second = seq.next();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn unreachable_server_reports_transport_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        let config = AppConfig {
            base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        let wakeups = Arc::new(AtomicUsize::new(0));
        let counter = wakeups.clone();
        let mut handle = spawn(client, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(handle.send(ApiCommand::LoadTasks { project_id: "1".into(), seq: 7 }));

        let deadline = Instant::now() + Duration::from_secs(10);
        let msg = loop {
            if let Some(msg) = handle.try_recv() {
                break msg;
            }
            assert!(Instant::now() < deadline, "worker never replied");
            std::thread::sleep(Duration::from_millis(20));
        };
        match msg {
            ApiMessage::TasksLoaded { seq, result } => {
                assert_eq!(seq, 7);
                assert!(result.is_err());
            }
            other => panic!("unexpected {other:?}"),
        }
        // notify runs right after the send, so give it a moment
        while wakeups.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "worker never signalled");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(wakeups.load(Ordering::SeqCst), 1);
    }
}
