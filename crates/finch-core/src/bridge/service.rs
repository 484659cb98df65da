//! The bridge service: one executor thread owns the records file and the
//! in-memory frame list; callers only post tasks to it.

use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::frame::write_delimited;
use super::histogram::{dropped_records_record, ParsingLogResult, RetrieveMetricsTaskStatus};
use super::records_file::{clear_records, parse_records, truncate_records};

enum Task {
    Record(Vec<u8>),
    Retrieve(oneshot::Sender<Vec<Vec<u8>>>),
    Block(oneshot::Sender<()>),
}

/// Handle to the metrics bridge. Clones share the same executor.
#[derive(Clone)]
pub struct MetricsBridge {
    tx: mpsc::UnboundedSender<Task>,
    path: Arc<PathBuf>,
}

impl MetricsBridge {
    /// Start the executor for the records file at `path`. Loading the file is
    /// the executor's first task, so it precedes any posted record.
    pub fn start(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let store = RecordStore::new(path.clone());
        std::thread::Builder::new()
            .name("metrics-bridge".into())
            .spawn(move || store.run(rx))?;
        Ok(Self {
            tx,
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue one frame for persistence. Empty buffers are ignored.
    pub fn record(&self, frame: Vec<u8>) {
        if frame.is_empty() {
            tracing::debug!("ignoring empty metrics record");
            return;
        }
        if self.tx.send(Task::Record(frame)).is_err() {
            tracing::warn!("metrics bridge executor is gone; record lost");
        }
    }

    /// Drain every frame, then the dropped count (if any) and the retrieve status.
    pub async fn retrieve(&self) -> Vec<Vec<u8>> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Task::Retrieve(reply)).is_ok() {
            if let Ok(frames) = rx.await {
                return frames;
            }
        }
        tracing::warn!("metrics bridge retrieve interrupted");
        vec![RetrieveMetricsTaskStatus::Interrupted.record().encode()]
    }

    /// Completes once every task posted before this call has run.
    pub fn add_task_to_block(&self) -> impl Future<Output = ()> + Send + 'static {
        let (done, rx) = oneshot::channel();
        let posted = self.tx.send(Task::Block(done)).is_ok();
        async move {
            if posted {
                let _ = rx.await;
            }
        }
    }
}

struct RecordStore {
    path: PathBuf,
    file: Option<File>,
    records: Vec<Vec<u8>>,
    dropped: u64,
}

impl RecordStore {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            records: Vec::new(),
            dropped: 0,
        }
    }

    fn run(mut self, mut rx: mpsc::UnboundedReceiver<Task>) {
        self.load();
        while let Some(task) = rx.blocking_recv() {
            match task {
                Task::Record(frame) => self.append(frame),
                Task::Retrieve(reply) => {
                    let frames = self.drain();
                    if reply.send(frames).is_err() {
                        tracing::debug!("retrieve caller went away before the reply");
                    }
                }
                Task::Block(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!(path = %self.path.display(), "metrics bridge executor stopped");
    }

    fn load(&mut self) {
        let parsed = parse_records(&self.path);
        self.records = parsed.frames;
        tracing::debug!(
            path = %self.path.display(),
            frames = self.records.len(),
            result = ?parsed.result,
            "loaded metrics records"
        );
        if parsed.result == Some(ParsingLogResult::MalformedRecord) {
            if let Err(e) = truncate_records(&self.path, parsed.valid_len) {
                tracing::warn!(path = %self.path.display(), "truncate records file: {}", e);
                self.rewrite();
            }
        }
        if let Some(result) = parsed.result {
            self.append(result.record().encode());
        }
    }

    /// Replace the file with the in-memory frames.
    fn rewrite(&mut self) {
        self.file = None;
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "remove records file: {}", e);
                return;
            }
        }
        let frames = std::mem::take(&mut self.records);
        for frame in frames {
            self.append(frame);
        }
    }

    fn append(&mut self, frame: Vec<u8>) {
        if let Err(e) = self.write_frame(&frame) {
            tracing::warn!(path = %self.path.display(), "append metrics record: {}", e);
            self.dropped += 1;
            self.file = None;
        }
        self.records.push(frame);
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => write_delimited(file, frame),
            None => Ok(()),
        }
    }

    fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut out = std::mem::take(&mut self.records);
        if self.dropped > 0 {
            out.push(dropped_records_record(self.dropped).encode());
            self.dropped = 0;
        }
        self.file = None;
        let status = match clear_records(&self.path) {
            Ok(()) => RetrieveMetricsTaskStatus::Success,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "clear records file: {}", e);
                RetrieveMetricsTaskStatus::IoException
            }
        };
        out.push(status.record().encode());
        tracing::debug!(frames = out.len(), ?status, "metrics records drained");
        out
    }
}
