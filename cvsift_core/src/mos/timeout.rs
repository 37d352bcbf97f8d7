//! Per-file time limit around a quality model.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::warn;

use super::MosModel;

type BoxedModel = Box<dyn MosModel + Send>;
type Factory = Box<dyn FnMut() -> Result<BoxedModel> + Send>;

/// One model instance on its own thread.
struct Worker {
    requests: Sender<PathBuf>,
    responses: Receiver<Result<f32>>,
}

impl Worker {
    fn spawn(mut model: BoxedModel) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<PathBuf>();
        let (response_tx, response_rx) = mpsc::channel();
        thread::Builder::new()
            .name("mos-scorer".to_string())
            .spawn(move || {
                for path in request_rx {
                    if response_tx.send(model.predict(&path)).is_err() {
                        break;
                    }
                }
            })
            .context("failed to start scorer thread")?;
        Ok(Self {
            requests: request_tx,
            responses: response_rx,
        })
    }
}

/// Runs a model on a worker thread and gives up on a file after `timeout`.
///
/// A worker that misses the deadline is abandoned along with its model; the
/// next file goes to a fresh instance built by the factory. An abandoned
/// worker exits once its stuck call returns.
pub struct TimeoutModel {
    factory: Factory,
    worker: Option<Worker>,
    timeout: Duration,
}

impl TimeoutModel {
    /// Build the first model instance right away so load errors surface
    /// before any file is scored.
    pub fn spawn<M, F>(mut factory: F, timeout: Duration) -> Result<Self>
    where
        M: MosModel + Send + 'static,
        F: FnMut() -> Result<M> + Send + 'static,
    {
        let factory: Factory = Box::new(move || Ok(Box::new(factory()?) as BoxedModel));
        let mut model = Self {
            factory,
            worker: None,
            timeout,
        };
        model.worker = Some(model.start_worker()?);
        Ok(model)
    }

    fn start_worker(&mut self) -> Result<Worker> {
        let model = (self.factory)().context("failed to build scorer model")?;
        Worker::spawn(model)
    }
}

impl MosModel for TimeoutModel {
    fn predict(&mut self, path: &Path) -> Result<f32> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => self.start_worker()?,
        };
        worker
            .requests
            .send(path.to_path_buf())
            .map_err(|_| anyhow!("scorer worker has stopped"))?;

        match worker.responses.recv_timeout(self.timeout) {
            Ok(result) => {
                self.worker = Some(worker);
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(path = %path.display(), "scorer timed out, replacing worker");
                bail!("timed out after {:.1}s", self.timeout.as_secs_f32())
            }
            Err(RecvTimeoutError::Disconnected) => bail!("scorer worker has stopped"),
        }
    }
}
