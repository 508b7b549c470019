//! Background min/max reduction with cancellation and progress

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::{RasterError, RasterResult};
use crate::reduce::{CancelToken, RasterExtrema, ReduceOptions, reduce_reference};
use crate::region::Region;
use crate::source::RasterProvider;

/// A reduction running on its own thread
///
/// The dataset is opened and released on the worker thread.
pub struct MinMaxTask {
    handle: Option<JoinHandle<RasterResult<RasterExtrema>>>,
    cancel: CancelToken,
    /// (finished tiles, total tiles)
    progress: Arc<Mutex<(usize, usize)>>,
}

impl MinMaxTask {
    /// Start reducing `reference` over `region`
    ///
    /// Any cancel token or progress callback in `options` keeps working
    /// alongside the task's own.
    pub fn spawn(
        provider: Arc<dyn RasterProvider>,
        reference: impl Into<String>,
        region: Region,
        options: ReduceOptions,
    ) -> RasterResult<Self> {
        let reference = reference.into();
        let cancel = options.cancel.clone();
        let progress = Arc::new(Mutex::new((0, 0)));

        let sink = progress.clone();
        let forward = options.progress.clone();
        let options = options.with_progress(move |done, total| {
            {
                let mut p = sink.lock();
                // Workers may report out of order
                p.0 = p.0.max(done);
                p.1 = total;
            }
            if let Some(forward) = &forward {
                forward(done, total);
            }
        });

        let handle = std::thread::Builder::new()
            .name("kadas-minmax".into())
            .spawn(move || {
                tracing::debug!("Background reduction of '{}' started", reference);
                reduce_reference(provider.as_ref(), &reference, &region, &options)
            })
            .map_err(|e| RasterError::Task(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            cancel,
            progress,
        })
    }

    /// Request the reduction to stop at the next tile
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Finished and total tile counts (total is 0 until the first tile is done)
    pub fn progress(&self) -> (usize, usize) {
        *self.progress.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Take the result if the task is done, without blocking
    pub fn try_join(&mut self) -> Option<RasterResult<RasterExtrema>> {
        if !self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        self.handle.take().map(join_handle)
    }

    /// Wait for the result
    pub fn join(mut self) -> RasterResult<RasterExtrema> {
        match self.handle.take() {
            Some(handle) => join_handle(handle),
            None => Err(RasterError::Task("result already taken".into())),
        }
    }
}

impl Drop for MinMaxTask {
    fn drop(&mut self) {
        // Detached workers stop early instead of running to completion
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

fn join_handle(handle: JoinHandle<RasterResult<RasterExtrema>>) -> RasterResult<RasterExtrema> {
    handle
        .join()
        .unwrap_or_else(|_| Err(RasterError::Task("worker panicked".into())))
}
