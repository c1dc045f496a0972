//! Rendering off the driving thread.
//!
//! Two shapes are offered:
//! - [`BackgroundRender`] renders pages in order on a worker thread and hands
//!   them over through a bounded channel. It is a [`PageSource`], so the
//!   incremental loader can consume it one page per tick.
//! - [`render_parallel`] renders a whole document on the blocking pool with a
//!   fixed number of concurrent jobs and returns the pages in order.
//!
//! Only rendering happens on other threads; appending to a display target
//! always happens on the caller's thread.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

use crate::error::{Result, ToolkitError};
use crate::loader::{PageSource, Pull};
use crate::render::{PageRenderer, RenderParams, RenderedPage};

/// Pages rendered ahead on a worker thread.
///
/// Dropping the handle cancels the worker before its next page.
pub struct BackgroundRender {
    receiver: mpsc::Receiver<Result<RenderedPage>>,
    cancelled: Arc<AtomicBool>,
    page_count: usize,
}

impl BackgroundRender {
    /// Start rendering every page of `renderer`.
    ///
    /// At most `capacity` rendered pages wait in the channel; the worker
    /// blocks until the consumer catches up.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be started.
    pub fn spawn<R>(renderer: Arc<R>, params: RenderParams, capacity: usize) -> Result<Self>
    where
        R: PageRenderer + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let page_count = renderer.page_count();

        let flag = Arc::clone(&cancelled);
        thread::Builder::new()
            .name("pdftoolkit-render".to_string())
            .spawn(move || {
                for index in 0..page_count {
                    if flag.load(Ordering::Acquire) {
                        debug!(page = index + 1, "background render cancelled");
                        break;
                    }

                    let result = renderer
                        .render_page(index, params)
                        .map(|bitmap| RenderedPage {
                            page_number: index + 1,
                            bitmap,
                        });
                    let failed = result.is_err();

                    if sender.blocking_send(result).is_err() || failed {
                        break;
                    }
                }
            })?;

        Ok(Self {
            receiver,
            cancelled,
            page_count,
        })
    }

    /// Stop the worker before it starts another page.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.receiver.close();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Pages the worker will render in total.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Block until the next page is available.
    ///
    /// Returns `None` once every page has been received. Must not be called
    /// from inside an async task.
    pub fn wait_next(&mut self) -> Option<Result<RenderedPage>> {
        self.receiver.blocking_recv()
    }
}

impl PageSource for BackgroundRender {
    fn pull(&mut self) -> Pull {
        match self.receiver.try_recv() {
            Ok(Ok(page)) => Pull::Page(page),
            Ok(Err(err)) => Pull::Failed(err),
            Err(TryRecvError::Empty) => Pull::Pending,
            Err(TryRecvError::Disconnected) => Pull::Exhausted,
        }
    }
}

impl Drop for BackgroundRender {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Render every page with at most `jobs` renders running at once.
///
/// Results come back in page order regardless of completion order.
pub async fn render_parallel<R>(
    renderer: Arc<R>,
    params: RenderParams,
    jobs: usize,
) -> Vec<Result<RenderedPage>>
where
    R: PageRenderer + Send + Sync + 'static,
{
    let page_count = renderer.page_count();
    debug!(pages = page_count, jobs, "rendering in parallel");

    stream::iter(0..page_count)
        .map(|index| {
            let renderer = Arc::clone(&renderer);
            async move {
                let task = tokio::task::spawn_blocking(move || {
                    renderer
                        .render_page(index, params)
                        .map(|bitmap| RenderedPage {
                            page_number: index + 1,
                            bitmap,
                        })
                });

                match task.await {
                    Ok(result) => result,
                    Err(err) => Err(ToolkitError::render_failed(index + 1, err.to_string())),
                }
            }
        })
        .buffered(jobs.max(1))
        .collect()
        .await
}
