//! Lazy page streams.
//!
//! A [`PageStream`] renders one page per call to `next()`, in ascending page
//! order. It keeps nothing between calls apart from its position, so a
//! multi-hundred-page document never blocks the caller for more than one page.
//!
//! Streams are restartable: a new stream, or [`PageStream::restart`], begins
//! again at page 1. Nothing is cached across streams.

use tracing::{debug, warn};

use crate::error::{Result, ToolkitError};
use crate::render::{PageRenderer, RenderParams, RenderedPage};

/// What a stream does when a single page fails to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFailurePolicy {
    /// Yield the error, then end the stream.
    #[default]
    Abort,
    /// Log the failure, remember the page, carry on with the next one.
    Skip,
    /// Render the page again up to `attempts` more times, then abort.
    Retry {
        /// Extra attempts after the first failure.
        attempts: u32,
    },
}

/// A lazy, finite sequence of rendered pages for one document.
pub struct PageStream<'r, R: PageRenderer + ?Sized> {
    renderer: &'r R,
    params: RenderParams,
    policy: RenderFailurePolicy,
    next_index: usize,
    page_count: usize,
    skipped: Vec<usize>,
    finished: bool,
}

impl<'r, R: PageRenderer + ?Sized> PageStream<'r, R> {
    /// Start a stream at page 1 with the default (abort) failure policy.
    pub fn new(renderer: &'r R, params: RenderParams) -> Self {
        Self::with_policy(renderer, params, RenderFailurePolicy::default())
    }

    /// Start a stream at page 1 with an explicit failure policy.
    pub fn with_policy(renderer: &'r R, params: RenderParams, policy: RenderFailurePolicy) -> Self {
        Self {
            renderer,
            params,
            policy,
            next_index: 0,
            page_count: renderer.page_count(),
            skipped: Vec::new(),
            finished: false,
        }
    }

    /// Go back to page 1. Previously rendered pages are not reused.
    pub fn restart(&mut self) {
        self.next_index = 0;
        self.page_count = self.renderer.page_count();
        self.skipped.clear();
        self.finished = false;
    }

    /// Parameters every page of this stream is rendered with.
    pub fn params(&self) -> RenderParams {
        self.params
    }

    /// Total number of pages the stream will visit.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages left to visit.
    pub fn remaining(&self) -> usize {
        if self.finished {
            0
        } else {
            self.page_count - self.next_index
        }
    }

    /// 1-based numbers of pages skipped under [`RenderFailurePolicy::Skip`].
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// Whether the stream has nothing more to yield.
    pub fn is_finished(&self) -> bool {
        self.finished || self.next_index >= self.page_count
    }

    fn render_with_retries(&self, index: usize) -> Result<RenderedPage> {
        let extra_attempts = match self.policy {
            RenderFailurePolicy::Retry { attempts } => attempts,
            _ => 0,
        };

        let mut attempt = 0;
        loop {
            match self.renderer.render_page(index, self.params) {
                Ok(bitmap) => {
                    return Ok(RenderedPage {
                        page_number: index + 1,
                        bitmap,
                    });
                }
                Err(err) if attempt < extra_attempts => {
                    attempt += 1;
                    warn!(page = index + 1, attempt, error = %err, "retrying page render");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: PageRenderer + ?Sized> Iterator for PageStream<'_, R> {
    type Item = Result<RenderedPage>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.is_finished() {
            let index = self.next_index;
            self.next_index += 1;

            match self.render_with_retries(index) {
                Ok(page) => {
                    debug!(page = page.page_number, "rendered page");
                    return Some(Ok(page));
                }
                Err(err) if self.policy == RenderFailurePolicy::Skip => {
                    warn!(page = index + 1, error = %err, "skipping page that failed to render");
                    self.skipped.push(index + 1);
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(match err {
                        ToolkitError::RenderFailed { .. } => err,
                        other => ToolkitError::render_failed(index + 1, other.to_string()),
                    }));
                }
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        match self.policy {
            RenderFailurePolicy::Skip => (0, Some(remaining)),
            _ => (remaining.min(1), Some(remaining)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Rotation;
    use crate::render::testing::FakeRenderer;

    fn params() -> RenderParams {
        RenderParams::new(0.5, Rotation::None).unwrap()
    }

    #[test]
    fn test_stream_yields_pages_in_order() {
        let renderer = FakeRenderer::new(4);
        let pages: Vec<usize> = PageStream::new(&renderer, params())
            .map(|page| page.unwrap().page_number)
            .collect();

        assert_eq!(pages, vec![1, 2, 3, 4]);
        assert_eq!(renderer.calls(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stream_is_lazy() {
        let renderer = FakeRenderer::new(10);
        let mut stream = PageStream::new(&renderer, params());

        assert!(renderer.calls().is_empty());
        stream.next();
        stream.next();
        assert_eq!(renderer.calls(), vec![0, 1]);
        assert_eq!(stream.remaining(), 8);
    }

    #[test]
    fn test_stream_applies_params() {
        let renderer = FakeRenderer::new(1);
        let params = RenderParams::new(2.0, Rotation::Clockwise90).unwrap();
        let page = PageStream::new(&renderer, params).next().unwrap().unwrap();

        assert_eq!((page.width(), page.height()), (400, 200));
    }

    #[test]
    fn test_fresh_stream_restarts_from_first_page() {
        let renderer = FakeRenderer::new(3);
        let mut first = PageStream::new(&renderer, params());
        first.next();
        first.next();

        let second: Vec<usize> = PageStream::new(&renderer, params())
            .map(|page| page.unwrap().page_number)
            .collect();
        assert_eq!(second, vec![1, 2, 3]);

        first.restart();
        assert_eq!(first.next().unwrap().unwrap().page_number, 1);
    }

    #[test]
    fn test_abort_policy_ends_stream_after_error() {
        let renderer = FakeRenderer::new(4).failing(1, 1);
        let mut stream = PageStream::new(&renderer, params());

        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, ToolkitError::RenderFailed { page: 2, .. }));
        assert!(stream.next().is_none());
        assert_eq!(renderer.calls(), vec![0, 1]);
    }

    #[test]
    fn test_skip_policy_records_skipped_pages() {
        let renderer = FakeRenderer::new(4).failing(1, 5).failing(3, 5);
        let mut stream =
            PageStream::with_policy(&renderer, params(), RenderFailurePolicy::Skip);

        let pages: Vec<usize> = stream
            .by_ref()
            .map(|page| page.unwrap().page_number)
            .collect();

        assert_eq!(pages, vec![1, 3]);
        assert_eq!(stream.skipped(), &[2, 4]);
    }

    #[test]
    fn test_retry_policy_recovers_transient_failure() {
        let renderer = FakeRenderer::new(2).failing(0, 2);
        let pages: Vec<usize> = PageStream::with_policy(
            &renderer,
            params(),
            RenderFailurePolicy::Retry { attempts: 2 },
        )
        .map(|page| page.unwrap().page_number)
        .collect();

        assert_eq!(pages, vec![1, 2]);
        assert_eq!(renderer.calls(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_retry_policy_gives_up() {
        let renderer = FakeRenderer::new(2).failing(0, 3);
        let mut stream = PageStream::with_policy(
            &renderer,
            params(),
            RenderFailurePolicy::Retry { attempts: 2 },
        );

        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_empty_document() {
        let renderer = FakeRenderer::new(0);
        let mut stream = PageStream::new(&renderer, params());
        assert!(stream.is_finished());
        assert!(stream.next().is_none());
    }
}
