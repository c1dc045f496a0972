//! Incremental loading of rendered pages into a display target.
//!
//! The loader pulls at most one page per [`IncrementalLoader::tick`] and
//! appends it to a [`LoadTarget`]. Between ticks the caller gets control
//! back, so an event loop can keep handling input while a long document
//! fills in.
//!
//! Starting a new load supersedes the previous one: the old source is
//! dropped (which cancels a [`BackgroundRender`](crate::render::parallel::BackgroundRender))
//! and its ticket stops being current. A superseded load never appends to
//! the target again.

use tracing::{debug, info, warn};

use crate::error::{Result, ToolkitError};
use crate::render::stream::PageStream;
use crate::render::{PageRenderer, RenderedPage};

/// Result of asking a source for its next page.
#[derive(Debug)]
pub enum Pull {
    /// The next page, in order.
    Page(RenderedPage),
    /// No page yet; ask again later.
    Pending,
    /// The source failed and will yield nothing more.
    Failed(ToolkitError),
    /// Every page has been yielded.
    Exhausted,
}

/// Something that yields rendered pages in page order.
pub trait PageSource {
    /// Take the next page if one is available.
    fn pull(&mut self) -> Pull;
}

impl<R: PageRenderer + ?Sized> PageSource for PageStream<'_, R> {
    fn pull(&mut self) -> Pull {
        match self.next() {
            Some(Ok(page)) => Pull::Page(page),
            Some(Err(err)) => Pull::Failed(err),
            None => Pull::Exhausted,
        }
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn pull(&mut self) -> Pull {
        (**self).pull()
    }
}

/// A display list that receives pages as they load.
pub trait LoadTarget {
    /// Drop everything shown so far.
    fn clear(&mut self);

    /// Show one more page below the previous ones.
    fn append(&mut self, page: RenderedPage);
}

impl LoadTarget for Vec<RenderedPage> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn append(&mut self, page: RenderedPage) {
        self.push(page);
    }
}

/// Identifies one load started by [`IncrementalLoader::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// What a single [`IncrementalLoader::tick`] did.
#[derive(Debug)]
pub enum TickOutcome {
    /// A page was appended; carries its 1-based page number.
    Appended(usize),
    /// The source had nothing ready.
    Waiting,
    /// The source is exhausted. Reported once per load.
    Finished,
    /// The source failed; the load is over.
    Failed(ToolkitError),
    /// No load is in progress.
    Idle,
}

/// Cooperative, one-page-per-tick loader.
pub struct IncrementalLoader<'a> {
    generation: u64,
    source: Option<Box<dyn PageSource + 'a>>,
    appended: usize,
}

impl Default for IncrementalLoader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IncrementalLoader<'a> {
    /// Create an idle loader.
    pub fn new() -> Self {
        Self {
            generation: 0,
            source: None,
            appended: 0,
        }
    }

    /// Begin loading `source` into `target`.
    ///
    /// The target is cleared first. Any load still in flight is dropped.
    pub fn start<S>(&mut self, source: S, target: &mut dyn LoadTarget) -> LoadTicket
    where
        S: PageSource + 'a,
    {
        if self.source.take().is_some() {
            debug!(generation = self.generation, "superseding in-flight load");
        }

        self.generation += 1;
        self.appended = 0;
        target.clear();
        self.source = Some(Box::new(source));

        LoadTicket(self.generation)
    }

    /// Drop the current load without starting another one.
    pub fn cancel(&mut self) {
        if self.source.take().is_some() {
            self.generation += 1;
            debug!("load cancelled");
        }
    }

    /// Pull at most one page and append it to `target`.
    pub fn tick(&mut self, target: &mut dyn LoadTarget) -> TickOutcome {
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Idle;
        };

        match source.pull() {
            Pull::Page(page) => {
                let page_number = page.page_number;
                target.append(page);
                self.appended += 1;
                TickOutcome::Appended(page_number)
            }
            Pull::Pending => TickOutcome::Waiting,
            Pull::Exhausted => {
                self.source = None;
                info!(pages = self.appended, "load finished");
                TickOutcome::Finished
            }
            Pull::Failed(err) => {
                self.source = None;
                warn!(error = %err, pages = self.appended, "load failed");
                TickOutcome::Failed(err)
            }
        }
    }

    /// Tick until the current load ends, calling `between` after every tick.
    ///
    /// Returns the number of pages appended by this load.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it fails.
    pub fn drive<F>(&mut self, target: &mut dyn LoadTarget, mut between: F) -> Result<usize>
    where
        F: FnMut(),
    {
        loop {
            match self.tick(target) {
                TickOutcome::Appended(_) | TickOutcome::Waiting => between(),
                TickOutcome::Finished | TickOutcome::Idle => return Ok(self.appended),
                TickOutcome::Failed(err) => return Err(err),
            }
        }
    }

    /// Whether `ticket` belongs to the load in progress.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.source.is_some() && ticket.0 == self.generation
    }

    /// Whether a load is in progress.
    pub fn is_loading(&self) -> bool {
        self.source.is_some()
    }

    /// Pages appended by the current (or last) load.
    pub fn appended(&self) -> usize {
        self.appended
    }
}
