//! Viewer state machine.
//!
//! The viewer shows one document as a vertical column of rendered pages. It
//! moves through three phases:
//!
//! ```text
//! Empty --open--> Loading --last page laid out--> Ready
//!                    ^                              |
//!                    +---- zoom / rotate change ----+
//! ```
//!
//! Any render-parameter change throws the whole layout away and starts a new
//! page stream from page 1; nothing rendered at the old parameters survives.

use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::error::{Result, ToolkitError};
use crate::loader::{IncrementalLoader, LoadTarget, LoadTicket, TickOutcome};
use crate::render::stream::PageStream;
use crate::render::{PageRenderer, RenderParams, RenderedPage, Rotation};

/// Where the viewer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    /// No document is open.
    Empty,
    /// Pages are being rendered and laid out.
    Loading,
    /// Every page is laid out; navigation is available.
    Ready,
}

/// Position of one laid-out page, in pixels from the top of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    /// 1-based page number.
    pub page_number: usize,
    /// Offset of the page's top edge.
    pub top: u32,
    /// Rendered width.
    pub width: u32,
    /// Rendered height.
    pub height: u32,
}

impl PageSlot {
    /// Offset just below the page.
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// Layout and navigation state of the viewer, independent of any renderer.
#[derive(Debug, Clone)]
pub struct ViewerState {
    config: ViewerConfig,
    params: RenderParams,
    phase: ViewerPhase,
    page_count: usize,
    slots: Vec<PageSlot>,
    scroll_offset: u32,
    current_page: usize,
    generation: u64,
}

impl ViewerState {
    /// Create an empty viewer.
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            params: config.initial,
            config,
            phase: ViewerPhase::Empty,
            page_count: 0,
            slots: Vec::new(),
            scroll_offset: 0,
            current_page: 0,
            generation: 0,
        }
    }

    /// Show a document with `page_count` pages; layout starts over.
    pub fn open(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.reset_layout();
        if page_count == 0 {
            self.phase = ViewerPhase::Ready;
        }
    }

    /// Close the document.
    pub fn close(&mut self) {
        self.page_count = 0;
        self.slots.clear();
        self.scroll_offset = 0;
        self.current_page = 0;
        self.generation += 1;
        self.phase = ViewerPhase::Empty;
    }

    /// Zoom in by one step.
    pub fn zoom_in(&mut self) -> Result<()> {
        self.set_zoom(self.params.scale() * self.config.zoom_step)
    }

    /// Zoom out by one step.
    pub fn zoom_out(&mut self) -> Result<()> {
        self.set_zoom(self.params.scale() / self.config.zoom_step)
    }

    /// Set the scale, clamped to the configured limits.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is not a finite number.
    pub fn set_zoom(&mut self, scale: f32) -> Result<()> {
        if !scale.is_finite() {
            return Err(ToolkitError::invalid_render_params(format!(
                "Zoom must be a finite number, got {scale}"
            )));
        }

        let clamped = scale.clamp(self.config.min_scale, self.config.max_scale);
        let params = self.params.with_scale(clamped)?;
        self.apply(params);
        Ok(())
    }

    /// Turn a quarter clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.set_rotation(self.params.rotation().clockwise());
    }

    /// Turn a quarter counter-clockwise.
    pub fn rotate_counter_clockwise(&mut self) {
        self.set_rotation(self.params.rotation().counter_clockwise());
    }

    /// Set the rotation.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.apply(self.params.with_rotation(rotation));
    }

    fn apply(&mut self, params: RenderParams) {
        self.params = params;
        if self.phase != ViewerPhase::Empty {
            self.reset_layout();
        }
        debug!(
            scale = params.scale(),
            rotation = params.rotation().as_degrees(),
            generation = self.generation,
            "render parameters changed"
        );
    }

    fn reset_layout(&mut self) {
        self.slots.clear();
        self.scroll_offset = 0;
        self.current_page = usize::from(self.page_count > 0);
        self.generation += 1;
        self.phase = ViewerPhase::Loading;
    }

    /// Lay out a page that finished rendering.
    ///
    /// Returns `false` (and does nothing) unless the viewer is loading.
    pub fn page_rendered(&mut self, page: &RenderedPage) -> bool {
        if self.phase != ViewerPhase::Loading {
            return false;
        }

        let top = self
            .slots
            .last()
            .map_or(0, |slot| slot.bottom() + self.config.page_spacing);
        self.slots.push(PageSlot {
            page_number: page.page_number,
            top,
            width: page.width(),
            height: page.height(),
        });

        if self.slots.len() >= self.page_count {
            self.finish_loading();
        }
        true
    }

    /// End the loading phase even if some pages never arrived.
    pub fn finish_loading(&mut self) {
        if self.phase == ViewerPhase::Loading {
            self.phase = ViewerPhase::Ready;
            info!(pages = self.slots.len(), "viewer ready");
        }
    }

    /// Scroll to page `page_number` and return its offset.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ViewerNotReady`] while loading or empty, and
    /// when the page is not part of the layout.
    pub fn go_to_page(&mut self, page_number: usize) -> Result<u32> {
        if self.phase != ViewerPhase::Ready {
            return Err(ToolkitError::ViewerNotReady {
                message: format!("cannot go to page {page_number} while {:?}", self.phase),
            });
        }

        let slot = self
            .slots
            .iter()
            .find(|slot| slot.page_number == page_number)
            .copied()
            .ok_or_else(|| ToolkitError::ViewerNotReady {
                message: format!(
                    "page {page_number} is not laid out ({} page(s) available)",
                    self.slots.len()
                ),
            })?;

        self.scroll_offset = slot.top;
        self.current_page = slot.page_number;
        Ok(slot.top)
    }

    /// Record a new scroll offset and recompute the current page.
    pub fn on_scroll(&mut self, offset: u32) -> usize {
        self.scroll_offset = offset;

        let passed = self.slots.partition_point(|slot| slot.top <= offset);
        self.current_page = match passed {
            0 => self.slots.first().map_or(self.current_page, |slot| slot.page_number),
            n => self.slots[n - 1].page_number,
        };
        self.current_page
    }

    /// Current phase.
    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    /// Current render parameters.
    pub fn params(&self) -> RenderParams {
        self.params
    }

    /// Pages in the open document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Laid-out pages, top to bottom.
    pub fn slots(&self) -> &[PageSlot] {
        &self.slots
    }

    /// Current scroll offset.
    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    /// 1-based current page; 0 when there is none.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Height of the whole column.
    pub fn content_height(&self) -> u32 {
        self.slots.last().map_or(0, PageSlot::bottom)
    }

    /// Bumped on every layout reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Feeds pages to the panel and the layout together.
struct LayoutTarget<'s, P> {
    state: &'s mut ViewerState,
    panel: &'s mut P,
}

impl<P: LoadTarget> LoadTarget for LayoutTarget<'_, P> {
    fn clear(&mut self) {
        self.panel.clear();
    }

    fn append(&mut self, page: RenderedPage) {
        if self.state.page_rendered(&page) {
            self.panel.append(page);
        }
    }
}

/// A viewer bound to one renderer and one page panel.
pub struct Viewer<'r, R: PageRenderer + ?Sized, P: LoadTarget> {
    state: ViewerState,
    loader: IncrementalLoader<'r>,
    renderer: &'r R,
    panel: P,
    ticket: Option<LoadTicket>,
}

impl<'r, R: PageRenderer + ?Sized, P: LoadTarget> Viewer<'r, R, P> {
    /// Open `renderer`'s document and start loading it into `panel`.
    pub fn open(renderer: &'r R, panel: P, config: ViewerConfig) -> Result<Self> {
        config.validate()?;

        let mut viewer = Self {
            state: ViewerState::new(config),
            loader: IncrementalLoader::new(),
            renderer,
            panel,
            ticket: None,
        };
        viewer.state.open(renderer.page_count());
        viewer.restart();
        Ok(viewer)
    }

    fn restart(&mut self) {
        let stream = PageStream::new(self.renderer, self.state.params());
        self.ticket = Some(self.loader.start(stream, &mut self.panel));
    }

    /// Load one more page.
    pub fn tick(&mut self) -> TickOutcome {
        let mut target = LayoutTarget {
            state: &mut self.state,
            panel: &mut self.panel,
        };
        let outcome = self.loader.tick(&mut target);

        if matches!(outcome, TickOutcome::Finished | TickOutcome::Failed(_)) {
            self.state.finish_loading();
        }
        outcome
    }

    /// Load every remaining page, calling `between` after each one.
    ///
    /// # Errors
    ///
    /// Returns the render error that ended loading, if any.
    pub fn load_all<F: FnMut()>(&mut self, mut between: F) -> Result<()> {
        loop {
            match self.tick() {
                TickOutcome::Appended(_) | TickOutcome::Waiting => between(),
                TickOutcome::Finished | TickOutcome::Idle => return Ok(()),
                TickOutcome::Failed(err) => return Err(err),
            }
        }
    }

    /// Zoom in one step and reload.
    pub fn zoom_in(&mut self) -> Result<()> {
        self.state.zoom_in()?;
        self.restart();
        Ok(())
    }

    /// Zoom out one step and reload.
    pub fn zoom_out(&mut self) -> Result<()> {
        self.state.zoom_out()?;
        self.restart();
        Ok(())
    }

    /// Set the scale and reload.
    pub fn set_zoom(&mut self, scale: f32) -> Result<()> {
        self.state.set_zoom(scale)?;
        self.restart();
        Ok(())
    }

    /// Rotate clockwise and reload.
    pub fn rotate_clockwise(&mut self) {
        self.state.rotate_clockwise();
        self.restart();
    }

    /// Rotate counter-clockwise and reload.
    pub fn rotate_counter_clockwise(&mut self) {
        self.state.rotate_counter_clockwise();
        self.restart();
    }

    /// Set the rotation and reload.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.state.set_rotation(rotation);
        self.restart();
    }

    /// Scroll to a page.
    pub fn go_to_page(&mut self, page_number: usize) -> Result<u32> {
        self.state.go_to_page(page_number)
    }

    /// Report a scroll offset; returns the page now current.
    pub fn on_scroll(&mut self, offset: u32) -> usize {
        self.state.on_scroll(offset)
    }

    /// Whether `ticket` identifies the load in progress.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.loader.is_current(ticket)
    }

    /// Ticket of the most recent load.
    pub fn ticket(&self) -> Option<LoadTicket> {
        self.ticket
    }

    /// Layout state.
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// The page panel.
    pub fn panel(&self) -> &P {
        &self.panel
    }
}
