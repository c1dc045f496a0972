use pdftoolkit::config::ViewerConfig;
use pdftoolkit::loader::{IncrementalLoader, TickOutcome};
use pdftoolkit::render::parallel::{BackgroundRender, render_parallel};
use pdftoolkit::render::raster::RasterDocument;
use pdftoolkit::render::stream::PageStream;
use pdftoolkit::render::{PageRenderer, RenderParams, RenderedPage, Rotation};
use pdftoolkit::viewer::{Viewer, ViewerPhase};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{SolidRenderer, write_png};

fn numbers(pages: &[RenderedPage]) -> Vec<usize> {
    pages.iter().map(|page| page.page_number).collect()
}

fn open_viewer<R: PageRenderer>(renderer: &R) -> Viewer<'_, R, Vec<RenderedPage>> {
    Viewer::open(renderer, Vec::new(), ViewerConfig::default()).unwrap()
}

#[test]
fn test_loader_appends_one_page_per_tick() {
    let renderer = SolidRenderer::new(3);
    let mut panel: Vec<RenderedPage> = Vec::new();
    let mut loader = IncrementalLoader::new();

    loader.start(PageStream::new(&renderer, RenderParams::default()), &mut panel);

    assert!(matches!(loader.tick(&mut panel), TickOutcome::Appended(1)));
    assert_eq!(panel.len(), 1);
    assert!(matches!(loader.tick(&mut panel), TickOutcome::Appended(2)));
    assert!(matches!(loader.tick(&mut panel), TickOutcome::Appended(3)));
    assert!(matches!(loader.tick(&mut panel), TickOutcome::Finished));
    assert!(matches!(loader.tick(&mut panel), TickOutcome::Idle));
    assert_eq!(numbers(&panel), [1, 2, 3]);
}

#[test]
fn test_new_load_supersedes_old_one() {
    let renderer = SolidRenderer::new(4);
    let mut panel: Vec<RenderedPage> = Vec::new();
    let mut loader = IncrementalLoader::new();

    let first = loader.start(PageStream::new(&renderer, RenderParams::default()), &mut panel);
    loader.tick(&mut panel);
    loader.tick(&mut panel);
    assert!(loader.is_current(first));

    let zoomed = RenderParams::new(2.0, Rotation::None).unwrap();
    let second = loader.start(PageStream::new(&renderer, zoomed), &mut panel);
    assert!(!loader.is_current(first));
    assert!(loader.is_current(second));
    assert!(panel.is_empty());

    let count = loader.drive(&mut panel, || {}).unwrap();
    assert_eq!(count, 4);
    assert_eq!(numbers(&panel), [1, 2, 3, 4]);
    assert!(panel.iter().all(|page| page.width() == 200 && page.height() == 400));
    assert!(!loader.is_current(second));
}

#[test]
fn test_background_render_through_loader() {
    let renderer = Arc::new(SolidRenderer::new(5));
    let source = BackgroundRender::spawn(renderer, RenderParams::default(), 2).unwrap();

    let mut panel: Vec<RenderedPage> = Vec::new();
    let mut loader = IncrementalLoader::new();
    loader.start(source, &mut panel);

    let count = loader.drive(&mut panel, std::thread::yield_now).unwrap();
    assert_eq!(count, 5);
    assert_eq!(numbers(&panel), [1, 2, 3, 4, 5]);
}

#[test]
fn test_cancelled_background_load_stops_appending() {
    let renderer = Arc::new(SolidRenderer::new(50));
    let source = BackgroundRender::spawn(renderer, RenderParams::default(), 1).unwrap();

    let mut panel: Vec<RenderedPage> = Vec::new();
    let mut loader = IncrementalLoader::new();
    let ticket = loader.start(source, &mut panel);
    loader.cancel();

    assert!(!loader.is_current(ticket));
    assert!(matches!(loader.tick(&mut panel), TickOutcome::Idle));
    assert!(panel.is_empty());
}

#[tokio::test]
async fn test_render_parallel_keeps_page_order() {
    let renderer = Arc::new(SolidRenderer::new(8));
    let params = RenderParams::new(0.5, Rotation::Clockwise90).unwrap();

    let pages: Vec<RenderedPage> = render_parallel(renderer, params, 3)
        .await
        .into_iter()
        .collect::<pdftoolkit::Result<_>>()
        .unwrap();

    assert_eq!(numbers(&pages), [1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(pages.iter().all(|page| page.width() == 100 && page.height() == 50));
}

#[test]
fn test_viewer_layout_and_navigation() {
    let renderer = SolidRenderer::new(3);
    let mut viewer = open_viewer(&renderer);
    assert_eq!(viewer.state().phase(), ViewerPhase::Loading);
    assert!(viewer.go_to_page(1).is_err());

    viewer.load_all(|| {}).unwrap();

    let state = viewer.state();
    assert_eq!(state.phase(), ViewerPhase::Ready);
    let tops: Vec<u32> = state.slots().iter().map(|slot| slot.top).collect();
    assert_eq!(tops, [0, 210, 420]);
    assert_eq!(state.content_height(), 620);
    assert_eq!(viewer.panel().len(), 3);

    assert_eq!(viewer.go_to_page(3).unwrap(), 420);
    assert_eq!(viewer.state().current_page(), 3);
    assert!(viewer.go_to_page(4).is_err());

    assert_eq!(viewer.on_scroll(215), 2);
    assert_eq!(viewer.on_scroll(0), 1);
}

#[test]
fn test_viewer_zoom_reloads_at_new_scale() {
    let renderer = SolidRenderer::new(2);
    let mut viewer = open_viewer(&renderer);
    viewer.load_all(|| {}).unwrap();

    let first_ticket = viewer.ticket().unwrap();
    let generation = viewer.state().generation();

    viewer.zoom_in().unwrap();
    assert_eq!(viewer.state().phase(), ViewerPhase::Loading);
    assert!(viewer.state().generation() > generation);
    assert_ne!(viewer.ticket().unwrap(), first_ticket);
    assert!(viewer.panel().is_empty());

    viewer.load_all(|| {}).unwrap();
    assert_eq!(viewer.state().phase(), ViewerPhase::Ready);
    assert_eq!(viewer.state().params().scale(), 1.25);
    let heights: Vec<u32> = viewer.state().slots().iter().map(|slot| slot.height).collect();
    assert_eq!(heights, [250, 250]);

    viewer.rotate_clockwise();
    viewer.load_all(|| {}).unwrap();
    let slot = viewer.state().slots()[0];
    assert_eq!((slot.width, slot.height), (250, 125));
}

#[test]
fn test_viewer_zoom_is_clamped() {
    let renderer = SolidRenderer::new(1);
    let mut viewer = open_viewer(&renderer);

    viewer.set_zoom(100.0).unwrap();
    assert_eq!(viewer.state().params().scale(), 8.0);
    viewer.set_zoom(0.001).unwrap();
    assert_eq!(viewer.state().params().scale(), 0.1);
    assert!(viewer.set_zoom(f32::NAN).is_err());
}

#[test]
fn test_viewer_over_image_source() {
    let dir = TempDir::new().unwrap();
    let png = write_png(dir.path(), "scan.png", 64, 48);
    let document = RasterDocument::open(&png).unwrap();

    let mut viewer = open_viewer(&document);
    viewer.load_all(|| {}).unwrap();

    assert_eq!(viewer.state().page_count(), 1);
    let slot = viewer.state().slots()[0];
    assert_eq!((slot.width, slot.height), (64, 48));
    assert_eq!(viewer.go_to_page(1).unwrap(), 0);
}
