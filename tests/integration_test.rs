#[path = "integration/common/mod.rs"]
mod common;

#[path = "integration/combine.rs"]
mod combine;

#[path = "integration/remove.rs"]
mod remove;

#[path = "integration/loader_viewer.rs"]
mod loader_viewer;

#[path = "integration/print.rs"]
mod print;
