//! Interactive state shared by the combine and split flows.
//!
//! A [`Session`] is the explicit value passed to the operations; nothing is
//! kept in globals.

pub mod combine_list;
pub mod split_selection;

pub use combine_list::CombineList;
pub use split_selection::SplitSelection;

/// The combine list and the split selection.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Sources queued for combining.
    pub combine: CombineList,
    /// Pages marked for removal.
    pub split: SplitSelection,
}

impl Session {
    /// Empty session.
    pub fn new() -> Self {
        Self::default()
    }
}
