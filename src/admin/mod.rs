//! Admin collection management: filter derivation and the per-kind controller.

pub mod controller;
pub mod filter;

pub use controller::{BulkReport, CollectionController, ControllerError, Phase};
pub use filter::{visible_records, FilterState, PublishFilter, SortDirection, SortField};
