//! Output generation for the daily digest.
//!
//! A single submodule today:
//!
//! - [`digest`]: queries the trailing window from the store, groups articles
//!   by outlet, and renders the self-contained `newsflow_diario.html` page
//!
//! The digest is a derived view. It is regenerated from scratch and the
//! output file overwritten on every run; nothing here is persisted state.

pub mod digest;
