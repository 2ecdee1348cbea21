//! # Visit and exposure model
//!
//! A [`Target`](crate::target::Target) owns an ordered list of [`Visit`]s, each visit owns
//! the [`Exposure`]s recorded for it, and each exposure maps a camera to the [`Image`] it
//! produced:
//!
//! ```text
//! Target
//! └── Visit*        (built once from a VisitSpec, never added or removed)
//!     └── Exposure* (appended as the camera collaborator completes exposures)
//!         └── (camera id → Image)  in acquisition order
//! ```
//!
//! Images are typed records: a path and an optional plate solution ([`WcsSolution`]).

pub mod exposure;
pub mod image;
pub mod visit;

pub use exposure::Exposure;
pub use image::{Image, WcsSolution};
pub use visit::{Visit, VisitSpec};
