//! Reader-view extraction
//!
//! Turns a rendered page into a distraction-free article view.
//!
//! ## Pipeline
//!
//! ```text
//! Document ─→ Locator ─→ NodeFilter ─→ Transformer ─→ OutputDocument
//!    │         (container)  (keep/drop)   (deep copy)        ↑
//!    └──────────────→ metadata (title, byline) ──────────────┘
//! ```
//!
//! Every stage reads the source [`Document`] through shared references and
//! reaches layout through an injected [`Geometry`]. The output tree owns
//! its nodes and never aliases the source.

pub mod assembler;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod locator;
pub mod metadata;
pub mod output;
pub mod rules;
pub mod surface;
pub mod transform;

pub use assembler::{Assembly, Reader};
pub use config::ReaderConfig;
pub use document::Document;
pub use error::{ReaderError, Result};
pub use filter::{Decision, DropReason, NodeFilter, Verdict};
pub use geometry::{Geometry, NodeMetrics, SnapshotGeometry, StaticGeometry};
pub use locator::{LocateStage, Located, Locator};
pub use output::{OutputDocument, OutputElement, OutputNode};
pub use rules::Rules;
pub use surface::{LocalSurface, Surface};
pub use transform::Transformer;
