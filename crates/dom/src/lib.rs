//! Source document model for article extraction
//!
//! Read-only DOM tree processing with an index-based design.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON ─┐
//!           ├→ DomService → DomArena (owned) → queries / traversal
//! HTML str ─┘                  ↓
//!                        NodeId (u32) + parent links
//! ```
//!
//! Rendering data (layout boxes, natural image sizes) is merged into the
//! arena after the tree is built, so the same tree works with or without
//! a live browser behind it.

pub mod arena;
pub mod error;
pub mod selector;
pub mod service;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use selector::{ArenaElement, SelectorList};
pub use service::DomService;
pub use types::*;
