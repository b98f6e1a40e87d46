//! # ctower_overlay
//!
//! Operation sets and overlay composition for ctower manifests.
//!
//! A base document is patched by an ordered list of operation sets. Each set
//! is a YAML list of `add`, `replace` and `remove` operations whose values
//! may reference variables with `<% .field %>` placeholders.
//!
//! ## Example
//!
//! ```rust
//! use ctower_overlay::{BaseDocument, OperationSet, OverlayComposer};
//! use ctower_templates::Variables;
//!
//! let base = BaseDocument::new("director", "name: bosh\nreleases: []\n");
//! let cpi = OperationSet::new(
//!     "cpi",
//!     "- type: add\n  path: /releases/-\n  value: {name: cpi, version: <% .cpi_version %>}\n",
//! );
//! let vars = Variables::new().with("cpi_version", "75");
//!
//! let manifest = OverlayComposer::new().compose(&base, [&cpi], &vars).unwrap();
//! assert!(manifest.contains("name: cpi"));
//! ```

pub mod composer;
pub mod error;
pub mod operation;
pub mod path;
mod patch;

pub use composer::{BaseDocument, OverlayComposer};
pub use error::{ComposeError, ComposeResult};
pub use operation::{operations_from_value, parse_operations, Operation, OperationKind, OperationSet};
pub use path::{OpsPath, PathSegment, Segment};
