//! # ctower_templates
//!
//! Variable records and placeholder rendering for ctower.
//!
//! Templates are plain text (usually YAML) carrying `<% .field %>`
//! placeholders. The renderer resolves each placeholder against a
//! [`Variables`] record built from a provider's typed variable struct.
//! [`TemplateRenderer::render`] substitutes text verbatim, while
//! [`TemplateRenderer::render_yaml`] fills placeholders in the parsed YAML
//! tree.
//!
//! ## Example
//!
//! ```rust
//! use ctower_templates::{TemplateRenderer, Variables};
//!
//! let vars = Variables::new().with("availability_zone", "eu-west-1a");
//! let rendered = TemplateRenderer::new()
//!     .render("cloud-config", "az: <% .availability_zone %>", &vars)
//!     .unwrap();
//! assert_eq!(rendered, "az: eu-west-1a");
//! ```

pub mod error;
pub mod renderer;
pub mod vars;
pub mod yaml;

pub use error::{TemplateError, TemplateResult};
pub use renderer::TemplateRenderer;
pub use vars::{FieldPath, Variables};
pub use yaml::{is_blank_document, to_yaml_string};
