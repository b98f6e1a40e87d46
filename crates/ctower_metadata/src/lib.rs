//! # ctower_metadata
//!
//! Typed projection of provisioning outputs for ctower.
//!
//! The provisioning tool reports its outputs as a JSON object keyed by output
//! name, each value wrapping a single string. This crate decodes that object
//! into a per-provider shape, validates that every required output is
//! present, and supports looking up one output by name at runtime.
//!
//! ## Example
//!
//! ```rust
//! use ctower_metadata::{AwsMetadata, Metadata};
//!
//! let raw = br#"{"region": {"value": "eu-west-1"}}"#;
//! let metadata = AwsMetadata::decode(raw).unwrap();
//! assert_eq!(metadata.get("Region").unwrap(), "eu-west-1");
//! assert!(metadata.validate().is_err());
//! ```

pub mod aws;
pub mod error;
pub mod gcp;
pub mod schema;

pub use aws::AwsMetadata;
pub use error::{MetadataError, MetadataResult};
pub use gcp::GcpMetadata;
pub use schema::{Field, Metadata, MetadataStringValue};
