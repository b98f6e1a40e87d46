//! Metadata shapes and their field tables.
//!
//! Each provider's provisioning output is projected into a struct whose
//! fields all wrap a single [`MetadataStringValue`]. The struct carries a
//! static table of [`Field`] entries mapping a field's canonical name and its
//! output key to an accessor, which is what [`Metadata::get`] and
//! [`Metadata::validate`] walk. Shapes are declared with `metadata_struct!`
//! so the struct and its table cannot drift apart.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};

/// A single provisioning output, e.g. `{"value": "eu-west-1", "sensitive": false}`.
///
/// Anything besides `value` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataStringValue {
    #[serde(default)]
    pub value: String,
}

impl MetadataStringValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// One entry of a metadata shape's field table.
pub struct Field<M> {
    /// Canonical field name, e.g. `Region`.
    pub name: &'static str,
    /// Output key in the provisioning output, e.g. `region`.
    pub key: &'static str,
    pub required: bool,
    get: fn(&M) -> &MetadataStringValue,
}

impl<M> Field<M> {
    pub const fn new(
        name: &'static str,
        key: &'static str,
        required: bool,
        get: fn(&M) -> &MetadataStringValue,
    ) -> Self {
        Self {
            name,
            key,
            required,
            get,
        }
    }

    pub fn value<'a>(&self, metadata: &'a M) -> &'a str {
        (self.get)(metadata).as_str()
    }

    fn is_missing(&self, metadata: &M) -> bool {
        (self.get)(metadata).is_empty()
    }
}

/// A typed projection of provisioning output.
pub trait Metadata: DeserializeOwned + Sized + 'static {
    /// Provider the shape belongs to, used in log lines.
    const IAAS: &'static str;

    /// The shape's field table.
    fn fields() -> &'static [Field<Self>];

    /// Decode raw provisioning output. Unknown keys are ignored and absent
    /// keys decode as empty values; call [`Metadata::validate`] afterwards.
    ///
    /// The output must be a JSON object keyed by output name.
    fn decode(raw: &[u8]) -> MetadataResult<Self> {
        let outputs: Map<String, Value> = serde_json::from_slice(raw)?;
        let metadata = serde_json::from_value(Value::Object(outputs))?;
        debug!("Decoded {} provisioning output ({} bytes)", Self::IAAS, raw.len());
        Ok(metadata)
    }

    /// Check every required field is present and non-empty, reporting all
    /// missing output keys at once.
    fn validate(&self) -> MetadataResult<()> {
        let missing: Vec<String> = Self::fields()
            .iter()
            .filter(|field| field.required && field.is_missing(self))
            .map(|field| field.key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MetadataError::MissingFields { missing })
        }
    }

    /// Look up a single field by canonical name or output key.
    fn get(&self, name: &str) -> MetadataResult<&str> {
        Self::fields()
            .iter()
            .find(|field| field.name == name || field.key == name)
            .map(|field| field.value(self))
            .ok_or_else(|| MetadataError::FieldNotFound {
                name: name.to_string(),
            })
    }

    /// Decode and validate in one step.
    fn load(raw: &[u8]) -> MetadataResult<Self> {
        let metadata = Self::decode(raw)?;
        metadata.validate()?;
        Ok(metadata)
    }
}

/// Declare a metadata shape together with its field table.
///
/// ```ignore
/// metadata_struct! {
///     pub struct AwsMetadata("aws") {
///         region: "Region" => "region" (required),
///     }
/// }
/// ```
macro_rules! metadata_struct {
    (@required required) => { true };
    (@required optional) => { false };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident ($iaas:literal) {
            $(
                $(#[$fmeta:meta])*
                $field:ident: $label:literal => $key:literal ($req:ident),
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                #[serde(rename = $key)]
                pub $field: $crate::schema::MetadataStringValue,
            )*
        }

        impl $crate::schema::Metadata for $name {
            const IAAS: &'static str = $iaas;

            fn fields() -> &'static [$crate::schema::Field<Self>] {
                const FIELDS: &[$crate::schema::Field<$name>] = &[
                    $(
                        $crate::schema::Field::<$name>::new(
                            $label,
                            $key,
                            metadata_struct!(@required $req),
                            |m| &m.$field,
                        ),
                    )*
                ];
                FIELDS
            }
        }
    };
}

pub(crate) use metadata_struct;

#[cfg(test)]
mod tests {
    use super::*;

    metadata_struct! {
        struct Sample("test") {
            region: "Region" => "region" (required),
            subnet_id: "SubnetID" => "subnet_id" (required),
            nickname: "Nickname" => "nickname" (optional),
        }
    }

    #[test]
    fn test_decode_ignores_unknown_and_defaults_missing() {
        let raw = br#"{"region": {"value": "eu-west-1", "sensitive": false, "type": "string"}, "extra": {"value": "x"}}"#;
        let sample = Sample::decode(raw).unwrap();
        assert_eq!(sample.region.as_str(), "eu-west-1");
        assert_eq!(sample.subnet_id, MetadataStringValue::default());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            Sample::decode(b"{\"region\": \"not-wrapped\"}"),
            Err(MetadataError::Decode(_))
        ));
        assert!(matches!(Sample::decode(b"[1, 2"), Err(MetadataError::Decode(_))));
    }

    #[test]
    fn test_decode_requires_object() {
        for raw in [&b"[]"[..], b"[{\"value\": \"eu-west-1\"}]", b"\"region\"", b"null"] {
            assert!(
                matches!(Sample::decode(raw), Err(MetadataError::Decode(_))),
                "{} decoded",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn test_validate_skips_optional_fields() {
        let sample = Sample {
            region: MetadataStringValue::new("eu-west-1"),
            subnet_id: MetadataStringValue::new("subnet-1"),
            nickname: MetadataStringValue::default(),
        };
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_validate_treats_blank_as_missing() {
        let sample = Sample {
            region: MetadataStringValue::new("   "),
            subnet_id: MetadataStringValue::new("subnet-1"),
            nickname: MetadataStringValue::default(),
        };
        match sample.validate() {
            Err(MetadataError::MissingFields { missing }) => assert_eq!(missing, vec!["region"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_get_by_name_or_key() {
        let sample = Sample {
            region: MetadataStringValue::new("eu-west-1"),
            ..Default::default()
        };
        assert_eq!(sample.get("Region").unwrap(), "eu-west-1");
        assert_eq!(sample.get("region").unwrap(), "eu-west-1");
        assert_eq!(sample.get("SubnetID").unwrap(), "");
        assert!(matches!(
            sample.get("region_name"),
            Err(MetadataError::FieldNotFound { name }) if name == "region_name"
        ));
    }
}
