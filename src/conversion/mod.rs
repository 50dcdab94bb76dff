//! # Schema Conversion
//!
//! Converters between the served `PassboltSecret` generations.
//!
//! The chain is `v1alpha1 <-> v1alpha2 <-> v1alpha3 <-> v1`. Every pair of adjacent
//! generations has an `upgrade` and a `downgrade` function living in the module named
//! after the older one. [`to_hub`] and [`from_hub`] compose them so that any generation
//! reaches any other through `v1`.
//!
//! Older generations address Passbolt resources by name and newer ones by ID, so the
//! `v1alpha2 <-> v1alpha3` step needs a [`NameLookup`].

mod review;
pub mod v1alpha1;
pub mod v1alpha2;
pub mod v1alpha3;

use crate::cache::{CacheError, Cacher};
use crate::constants::REVERSE_KEY_PREFIX;
use crate::crd::{self, v1, GROUP};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use review::convert_review;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("error migrating secret {name} at {position}: {source}")]
    Lookup {
        name: String,
        position: Position,
        #[source]
        source: CacheError,
    },

    #[error("{field} is required to migrate secret {object} of type {secret_type}")]
    MissingReference {
        object: String,
        field: &'static str,
        secret_type: String,
    },

    #[error("secret {object} of type {secret_type} cannot be represented in {api_version}")]
    Unrepresentable {
        object: String,
        secret_type: String,
        api_version: String,
    },

    #[error("unsupported apiVersion {0}")]
    UnknownVersion(String),

    #[error("malformed PassboltSecret: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Location of a reference inside a spec, used in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Index(usize),
    Key(String),
    /// The single docker config reference
    Spec,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Index(index) => write!(f, "index {index}"),
            Position::Key(key) => write!(f, "key {key}"),
            Position::Spec => f.write_str("spec"),
        }
    }
}

/// Translation between Passbolt resource names and IDs
#[async_trait]
pub trait NameLookup: Send + Sync {
    async fn identifier_for_name(&self, name: &str) -> Result<String, CacheError>;

    async fn name_for_identifier(&self, id: &str) -> Result<String, CacheError>;
}

/// [`NameLookup`] over the name/ID cache
///
/// Names map to IDs directly, IDs map back to names under [`REVERSE_KEY_PREFIX`].
#[derive(Debug, Clone)]
pub struct CacheLookup {
    cache: Arc<dyn Cacher>,
}

impl CacheLookup {
    pub fn new(cache: Arc<dyn Cacher>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl NameLookup for CacheLookup {
    async fn identifier_for_name(&self, name: &str) -> Result<String, CacheError> {
        self.cache.get(name).await
    }

    async fn name_for_identifier(&self, id: &str) -> Result<String, CacheError> {
        self.cache.get(&format!("{REVERSE_KEY_PREFIX}{id}")).await
    }
}

/// Served generation of the `PassboltSecret` resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    V1alpha1,
    V1alpha2,
    V1alpha3,
    V1,
}

impl Generation {
    pub const ALL: [Generation; 4] = [
        Generation::V1alpha1,
        Generation::V1alpha2,
        Generation::V1alpha3,
        Generation::V1,
    ];

    #[must_use]
    pub fn version(&self) -> &'static str {
        match self {
            Generation::V1alpha1 => "v1alpha1",
            Generation::V1alpha2 => "v1alpha2",
            Generation::V1alpha3 => "v1alpha3",
            Generation::V1 => "v1",
        }
    }

    #[must_use]
    pub fn api_version(&self) -> String {
        format!("{GROUP}/{}", self.version())
    }

    /// Parse `passbolt.tagesspiegel.de/<version>`
    #[allow(clippy::missing_errors_doc, reason = "Unknown group or version")]
    pub fn from_api_version(api_version: &str) -> Result<Self, ConversionError> {
        let version = api_version
            .strip_prefix(GROUP)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ConversionError::UnknownVersion(api_version.to_string()))?;
        Self::from_version(version)
            .ok_or_else(|| ConversionError::UnknownVersion(api_version.to_string()))
    }

    #[must_use]
    pub fn from_version(version: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.version() == version)
    }
}

/// A `PassboltSecret` of any served generation
#[derive(Debug, Clone)]
pub enum AnyPassboltSecret {
    V1alpha1(Box<crd::v1alpha1::PassboltSecret>),
    V1alpha2(Box<crd::v1alpha2::PassboltSecret>),
    V1alpha3(Box<crd::v1alpha3::PassboltSecret>),
    V1(Box<v1::PassboltSecret>),
}

impl AnyPassboltSecret {
    /// Deserialize an object, picking the generation from its `apiVersion`
    #[allow(clippy::missing_errors_doc, reason = "See ConversionError")]
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConversionError> {
        let api_version = value
            .get("apiVersion")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let object = match Generation::from_api_version(&api_version)? {
            Generation::V1alpha1 => Self::V1alpha1(Box::new(serde_json::from_value(value)?)),
            Generation::V1alpha2 => Self::V1alpha2(Box::new(serde_json::from_value(value)?)),
            Generation::V1alpha3 => Self::V1alpha3(Box::new(serde_json::from_value(value)?)),
            Generation::V1 => Self::V1(Box::new(serde_json::from_value(value)?)),
        };
        Ok(object)
    }

    #[allow(clippy::missing_errors_doc, reason = "See ConversionError")]
    pub fn into_value(self) -> Result<serde_json::Value, ConversionError> {
        let value = match self {
            Self::V1alpha1(o) => serde_json::to_value(*o)?,
            Self::V1alpha2(o) => serde_json::to_value(*o)?,
            Self::V1alpha3(o) => serde_json::to_value(*o)?,
            Self::V1(o) => serde_json::to_value(*o)?,
        };
        Ok(value)
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        match self {
            Self::V1alpha1(_) => Generation::V1alpha1,
            Self::V1alpha2(_) => Generation::V1alpha2,
            Self::V1alpha3(_) => Generation::V1alpha3,
            Self::V1(_) => Generation::V1,
        }
    }
}

/// Upgrade any generation to `v1`
#[allow(clippy::missing_errors_doc, reason = "See ConversionError")]
pub async fn to_hub(
    object: AnyPassboltSecret,
    lookup: &dyn NameLookup,
) -> Result<v1::PassboltSecret, ConversionError> {
    let alpha2 = match object {
        AnyPassboltSecret::V1(hub) => return Ok(*hub),
        AnyPassboltSecret::V1alpha3(o) => return Ok(v1alpha3::upgrade(*o)),
        AnyPassboltSecret::V1alpha2(o) => *o,
        AnyPassboltSecret::V1alpha1(o) => v1alpha1::upgrade(*o),
    };
    let alpha3 = v1alpha2::upgrade(alpha2, lookup).await?;
    Ok(v1alpha3::upgrade(alpha3))
}

/// Downgrade `v1` to `target`
#[allow(clippy::missing_errors_doc, reason = "See ConversionError")]
pub async fn from_hub(
    hub: v1::PassboltSecret,
    target: Generation,
    lookup: &dyn NameLookup,
) -> Result<AnyPassboltSecret, ConversionError> {
    if target == Generation::V1 {
        return Ok(AnyPassboltSecret::V1(Box::new(hub)));
    }
    let alpha3 = v1alpha3::downgrade(hub);
    if target == Generation::V1alpha3 {
        return Ok(AnyPassboltSecret::V1alpha3(Box::new(alpha3)));
    }
    let alpha2 = v1alpha2::downgrade(alpha3, lookup).await?;
    if target == Generation::V1alpha2 {
        return Ok(AnyPassboltSecret::V1alpha2(Box::new(alpha2)));
    }
    let alpha1 = v1alpha1::downgrade(alpha2)?;
    Ok(AnyPassboltSecret::V1alpha1(Box::new(alpha1)))
}

/// Convert between any two generations through the hub
#[allow(clippy::missing_errors_doc, reason = "See ConversionError")]
pub async fn convert(
    object: AnyPassboltSecret,
    target: Generation,
    lookup: &dyn NameLookup,
) -> Result<AnyPassboltSecret, ConversionError> {
    if object.generation() == target {
        return Ok(object);
    }
    let hub = to_hub(object, lookup).await?;
    from_hub(hub, target, lookup).await
}
