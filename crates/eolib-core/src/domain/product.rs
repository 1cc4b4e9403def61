//! Product identity and remote product descriptors.
//!
//! Pure data types with no I/O dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a remote repository (e.g. a mission data hub).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Create a new repository identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the repository name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepositoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RepositoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Canonical identifier for a product.
///
/// Represents a unique product as `repository/name`. This is the single
/// identifier format used throughout the system.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId {
    repository: RepositoryId,
    name: String,
}

impl ProductId {
    /// Create a new product ID.
    pub fn new(repository: impl Into<RepositoryId>, name: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            name: name.into(),
        }
    }

    /// Get the repository this product belongs to.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Get the product name (e.g. a mission scene identifier).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repository, self.name)
    }
}

impl FromStr for ProductId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The repository name never contains '/', product names may.
        match s.split_once('/') {
            Some((repository, name)) if !name.is_empty() => Ok(Self {
                repository: RepositoryId::new(repository),
                name: name.to_string(),
            }),
            _ => Ok(Self {
                repository: RepositoryId::new(""),
                name: s.to_string(),
            }),
        }
    }
}

/// Descriptor of a product visible in a remote repository.
///
/// This is the search-result metadata the repository provider returns;
/// the actual product data is only fetched by a download task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteProduct {
    /// Canonical product identity.
    pub id: ProductId,
    /// Mission that acquired the product (e.g. "Sentinel-2").
    pub mission: String,
    /// Acquisition timestamp, if the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_date: Option<DateTime<Utc>>,
    /// Approximate archive size in bytes, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Footprint polygon as WKT, if the provider reports one. Opaque here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,
}

impl RemoteProduct {
    /// Create a new remote product descriptor with required fields.
    pub fn new(id: ProductId, mission: impl Into<String>) -> Self {
        Self {
            id,
            mission: mission.into(),
            acquisition_date: None,
            size_bytes: None,
            footprint: None,
        }
    }

    /// Set the acquisition date.
    #[must_use]
    pub const fn with_acquisition_date(mut self, date: DateTime<Utc>) -> Self {
        self.acquisition_date = Some(date);
        self
    }

    /// Set the approximate size in bytes.
    #[must_use]
    pub const fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Set the footprint WKT.
    #[must_use]
    pub fn with_footprint(mut self, footprint: impl Into<String>) -> Self {
        self.footprint = Some(footprint.into());
        self
    }
}
