//! Generic transportation entity value type.

use super::EntityDomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Key/value attributes attached to an entity.
pub type AttributeMap = BTreeMap<String, serde_json::Value>;

/// Marker describing which kind of entity a [`TransportEntity`] holds.
pub trait EntityKind:
    fmt::Debug + Clone + Copy + Default + PartialEq + Eq + Send + Sync + 'static
{
    /// Lowercase label used in logs and error messages.
    const LABEL: &'static str;
}

macro_rules! entity_kind {
    ($(#[$meta:meta])* $kind:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $kind;

        impl EntityKind for $kind {
            const LABEL: &'static str = $label;
        }
    };
}

entity_kind!(
    /// Marker for [`Station`] entities.
    StationKind,
    "station"
);
entity_kind!(
    /// Marker for [`Line`] entities.
    LineKind,
    "line"
);
entity_kind!(
    /// Marker for [`Ride`] entities.
    RideKind,
    "ride"
);
entity_kind!(
    /// Marker for [`Company`] entities.
    CompanyKind,
    "company"
);

/// A stop or station served by a provider.
pub type Station = TransportEntity<StationKind>;
/// A transit line.
pub type Line = TransportEntity<LineKind>;
/// One run of a vehicle along a line.
pub type Ride = TransportEntity<RideKind>;
/// A transport operator.
pub type Company = TransportEntity<CompanyKind>;

/// Provider-qualified transportation entity.
///
/// Equality and hashing consider only the identifier. Ordering by name is
/// available through [`TransportEntity::compare_by_name`] and is deliberately
/// not exposed as [`Ord`], since two entities with equal names are not equal.
#[derive(Debug, Clone)]
pub struct TransportEntity<K: EntityKind> {
    identifier: String,
    name: String,
    internal: AttributeMap,
    properties: AttributeMap,
    kind: PhantomData<K>,
}

impl<K: EntityKind> TransportEntity<K> {
    /// Creates an entity with the given identifier and display name.
    ///
    /// The identifier is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`EntityDomainError::EmptyIdentifier`] when the identifier is
    /// empty after trimming.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, EntityDomainError> {
        let raw = identifier.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EntityDomainError::EmptyIdentifier { kind: K::LABEL });
        }

        Ok(Self {
            identifier: trimmed.to_owned(),
            name: name.into(),
            internal: AttributeMap::new(),
            properties: AttributeMap::new(),
            kind: PhantomData,
        })
    }

    /// Reconstructs an entity from its four transported fields.
    ///
    /// # Errors
    ///
    /// Returns [`EntityDomainError::MissingIdentifier`] when the identifier
    /// is empty while either attribute map is populated.
    pub fn from_parts(
        identifier: String,
        internal: AttributeMap,
        name: String,
        properties: AttributeMap,
    ) -> Result<Self, EntityDomainError> {
        if identifier.is_empty() && !(internal.is_empty() && properties.is_empty()) {
            return Err(EntityDomainError::MissingIdentifier {
                kind: K::LABEL,
                name,
            });
        }

        Ok(Self {
            identifier,
            name,
            internal,
            properties,
            kind: PhantomData,
        })
    }

    /// Returns the null entity: no identifier, no name, no attributes.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            identifier: String::new(),
            name: String::new(),
            internal: AttributeMap::new(),
            properties: AttributeMap::new(),
            kind: PhantomData,
        }
    }

    /// Replaces the provider-private attributes.
    #[must_use]
    pub fn with_internal(mut self, internal: AttributeMap) -> Self {
        self.internal = internal;
        self
    }

    /// Replaces the UI-visible attributes.
    #[must_use]
    pub fn with_properties(mut self, properties: AttributeMap) -> Self {
        self.properties = properties;
        self
    }

    /// Sets a single UI-visible attribute.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Returns the provider-qualified identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the provider-private attributes.
    #[must_use]
    pub const fn internal(&self) -> &AttributeMap {
        &self.internal
    }

    /// Returns the UI-visible attributes.
    #[must_use]
    pub const fn properties(&self) -> &AttributeMap {
        &self.properties
    }

    /// Returns whether this is the null entity.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.identifier.is_empty() && self.internal.is_empty() && self.properties.is_empty()
    }

    /// Compares two entities by display name.
    #[must_use]
    pub fn compare_by_name(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// Sorts entities by display name, keeping the relative order of equal
/// names.
pub fn sort_by_name<K: EntityKind>(entities: &mut [TransportEntity<K>]) {
    entities.sort_by(TransportEntity::compare_by_name);
}

impl<K: EntityKind> Default for TransportEntity<K> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K: EntityKind> PartialEq for TransportEntity<K> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl<K: EntityKind> Eq for TransportEntity<K> {}

impl<K: EntityKind> Hash for TransportEntity<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl<K: EntityKind> fmt::Display for TransportEntity<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.identifier)
    }
}

impl<K: EntityKind> Serialize for TransportEntity<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            &self.identifier,
            &self.internal,
            &self.name,
            &self.properties,
        )
            .serialize(serializer)
    }
}

impl<'de, K: EntityKind> Deserialize<'de> for TransportEntity<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (identifier, internal, name, properties) =
            <(String, AttributeMap, String, AttributeMap)>::deserialize(deserializer)?;
        Self::from_parts(identifier, internal, name, properties).map_err(serde::de::Error::custom)
    }
}
