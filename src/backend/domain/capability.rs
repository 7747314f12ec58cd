//! Capability tokens advertised by backends at registration.

use super::ParseCapabilityError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A query family a backend can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Capability {
    /// Station suggestions from partial text.
    SuggestStationFromString,
    /// Line suggestions from partial text.
    SuggestLineFromString,
    /// Rides departing from a station.
    RidesFromStation,
}

impl Capability {
    /// Returns the token exchanged with backends.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuggestStationFromString => "capability:real_time_suggest_station_from_string",
            Self::SuggestLineFromString => "capability:real_time_suggest_line_from_string",
            Self::RidesFromStation => "capability:real_time_rides_from_station",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Capability {
    type Error = ParseCapabilityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "capability:real_time_suggest_station_from_string" => {
                Ok(Self::SuggestStationFromString)
            }
            "capability:real_time_suggest_line_from_string" => Ok(Self::SuggestLineFromString),
            "capability:real_time_rides_from_station" => Ok(Self::RidesFromStation),
            _ => Err(ParseCapabilityError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for Capability {
    type Error = ParseCapabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.as_str().to_owned()
    }
}

/// Set of capabilities advertised by one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    /// Creates an empty capability set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses tokens, skipping unknown ones with a warning.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for token in tokens {
            match Capability::try_from(token.as_ref()) {
                Ok(capability) => {
                    set.insert(capability);
                }
                Err(err) => tracing::warn!(error = %err, "ignoring unknown capability token"),
            }
        }
        Self(set)
    }

    /// Returns whether `capability` is advertised.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Returns whether no capability is advertised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the advertised capabilities in token order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Returns the advertised tokens.
    #[must_use]
    pub fn tokens(&self) -> Vec<&'static str> {
        self.iter().map(Capability::as_str).collect()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
