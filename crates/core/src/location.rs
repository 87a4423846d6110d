//! Service locations
//!
//! A [`ServiceLocation`] is the address a service description is fetched from. It is the
//! key of the proxy cache, so two locations are equal exactly when their normalized
//! address strings are equal.
//!
//! # Examples
//!
//! ```
//! use dws_core::ServiceLocation;
//!
//! let location: ServiceLocation = " HTTP://Example.com/users.asmx#top ".parse().unwrap();
//! assert_eq!(location.as_str(), "http://example.com/users.asmx");
//! assert_eq!(location.description_url().as_str(), "http://example.com/users.asmx?wsdl");
//! ```

use crate::error::LocationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Normalized address of a remote service description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceLocation {
    url: Url,
}

impl ServiceLocation {
    /// Query marker that asks a SOAP endpoint for its description
    pub const DESCRIPTION_MARKER: &'static str = "wsdl";

    /// Parse and normalize a service location
    pub fn parse(s: &str) -> Result<Self, LocationError> {
        s.parse()
    }

    /// The normalized address
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check whether the address already carries the description marker
    pub fn has_description_marker(&self) -> bool {
        self.url
            .query()
            .map(|query| query.split('&').any(is_marker_segment))
            .unwrap_or(false)
    }

    /// Address the interface description is fetched from
    ///
    /// Appends `?wsdl` (or `&wsdl` after an existing query) unless the marker is present.
    pub fn description_url(&self) -> Url {
        if self.has_description_marker() {
            return self.url.clone();
        }

        let mut url = self.url.clone();
        let query = match self.url.query() {
            Some(existing) if !existing.is_empty() => {
                format!("{}&{}", existing, Self::DESCRIPTION_MARKER)
            }
            _ => Self::DESCRIPTION_MARKER.to_string(),
        };
        url.set_query(Some(&query));
        url
    }

    /// Default endpoint address: the location without the description marker
    pub fn endpoint_url(&self) -> Url {
        let mut url = self.url.clone();
        let remaining: Vec<&str> = self
            .url
            .query()
            .map(|query| {
                query
                    .split('&')
                    .filter(|segment| !segment.is_empty() && !is_marker_segment(segment))
                    .collect()
            })
            .unwrap_or_default();

        if remaining.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&remaining.join("&")));
        }
        url
    }

    /// Convert into the inner string
    pub fn into_string(self) -> String {
        self.url.into()
    }
}

fn is_marker_segment(segment: &str) -> bool {
    let key = segment.split('=').next().unwrap_or(segment);
    key.eq_ignore_ascii_case(ServiceLocation::DESCRIPTION_MARKER)
}

impl FromStr for ServiceLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LocationError::Empty);
        }

        let mut url = Url::parse(trimmed).map_err(|e| LocationError::Invalid {
            location: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LocationError::UnsupportedScheme(trimmed.to_string()));
        }

        url.set_fragment(None);
        Ok(Self { url })
    }
}

impl fmt::Display for ServiceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl AsRef<str> for ServiceLocation {
    fn as_ref(&self) -> &str {
        self.url.as_str()
    }
}

impl From<ServiceLocation> for Url {
    fn from(location: ServiceLocation) -> Self {
        location.url
    }
}

// Serde support
impl Serialize for ServiceLocation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.url.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceLocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
