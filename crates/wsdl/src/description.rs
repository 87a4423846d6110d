//! Loading a complete service description

use crate::error::{DescriptionError, FetchError};
use crate::fetch::DescriptionFetcher;
use crate::wsdl::Definitions;
use crate::xml::parse_document;
use crate::xsd::SchemaSet;
use dws_core::{Credential, ServiceLocation};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};
use url::Url;

/// A parsed description with every schema it references
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    /// Address the description was fetched from
    pub url: Url,
    pub definitions: Definitions,
    pub schemas: SchemaSet,
}

/// Fetch and parse the description of a location, following external schema references
///
/// Schema locations are resolved against the document that names them and each distinct
/// address is fetched once, with the same credential as the description.
pub async fn load_description(
    fetcher: &dyn DescriptionFetcher,
    location: &ServiceLocation,
    credential: &Credential,
) -> Result<ServiceDescription, DescriptionError> {
    let url = location.description_url();
    info!(%location, "Loading service description");

    let bytes = fetcher.fetch(&url, credential).await?;
    let definitions = parse_document(&bytes)
        .and_then(|root| Definitions::parse(&root))
        .map_err(|source| DescriptionError::Parse {
            url: url.to_string(),
            source,
        })?;

    let mut schemas = SchemaSet::default();
    let mut pending = VecDeque::new();
    for schema in &definitions.schemas {
        let index = schemas
            .add(schema.clone(), None)
            .map_err(|source| DescriptionError::Parse {
                url: url.to_string(),
                source,
            })?;
        pending.extend(
            schemas
                .external_references(index)
                .into_iter()
                .map(|reference| (url.clone(), reference)),
        );
    }

    let mut seen = HashSet::from([url.to_string()]);
    while let Some((base, reference)) = pending.pop_front() {
        let target = base
            .join(&reference.location)
            .map_err(|e| FetchError::InvalidLocation {
                location: reference.location.clone(),
                reason: e.to_string(),
            })?;
        if !seen.insert(target.to_string()) {
            continue;
        }

        debug!(url = %target, "Fetching external schema");
        let bytes = fetcher.fetch(&target, credential).await?;
        let index = parse_document(&bytes)
            .and_then(|root| schemas.add(root, reference.include_namespace.as_deref()))
            .map_err(|source| DescriptionError::Parse {
                url: target.to_string(),
                source,
            })?;
        pending.extend(
            schemas
                .external_references(index)
                .into_iter()
                .map(|nested| (target.clone(), nested)),
        );
    }

    info!(
        %location,
        messages = definitions.messages.len(),
        schemas = schemas.len(),
        "Service description loaded"
    );
    Ok(ServiceDescription {
        url,
        definitions,
        schemas,
    })
}
