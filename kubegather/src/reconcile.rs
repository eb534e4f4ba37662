//! Relating the catalog to what is actually in the destination.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::merge::LABEL_SEPARATOR;

/// One row of the reconciliation listing.
///
/// Catalog labels with no context in the destination have no context or
/// server. Contexts no label accounts for have no label or origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Catalog label.
    pub label: Option<String>,
    /// Origin registered for the label.
    pub origin: Option<String>,
    /// Destination context matched to the label.
    pub context: Option<String>,
    /// Server of the context's cluster.
    pub server: Option<String>,
}

impl ListEntry {
    /// Whether the row is a context no catalog label accounts for.
    #[must_use]
    pub fn is_unmanaged(&self) -> bool {
        self.label.is_none()
    }
}

/// Lists catalog labels against the contexts in `destination`.
///
/// Each label, in sorted order, claims the first context (by name) ending
/// in `@<label>`; a claimed context is not offered to later labels. The
/// unclaimed contexts follow as unmanaged rows.
///
/// # Examples
///
/// ```
/// use kubegather::{Catalog, Document, SourceDefinition};
/// use kubegather::reconcile::list;
///
/// let mut catalog = Catalog::default();
/// catalog.sources.insert("site-a".into(), SourceDefinition::new("10.0.0.1"));
///
/// let entries = list(&catalog, &Document::default());
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].context, None);
/// ```
#[must_use]
pub fn list(catalog: &Catalog, destination: &Document) -> Vec<ListEntry> {
    let mut remaining: BTreeSet<&str> = destination.contexts.keys().map(String::as_str).collect();
    let mut entries = Vec::with_capacity(catalog.sources.len() + remaining.len());

    for (label, source) in &catalog.sources {
        let suffix = format!("{LABEL_SEPARATOR}{label}");
        let claimed = remaining
            .iter()
            .copied()
            .find(|name| name.ends_with(&suffix));

        let mut entry = ListEntry {
            label: Some(label.clone()),
            origin: Some(source.origin.clone()),
            ..ListEntry::default()
        };
        if let Some(name) = claimed {
            remaining.remove(name);
            entry.context = Some(name.to_string());
            entry.server = destination.server_for_context(name).map(str::to_string);
        }
        entries.push(entry);
    }

    entries.extend(remaining.into_iter().map(|name| ListEntry {
        context: Some(name.to_string()),
        server: destination.server_for_context(name).map(str::to_string),
        ..ListEntry::default()
    }));
    entries
}

/// What [`delete_context`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Removed context.
    pub context: String,
    /// Removed cluster, if it was present.
    pub cluster: Option<String>,
    /// Removed identity, if it was present.
    pub identity: Option<String>,
    /// Whether the current context pointed at the removed context.
    pub cleared_current: bool,
}

/// Removes the context named exactly `name` together with the cluster and
/// identity it references. Nothing is written to storage.
///
/// # Errors
///
/// Returns [`Error::ContextNotFound`] if no context has that exact name.
pub fn delete_context(destination: &mut Document, name: &str) -> Result<DeleteOutcome> {
    let context = destination
        .contexts
        .remove(name)
        .ok_or_else(|| Error::ContextNotFound {
            name: name.to_string(),
        })?;

    let cluster = destination
        .clusters
        .remove(&context.cluster)
        .map(|_| context.cluster.clone());
    if cluster.is_none() {
        log::warn!(
            "cluster {} referenced by {name} was already absent",
            context.cluster
        );
    }

    let identity = destination
        .identities
        .remove(&context.auth_identity)
        .map(|_| context.auth_identity.clone());
    if identity.is_none() {
        log::warn!(
            "user {} referenced by {name} was already absent",
            context.auth_identity
        );
    }

    let cleared_current = destination.current_context == name;
    if cleared_current {
        destination.current_context.clear();
    }

    log::info!("deleted context {name}");
    Ok(DeleteOutcome {
        context: name.to_string(),
        cluster,
        identity,
        cleared_current,
    })
}
