//! Context translation and merge engine.
//!
//! Merging takes the current context of a source document together with the
//! cluster and identity it references, renames all three by appending
//! `@<label>`, applies the source's endpoint transforms to the cluster and
//! inserts the triple into the destination document.
//!
//! Entries already holding a translated name are overwritten: merging the
//! same label twice replaces rather than duplicates. Entries belonging to
//! other labels are never touched.
//!
//! # Examples
//!
//! ```
//! use kubegather::document::{AuthIdentity, Cluster, Context, Document};
//! use kubegather::{merge, SourceDefinition};
//!
//! let mut source = Document::default();
//! source.current_context = "prod".to_string();
//! source.contexts.insert(
//!     "prod".to_string(),
//!     Context { cluster: "c1".into(), auth_identity: "u1".into(), ..Context::default() },
//! );
//! source.clusters.insert("c1".to_string(), Cluster::new("https://10.0.0.5:6443"));
//! source.identities.insert("u1".to_string(), AuthIdentity::default());
//!
//! let mut destination = Document::default();
//! let definition = SourceDefinition::new("10.0.0.5").with_insecure(true);
//! let outcome = merge(&mut destination, &source, &definition, "site-a").unwrap();
//!
//! assert_eq!(outcome.context, "prod@site-a");
//! assert_eq!(destination.current_context, "prod@site-a");
//! assert_eq!(destination.contexts["prod@site-a"].cluster, "c1@site-a");
//! assert!(destination.clusters["c1@site-a"].insecure_skip_tls_verify);
//! ```

mod endpoint;
#[cfg(test)]
mod proptests;

pub use endpoint::{apply_endpoint_transforms, autodetect_server, explicit_server};

use crate::document::{AuthIdentity, Cluster, Context, Document};
use crate::error::{Error, Result};
use crate::source::SourceDefinition;

/// Separator between an original name and its label.
pub const LABEL_SEPARATOR: char = '@';

/// Names written into the destination by one merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Label the source was merged under.
    pub label: String,
    /// Translated context name.
    pub context: String,
    /// Translated cluster name.
    pub cluster: String,
    /// Translated identity name.
    pub identity: String,
    /// Whether the merge set the destination's current context.
    pub became_current: bool,
}

/// Translated name of `name` for `label`.
///
/// # Examples
///
/// ```
/// use kubegather::merge::translated_name;
///
/// assert_eq!(translated_name("kubernetes-admin", "site-a"), "kubernetes-admin@site-a");
/// ```
#[must_use]
pub fn translated_name(name: &str, label: &str) -> String {
    format!("{name}{LABEL_SEPARATOR}{label}")
}

/// The current context of a source together with what it references.
struct SourceTriple<'a> {
    context_name: &'a str,
    context: &'a Context,
    cluster: &'a Cluster,
    identity: &'a AuthIdentity,
}

fn resolve_current<'a>(source: &'a Document, label: &str) -> Result<SourceTriple<'a>> {
    let malformed = |reason: String| Error::MalformedSourceDocument {
        label: label.to_string(),
        reason,
    };

    let context_name = source.current_context.as_str();
    if context_name.is_empty() {
        return Err(malformed("current context is empty".to_string()));
    }
    let context = source
        .contexts
        .get(context_name)
        .ok_or_else(|| malformed(format!("current context '{context_name}' is not defined")))?;
    if context.cluster.is_empty() {
        return Err(malformed(format!(
            "context '{context_name}' has no cluster"
        )));
    }
    if context.auth_identity.is_empty() {
        return Err(malformed(format!("context '{context_name}' has no user")));
    }
    let cluster = source.clusters.get(&context.cluster).ok_or_else(|| {
        malformed(format!(
            "cluster '{}' referenced by '{context_name}' is not defined",
            context.cluster
        ))
    })?;
    let identity = source.identities.get(&context.auth_identity).ok_or_else(|| {
        malformed(format!(
            "user '{}' referenced by '{context_name}' is not defined",
            context.auth_identity
        ))
    })?;

    Ok(SourceTriple {
        context_name,
        context,
        cluster,
        identity,
    })
}

/// Merges the current context of `source` into `destination` under `label`.
///
/// The destination is only modified once every precondition has been
/// checked and the endpoint transforms have succeeded, so a failed merge
/// leaves it untouched. Nothing is written to storage.
///
/// # Errors
///
/// - [`Error::Validation`] if `label` is empty
/// - [`Error::MalformedSourceDocument`] if the source has no current
///   context, or the context references a missing cluster or identity
/// - [`Error::AddressResolution`] if autodetection fails
pub fn merge(
    destination: &mut Document,
    source: &Document,
    definition: &SourceDefinition,
    label: &str,
) -> Result<MergeOutcome> {
    if label.is_empty() {
        return Err(Error::Validation {
            field: "label".to_string(),
            message: "label must not be empty".to_string(),
        });
    }

    let triple = resolve_current(source, label)?;

    let context_name = translated_name(triple.context_name, label);
    let cluster_name = translated_name(&triple.context.cluster, label);
    let identity_name = translated_name(&triple.context.auth_identity, label);

    let mut cluster = triple.cluster.clone();
    apply_endpoint_transforms(&mut cluster, definition)?;

    let mut context = triple.context.clone();
    context.cluster.clone_from(&cluster_name);
    context.auth_identity.clone_from(&identity_name);

    if destination.clusters.insert(cluster_name.clone(), cluster).is_some() {
        log::debug!("replaced existing cluster {cluster_name}");
    }
    if destination
        .identities
        .insert(identity_name.clone(), triple.identity.clone())
        .is_some()
    {
        log::debug!("replaced existing user {identity_name}");
    }
    if destination
        .contexts
        .insert(context_name.clone(), context)
        .is_some()
    {
        log::debug!("replaced existing context {context_name}");
    }

    let became_current = destination.current_context.is_empty();
    if became_current {
        destination.current_context.clone_from(&context_name);
    }

    log::info!("merged context {context_name} for label {label}");
    Ok(MergeOutcome {
        label: label.to_string(),
        context: context_name,
        cluster: cluster_name,
        identity: identity_name,
        became_current,
    })
}
