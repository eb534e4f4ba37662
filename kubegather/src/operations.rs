//! Fetch, merge and persist: the `get` and `gather` workflows.
//!
//! Each source is processed as fetch → record connection host → parse →
//! read destination → merge → write destination. `gather` runs that
//! pipeline for every catalog source in label order and stops at the first
//! failure; sources merged before the failure stay written.

use std::path::Path;

use crate::catalog::Catalog;
use crate::document::{read_document, write_document, Document, WriteOptions};
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::merge::{merge, MergeOutcome};
use crate::source::SourceDefinition;

/// Label a source gets when none is given: the remote host of its origin.
///
/// # Errors
///
/// Returns a validation error for local origins, which have no natural
/// label, or the origin parse error.
///
/// # Examples
///
/// ```
/// use kubegather::operations::default_label;
/// use kubegather::SourceDefinition;
///
/// let source = SourceDefinition::new("centos@10.0.0.1:2222/~/.kube/config");
/// assert_eq!(default_label(&source).unwrap(), "10.0.0.1");
/// assert!(default_label(&SourceDefinition::new("/tmp/kubeconfig")).is_err());
/// ```
pub fn default_label(source: &SourceDefinition) -> Result<String> {
    source
        .parsed_origin()?
        .default_label()
        .map(str::to_string)
        .ok_or_else(|| Error::Validation {
            field: "label".to_string(),
            message: format!("a label is required for local source '{}'", source.origin),
        })
}

/// Fetches `source`, merges it under `label` and writes the destination.
///
/// # Errors
///
/// Returns the first failure of any stage. A document that cannot be
/// parsed is reported as [`Error::MalformedSourceDocument`]. The
/// destination is only written after a successful merge.
pub fn get_source<F: Fetcher + ?Sized>(
    fetcher: &F,
    destination: &Path,
    label: &str,
    source: &SourceDefinition,
    options: WriteOptions,
) -> Result<MergeOutcome> {
    source.validate()?;
    let origin = source.parsed_origin()?;

    log::info!("fetching {label} from {origin}");
    let fetched = fetcher.fetch(&origin)?;
    log::debug!(
        "{label} fetched via {}{}",
        fetched.resolved_host,
        fetched
            .resolved_port
            .map(|port| format!(":{port}"))
            .unwrap_or_default()
    );

    let definition = source.clone().with_resolved_host(fetched.resolved_host);
    let document =
        Document::from_yaml(&fetched.bytes).map_err(|e| Error::MalformedSourceDocument {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

    let mut target = read_document(destination)?;
    let outcome = merge(&mut target, &document, &definition, label)?;
    write_document(&target, destination, options)?;

    log::info!(
        "wrote {} to {}",
        outcome.context,
        destination.display()
    );
    Ok(outcome)
}

/// Merges every catalog source into the catalog's destination.
///
/// Sources are processed in sorted label order. An empty catalog leaves the
/// destination untouched.
///
/// # Errors
///
/// Returns an invalid destination error, or the first source failure
/// wrapped in [`Error::Source`] with its label.
pub fn gather<F: Fetcher + ?Sized>(
    fetcher: &F,
    catalog: &Catalog,
    options: WriteOptions,
) -> Result<Vec<MergeOutcome>> {
    if catalog.sources.is_empty() {
        log::warn!("catalog {} has no sources", catalog.path().display());
        return Ok(Vec::new());
    }

    let destination = catalog.destination_path()?;
    let mut outcomes = Vec::with_capacity(catalog.sources.len());
    for (label, source) in &catalog.sources {
        let outcome =
            get_source(fetcher, &destination, label, source, options).map_err(|e| {
                Error::Source {
                    label: label.clone(),
                    source: Box::new(e),
                }
            })?;
        outcomes.push(outcome);
    }

    log::info!(
        "gathered {} sources into {}",
        outcomes.len(),
        destination.display()
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Fetched, MockFetcher};
    use crate::source::{Origin, LOOPBACK_HOST};
    use tempfile::TempDir;

    fn kubeconfig(server: &str) -> Vec<u8> {
        format!(
            "apiVersion: v1\nkind: Config\ncurrent-context: prod\nclusters:\n- name: c1\n  cluster:\n    server: {server}\n    certificate-authority-data: Q0E=\ncontexts:\n- name: prod\n  context:\n    cluster: c1\n    user: u1\nusers:\n- name: u1\n  user:\n    token: abc\n"
        )
        .into_bytes()
    }

    fn fetched(bytes: Vec<u8>, host: &str) -> Fetched {
        Fetched {
            bytes,
            resolved_host: host.to_string(),
            resolved_port: Some(22),
        }
    }

    #[test]
    fn test_get_source_writes_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("config");

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(fetched(kubeconfig("https://10.0.0.5:6443"), "10.0.0.5")));

        let source = SourceDefinition::new("10.0.0.5").with_insecure(true);
        let outcome =
            get_source(&fetcher, &dest, "site-a", &source, WriteOptions::default()).unwrap();
        assert_eq!(outcome.context, "prod@site-a");

        let written = read_document(&dest).unwrap();
        assert_eq!(written.current_context, "prod@site-a");
        let cluster = &written.clusters["c1@site-a"];
        assert!(cluster.insecure_skip_tls_verify);
        assert!(cluster.certificate_authority_data.is_none());
        assert!(written.identities.contains_key("u1@site-a"));
    }

    #[test]
    fn test_get_source_autodetects_resolved_host() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("config");

        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|_| {
            Ok(fetched(
                kubeconfig("https://127.0.0.1:6443"),
                "198.51.100.9",
            ))
        });

        let source = SourceDefinition::new("lab").with_autodetect(true);
        get_source(&fetcher, &dest, "lab", &source, WriteOptions::default()).unwrap();

        let written = read_document(&dest).unwrap();
        assert_eq!(
            written.clusters["c1@lab"].server,
            "https://198.51.100.9:6443"
        );
    }

    #[test]
    fn test_get_source_unparseable_document() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("config");

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(fetched(b"clusters: [oops".to_vec(), LOOPBACK_HOST)));

        let err = get_source(
            &fetcher,
            &dest,
            "x",
            &SourceDefinition::new("h"),
            WriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedSourceDocument { ref label, .. } if label == "x"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_get_source_rejects_invalid_definition_before_fetch() {
        let dir = TempDir::new().unwrap();
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(0);

        let source = SourceDefinition::new("h")
            .with_explicit_address("1.2.3.4")
            .with_autodetect(true);
        let err = get_source(
            &fetcher,
            &dir.path().join("config"),
            "x",
            &source,
            WriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_gather_in_label_order() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new(dir.path().join("catalog.yaml"));
        catalog.destination = dir.path().join("config").display().to_string();
        catalog
            .sources
            .insert("zeta".to_string(), SourceDefinition::new("zeta.example"));
        catalog
            .sources
            .insert("alpha".to_string(), SourceDefinition::new("alpha.example"));

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(fetched(kubeconfig("https://10.0.0.5:6443"), "10.0.0.5")));

        let outcomes = gather(&fetcher, &catalog, WriteOptions::default()).unwrap();
        let labels: Vec<_> = outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "zeta"]);
        assert!(outcomes[0].became_current);
        assert!(!outcomes[1].became_current);

        let written = read_document(&catalog.destination_path().unwrap()).unwrap();
        assert_eq!(written.contexts.len(), 2);
        assert_eq!(written.current_context, "prod@alpha");
    }

    #[test]
    fn test_gather_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new(dir.path().join("catalog.yaml"));
        catalog.destination = dir.path().join("config").display().to_string();
        for label in ["a", "b", "c"] {
            catalog
                .sources
                .insert(label.to_string(), SourceDefinition::new(format!("{label}.example")));
        }

        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(2).returning(|origin| match origin {
            Origin::Remote(target) if target.host == "b.example" => Err(Error::Fetch {
                origin: origin.to_string(),
                reason: "connection refused".to_string(),
            }),
            _ => Ok(fetched(kubeconfig("https://10.0.0.5:6443"), "10.0.0.5")),
        });

        let err = gather(&fetcher, &catalog, WriteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Source { ref label, .. } if label == "b"));
        assert!(matches!(err.root(), Error::Fetch { .. }));

        let written = read_document(&catalog.destination_path().unwrap()).unwrap();
        assert!(written.contexts.contains_key("prod@a"));
        assert!(!written.contexts.contains_key("prod@c"));
    }

    #[test]
    fn test_gather_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new(dir.path().join("catalog.yaml"));
        catalog.destination = dir.path().join("config").display().to_string();
        let fetcher = MockFetcher::new();

        let outcomes = gather(&fetcher, &catalog, WriteOptions::default()).unwrap();
        assert!(outcomes.is_empty());
        assert!(!dir.path().join("config").exists());
    }

    #[test]
    fn test_default_label() {
        assert_eq!(
            default_label(&SourceDefinition::new("ssh://centos@k8s.lab:2222/x")).unwrap(),
            "k8s.lab"
        );
        assert!(matches!(
            default_label(&SourceDefinition::new("file:///tmp/kc")).unwrap_err(),
            Error::Validation { .. }
        ));
    }
}
