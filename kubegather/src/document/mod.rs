//! In-memory kubeconfig document model.
//!
//! A [`Document`] holds three independent keyed collections (contexts,
//! clusters and authentication identities) plus the current-context pointer.
//! On disk the collections are kubeconfig's named lists; in memory they are
//! ordered maps so that serialization is deterministic.
//!
//! Fields this crate does not interpret are kept in passthrough maps and
//! written back unchanged.
//!
//! # Examples
//!
//! ```
//! use kubegather::Document;
//!
//! let yaml = r#"
//! apiVersion: v1
//! kind: Config
//! current-context: prod
//! clusters:
//! - name: c1
//!   cluster:
//!     server: https://10.0.0.5:6443
//! contexts:
//! - name: prod
//!   context:
//!     cluster: c1
//!     user: u1
//! users:
//! - name: u1
//!   user:
//!     token: abc
//! "#;
//!
//! let doc = Document::from_yaml(yaml.as_bytes()).unwrap();
//! assert_eq!(doc.current_context, "prod");
//! assert_eq!(doc.server_for_context("prod"), Some("https://10.0.0.5:6443"));
//! ```

pub mod persist;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::Result;

pub use persist::{read_document, write_document, WriteOptions};

/// Passthrough map for fields that are preserved but not interpreted.
pub type Extra = BTreeMap<String, Value>;

/// A named pairing of a cluster and an authentication identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Name of the cluster entry this context uses.
    #[serde(default)]
    pub cluster: String,

    /// Name of the identity entry this context uses.
    #[serde(default, rename = "user")]
    pub auth_identity: String,

    /// Namespace, extensions and any other context fields.
    #[serde(flatten)]
    pub extra: Extra,
}

/// A cluster endpoint: server address plus TLS trust material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    /// API server URL.
    #[serde(default)]
    pub server: String,

    /// Path to a CA bundle file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,

    /// Base64-encoded CA bundle, kept exactly as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,

    /// Skip TLS verification of the server certificate.
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure_skip_tls_verify: bool,

    /// Proxy settings, TLS server name and any other cluster fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl Cluster {
    /// Creates a cluster entry pointing at `server` with no trust material.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }
}

/// An opaque credential blob. Copied verbatim, never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthIdentity(pub Value);

impl Default for AuthIdentity {
    fn default() -> Self {
        Self(Value::Mapping(serde_yaml::Mapping::new()))
    }
}

/// An in-memory configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// `apiVersion` of the document.
    pub api_version: String,
    /// `kind` of the document.
    pub kind: String,
    /// Contexts by name.
    pub contexts: BTreeMap<String, Context>,
    /// Cluster endpoints by name.
    pub clusters: BTreeMap<String, Cluster>,
    /// Authentication identities by name.
    pub identities: BTreeMap<String, AuthIdentity>,
    /// Name of the current context; empty when unset.
    pub current_context: String,
    /// `preferences`, `extensions` and any other top-level fields.
    pub extra: Extra,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            contexts: BTreeMap::new(),
            clusters: BTreeMap::new(),
            identities: BTreeMap::new(),
            current_context: String::new(),
            extra: Extra::new(),
        }
    }
}

impl Document {
    /// Parses a document from raw YAML bytes.
    ///
    /// Empty input yields an empty document. Duplicate names in a list keep
    /// the last entry.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bytes are not a valid document.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let raw: RawDocument = serde_yaml::from_slice(bytes)?;
        Ok(raw.into())
    }

    /// Serializes the document to kubeconfig YAML.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a passthrough value cannot be
    /// serialized.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&RawDocument::from(self.clone()))?)
    }

    /// Server URL of the cluster used by `context`, if both exist.
    #[must_use]
    pub fn server_for_context(&self, context: &str) -> Option<&str> {
        let ctx = self.contexts.get(context)?;
        self.clusters.get(&ctx.cluster).map(|c| c.server.as_str())
    }

    /// Whether the document has no contexts, clusters or identities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty() && self.clusters.is_empty() && self.identities.is_empty()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize)]
struct NamedCluster {
    name: String,
    #[serde(default)]
    cluster: Cluster,
}

#[derive(Serialize, Deserialize)]
struct NamedContext {
    name: String,
    #[serde(default)]
    context: Context,
}

#[derive(Serialize, Deserialize)]
struct NamedIdentity {
    name: String,
    #[serde(default)]
    user: AuthIdentity,
}

/// On-disk layout. Collections may be written as `null` by other tools.
#[derive(Serialize, Deserialize)]
struct RawDocument {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    api_version: String,
    #[serde(default)]
    clusters: Option<Vec<NamedCluster>>,
    #[serde(default)]
    contexts: Option<Vec<NamedContext>>,
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(flatten)]
    extra: Extra,
    #[serde(default)]
    users: Option<Vec<NamedIdentity>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Self {
            api_version: raw.api_version,
            kind: raw.kind,
            contexts: raw
                .contexts
                .unwrap_or_default()
                .into_iter()
                .map(|c| (c.name, c.context))
                .collect(),
            clusters: raw
                .clusters
                .unwrap_or_default()
                .into_iter()
                .map(|c| (c.name, c.cluster))
                .collect(),
            identities: raw
                .users
                .unwrap_or_default()
                .into_iter()
                .map(|u| (u.name, u.user))
                .collect(),
            current_context: raw.current_context.unwrap_or_default(),
            extra: raw.extra,
        }
    }
}

impl From<Document> for RawDocument {
    fn from(doc: Document) -> Self {
        Self {
            api_version: doc.api_version,
            clusters: Some(
                doc.clusters
                    .into_iter()
                    .map(|(name, cluster)| NamedCluster { name, cluster })
                    .collect(),
            ),
            contexts: Some(
                doc.contexts
                    .into_iter()
                    .map(|(name, context)| NamedContext { name, context })
                    .collect(),
            ),
            current_context: Some(doc.current_context),
            kind: doc.kind,
            extra: doc.extra,
            users: Some(
                doc.identities
                    .into_iter()
                    .map(|(name, user)| NamedIdentity { name, user })
                    .collect(),
            ),
        }
    }
}
