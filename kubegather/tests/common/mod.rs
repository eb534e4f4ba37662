//! Common test utilities for integration tests.
//!
//! Fixture builders for kubeconfig documents and catalog files laid out in
//! a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use kubegather::{Catalog, SourceDefinition};
use tempfile::TempDir;

/// Builder for a single-context kubeconfig document.
#[allow(dead_code)]
pub struct KubeconfigFixture {
    context: String,
    cluster: String,
    user: String,
    server: String,
    ca_data: Option<String>,
    current: bool,
}

#[allow(dead_code)]
impl KubeconfigFixture {
    /// A `kubernetes-admin` style document pointing at `server`.
    pub fn new(server: &str) -> Self {
        Self {
            context: "kubernetes-admin@kubernetes".to_string(),
            cluster: "kubernetes".to_string(),
            user: "kubernetes-admin".to_string(),
            server: server.to_string(),
            ca_data: Some("LS0tLS1CRUdJTi0tLS0t".to_string()),
            current: true,
        }
    }

    /// Sets the context, cluster and user names.
    pub fn with_names(mut self, context: &str, cluster: &str, user: &str) -> Self {
        self.context = context.to_string();
        self.cluster = cluster.to_string();
        self.user = user.to_string();
        self
    }

    /// Leaves `current-context` empty.
    pub fn without_current(mut self) -> Self {
        self.current = false;
        self
    }

    /// Renders the document as YAML.
    pub fn yaml(&self) -> String {
        let current = if self.current { self.context.as_str() } else { "" };
        let ca = self
            .ca_data
            .as_ref()
            .map(|data| format!("    certificate-authority-data: {data}\n"))
            .unwrap_or_default();
        format!(
            "apiVersion: v1\nkind: Config\npreferences: {{}}\ncurrent-context: \"{current}\"\nclusters:\n- name: {cluster}\n  cluster:\n{ca}    server: {server}\ncontexts:\n- name: {context}\n  context:\n    cluster: {cluster}\n    user: {user}\n    namespace: default\nusers:\n- name: {user}\n  user:\n    client-certificate-data: Q0VSVA==\n    client-key-data: S0VZ\n",
            cluster = self.cluster,
            server = self.server,
            context = self.context,
            user = self.user,
        )
    }

    /// Writes the document to `path`.
    pub fn write_to(&self, path: &Path) -> PathBuf {
        fs::write(path, self.yaml()).unwrap();
        path.to_path_buf()
    }
}

/// A temporary workspace holding sources, a catalog and a destination.
#[allow(dead_code)]
pub struct Workspace {
    dir: TempDir,
}

#[allow(dead_code)]
impl Workspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Destination kubeconfig path.
    pub fn destination(&self) -> PathBuf {
        self.path().join("kube").join("config")
    }

    /// Writes a source document named `name` and returns its path.
    pub fn source(&self, name: &str, fixture: &KubeconfigFixture) -> PathBuf {
        fixture.write_to(&self.path().join(name))
    }

    /// A catalog bound to this workspace, writing to [`Self::destination`].
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::new(self.path().join(".kubegather.yaml"));
        catalog.destination = self.destination().display().to_string();
        catalog
    }

    /// A local source definition for `path`.
    pub fn local_source(path: &Path) -> SourceDefinition {
        SourceDefinition::new(path.display().to_string())
    }
}
