//! Retrieval-time address resolution for remote sources.
//!
//! Given a remote target parsed from a source origin, the resolver decides
//! which host, port, login and private key the ssh transport uses:
//!
//! - port: the origin's port, else the per-host `Port`, else 22
//! - user: the origin's user, else the per-host `User`
//! - host: the per-host `HostName`, else the host written in the origin
//! - key: the `--identity` override, else the per-host `IdentityFile`,
//!   else `~/.ssh/id_rsa`
//!
//! The selected key must be a readable PEM or OpenSSH private key; anything
//! else fails the source with [`Error::CredentialLoad`].

mod ssh_config;

pub use ssh_config::{default_config_path, SshClientConfig};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::expand_tilde;
use crate::source::{parse_port, RemoteTarget};

/// Port used when neither the origin nor the ssh config names one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Key used when neither the command line nor the ssh config names one.
pub const DEFAULT_KEY_PATH: &str = "~/.ssh/id_rsa";

/// Everything the ssh transport needs to reach a remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshEndpoint {
    /// Host written in the origin, used for host key lookups.
    pub alias: String,
    /// Host to connect to.
    pub host: String,
    /// Port to connect to.
    pub port: u16,
    /// Login name, if one was configured.
    pub user: Option<String>,
    /// Validated private key.
    pub key_path: PathBuf,
    /// Remote file to read.
    pub path: String,
}

/// Resolves remote targets against ssh client configuration.
///
/// # Examples
///
/// ```no_run
/// use kubegather::resolver::{AddressResolver, SshClientConfig};
/// use kubegather::source::Origin;
///
/// let resolver = AddressResolver::new(SshClientConfig::parse("Host lab\n  Port 2222\n"), None);
/// if let Origin::Remote(target) = Origin::parse("centos@lab/~/.kube/config").unwrap() {
///     let endpoint = resolver.resolve(&target).unwrap();
///     assert_eq!(endpoint.port, 2222);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    config: SshClientConfig,
    identity_override: Option<PathBuf>,
}

impl AddressResolver {
    /// Creates a resolver over `config`, optionally forcing a private key.
    #[must_use]
    pub fn new(config: SshClientConfig, identity_override: Option<PathBuf>) -> Self {
        Self {
            config,
            identity_override,
        }
    }

    /// Creates a resolver over the user's `~/.ssh/config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ssh config exists but cannot be read.
    pub fn from_default_config(identity_override: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(SshClientConfig::load_default()?, identity_override))
    }

    /// Resolves host, port, user and key for `target`, and validates the key.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the ssh config carries an invalid `Port`
    /// - [`Error::CredentialLoad`] if the key is unreadable or not a key
    /// - [`Error::InvalidPath`] if tilde expansion of the key path fails
    pub fn resolve(&self, target: &RemoteTarget) -> Result<SshEndpoint> {
        let alias = target.host.as_str();

        let port = match target.port {
            Some(port) => port,
            None => match self.config.get(alias, "port") {
                Some(value) => parse_port(value).map_err(|message| Error::Validation {
                    field: format!("ssh config Port for {alias}"),
                    message,
                })?,
                None => DEFAULT_SSH_PORT,
            },
        };

        let user = target
            .user
            .clone()
            .or_else(|| self.config.get(alias, "user").map(str::to_string));

        let host = self
            .config
            .get(alias, "hostname")
            .map_or_else(|| alias.to_string(), |h| h.replace("%h", alias));

        let key_path = match &self.identity_override {
            Some(path) => expand_tilde(path)?,
            None => {
                let configured = self
                    .config
                    .get(alias, "identityfile")
                    .unwrap_or(DEFAULT_KEY_PATH);
                expand_key_tokens(configured)?
            }
        };
        load_private_key(&key_path)?;

        log::debug!(
            "resolved {alias} to {}@{host}:{port} with key {}",
            user.as_deref().unwrap_or("-"),
            key_path.display()
        );

        Ok(SshEndpoint {
            alias: alias.to_string(),
            host,
            port,
            user,
            key_path,
            path: target.path.clone(),
        })
    }
}

/// Expands `~` and the `%d` (home directory) token in an `IdentityFile`.
fn expand_key_tokens(value: &str) -> Result<PathBuf> {
    if value.contains("%d") {
        let home = home::home_dir().ok_or_else(|| Error::InvalidPath {
            path: PathBuf::from(value),
            reason: "Cannot determine home directory".to_string(),
        })?;
        return Ok(PathBuf::from(value.replace("%d", &home.to_string_lossy())));
    }
    expand_tilde(Path::new(value))
}

/// Checks that `path` holds a PEM or OpenSSH private key.
///
/// # Errors
///
/// Returns [`Error::CredentialLoad`] if the file cannot be read or does not
/// carry private key armour.
pub fn load_private_key(path: &Path) -> Result<()> {
    let contents = fs::read_to_string(path).map_err(|e| Error::CredentialLoad {
        path: path.to_path_buf(),
        reason: format!("unable to read key: {e}"),
    })?;

    let armoured = contents
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("-----BEGIN "))
        .is_some_and(|line| line.ends_with("PRIVATE KEY-----"));
    if !armoured {
        return Err(Error::CredentialLoad {
            path: path.to_path_buf(),
            reason: "not a PEM or OpenSSH private key".to_string(),
        });
    }
    Ok(())
}
