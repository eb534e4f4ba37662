//! Source definitions and origin parsing.
//!
//! A [`SourceDefinition`] names where a kubeconfig comes from and how its
//! cluster entry should be transformed when merged. The origin string is
//! interpreted by [`Origin::parse`]:
//!
//! | origin                                      | meaning                        |
//! |---------------------------------------------|--------------------------------|
//! | `/abs/config`, `~/config`, `./config`       | local file                     |
//! | `file://~/projects/kube.config`             | local file                     |
//! | `ssh://centos@10.0.0.1:2222/./.kube/config` | remote, path relative to home  |
//! | `10.0.0.1:2222/~/.kube/config`              | remote, path relative to home  |
//! | `example.com`                               | remote, default path           |
//! | `ssh://host/etc/kube/admin.conf`            | remote, absolute path          |

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::path::{expand_tilde, FILE_SCHEME};

/// Host recorded as the connection host for sources read from local storage.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Remote path used when an ssh origin carries none.
pub const DEFAULT_REMOTE_PATH: &str = ".kube/config";

const SSH_SCHEME: &str = "ssh://";

/// Where a configuration document comes from and how to transform it.
///
/// # Examples
///
/// ```
/// use kubegather::SourceDefinition;
///
/// let source = SourceDefinition::new("ssh://centos@10.0.0.1/~/.kube/config")
///     .with_insecure(true)
///     .with_autodetect(true);
/// assert!(source.validate().is_ok());
///
/// let conflicting = SourceDefinition::new("10.0.0.1")
///     .with_explicit_address("10.0.0.1:10443")
///     .with_autodetect(true);
/// assert!(conflicting.validate().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Origin of the document (path, `file://` or ssh location).
    #[serde(rename = "source")]
    pub origin: String,

    /// Drop CA material and skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Replacement API address for the cluster server.
    #[serde(
        rename = "apiaddress",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub explicit_address: Option<String>,

    /// Replace the server host with the host the document was fetched from.
    #[serde(rename = "autodetect", default, skip_serializing_if = "is_false")]
    pub autodetect_address: bool,

    /// Port to use when autodetecting instead of the server's own port.
    #[serde(
        rename = "override-port",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_port: Option<String>,

    /// Connection host observed while fetching. Set at runtime only.
    #[serde(skip)]
    pub resolved_host: Option<String>,
}

// Catalogs written by other tools carry `apiaddress: ""` for "no override".
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl SourceDefinition {
    /// Creates a source with no transforms.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Sets the insecure downgrade flag.
    #[must_use]
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Sets an explicit API address.
    #[must_use]
    pub fn with_explicit_address(mut self, address: impl Into<String>) -> Self {
        self.explicit_address = Some(address.into());
        self
    }

    /// Sets the autodetect flag.
    #[must_use]
    pub fn with_autodetect(mut self, autodetect: bool) -> Self {
        self.autodetect_address = autodetect;
        self
    }

    /// Sets the port used by autodetection.
    #[must_use]
    pub fn with_override_port(mut self, port: impl Into<String>) -> Self {
        self.override_port = Some(port.into());
        self
    }

    /// Records the connection host observed during retrieval.
    #[must_use]
    pub fn with_resolved_host(mut self, host: impl Into<String>) -> Self {
        self.resolved_host = Some(host.into());
        self
    }

    /// Checks the definition for contradictory or malformed settings.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the origin is empty, an explicit
    /// address is combined with autodetection, or the override port is not
    /// a valid port number.
    pub fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(Error::Validation {
                field: "source".to_string(),
                message: "origin must not be empty".to_string(),
            });
        }
        if self.autodetect_address && self.api_address().is_some() {
            return Err(Error::Validation {
                field: "apiaddress".to_string(),
                message: "an explicit api address cannot be combined with autodetection"
                    .to_string(),
            });
        }
        if let Some(port) = &self.override_port {
            parse_port(port).map_err(|message| Error::Validation {
                field: "override-port".to_string(),
                message,
            })?;
        }
        Ok(())
    }

    /// The explicit API address, if one is set and not blank.
    #[must_use]
    pub fn api_address(&self) -> Option<&str> {
        self.explicit_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// Parses the origin string.
    ///
    /// # Errors
    ///
    /// See [`Origin::parse`].
    pub fn parsed_origin(&self) -> Result<Origin> {
        Origin::parse(&self.origin)
    }
}

/// Parses a decimal TCP port in 1..=65535.
pub(crate) fn parse_port(value: &str) -> std::result::Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("'{value}' is not a valid port")),
        Ok(port) => Ok(port),
    }
}

/// A remote location reached over ssh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Login name embedded in the origin.
    pub user: Option<String>,
    /// Host as written in the origin (may be an ssh config alias).
    pub host: String,
    /// Port embedded in the origin.
    pub port: Option<u16>,
    /// Remote file path. Relative paths are relative to the login home.
    pub path: String,
}

/// A parsed origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A file on local storage.
    Local(PathBuf),
    /// A file on a remote host.
    Remote(RemoteTarget),
}

impl Origin {
    /// Interprets an origin string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrigin`] for empty origins, unsupported
    /// schemes, missing hosts or invalid ports, and an invalid path error if
    /// tilde expansion of a local path fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use kubegather::source::Origin;
    ///
    /// match Origin::parse("ssh://centos@10.0.0.1:2222/./.kube.config").unwrap() {
    ///     Origin::Remote(target) => {
    ///         assert_eq!(target.user.as_deref(), Some("centos"));
    ///         assert_eq!(target.host, "10.0.0.1");
    ///         assert_eq!(target.port, Some(2222));
    ///         assert_eq!(target.path, ".kube.config");
    ///     }
    ///     Origin::Local(_) => unreachable!(),
    /// }
    /// ```
    pub fn parse(origin: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidOrigin {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = origin.trim();
        if trimmed.is_empty() {
            return Err(invalid("origin is empty"));
        }

        if let Some(path) = trimmed.strip_prefix(FILE_SCHEME) {
            if path.is_empty() {
                return Err(invalid("file:// origin has no path"));
            }
            return Ok(Self::Local(expand_tilde(std::path::Path::new(path))?));
        }

        if trimmed.starts_with('/') || trimmed.starts_with('~') || trimmed.starts_with('.') {
            return Ok(Self::Local(expand_tilde(std::path::Path::new(trimmed))?));
        }

        let rest = match trimmed.strip_prefix(SSH_SCHEME) {
            Some(rest) => rest,
            None if trimmed.contains("://") => {
                return Err(invalid("only file:// and ssh:// schemes are supported"))
            }
            None => trimmed,
        };

        let (authority, raw_path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        let (user, host_port) = match authority.rsplit_once('@') {
            Some((user, host_port)) if !user.is_empty() => (Some(user.to_string()), host_port),
            Some((_, host_port)) => (None, host_port),
            None => (None, authority),
        };

        let (host, port) = split_host_port(host_port).map_err(|reason| invalid(&reason))?;
        if host.is_empty() {
            return Err(invalid("origin has no host"));
        }

        Ok(Self::Remote(RemoteTarget {
            user,
            host,
            port,
            path: remote_path(raw_path),
        }))
    }

    /// The host a label defaults to: the remote host, if any.
    #[must_use]
    pub fn default_label(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Remote(target) => Some(target.host.as_str()),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(target) => {
                write!(f, "ssh://")?;
                if let Some(user) = &target.user {
                    write!(f, "{user}@")?;
                }
                if target.host.contains(':') {
                    write!(f, "[{}]", target.host)?;
                } else {
                    write!(f, "{}", target.host)?;
                }
                if let Some(port) = target.port {
                    write!(f, ":{port}")?;
                }
                write!(f, "/{}", target.path.trim_start_matches('/'))
            }
        }
    }
}

/// Splits `host[:port]`, accepting bracketed IPv6 literals.
fn split_host_port(value: &str) -> std::result::Result<(String, Option<u16>), String> {
    if let Some(rest) = value.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| "unterminated IPv6 literal".to_string())?;
        return match after.strip_prefix(':') {
            Some(port) => Ok((host.to_string(), Some(parse_port(port)?))),
            None if after.is_empty() => Ok((host.to_string(), None)),
            None => Err(format!("unexpected characters after host: '{after}'")),
        };
    }
    match value.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => Err(format!(
            "IPv6 host in '{value}' must be written in brackets, as [addr]:port"
        )),
        Some((host, port)) => Ok((host.to_string(), Some(parse_port(port)?))),
        None => Ok((value.to_string(), None)),
    }
}

/// `/./p` and `/~/p` are relative to the remote home; other paths are kept.
fn remote_path(raw: &str) -> String {
    if let Some(rel) = raw
        .strip_prefix("/./")
        .or_else(|| raw.strip_prefix("/~/"))
    {
        if !rel.is_empty() {
            return rel.to_string();
        }
    }
    if raw.is_empty() || raw == "/" || raw == "/./" || raw == "/~/" {
        return DEFAULT_REMOTE_PATH.to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(origin: &str) -> RemoteTarget {
        match Origin::parse(origin).unwrap() {
            Origin::Remote(target) => target,
            Origin::Local(path) => panic!("expected remote, got {}", path.display()),
        }
    }

    #[test]
    fn test_scheme_less_remote_with_port_and_home_path() {
        let t = remote("10.0.0.1:2222/~/.kube.config");
        assert_eq!(t.host, "10.0.0.1");
        assert_eq!(t.port, Some(2222));
        assert_eq!(t.user, None);
        assert_eq!(t.path, ".kube.config");
    }

    #[test]
    fn test_bare_host_uses_default_path() {
        let t = remote("example.com");
        assert_eq!(t.host, "example.com");
        assert_eq!(t.port, None);
        assert_eq!(t.path, DEFAULT_REMOTE_PATH);
    }

    #[test]
    fn test_ssh_user_without_path() {
        let t = remote("ssh://centos@10.0.0.1");
        assert_eq!(t.user.as_deref(), Some("centos"));
        assert_eq!(t.path, DEFAULT_REMOTE_PATH);
    }

    #[test]
    fn test_absolute_remote_path() {
        let t = remote("ssh://host/etc/kubernetes/admin.conf");
        assert_eq!(t.path, "/etc/kubernetes/admin.conf");
    }

    #[test]
    fn test_ipv6_remote() {
        let t = remote("ssh://[fd00::1]:2200/./config");
        assert_eq!(t.host, "fd00::1");
        assert_eq!(t.port, Some(2200));
        assert_eq!(t.path, "config");
    }

    #[test]
    fn test_local_forms() {
        assert_eq!(
            Origin::parse("/etc/kube.yaml").unwrap(),
            Origin::Local(PathBuf::from("/etc/kube.yaml"))
        );
        assert_eq!(
            Origin::parse("file:///etc/kube.yaml").unwrap(),
            Origin::Local(PathBuf::from("/etc/kube.yaml"))
        );
        assert!(matches!(
            Origin::parse("./kube.yaml").unwrap(),
            Origin::Local(_)
        ));
        let home = home::home_dir().unwrap();
        assert_eq!(
            Origin::parse("file://~/projects/kube.config").unwrap(),
            Origin::Local(home.join("projects/kube.config"))
        );
    }

    #[test]
    fn test_invalid_origins() {
        assert!(Origin::parse("").is_err());
        assert!(Origin::parse("https://example.com/config").is_err());
        assert!(Origin::parse("host:notaport").is_err());
        assert!(Origin::parse("host:0").is_err());
        assert!(Origin::parse("ssh://user@/path").is_err());
    }

    #[test]
    fn test_default_label() {
        assert_eq!(
            Origin::parse("ssh://u@cluster-a:22").unwrap().default_label(),
            Some("cluster-a")
        );
        assert_eq!(Origin::parse("/tmp/x").unwrap().default_label(), None);
    }

    #[test]
    fn test_display_remote() {
        let origin = Origin::parse("centos@10.0.0.1:2222/./kube").unwrap();
        assert_eq!(origin.to_string(), "ssh://centos@10.0.0.1:2222/kube");
    }

    #[test]
    fn test_validate_override_port() {
        assert!(SourceDefinition::new("h")
            .with_autodetect(true)
            .with_override_port("6443")
            .validate()
            .is_ok());
        assert!(SourceDefinition::new("h")
            .with_override_port("http")
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_empty_origin() {
        assert!(SourceDefinition::new("  ").validate().is_err());
    }

    #[test]
    fn test_catalog_yaml_shape() {
        let source = SourceDefinition::new("10.0.0.1")
            .with_insecure(true)
            .with_explicit_address("10.0.0.1:10443")
            .with_resolved_host("10.0.0.1");
        let yaml = serde_yaml::to_string(&source).unwrap();
        assert!(yaml.contains("source: 10.0.0.1"));
        assert!(yaml.contains("apiaddress: 10.0.0.1:10443"));
        assert!(!yaml.contains("autodetect"));
        assert!(!yaml.contains("resolved"));

        let parsed: SourceDefinition = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.resolved_host, None);
        assert_eq!(parsed.explicit_address.as_deref(), Some("10.0.0.1:10443"));
    }

    #[test]
    fn test_unbracketed_ipv6_rejected() {
        let err = Origin::parse("fd00::1/x").unwrap_err();
        assert!(matches!(err, Error::InvalidOrigin { .. }));
        assert!(Origin::parse("ssh://u@fd00::1:22/x").is_err());

        match Origin::parse("[fd00::1]:22/x").unwrap() {
            Origin::Remote(target) => {
                assert_eq!(target.host, "fd00::1");
                assert_eq!(target.port, Some(22));
            }
            Origin::Local(_) => panic!("expected a remote origin"),
        }
    }

    #[test]
    fn test_blank_api_address_is_no_override() {
        let parsed: SourceDefinition =
            serde_yaml::from_str("source: 10.0.0.1\napiaddress: \"\"\nautodetect: true\n").unwrap();
        assert_eq!(parsed.explicit_address, None);
        assert!(parsed.validate().is_ok());

        let built = SourceDefinition::new("10.0.0.1")
            .with_explicit_address("  ")
            .with_autodetect(true);
        assert_eq!(built.api_address(), None);
        assert!(built.validate().is_ok());
    }

    #[test]
    fn test_minimal_catalog_entry() {
        let parsed: SourceDefinition = serde_yaml::from_str("source: example.com\n").unwrap();
        assert_eq!(parsed, SourceDefinition::new("example.com"));
    }
}
