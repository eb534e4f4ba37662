//! Retrieval of raw configuration bytes.
//!
//! The [`Fetcher`] trait abstracts the transport so orchestration can be
//! tested without a network:
//!
//! - [`LocalFetcher`]: reads a local file; the connection host is loopback
//! - [`SshFetcher`]: reads a remote file through the system `ssh` client
//! - [`OriginFetcher`]: dispatches on the origin kind

use std::fs;
use std::net::ToSocketAddrs;
use std::process::Command;

use crate::error::{Error, Result};
use crate::resolver::{AddressResolver, SshEndpoint};
use crate::source::{Origin, RemoteTarget, LOOPBACK_HOST};

/// Seconds the ssh client may spend establishing a connection.
pub const CONNECT_TIMEOUT_SECS: u32 = 5;

/// Raw bytes plus the connection the transport actually used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Document bytes.
    pub bytes: Vec<u8>,
    /// Host the transport dialed (resolved address, or loopback for local).
    pub resolved_host: String,
    /// Port the transport dialed; `None` for local reads.
    pub resolved_port: Option<u16>,
}

/// Retrieves the raw bytes behind an origin.
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher {
    /// Fetches the document at `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be retrieved.
    fn fetch(&self, origin: &Origin) -> Result<Fetched>;
}

/// Reads documents from local storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn fetch(&self, origin: &Origin) -> Result<Fetched> {
        let Origin::Local(path) = origin else {
            return Err(Error::Fetch {
                origin: origin.to_string(),
                reason: "not a local origin".to_string(),
            });
        };
        let bytes = fs::read(path).map_err(|e| Error::Fetch {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(Fetched {
            bytes,
            resolved_host: LOOPBACK_HOST.to_string(),
            resolved_port: None,
        })
    }
}

/// Reads documents from remote hosts with the system `ssh` client.
///
/// The host name is resolved before dialing so the address actually used
/// can be reported for autodetection. Host keys are still checked under the
/// name written in the origin.
#[derive(Debug, Clone)]
pub struct SshFetcher {
    resolver: AddressResolver,
    program: String,
}

impl SshFetcher {
    /// Creates a fetcher using `resolver` and the `ssh` binary on `PATH`.
    #[must_use]
    pub fn new(resolver: AddressResolver) -> Self {
        Self {
            resolver,
            program: "ssh".to_string(),
        }
    }

    /// Uses a different ssh client binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn fetch_remote(&self, origin: &Origin, target: &RemoteTarget) -> Result<Fetched> {
        let fetch_err = |reason: String| Error::Fetch {
            origin: origin.to_string(),
            reason,
        };

        let endpoint = self.resolver.resolve(target)?;
        let address = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| fetch_err(format!("cannot resolve {}: {e}", endpoint.host)))?
            .next()
            .ok_or_else(|| fetch_err(format!("{} has no addresses", endpoint.host)))?;
        let dialed = address.ip().to_string();

        log::info!(
            "fetching {} from {dialed}:{} over ssh",
            endpoint.path,
            endpoint.port
        );
        let output = Command::new(&self.program)
            .args(ssh_args(&endpoint, &dialed))
            .output()
            .map_err(|e| fetch_err(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fetch_err(format!(
                "ssh exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        log::debug!("{} bytes copied", output.stdout.len());
        Ok(Fetched {
            bytes: output.stdout,
            resolved_host: dialed,
            resolved_port: Some(endpoint.port),
        })
    }
}

impl Fetcher for SshFetcher {
    fn fetch(&self, origin: &Origin) -> Result<Fetched> {
        match origin {
            Origin::Remote(target) => self.fetch_remote(origin, target),
            Origin::Local(_) => Err(Error::Fetch {
                origin: origin.to_string(),
                reason: "not a remote origin".to_string(),
            }),
        }
    }
}

/// Build the ssh client arguments for reading `endpoint.path` from `dialed`.
#[must_use]
pub fn ssh_args(endpoint: &SshEndpoint, dialed: &str) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        format!("HostKeyAlias={}", endpoint.alias),
        "-p".to_string(),
        endpoint.port.to_string(),
        "-i".to_string(),
        endpoint.key_path.display().to_string(),
    ];
    if let Some(user) = &endpoint.user {
        args.push("-l".to_string());
        args.push(user.clone());
    }
    args.push(dialed.to_string());
    args.push(format!("cat -- {}", shell_quote(&endpoint.path)));
    args
}

/// Single-quotes `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Dispatches local origins to [`LocalFetcher`] and remote ones to
/// [`SshFetcher`].
#[derive(Debug, Clone)]
pub struct OriginFetcher {
    local: LocalFetcher,
    ssh: SshFetcher,
}

impl OriginFetcher {
    /// Creates a dispatcher whose ssh side uses `resolver`.
    #[must_use]
    pub fn new(resolver: AddressResolver) -> Self {
        Self {
            local: LocalFetcher,
            ssh: SshFetcher::new(resolver),
        }
    }
}

impl Fetcher for OriginFetcher {
    fn fetch(&self, origin: &Origin) -> Result<Fetched> {
        match origin {
            Origin::Local(_) => self.local.fetch(origin),
            Origin::Remote(_) => self.ssh.fetch(origin),
        }
    }
}
