//! Cluster endpoint transforms applied while merging.
//!
//! Three independent rewrites run in a fixed order:
//!
//! 1. explicit address override
//! 2. address autodetection from the retrieval host
//! 3. insecure downgrade
//!
//! The downgrade only touches trust material, never the server field, so it
//! composes with either address rewrite.

use url::Url;

use crate::document::Cluster;
use crate::error::{Error, Result};
use crate::source::{parse_port, SourceDefinition};

/// Applies every transform requested by `source` to `cluster`.
///
/// # Errors
///
/// Returns [`Error::AddressResolution`] when autodetection cannot parse the
/// existing server URL, the URL has no explicit port and no override port is
/// given, or no connection host was recorded for the source.
///
/// # Examples
///
/// ```
/// use kubegather::document::Cluster;
/// use kubegather::merge::apply_endpoint_transforms;
/// use kubegather::SourceDefinition;
///
/// let mut cluster = Cluster::new("https://10.0.0.5:6443");
/// let source = SourceDefinition::new("10.0.0.5")
///     .with_autodetect(true)
///     .with_resolved_host("198.51.100.9");
///
/// apply_endpoint_transforms(&mut cluster, &source).unwrap();
/// assert_eq!(cluster.server, "https://198.51.100.9:6443");
/// ```
pub fn apply_endpoint_transforms(cluster: &mut Cluster, source: &SourceDefinition) -> Result<()> {
    if !source.autodetect_address {
        if let Some(address) = source.api_address() {
            cluster.server = explicit_server(address);
            log::debug!("server overridden to {}", cluster.server);
        }
    }

    if source.autodetect_address {
        cluster.server = autodetect_server(
            &cluster.server,
            source.resolved_host.as_deref(),
            source.override_port.as_deref(),
        )?;
        log::debug!("server autodetected as {}", cluster.server);
    }

    if source.insecure {
        cluster.certificate_authority = None;
        cluster.certificate_authority_data = None;
        cluster.insecure_skip_tls_verify = true;
    }

    Ok(())
}

/// Server URL for an explicit address: kept verbatim when it carries a
/// scheme, otherwise served over https.
#[must_use]
pub fn explicit_server(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("https://{address}")
    }
}

/// Rewrites the host of `server` to `resolved_host`.
///
/// The port is `override_port` if given, else the port written in `server`.
/// Scheme and path are preserved.
///
/// # Errors
///
/// See [`apply_endpoint_transforms`].
pub fn autodetect_server(
    server: &str,
    resolved_host: Option<&str>,
    override_port: Option<&str>,
) -> Result<String> {
    let fail = |reason: String| Error::AddressResolution {
        url: server.to_string(),
        reason,
    };

    let url = Url::parse(server).map_err(|e| fail(format!("unparseable server url: {e}")))?;
    let (authority, rest) = split_authority(server).ok_or_else(|| fail("missing host".into()))?;

    let port = match override_port {
        Some(port) => parse_port(port).map_err(fail)?,
        None => explicit_port(&url, authority)
            .ok_or_else(|| fail("server url has no port and no override port given".into()))?,
    };

    let host = resolved_host
        .filter(|h| !h.is_empty())
        .ok_or_else(|| fail("no connection host was recorded for this source".into()))?;
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    Ok(format!("{}://{host}:{port}{rest}", url.scheme()))
}

/// Splits `scheme://authority/rest` into authority and rest.
fn split_authority(server: &str) -> Option<(&str, &str)> {
    let (_, after_scheme) = server.split_once("://")?;
    let end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    Some((&after_scheme[..end], &after_scheme[end..]))
}

/// The port written in the URL. `Url::port` hides ports equal to the scheme
/// default, so those are recovered from the raw authority.
fn explicit_port(url: &Url, authority: &str) -> Option<u16> {
    if let Some(port) = url.port() {
        return Some(port);
    }
    let default = url.port_or_known_default()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    host_port
        .ends_with(&format!(":{default}"))
        .then_some(default)
}
