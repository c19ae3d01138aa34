//! Refuses URL inputs that resolve to loopback, private or link-local hosts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use sqirvy_core::{Error, Result};
use tokio::net::lookup_host;
use url::{Host, Url};

/// Resolves the host of `url` and fails if any of its addresses is non-public.
///
/// # Errors
/// Returns an error if the URL has no host, the host cannot be resolved, or
/// an address fails [`check_addresses`].
pub async fn ensure_public_url(url: &Url) -> Result<()> {
    resolve_public(url).await?;
    Ok(())
}

/// Resolves the host of `url`, returning its addresses only if all are public.
///
/// Callers connect to the returned addresses rather than resolving again.
///
/// # Errors
/// See [`ensure_public_url`].
pub async fn resolve_public(url: &Url) -> Result<Vec<SocketAddr>> {
    let unresolved = |reason: String| Error::Scrape {
        url: url.to_string(),
        reason,
    };

    let port = url.port_or_known_default().unwrap_or(80);
    let addresses: Vec<SocketAddr> = match url.host() {
        Some(Host::Ipv4(address)) => vec![SocketAddr::new(IpAddr::V4(address), port)],
        Some(Host::Ipv6(address)) => vec![SocketAddr::new(IpAddr::V6(address), port)],
        Some(Host::Domain(domain)) => lookup_host((domain, port))
            .await
            .map_err(|error| unresolved(format!("could not resolve hostname: {error}")))?
            .collect(),
        None => return Err(unresolved("URL has no host".to_owned())),
    };
    if addresses.is_empty() {
        return Err(unresolved("hostname resolved to no addresses".to_owned()));
    }

    let ips: Vec<IpAddr> = addresses.iter().map(SocketAddr::ip).collect();
    check_addresses(url.as_str(), &ips)?;
    Ok(addresses)
}

/// Fails on the first address that is not publicly routable.
///
/// # Errors
/// Returns [`Error::NonPublicAddress`] naming the offending address.
pub fn check_addresses(url: &str, addresses: &[IpAddr]) -> Result<()> {
    addresses
        .iter()
        .find(|address| is_non_public(**address))
        .map_or(Ok(()), |address| {
            Err(Error::NonPublicAddress {
                url: url.to_owned(),
                address: address.to_string(),
            })
        })
}

/// Loopback, private (RFC 1918 or IPv6 unique-local), link-local unicast,
/// link-local multicast or unspecified.
pub fn is_non_public(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_non_public_v4(v4),
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map_or_else(|| is_non_public_v6(v6), is_non_public_v4),
    }
}

fn is_non_public_v4(address: Ipv4Addr) -> bool {
    let [first, second, third, _] = address.octets();
    address.is_loopback()
        || address.is_private()
        || address.is_link_local()
        || address.is_unspecified()
        // 224.0.0.0/24
        || (first == 224 && second == 0 && third == 0)
}

fn is_non_public_v6(address: Ipv6Addr) -> bool {
    let first_segment = address.segments()[0];
    address.is_loopback()
        || address.is_unspecified()
        || address.is_unique_local()
        || address.is_unicast_link_local()
        // ff02::/16
        || first_segment & 0xff0f == 0xff02
}
