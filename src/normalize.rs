//! URL to registrable-domain normalization.
//!
//! Topic directory URLs are reduced to `<label>.<public suffix>` using the
//! Public Suffix List, so `http://www.example.co.uk/` keys on `example.co.uk`
//! rather than on its last two labels.

use crate::config::{ROOT_PATH, WWW_SUBDOMAIN};
use psl::{List, Psl};
use url::{Host, Url};

/// Registrable domain and join eligibility derived from a raw URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// `<second-level label>.<public suffix>`, e.g. `example.co.uk`
    pub domain: String,
    /// Everything left of the registrable domain, without the trailing dot
    pub subdomain: String,
    /// Root path, no subdomain other than `www`, no query and no fragment
    pub eligible: bool,
}

/// Returns `None` for URLs that cannot be parsed or have no registrable
/// domain (IP hosts, bare public suffixes, hostless schemes).
///
/// The query and fragment checks look at the raw string, so a bare `?` or `#`
/// disqualifies a URL even when it carries no parameters.
pub fn normalize(raw: &str) -> Option<NormalizedUrl> {
    let raw = raw.trim();
    let url = Url::parse(raw).ok()?;

    let host = match url.host()? {
        Host::Domain(host) => host,
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };
    let (domain, subdomain) = split_host(host)?;

    let eligible = url.path() == ROOT_PATH
        && (subdomain.is_empty() || subdomain == WWW_SUBDOMAIN)
        && !raw.contains(['?', '#']);

    Some(NormalizedUrl {
        domain: domain.to_string(),
        subdomain: subdomain.to_string(),
        eligible,
    })
}

/// The registrable domain of `raw`, only when the URL is eligible for joining.
pub fn eligible_domain(raw: &str) -> Option<String> {
    normalize(raw)
        .filter(|normalized| normalized.eligible)
        .map(|normalized| normalized.domain)
}

/// Splits a lowercase hostname into (registrable domain, subdomain).
fn split_host(host: &str) -> Option<(&str, &str)> {
    let host = host.strip_suffix('.').unwrap_or(host);
    let registrable = List.domain(host.as_bytes())?;
    let registrable = std::str::from_utf8(registrable.as_bytes()).ok()?;

    let subdomain = host[..host.len() - registrable.len()].trim_end_matches('.');
    Some((registrable, subdomain))
}
