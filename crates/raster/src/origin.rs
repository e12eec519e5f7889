use crate::RasterError;

/// Decides which image sources may be captured without tainting the surface.
///
/// Local paths, `file:` and `data:` sources are same-origin. An `http(s)` source
/// is allowed only when its host is trusted; everything else taints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginPolicy {
    trusted_hosts: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(trusted_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            trusted_hosts: trusted_hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn check(&self, src: &str) -> Result<(), RasterError> {
        match remote_host(src) {
            Some(host) if !self.trusted_hosts.iter().any(|t| *t == host) => {
                Err(RasterError::Tainted {
                    src: src.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// The lowercase host of an `http(s)` URL, or `None` for anything else.
pub fn remote_host(src: &str) -> Option<String> {
    let lower = src.trim().to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = host_port.split(':').next().unwrap_or_default();
    (!host.is_empty()).then(|| host.to_string())
}
