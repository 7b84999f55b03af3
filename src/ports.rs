use std::collections::BTreeSet;
use thiserror::Error;

/// Why a port specification could not be turned into a [`PortSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSpecError {
    #[error("invalid port token: {token:?} (expected a number or start-end range)")]
    InvalidToken { token: String },
    #[error("port out of range: {value} (must be 0-65535)")]
    OutOfRange { value: String },
    #[error("invalid range {start}-{end} (start > end)")]
    ReversedRange { start: u16, end: u16 },
    #[error("port 0 is not a valid TCP port")]
    ZeroPort,
}

/// Ascending, duplicate-free sequence of port numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSet(Vec<u16>);

impl PortSet {
    /// Parse a specification such as `22,80,443`, `1-1024` or `80,8000-8010`.
    ///
    /// Supported tokens, separated by commas:
    /// - single port number: `80`
    /// - inclusive range: `8000-8010`
    /// - empty or whitespace-only tokens are skipped
    ///
    /// A reversed range (`10-1`) is rejected rather than treated as empty.
    /// Port 0 parses; use [`PortSet::require_tcp_ports`] before scanning.
    pub fn resolve(spec: &str) -> Result<PortSet, MalformedSpecError> {
        let mut set = BTreeSet::new();

        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }

            if let Some((a, b)) = token.split_once('-') {
                let start = parse_port_str(a.trim(), token)?;
                let end = parse_port_str(b.trim(), token)?;
                if start > end {
                    return Err(MalformedSpecError::ReversedRange { start, end });
                }
                set.extend(start..=end);
                continue;
            }

            set.insert(parse_port_str(token, token)?);
        }

        Ok(PortSet(set.into_iter().collect()))
    }

    /// Restrict to valid TCP ports (1..=65535).
    pub fn require_tcp_ports(self) -> Result<PortSet, MalformedSpecError> {
        if self.contains(0) {
            return Err(MalformedSpecError::ZeroPort);
        }
        Ok(self)
    }

    /// Specification used when the caller gives none.
    pub fn default_spec() -> &'static str {
        "1-1024"
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.0.binary_search(&port).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let set: BTreeSet<u16> = iter.into_iter().collect();
        PortSet(set.into_iter().collect())
    }
}

impl From<Vec<u16>> for PortSet {
    fn from(v: Vec<u16>) -> Self {
        v.into_iter().collect()
    }
}

fn parse_port_str(s: &str, token: &str) -> Result<u16, MalformedSpecError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedSpecError::InvalidToken {
            token: token.to_string(),
        });
    }
    s.parse::<u16>().map_err(|_| MalformedSpecError::OutOfRange {
        value: s.to_string(),
    })
}
