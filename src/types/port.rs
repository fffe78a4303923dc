//! Port types and port specification expansion.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortToken` classifies one comma-separated unit of a port specification and
//! `PortSet` is the ordered result of expanding a list of tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Curated list of well-known service ports expanded by the `common` keyword.
pub const COMMON_PORTS: [u16; 52] = [
    20, 21, 22, 23, 25, 53, 67, 68, 69, 80, 110, 123, 135, 137, 138, 139, 143, 161, 162, 179,
    194, 389, 443, 445, 465, 514, 515, 587, 993, 995, 1433, 1434, 1521, 1723, 2049, 2083, 2087,
    3128, 3306, 3389, 5432, 5900, 5985, 5986, 6379, 8080, 8443, 8888, 9090, 9200, 10000, 27017,
];

/// A validated network port number (1-65535).
///
/// Using a newtype prevents accidental misuse of raw u16 values
/// and ensures port numbers are always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Parse a decimal port number, rejecting values outside 1-65535.
    fn parse_number(s: &str) -> Result<Self, PortError> {
        let s = s.trim();
        let value: u32 = s
            .parse()
            .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(PortError::OutOfRange(value))
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(u32::from(value)))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for a single rejected port specification token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// A number outside 1-65535. A range with either bound out of range is
    /// rejected as a whole, never clipped to the valid ports.
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: '{0}'")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("invalid port range format: '{0}'")]
    MalformedRange(String),
    #[error("empty port specification")]
    Empty,
}

/// One classified port specification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortToken {
    /// The `common` keyword.
    Common,
    /// The `all` keyword (1-65535).
    All,
    /// An inclusive range `A-B`.
    Range(Port, Port),
    /// A single port.
    Single(Port),
}

impl PortToken {
    /// Number of ports this token expands to.
    pub fn len(&self) -> usize {
        match self {
            Self::Common => COMMON_PORTS.len(),
            Self::All => usize::from(Port::MAX),
            Self::Range(start, end) => (start.0..=end.0).len(),
            Self::Single(_) => 1,
        }
    }

    /// Only a hand-built reversed range expands to nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the ports of this token in ascending (or list) order.
    pub fn ports(self) -> Box<dyn Iterator<Item = Port>> {
        match self {
            Self::Common => Box::new(COMMON_PORTS.into_iter().map(Port)),
            Self::All => Box::new((Port::MIN..=Port::MAX).map(Port)),
            Self::Range(start, end) => Box::new((start.0..=end.0).map(Port)),
            Self::Single(port) => Box::new(std::iter::once(port)),
        }
    }
}

impl FromStr for PortToken {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }
        if s.eq_ignore_ascii_case("common") {
            return Ok(Self::Common);
        }
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        match s.split_once('-') {
            Some((start, end)) => {
                if start.trim().is_empty() || end.trim().is_empty() || end.contains('-') {
                    return Err(PortError::MalformedRange(s.to_string()));
                }
                let start = Port::parse_number(start)?;
                let end = Port::parse_number(end)?;
                if start > end {
                    return Err(PortError::InvalidRange(start.0, end.0));
                }
                Ok(Self::Range(start, end))
            }
            None => Port::parse_number(s).map(Self::Single),
        }
    }
}

/// An ordered sequence of ports produced by expanding port spec tokens.
///
/// Ports appear in token order and duplicates are kept: overlapping tokens
/// only cause redundant scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSet {
    ports: Vec<Port>,
}

impl PortSet {
    /// Expand port spec tokens into a port set.
    ///
    /// Malformed tokens never abort the expansion; each one is skipped and
    /// returned alongside the ports so the caller can report it.
    pub fn expand<S: AsRef<str>>(tokens: &[S]) -> (Self, Vec<PortError>) {
        let mut ports = Vec::new();
        let mut rejected = Vec::new();

        for token in tokens {
            match token.as_ref().parse::<PortToken>() {
                Ok(token) => {
                    ports.reserve(token.len());
                    ports.extend(token.ports());
                }
                Err(e) => rejected.push(e),
            }
        }

        (Self { ports }, rejected)
    }
}

impl Deref for PortSet {
    type Target = [Port];

    fn deref(&self) -> &Self::Target {
        &self.ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(set: &PortSet) -> Vec<u16> {
        set.iter().map(|p| p.as_u16()).collect()
    }

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_token_classification() {
        assert_eq!("common".parse::<PortToken>().unwrap(), PortToken::Common);
        assert_eq!("ALL".parse::<PortToken>().unwrap(), PortToken::All);
        assert_eq!(
            " 22 ".parse::<PortToken>().unwrap(),
            PortToken::Single(Port(22))
        );
        assert_eq!(
            "8000-8010".parse::<PortToken>().unwrap(),
            PortToken::Range(Port(8000), Port(8010))
        );
    }

    #[test]
    fn test_token_errors() {
        assert_eq!("".parse::<PortToken>(), Err(PortError::Empty));
        assert_eq!("0".parse::<PortToken>(), Err(PortError::OutOfRange(0)));
        assert_eq!(
            "http".parse::<PortToken>(),
            Err(PortError::InvalidFormat("http".to_string()))
        );
        assert_eq!(
            "1-2-3".parse::<PortToken>(),
            Err(PortError::MalformedRange("1-2-3".to_string()))
        );
        assert_eq!(
            "-5".parse::<PortToken>(),
            Err(PortError::MalformedRange("-5".to_string()))
        );
        assert_eq!("0-5".parse::<PortToken>(), Err(PortError::OutOfRange(0)));
        assert_eq!(
            "1-a".parse::<PortToken>(),
            Err(PortError::InvalidFormat("a".to_string()))
        );
    }

    #[test]
    fn test_token_len() {
        assert_eq!(PortToken::Common.len(), 52);
        assert_eq!(PortToken::All.len(), 65535);
        assert_eq!(PortToken::Single(Port(8)).len(), 1);
        assert_eq!(PortToken::Range(Port(1), Port(65535)).len(), 65535);

        let reversed = PortToken::Range(Port(10), Port(5));
        assert_eq!(reversed.len(), 0);
        assert!(reversed.is_empty());
        assert_eq!(reversed.ports().count(), 0);
    }

    #[test]
    fn test_expand_rejects_partly_out_of_range() {
        let (set, rejected) = PortSet::expand(&["0-3", "65534-70000", "7"]);
        assert_eq!(raw(&set), vec![7]);
        assert_eq!(
            rejected,
            vec![PortError::OutOfRange(0), PortError::OutOfRange(70000)]
        );
    }

    #[test]
    fn test_expand_in_token_order() {
        let (set, rejected) = PortSet::expand(&["1-3", "80", "common"]);
        assert!(rejected.is_empty());

        let mut expected = vec![1, 2, 3, 80];
        expected.extend(COMMON_PORTS);
        assert_eq!(raw(&set), expected);
    }

    #[test]
    fn test_expand_reversed_range() {
        let (set, rejected) = PortSet::expand(&["5-2"]);
        assert!(set.is_empty());
        assert_eq!(rejected, vec![PortError::InvalidRange(5, 2)]);
    }

    #[test]
    fn test_expand_out_of_range() {
        let (set, rejected) = PortSet::expand(&["70000"]);
        assert!(set.is_empty());
        assert_eq!(rejected, vec![PortError::OutOfRange(70000)]);
    }

    #[test]
    fn test_expand_skips_bad_tokens() {
        let (set, rejected) = PortSet::expand(&["22", "abc", "443", "9-1"]);
        assert_eq!(raw(&set), vec![22, 443]);
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn test_expand_keeps_duplicates() {
        let (set, _) = PortSet::expand(&["80", "79-81", "80"]);
        assert_eq!(raw(&set), vec![80, 79, 80, 81, 80]);
    }

    #[test]
    fn test_expand_all() {
        let (set, _) = PortSet::expand(&["all"]);
        assert_eq!(set.len(), 65535);
        assert_eq!(set.first().map(|p| p.as_u16()), Some(1));
        assert_eq!(set.last().map(|p| p.as_u16()), Some(65535));
    }

    #[test]
    fn test_expand_is_idempotent() {
        let tokens = ["common", "100-110", "bogus", "8080"];
        assert_eq!(PortSet::expand(&tokens), PortSet::expand(&tokens));
    }

    #[test]
    fn test_common_ports_are_valid() {
        assert!(COMMON_PORTS.iter().all(|&p| Port::new(p).is_some()));
    }
}
