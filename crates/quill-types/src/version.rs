use serde::{Deserialize, Serialize};

/// A protocol version number as sent in the handshake (e.g. 47, 340, 773).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion(pub i32);

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "protocol {}", self.0)
    }
}

/// Describes the running server's protocol generation.
///
/// Either a raw protocol number or a release name such as `1.12.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionTag {
    Protocol(ProtocolVersion),
    Release(String),
}

impl VersionTag {
    pub fn protocol(number: i32) -> Self {
        VersionTag::Protocol(ProtocolVersion(number))
    }

    pub fn release(name: impl Into<String>) -> Self {
        VersionTag::Release(name.into())
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionTag::Protocol(p) => write!(f, "{}", p),
            VersionTag::Release(name) => write!(f, "release {}", name),
        }
    }
}

impl std::str::FromStr for VersionTag {
    type Err = String;

    /// `"340"` and `"protocol:340"` parse as protocol numbers; anything shaped
    /// like `1.x[.y]` parses as a release name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number = s.strip_prefix("protocol:").unwrap_or(s);
        if let Ok(n) = number.parse::<i32>() {
            return Ok(VersionTag::protocol(n));
        }
        let looks_like_release = s.split('.').count() >= 2
            && s.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if looks_like_release {
            Ok(VersionTag::release(s))
        } else {
            Err(format!("not a protocol number or release name: {:?}", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocol_number() {
        assert_eq!("340".parse::<VersionTag>(), Ok(VersionTag::protocol(340)));
        assert_eq!("protocol:47".parse::<VersionTag>(), Ok(VersionTag::protocol(47)));
    }

    #[test]
    fn test_parse_release() {
        assert_eq!("1.12.2".parse::<VersionTag>(), Ok(VersionTag::release("1.12.2")));
        assert_eq!("1.8".parse::<VersionTag>(), Ok(VersionTag::release("1.8")));
    }

    #[test]
    fn test_parse_garbage() {
        assert!("v1_20_R3".parse::<VersionTag>().is_err());
        assert!("1..2".parse::<VersionTag>().is_err());
        assert!("".parse::<VersionTag>().is_err());
    }
}
