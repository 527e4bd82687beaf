/// Release name to protocol number, for every release a dialect speaks.
const RELEASES: &[(&str, i32)] = &[
    ("1.8", 47),
    ("1.8.1", 47),
    ("1.8.2", 47),
    ("1.8.3", 47),
    ("1.8.4", 47),
    ("1.8.5", 47),
    ("1.8.6", 47),
    ("1.8.7", 47),
    ("1.8.8", 47),
    ("1.8.9", 47),
    ("1.9", 107),
    ("1.9.1", 108),
    ("1.9.2", 109),
    ("1.9.3", 110),
    ("1.9.4", 110),
    ("1.10", 210),
    ("1.10.1", 210),
    ("1.10.2", 210),
    ("1.11", 315),
    ("1.11.1", 316),
    ("1.11.2", 316),
    ("1.12", 335),
    ("1.12.1", 338),
    ("1.12.2", 340),
    ("1.13", 393),
    ("1.13.1", 401),
    ("1.13.2", 404),
    ("1.14", 477),
    ("1.14.1", 480),
    ("1.14.2", 485),
    ("1.14.3", 490),
    ("1.14.4", 498),
    ("1.17", 755),
    ("1.17.1", 756),
    ("1.18", 757),
    ("1.18.1", 757),
    ("1.18.2", 758),
    ("1.19", 759),
    ("1.19.1", 760),
    ("1.19.2", 760),
    ("1.19.3", 761),
    ("1.19.4", 762),
    ("1.21.4", 769),
    ("1.21.5", 770),
    ("1.21.6", 771),
    ("1.21.7", 772),
    ("1.21.8", 772),
    ("1.21.9", 773),
    ("1.21.10", 773),
];

/// Protocol number of a release such as `1.12.2`. `None` for releases no
/// dialect speaks.
pub fn release_protocol(release: &str) -> Option<i32> {
    RELEASES
        .iter()
        .find(|(name, _)| *name == release)
        .map(|(_, protocol)| *protocol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_releases() {
        assert_eq!(release_protocol("1.8.8"), Some(47));
        assert_eq!(release_protocol("1.12.2"), Some(340));
        assert_eq!(release_protocol("1.21.10"), Some(773));
    }

    #[test]
    fn test_unsupported_release() {
        assert_eq!(release_protocol("1.16.5"), None);
        assert_eq!(release_protocol("1.7.10"), None);
    }
}
