use crate::{DialectAdapter, PromptConfig, PromptError, SurfaceSettings, VersionAdapter};
use quill_protocol_core::ProtocolDialect;
use quill_types::VersionTag;
use std::sync::Arc;
use tracing::debug;

/// Picks the adapter for the running server's protocol generation.
pub struct AdapterRegistry {
    dialects: Vec<Arc<dyn ProtocolDialect>>,
    settings: SurfaceSettings,
}

impl AdapterRegistry {
    pub fn new(dialects: Vec<Arc<dyn ProtocolDialect>>, settings: SurfaceSettings) -> Self {
        Self { dialects, settings }
    }

    /// Every dialect from `quill-protocol-versions`.
    pub fn with_defaults(config: &PromptConfig) -> Self {
        Self::new(quill_protocol_versions::all_dialects(), SurfaceSettings::from(config))
    }

    pub fn resolve(&self, tag: &VersionTag) -> Result<Arc<dyn VersionAdapter>, PromptError> {
        let protocol = match tag {
            VersionTag::Protocol(version) => version.0,
            VersionTag::Release(name) => quill_protocol_versions::release_protocol(name)
                .ok_or_else(|| PromptError::UnsupportedVersion(tag.to_string()))?,
        };
        let dialect = self
            .dialects
            .iter()
            .find(|d| d.speaks(protocol))
            .ok_or_else(|| PromptError::UnsupportedVersion(tag.to_string()))?;
        debug!("Resolved {} to dialect {}", tag, dialect.generation());
        Ok(Arc::new(DialectAdapter::new(
            Arc::clone(dialect),
            protocol,
            self.settings.clone(),
        )))
    }

    /// Parse a configured version string and resolve it.
    pub fn resolve_str(&self, version: &str) -> Result<Arc<dyn VersionAdapter>, PromptError> {
        let tag: VersionTag = version
            .parse()
            .map_err(|_| PromptError::UnsupportedVersion(version.to_string()))?;
        self.resolve(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PromptKind;

    fn registry() -> AdapterRegistry {
        AdapterRegistry::with_defaults(&PromptConfig::default())
    }

    #[test]
    fn test_resolve_release_and_protocol() {
        let by_name = registry().resolve(&VersionTag::release("1.12.2")).unwrap();
        assert_eq!(by_name.generation(), "v1_9");
        assert_eq!(by_name.protocol().0, 340);

        let by_number = registry().resolve(&VersionTag::protocol(498)).unwrap();
        assert_eq!(by_number.generation(), "v1_14");
    }

    #[test]
    fn test_generation_kinds() {
        let signs_only = registry().resolve_str("1.19.4").unwrap();
        assert!(signs_only.supports(PromptKind::MultiLineText));
        assert!(!signs_only.supports(PromptKind::Rename));

        let anvils_only = registry().resolve_str("1.21.10").unwrap();
        assert!(anvils_only.supports(PromptKind::Rename));
        assert!(!anvils_only.supports(PromptKind::MultiLineText));
    }

    #[test]
    fn test_unknown_versions() {
        for version in ["1.16.5", "1.7.10", "999", "snapshot"] {
            match registry().resolve_str(version) {
                Err(PromptError::UnsupportedVersion(tag)) => assert!(!tag.is_empty()),
                Err(other) => panic!("{}: unexpected error {}", version, other),
                Ok(adapter) => panic!("{} resolved to {}", version, adapter.generation()),
            }
        }
    }

    #[test]
    fn test_empty_registry() {
        let empty = AdapterRegistry::new(Vec::new(), SurfaceSettings::from(&PromptConfig::default()));
        assert!(matches!(
            empty.resolve(&VersionTag::protocol(47)),
            Err(PromptError::UnsupportedVersion(_))
        ));
    }
}
