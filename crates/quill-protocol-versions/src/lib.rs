mod common;
mod releases;
pub mod v1_8;
pub mod v1_9;
pub mod v1_13;
pub mod v1_14;
pub mod v1_17;
pub mod v1_19;
pub mod v1_21;

pub use releases::release_protocol;

use quill_protocol_core::ProtocolDialect;
use std::sync::Arc;

/// Every dialect this crate provides, oldest first.
pub fn all_dialects() -> Vec<Arc<dyn ProtocolDialect>> {
    vec![
        Arc::new(v1_8::V1_8Dialect),
        Arc::new(v1_9::V1_9Dialect),
        Arc::new(v1_13::V1_13Dialect),
        Arc::new(v1_14::V1_14Dialect),
        Arc::new(v1_17::V1_17Dialect),
        Arc::new(v1_19::V1_19Dialect),
        Arc::new(v1_21::V1_21Dialect),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_do_not_overlap() {
        let dialects = all_dialects();
        for (i, a) in dialects.iter().enumerate() {
            for b in dialects.iter().skip(i + 1) {
                let (a_range, b_range) = (a.protocols(), b.protocols());
                assert!(
                    a_range.end() < b_range.start(),
                    "{} and {} overlap",
                    a.generation(),
                    b.generation()
                );
            }
        }
    }

    #[test]
    fn test_every_release_has_a_dialect() {
        for release in ["1.8.8", "1.12.2", "1.13.2", "1.14.4", "1.18.2", "1.19.4", "1.21.10"] {
            let protocol = release_protocol(release).unwrap();
            assert!(
                all_dialects().iter().any(|d| d.speaks(protocol)),
                "{} ({}) unclaimed",
                release,
                protocol
            );
        }
    }
}
