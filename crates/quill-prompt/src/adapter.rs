use crate::{PlayerConnection, PromptConfig, PromptKind, PromptResult, SessionId};
use anyhow::{bail, Result};
use quill_protocol_core::*;
use quill_types::{BlockPos, ProtocolVersion, TextComponent};
use std::sync::Arc;
use tracing::debug;

/// Anvil slot holding the renamed result.
pub const ANVIL_OUTPUT_SLOT: i16 = 2;
/// Anvil slot the prefilled paper goes into.
pub const ANVIL_INPUT_SLOT: i16 = 0;

/// Where a fabricated surface lives on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceAnchor {
    Container { window_id: i32 },
    Block { position: BlockPos },
}

/// The fake container or block backing one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub session: SessionId,
    pub kind: PromptKind,
    pub anchor: SurfaceAnchor,
    pub prefill: String,
}

/// Decoded text of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub raw_lines: Vec<String>,
}

impl Submission {
    pub fn new(raw_lines: Vec<String>) -> Self {
        Self { raw_lines }
    }

    pub fn combined(&self) -> String {
        self.raw_lines.concat()
    }

    pub fn into_result(self, kind: PromptKind) -> PromptResult {
        match kind {
            PromptKind::Rename => PromptResult::Rename(self.combined()),
            PromptKind::MultiLineText => {
                let combined = self.combined();
                PromptResult::Lines {
                    lines: self.raw_lines,
                    combined,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    /// Addressed to the surface but not a submission yet (anvil typing).
    Progress,
    Submitted(Submission),
    /// The client closed the surface itself.
    Closed,
}

/// State a matcher carries between packets of one session.
#[derive(Debug, Clone, Default)]
pub struct MatchProgress {
    pub rename_buffer: String,
}

impl MatchProgress {
    pub fn for_surface(surface: &Surface) -> Self {
        Self {
            rename_buffer: surface.prefill.clone(),
        }
    }
}

/// Per-generation knowledge of how to show a prompt and read it back.
pub trait VersionAdapter: Send + Sync {
    fn generation(&self) -> &'static str;

    fn protocol(&self) -> ProtocolVersion;

    fn supports(&self, kind: PromptKind) -> bool;

    fn build_surface(
        &self,
        player: &dyn PlayerConnection,
        kind: PromptKind,
        prefill: &str,
        session: SessionId,
    ) -> Result<Surface>;

    /// Packets that declare the surface, bind the player's view to it and
    /// push its initial content, in that order.
    fn encode_open_sequence(&self, surface: &Surface, session: SessionId) -> Result<Vec<RawPacket>>;

    fn match_submission(
        &self,
        packet: &RawPacket,
        surface: &Surface,
        session: SessionId,
        progress: &mut MatchProgress,
    ) -> MatchOutcome;

    fn encode_revert_sequence(&self, surface: &Surface) -> Result<Vec<RawPacket>>;
}

/// Presentation settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct SurfaceSettings {
    pub anvil_title: String,
    pub sign_elevation: i32,
}

impl From<&PromptConfig> for SurfaceSettings {
    fn from(config: &PromptConfig) -> Self {
        Self {
            anvil_title: config.anvil_title.clone(),
            sign_elevation: config.sign_elevation,
        }
    }
}

/// [`VersionAdapter`] over a wire dialect, pinned to one protocol number.
pub struct DialectAdapter {
    dialect: Arc<dyn ProtocolDialect>,
    protocol: i32,
    settings: SurfaceSettings,
}

impl DialectAdapter {
    pub fn new(dialect: Arc<dyn ProtocolDialect>, protocol: i32, settings: SurfaceSettings) -> Self {
        Self {
            dialect,
            protocol,
            settings,
        }
    }

    fn encode(&self, packets: &[PromptPacket]) -> Result<Vec<RawPacket>> {
        packets
            .iter()
            .map(|p| self.dialect.encode_clientbound(self.protocol, p))
            .collect()
    }
}

impl VersionAdapter for DialectAdapter {
    fn generation(&self) -> &'static str {
        self.dialect.generation()
    }

    fn protocol(&self) -> ProtocolVersion {
        ProtocolVersion(self.protocol)
    }

    fn supports(&self, kind: PromptKind) -> bool {
        self.dialect.supports(kind.surface())
    }

    fn build_surface(
        &self,
        player: &dyn PlayerConnection,
        kind: PromptKind,
        prefill: &str,
        session: SessionId,
    ) -> Result<Surface> {
        if !self.supports(kind) {
            bail!("{} cannot show {:?} prompts", self.generation(), kind);
        }
        let anchor = match kind {
            PromptKind::Rename => SurfaceAnchor::Container {
                window_id: player.next_container_id(),
            },
            PromptKind::MultiLineText => SurfaceAnchor::Block {
                position: player.block_position().with_y(self.settings.sign_elevation),
            },
        };
        Ok(Surface {
            session,
            kind,
            anchor,
            prefill: prefill.to_string(),
        })
    }

    fn encode_open_sequence(&self, surface: &Surface, session: SessionId) -> Result<Vec<RawPacket>> {
        if surface.session != session {
            bail!("surface belongs to session {}, not {}", surface.session, session);
        }
        let packets = match &surface.anchor {
            SurfaceAnchor::Container { window_id } => vec![
                PromptPacket::OpenAnvil {
                    window_id: *window_id,
                    title: TextComponent::plain(self.settings.anvil_title.clone()),
                },
                PromptPacket::SetContainerSlot {
                    window_id: *window_id,
                    state_id: 0,
                    slot: ANVIL_INPUT_SLOT,
                    item: Some(NamedItem {
                        item: SurfaceItem::Paper,
                        display_name: TextComponent::item_name(surface.prefill.clone()),
                    }),
                },
            ],
            SurfaceAnchor::Block { position } => vec![
                PromptPacket::BlockUpdate {
                    position: *position,
                    block: SurfaceBlock::Sign,
                },
                PromptPacket::OpenSignEditor {
                    position: *position,
                },
            ],
        };
        self.encode(&packets)
    }

    fn match_submission(
        &self,
        packet: &RawPacket,
        surface: &Surface,
        session: SessionId,
        progress: &mut MatchProgress,
    ) -> MatchOutcome {
        if surface.session != session {
            return MatchOutcome::NoMatch;
        }
        let decoded = match self.dialect.decode_serverbound(self.protocol, packet) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => return MatchOutcome::NoMatch,
            Err(e) => {
                debug!(session = %session, packet_id = packet.id, "Undecodable candidate packet: {}", e);
                return MatchOutcome::NoMatch;
            }
        };

        match (&surface.anchor, decoded) {
            (SurfaceAnchor::Container { .. }, PromptPacket::RenameItem { name }) => {
                progress.rename_buffer = name;
                MatchOutcome::Progress
            }
            (SurfaceAnchor::Container { window_id }, PromptPacket::ClickContainer { window_id: clicked, slot })
                if clicked == *window_id && slot == ANVIL_OUTPUT_SLOT =>
            {
                if progress.rename_buffer.is_empty() {
                    MatchOutcome::NoMatch
                } else {
                    MatchOutcome::Submitted(Submission::new(vec![progress.rename_buffer.clone()]))
                }
            }
            (SurfaceAnchor::Container { window_id }, PromptPacket::CloseContainerRequest { window_id: closed })
                if closed == *window_id =>
            {
                MatchOutcome::Closed
            }
            (SurfaceAnchor::Block { position }, PromptPacket::UpdateSign { position: signed, lines, .. })
                if signed == *position =>
            {
                MatchOutcome::Submitted(Submission::new(lines.to_vec()))
            }
            _ => MatchOutcome::NoMatch,
        }
    }

    fn encode_revert_sequence(&self, surface: &Surface) -> Result<Vec<RawPacket>> {
        let packets = match &surface.anchor {
            SurfaceAnchor::Container { window_id } => vec![PromptPacket::CloseContainer {
                window_id: *window_id,
            }],
            SurfaceAnchor::Block { position } => vec![PromptPacket::BlockUpdate {
                position: *position,
                block: SurfaceBlock::Air,
            }],
        };
        self.encode(&packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use quill_protocol_versions::{v1_13::V1_13Dialect, v1_19::V1_19Dialect};
    use quill_types::GameProfile;
    use uuid::Uuid;

    struct StandingPlayer {
        pipeline: Pipeline,
    }

    impl PlayerConnection for StandingPlayer {
        fn profile(&self) -> GameProfile {
            GameProfile::new(Uuid::nil(), "Steve")
        }

        fn block_position(&self) -> BlockPos {
            BlockPos::new(10, 70, -4)
        }

        fn next_container_id(&self) -> i32 {
            7
        }

        fn send(&self, _packet: RawPacket) -> Result<()> {
            Ok(())
        }

        fn pipeline(&self) -> &Pipeline {
            &self.pipeline
        }
    }

    fn player() -> StandingPlayer {
        StandingPlayer {
            pipeline: Pipeline::new(),
        }
    }

    fn adapter_1_13() -> DialectAdapter {
        DialectAdapter::new(Arc::new(V1_13Dialect), 404, SurfaceSettings::from(&PromptConfig::default()))
    }

    fn click(window: u8, slot: i16) -> RawPacket {
        let mut data = BytesMut::new();
        data.put_u8(window);
        data.put_i16(slot);
        RawPacket::new(0x08, data)
    }

    fn rename(name: &str) -> RawPacket {
        let mut data = BytesMut::new();
        write_string(&mut data, name);
        RawPacket::new(0x1C, data)
    }

    #[test]
    fn test_combined_concatenates() {
        let sub = Submission::new(["a", "b", "c", "d"].map(String::from).to_vec());
        assert_eq!(sub.combined(), "abcd");
        assert_eq!(
            sub.into_result(PromptKind::MultiLineText),
            PromptResult::Lines {
                lines: ["a", "b", "c", "d"].map(String::from).to_vec(),
                combined: "abcd".into(),
            }
        );
        assert_eq!(
            Submission::new(vec!["Excalibur".into()]).into_result(PromptKind::Rename),
            PromptResult::Rename("Excalibur".into())
        );
    }

    #[test]
    fn test_sign_surface_at_elevation() {
        let session = SessionId::new();
        let settings = SurfaceSettings {
            anvil_title: "t".into(),
            sign_elevation: -64,
        };
        let adapter = DialectAdapter::new(Arc::new(V1_19Dialect), 762, settings);
        let surface = adapter
            .build_surface(&player(), PromptKind::MultiLineText, "", session)
            .unwrap();
        assert_eq!(
            surface.anchor,
            SurfaceAnchor::Block {
                position: BlockPos::new(10, -64, -4)
            }
        );
        assert!(adapter.build_surface(&player(), PromptKind::Rename, "", session).is_err());
    }

    #[test]
    fn test_open_sequence_order() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let anvil = adapter.build_surface(&player(), PromptKind::Rename, "Sword", session).unwrap();
        let ids: Vec<i32> = adapter
            .encode_open_sequence(&anvil, session)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![0x14, 0x17]); // open window, then set slot

        let sign = adapter.build_surface(&player(), PromptKind::MultiLineText, "", session).unwrap();
        let ids: Vec<i32> = adapter
            .encode_open_sequence(&sign, session)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![0x0B, 0x2C]); // block change, then sign editor
    }

    #[test]
    fn test_open_sequence_rejects_foreign_session() {
        let adapter = adapter_1_13();
        let surface = adapter
            .build_surface(&player(), PromptKind::Rename, "x", SessionId::new())
            .unwrap();
        assert!(adapter.encode_open_sequence(&surface, SessionId::new()).is_err());
    }

    #[test]
    fn test_rename_then_click_submits_buffer() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::Rename, "Sword", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);

        assert_eq!(
            adapter.match_submission(&rename("Flaming Sword"), &surface, session, &mut progress),
            MatchOutcome::Progress
        );
        // input slot and other windows are not submissions
        assert_eq!(adapter.match_submission(&click(7, 0), &surface, session, &mut progress), MatchOutcome::NoMatch);
        assert_eq!(adapter.match_submission(&click(8, 2), &surface, session, &mut progress), MatchOutcome::NoMatch);
        assert_eq!(
            adapter.match_submission(&click(7, 2), &surface, session, &mut progress),
            MatchOutcome::Submitted(Submission::new(vec!["Flaming Sword".into()]))
        );
    }

    #[test]
    fn test_prefill_submits_unchanged() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::Rename, "Sword", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);
        assert_eq!(
            adapter.match_submission(&click(7, 2), &surface, session, &mut progress),
            MatchOutcome::Submitted(Submission::new(vec!["Sword".into()]))
        );
    }

    #[test]
    fn test_empty_buffer_does_not_submit() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::Rename, "", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);
        assert_eq!(adapter.match_submission(&click(7, 2), &surface, session, &mut progress), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_foreign_session_never_matches() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::Rename, "Sword", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);
        assert_eq!(
            adapter.match_submission(&click(7, 2), &surface, SessionId::new(), &mut progress),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_client_close() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::Rename, "x", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);
        let close = RawPacket::new(0x09, BytesMut::from(&[7u8][..]));
        assert_eq!(adapter.match_submission(&close, &surface, session, &mut progress), MatchOutcome::Closed);
    }

    #[test]
    fn test_garbage_is_no_match() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let surface = adapter.build_surface(&player(), PromptKind::MultiLineText, "", session).unwrap();
        let mut progress = MatchProgress::for_surface(&surface);
        let truncated = RawPacket::new(0x26, BytesMut::from(&[1u8, 2][..]));
        assert_eq!(
            adapter.match_submission(&truncated, &surface, session, &mut progress),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_revert_sequences() {
        let session = SessionId::new();
        let adapter = adapter_1_13();
        let anvil = adapter.build_surface(&player(), PromptKind::Rename, "", session).unwrap();
        let revert = adapter.encode_revert_sequence(&anvil).unwrap();
        assert_eq!(revert.len(), 1);
        assert_eq!(revert[0].id, 0x13);

        let sign = adapter.build_surface(&player(), PromptKind::MultiLineText, "", session).unwrap();
        let revert = adapter.encode_revert_sequence(&sign).unwrap();
        assert_eq!(revert[0].id, 0x0B);
        let mut data = revert[0].data.clone();
        read_position(&mut data, PositionLayout::Legacy).unwrap();
        assert_eq!(read_varint(&mut data).unwrap(), 0);
    }
}
