use anyhow::Result;
use bytes::BytesMut;
use quill_nbt::{nbt_compound, NbtValue};
use quill_protocol_core::*;
use quill_types::{plain_text_from_json, TextComponent};
use tracing::trace;

/// Plugin channel the pre-1.13 client uses for anvil text.
pub(crate) const ITEM_NAME_CHANNEL: &str = "MC|ItemName";

/// Longest sign line the server accepts.
pub(crate) const SIGN_LINE_LIMIT: usize = 384;

/// `display.Name` as a plain string (read this way before 1.13).
pub(crate) fn legacy_display(name: &TextComponent) -> NbtValue {
    nbt_compound! {
        "display" => nbt_compound! {
            "Name" => NbtValue::String(name.to_plain()),
        },
    }
}

/// `display.Name` as a JSON text component (1.13 onwards).
pub(crate) fn json_display(name: &TextComponent) -> NbtValue {
    nbt_compound! {
        "display" => nbt_compound! {
            "Name" => NbtValue::String(name.to_json()),
        },
    }
}

/// The four lines of an Update Sign packet. 1.8 sends JSON components.
pub(crate) fn read_sign_lines(data: &mut BytesMut, json: bool) -> Result<[String; 4]> {
    let mut lines: [String; 4] = Default::default();
    for line in lines.iter_mut() {
        let raw = read_string(data, SIGN_LINE_LIMIT)?;
        *line = if json { plain_text_from_json(&raw) } else { raw };
    }
    Ok(lines)
}

/// Decode a pre-1.13 plugin message. Only the item name channel is of interest.
pub(crate) fn decode_item_name_channel(data: &mut BytesMut) -> Result<Option<PromptPacket>> {
    let channel = read_string(data, 20)?;
    if channel != ITEM_NAME_CHANNEL {
        trace!("Ignoring plugin channel {}", channel);
        return Ok(None);
    }
    let name = read_string(data, 32767)?;
    Ok(Some(PromptPacket::RenameItem { name }))
}

pub(crate) fn serverbound_only(generation: &str, packet: &PromptPacket) -> anyhow::Error {
    anyhow::anyhow!("{}: {} is not a clientbound packet", generation, packet.name())
}

pub(crate) fn no_such_surface(generation: &str, packet: &PromptPacket) -> anyhow::Error {
    anyhow::anyhow!("{}: {} has no encoding in this generation", generation, packet.name())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_lines_flatten_json() {
        let mut data = BytesMut::new();
        for line in [r#"{"text":"a"}"#, r#""b""#, r#"{"text":"","extra":["c"]}"#, r#""""#] {
            write_string(&mut data, line);
        }
        assert_eq!(read_sign_lines(&mut data, true).unwrap(), ["a", "b", "c", ""].map(String::from));
    }

    #[test]
    fn test_other_channels_ignored() {
        let mut data = test_support::item_name_plugin(0, "MC|Brand", "vanilla").data;
        assert!(decode_item_name_channel(&mut data).unwrap().is_none());

        let mut data = test_support::item_name_plugin(0, ITEM_NAME_CHANNEL, "Blade").data;
        assert_eq!(
            decode_item_name_channel(&mut data).unwrap(),
            Some(PromptPacket::RenameItem { name: "Blade".into() })
        );
    }
}
