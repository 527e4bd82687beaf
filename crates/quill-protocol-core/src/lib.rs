pub mod codec;
pub mod packets;
pub mod dialect;
pub mod connection;
pub mod pipeline;

pub use codec::*;
pub use packets::*;
pub use dialect::*;
pub use connection::{
    decode_frame, encode_frame, Connection, ConnectionReader, ConnectionWriter, MAX_DATA_LENGTH, MAX_FRAME_LENGTH,
};
pub use pipeline::{InboundFilter, Pipeline, PipelineError};
