mod text;
mod types;
mod version;

pub use text::*;
pub use types::*;
pub use version::*;
