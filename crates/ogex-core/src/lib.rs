//! ogex core library
//!
//! Common math types and the unified error type shared by the
//! OpenDDL data model, the encoders and the OpenGEX exporter.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
