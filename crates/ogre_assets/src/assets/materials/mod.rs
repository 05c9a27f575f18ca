//! Material script parsing subsystem
//!
//! Turns brace-delimited material scripts into a name-keyed map of
//! [`MaterialDescriptor`], with texture slots patched asynchronously when
//! the external asset source resolves them.

pub mod descriptor;
pub mod script_parser;
pub mod script_scanner;
pub mod texture;

pub use descriptor::{
    ColorChannel, ColorChannels, MaterialDescriptor, MaterialDescriptorBuilder, UNNAMED_MATERIAL,
};
pub use script_parser::MaterialScriptParser;
pub use script_scanner::ScriptScanner;
pub use texture::{
    placeholder_texture, ResolvedTexture, TextureError, TextureFormat, TextureHandle,
    TextureImage, TextureSlot,
};

use thiserror::Error;

/// Fatal material-script parse failures.
///
/// Any of these aborts the current script entirely; scripts parsed by other
/// calls are unaffected.
#[derive(Error, Debug)]
pub enum MaterialScriptError {
    /// IO error reading a script file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `}` encountered with no section open
    #[error("statement {line}: unmatched '}}' outside any material section")]
    UnmatchedBrace {
        /// 1-based index into the normalized statement stream
        line: usize,
    },

    /// A section would nest deeper than the grammar allows
    #[error("statement {line}: section nesting exceeds the supported depth")]
    NestingTooDeep {
        /// 1-based index into the normalized statement stream
        line: usize,
    },
}
