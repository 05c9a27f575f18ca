//! # ogre_assets
//!
//! Parsers for the two companion text formats produced by OGRE-style
//! modeling toolchains:
//!
//! - **Mesh documents** (`.mesh.xml`): triangle-mesh geometry with vertex
//!   buffers, face index lists, and optional shared vertex pools across
//!   submeshes. Parsed into one [`assets::SubmeshRecord`] per submesh.
//! - **Material scripts** (`.material`): line-oriented, brace-delimited
//!   sections describing shading color channels, shadow flags, and texture
//!   unit bindings. Parsed into a name-keyed map of
//!   [`assets::MaterialDescriptor`].
//!
//! Both pipelines are synchronous and independent per call. The single
//! asynchronous element is texture resolution: descriptors are handed out
//! immediately with a shared placeholder texture, and an external
//! [`assets::AssetSource`] may patch each descriptor's texture slot exactly
//! once when its request completes.
//!
//! ## Quick start
//!
//! ```
//! use ogre_assets::prelude::*;
//!
//! let script = "material Hull\n{\n technique\n {\n  pass\n  {\n   diffuse 1 0 0\n  }\n }\n}\n";
//! let mut source = NullAssetSource;
//! let materials = MaterialScriptParser::parse(script, &mut source).unwrap();
//! assert!(materials.contains_key("Hull"));
//! ```

#![warn(missing_docs)]

pub mod assets;
pub mod foundation;

/// Common imports for crate users
pub mod prelude {
    pub use crate::assets::{
        materials::{
            placeholder_texture, MaterialDescriptor, MaterialScriptError, MaterialScriptParser,
            ScriptScanner, TextureFormat, TextureImage,
        },
        mesh::{
            FaceList, GeometryAssembler, GeometryBuffer, MeshDocumentParser, MeshParseError,
            SubmeshRecord, TriangleFace, VertexBuffer,
        },
        source::{AssetKind, AssetSource, Completion, NullAssetSource, RequestHandle},
    };
    pub use crate::foundation::math::{Vec2, Vec3};
}
