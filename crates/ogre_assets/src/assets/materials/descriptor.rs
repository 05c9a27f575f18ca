//! Material descriptors and the builder that accumulates script state

use std::sync::Arc;

use crate::foundation::math::Vec3;

use super::texture::{TextureHandle, TextureSlot};

/// Name given to materials whose declaration omits one.
pub const UNNAMED_MATERIAL: &str = "unnamed";

/// A shading color channel of a material pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    /// Ambient reflectance
    Ambient,
    /// Diffuse reflectance
    Diffuse,
    /// Specular reflectance
    Specular,
    /// Self-illumination
    Emissive,
}

/// Optional shading color channels of a material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorChannels {
    /// Ambient RGB, if the script set one
    pub ambient: Option<Vec3>,
    /// Diffuse RGB, if the script set one
    pub diffuse: Option<Vec3>,
    /// Specular RGB, if the script set one
    pub specular: Option<Vec3>,
    /// Emissive RGB, if the script set one
    pub emissive: Option<Vec3>,
}

impl ColorChannels {
    /// Write one channel.
    pub fn set(&mut self, channel: ColorChannel, value: Vec3) {
        match channel {
            ColorChannel::Ambient => self.ambient = Some(value),
            ColorChannel::Diffuse => self.diffuse = Some(value),
            ColorChannel::Specular => self.specular = Some(value),
            ColorChannel::Emissive => self.emissive = Some(value),
        }
    }
}

/// Validated material state handed to the shading layer.
///
/// Immutable except for its texture slot, which an asynchronous resolution
/// may patch exactly once after the descriptor has already been returned.
#[derive(Debug, Clone)]
pub struct MaterialDescriptor {
    /// Material name (map key in the parse output)
    pub name: String,
    /// Shading color channels set by the script
    pub channels: ColorChannels,
    /// Whether the material receives shadows
    pub receive_shadow: bool,
    slot: Arc<TextureSlot>,
}

impl MaterialDescriptor {
    /// Current texture: resolved if the request completed, the shared
    /// placeholder otherwise.
    pub fn texture(&self) -> TextureHandle {
        self.slot.texture()
    }

    /// Whether a resolved texture marked this material transparent.
    pub fn transparent(&self) -> bool {
        self.slot.transparent()
    }

    /// Alpha-test cutoff derived from a resolved texture format.
    pub fn alpha_test(&self) -> Option<f32> {
        self.slot.alpha_test()
    }

    /// Whether the texture request has completed.
    pub fn texture_resolved(&self) -> bool {
        self.slot.is_resolved()
    }

    /// The shared slot a late texture completion patches.
    pub fn texture_slot(&self) -> &Arc<TextureSlot> {
        &self.slot
    }
}

/// Accumulates per-section properties until the material section closes.
#[derive(Debug, Default)]
pub struct MaterialDescriptorBuilder {
    name: Option<String>,
    channels: ColorChannels,
    receive_shadow: bool,
    texture_ref: Option<String>,
}

impl MaterialDescriptorBuilder {
    /// Start accumulating a material, named or not.
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Write one shading color channel.
    pub fn set_color(&mut self, channel: ColorChannel, value: Vec3) {
        self.channels.set(channel, value);
    }

    /// Set the shadow-receive flag.
    pub fn set_receive_shadow(&mut self, on: bool) {
        self.receive_shadow = on;
    }

    /// Record the texture reference from a `texture_unit` section.
    pub fn set_texture_ref(&mut self, name: impl Into<String>) {
        self.texture_ref = Some(name.into());
    }

    /// Finalize into a descriptor plus the texture reference to resolve, if
    /// the script bound one.
    pub fn finish(self) -> (MaterialDescriptor, Option<String>) {
        let descriptor = MaterialDescriptor {
            name: self.name.unwrap_or_else(|| UNNAMED_MATERIAL.to_string()),
            channels: self.channels,
            receive_shadow: self.receive_shadow,
            slot: Arc::new(TextureSlot::default()),
        };
        (descriptor, self.texture_ref)
    }
}
