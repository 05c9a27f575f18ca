//! Texture data and the single-fire resolution slot
//!
//! A material descriptor is renderable the moment its section closes: its
//! texture slot points at a process-wide 1x1 placeholder until the external
//! asset source delivers the real pixels, at which point the slot is patched
//! exactly once.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

/// Alpha-test cutoff applied when a resolved texture format carries alpha.
const ALPHA_TEST_CUTOFF: f32 = 0.5;

/// Failure to decode resolved texture bytes.
#[derive(Error, Debug)]
pub enum TextureError {
    /// The byte stream was not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Pixel format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGB, no alpha
    Rgb8,
    /// 8-bit RGBA
    Rgba8,
    /// BC1 block compression, treated as opaque
    Dxt1,
    /// BC2 block compression with explicit alpha
    Dxt3,
    /// BC3 block compression with interpolated alpha
    Dxt5,
}

impl TextureFormat {
    /// Whether pixels in this format carry usable alpha.
    pub fn carries_alpha(self) -> bool {
        matches!(self, Self::Rgba8 | Self::Dxt3 | Self::Dxt5)
    }
}

/// Decoded texture pixels plus their format tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format of `data`
    pub format: TextureFormat,
    /// Raw pixel data
    pub data: Vec<u8>,
}

impl TextureImage {
    /// Decode an encoded image (PNG etc.) into pixel data.
    ///
    /// Sources with an alpha channel decode to [`TextureFormat::Rgba8`],
    /// opaque sources to [`TextureFormat::Rgb8`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = (decoded.width(), decoded.height());

        let (format, data) = if decoded.color().has_alpha() {
            (TextureFormat::Rgba8, decoded.to_rgba8().into_raw())
        } else {
            (TextureFormat::Rgb8, decoded.to_rgb8().into_raw())
        };

        log::debug!("decoded {}x{} texture ({:?})", width, height, format);

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create a solid color image (useful for defaults and tests)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            data,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Shared handle to immutable texture pixels.
pub type TextureHandle = Arc<TextureImage>;

static PLACEHOLDER: OnceLock<TextureHandle> = OnceLock::new();

/// Process-wide 1x1 white placeholder used until a requested texture resolves.
///
/// Built once and read-only thereafter, so any number of in-flight materials
/// may reference it.
pub fn placeholder_texture() -> TextureHandle {
    PLACEHOLDER
        .get_or_init(|| Arc::new(TextureImage::solid_color(1, 1, [255, 255, 255, 255])))
        .clone()
}

/// Texture state installed by a completed asset request.
#[derive(Debug, Clone)]
pub struct ResolvedTexture {
    /// The resolved texture pixels
    pub texture: TextureHandle,
    /// Whether the material should be treated as transparent
    pub transparent: bool,
    /// Alpha-test cutoff, set when the format carries alpha
    pub alpha_test: Option<f32>,
}

/// Single-fire texture slot on a material descriptor.
///
/// Starts at the shared placeholder. [`TextureSlot::resolve`] installs the
/// real texture at most once; later calls are ignored. Descriptors hold the
/// slot behind `Arc` so a parse result already handed to the caller can
/// still be patched by a late completion.
#[derive(Debug, Default)]
pub struct TextureSlot {
    resolved: OnceLock<ResolvedTexture>,
}

impl TextureSlot {
    /// Install the resolved texture. Returns `false` if the slot had already
    /// been resolved, in which case nothing changes.
    pub fn resolve(&self, image: TextureImage) -> bool {
        let transparent = image.format.carries_alpha();
        let resolved = ResolvedTexture {
            texture: Arc::new(image),
            transparent,
            alpha_test: transparent.then_some(ALPHA_TEST_CUTOFF),
        };
        self.resolved.set(resolved).is_ok()
    }

    /// Current texture: the resolved one if the completion fired, the shared
    /// placeholder otherwise.
    pub fn texture(&self) -> TextureHandle {
        self.resolved
            .get()
            .map_or_else(placeholder_texture, |resolved| resolved.texture.clone())
    }

    /// Whether the resolved texture marked the material transparent.
    pub fn transparent(&self) -> bool {
        self.resolved
            .get()
            .is_some_and(|resolved| resolved.transparent)
    }

    /// Alpha-test cutoff derived from the resolved texture format.
    pub fn alpha_test(&self) -> Option<f32> {
        self.resolved.get().and_then(|resolved| resolved.alpha_test)
    }

    /// Whether a real texture has been installed.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = TextureImage::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_placeholder_is_shared_one_by_one_pixel() {
        let a = placeholder_texture();
        let b = placeholder_texture();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.width, 1);
        assert_eq!(a.height, 1);
    }

    #[test]
    fn test_alpha_bearing_formats() {
        assert!(TextureFormat::Rgba8.carries_alpha());
        assert!(TextureFormat::Dxt3.carries_alpha());
        assert!(TextureFormat::Dxt5.carries_alpha());
        assert!(!TextureFormat::Rgb8.carries_alpha());
        assert!(!TextureFormat::Dxt1.carries_alpha());
    }

    #[test]
    fn test_slot_defaults_to_placeholder() {
        let slot = TextureSlot::default();
        assert!(!slot.is_resolved());
        assert!(Arc::ptr_eq(&slot.texture(), &placeholder_texture()));
        assert!(!slot.transparent());
        assert_eq!(slot.alpha_test(), None);
    }

    #[test]
    fn test_slot_resolves_once() {
        let slot = TextureSlot::default();
        assert!(slot.resolve(TextureImage::solid_color(2, 2, [0, 0, 0, 255])));
        let first = slot.texture();
        assert_eq!(first.width, 2);

        // Second resolution must not replace the first
        assert!(!slot.resolve(TextureImage::solid_color(8, 8, [1, 1, 1, 255])));
        assert!(Arc::ptr_eq(&slot.texture(), &first));
    }

    #[test]
    fn test_alpha_resolution_sets_transparency() {
        let slot = TextureSlot::default();
        slot.resolve(TextureImage::solid_color(1, 1, [0, 0, 0, 128]));
        assert!(slot.transparent());
        assert_eq!(slot.alpha_test(), Some(0.5));
    }

    #[test]
    fn test_opaque_resolution_leaves_transparency_unset() {
        let slot = TextureSlot::default();
        let image = TextureImage {
            width: 1,
            height: 1,
            format: TextureFormat::Rgb8,
            data: vec![10, 20, 30],
        };
        slot.resolve(image);
        assert!(slot.is_resolved());
        assert!(!slot.transparent());
        assert_eq!(slot.alpha_test(), None);
    }

    #[test]
    fn test_from_bytes_roundtrip_png() {
        use std::io::Cursor;

        let source = image::RgbaImage::from_pixel(2, 3, image::Rgba([5, 6, 7, 200]));
        let mut encoded = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let decoded = TextureImage::from_bytes(&encoded).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 3);
        assert_eq!(decoded.format, TextureFormat::Rgba8);
        assert_eq!(&decoded.data[0..4], &[5, 6, 7, 200]);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(TextureImage::from_bytes(&[1, 2, 3, 4]).is_err());
    }
}
