//! Test doubles shared by the registry and catalog unit tests.

use crate::assets::{AssetError, AssetSource, TextureImage};
use crate::registry::{ArrayBackend, TextureRegistry};

/// Backend double that only counts uploads per layer.
#[derive(Default)]
pub struct CountingBackend {
    pub uploads: Vec<u32>,
    pub mipmap_passes: u32,
}

impl ArrayBackend for CountingBackend {
    fn upload_layer(&mut self, layer: u32, _pixels: &[u8]) {
        self.uploads.push(layer);
    }

    fn generate_mipmaps(&mut self) {
        self.mipmap_passes += 1;
    }
}

/// Asset source double that synthesizes an image of the given size for any
/// name, with optional per-name size overrides.
pub struct FakeSource {
    default_size: (u32, u32),
    overrides: Vec<(String, (u32, u32))>,
}

impl FakeSource {
    pub fn sized(w: u32, h: u32) -> Self {
        Self {
            default_size: (w, h),
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, name: &str, w: u32, h: u32) -> Self {
        self.overrides.push((name.to_string(), (w, h)));
        self
    }
}

impl AssetSource for FakeSource {
    fn load(&self, name: &str) -> Result<TextureImage, AssetError> {
        let (w, h) = self
            .overrides
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| *s)
            .unwrap_or(self.default_size);
        Ok(TextureImage {
            width: w,
            height: h,
            pixels: vec![0u8; (w * h * 4) as usize],
        })
    }
}

/// A 16x16 registry over counting/fake doubles, the default test fixture.
pub fn registry_16x16(capacity: u32) -> TextureRegistry<CountingBackend> {
    TextureRegistry::new(
        CountingBackend::default(),
        Box::new(FakeSource::sized(16, 16)),
        16,
        16,
        capacity,
    )
}
