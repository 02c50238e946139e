use hashbrown::HashMap;
use log::{debug, info};
use thiserror::Error;

use crate::assets::{AssetError, AssetSource};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("texture array is full ({capacity} layers)")]
    CapacityExceeded { capacity: u32 },
    #[error("failed to load texture {name:?}")]
    AssetLoad {
        name: String,
        #[source]
        source: AssetError,
    },
    #[error("texture {name:?} is {actual:?}, registry layers are {expected:?}")]
    DimensionMismatch {
        name: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("registry is sealed; textures can only be registered during startup")]
    Sealed,
}

/// The GPU side of the registry: somewhere to put pixels, addressed by a
/// zero-based layer index. Uploading one layer must not disturb any other.
pub trait ArrayBackend {
    fn upload_layer(&mut self, layer: u32, pixels: &[u8]);
    fn generate_mipmaps(&mut self);
}

/// Assigns each named texture a stable layer inside one 2D-array texture.
///
/// One instance is shared by every block definition. Names are deduplicated:
/// the first registration of a name uploads its pixels and claims the next
/// free layer, every later registration returns the same index without
/// touching the GPU. Layer indices follow insertion order and never change.
///
/// The registry starts out building and is expected to be [`seal`]ed once
/// the block catalog is complete; registering a new name after that is an
/// error rather than a silent mid-frame upload.
///
/// [`seal`]: TextureRegistry::seal
pub struct TextureRegistry<B: ArrayBackend> {
    backend: B,
    source: Box<dyn AssetSource>,
    layer_width: u32,
    layer_height: u32,
    capacity: u32,
    names: Vec<String>,
    layer_by_name: HashMap<String, u32>,
    sealed: bool,
}

impl<B: ArrayBackend> TextureRegistry<B> {
    pub fn new(
        backend: B,
        source: Box<dyn AssetSource>,
        layer_width: u32,
        layer_height: u32,
        capacity: u32,
    ) -> Self {
        Self {
            backend,
            source,
            layer_width,
            layer_height,
            capacity,
            names: Vec::new(),
            layer_by_name: HashMap::new(),
            sealed: false,
        }
    }

    /// Returns the layer index for `name`, uploading it first if this is the
    /// first time the name is seen. Nothing is mutated on failure: a name
    /// only claims a layer once its pixels are loaded, checked and uploaded.
    pub fn register(&mut self, name: &str) -> Result<u32, RegistryError> {
        if let Some(&layer) = self.layer_by_name.get(name) {
            return Ok(layer);
        }
        if self.sealed {
            return Err(RegistryError::Sealed);
        }
        if self.names.len() as u32 >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let img = self
            .source
            .load(name)
            .map_err(|source| RegistryError::AssetLoad {
                name: name.to_string(),
                source,
            })?;
        if (img.width, img.height) != (self.layer_width, self.layer_height) {
            return Err(RegistryError::DimensionMismatch {
                name: name.to_string(),
                expected: (self.layer_width, self.layer_height),
                actual: (img.width, img.height),
            });
        }
        let layer = self.names.len() as u32;
        self.backend.upload_layer(layer, &img.pixels);
        debug!("texture {:?} -> layer {}", name, layer);
        self.names.push(name.to_string());
        self.layer_by_name.insert(name.to_string(), layer);
        Ok(layer)
    }

    pub fn layer_index_of(&self, name: &str) -> Option<u32> {
        self.layer_by_name.get(name).copied()
    }

    /// Regenerates the mip chain for the whole array. Idempotent.
    pub fn generate_mipmaps(&mut self) {
        self.backend.generate_mipmaps();
    }

    /// Ends the build phase: generates mipmaps and rejects any further
    /// registration of new names. Looking up or re-registering an existing
    /// name keeps working, since neither mutates anything.
    pub fn seal(&mut self) {
        self.backend.generate_mipmaps();
        self.sealed = true;
        info!(
            "texture registry sealed with {}/{} layers in use",
            self.names.len(),
            self.capacity
        );
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Registered names in layer order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{registry_16x16 as registry, CountingBackend, FakeSource};

    #[test]
    fn register_is_idempotent_and_uploads_once() {
        let mut reg = registry(8);
        let a = reg.register("stone").unwrap();
        let b = reg.register("stone").unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.backend().uploads, vec![0]);
    }

    #[test]
    fn layers_follow_insertion_order() {
        let mut reg = registry(8);
        assert_eq!(reg.register("grass").unwrap(), 0);
        assert_eq!(reg.register("dirt").unwrap(), 1);
        assert_eq!(reg.register("grass").unwrap(), 0);
        assert_eq!(reg.register("cobblestone").unwrap(), 2);
        assert_eq!(reg.names(), ["grass", "dirt", "cobblestone"]);
    }

    #[test]
    fn capacity_boundary() {
        let mut reg = registry(3);
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(reg.register(name).unwrap(), i as u32);
        }
        match reg.register("d") {
            Err(RegistryError::CapacityExceeded { capacity }) => assert_eq!(capacity, 3),
            other => panic!("expected CapacityExceeded, got {:?}", other),
        }
        // The full registry still answers for registered names.
        assert_eq!(reg.register("b").unwrap(), 1);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn dimension_mismatch_leaves_state_unchanged() {
        let mut reg = TextureRegistry::new(
            CountingBackend::default(),
            Box::new(FakeSource::sized(16, 16).with_override("tall", 16, 17)),
            16,
            16,
            8,
        );
        reg.register("stone").unwrap();
        let before = reg.len();
        match reg.register("tall") {
            Err(RegistryError::DimensionMismatch { expected, actual, .. }) => {
                assert_eq!(expected, (16, 16));
                assert_eq!(actual, (16, 17));
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
        assert_eq!(reg.len(), before);
        assert_eq!(reg.backend().uploads, vec![0]);
        // The failed name claimed no layer; the next one gets index 1.
        assert_eq!(reg.register("dirt").unwrap(), 1);
    }

    #[test]
    fn sealed_registry_rejects_new_names_only() {
        let mut reg = registry(8);
        let stone = reg.register("stone").unwrap();
        reg.seal();
        assert!(reg.is_sealed());
        assert!(matches!(reg.register("dirt"), Err(RegistryError::Sealed)));
        // Existing names resolve fine after sealing, with no new upload.
        assert_eq!(reg.register("stone").unwrap(), stone);
        assert_eq!(reg.layer_index_of("stone"), Some(stone));
        assert_eq!(reg.backend().uploads.len(), 1);
        assert_eq!(reg.backend().mipmap_passes, 1);
    }

    #[test]
    fn generate_mipmaps_is_repeatable() {
        let mut reg = registry(8);
        reg.register("stone").unwrap();
        reg.generate_mipmaps();
        reg.generate_mipmaps();
        assert_eq!(reg.backend().mipmap_passes, 2);
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let reg = registry(8);
        assert_eq!(reg.layer_index_of("nope"), None);
    }
}
