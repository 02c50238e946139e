use hashbrown::HashMap;
use thiserror::Error;

use crate::registry::{ArrayBackend, RegistryError, TextureRegistry};

pub type BlockId = u16;

/// A face of a block that can be asked for a texture. `Sides` covers all
/// four lateral faces; the original tutorial never textures them separately.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    Top,
    Bottom,
    Sides,
}

/// Which texture goes on which face of a block. Unset faces fall back to
/// `all`; a face with neither is a definition bug surfaced at resolve time.
#[derive(Clone, Debug, Default)]
pub struct FaceTextures {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub sides: Option<String>,
    pub all: Option<String>,
}

impl FaceTextures {
    pub fn uniform(all: &str) -> Self {
        Self {
            all: Some(all.to_string()),
            ..Self::default()
        }
    }

    pub fn top_bottom_sides(top: &str, bottom: &str, sides: &str) -> Self {
        Self {
            top: Some(top.to_string()),
            bottom: Some(bottom.to_string()),
            sides: Some(sides.to_string()),
            all: None,
        }
    }

    /// Specific face first, then the `all` fallback.
    fn texture_for(&self, face: Face) -> Option<&str> {
        let specific = match face {
            Face::Top => self.top.as_deref(),
            Face::Bottom => self.bottom.as_deref(),
            Face::Sides => self.sides.as_deref(),
        };
        specific.or(self.all.as_deref())
    }

    /// Every texture name this block mentions, duplicates included (the
    /// registry deduplicates anyway).
    fn names(&self) -> impl Iterator<Item = &str> {
        [&self.top, &self.bottom, &self.sides, &self.all]
            .into_iter()
            .filter_map(|n| n.as_deref())
    }
}

/// Immutable block record. Holds texture *names*, never layer indices; the
/// indices live in the registry and are looked up when meshes are built.
pub struct Block {
    pub name: String,
    pub faces: FaceTextures,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("block face {0:?} has no texture and no \"all\" fallback")]
    UnresolvedFace(Face),
    #[error("texture {0:?} was never registered; define blocks through the catalog before resolving")]
    UnregisteredTexture(String),
}

/// All known block types, in definition order. Defining a block is what
/// drives texture upload: every name in its face map goes through
/// [`TextureRegistry::register`] before the block is recorded.
#[derive(Default)]
pub struct BlockCatalog {
    blocks: Vec<Block>,
    by_name: HashMap<String, BlockId>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the block's textures and records the block. If any
    /// registration fails the block is not added.
    pub fn define<B: ArrayBackend>(
        &mut self,
        registry: &mut TextureRegistry<B>,
        name: &str,
        faces: FaceTextures,
    ) -> Result<BlockId, RegistryError> {
        for texture in faces.names() {
            registry.register(texture)?;
        }
        let id = self.blocks.len() as BlockId;
        self.by_name.insert(name.to_string(), id);
        self.blocks.push(Block {
            name: name.to_string(),
            faces,
        });
        Ok(id)
    }

    /// Face label -> texture name -> layer index. `UnregisteredTexture`
    /// here means the define-then-resolve ordering was broken somewhere;
    /// treat it as a programmer error, not something to recover from.
    pub fn resolve_face_layer<B: ArrayBackend>(
        &self,
        registry: &TextureRegistry<B>,
        block: &Block,
        face: Face,
    ) -> Result<u32, ResolveError> {
        let texture = block
            .faces
            .texture_for(face)
            .ok_or(ResolveError::UnresolvedFace(face))?;
        registry
            .layer_index_of(texture)
            .ok_or_else(|| ResolveError::UnregisteredTexture(texture.to_string()))
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TextureRegistry;
    use crate::testutil::{registry_16x16, CountingBackend};

    fn resolve(
        catalog: &BlockCatalog,
        registry: &TextureRegistry<CountingBackend>,
        block: &str,
        face: Face,
    ) -> Result<u32, ResolveError> {
        let id = catalog.id_by_name(block).unwrap();
        catalog.resolve_face_layer(registry, catalog.get(id).unwrap(), face)
    }

    #[test]
    fn all_fallback_covers_every_face() {
        let mut reg = registry_16x16(256);
        let mut catalog = BlockCatalog::new();
        catalog
            .define(&mut reg, "stone", FaceTextures::uniform("stone"))
            .unwrap();
        let stone_layer = reg.layer_index_of("stone").unwrap();
        for face in [Face::Top, Face::Bottom, Face::Sides] {
            assert_eq!(resolve(&catalog, &reg, "stone", face).unwrap(), stone_layer);
        }
    }

    #[test]
    fn specific_faces_win_over_fallback() {
        let mut reg = registry_16x16(256);
        let mut catalog = BlockCatalog::new();
        catalog
            .define(
                &mut reg,
                "grass",
                FaceTextures::top_bottom_sides("grass", "dirt", "grass_side"),
            )
            .unwrap();
        assert_eq!(
            resolve(&catalog, &reg, "grass", Face::Bottom).unwrap(),
            reg.layer_index_of("dirt").unwrap()
        );
        assert_eq!(
            resolve(&catalog, &reg, "grass", Face::Top).unwrap(),
            reg.layer_index_of("grass").unwrap()
        );
    }

    #[test]
    fn missing_face_without_fallback_is_unresolved() {
        let mut reg = registry_16x16(256);
        let mut catalog = BlockCatalog::new();
        catalog
            .define(
                &mut reg,
                "slab",
                FaceTextures {
                    top: Some("stone".to_string()),
                    ..FaceTextures::default()
                },
            )
            .unwrap();
        let err = resolve(&catalog, &reg, "slab", Face::Sides).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedFace(Face::Sides)));
    }

    #[test]
    fn resolving_an_unregistered_name_is_an_invariant_violation() {
        let reg = registry_16x16(256);
        let catalog = BlockCatalog::new();
        // A block that never went through define().
        let rogue = Block {
            name: "rogue".to_string(),
            faces: FaceTextures::uniform("never_loaded"),
        };
        let err = catalog
            .resolve_face_layer(&reg, &rogue, Face::Top)
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnregisteredTexture(n) if n == "never_loaded"));
    }

    #[test]
    fn failed_definition_adds_no_block() {
        // Capacity 1: the second distinct texture cannot be registered.
        let mut reg = registry_16x16(1);
        let mut catalog = BlockCatalog::new();
        catalog
            .define(&mut reg, "dirt", FaceTextures::uniform("dirt"))
            .unwrap();
        let err = catalog.define(
            &mut reg,
            "grass",
            FaceTextures::top_bottom_sides("grass", "dirt", "grass_side"),
        );
        assert!(err.is_err());
        assert!(catalog.id_by_name("grass").is_none());
        assert_eq!(catalog.blocks().len(), 1);
    }
}
