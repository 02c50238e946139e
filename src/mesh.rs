use bytemuck::{Pod, Zeroable};
use cgmath::{Vector2, Vector3};
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, RenderPass};

use crate::block::{Block, BlockCatalog, Face, ResolveError};
use crate::registry::{ArrayBackend, TextureRegistry};

pub trait Vertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a>;
}

/// One corner of a block face. `layer` selects the slice of the texture
/// array the fragment shader samples from.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct BlockVertex {
    pub position: Vector3<f32>,
    pub tex_coord: Vector2<f32>,
    pub layer: u32,
}

unsafe impl Pod for BlockVertex {}

unsafe impl Zeroable for BlockVertex {}

impl Vertex for BlockVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        static ATTRIBS: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Uint32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BlockVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBS,
        }
    }
}

/*
       (-1, 1, -1) /-------------------| (1, 1, -1)
                 / |                  /|
               /   |                /  |
 (-1, 1, 1)  /     |    (1, 1, 1) /    |
            |------|------------|      |
            |      |            |      |
            |      |            |      |
            |      |------------|------| (1, -1, -1)
            |     /(-1, -1, -1) |     /
            |   /               |   /
            | /                 | /
(-1, -1, 1) |-------------------| (1, -1, 1)
   */

#[derive(Debug)]
/// An enum for the different faces of a cube to allow for easy toggling
pub enum Direction {
    FRONT, // 0, 0, 1
    BACK, // 0, 0, -1
    TOP, // 0, 1, 0
    BOTTOM, // 0, -1, 0
    LEFT, // -1, 0, 0
    RIGHT,  // 1, 0, 0
}

pub const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::FRONT,
    Direction::BACK,
    Direction::TOP,
    Direction::BOTTOM,
    Direction::LEFT,
    Direction::RIGHT,
];

impl Direction {
    /// Returns the vertices that make up the face in a cube.
    pub fn cube_verts(&self) -> [Vector3<f32>; 4] {
        match self {
            Direction::FRONT => [
                Vector3::new(-0.5, -0.5, 0.5),
                Vector3::new(0.5, -0.5, 0.5),
                Vector3::new(0.5, 0.5, 0.5),
                Vector3::new(-0.5, 0.5, 0.5),
            ],
            Direction::BACK => [
                Vector3::new(0.5, -0.5, -0.5),
                Vector3::new(-0.5, -0.5, -0.5),
                Vector3::new(-0.5, 0.5, -0.5),
                Vector3::new(0.5, 0.5, -0.5),
            ],
            Direction::TOP => [
                Vector3::new(-0.5, 0.5, 0.5),
                Vector3::new(0.5, 0.5, 0.5),
                Vector3::new(0.5, 0.5, -0.5),
                Vector3::new(-0.5, 0.5, -0.5),
            ],
            Direction::BOTTOM => [
                Vector3::new(-0.5, -0.5, -0.5),
                Vector3::new(0.5, -0.5, -0.5),
                Vector3::new(0.5, -0.5, 0.5),
                Vector3::new(-0.5, -0.5, 0.5),
            ],
            Direction::LEFT => [
                Vector3::new(-0.5, -0.5, -0.5),
                Vector3::new(-0.5, -0.5, 0.5),
                Vector3::new(-0.5, 0.5, 0.5),
                Vector3::new(-0.5, 0.5, -0.5),
            ],
            Direction::RIGHT => [
                Vector3::new(0.5, -0.5, 0.5),
                Vector3::new(0.5, -0.5, -0.5),
                Vector3::new(0.5, 0.5, -0.5),
                Vector3::new(0.5, 0.5, 0.5),
            ],
        }
    }

    /// Which texture slot of the block this face samples.
    pub fn face_label(&self) -> Face {
        match self {
            Direction::TOP => Face::Top,
            Direction::BOTTOM => Face::Bottom,
            _ => Face::Sides,
        }
    }
}

// Same corner order as cube_verts: bottom-left, bottom-right, top-right,
// top-left, so v is flipped (texture origin is top-left).
const FACE_UVS: [Vector2<f32>; 4] = [
    Vector2::new(0.0, 1.0),
    Vector2::new(1.0, 1.0),
    Vector2::new(1.0, 0.0),
    Vector2::new(0.0, 0.0),
];

const FACE_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Builds the unit-cube mesh for one block, resolving each face's texture
/// layer through the catalog.
pub fn build_block_mesh<B: ArrayBackend>(
    catalog: &BlockCatalog,
    registry: &TextureRegistry<B>,
    block: &Block,
) -> Result<(Vec<BlockVertex>, Vec<u32>), ResolveError> {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for direction in ALL_DIRECTIONS {
        let layer = catalog.resolve_face_layer(registry, block, direction.face_label())?;
        let base = vertices.len() as u32;
        for (position, tex_coord) in direction.cube_verts().into_iter().zip(FACE_UVS) {
            vertices.push(BlockVertex {
                position,
                tex_coord,
                layer,
            });
        }
        indices.extend(FACE_INDICES.iter().map(|i| base + i));
    }
    Ok((vertices, indices))
}

pub struct BlockMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
}

impl BlockMesh {
    pub fn new(device: &wgpu::Device, vertices: &[BlockVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("block vertex buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("block index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        }
    }
}

pub trait DrawBlockMesh<'a> {
    fn draw_block_mesh(
        &mut self,
        mesh: &'a BlockMesh,
        texture_bind_group: &'a BindGroup,
        camera_bind_group: &'a BindGroup,
    );
}

impl<'a, 'b> DrawBlockMesh<'b> for RenderPass<'a>
where
    'b: 'a,
{
    fn draw_block_mesh(
        &mut self,
        mesh: &'b BlockMesh,
        texture_bind_group: &'b BindGroup,
        camera_bind_group: &'b BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, texture_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::FaceTextures;
    use crate::testutil::registry_16x16;

    #[test]
    fn cube_mesh_uses_resolved_layers_per_face() {
        let mut reg = registry_16x16(256);
        let mut catalog = BlockCatalog::new();
        let id = catalog
            .define(
                &mut reg,
                "grass",
                FaceTextures::top_bottom_sides("grass", "dirt", "grass_side"),
            )
            .unwrap();
        let block = catalog.get(id).unwrap();
        let (vertices, indices) = build_block_mesh(&catalog, &reg, block).unwrap();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| i < 24));

        let grass = reg.layer_index_of("grass").unwrap();
        let dirt = reg.layer_index_of("dirt").unwrap();
        let side = reg.layer_index_of("grass_side").unwrap();
        // TOP is the third face in ALL_DIRECTIONS, BOTTOM the fourth.
        assert!(vertices[8..12].iter().all(|v| v.layer == grass));
        assert!(vertices[12..16].iter().all(|v| v.layer == dirt));
        assert!(vertices[0..4].iter().all(|v| v.layer == side));
        assert!(vertices[20..24].iter().all(|v| v.layer == side));
    }

    #[test]
    fn unresolved_face_aborts_mesh_build() {
        let mut reg = registry_16x16(256);
        let mut catalog = BlockCatalog::new();
        let id = catalog
            .define(
                &mut reg,
                "topless",
                FaceTextures {
                    sides: Some("stone".to_string()),
                    ..FaceTextures::default()
                },
            )
            .unwrap();
        let block = catalog.get(id).unwrap();
        let err = build_block_mesh(&catalog, &reg, block).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedFace(Face::Top)));
    }
}
