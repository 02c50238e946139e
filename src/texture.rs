use std::num::NonZeroU32;
use std::rc::Rc;

use image::imageops::FilterType;

use crate::registry::ArrayBackend;

/// GPU-resident 2D-array texture holding every registered block texture,
/// one per layer. Implements the registry's [`ArrayBackend`] seam.
///
/// wgpu has no built-in mipmap generation, so a CPU copy of each uploaded
/// layer is kept and the smaller mip levels are produced by downscaling
/// with the `image` crate whenever the chain is (re)generated.
pub struct TextureArray {
	queue: Rc<wgpu::Queue>,
	texture: wgpu::Texture,
	pub view: wgpu::TextureView,
	pub sampler: wgpu::Sampler,
	layer_width: u32,
	layer_height: u32,
	mip_level_count: u32,
	// CPU copies of mip 0 for each uploaded layer, indexed by layer.
	layer_pixels: Vec<Option<Vec<u8>>>,
}

impl TextureArray {
	pub fn new(
		device: &wgpu::Device,
		queue: Rc<wgpu::Queue>,
		layer_width: u32,
		layer_height: u32,
		capacity: u32,
	) -> Self {
		let mip_level_count = 32 - layer_width.max(layer_height).leading_zeros();
		let texture = device.create_texture(&wgpu::TextureDescriptor {
			label: Some("block texture array"),
			size: wgpu::Extent3d {
				width: layer_width,
				height: layer_height,
				depth_or_array_layers: capacity,
			},
			mip_level_count,
			sample_count: 1,
			dimension: wgpu::TextureDimension::D2,
			format: wgpu::TextureFormat::Rgba8UnormSrgb,
			usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
		});
		let view = texture.create_view(&wgpu::TextureViewDescriptor {
			dimension: Some(wgpu::TextureViewDimension::D2Array),
			..Default::default()
		});
		// Nearest filtering keeps the pixel-art look; mips still blend.
		let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
			address_mode_u: wgpu::AddressMode::ClampToEdge,
			address_mode_v: wgpu::AddressMode::ClampToEdge,
			address_mode_w: wgpu::AddressMode::ClampToEdge,
			mag_filter: wgpu::FilterMode::Nearest,
			min_filter: wgpu::FilterMode::Nearest,
			mipmap_filter: wgpu::FilterMode::Linear,
			..Default::default()
		});

		Self {
			queue,
			texture,
			view,
			sampler,
			layer_width,
			layer_height,
			mip_level_count,
			layer_pixels: vec![None; capacity as usize],
		}
	}

	fn write_level(&self, layer: u32, mip_level: u32, width: u32, height: u32, pixels: &[u8]) {
		self.queue.write_texture(
			wgpu::ImageCopyTexture {
				texture: &self.texture,
				mip_level,
				origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
				aspect: wgpu::TextureAspect::All,
			},
			pixels,
			wgpu::ImageDataLayout {
				offset: 0,
				bytes_per_row: NonZeroU32::new(4 * width),
				rows_per_image: NonZeroU32::new(height),
			},
			wgpu::Extent3d {
				width,
				height,
				depth_or_array_layers: 1,
			},
		);
	}
}

impl ArrayBackend for TextureArray {
	fn upload_layer(&mut self, layer: u32, pixels: &[u8]) {
		debug_assert_eq!(
			pixels.len(),
			(self.layer_width * self.layer_height * 4) as usize
		);
		self.write_level(layer, 0, self.layer_width, self.layer_height, pixels);
		self.layer_pixels[layer as usize] = Some(pixels.to_vec());
	}

	fn generate_mipmaps(&mut self) {
		for (layer, pixels) in self.layer_pixels.iter().enumerate() {
			let pixels = match pixels {
				Some(p) => p,
				None => continue,
			};
			let base = image::RgbaImage::from_raw(
				self.layer_width,
				self.layer_height,
				pixels.clone(),
			)
			.unwrap();
			for mip in 1..self.mip_level_count {
				let width = (self.layer_width >> mip).max(1);
				let height = (self.layer_height >> mip).max(1);
				let scaled = image::imageops::resize(&base, width, height, FilterType::Triangle);
				self.write_level(layer as u32, mip, width, height, &scaled);
			}
		}
	}
}

/// Depth buffer for the main render pass.
pub struct Texture {
	pub texture: wgpu::Texture,
	pub view: wgpu::TextureView,
	pub sampler: wgpu::Sampler,
}

impl Texture {
	pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

	pub fn create_depth_texture(
		device: &wgpu::Device,
		config: &wgpu::SurfaceConfiguration,
		label: &str,
	) -> Self {
		let size = wgpu::Extent3d {
			width: config.width,
			height: config.height,
			depth_or_array_layers: 1,
		};
		let desc = wgpu::TextureDescriptor {
			label: Some(label),
			size,
			mip_level_count: 1,
			sample_count: 1,
			dimension: wgpu::TextureDimension::D2,
			format: Self::DEPTH_FORMAT,
			usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
		};
		let texture = device.create_texture(&desc);

		let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
		let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
			address_mode_u: wgpu::AddressMode::ClampToEdge,
			address_mode_v: wgpu::AddressMode::ClampToEdge,
			address_mode_w: wgpu::AddressMode::ClampToEdge,
			mag_filter: wgpu::FilterMode::Linear,
			min_filter: wgpu::FilterMode::Linear,
			mipmap_filter: wgpu::FilterMode::Nearest,
			compare: Some(wgpu::CompareFunction::LessEqual),
			lod_min_clamp: 0.0,
			lod_max_clamp: 100.0,
			..Default::default()
		});

		Self {
			texture,
			view,
			sampler,
		}
	}
}
