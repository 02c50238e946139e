use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
	#[error("failed to read texture asset {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to decode texture asset {path}")]
	Decode {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},
}

/// Decoded pixel data, always RGBA8 (4 bytes per texel).
pub struct TextureImage {
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<u8>,
}

/// Where texture pixels come from. The registry only ever asks for a
/// texture by name; the source decides how that maps to storage.
pub trait AssetSource {
	fn load(&self, name: &str) -> Result<TextureImage, AssetError>;
}

/// Loads `<root>/<name>.png` from disk.
pub struct DirSource {
	root: PathBuf,
}

impl DirSource {
	pub fn new<P: AsRef<Path>>(root: P) -> Self {
		Self {
			root: root.as_ref().to_path_buf(),
		}
	}

	fn path_for(&self, name: &str) -> PathBuf {
		self.root.join(format!("{}.png", name))
	}
}

impl AssetSource for DirSource {
	fn load(&self, name: &str) -> Result<TextureImage, AssetError> {
		let path = self.path_for(name);
		let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
			path: path.clone(),
			source,
		})?;
		let img = image::load_from_memory(&bytes)
			.map_err(|source| AssetError::Decode { path, source })?;
		let rgba = img.to_rgba8();
		Ok(TextureImage {
			width: rgba.width(),
			height: rgba.height(),
			pixels: rgba.into_raw(),
		})
	}
}
