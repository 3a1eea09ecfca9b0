use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub static TEXTURE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot read texture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("texture {name} is {width}x{height} but got {len} bytes of RGBA data")]
    SizeMismatch {
        name: String,
        width: u32,
        height: u32,
        len: usize,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Emission,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] = [TextureKind::Diffuse, TextureKind::Specular, TextureKind::Emission];

    /// Bit used in the material map mask and the binding slot in the material set.
    pub fn slot(&self) -> usize {
        match self {
            TextureKind::Diffuse => 0,
            TextureKind::Specular => 1,
            TextureKind::Emission => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "Diffuse",
            TextureKind::Specular => "Specular",
            TextureKind::Emission => "Emission",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SamplerDesc {
    pub wrap: Wrap,
    pub min: Filter,
    pub mag: Filter,
}

#[derive(Debug)]
pub struct Texture {
    pub id: u64,
    pub name: String,
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub sampler: SamplerDesc,
}

impl Texture {
    pub fn from_rgba(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let name = name.into();

        if pixels.len() != width as usize * height as usize * 4 {
            return Err(TextureError::SizeMismatch {
                name,
                width,
                height,
                len: pixels.len(),
            });
        }

        Ok(Self {
            id: TEXTURE_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            name,
            path: None,
            width,
            height,
            pixels,
            sampler: SamplerDesc::default(),
        })
    }

    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            id: TEXTURE_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
            path: None,
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
            sampler: SamplerDesc::default(),
        }
    }

    /// Decodes an image file into RGBA8, first row at the bottom.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_owned(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let mut texture = Self::decode(name, &bytes).map_err(|source| TextureError::Decode {
            path: path.to_owned(),
            source,
        })?;
        texture.path = Some(path.to_owned());

        Ok(texture)
    }

    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(bytes)?.flipv().into_rgba8();
        let (width, height) = image.dimensions();

        Ok(Self {
            id: TEXTURE_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
            path: None,
            width,
            height,
            pixels: image.into_raw(),
            sampler: SamplerDesc::default(),
        })
    }

    pub fn with_sampler(mut self, sampler: SamplerDesc) -> Self {
        self.sampler = sampler;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn rgba_size_is_validated() {
        let ok = Texture::from_rgba("ok", 2, 2, vec![0; 16]);
        assert!(ok.is_ok());

        let bad = Texture::from_rgba("bad", 2, 2, vec![0; 15]);
        assert!(matches!(bad, Err(TextureError::SizeMismatch { len: 15, .. })));
    }

    #[test]
    fn solid_is_single_pixel() {
        let t = Texture::solid("white", [255, 255, 255, 255]);

        assert_eq!((t.width, t.height), (1, 1));
        assert_eq!(t.pixels, vec![255, 255, 255, 255]);
        assert_eq!(t.sampler, SamplerDesc::default());
    }

    #[test]
    fn decode_flips_rows() {
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let t = Texture::decode("strip", &encode_png(&image)).unwrap();

        assert_eq!((t.width, t.height), (1, 2));
        assert_eq!(&t.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&t.pixels[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(Texture::decode("junk", b"definitely not an image").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let res = Texture::load("/nonexistent/glint/texture.png");
        assert!(matches!(res, Err(TextureError::Io { .. })));
    }

    #[test]
    fn ids_increase() {
        let a = Texture::solid("a", [0; 4]);
        let b = Texture::solid("b", [0; 4]);
        assert!(b.id > a.id);
    }

    #[test]
    fn kinds_map_to_distinct_slots() {
        let slots = TextureKind::ALL.map(|k| k.slot());
        assert_eq!(slots, [0, 1, 2]);
    }
}
