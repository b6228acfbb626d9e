//! # Texture: Image Files to GPU Textures
//!
//! Decoding and uploading are split so the decode half can be tested without
//! a GPU.
//!
//! ## Channel Count → Format
//!
//! | Channels | Decoded as   | GPU format       |
//! |----------|--------------|------------------|
//! | 1        | red          | `R8Unorm`        |
//! | 2        | luma + alpha | `Rgba8UnormSrgb` |
//! | 3        | RGB          | `Rgba8UnormSrgb` |
//! | 4        | RGBA         | `Rgba8UnormSrgb` |
//!
//! wgpu has no 3-channel 8-bit format, so RGB and luma-alpha data are
//! expanded to RGBA before upload.
//!
//! ## Failure
//!
//! Images wider or taller than the device's `max_texture_dimension_2d`, and
//! non-square cubemap faces, are rejected before any texture is created.
//!
//! Loaders return [`AssetError`]. [`load_or_white`] is the caller-side policy
//! for the diffuse maps: log the error and bind a 1×1 white texture instead.
//! A cubemap face that fails to load becomes a black face of the right size.

use std::path::{Path, PathBuf};

use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use crate::error::AssetError;

/// Pixel layout of a decoded image, from its channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::Red),
            2 => Some(PixelFormat::LumaAlpha),
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }

    /// The GPU format the pixels are uploaded as.
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Red => wgpu::TextureFormat::R8Unorm,
            _ => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// An image decoded into upload-ready bytes.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Layout of the source file.
    pub format: PixelFormat,
    /// One byte per pixel for [`PixelFormat::Red`], four otherwise.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Expand to RGBA8. Red images become `(r, 0, 0, 255)`.
    pub fn into_rgba8(self) -> Vec<u8> {
        match self.format {
            PixelFormat::Red => self.pixels.iter().flat_map(|&r| [r, 0, 0, 255]).collect(),
            _ => self.pixels,
        }
    }
}

/// Decode an image file, choosing the pixel layout from its channel count.
pub fn decode_image(path: &Path) -> Result<DecodedImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = image.color().channel_count();
    let format = PixelFormat::from_channels(channels).ok_or(AssetError::UnsupportedChannels {
        path: path.to_path_buf(),
        channels,
    })?;

    let (width, height) = (image.width(), image.height());
    let pixels = match format {
        PixelFormat::Red => image.into_luma8().into_raw(),
        _ => image.into_rgba8().into_raw(),
    };

    Ok(DecodedImage {
        width,
        height,
        format,
        pixels,
    })
}

/// Reject images the device cannot hold in one 2D texture.
pub fn check_texture_size(path: &Path, size: (u32, u32), max: u32) -> Result<(), AssetError> {
    if size.0 > max || size.1 > max {
        return Err(AssetError::TextureTooLarge {
            path: path.to_path_buf(),
            size,
            max,
        });
    }
    Ok(())
}

/// Decode an image and check it against the device's 2D size limit.
pub fn decode_texture(path: &Path, max_dimension: u32) -> Result<DecodedImage, AssetError> {
    let image = decode_image(path)?;
    check_texture_size(path, (image.width, image.height), max_dimension)?;
    Ok(image)
}

/// A 2D texture ready to bind.
pub(crate) struct GpuTexture {
    pub view: wgpu::TextureView,
}

/// Upload a decoded image as a 2D texture.
pub(crate) fn upload_2d(gpu: &GpuContext, label: &str, image: &DecodedImage) -> GpuTexture {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: image.format.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &image.pixels,
    );
    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
    }
}

/// A 1×1 white texture.
pub(crate) fn white(gpu: &GpuContext) -> GpuTexture {
    let pixel = DecodedImage {
        width: 1,
        height: 1,
        format: PixelFormat::Rgba,
        pixels: vec![255; 4],
    };
    upload_2d(gpu, "white 1x1", &pixel)
}

/// Load a 2D texture, or log the failure and use a white placeholder.
pub(crate) fn load_or_white(gpu: &GpuContext, path: &Path) -> GpuTexture {
    match decode_texture(path, gpu.device.limits().max_texture_dimension_2d) {
        Ok(image) => {
            log::debug!(
                "Loaded texture '{}' ({}x{}, {:?})",
                path.display(),
                image.width,
                image.height,
                image.format
            );
            upload_2d(gpu, &path.display().to_string(), &image)
        }
        Err(e) => {
            log::warn!("{e}; using white placeholder");
            white(gpu)
        }
    }
}

/// Six RGBA8 faces of equal size, in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug)]
pub struct CubemapFaces {
    pub size: (u32, u32),
    pub pixels: Vec<u8>,
}

/// Decode six face images into one layer-major RGBA8 buffer.
///
/// The first face that decodes fixes the face size, which must be square and
/// at most `max_dimension`. A later face that fails to decode, or whose size
/// differs, is logged and filled with black.
pub fn assemble_cubemap(faces: &[PathBuf], max_dimension: u32) -> Result<CubemapFaces, AssetError> {
    if faces.len() != 6 {
        return Err(AssetError::CubemapFaceCount(faces.len()));
    }

    let decoded: Vec<_> = faces.iter().map(|path| decode_image(path)).collect();
    let first = faces
        .iter()
        .zip(&decoded)
        .find_map(|(path, face)| face.as_ref().ok().map(|img| (path, (img.width, img.height))));
    let size = match first {
        Some((path, (w, h))) => {
            if w != h {
                return Err(AssetError::CubemapFaceSize {
                    path: path.clone(),
                    expected: (w, w),
                    actual: (w, h),
                });
            }
            check_texture_size(path, (w, h), max_dimension)?;
            (w, h)
        }
        None => (1, 1),
    };
    let face_bytes = (size.0 * size.1 * 4) as usize;

    let mut pixels = Vec::with_capacity(face_bytes * 6);
    for (path, face) in faces.iter().zip(decoded) {
        let face = face.and_then(|img| {
            if (img.width, img.height) == size {
                Ok(img)
            } else {
                Err(AssetError::CubemapFaceSize {
                    path: path.clone(),
                    expected: size,
                    actual: (img.width, img.height),
                })
            }
        });
        match face {
            Ok(img) => pixels.extend(img.into_rgba8()),
            Err(e) => {
                log::warn!("{e}; using black face");
                pixels.extend([0u8, 0, 0, 255].repeat(face_bytes / 4));
            }
        }
    }

    Ok(CubemapFaces { size, pixels })
}

/// Upload six faces as a cube texture and return a cube view of it.
pub(crate) fn upload_cubemap(gpu: &GpuContext, faces: &CubemapFaces) -> wgpu::TextureView {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some("skybox cubemap"),
            size: wgpu::Extent3d {
                width: faces.size.0,
                height: faces.size.1,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &faces.pixels,
    );
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("skybox cube view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("umbra-{}-{name}", std::process::id()))
    }

    #[test]
    fn channel_count_selects_format() {
        assert_eq!(PixelFormat::from_channels(1), Some(PixelFormat::Red));
        assert_eq!(PixelFormat::from_channels(4), Some(PixelFormat::Rgba));
        assert_eq!(PixelFormat::from_channels(5), None);
        assert_eq!(PixelFormat::Red.texture_format(), wgpu::TextureFormat::R8Unorm);
        assert_eq!(PixelFormat::Rgb.texture_format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn four_channel_png_takes_rgba_path() {
        let path = temp_path("rgba.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 40]))
            .save(&path)
            .unwrap();
        let decoded = decode_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.format, PixelFormat::Rgba);
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 40]);
    }

    #[test]
    fn one_channel_png_takes_red_path() {
        let path = temp_path("gray.png");
        image::GrayImage::from_pixel(4, 4, image::Luma([200])).save(&path).unwrap();
        let decoded = decode_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.format, PixelFormat::Red);
        assert_eq!(decoded.pixels.len(), 16);
        assert_eq!(decoded.into_rgba8()[..4], [200, 0, 0, 255]);
    }

    #[test]
    fn three_channel_png_expands_to_rgba() {
        let path = temp_path("rgb.png");
        image::RgbImage::from_pixel(1, 1, image::Rgb([1, 2, 3])).save(&path).unwrap();
        let decoded = decode_image(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.format, PixelFormat::Rgb);
        assert_eq!(decoded.pixels, [1, 2, 3, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = decode_image(Path::new("/nonexistent/umbra/cube.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }), "got {err}");
    }

    #[test]
    fn garbage_file_is_image_error() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = decode_image(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, AssetError::Image { .. }), "got {err}");
    }

    #[test]
    fn cubemap_needs_six_faces() {
        let faces = vec![PathBuf::from("a.png"); 5];
        assert!(matches!(assemble_cubemap(&faces, 8192), Err(AssetError::CubemapFaceCount(5))));
    }

    #[test]
    fn cubemap_missing_face_is_black() {
        let good = temp_path("face.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]))
            .save(&good)
            .unwrap();
        let mut faces = vec![good.clone(); 6];
        faces[3] = PathBuf::from("/nonexistent/umbra/bottom.jpg");

        let cubemap = assemble_cubemap(&faces, 8192).unwrap();
        std::fs::remove_file(&good).ok();

        assert_eq!(cubemap.size, (2, 2));
        let face_bytes = 2 * 2 * 4;
        assert_eq!(cubemap.pixels.len(), face_bytes * 6);
        let bottom = &cubemap.pixels[3 * face_bytes..4 * face_bytes];
        assert!(bottom.chunks(4).all(|p| p == [0, 0, 0, 255]), "face 3 should be black");
        let top = &cubemap.pixels[2 * face_bytes..3 * face_bytes];
        assert!(top.iter().all(|&b| b == 255));
    }

    #[test]
    fn cubemap_rejects_non_square_faces() {
        let wide = temp_path("wide-face.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([9, 9, 9, 255]))
            .save(&wide)
            .unwrap();
        let faces = vec![wide.clone(); 6];

        let err = assemble_cubemap(&faces, 8192).unwrap_err();
        std::fs::remove_file(&wide).ok();

        match err {
            AssetError::CubemapFaceSize { expected, actual, .. } => {
                assert_eq!(expected, (4, 4));
                assert_eq!(actual, (4, 2));
            }
            other => panic!("expected a face size error, got {other}"),
        }
    }

    #[test]
    fn cubemap_rejects_faces_over_device_limit() {
        let big = temp_path("big-face.png");
        image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]))
            .save(&big)
            .unwrap();
        let faces = vec![big.clone(); 6];

        let err = assemble_cubemap(&faces, 4).unwrap_err();
        std::fs::remove_file(&big).ok();
        assert!(
            matches!(err, AssetError::TextureTooLarge { size: (8, 8), max: 4, .. }),
            "got {err}"
        );
    }

    #[test]
    fn oversized_texture_is_rejected_before_upload() {
        let path = temp_path("oversized.png");
        image::RgbaImage::from_pixel(6, 3, image::Rgba([1, 1, 1, 1]))
            .save(&path)
            .unwrap();

        let err = decode_texture(&path, 5).unwrap_err();
        let ok = decode_texture(&path, 6);
        std::fs::remove_file(&path).ok();

        assert!(
            matches!(err, AssetError::TextureTooLarge { size: (6, 3), max: 5, .. }),
            "got {err}"
        );
        let ok = ok.unwrap();
        assert_eq!((ok.width, ok.height), (6, 3));
    }
}
