//! Decode compressed tile bytes and upload them as a texture.

use log::debug;
use thiserror::Error;

use super::{
    DeviceError, DeviceOperation, ShaderResourceViewDescriptor, SubresourceData, Texture,
    TextureDescriptor, TextureDevice,
};
use crate::ErrorKind;

/// Error raised while turning encoded bytes into a texture.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The bytes are not a supported image.
    #[error("failed to decode tile image: {source}")]
    Decode {
        /// Decoder failure.
        #[source]
        source: image::ImageError,
    },
    /// The image decoded to zero width or height.
    #[error("decoded tile image is empty ({width}x{height})")]
    EmptyImage {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
    /// The device refused to create a resource.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl MaterializeError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } | Self::EmptyImage { .. } => ErrorKind::Decode,
            Self::Device(_) => ErrorKind::GpuResource,
        }
    }
}

/// Decode `encoded` and create a sampleable RGBA8 texture on `device`.
///
/// The format is sniffed from the bytes. Pixels are expanded to four
/// channels, uploaded as a single mip level with a tightly packed row pitch,
/// and exposed through a shader-resource view. The intermediate texture
/// handle is released before returning; the view keeps the resource alive.
///
/// Nothing is allocated on the device when decoding fails.
///
/// # Errors
///
/// Returns [`MaterializeError::Decode`] or [`MaterializeError::EmptyImage`]
/// for unusable bytes and [`MaterializeError::Device`] when either device
/// call fails.
///
/// # Examples
///
/// ```
/// use tessera_core::test_support::noise_png;
/// use tessera_core::{SoftwareDevice, materialize};
///
/// let device = SoftwareDevice::new();
/// let texture = materialize(&device, &noise_png(64, 32))?;
/// assert_eq!(texture.dimensions(), (64, 32));
/// assert_eq!(texture.view().pixels().len(), 64 * 32 * 4);
/// # Ok::<(), tessera_core::MaterializeError>(())
/// ```
pub fn materialize<D>(device: &D, encoded: &[u8]) -> Result<Texture<D::View>, MaterializeError>
where
    D: TextureDevice + ?Sized,
{
    let rgba = image::load_from_memory(encoded)
        .map_err(|source| MaterializeError::Decode { source })?
        .into_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(MaterializeError::EmptyImage { width, height });
    }

    let descriptor = TextureDescriptor::rgba8(width, height);
    let row_pitch = descriptor.packed_row_pitch().ok_or_else(|| {
        DeviceError::new(
            DeviceOperation::CreateTexture,
            format!("row pitch for width {width} overflows"),
        )
    })?;
    let initial = SubresourceData {
        pixels: rgba.as_raw(),
        row_pitch,
    };

    let texture = device.create_texture_2d(&descriptor, &initial)?;
    let view = device
        .create_shader_resource_view(&texture, &ShaderResourceViewDescriptor::for_texture(&descriptor))?;
    drop(texture);

    debug!("materialized {width}x{height} tile texture");
    Ok(Texture::new(view, width, height))
}
