//! GPU texture creation for decoded tiles.
//!
//! The host application owns the graphics device and exposes it through the
//! [`TextureDevice`] trait. [`materialize`] never creates or stores a device;
//! it only issues the two resource-creation calls a tile needs.

use std::fmt;

use thiserror::Error;

use crate::ErrorKind;

mod materialize;
mod software;

pub use materialize::{MaterializeError, materialize};
pub use software::{SoftwareDevice, SoftwareTexture, SoftwareView};

/// Bytes per texel of [`TextureFormat::Rgba8Unorm`].
pub const RGBA8_TEXEL_SIZE: u32 = 4;

/// Texel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalised channels in R, G, B, A order.
    Rgba8Unorm,
}

/// How the GPU may access a texture after creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    /// GPU read/write, no CPU access; contents fixed by the initial data.
    #[default]
    Default,
    /// GPU read only.
    Immutable,
}

/// Pipeline stages a texture can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureBinding {
    /// Sampled by shaders through a shader-resource view.
    ShaderResource,
}

/// Parameters for a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Number of array slices.
    pub array_size: u32,
    /// Texel layout.
    pub format: TextureFormat,
    /// Multisample count.
    pub sample_count: u32,
    /// Access pattern.
    pub usage: TextureUsage,
    /// Bind point.
    pub binding: TextureBinding,
    /// Whether the CPU may map the texture.
    pub cpu_access: bool,
}

impl TextureDescriptor {
    /// Single-level, shader-readable RGBA8 texture of the given size.
    #[must_use]
    pub const fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            array_size: 1,
            format: TextureFormat::Rgba8Unorm,
            sample_count: 1,
            usage: TextureUsage::Default,
            binding: TextureBinding::ShaderResource,
            cpu_access: false,
        }
    }

    /// Tightly packed row length in bytes, if it fits `u32`.
    #[must_use]
    pub const fn packed_row_pitch(&self) -> Option<u32> {
        match self.format {
            TextureFormat::Rgba8Unorm => self.width.checked_mul(RGBA8_TEXEL_SIZE),
        }
    }
}

/// Initial contents for the top mip level.
#[derive(Clone, Copy)]
pub struct SubresourceData<'a> {
    /// Texel bytes, row after row.
    pub pixels: &'a [u8],
    /// Distance in bytes between the starts of consecutive rows.
    pub row_pitch: u32,
}

impl fmt::Debug for SubresourceData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubresourceData")
            .field("len", &self.pixels.len())
            .field("row_pitch", &self.row_pitch)
            .finish()
    }
}

/// Parameters for a shader-resource view over a whole 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderResourceViewDescriptor {
    /// Texel layout seen by shaders.
    pub format: TextureFormat,
    /// Highest-resolution mip visible through the view.
    pub most_detailed_mip: u32,
    /// Number of mips visible through the view.
    pub mip_levels: u32,
}

impl ShaderResourceViewDescriptor {
    /// View covering every mip of `texture`.
    #[must_use]
    pub const fn for_texture(texture: &TextureDescriptor) -> Self {
        Self {
            format: texture.format,
            most_detailed_mip: 0,
            mip_levels: texture.mip_levels,
        }
    }
}

/// Device call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOperation {
    /// Creating the texture resource.
    CreateTexture,
    /// Creating the shader-resource view.
    CreateShaderResourceView,
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateTexture => "texture creation",
            Self::CreateShaderResourceView => "shader-resource view creation",
        })
    }
}

/// A graphics device refused a resource-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {reason}")]
pub struct DeviceError {
    /// Call that failed.
    pub operation: DeviceOperation,
    /// Device-supplied explanation.
    pub reason: String,
}

impl DeviceError {
    /// Construct an error for `operation`.
    #[must_use]
    pub fn new(operation: DeviceOperation, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::GpuResource
    }
}

/// Graphics device capable of creating sampleable 2D textures.
///
/// Resources are released when the returned handles are dropped. A view
/// keeps its texture alive, so callers may drop the texture handle as soon as
/// the view exists.
pub trait TextureDevice {
    /// Texture resource handle.
    type Texture;
    /// Shader-resource view handle.
    type View;

    /// Create a texture whose top level is initialised from `initial`.
    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        initial: &SubresourceData<'_>,
    ) -> Result<Self::Texture, DeviceError>;

    /// Create a view through which shaders sample `texture`.
    fn create_shader_resource_view(
        &self,
        texture: &Self::Texture,
        descriptor: &ShaderResourceViewDescriptor,
    ) -> Result<Self::View, DeviceError>;
}

impl<D> TextureDevice for &D
where
    D: TextureDevice + ?Sized,
{
    type Texture = D::Texture;
    type View = D::View;

    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        initial: &SubresourceData<'_>,
    ) -> Result<Self::Texture, DeviceError> {
        (**self).create_texture_2d(descriptor, initial)
    }

    fn create_shader_resource_view(
        &self,
        texture: &Self::Texture,
        descriptor: &ShaderResourceViewDescriptor,
    ) -> Result<Self::View, DeviceError> {
        (**self).create_shader_resource_view(texture, descriptor)
    }
}

/// Sampleable texture produced for one tile.
///
/// Dropping the value releases the view and, with it, the device resource.
#[derive(Debug)]
pub struct Texture<V> {
    view: V,
    width: u32,
    height: u32,
}

impl<V> Texture<V> {
    pub(crate) const fn new(view: V, width: u32, height: u32) -> Self {
        Self {
            view,
            width,
            height,
        }
    }

    /// Shader-resource view handle.
    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }

    /// Width in texels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in texels.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Give up the wrapper and keep only the view handle.
    #[must_use]
    pub fn into_view(self) -> V {
        self.view
    }

    /// Release the view, and with it the device resource, now.
    pub fn release(self) {
        drop(self.view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rgba8_descriptor_matches_tile_defaults() {
        let descriptor = TextureDescriptor::rgba8(256, 128);
        assert_eq!(descriptor.mip_levels, 1);
        assert_eq!(descriptor.array_size, 1);
        assert_eq!(descriptor.sample_count, 1);
        assert_eq!(descriptor.usage, TextureUsage::Default);
        assert_eq!(descriptor.binding, TextureBinding::ShaderResource);
        assert!(!descriptor.cpu_access);
        assert_eq!(descriptor.packed_row_pitch(), Some(1024));
    }

    #[rstest]
    fn row_pitch_overflow_is_detected() {
        assert_eq!(TextureDescriptor::rgba8(u32::MAX, 1).packed_row_pitch(), None);
    }

    #[rstest]
    fn view_descriptor_covers_every_mip() {
        let texture = TextureDescriptor::rgba8(4, 4);
        let view = ShaderResourceViewDescriptor::for_texture(&texture);
        assert_eq!(view.most_detailed_mip, 0);
        assert_eq!(view.mip_levels, 1);
        assert_eq!(view.format, TextureFormat::Rgba8Unorm);
    }

    #[rstest]
    fn device_error_names_the_operation() {
        let err = DeviceError::new(DeviceOperation::CreateTexture, "out of memory");
        assert_eq!(err.to_string(), "texture creation failed: out of memory");
        assert_eq!(err.kind(), ErrorKind::GpuResource);
    }

    #[rstest]
    fn texture_hands_back_its_view() {
        let texture = Texture::new("view", 8, 4);
        assert_eq!(*texture.view(), "view");
        assert_eq!(texture.dimensions(), (8, 4));
        assert_eq!(texture.into_view(), "view");
    }
}
