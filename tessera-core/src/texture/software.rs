//! Host-memory texture device.
//!
//! Validates descriptors the way a hardware driver would and keeps texel
//! data in ordinary allocations. Used by the command-line tools and tests,
//! and as a fallback when no GPU is available.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbaImage;
use log::trace;

use super::{
    DeviceError, DeviceOperation, RGBA8_TEXEL_SIZE, ShaderResourceViewDescriptor, SubresourceData,
    TextureDescriptor, TextureDevice, TextureFormat,
};

/// Largest width or height accepted for a 2D texture.
pub const MAX_TEXTURE_DIMENSION: u32 = 16_384;

/// Texture device backed by host memory.
///
/// Clones share the same allocation counter.
///
/// # Examples
///
/// ```
/// use tessera_core::SoftwareDevice;
///
/// let device = SoftwareDevice::new();
/// assert_eq!(device.live_textures(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SoftwareDevice {
    live: Arc<AtomicUsize>,
}

impl SoftwareDevice {
    /// Create a device with no resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of texture resources currently alive.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct Resource {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    live: Arc<AtomicUsize>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        trace!("released {}x{} software texture", self.width, self.height);
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish_non_exhaustive()
    }
}

/// Texture created by [`SoftwareDevice`].
#[derive(Debug)]
pub struct SoftwareTexture {
    resource: Arc<Resource>,
}

/// Shader-resource view created by [`SoftwareDevice`].
///
/// Holds a reference to the texture, which stays allocated until every view
/// and texture handle is dropped.
#[derive(Debug, Clone)]
pub struct SoftwareView {
    resource: Arc<Resource>,
}

impl SoftwareView {
    /// Width in texels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.resource.width
    }

    /// Height in texels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.resource.height
    }

    /// Bytes per row of [`Self::pixels`].
    #[must_use]
    pub fn row_pitch(&self) -> u32 {
        self.resource.width * RGBA8_TEXEL_SIZE
    }

    /// Tightly packed RGBA8 texels.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.resource.pixels
    }

    /// Copy the texels into an owned image.
    #[must_use]
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(
            self.resource.width,
            self.resource.height,
            self.resource.pixels.clone(),
        )
    }
}

fn texture_error(reason: impl Into<String>) -> DeviceError {
    DeviceError::new(DeviceOperation::CreateTexture, reason)
}

fn view_error(reason: impl Into<String>) -> DeviceError {
    DeviceError::new(DeviceOperation::CreateShaderResourceView, reason)
}

fn validate_descriptor(descriptor: &TextureDescriptor) -> Result<u32, DeviceError> {
    let TextureDescriptor {
        width,
        height,
        mip_levels,
        array_size,
        sample_count,
        ..
    } = *descriptor;
    if width == 0 || height == 0 {
        return Err(texture_error(format!("empty extent {width}x{height}")));
    }
    if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
        return Err(texture_error(format!(
            "extent {width}x{height} exceeds {MAX_TEXTURE_DIMENSION}"
        )));
    }
    if mip_levels != 1 || array_size != 1 || sample_count != 1 {
        return Err(texture_error(format!(
            "unsupported layout: {mip_levels} mips, {array_size} slices, {sample_count} samples"
        )));
    }
    if descriptor.cpu_access {
        return Err(texture_error("CPU access is not supported"));
    }
    descriptor
        .packed_row_pitch()
        .ok_or_else(|| texture_error("row pitch overflows"))
}

/// Copy the visible part of each row, dropping any padding.
fn pack_rows(
    initial: &SubresourceData<'_>,
    packed_pitch: u32,
    height: u32,
) -> Result<Vec<u8>, DeviceError> {
    if initial.row_pitch < packed_pitch {
        return Err(texture_error(format!(
            "row pitch {} is shorter than a row of {packed_pitch} bytes",
            initial.row_pitch
        )));
    }
    let pitch = initial.row_pitch as usize;
    let row_len = packed_pitch as usize;
    let rows = height as usize;
    let required = pitch * (rows - 1) + row_len;
    if initial.pixels.len() < required {
        return Err(texture_error(format!(
            "initial data holds {} bytes, need {required}",
            initial.pixels.len()
        )));
    }

    let mut pixels = Vec::with_capacity(row_len * rows);
    for row in initial.pixels.chunks(pitch).take(rows) {
        let visible = row
            .get(..row_len)
            .ok_or_else(|| texture_error("initial data ends mid-row"))?;
        pixels.extend_from_slice(visible);
    }
    Ok(pixels)
}

impl TextureDevice for SoftwareDevice {
    type Texture = SoftwareTexture;
    type View = SoftwareView;

    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        initial: &SubresourceData<'_>,
    ) -> Result<SoftwareTexture, DeviceError> {
        let packed_pitch = validate_descriptor(descriptor)?;
        let pixels = pack_rows(initial, packed_pitch, descriptor.height)?;

        self.live.fetch_add(1, Ordering::SeqCst);
        trace!(
            "allocated {}x{} software texture",
            descriptor.width, descriptor.height
        );
        Ok(SoftwareTexture {
            resource: Arc::new(Resource {
                width: descriptor.width,
                height: descriptor.height,
                pixels,
                live: Arc::clone(&self.live),
            }),
        })
    }

    fn create_shader_resource_view(
        &self,
        texture: &SoftwareTexture,
        descriptor: &ShaderResourceViewDescriptor,
    ) -> Result<SoftwareView, DeviceError> {
        if !Arc::ptr_eq(&texture.resource.live, &self.live) {
            return Err(view_error("texture belongs to another device"));
        }
        if descriptor.format != TextureFormat::Rgba8Unorm {
            return Err(view_error("view format does not match texture"));
        }
        let end = descriptor
            .most_detailed_mip
            .saturating_add(descriptor.mip_levels);
        if descriptor.mip_levels == 0 || end > 1 {
            return Err(view_error(format!(
                "mip range {}..{end} is outside the texture",
                descriptor.most_detailed_mip
            )));
        }
        Ok(SoftwareView {
            resource: Arc::clone(&texture.resource),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn device() -> SoftwareDevice {
        SoftwareDevice::new()
    }

    fn solid(width: u32, height: u32) -> Vec<u8> {
        vec![0x7f; (width * height * RGBA8_TEXEL_SIZE) as usize]
    }

    #[rstest]
    fn creates_texture_and_view(device: SoftwareDevice) {
        let descriptor = TextureDescriptor::rgba8(4, 2);
        let pixels = solid(4, 2);
        let initial = SubresourceData {
            pixels: &pixels,
            row_pitch: 16,
        };
        let texture = device
            .create_texture_2d(&descriptor, &initial)
            .expect("create texture");
        let view = device
            .create_shader_resource_view(
                &texture,
                &ShaderResourceViewDescriptor::for_texture(&descriptor),
            )
            .expect("create view");
        assert_eq!((view.width(), view.height()), (4, 2));
        assert_eq!(view.pixels(), pixels.as_slice());
        assert_eq!(device.live_textures(), 1);

        drop(texture);
        assert_eq!(device.live_textures(), 1, "view keeps the texture alive");
        drop(view);
        assert_eq!(device.live_textures(), 0);
    }

    #[rstest]
    fn padded_rows_are_packed(device: SoftwareDevice) {
        let descriptor = TextureDescriptor::rgba8(1, 2);
        let pixels = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        let initial = SubresourceData {
            pixels: &pixels,
            row_pitch: 8,
        };
        let texture = device
            .create_texture_2d(&descriptor, &initial)
            .expect("create texture");
        assert_eq!(texture.resource.pixels, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[rstest]
    #[case(TextureDescriptor::rgba8(0, 4))]
    #[case(TextureDescriptor::rgba8(MAX_TEXTURE_DIMENSION + 1, 1))]
    #[case(TextureDescriptor { mip_levels: 2, ..TextureDescriptor::rgba8(4, 4) })]
    #[case(TextureDescriptor { sample_count: 4, ..TextureDescriptor::rgba8(4, 4) })]
    #[case(TextureDescriptor { cpu_access: true, ..TextureDescriptor::rgba8(4, 4) })]
    fn rejects_unsupported_descriptors(device: SoftwareDevice, #[case] descriptor: TextureDescriptor) {
        let pixels = solid(4, 4);
        let initial = SubresourceData {
            pixels: &pixels,
            row_pitch: 16,
        };
        let err = device
            .create_texture_2d(&descriptor, &initial)
            .expect_err("invalid descriptor");
        assert_eq!(err.operation, DeviceOperation::CreateTexture);
        assert_eq!(device.live_textures(), 0);
    }

    #[rstest]
    #[case(8, 16)]
    #[case(16, 63)]
    fn rejects_short_initial_data(device: SoftwareDevice, #[case] row_pitch: u32, #[case] len: usize) {
        let pixels = vec![0; len];
        let initial = SubresourceData {
            pixels: &pixels,
            row_pitch,
        };
        let err = device
            .create_texture_2d(&TextureDescriptor::rgba8(4, 4), &initial)
            .expect_err("short data");
        assert_eq!(err.operation, DeviceOperation::CreateTexture);
    }

    #[rstest]
    fn rejects_views_from_another_device(device: SoftwareDevice) {
        let descriptor = TextureDescriptor::rgba8(1, 1);
        let pixels = solid(1, 1);
        let texture = device
            .create_texture_2d(
                &descriptor,
                &SubresourceData {
                    pixels: &pixels,
                    row_pitch: 4,
                },
            )
            .expect("create texture");
        let err = SoftwareDevice::new()
            .create_shader_resource_view(
                &texture,
                &ShaderResourceViewDescriptor::for_texture(&descriptor),
            )
            .expect_err("foreign texture");
        assert_eq!(err.operation, DeviceOperation::CreateShaderResourceView);
    }

    #[rstest]
    fn view_round_trips_to_image(device: SoftwareDevice) {
        let descriptor = TextureDescriptor::rgba8(2, 1);
        let pixels = [10, 20, 30, 40, 50, 60, 70, 80];
        let texture = device
            .create_texture_2d(
                &descriptor,
                &SubresourceData {
                    pixels: &pixels,
                    row_pitch: 8,
                },
            )
            .expect("create texture");
        let view = device
            .create_shader_resource_view(
                &texture,
                &ShaderResourceViewDescriptor::for_texture(&descriptor),
            )
            .expect("create view");
        let image = view.to_rgba_image().expect("image");
        assert_eq!(image.get_pixel(1, 0).0, [50, 60, 70, 80]);
    }
}
