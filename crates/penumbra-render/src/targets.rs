//! Render target set: every off-screen texture the pipeline draws into

use log::{error, info};
use penumbra_core::{Error, FilterMode, PixelFormat, RenderTargetDesc, Result, TargetId};

/// One off-screen target with its view and sampler
pub struct GpuTarget {
    pub desc: RenderTargetDesc,
    pub format: wgpu::TextureFormat,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

pub fn resolve_format(format: PixelFormat, presentation: wgpu::TextureFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        PixelFormat::Presentation => presentation,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn target_error(desc: &RenderTargetDesc, reason: impl Into<String>) -> Error {
    Error::TargetConfiguration {
        name: desc.name(),
        reason: reason.into(),
    }
}

/// Create a render target, or explain why it cannot be drawn into
pub fn create_target(
    device: &wgpu::Device,
    desc: &RenderTargetDesc,
    presentation: wgpu::TextureFormat,
) -> Result<GpuTarget> {
    let format = resolve_format(desc.format, presentation);

    let max = device.limits().max_texture_dimension_2d;
    if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
        return Err(target_error(
            desc,
            format!("size {}x{} outside 1..={}", desc.width, desc.height, max),
        ));
    }

    let supported = format.guaranteed_format_features(device.features());
    let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
        | wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::COPY_DST;
    if !supported.allowed_usages.contains(usage) {
        return Err(target_error(
            desc,
            format!("{:?} does not support {:?}", format, usage),
        ));
    }
    if desc.filter == FilterMode::Linear
        && !supported
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
    {
        return Err(target_error(
            desc,
            format!("{:?} cannot be sampled with linear filtering", format),
        ));
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.name()),
        size: wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let filter = filter_mode(desc.filter);
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(desc.name()),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(target_error(desc, err.to_string()));
    }

    Ok(GpuTarget {
        desc: *desc,
        format,
        texture,
        view,
        sampler,
    })
}

/// Owns every off-screen target for the run; dropped with the renderer
pub struct RenderTargetSet {
    targets: Vec<GpuTarget>,
}

impl RenderTargetSet {
    pub fn new(
        device: &wgpu::Device,
        descs: &[RenderTargetDesc],
        presentation: wgpu::TextureFormat,
    ) -> Result<Self> {
        let mut targets = Vec::with_capacity(descs.len());
        for desc in descs {
            match create_target(device, desc, presentation) {
                Ok(target) => {
                    info!(
                        "Render target '{}': {}x{} {:?} ({:?} filtering)",
                        desc.name(),
                        desc.width,
                        desc.height,
                        target.format,
                        desc.filter
                    );
                    targets.push(target);
                }
                Err(err) => {
                    error!("{}", err);
                    return Err(err);
                }
            }
        }
        Ok(Self { targets })
    }

    pub fn get(&self, id: TargetId) -> Result<&GpuTarget> {
        self.targets
            .iter()
            .find(|target| target.desc.id == id)
            .ok_or_else(|| Error::setup(format!("render target '{}'", id.name()), "not created"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpuTarget> {
        self.targets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_format_follows_surface() {
        let surface = wgpu::TextureFormat::Bgra8UnormSrgb;
        assert_eq!(resolve_format(PixelFormat::Presentation, surface), surface);
        assert_eq!(
            resolve_format(PixelFormat::Rgba32Float, surface),
            wgpu::TextureFormat::Rgba32Float
        );
    }

    #[test]
    fn float32_targets_are_not_filterable_by_default() {
        let features = wgpu::TextureFormat::Rgba32Float.guaranteed_format_features(wgpu::Features::empty());
        assert!(!features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE));
        let features = wgpu::TextureFormat::Rgba16Float.guaranteed_format_features(wgpu::Features::empty());
        assert!(features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE));
    }
}
