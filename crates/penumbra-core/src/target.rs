//! Logical render targets and their descriptions

use crate::PipelineConfig;

/// Every off-screen target the pipeline owns. The discriminant is the
/// target's stable slot in the render target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    Canvas,
    Seed,
    FloodA,
    FloodB,
    DistanceField,
    CascadeA,
    CascadeB,
    LastFrame,
}

impl TargetId {
    pub const ALL: [TargetId; 8] = [
        TargetId::Canvas,
        TargetId::Seed,
        TargetId::FloodA,
        TargetId::FloodB,
        TargetId::DistanceField,
        TargetId::CascadeA,
        TargetId::CascadeB,
        TargetId::LastFrame,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TargetId::Canvas => "canvas",
            TargetId::Seed => "seed",
            TargetId::FloodA => "flood_a",
            TargetId::FloodB => "flood_b",
            TargetId::DistanceField => "distance_field",
            TargetId::CascadeA => "cascade_a",
            TargetId::CascadeB => "cascade_b",
            TargetId::LastFrame => "last_frame",
        }
    }

    pub fn slot(self) -> usize {
        self as usize
    }

    /// Targets whose contents carry over between frames
    pub fn is_persistent(self) -> bool {
        matches!(self, TargetId::Canvas | TargetId::LastFrame)
    }
}

/// Pixel storage of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
    /// Whatever format the presentation surface uses
    Presentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Parameters handed to the target factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub id: TargetId,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
}

impl RenderTargetDesc {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// Destination of a single draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrawTarget {
    Offscreen(TargetId),
    /// The frame being presented
    Screen,
}

impl DrawTarget {
    pub fn name(self) -> &'static str {
        match self {
            DrawTarget::Offscreen(id) => id.name(),
            DrawTarget::Screen => "screen",
        }
    }
}

/// What happens to a draw target's previous contents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetLoad {
    Clear([f32; 4]),
    /// Keep the contents and composite on top
    Preserve,
}

impl TargetLoad {
    pub const TRANSPARENT: TargetLoad = TargetLoad::Clear([0.0, 0.0, 0.0, 0.0]);
    pub const OPAQUE_BLACK: TargetLoad = TargetLoad::Clear([0.0, 0.0, 0.0, 1.0]);
}

/// The fixed target set for a run.
///
/// The last-frame target is always allocated so the cascade program has a
/// stable binding; it is only written when temporal feedback is enabled.
pub fn render_target_descs(config: &PipelineConfig) -> Vec<RenderTargetDesc> {
    let desc = |id, format, filter| RenderTargetDesc {
        id,
        width: config.width,
        height: config.height,
        format,
        filter,
    };
    vec![
        desc(TargetId::Canvas, PixelFormat::Rgba8Unorm, FilterMode::Nearest),
        desc(TargetId::Seed, PixelFormat::Rgba32Float, FilterMode::Nearest),
        desc(TargetId::FloodA, PixelFormat::Rgba32Float, FilterMode::Nearest),
        desc(TargetId::FloodB, PixelFormat::Rgba32Float, FilterMode::Nearest),
        desc(TargetId::DistanceField, PixelFormat::Rgba16Float, FilterMode::Nearest),
        desc(TargetId::CascadeA, PixelFormat::Rgba16Float, FilterMode::Linear),
        desc(TargetId::CascadeB, PixelFormat::Rgba16Float, FilterMode::Linear),
        desc(TargetId::LastFrame, PixelFormat::Presentation, FilterMode::Nearest),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_desc_per_target_in_slot_order() {
        let descs = render_target_descs(&PipelineConfig::default());
        assert_eq!(descs.len(), TargetId::ALL.len());
        for (slot, desc) in descs.iter().enumerate() {
            assert_eq!(desc.id.slot(), slot);
            assert_eq!((desc.width, desc.height), (800, 800));
        }
    }

    #[test]
    fn ping_pong_pairs_share_format() {
        let descs = render_target_descs(&PipelineConfig::default());
        let format = |id: TargetId| descs[id.slot()].format;
        assert_eq!(format(TargetId::FloodA), format(TargetId::FloodB));
        assert_eq!(format(TargetId::FloodA), format(TargetId::Seed));
        assert_eq!(format(TargetId::CascadeA), format(TargetId::CascadeB));
    }

    #[test]
    fn cascades_are_linearly_filtered() {
        let descs = render_target_descs(&PipelineConfig::default());
        assert_eq!(descs[TargetId::CascadeA.slot()].filter, FilterMode::Linear);
        assert_eq!(descs[TargetId::Canvas.slot()].filter, FilterMode::Nearest);
    }
}
