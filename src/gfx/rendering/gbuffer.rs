//! Geometry buffer of the deferred renderer
//!
//! Six textures in a fixed order: view-space position, normal, ambient,
//! diffuse, glossy color with shininess, and depth. The set is created once
//! at the window size and never resized.

use crate::{error::Result, gfx::resources::TextureResource};

use super::framebuffer::Framebuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GBufferTextureType {
    Position,
    Normal,
    Ambient,
    Diffuse,
    GlossyShininess,
    Depth,
}

impl GBufferTextureType {
    pub const ALL: [GBufferTextureType; GBUFFER_TEXTURE_COUNT] = [
        Self::Position,
        Self::Normal,
        Self::Ambient,
        Self::Diffuse,
        Self::GlossyShininess,
        Self::Depth,
    ];

    /// Names shown on the GUI radio buttons.
    pub fn label(self) -> &'static str {
        match self {
            Self::Position => "GPosition",
            Self::Normal => "GNormal",
            Self::Ambient => "GAmbient",
            Self::Diffuse => "GDiffuse",
            Self::GlossyShininess => "GGlossyShininess",
            Self::Depth => "GDepth",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn format(self) -> GBufferFormat {
        GBUFFER_FORMATS[self.index()]
    }
}

/// Storage formats requested for the G-buffer, by channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GBufferFormat {
    Rgb32F,
    Rgba32F,
    DepthComponent32F,
}

impl GBufferFormat {
    /// wgpu has no three-channel formats; RGB targets get an unused alpha.
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::Rgb32F | Self::Rgba32F => wgpu::TextureFormat::Rgba32Float,
            Self::DepthComponent32F => wgpu::TextureFormat::Depth32Float,
        }
    }

    pub fn is_depth(self) -> bool {
        self == Self::DepthComponent32F
    }
}

pub const GBUFFER_TEXTURE_COUNT: usize = 6;

pub const GBUFFER_FORMATS: [GBufferFormat; GBUFFER_TEXTURE_COUNT] = [
    GBufferFormat::Rgb32F,
    GBufferFormat::Rgb32F,
    GBufferFormat::Rgb32F,
    GBufferFormat::Rgb32F,
    GBufferFormat::Rgba32F,
    GBufferFormat::DepthComponent32F,
];

/// Color formats written by the geometry pass, in attachment order.
pub fn gbuffer_color_formats() -> Vec<wgpu::TextureFormat> {
    GBUFFER_FORMATS
        .iter()
        .filter(|format| !format.is_depth())
        .map(|format| format.to_wgpu())
        .collect()
}

pub struct GBuffer {
    framebuffer: Framebuffer,
    depth: TextureResource,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self> {
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let mut colors = Vec::new();
        let mut depth_target = None;

        for channel in GBufferTextureType::ALL {
            let texture = TextureResource::create_render_target(
                device,
                width,
                height,
                channel.format().to_wgpu(),
                usage,
                channel.label(),
            );
            if channel.format().is_depth() {
                depth_target = Some(texture);
            } else {
                colors.push(texture);
            }
        }

        let depth = depth_target.clone().unwrap_or_else(|| {
            TextureResource::create_depth_texture(device, width, height, "GDepth")
        });
        Ok(Self {
            framebuffer: Framebuffer::new(device, "GBuffer", colors, depth_target)?,
            depth,
        })
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn texture(&self, channel: GBufferTextureType) -> &TextureResource {
        match channel {
            GBufferTextureType::Depth => &self.depth,
            channel => self.framebuffer.color(channel.index()),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.framebuffer.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_textures_in_fixed_order() {
        assert_eq!(GBufferTextureType::ALL.len(), 6);
        assert_eq!(
            GBUFFER_FORMATS,
            [
                GBufferFormat::Rgb32F,
                GBufferFormat::Rgb32F,
                GBufferFormat::Rgb32F,
                GBufferFormat::Rgb32F,
                GBufferFormat::Rgba32F,
                GBufferFormat::DepthComponent32F,
            ]
        );
        for (i, channel) in GBufferTextureType::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn geometry_pass_writes_five_float_targets() {
        let formats = gbuffer_color_formats();
        assert_eq!(formats.len(), 5);
        assert!(formats.iter().all(|f| *f == wgpu::TextureFormat::Rgba32Float));
        assert_eq!(
            GBufferTextureType::Depth.format().to_wgpu(),
            wgpu::TextureFormat::Depth32Float
        );
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<_> = GBufferTextureType::ALL.iter().map(|c| c.label()).collect();
        labels.dedup();
        assert_eq!(labels.len(), 6);
        assert_eq!(GBufferTextureType::Normal.label(), "GNormal");
    }
}
