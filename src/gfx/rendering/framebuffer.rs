//! Render target sets with completeness validation
//!
//! A [`Framebuffer`] groups the textures a pass writes to. Its attachment
//! list is validated once at creation; an incomplete set is a fatal startup
//! error naming the framebuffer and the failing rule.

use std::fmt;

use crate::{
    error::{GlintError, Result},
    gfx::resources::TextureResource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// An attachment has zero size or cannot be rendered to.
    IncompleteAttachment,
    /// No attachment at all.
    MissingAttachment,
    /// More color attachments than the device supports.
    IncompleteDrawBuffer,
    /// The format cannot be used in its attachment slot.
    Unsupported,
    IncompleteMultisample,
    IncompleteDimensions,
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Complete => "COMPLETE",
            Self::IncompleteAttachment => "INCOMPLETE_ATTACHMENT",
            Self::MissingAttachment => "INCOMPLETE_MISSING_ATTACHMENT",
            Self::IncompleteDrawBuffer => "INCOMPLETE_DRAW_BUFFER",
            Self::Unsupported => "UNSUPPORTED",
            Self::IncompleteMultisample => "INCOMPLETE_MULTISAMPLE",
            Self::IncompleteDimensions => "INCOMPLETE_DIMENSIONS",
        };
        f.write_str(name)
    }
}

/// The properties of a texture that decide whether it can be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
    pub usage: wgpu::TextureUsages,
}

impl AttachmentDesc {
    pub fn of(texture: &wgpu::Texture) -> Self {
        Self {
            format: texture.format(),
            width: texture.width(),
            height: texture.height(),
            sample_count: texture.sample_count(),
            usage: texture.usage(),
        }
    }

    fn is_renderable(&self) -> bool {
        self.format
            .guaranteed_format_features(wgpu::Features::empty())
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }
}

pub fn check_status(
    colors: &[AttachmentDesc],
    depth: Option<&AttachmentDesc>,
    max_color_attachments: u32,
) -> FramebufferStatus {
    if colors.is_empty() && depth.is_none() {
        return FramebufferStatus::MissingAttachment;
    }
    if colors.len() > max_color_attachments as usize {
        return FramebufferStatus::IncompleteDrawBuffer;
    }

    let all = || colors.iter().chain(depth);

    if all().any(|a| {
        a.width == 0 || a.height == 0 || !a.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }) {
        return FramebufferStatus::IncompleteAttachment;
    }

    let color_ok = colors
        .iter()
        .all(|a| !a.format.has_depth_aspect() && a.is_renderable());
    let depth_ok = depth.map_or(true, |a| a.format.has_depth_aspect() && a.is_renderable());
    if !color_ok || !depth_ok {
        return FramebufferStatus::Unsupported;
    }

    let mut attachments = all();
    let first = attachments.next().copied();
    if let Some(first) = first {
        let rest: Vec<_> = attachments.collect();
        if rest.iter().any(|a| a.sample_count != first.sample_count) {
            return FramebufferStatus::IncompleteMultisample;
        }
        if rest
            .iter()
            .any(|a| (a.width, a.height) != (first.width, first.height))
        {
            return FramebufferStatus::IncompleteDimensions;
        }
    }

    FramebufferStatus::Complete
}

/// Logs a complete status, turns anything else into a fatal error.
pub fn handle_framebuffer_status(label: &str, status: FramebufferStatus) -> Result<()> {
    match status {
        FramebufferStatus::Complete => {
            log::info!("Framebuffer OK: {label}");
            Ok(())
        }
        status => {
            log::error!("Invalid Framebuffer {label}: {status}");
            Err(GlintError::InvalidFramebuffer {
                label: label.to_owned(),
                status,
            })
        }
    }
}

/// A validated set of color and depth targets.
pub struct Framebuffer {
    label: String,
    colors: Vec<TextureResource>,
    depth: Option<TextureResource>,
}

impl Framebuffer {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        colors: Vec<TextureResource>,
        depth: Option<TextureResource>,
    ) -> Result<Self> {
        let color_descs: Vec<_> = colors.iter().map(|t| AttachmentDesc::of(&t.texture)).collect();
        let depth_desc = depth.as_ref().map(|t| AttachmentDesc::of(&t.texture));
        let status = check_status(
            &color_descs,
            depth_desc.as_ref(),
            device.limits().max_color_attachments,
        );
        handle_framebuffer_status(label, status)?;

        Ok(Self {
            label: label.to_owned(),
            colors,
            depth,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn color(&self, index: usize) -> &TextureResource {
        &self.colors[index]
    }

    pub fn colors(&self) -> &[TextureResource] {
        &self.colors
    }

    pub fn depth(&self) -> Option<&TextureResource> {
        self.depth.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        self.colors
            .first()
            .or(self.depth.as_ref())
            .map(TextureResource::size)
            .unwrap_or((0, 0))
    }

    /// Color attachments that clear to `clear` (or load when `None`).
    pub fn color_attachments(
        &self,
        clear: Option<wgpu::Color>,
    ) -> Vec<Option<wgpu::RenderPassColorAttachment<'_>>> {
        self.colors
            .iter()
            .map(|target| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect()
    }

    /// Depth attachment cleared to the far plane.
    pub fn depth_attachment(&self) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
        self.depth
            .as_ref()
            .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{TextureFormat, TextureUsages};

    fn desc(format: TextureFormat, width: u32, height: u32) -> AttachmentDesc {
        AttachmentDesc {
            format,
            width,
            height,
            sample_count: 1,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        }
    }

    #[test]
    fn complete_gbuffer_layout() {
        let colors = vec![desc(TextureFormat::Rgba32Float, 1280, 720); 5];
        let depth = desc(TextureFormat::Depth32Float, 1280, 720);
        assert_eq!(check_status(&colors, Some(&depth), 8), FramebufferStatus::Complete);
    }

    #[test]
    fn depth_only_target_is_complete() {
        let depth = desc(TextureFormat::Depth32Float, 512, 512);
        assert_eq!(check_status(&[], Some(&depth), 8), FramebufferStatus::Complete);
    }

    #[test]
    fn rejects_empty_framebuffer() {
        assert_eq!(check_status(&[], None, 8), FramebufferStatus::MissingAttachment);
    }

    #[test]
    fn rejects_zero_sized_or_unrenderable_attachments() {
        let zero = desc(TextureFormat::Rgba32Float, 0, 720);
        assert_eq!(check_status(&[zero], None, 8), FramebufferStatus::IncompleteAttachment);

        let mut sampled_only = desc(TextureFormat::Rgba32Float, 64, 64);
        sampled_only.usage = TextureUsages::TEXTURE_BINDING;
        assert_eq!(
            check_status(&[sampled_only], None, 8),
            FramebufferStatus::IncompleteAttachment
        );
    }

    #[test]
    fn rejects_formats_in_the_wrong_slot() {
        let depth_as_color = desc(TextureFormat::Depth32Float, 64, 64);
        assert_eq!(check_status(&[depth_as_color], None, 8), FramebufferStatus::Unsupported);

        let color = desc(TextureFormat::Rgba8Unorm, 64, 64);
        assert_eq!(
            check_status(&[color], Some(&color), 8),
            FramebufferStatus::Unsupported
        );
    }

    #[test]
    fn rejects_mismatched_sizes_and_sample_counts() {
        let a = desc(TextureFormat::Rgba32Float, 64, 64);
        let b = desc(TextureFormat::Rgba32Float, 32, 64);
        assert_eq!(check_status(&[a, b], None, 8), FramebufferStatus::IncompleteDimensions);

        let mut multisampled = a;
        multisampled.sample_count = 4;
        assert_eq!(
            check_status(&[a, multisampled], None, 8),
            FramebufferStatus::IncompleteMultisample
        );
    }

    #[test]
    fn rejects_too_many_color_attachments() {
        let colors = vec![desc(TextureFormat::Rgba8Unorm, 8, 8); 5];
        assert_eq!(check_status(&colors, None, 4), FramebufferStatus::IncompleteDrawBuffer);
    }

    #[test]
    fn invalid_status_is_fatal() {
        let err = handle_framebuffer_status("GBuffer", FramebufferStatus::Unsupported).unwrap_err();
        assert_eq!(err.to_string(), "Invalid Framebuffer 'GBuffer': UNSUPPORTED");
        assert!(handle_framebuffer_status("GBuffer", FramebufferStatus::Complete).is_ok());
    }
}
