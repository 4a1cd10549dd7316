//! Per-frame pass list of the deferred renderer
//!
//! [`plan_frame`] turns the GUI toggles into the ordered list of passes the
//! renderer records. Keeping the plan separate from command recording lets
//! the ordering and resource usage be checked without a GPU.

use super::gbuffer::GBufferTextureType;

/// Compute workgroups cover 32x32 pixel tiles.
pub const GAMMA_TILE_SIZE: u32 = 32;

/// Where the lighting (or debug) output of a frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    /// Offscreen float target consumed by post-processing.
    Beauty,
    Surface,
}

/// GPU resources touched by the deferred passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    ShadowMap,
    GBuffer(GBufferTextureType),
    Beauty,
    GammaCorrected,
    Surface,
}

impl From<ColorTarget> for Resource {
    fn from(target: ColorTarget) -> Self {
        match target {
            ColorTarget::Beauty => Resource::Beauty,
            ColorTarget::Surface => Resource::Surface,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Depth-only render of the scene from the directional light.
    ShadowMap,
    Geometry,
    BlitGBuffer {
        channel: GBufferTextureType,
        target: ColorTarget,
    },
    Shading {
        target: ColorTarget,
    },
    DisplayShadowMap {
        target: ColorTarget,
    },
    GammaCorrect {
        groups: (u32, u32),
    },
    /// Copies the gamma-corrected image to the window.
    PresentCorrected,
}

impl Pass {
    pub fn reads(&self) -> Vec<Resource> {
        match *self {
            Pass::ShadowMap | Pass::Geometry => Vec::new(),
            Pass::BlitGBuffer { channel, .. } => vec![Resource::GBuffer(channel)],
            Pass::Shading { .. } => GBufferTextureType::ALL
                .iter()
                .filter(|channel| **channel != GBufferTextureType::Depth)
                .map(|&channel| Resource::GBuffer(channel))
                .chain(std::iter::once(Resource::ShadowMap))
                .collect(),
            Pass::DisplayShadowMap { .. } => vec![Resource::ShadowMap],
            Pass::GammaCorrect { .. } => vec![Resource::Beauty],
            Pass::PresentCorrected => vec![Resource::GammaCorrected],
        }
    }

    pub fn writes(&self) -> Vec<Resource> {
        match *self {
            Pass::ShadowMap => vec![Resource::ShadowMap],
            Pass::Geometry => GBufferTextureType::ALL
                .iter()
                .map(|&channel| Resource::GBuffer(channel))
                .collect(),
            Pass::BlitGBuffer { target, .. }
            | Pass::Shading { target }
            | Pass::DisplayShadowMap { target } => vec![target.into()],
            Pass::GammaCorrect { .. } => vec![Resource::GammaCorrected],
            Pass::PresentCorrected => vec![Resource::Surface],
        }
    }
}

/// Display toggles edited from the GUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredSettings {
    pub post_processing: bool,
    pub display_gbuffer: bool,
    pub display_shadow_map: bool,
    pub gbuffer_channel: GBufferTextureType,
}

impl Default for DeferredSettings {
    fn default() -> Self {
        Self {
            post_processing: true,
            display_gbuffer: false,
            display_shadow_map: false,
            gbuffer_channel: GBufferTextureType::Normal,
        }
    }
}

/// Tracks whether the shadow map must be re-rendered. Starts dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapState {
    dirty: bool,
}

impl Default for ShadowMapState {
    fn default() -> Self {
        Self { dirty: true }
    }
}

impl ShadowMapState {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the flag and clears it.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

pub fn gamma_dispatch_groups(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(GAMMA_TILE_SIZE), height.div_ceil(GAMMA_TILE_SIZE))
}

/// Orders the passes of one frame, consuming the shadow map's dirty flag.
pub fn plan_frame(
    settings: &DeferredSettings,
    shadow_map: &mut ShadowMapState,
    (width, height): (u32, u32),
) -> Vec<Pass> {
    let mut passes = Vec::with_capacity(5);

    if shadow_map.take() {
        passes.push(Pass::ShadowMap);
    }
    passes.push(Pass::Geometry);

    let target = if settings.post_processing {
        ColorTarget::Beauty
    } else {
        ColorTarget::Surface
    };

    if settings.display_gbuffer {
        passes.push(Pass::BlitGBuffer {
            channel: settings.gbuffer_channel,
            target,
        });
    } else {
        passes.push(Pass::Shading { target });
    }

    if settings.display_shadow_map {
        passes.push(Pass::DisplayShadowMap { target });
    }

    if settings.post_processing {
        passes.push(Pass::GammaCorrect {
            groups: gamma_dispatch_groups(width, height),
        });
        passes.push(Pass::PresentCorrected);
    }

    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: (u32, u32) = (1280, 720);

    fn all_settings() -> Vec<DeferredSettings> {
        let mut settings = Vec::new();
        for post_processing in [false, true] {
            for display_gbuffer in [false, true] {
                for display_shadow_map in [false, true] {
                    for gbuffer_channel in GBufferTextureType::ALL {
                        settings.push(DeferredSettings {
                            post_processing,
                            display_gbuffer,
                            display_shadow_map,
                            gbuffer_channel,
                        });
                    }
                }
            }
        }
        settings
    }

    #[test]
    fn dirty_shadow_map_is_rendered_once() {
        let settings = DeferredSettings::default();
        let mut shadow_map = ShadowMapState::default();
        assert!(shadow_map.is_dirty());

        let first = plan_frame(&settings, &mut shadow_map, SIZE);
        assert_eq!(first[0], Pass::ShadowMap);
        assert!(!shadow_map.is_dirty());

        let second = plan_frame(&settings, &mut shadow_map, SIZE);
        assert!(!second.contains(&Pass::ShadowMap));

        shadow_map.mark_dirty();
        let third = plan_frame(&settings, &mut shadow_map, SIZE);
        assert_eq!(third[0], Pass::ShadowMap);
    }

    #[test]
    fn default_frame_shades_then_post_processes() {
        let mut shadow_map = ShadowMapState::default();
        shadow_map.take();
        let passes = plan_frame(&DeferredSettings::default(), &mut shadow_map, SIZE);
        assert_eq!(
            passes,
            vec![
                Pass::Geometry,
                Pass::Shading {
                    target: ColorTarget::Beauty
                },
                Pass::GammaCorrect { groups: (40, 23) },
                Pass::PresentCorrected,
            ]
        );
    }

    #[test]
    fn without_post_processing_output_goes_to_surface() {
        let settings = DeferredSettings {
            post_processing: false,
            display_gbuffer: true,
            gbuffer_channel: GBufferTextureType::Depth,
            ..Default::default()
        };
        let mut shadow_map = ShadowMapState::default();
        let passes = plan_frame(&settings, &mut shadow_map, SIZE);
        assert_eq!(
            passes.last(),
            Some(&Pass::BlitGBuffer {
                channel: GBufferTextureType::Depth,
                target: ColorTarget::Surface
            })
        );
        assert!(!passes.iter().any(|p| matches!(p, Pass::GammaCorrect { .. })));
    }

    #[test]
    fn dispatch_covers_the_whole_image() {
        for (width, height) in [(1, 1), (31, 33), (32, 32), (1280, 720), (1919, 1081)] {
            let (gx, gy) = gamma_dispatch_groups(width, height);
            assert_eq!(gx, (width + 31) / 32);
            assert_eq!(gy, (height + 31) / 32);
            assert!(gx * GAMMA_TILE_SIZE >= width && (gx - 1) * GAMMA_TILE_SIZE < width);
            assert!(gy * GAMMA_TILE_SIZE >= height && (gy - 1) * GAMMA_TILE_SIZE < height);
        }
    }

    #[test]
    fn no_pass_samples_what_it_writes() {
        for settings in all_settings() {
            let mut shadow_map = ShadowMapState::default();
            for pass in plan_frame(&settings, &mut shadow_map, SIZE) {
                let writes = pass.writes();
                assert!(
                    pass.reads().iter().all(|r| !writes.contains(r)),
                    "{pass:?} reads its own target"
                );
            }
        }
    }

    #[test]
    fn every_read_was_written_earlier_in_the_frame() {
        for settings in all_settings() {
            let mut shadow_map = ShadowMapState::default();
            let mut written = Vec::new();
            for pass in plan_frame(&settings, &mut shadow_map, SIZE) {
                for read in pass.reads() {
                    assert!(written.contains(&read), "{pass:?} reads unwritten {read:?}");
                }
                written.extend(pass.writes());
            }
        }
    }
}
