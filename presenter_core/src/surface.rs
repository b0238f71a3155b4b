//! `SurfaceAdapter` — translates Vulkan-style surface queries (formats,
//! color spaces, present modes, capabilities) to compositor capabilities.
//!
//! The fixed format/color-space table and capability constants below are
//! lifted out of the teacher's inline format-selection code in
//! `Swapchain::new` (`vulkan/lib.rs`, picking `B8G8R8A8_UNORM` /
//! `SRGB_NONLINEAR` out of a queried list) and generalized into a static
//! table, since the surface here never actually probes a physical device —
//! the set of supported pairs is fixed ahead of time.

use std::sync::Arc;

use ash::vk;

use crate::collaborators::WindowHost;
use crate::error::CreationError;
use crate::types::{AlphaMode, PresentMode};

/// The fixed set of format/color-space pairs a swapchain may be created
/// with. `create_swapchain` rejects any other pair.
pub const SUPPORTED_FORMAT_COLOR_SPACE_PAIRS: &[(vk::Format, vk::ColorSpaceKHR)] = &[
    (vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    (vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    (vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    (vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
    (vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    (vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::HDR10_ST2084_EXT),
];

/// The two presentation policies this design implements.
pub const SUPPORTED_PRESENT_MODES: &[PresentMode] = &[PresentMode::Fifo, PresentMode::Mailbox];

/// Fixed surface capability constants.
#[derive(Debug, Clone)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    pub max_image_count: u32,
    pub max_image_array_layers: u32,
    pub supported_usage: vk::ImageUsageFlags,
    pub supported_composite_alpha: &'static [AlphaMode],
}

const SUPPORTED_COMPOSITE_ALPHA: &[AlphaMode] =
    &[AlphaMode::Opaque, AlphaMode::PreMultiplied, AlphaMode::Straight];

fn fixed_capabilities() -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 8,
        max_image_array_layers: 1,
        supported_usage: vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST
            | vk::ImageUsageFlags::SAMPLED
            | vk::ImageUsageFlags::STORAGE
            | vk::ImageUsageFlags::COLOR_ATTACHMENT
            | vk::ImageUsageFlags::INPUT_ATTACHMENT,
        supported_composite_alpha: SUPPORTED_COMPOSITE_ALPHA,
    }
}

/// Minimal description of a GPU queue family, used only to decide whether
/// it can present to a given surface.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyInfo {
    pub supports_graphics: bool,
    pub supports_compute: bool,
    pub adapter_luid: u64,
}

/// Read-only capability view over a host window, exposed to the renderer
/// before it calls `SwapchainCore::new`.
pub struct SurfaceAdapter {
    window: Arc<dyn WindowHost>,
}

impl SurfaceAdapter {
    pub fn new(window: Arc<dyn WindowHost>) -> Self {
        Self { window }
    }

    /// Current client rectangle, or `CreationError::SurfaceLost` if the
    /// window is gone.
    pub fn extent(&self) -> Result<vk::Extent2D, CreationError> {
        self.window.extent().ok_or(CreationError::SurfaceLost)
    }

    pub fn capabilities(&self) -> SurfaceCapabilities {
        fixed_capabilities()
    }

    pub fn supported_format_color_space_pairs(&self) -> &'static [(vk::Format, vk::ColorSpaceKHR)] {
        SUPPORTED_FORMAT_COLOR_SPACE_PAIRS
    }

    pub fn supported_present_modes(&self) -> &'static [PresentMode] {
        SUPPORTED_PRESENT_MODES
    }

    /// A queue family supports presentation to this surface iff it carries
    /// graphics or compute capability, and its GPU adapter has the same
    /// LUID as the surface's underlying adapter.
    pub fn queue_family_supports_presentation(&self, family: &QueueFamilyInfo) -> bool {
        (family.supports_graphics || family.supports_compute)
            && family.adapter_luid == self.window.adapter_luid()
    }

    pub(crate) fn window(&self) -> &Arc<dyn WindowHost> {
        &self.window
    }
}
