//! Vulkan-flavored value types shared across the crate.
//!
//! Mirrors the teacher's `vulkan/types.rs` convention of wrapping raw
//! `ash::vk` structures behind small builder types rather than reinventing
//! extent/format/color-space representations.

use ash::vk;

use crate::error::CreationError;

/// Presentation mode a swapchain can be configured with.
///
/// `ash::vk::PresentModeKHR` also has `Immediate` and `Relaxed` variants;
/// only the two policies below (strict queue and most-recent-wins) are
/// implemented, so those are all this type exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// Present frames in the order they were submitted (strict queue).
    Fifo,
    /// Always present the most recently promoted frame, dropping older
    /// presentable frames that never reached the screen.
    Mailbox,
}

impl PresentMode {
    pub(crate) fn to_vk(self) -> vk::PresentModeKHR {
        match self {
            PresentMode::Fifo => vk::PresentModeKHR::FIFO,
            PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        }
    }
}

/// Alpha compositing mode applied by the compositor when scanning out a
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Alpha channel ignored; buffer treated as fully opaque.
    Opaque,
    /// Color channels are already multiplied by alpha.
    PreMultiplied,
    /// Color channels are not premultiplied; the compositor multiplies
    /// them by alpha during composition (Vulkan's "post-multiplied").
    Straight,
    /// Compositor uses whatever blending mode was set out-of-band.
    Inherit,
}

impl AlphaMode {
    pub(crate) fn to_vk_composite_alpha(self) -> vk::CompositeAlphaFlagsKHR {
        match self {
            AlphaMode::Opaque => vk::CompositeAlphaFlagsKHR::OPAQUE,
            AlphaMode::PreMultiplied => vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
            AlphaMode::Straight => vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
            AlphaMode::Inherit => vk::CompositeAlphaFlagsKHR::INHERIT,
        }
    }
}

/// Contains all the data necessary to create a new swapchain: color format,
/// extent, buffer count, present mode and alpha handling.
///
/// Builder-style, matching the teacher's `with_*` chained-method
/// convention (see `vulkan/types.rs`'s `PipelineRasterizationState`).
#[derive(Debug, Clone)]
pub struct SwapchainConfig {
    pub min_image_count: u32,
    pub image_format: vk::Format,
    pub image_color_space: vk::ColorSpaceKHR,
    pub image_extent: vk::Extent2D,
    pub image_array_layers: u32,
    pub image_usage: vk::ImageUsageFlags,
    pub present_mode: PresentMode,
    pub composite_alpha: AlphaMode,
}

impl SwapchainConfig {
    pub fn new(format: vk::Format, color_space: vk::ColorSpaceKHR, extent: vk::Extent2D) -> Self {
        Self {
            min_image_count: 2,
            image_format: format,
            image_color_space: color_space,
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            present_mode: PresentMode::Fifo,
            composite_alpha: AlphaMode::Opaque,
        }
    }

    pub fn with_image_count(mut self, count: u32) -> Self {
        self.min_image_count = count;
        self
    }

    pub fn with_present_mode(mut self, mode: PresentMode) -> Self {
        self.present_mode = mode;
        self
    }

    pub fn with_composite_alpha(mut self, mode: AlphaMode) -> Self {
        self.composite_alpha = mode;
        self
    }

    pub fn with_image_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.image_usage = usage;
        self
    }

    /// Clamps `min_image_count` to `[2, 8]` and validates the remaining
    /// fields against the fixed capability table in `surface`.
    pub(crate) fn validated(mut self) -> Result<Self, CreationError> {
        if self.image_extent.width == 0 || self.image_extent.height == 0 {
            return Err(CreationError::InvalidArgument("image_extent must be positive"));
        }
        if self.image_array_layers != 1 {
            return Err(CreationError::InvalidArgument("image_array_layers must be 1"));
        }
        if !crate::surface::SUPPORTED_FORMAT_COLOR_SPACE_PAIRS
            .iter()
            .any(|(f, c)| *f == self.image_format && *c == self.image_color_space)
        {
            return Err(CreationError::InvalidArgument(
                "unsupported format/color-space pair",
            ));
        }

        self.min_image_count = self.min_image_count.clamp(2, 8);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_image_count_into_range() {
        let config = SwapchainConfig::new(
            vk::Format::B8G8R8A8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 800, height: 600 },
        )
        .with_image_count(64)
        .validated()
        .unwrap();
        assert_eq!(config.min_image_count, 8);

        let config = SwapchainConfig::new(
            vk::Format::B8G8R8A8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 800, height: 600 },
        )
        .with_image_count(0)
        .validated()
        .unwrap();
        assert_eq!(config.min_image_count, 2);
    }

    #[test]
    fn rejects_unsupported_format_pair() {
        let result = SwapchainConfig::new(
            vk::Format::R8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 800, height: 600 },
        )
        .validated();
        assert!(matches!(result, Err(CreationError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_zero_extent() {
        let result = SwapchainConfig::new(
            vk::Format::B8G8R8A8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 0, height: 600 },
        )
        .validated();
        assert!(matches!(result, Err(CreationError::InvalidArgument(_))));
    }
}
