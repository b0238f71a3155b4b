//! Imports OS-shared texture and fence handles as GPU resources.
//!
//! Grounded on the teacher's `DeviceShared::new_ash_device`, which builds
//! its required-extension list (`"VK_KHR_swapchain"`, `"VK_NV_mesh_shader"`)
//! and fails construction if the driver lacks them. The two extensions an
//! interop importer actually needs come straight from
//! `original_source/Tests/Src/CSwapVK.cpp`'s `c_DeviceExtensions` table.

use ash::vk;

/// Required device extensions for shared-handle interop. A real
/// `InteropImporter` implementation should check these against the
/// physical device's supported extension list before attempting an
/// import, surfacing [`InteropError::ImportUnsupported`] otherwise.
pub const REQUIRED_INTEROP_EXTENSIONS: &[&str] = &[
    "VK_KHR_external_memory_win32",
    "VK_KHR_external_semaphore_win32",
];

/// Errors importing an OS-shared handle as a GPU resource.
#[derive(Debug, thiserror::Error)]
pub enum InteropError {
    #[error("driver does not expose the required interop extensions")]
    ImportUnsupported,
    #[error("out of device memory")]
    OutOfDeviceMemory,
    #[error("invalid shared handle")]
    InvalidHandle,
}

/// Parameters for the image the importer should bind the shared texture
/// handle to.
#[derive(Debug, Clone, Copy)]
pub struct ImageCreateParams {
    pub extent: vk::Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}

/// A GPU image bound to an imported OS-shared texture handle.
#[derive(Debug, Clone, Copy)]
pub struct ImportedImage {
    pub image: vk::Image,
    pub view: vk::ImageView,
}

/// A GPU timeline semaphore bound to an imported OS-shared fence handle.
///
/// Its counter value is exactly the underlying shared-fence counter:
/// signalling one is visible to the GPU timeline and to the host-waitable
/// completion machinery alike, so a single monotone value coordinates the
/// GPU queue, the renderer thread and the retire-waiter thread.
#[derive(Debug, Clone, Copy)]
pub struct ImportedFence {
    pub semaphore: vk::Semaphore,
}

/// Imports OS-shared handles as GPU resources.
pub trait InteropImporter: Send + Sync {
    /// Imports `shared_texture_handle` as a GPU image bound to device
    /// memory, with an image view created per `params`.
    fn import_texture(
        &self,
        shared_texture_handle: u64,
        params: &ImageCreateParams,
    ) -> Result<ImportedImage, InteropError>;

    /// Imports `shared_fence_handle` as a GPU timeline semaphore.
    fn import_fence(&self, shared_fence_handle: u64) -> Result<ImportedFence, InteropError>;
}
