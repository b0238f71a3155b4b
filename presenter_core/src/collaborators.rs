//! External collaborator traits.
//!
//! Window creation, GPU device/queue setup and OS composition-tree setup
//! are explicitly out of scope for the core. Those responsibilities are
//! expressed here as trait
//! boundaries the host application implements; the core is generic only
//! over `Arc<dyn Trait>`, matching the teacher's habit of passing
//! `Arc<DeviceShared>` around rather than threading raw handles through
//! every call.

use std::time::Duration;

use ash::vk;

use crate::error::SubmitError;
use crate::types::AlphaMode;

/// Host abstraction of the native window/surface. Exposes only what the
/// core needs: the current client extent, and whether the window has been
/// lost.
pub trait WindowHost: Send + Sync {
    /// Current client rectangle, or `None` if the window has been
    /// destroyed or otherwise lost.
    fn extent(&self) -> Option<vk::Extent2D>;

    /// The LUID of the GPU adapter this window's surface was created
    /// against, used by `SurfaceAdapter::queue_family_supports_presentation`.
    fn adapter_luid(&self) -> u64;

    /// Attempts to bind a swapchain to this window. Returns `false` if a
    /// swapchain is already bound (creating a second swapchain against the
    /// same surface is a `NativeWindowInUse` error).
    fn try_bind_swapchain(&self) -> bool;

    /// Releases a previously successful `try_bind_swapchain`.
    fn unbind_swapchain(&self);
}

/// Opaque identity of a compositor-side buffer registration, returned by
/// [`Compositor::register_buffer`].
pub type CompositorBufferHandle = u64;

/// The result of waiting on the compositor's vertical-blank clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsyncWake {
    /// A vertical-blank tick occurred; a scan-out opportunity is available.
    Tick,
    /// The compositor reported the surface as lost.
    Lost,
    /// No tick arrived within the polling interval; the caller should loop
    /// and re-check its own cancellation flags.
    Timeout,
}

/// OS composition-tree collaborator: accepts registered GPU textures and
/// retires them against the display's vertical-blank clock.
///
/// Grounded on the compositor-facing calls in `original_source`'s
/// `CSwapVK.cpp` (`IPresentationBuffer::IsAvailable`,
/// `DCompositionWaitForCompositorClock`, `IDCompositionVisual3`/
/// `IPresentationManager` buffer binding), translated into a
/// platform-neutral trait.
pub trait Compositor: Send + Sync {
    /// Registers a GPU image with the compositor, returning an opaque
    /// handle keyed by the shared texture.
    fn register_buffer(&self, image: vk::Image) -> anyhow::Result<CompositorBufferHandle>;

    /// Unregisters a previously registered buffer.
    fn unregister_buffer(&self, handle: CompositorBufferHandle);

    /// Returns whether a previously presented buffer has been released by
    /// the compositor (retired).
    fn is_available(&self, handle: CompositorBufferHandle) -> anyhow::Result<bool>;

    /// Sets the source rectangle to the swapchain's full extent. Cheap and
    /// idempotent; called once per vsync tick.
    fn set_source_rect(&self, extent: vk::Extent2D);

    /// Applies the swapchain's alpha mode.
    fn set_alpha_mode(&self, mode: AlphaMode);

    /// Applies the swapchain's format/color-space.
    fn set_color_space(&self, format: vk::Format, color_space: vk::ColorSpaceKHR);

    /// Binds `handle` as the current source buffer and requests a present.
    fn present(&self, handle: CompositorBufferHandle) -> anyhow::Result<()>;

    /// Blocks until the next vertical-blank tick, the compositor reports
    /// loss, or `timeout` elapses.
    fn wait_vsync(&self, timeout: Duration) -> VsyncWake;

    /// Whether the compositor has reported this surface as lost.
    fn is_lost(&self) -> bool;
}

/// GPU queue/synchronization collaborator. The core never records real
/// rendering work; it only needs a way to submit semaphore-only
/// (no-op) queue work for the acquire/present handshake, and to observe
/// timeline-semaphore values.
///
/// Grounded on the teacher's `Queue::submit_command_buffers` (same
/// `vk::SemaphoreSubmitInfo` / `vk::SubmitInfo2` shape, minus the command
/// buffers) and on `original_source`'s use of `vkQueueSubmit2` with only
/// wait/signal semaphore infos.
pub trait GpuContext: Send + Sync {
    /// Submits a semaphore-only queue operation: waits on zero or more
    /// timeline values, then signals one (semaphore, value) pair.
    ///
    /// Typed rather than `anyhow::Result`: the caller needs to tell a fatal
    /// loss (`DeviceLost`/`SurfaceLost`) apart from a transient one
    /// (`OutOfDate`) instead of every submit failure collapsing to the same
    /// outcome.
    fn submit_semaphore_signal(
        &self,
        waits: &[(vk::Semaphore, u64)],
        signal: (vk::Semaphore, u64),
    ) -> Result<(), SubmitError>;

    /// Reads the current counter value of a timeline semaphore.
    fn semaphore_counter_value(&self, semaphore: vk::Semaphore) -> anyhow::Result<u64>;

    /// Blocks until any of the given `(semaphore, value)` pairs is
    /// reached, or `timeout` elapses. Returns the index into `waits` that
    /// fired, or `None` on timeout.
    ///
    /// The Vulkan-native substitute for an OS multi-object wait: wraps
    /// `vkWaitSemaphores` with `VK_SEMAPHORE_WAIT_ANY_BIT` across all of a
    /// swapchain's per-slot timeline semaphores at once.
    fn wait_any_timeline(
        &self,
        waits: &[(vk::Semaphore, u64)],
        timeout: Duration,
    ) -> anyhow::Result<Option<usize>>;

    /// Destroys a semaphore previously produced by [`crate::interop::InteropImporter::import_fence`].
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// Destroys an image view previously produced by
    /// [`crate::interop::InteropImporter::import_texture`].
    fn destroy_image_view(&self, view: vk::ImageView);

    /// Destroys (releases ownership of) an image previously imported by
    /// [`crate::interop::InteropImporter::import_texture`].
    fn destroy_image(&self, image: vk::Image);
}
