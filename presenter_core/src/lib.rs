//! Core of a user-mode presentation engine exposing a Vulkan-style
//! swapchain surface on top of a host compositor.
//!
//! Window creation, GPU device/queue setup and OS composition-tree setup
//! are external collaborators (see [`collaborators`]); this crate owns
//! only the per-buffer state machine and the two worker threads that drive
//! it ([`core::SwapchainCore`], [`retire`], [`vsync`]).

mod collaborators;
mod core;
mod error;
mod interop;
mod queue;
mod retire;
mod slot;
mod surface;
#[cfg(any(test, feature = "test-util"))]
pub mod testutil;
#[cfg(not(any(test, feature = "test-util")))]
mod testutil;
mod types;
mod vsync;

pub use collaborators::{Compositor, CompositorBufferHandle, GpuContext, VsyncWake, WindowHost};
pub use core::SwapchainCore;
pub use error::{aggregate_present_errors, AcquireError, CreationError, PresentError, Suboptimal, SubmitError};
pub use interop::{ImageCreateParams, ImportedFence, ImportedImage, InteropError, InteropImporter};
pub use slot::BufferState;
pub use surface::{QueueFamilyInfo, SurfaceAdapter, SurfaceCapabilities};
pub use types::{AlphaMode, PresentMode, SwapchainConfig};
