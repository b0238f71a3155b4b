//! Error taxonomy for swapchain creation, acquisition and presentation.
//!
//! The teacher crate propagates everything through `anyhow::Result`, which
//! is the right shape for an application but not for a library whose
//! callers need to match on specific outcomes (`Timeout` vs. `NotReady`,
//! `DeviceLost` vs. `SurfaceLost`). These enums use `thiserror` instead,
//! learned from `gfx-hal`'s `window.rs` error shapes in the retrieval pack.

use crate::interop::InteropError;

/// Error occurred during swapchain creation.
#[derive(Debug, thiserror::Error)]
pub enum CreationError {
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("out of device memory")]
    OutOfDeviceMemory,
    #[error("surface is lost")]
    SurfaceLost,
    #[error("surface already has a swapchain bound")]
    NativeWindowInUse,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Interop(#[from] InteropError),
}

/// Error on acquiring the next image from a swapchain.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("out of device memory")]
    OutOfDeviceMemory,
    #[error("no slot was ready and the timeout was zero")]
    NotReady,
    #[error("timed out waiting for a usable slot")]
    Timeout,
    #[error("swapchain is out of date and must be recreated")]
    OutOfDate,
    #[error("surface is lost")]
    SurfaceLost,
    #[error("device is lost")]
    DeviceLost,
}

/// Error on presenting a previously acquired image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PresentError {
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("swapchain is out of date and must be recreated")]
    OutOfDate,
    #[error("surface is lost")]
    SurfaceLost,
    #[error("device is lost")]
    DeviceLost,
    #[error("fullscreen exclusive mode was lost")]
    FullscreenExclusiveLost,
    #[error("slot index out of range or slot not in a presentable state")]
    Suboptimal,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Error from [`crate::GpuContext::submit_semaphore_signal`], kept distinct
/// from `anyhow::Error` so callers can tell a fatal loss apart from a
/// transient one instead of everything collapsing to `DeviceLost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("device is lost")]
    DeviceLost,
    #[error("surface is lost")]
    SurfaceLost,
    #[error("swapchain is out of date and must be recreated")]
    OutOfDate,
}

/// Marker returned alongside a successful operation when the swapchain no
/// longer matches the surface exactly but presentation still succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suboptimal;

/// Aggregates present-time errors from several swapchains driven by one
/// caller, by priority order:
/// `DeviceLost > SurfaceLost > OutOfDate > FullscreenExclusiveLost > Suboptimal`.
///
/// The core itself only ever owns one swapchain; multi-swapchain drivers
/// are out of scope, so this is exposed as a free function for hosts that
/// build one on top.
pub fn aggregate_present_errors(results: &[Result<Option<Suboptimal>, PresentError>]) -> Result<Option<Suboptimal>, PresentError> {
    fn priority(err: &PresentError) -> u8 {
        match err {
            PresentError::DeviceLost => 0,
            PresentError::SurfaceLost => 1,
            PresentError::OutOfDate => 2,
            PresentError::FullscreenExclusiveLost => 3,
            PresentError::Suboptimal => 4,
            PresentError::OutOfHostMemory | PresentError::InvalidArgument(_) => 5,
        }
    }

    let mut worst: Option<&PresentError> = None;
    for result in results {
        if let Err(err) = result {
            worst = match worst {
                Some(current) if priority(current) <= priority(err) => Some(current),
                _ => Some(err),
            };
        }
    }

    match worst {
        Some(PresentError::DeviceLost) => Err(PresentError::DeviceLost),
        Some(PresentError::SurfaceLost) => Err(PresentError::SurfaceLost),
        Some(PresentError::OutOfDate) => Err(PresentError::OutOfDate),
        Some(PresentError::FullscreenExclusiveLost) => Err(PresentError::FullscreenExclusiveLost),
        Some(PresentError::Suboptimal) => Err(PresentError::Suboptimal),
        Some(PresentError::OutOfHostMemory) => Err(PresentError::OutOfHostMemory),
        Some(PresentError::InvalidArgument(msg)) => Err(PresentError::InvalidArgument(msg)),
        None => {
            let any_suboptimal = results.iter().any(|r| matches!(r, Ok(Some(Suboptimal))));
            Ok(any_suboptimal.then_some(Suboptimal))
        }
    }
}
