//! `SwapchainCore` — owns the buffer slots, the state machine, and the
//! acquire/present/destroy surface exposed to the renderer.
//!
//! Grounded on the teacher's `Swapchain` (`vulkan/lib.rs`): an `Arc`-shared
//! inner struct the two worker threads and the public handle both hold,
//! constructed in one shot and torn down by joining workers before
//! releasing GPU handles in reverse order (`Swapchain::new` /
//! `Swapchain::destroy`). The acquire-side wait primitive is a
//! `parking_lot::Mutex` + `Condvar` pair standing in for the single-address
//! atomic wait/notify the source swapchain uses on `usable_count` — see
//! the design notes for why.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use ash::vk;
use parking_lot::{Condvar, Mutex};

use crate::collaborators::{Compositor, GpuContext, WindowHost};
use crate::error::{AcquireError, CreationError, PresentError, Suboptimal, SubmitError};
use crate::interop::{ImageCreateParams, InteropImporter};
use crate::queue::PresentQueue;
use crate::slot::{BufferSlot, BufferState};
use crate::types::{AlphaMode, PresentMode, SwapchainConfig};
use crate::{retire, vsync};

/// A single-address-style wake gate standing in for `usable_count`: a
/// count of slots the renderer may still acquire, plus blocking wait with
/// timeout. Every successful `acquire` consumes one count; every
/// transition back into `Renderable`, `Presentable` (mailbox) or `Waiting`
/// (mailbox re-enable) releases one.
pub(crate) struct UsableGate {
    count: Mutex<u32>,
    changed: Condvar,
}

impl UsableGate {
    fn new(initial: u32) -> Self {
        Self { count: Mutex::new(initial), changed: Condvar::new() }
    }

    /// Blocks until a count is available or `timeout` elapses (`None` =
    /// forever), consuming one count on success.
    fn try_wait(&self, timeout: Option<Duration>) -> bool {
        let mut count = self.count.lock();
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }
            match deadline {
                None => self.changed.wait(&mut count),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let result = self.changed.wait_for(&mut count, deadline - now);
                    if result.timed_out() && *count == 0 {
                        return false;
                    }
                }
            }
        }
    }

    pub(crate) fn release(&self, n: u32) {
        if n == 0 {
            return;
        }
        let mut count = self.count.lock();
        *count += n;
        self.changed.notify_all();
    }

    /// Unconditionally consumes one count without blocking, for the
    /// vsync-presenter's `Presentable -> Presenting` transition: the slot
    /// is known to be counted (it was just observed `Presentable`), so
    /// this always has a count to take.
    pub(crate) fn consume_one(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "usable_count underflow");
        *count = count.saturating_sub(1);
    }

    pub(crate) fn wake_all(&self) {
        self.changed.notify_all();
    }

    #[cfg(any(test, feature = "test-util"))]
    pub(crate) fn get(&self) -> u32 {
        *self.count.lock()
    }
}

/// State touched by more than one slot's transition at a time: the
/// round-robin cursor, the fifo present queue, and mailbox's "most recently
/// promoted" pointer. Design Notes licenses folding `optimal_slot` under
/// the same lock as the present queue rather than keeping it a freestanding
/// atomic, trading a slightly wider critical section for one fewer moving
/// part.
pub(crate) struct CoreShared {
    pub(crate) present_queue: PresentQueue,
    pub(crate) next_round_robin: usize,
    pub(crate) optimal_slot: Option<usize>,
}

/// A fatal outcome observed at present time, stuck on `CoreInner` until
/// `destroy()` so every later `acquire`/`present` call reports the same
/// cause instead of appearing to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum FatalCause {
    DeviceLost = 1,
    SurfaceLost = 2,
}

impl FatalCause {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(FatalCause::DeviceLost),
            2 => Some(FatalCause::SurfaceLost),
            _ => None,
        }
    }
}

pub(crate) struct CoreInner {
    pub(crate) extent: vk::Extent2D,
    pub(crate) format: vk::Format,
    pub(crate) color_space: vk::ColorSpaceKHR,
    pub(crate) alpha_mode: AlphaMode,
    pub(crate) present_mode: PresentMode,
    pub(crate) buffer_count: usize,
    pub(crate) slots: Vec<BufferSlot>,
    pub(crate) usable: UsableGate,
    pub(crate) shared: Mutex<CoreShared>,
    pub(crate) surface_lost: AtomicBool,
    fatal: AtomicU8,
    pub(crate) terminate: AtomicBool,
    pub(crate) window: Arc<dyn WindowHost>,
    pub(crate) compositor: Arc<dyn Compositor>,
    pub(crate) gpu: Arc<dyn GpuContext>,
}

impl CoreInner {
    pub(crate) fn mark_surface_lost(&self) {
        if !self.surface_lost.swap(true, Ordering::AcqRel) {
            log::warn!("surface lost; future acquires will fail");
            self.usable.wake_all();
        }
    }

    pub(crate) fn is_surface_lost(&self) -> bool {
        self.surface_lost.load(Ordering::Acquire)
    }

    /// Sticks `cause` as the swapchain's permanent fatal outcome. A no-op if
    /// a fatal cause was already recorded; the first one wins.
    fn mark_fatal(&self, cause: FatalCause) {
        if self.fatal.compare_exchange(0, cause as u8, Ordering::AcqRel, Ordering::Acquire).is_ok() {
            log::warn!("swapchain entered fatal state: {cause:?}");
            self.usable.wake_all();
        }
    }

    fn fatal_cause(&self) -> Option<FatalCause> {
        FatalCause::from_u8(self.fatal.load(Ordering::Acquire))
    }

    pub(crate) fn should_terminate(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }
}

enum AcquireSelection {
    Immediate(usize),
    WaitOnPrevious { index: usize, wait: (vk::Semaphore, u64) },
}

fn select_slot(inner: &CoreInner, shared: &mut CoreShared) -> Option<AcquireSelection> {
    let n = inner.buffer_count;
    match inner.present_mode {
        PresentMode::Fifo => {
            for step in 0..n {
                let idx = (shared.next_round_robin + step) % n;
                if inner.slots[idx].try_begin_render() {
                    shared.next_round_robin = (idx + 1) % n;
                    return Some(AcquireSelection::Immediate(idx));
                }
            }
            None
        }
        PresentMode::Mailbox => {
            let skip = shared.optimal_slot;

            for step in 0..n {
                let idx = (shared.next_round_robin + step) % n;
                if Some(idx) == skip {
                    continue;
                }
                if inner.slots[idx].try_begin_render() {
                    shared.next_round_robin = (idx + 1) % n;
                    return Some(AcquireSelection::Immediate(idx));
                }
            }
            for step in 0..n {
                let idx = (shared.next_round_robin + step) % n;
                if Some(idx) == skip {
                    continue;
                }
                if inner.slots[idx].try_reclaim_presentable_for_render() {
                    shared.next_round_robin = (idx + 1) % n;
                    return Some(AcquireSelection::Immediate(idx));
                }
            }
            for step in 0..n {
                let idx = (shared.next_round_robin + step) % n;
                if Some(idx) == skip {
                    continue;
                }
                let slot = &inner.slots[idx];
                if slot.try_begin_double_render() {
                    shared.next_round_robin = (idx + 1) % n;
                    let wait_value = slot.expected_value.load(Ordering::Acquire);
                    return Some(AcquireSelection::WaitOnPrevious {
                        index: idx,
                        wait: (slot.fence.semaphore, wait_value),
                    });
                }
            }
            None
        }
    }
}

/// Runs the fifo/mailbox bookkeeping that follows any promotion of a slot
/// to `Presentable`, regardless of which path produced it (direct
/// no-wait present, or a render-done fire observed by `RetireWaiter`).
/// Callers must transition the slot's state to `Presentable` first.
pub(crate) fn run_promotion_bookkeeping(inner: &CoreInner, index: usize) {
    debug_assert_eq!(inner.slots[index].state(), BufferState::Presentable);

    let mut shared = inner.shared.lock();
    match inner.present_mode {
        PresentMode::Fifo => shared.present_queue.push_back(index),
        PresentMode::Mailbox => {
            if let Some(previous) = shared.optimal_slot {
                if previous != index && inner.slots[previous].state() == BufferState::Presentable {
                    drop(shared);
                    abandon_presentable(inner, previous);
                    shared = inner.shared.lock();
                }
            }
            shared.optimal_slot = Some(index);
        }
    }
}

fn abandon_presentable(inner: &CoreInner, index: usize) {
    let slot = &inner.slots[index];
    if slot.state() == BufferState::Presentable {
        slot.abandon_to_renderable();
        inner.usable.release(1);
    }
}

/// Handle to a live swapchain. Construction spawns `RetireWaiter` and
/// `VsyncPresenter`; dropping without calling [`SwapchainCore::destroy`]
/// leaks the worker threads (matching the teacher's explicit-destroy
/// convention over `Drop`-based teardown).
pub struct SwapchainCore {
    inner: Arc<CoreInner>,
    retire_handle: Mutex<Option<JoinHandle<()>>>,
    vsync_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SwapchainCore {
    pub fn new(
        window: Arc<dyn WindowHost>,
        gpu: Arc<dyn GpuContext>,
        compositor: Arc<dyn Compositor>,
        importer: &dyn InteropImporter,
        shared_texture_handles: &[u64],
        shared_fence_handles: &[u64],
        config: SwapchainConfig,
    ) -> Result<Self, CreationError> {
        let config = config.validated()?;
        if shared_texture_handles.len() != config.min_image_count as usize
            || shared_fence_handles.len() != config.min_image_count as usize
        {
            return Err(CreationError::InvalidArgument(
                "one shared texture handle and one shared fence handle are required per buffer",
            ));
        }

        if !window.try_bind_swapchain() {
            return Err(CreationError::NativeWindowInUse);
        }

        let buffer_count = config.min_image_count as usize;
        let image_params = ImageCreateParams {
            extent: config.image_extent,
            format: config.image_format,
            usage: config.image_usage,
        };

        let mut slots = Vec::with_capacity(buffer_count);
        let build_result = (|| -> Result<(), CreationError> {
            for i in 0..buffer_count {
                let image = importer.import_texture(shared_texture_handles[i], &image_params)?;
                let fence = importer.import_fence(shared_fence_handles[i])?;
                let handle = compositor
                    .register_buffer(image.image)
                    .map_err(|_| CreationError::OutOfDeviceMemory)?;
                slots.push(BufferSlot::new(image, fence, handle));
            }
            Ok(())
        })();

        if let Err(err) = build_result {
            for slot in slots.iter().rev() {
                compositor.unregister_buffer(slot.compositor_handle);
                gpu.destroy_image_view(slot.image.view);
                gpu.destroy_image(slot.image.image);
                gpu.destroy_semaphore(slot.fence.semaphore);
            }
            window.unbind_swapchain();
            return Err(err);
        }

        let inner = Arc::new(CoreInner {
            extent: config.image_extent,
            format: config.image_format,
            color_space: config.image_color_space,
            alpha_mode: config.composite_alpha,
            present_mode: config.present_mode,
            buffer_count,
            slots,
            usable: UsableGate::new(buffer_count as u32),
            shared: Mutex::new(CoreShared {
                present_queue: PresentQueue::new(buffer_count),
                next_round_robin: 0,
                optimal_slot: None,
            }),
            surface_lost: AtomicBool::new(false),
            fatal: AtomicU8::new(0),
            terminate: AtomicBool::new(false),
            window,
            compositor,
            gpu,
        });

        let retire_handle = {
            let inner = Arc::clone(&inner);
            std::thread::Builder::new()
                .name("retire-waiter".into())
                .spawn(move || retire::run(inner))
                .expect("failed to spawn retire-waiter thread")
        };
        let vsync_handle = {
            let inner = Arc::clone(&inner);
            std::thread::Builder::new()
                .name("vsync-presenter".into())
                .spawn(move || vsync::run(inner))
                .expect("failed to spawn vsync-presenter thread")
        };

        Ok(Self {
            inner,
            retire_handle: Mutex::new(Some(retire_handle)),
            vsync_handle: Mutex::new(Some(vsync_handle)),
        })
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.inner.extent
    }

    pub fn present_mode(&self) -> PresentMode {
        self.inner.present_mode
    }

    /// Reads a slot's current state without taking part in the state
    /// machine. For integration tests driving the worker threads from
    /// outside; not meant for production callers.
    #[cfg(any(test, feature = "test-util"))]
    pub fn debug_slot_state(&self, index: usize) -> BufferState {
        self.inner.slots[index].state()
    }

    /// Reads the current `usable_count` credit. For integration tests only.
    #[cfg(any(test, feature = "test-util"))]
    pub fn debug_usable_count(&self) -> u32 {
        self.inner.usable.get()
    }

    /// Picks a slot and transitions it to a rendering state. `timeout` of
    /// `None` waits forever. `Some(Duration::ZERO)` makes exactly one
    /// non-blocking attempt, returning `NotReady` rather than `Timeout` if
    /// nothing is available.
    pub fn acquire(
        &self,
        timeout: Option<Duration>,
        signal: Option<(vk::Semaphore, u64)>,
    ) -> Result<usize, AcquireError> {
        if let Some(cause) = self.inner.fatal_cause() {
            return Err(match cause {
                FatalCause::DeviceLost => AcquireError::DeviceLost,
                FatalCause::SurfaceLost => AcquireError::SurfaceLost,
            });
        }

        if self.inner.is_surface_lost() {
            return Err(AcquireError::SurfaceLost);
        }

        if matches!(timeout, Some(d) if d.is_zero()) {
            return match self.try_once(signal) {
                Some(index) => Ok(index),
                None => Err(AcquireError::NotReady),
            };
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let remaining = match deadline {
                None => None,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(AcquireError::Timeout);
                    }
                    Some(deadline - now)
                }
            };

            if !self.inner.usable.try_wait(remaining) {
                return Err(AcquireError::Timeout);
            }

            if let Some(cause) = self.inner.fatal_cause() {
                self.inner.usable.release(1);
                return Err(match cause {
                    FatalCause::DeviceLost => AcquireError::DeviceLost,
                    FatalCause::SurfaceLost => AcquireError::SurfaceLost,
                });
            }

            if self.inner.is_surface_lost() {
                self.inner.usable.release(1);
                return Err(AcquireError::SurfaceLost);
            }

            match self.select_and_signal(signal) {
                Some(index) => return Ok(index),
                None => {
                    // usable_count said a slot should exist but the scan found
                    // none eligible to skip (e.g. the sole candidate is
                    // mailbox's skipped optimal_slot); restore the credit and
                    // retry within whatever budget remains.
                    self.inner.usable.release(1);
                    continue;
                }
            }
        }
    }

    /// A single non-blocking acquire attempt: takes a usable-count credit
    /// only if one is immediately available, then tries to select a slot.
    fn try_once(&self, signal: Option<(vk::Semaphore, u64)>) -> Option<usize> {
        if !self.inner.usable.try_wait(Some(Duration::ZERO)) {
            return None;
        }
        match self.select_and_signal(signal) {
            Some(index) => Some(index),
            None => {
                self.inner.usable.release(1);
                None
            }
        }
    }

    /// Assumes a usable-count credit has already been taken. Scans for a
    /// qualifying slot and, on success, issues the GPU signal the caller
    /// asked for.
    fn select_and_signal(&self, signal: Option<(vk::Semaphore, u64)>) -> Option<usize> {
        let selection = {
            let mut shared = self.inner.shared.lock();
            select_slot(&self.inner, &mut shared)
        };

        match selection {
            Some(AcquireSelection::Immediate(index)) => {
                if let Some(signal) = signal {
                    if let Err(err) = self.inner.gpu.submit_semaphore_signal(&[], signal) {
                        log::warn!("acquire signal submit failed: {err}");
                    }
                }
                Some(index)
            }
            Some(AcquireSelection::WaitOnPrevious { index, wait }) => {
                if let Some(signal) = signal {
                    if let Err(err) = self.inner.gpu.submit_semaphore_signal(&[wait], signal) {
                        log::warn!("acquire wait+signal submit failed: {err}");
                    }
                }
                Some(index)
            }
            None => None,
        }
    }

    /// Transitions a previously acquired slot toward presentation.
    pub fn present(
        &self,
        index: usize,
        wait_semaphores: &[(vk::Semaphore, u64)],
    ) -> Result<Option<Suboptimal>, PresentError> {
        if index >= self.inner.buffer_count {
            return Err(PresentError::InvalidArgument("slot index out of range"));
        }

        if let Some(cause) = self.inner.fatal_cause() {
            return Err(match cause {
                FatalCause::DeviceLost => PresentError::DeviceLost,
                FatalCause::SurfaceLost => PresentError::SurfaceLost,
            });
        }

        let slot = &self.inner.slots[index];
        let was_double = match slot.state() {
            BufferState::Rendering => false,
            BufferState::DoubleRendering => true,
            _ => return Err(PresentError::Suboptimal),
        };

        if self.inner.is_surface_lost() {
            // The compositor is lost, not the device or the GPU's surface
            // handle; this present is simply moot until a new swapchain is
            // created against a live surface.
            return Err(PresentError::OutOfDate);
        }

        if wait_semaphores.is_empty() {
            slot.promote_direct_to_presentable();
            run_promotion_bookkeeping(&self.inner, index);
            return Ok(None);
        }

        let signal_value = slot.expected_value.fetch_add(1, Ordering::AcqRel) + 1;
        if let Err(err) = self
            .inner
            .gpu
            .submit_semaphore_signal(wait_semaphores, (slot.fence.semaphore, signal_value))
        {
            log::warn!("present submit failed: {err}");
            let present_err = match err {
                SubmitError::DeviceLost => PresentError::DeviceLost,
                SubmitError::SurfaceLost => PresentError::SurfaceLost,
                SubmitError::OutOfDate => PresentError::OutOfDate,
                SubmitError::OutOfHostMemory => PresentError::OutOfHostMemory,
            };
            if matches!(present_err, PresentError::DeviceLost | PresentError::SurfaceLost) {
                self.inner.mark_fatal(match err {
                    SubmitError::DeviceLost => FatalCause::DeviceLost,
                    SubmitError::SurfaceLost => FatalCause::SurfaceLost,
                    _ => unreachable!(),
                });
            }
            return Err(present_err);
        }

        slot.submit_render_done();
        if !was_double {
            // Mailbox re-enables pre-acquire on the newly Waiting slot; fifo
            // leaves usable_count untouched until retirement.
            if self.inner.present_mode == PresentMode::Mailbox {
                self.inner.usable.release(1);
            }
        }
        Ok(None)
    }

    /// Joins both worker threads, drains all GPU/compositor handles in
    /// reverse construction order, and releases the window binding.
    pub fn destroy(&self) {
        self.inner.terminate.store(true, Ordering::Release);
        self.inner.usable.wake_all();

        if let Some(handle) = self.retire_handle.lock().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.vsync_handle.lock().take() {
            let _ = handle.join();
        }

        for slot in self.inner.slots.iter().rev() {
            self.inner.compositor.unregister_buffer(slot.compositor_handle);
            self.inner.gpu.destroy_image_view(slot.image.view);
            self.inner.gpu.destroy_image(slot.image.image);
            self.inner.gpu.destroy_semaphore(slot.fence.semaphore);
        }
        self.inner.window.unbind_swapchain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use crate::testutil::{FakeCompositor, FakeGpuContext, FakeInteropImporter, FakeWindowHost};

    fn build_core(present_mode: PresentMode, count: u32) -> SwapchainCore {
        let window = Arc::new(FakeWindowHost::new(vk::Extent2D { width: 640, height: 480 }, 1));
        let gpu = Arc::new(FakeGpuContext::new());
        let compositor = Arc::new(FakeCompositor::new());
        let importer = FakeInteropImporter::new();

        let handles: Vec<u64> = (0..count as u64).collect();
        let config = SwapchainConfig::new(
            vk::Format::B8G8R8A8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 640, height: 480 },
        )
        .with_image_count(count)
        .with_present_mode(present_mode);

        SwapchainCore::new(window, gpu, compositor, &importer, &handles, &handles, config)
            .expect("core construction should succeed")
    }

    fn build_core_with_fakes(
        present_mode: PresentMode,
        count: u32,
    ) -> (SwapchainCore, Arc<FakeCompositor>, Arc<FakeGpuContext>) {
        let window = Arc::new(FakeWindowHost::new(vk::Extent2D { width: 640, height: 480 }, 1));
        let gpu = Arc::new(FakeGpuContext::new());
        let compositor = Arc::new(FakeCompositor::new());
        let importer = FakeInteropImporter::new();

        let handles: Vec<u64> = (0..count as u64).collect();
        let config = SwapchainConfig::new(
            vk::Format::B8G8R8A8_UNORM,
            vk::ColorSpaceKHR::SRGB_NONLINEAR,
            vk::Extent2D { width: 640, height: 480 },
        )
        .with_image_count(count)
        .with_present_mode(present_mode);

        let core = SwapchainCore::new(
            Arc::clone(&window) as Arc<dyn WindowHost>,
            Arc::clone(&gpu) as Arc<dyn GpuContext>,
            Arc::clone(&compositor) as Arc<dyn Compositor>,
            &importer,
            &handles,
            &handles,
            config,
        )
        .expect("core construction should succeed");

        (core, compositor, gpu)
    }

    #[test]
    fn fresh_fifo_core_acquires_all_slots_then_times_out() {
        let core = build_core(PresentMode::Fifo, 3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..3 {
            let index = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
            seen.insert(index);
        }
        assert_eq!(seen.len(), 3);

        let result = core.acquire(Some(Duration::ZERO), None);
        assert!(matches!(result, Err(AcquireError::NotReady)));
        core.destroy();
    }

    #[test]
    fn fifo_present_without_wait_promotes_and_enqueues() {
        let core = build_core(PresentMode::Fifo, 2);
        let index = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
        core.present(index, &[]).unwrap();
        assert_eq!(core.inner.slots[index].state(), BufferState::Presentable);
        assert_eq!(core.inner.shared.lock().present_queue.len(), 1);
        core.destroy();
    }

    #[test]
    fn present_rejects_slot_not_owned_by_caller() {
        let core = build_core(PresentMode::Fifo, 2);
        let result = core.present(0, &[]);
        assert!(matches!(result, Err(PresentError::Suboptimal)));
        core.destroy();
    }

    #[test]
    fn mailbox_abandons_older_presentable_and_restores_credit() {
        let core = build_core(PresentMode::Mailbox, 2);
        let a = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
        core.present(a, &[]).unwrap();
        assert_eq!(core.inner.usable.get(), 1);

        let b = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
        core.present(b, &[]).unwrap();

        assert_eq!(core.inner.slots[a].state(), BufferState::Renderable);
        assert_eq!(core.inner.slots[b].state(), BufferState::Presentable);
        assert_eq!(core.inner.shared.lock().optimal_slot, Some(b));
        core.destroy();
    }

    #[test]
    fn present_is_out_of_date_when_compositor_is_lost() {
        let (core, compositor, _gpu) = build_core_with_fakes(PresentMode::Fifo, 2);
        let index = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
        compositor.lose();

        // mark_surface_lost is set by RetireWaiter observing is_lost(); poke
        // the flag directly here so the assertion doesn't race the thread.
        core.inner.mark_surface_lost();

        let result = core.present(index, &[]);
        assert!(matches!(result, Err(PresentError::OutOfDate)));
        core.destroy();
    }

    #[test]
    fn present_submit_failure_preserves_cause_and_sticks_it() {
        let (core, _compositor, gpu) = build_core_with_fakes(PresentMode::Fifo, 2);
        let index = core.acquire(Some(Duration::from_millis(50)), None).unwrap();
        gpu.fail_submits_with(crate::error::SubmitError::DeviceLost);

        let result = core.present(index, &[(vk::Semaphore::from_raw(1), 1)]);
        assert!(matches!(result, Err(PresentError::DeviceLost)));

        let result = core.acquire(Some(Duration::from_millis(50)), None);
        assert!(matches!(result, Err(AcquireError::DeviceLost)));
        core.destroy();
    }
}
