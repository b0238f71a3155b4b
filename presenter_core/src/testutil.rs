//! In-memory fakes for the three external collaborator traits, used by the
//! unit tests throughout the crate and, behind the `test-util` feature, by
//! the `tests/` integration suite as well.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;

use crate::collaborators::{Compositor, CompositorBufferHandle, GpuContext, VsyncWake, WindowHost};
use crate::error::SubmitError;
use crate::interop::{ImageCreateParams, ImportedFence, ImportedImage, InteropError, InteropImporter};
use crate::slot::BufferSlot;

pub fn dummy_slot() -> BufferSlot {
    BufferSlot::new(
        ImportedImage { image: vk::Image::from_raw(1), view: vk::ImageView::from_raw(1) },
        ImportedFence { semaphore: vk::Semaphore::from_raw(1) },
        0,
    )
}

pub struct FakeWindowHost {
    extent: Mutex<Option<vk::Extent2D>>,
    adapter_luid: u64,
    bound: AtomicBool,
}

impl FakeWindowHost {
    pub fn new(extent: vk::Extent2D, adapter_luid: u64) -> Self {
        Self { extent: Mutex::new(Some(extent)), adapter_luid, bound: AtomicBool::new(false) }
    }

    pub fn lose(&self) {
        *self.extent.lock() = None;
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }
}

impl WindowHost for FakeWindowHost {
    fn extent(&self) -> Option<vk::Extent2D> {
        *self.extent.lock()
    }

    fn adapter_luid(&self) -> u64 {
        self.adapter_luid
    }

    fn try_bind_swapchain(&self) -> bool {
        !self.bound.swap(true, Ordering::AcqRel)
    }

    fn unbind_swapchain(&self) {
        self.bound.store(false, Ordering::Release);
    }
}

pub struct FakeCompositor {
    next_handle: AtomicU64,
    lost: AtomicBool,
    pending_tick: AtomicBool,
    auto_available: AtomicBool,
    present_log: Mutex<Vec<CompositorBufferHandle>>,
    retired: Mutex<HashSet<CompositorBufferHandle>>,
    unregistered: Mutex<HashSet<CompositorBufferHandle>>,
}

impl FakeCompositor {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            lost: AtomicBool::new(false),
            pending_tick: AtomicBool::new(false),
            auto_available: AtomicBool::new(true),
            present_log: Mutex::new(Vec::new()),
            retired: Mutex::new(HashSet::new()),
            unregistered: Mutex::new(HashSet::new()),
        }
    }

    pub fn lose(&self) {
        self.lost.store(true, Ordering::Release);
    }

    /// Arms a single vsync tick; the next `wait_vsync` call (or the one
    /// currently blocked) observes it and returns `Tick`.
    pub fn request_tick(&self) {
        self.pending_tick.store(true, Ordering::Release);
    }

    /// Switches `is_available` from "always true" to "only handles passed
    /// to `mark_retired`", so a test can hold a `Presenting` slot pinned
    /// until it explicitly releases it.
    pub fn set_manual_retire(&self) {
        self.auto_available.store(false, Ordering::Release);
    }

    pub fn mark_retired(&self, handle: CompositorBufferHandle) {
        self.retired.lock().insert(handle);
    }

    /// The sequence of handles passed to `present`, in call order.
    pub fn present_log(&self) -> Vec<CompositorBufferHandle> {
        self.present_log.lock().clone()
    }

    pub fn is_unregistered(&self, handle: CompositorBufferHandle) -> bool {
        self.unregistered.lock().contains(&handle)
    }
}

impl Compositor for FakeCompositor {
    fn register_buffer(&self, _image: vk::Image) -> anyhow::Result<CompositorBufferHandle> {
        Ok(self.next_handle.fetch_add(1, Ordering::AcqRel))
    }

    fn unregister_buffer(&self, handle: CompositorBufferHandle) {
        self.unregistered.lock().insert(handle);
    }

    fn is_available(&self, handle: CompositorBufferHandle) -> anyhow::Result<bool> {
        if self.auto_available.load(Ordering::Acquire) {
            Ok(true)
        } else {
            // Edge-triggered: a manual retirement is consumed by the first
            // check that observes it, matching a real compositor's
            // buffer-released notification firing once per present cycle.
            Ok(self.retired.lock().remove(&handle))
        }
    }

    fn set_source_rect(&self, _extent: vk::Extent2D) {}

    fn set_alpha_mode(&self, _mode: crate::types::AlphaMode) {}

    fn set_color_space(&self, _format: vk::Format, _color_space: vk::ColorSpaceKHR) {}

    fn present(&self, handle: CompositorBufferHandle) -> anyhow::Result<()> {
        self.present_log.lock().push(handle);
        Ok(())
    }

    fn wait_vsync(&self, timeout: Duration) -> VsyncWake {
        let deadline = Instant::now() + timeout.min(Duration::from_millis(20));
        loop {
            if self.lost.load(Ordering::Acquire) {
                return VsyncWake::Lost;
            }
            if self.pending_tick.swap(false, Ordering::AcqRel) {
                return VsyncWake::Tick;
            }
            if Instant::now() >= deadline {
                return VsyncWake::Timeout;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

pub struct FakeGpuContext {
    auto_complete: AtomicBool,
    counters: Mutex<HashMap<u64, u64>>,
    submissions: Mutex<Vec<(Vec<(u64, u64)>, (u64, u64))>>,
    destroyed_semaphores: Mutex<HashSet<u64>>,
    destroyed_image_views: Mutex<HashSet<u64>>,
    destroyed_images: Mutex<HashSet<u64>>,
    fail_submits_with: Mutex<Option<SubmitError>>,
}

impl FakeGpuContext {
    pub fn new() -> Self {
        Self {
            auto_complete: AtomicBool::new(true),
            counters: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            destroyed_semaphores: Mutex::new(HashSet::new()),
            destroyed_image_views: Mutex::new(HashSet::new()),
            destroyed_images: Mutex::new(HashSet::new()),
            fail_submits_with: Mutex::new(None),
        }
    }

    /// Makes every subsequent `submit_semaphore_signal` call fail with
    /// `error`, simulating a lost device or surface observed at submit time.
    pub fn fail_submits_with(&self, error: SubmitError) {
        *self.fail_submits_with.lock() = Some(error);
    }

    /// Disables the default behavior of a submitted signal being visible
    /// immediately; a test must call `complete` explicitly to simulate the
    /// GPU reaching a timeline value, letting it hold a slot in
    /// `Waiting`/`DoubleWaiting` for as long as it needs.
    pub fn set_manual_complete(&self) {
        self.auto_complete.store(false, Ordering::Release);
    }

    /// Simulates the GPU reaching `value` on `semaphore`'s timeline.
    pub fn complete(&self, semaphore: vk::Semaphore, value: u64) {
        self.counters.lock().insert(semaphore.as_raw(), value);
    }

    /// Every `(waits, signal)` pair passed to `submit_semaphore_signal`, in
    /// call order, with handles reduced to their raw `u64` form.
    pub fn submissions(&self) -> Vec<(Vec<(u64, u64)>, (u64, u64))> {
        self.submissions.lock().clone()
    }

    pub fn is_semaphore_destroyed(&self, semaphore: vk::Semaphore) -> bool {
        self.destroyed_semaphores.lock().contains(&semaphore.as_raw())
    }

    pub fn is_image_destroyed(&self, image: vk::Image) -> bool {
        self.destroyed_images.lock().contains(&image.as_raw())
    }
}

impl GpuContext for FakeGpuContext {
    fn submit_semaphore_signal(
        &self,
        waits: &[(vk::Semaphore, u64)],
        signal: (vk::Semaphore, u64),
    ) -> Result<(), SubmitError> {
        if let Some(error) = *self.fail_submits_with.lock() {
            return Err(error);
        }
        self.submissions.lock().push((
            waits.iter().map(|(sem, value)| (sem.as_raw(), *value)).collect(),
            (signal.0.as_raw(), signal.1),
        ));
        if self.auto_complete.load(Ordering::Acquire) {
            self.counters.lock().insert(signal.0.as_raw(), signal.1);
        }
        Ok(())
    }

    fn semaphore_counter_value(&self, semaphore: vk::Semaphore) -> anyhow::Result<u64> {
        Ok(self.counters.lock().get(&semaphore.as_raw()).copied().unwrap_or(0))
    }

    fn wait_any_timeline(
        &self,
        waits: &[(vk::Semaphore, u64)],
        timeout: Duration,
    ) -> anyhow::Result<Option<usize>> {
        let deadline = Instant::now() + timeout.min(Duration::from_millis(20));
        loop {
            {
                let counters = self.counters.lock();
                if let Some(fired) = waits
                    .iter()
                    .position(|(sem, value)| counters.get(&sem.as_raw()).copied().unwrap_or(0) >= *value)
                {
                    return Ok(Some(fired));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.destroyed_semaphores.lock().insert(semaphore.as_raw());
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.destroyed_image_views.lock().insert(view.as_raw());
    }

    fn destroy_image(&self, image: vk::Image) {
        self.destroyed_images.lock().insert(image.as_raw());
    }
}

pub struct FakeInteropImporter;

impl FakeInteropImporter {
    pub fn new() -> Self {
        Self
    }
}

impl InteropImporter for FakeInteropImporter {
    fn import_texture(
        &self,
        shared_texture_handle: u64,
        _params: &ImageCreateParams,
    ) -> Result<ImportedImage, InteropError> {
        Ok(ImportedImage {
            image: vk::Image::from_raw(shared_texture_handle + 1),
            view: vk::ImageView::from_raw(shared_texture_handle + 1),
        })
    }

    fn import_fence(&self, shared_fence_handle: u64) -> Result<ImportedFence, InteropError> {
        Ok(ImportedFence { semaphore: vk::Semaphore::from_raw(shared_fence_handle + 1000) })
    }
}
