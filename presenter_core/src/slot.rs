//! Per-buffer state machine.
//!
//! Grounded on `original_source`'s `CPresentationBuffer` (the `enum class
//! EBufferState` and its transition sites in `CSwapchainAcquireNextImage`
//! / `CSwapchainPresent` / the two present-thread functions), translated
//! from a `std::atomic<EBufferState>` plus a handful of loose fields into
//! one `AtomicU8`-backed type with accessor methods that make each legal
//! transition explicit instead of open-coding `compare_exchange` calls at
//! every call site.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::collaborators::CompositorBufferHandle;
use crate::interop::{ImportedFence, ImportedImage};

/// The state of one swapchain image, as owned jointly by the renderer
/// thread, the retire-waiter thread and the vsync-presenter thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferState {
    /// Free to acquire and render into.
    Renderable = 0,
    /// Acquired by the renderer, render work in flight, not yet queued to
    /// present.
    Rendering = 1,
    /// Rendering finished and the renderer acquired and started rendering
    /// into this slot *again* before its previous content was presented
    /// (mailbox mode only: the older content is abandoned in place).
    DoubleRendering = 2,
    /// Render work submitted, waiting on the retire-waiter thread to
    /// observe the timeline semaphore reach its expected value.
    Waiting = 3,
    /// A `DoubleRendering` slot whose *newer* render work has now also
    /// been submitted; the retire-waiter must wait for the newer value
    /// and discard a stale fire of the older one.
    DoubleWaiting = 4,
    /// Render work complete, queued for the vsync-presenter thread to bind
    /// to the compositor.
    Presentable = 5,
    /// Bound to the compositor, waiting for it to report the buffer
    /// retired before becoming `Renderable` again.
    Presenting = 6,
}

impl BufferState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BufferState::Renderable,
            1 => BufferState::Rendering,
            2 => BufferState::DoubleRendering,
            3 => BufferState::Waiting,
            4 => BufferState::DoubleWaiting,
            5 => BufferState::Presentable,
            6 => BufferState::Presenting,
            _ => unreachable!("invalid buffer state byte"),
        }
    }
}

/// One swapchain image plus everything its state machine needs: the
/// imported GPU resources, the registered compositor handle, and the
/// timeline-semaphore bookkeeping the retire-waiter reads to decide
/// whether a render-done signal is stale.
pub struct BufferSlot {
    state: AtomicU8,
    pub image: ImportedImage,
    pub fence: ImportedFence,
    pub compositor_handle: CompositorBufferHandle,
    /// The timeline value this slot's render work is expected to reach.
    /// Bumped by the renderer on every acquire; read by the retire-waiter
    /// to detect a `DoubleWaiting` slot's stale (superseded) fire.
    pub expected_value: AtomicU64,
}

impl BufferSlot {
    pub fn new(
        image: ImportedImage,
        fence: ImportedFence,
        compositor_handle: CompositorBufferHandle,
    ) -> Self {
        Self {
            state: AtomicU8::new(BufferState::Renderable as u8),
            image,
            fence,
            compositor_handle,
            expected_value: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> BufferState {
        BufferState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: BufferState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// `Renderable -> Rendering` on a fresh acquire. Returns `false` (no
    /// transition) if the slot was not `Renderable`.
    pub fn try_begin_render(&self) -> bool {
        self.state
            .compare_exchange(
                BufferState::Renderable as u8,
                BufferState::Rendering as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `Presentable -> Rendering` when mailbox mode re-acquires a slot that
    /// reached the front of the present queue without ever being bound to
    /// the compositor. Returns `false` if the slot was not `Presentable`.
    pub fn try_reclaim_presentable_for_render(&self) -> bool {
        self.state
            .compare_exchange(
                BufferState::Presentable as u8,
                BufferState::Rendering as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `Waiting -> DoubleRendering`, for mailbox mode re-acquiring a slot
    /// whose previous render work is already submitted and awaiting GPU
    /// completion. Returns `false` if the slot was not `Waiting`.
    pub fn try_begin_double_render(&self) -> bool {
        self.state
            .compare_exchange(
                BufferState::Waiting as u8,
                BufferState::DoubleRendering as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `Rendering -> Waiting` or `DoubleRendering -> DoubleWaiting`, called
    /// once the renderer has submitted its render-done signal.
    pub fn submit_render_done(&self) {
        match self.state() {
            BufferState::Rendering => self.set_state(BufferState::Waiting),
            BufferState::DoubleRendering => self.set_state(BufferState::DoubleWaiting),
            other => panic!("submit_render_done called from invalid state {other:?}"),
        }
    }

    /// `Waiting -> Presentable` when the retire-waiter observes the
    /// expected timeline value reached. Invalid from any other state.
    pub fn mark_presentable(&self) {
        debug_assert_eq!(self.state(), BufferState::Waiting);
        self.set_state(BufferState::Presentable);
    }

    /// `DoubleWaiting -> Waiting`, consuming a stale fire so the
    /// retire-waiter knows to keep watching for the newer value.
    pub fn demote_double_waiting(&self) {
        debug_assert_eq!(self.state(), BufferState::DoubleWaiting);
        self.set_state(BufferState::Waiting);
    }

    /// `DoubleWaiting -> Presentable`, once the retire-waiter confirms the
    /// fence counter has caught up to the slot's current `expected_value`.
    pub fn mark_presentable_from_double_waiting(&self) {
        debug_assert_eq!(self.state(), BufferState::DoubleWaiting);
        self.set_state(BufferState::Presentable);
    }

    /// `Rendering`/`DoubleRendering` -> `Presentable` directly, for
    /// `present` calls made without wait semaphores (no GPU work to await).
    pub fn promote_direct_to_presentable(&self) {
        debug_assert!(matches!(self.state(), BufferState::Rendering | BufferState::DoubleRendering));
        self.set_state(BufferState::Presentable);
    }

    /// `Presentable -> Renderable` directly, when mailbox mode abandons a
    /// slot that was never scanned out because a newer one displaced it.
    pub fn abandon_to_renderable(&self) {
        debug_assert_eq!(self.state(), BufferState::Presentable);
        self.set_state(BufferState::Renderable);
    }

    /// `Presentable -> Presenting`, when the vsync-presenter binds this
    /// slot to the compositor.
    pub fn begin_present(&self) {
        debug_assert_eq!(self.state(), BufferState::Presentable);
        self.set_state(BufferState::Presenting);
    }

    /// `Presenting -> Renderable`, once the compositor reports the buffer
    /// retired.
    pub fn retire(&self) {
        debug_assert_eq!(self.state(), BufferState::Presenting);
        self.set_state(BufferState::Renderable);
    }

}
