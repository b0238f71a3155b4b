//! `VsyncPresenter` — the single-threaded authority that hands one buffer
//! to the compositor per vertical-blank tick.
//!
//! Grounded on `original_source`'s second present-thread function
//! (`CSwapchainPresentThreadFunc2` in `CSwapVK.cpp`), which waits on the
//! compositor's frame-statistics event and, on each wake, picks the next
//! buffer to hand over per the active present mode.

use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::VsyncWake;
use crate::core::CoreInner;
use crate::slot::BufferState;
use crate::types::PresentMode;

const WAIT_TIMEOUT: Duration = Duration::from_millis(250);

pub(crate) fn run(inner: Arc<CoreInner>) {
    loop {
        if inner.should_terminate() {
            return;
        }

        match inner.compositor.wait_vsync(WAIT_TIMEOUT) {
            VsyncWake::Lost => inner.mark_surface_lost(),
            VsyncWake::Timeout => {}
            VsyncWake::Tick => present_one_tick(&inner),
        }
    }
}

fn present_one_tick(inner: &CoreInner) {
    let chosen = {
        let mut shared = inner.shared.lock();
        match inner.present_mode {
            PresentMode::Fifo => shared.present_queue.pop_front(),
            PresentMode::Mailbox => {
                if let Some(optimal) = shared.optimal_slot {
                    if inner.slots[optimal].state() == BufferState::Presentable {
                        shared.optimal_slot = None;
                        Some(optimal)
                    } else {
                        scan_for_presentable(inner)
                    }
                } else {
                    scan_for_presentable(inner)
                }
            }
        }
    };

    let Some(index) = chosen else {
        // Nothing ready this tick; not a violation of any invariant.
        return;
    };

    let slot = &inner.slots[index];
    if slot.state() != BufferState::Presentable {
        // Lost a race against something else moving the slot; skip this
        // tick rather than presenting a buffer we no longer own the claim to.
        return;
    }
    slot.begin_present();
    inner.usable.consume_one();

    inner.compositor.set_source_rect(inner.extent);
    inner.compositor.set_alpha_mode(inner.alpha_mode);
    inner.compositor.set_color_space(inner.format, inner.color_space);

    if let Err(err) = inner.compositor.present(slot.compositor_handle) {
        log::warn!("compositor present failed for slot {index}: {err:#}");
    }
}

fn scan_for_presentable(inner: &CoreInner) -> Option<usize> {
    inner
        .slots
        .iter()
        .position(|slot| slot.state() == BufferState::Presentable)
}
