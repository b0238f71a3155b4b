//! `RetireWaiter` — the single-threaded authority that moves slots out of
//! the rendering-pipeline states.
//!
//! The source waits on one OS "wait for multiple objects" call across a
//! fixed event set `[lost, terminate, retire, render_done_0..N)`. There is
//! no portable multi-object blocking wait over a Vulkan timeline semaphore
//! and an OS compositor handle at once, so this translates the same
//! "first fired" shape into a bounded poll: each iteration waits on the
//! render-done semaphores of every in-flight slot via
//! [`GpuContext::wait_any_timeline`] with a short timeout, then always runs
//! a retire scan over `Presenting` slots before looping. Lost/terminate are
//! plain atomics checked every iteration. This keeps the single-writer
//! property (only this thread promotes a slot out of Waiting/DoubleWaiting
//! or out of Presenting) without needing an OS-level multi-object wait.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{run_promotion_bookkeeping, CoreInner};
use crate::slot::BufferState;
use crate::types::PresentMode;

/// Poll granularity for the render-done and retire scans. Short enough
/// that `destroy` joins promptly, long enough to avoid spinning.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

pub(crate) fn run(inner: Arc<CoreInner>) {
    loop {
        if inner.should_terminate() {
            return;
        }

        if inner.compositor.is_lost() {
            inner.mark_surface_lost();
        }

        let waits: Vec<(ash::vk::Semaphore, u64, usize)> = inner
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot.state() {
                BufferState::Waiting | BufferState::DoubleWaiting => {
                    Some((slot.fence.semaphore, slot.expected_value.load(Ordering::Acquire), index))
                }
                _ => None,
            })
            .collect();

        if !waits.is_empty() {
            let pairs: Vec<(ash::vk::Semaphore, u64)> = waits.iter().map(|(s, v, _)| (*s, *v)).collect();
            match inner.gpu.wait_any_timeline(&pairs, POLL_INTERVAL) {
                Ok(Some(fired)) => {
                    let (_, expected, index) = waits[fired];
                    handle_render_done(&inner, index, expected);
                }
                Ok(None) => {}
                Err(err) => log::warn!("retire-waiter wait_any_timeline failed: {err:#}"),
            }
        } else {
            std::thread::sleep(POLL_INTERVAL);
        }

        run_retire_scan(&inner);
    }
}

fn handle_render_done(inner: &CoreInner, index: usize, expected_at_wait_time: u64) {
    let slot = &inner.slots[index];
    match slot.state() {
        BufferState::Waiting => {
            slot.mark_presentable();
            if inner.present_mode == PresentMode::Fifo {
                // Fifo's usable_count set is {Renderable, Presentable} only
                // (Waiting doesn't count); this promotion re-enters the
                // counted set, balancing the unconditional decrement
                // VsyncPresenter applies on Presentable -> Presenting.
                inner.usable.release(1);
            }
            run_promotion_bookkeeping(inner, index);
        }
        BufferState::DoubleWaiting => {
            match inner.gpu.semaphore_counter_value(slot.fence.semaphore) {
                Ok(counter) if counter >= expected_at_wait_time => {
                    slot.mark_presentable_from_double_waiting();
                    // DoubleWaiting isn't part of mailbox's usable_count set
                    // ({Renderable, Presentable, Waiting}) but Presentable
                    // is; this promotion must hand back the credit the
                    // slot's first present already released on Rendering ->
                    // Waiting, which the second present did not re-release.
                    inner.usable.release(1);
                    run_promotion_bookkeeping(inner, index);
                }
                Ok(_) => {
                    // Stale fire: this signal belongs to the earlier of the
                    // two submissions double-rendering produced. Leave the
                    // slot in DoubleWaiting for the newer value.
                }
                Err(err) => log::warn!("failed to read fence counter for slot {index}: {err:#}"),
            }
        }
        _ => {
            // Late fire against a slot already moved on (e.g. by a
            // subsequent retire scan); nothing to do.
        }
    }
}

fn run_retire_scan(inner: &CoreInner) {
    for (index, slot) in inner.slots.iter().enumerate() {
        if slot.state() != BufferState::Presenting {
            continue;
        }
        match inner.compositor.is_available(slot.compositor_handle) {
            Ok(true) => {
                slot.retire();
                inner.usable.release(1);
            }
            Ok(false) => {}
            Err(err) => log::warn!("compositor availability check failed for slot {index}: {err:#}"),
        }
    }
}
