//! The shared viewport probe.
//!
//! However many components ask for device-class awareness, exactly one
//! `MediaQueryList` listener exists per tab. The slot is reference-counted:
//! the first consumer attaches the listener, the last one tears it down, and
//! a breakpoint change swaps the listener out rather than stacking a second
//! one. Match changes land in the device store as observation writes, which
//! the store drops until it has hydrated; before that point the hydrator
//! owns the device value and reads the viewport through its own probe input.

#[cfg(not(feature = "ssr"))]
use crate::store::DeviceStore;

/// Refcount bookkeeping, separated from the browser glue so the transitions
/// are testable off-browser.
#[cfg(any(test, not(feature = "ssr")))]
#[derive(Debug, Default)]
pub(crate) struct ProbeSlot {
    consumers: usize,
    breakpoint: u32,
}

#[cfg(any(test, not(feature = "ssr")))]
impl ProbeSlot {
    /// Returns true when the listener should be attached: this consumer is
    /// the first, or an earlier attachment failed and none is live.
    fn retain(&mut self, breakpoint: u32, attached: bool) -> bool {
        self.consumers += 1;
        if self.consumers == 1 || !attached {
            self.breakpoint = breakpoint;
            return true;
        }
        false
    }

    /// Returns true when this consumer was the last and the listener should
    /// be torn down.
    fn release(&mut self) -> bool {
        self.consumers = self.consumers.saturating_sub(1);
        self.consumers == 0
    }

    /// Returns true when an attached listener must be rebuilt for a new
    /// effective breakpoint.
    fn retune(&mut self, breakpoint: u32) -> bool {
        if self.consumers > 0 && self.breakpoint != breakpoint {
            self.breakpoint = breakpoint;
            return true;
        }
        false
    }
}

/// The media query matching the mobile device class for a breakpoint.
#[cfg(any(test, not(feature = "ssr")))]
fn mobile_query(breakpoint: u32) -> String {
    format!("(max-width: {}px)", breakpoint.saturating_sub(1))
}

/// Live viewport match, for the hydrator's probe input. `None` when the
/// environment has no window to ask.
#[cfg(not(feature = "ssr"))]
pub fn current_match(breakpoint: u32) -> Option<bool> {
    leptos::prelude::window()
        .match_media(&mobile_query(breakpoint))
        .ok()
        .flatten()
        .map(|query| query.matches())
}

#[cfg(feature = "ssr")]
pub fn current_match(_breakpoint: u32) -> Option<bool> {
    None
}

#[cfg(not(feature = "ssr"))]
mod listener {
    use std::cell::RefCell;

    use web_sys::wasm_bindgen::closure::Closure;
    use web_sys::wasm_bindgen::JsCast;

    use super::{mobile_query, ProbeSlot};
    use crate::store::DeviceStore;

    pub(super) struct ActiveProbe {
        query: web_sys::MediaQueryList,
        // kept alive for as long as the listener is attached
        _onchange: Closure<dyn FnMut(web_sys::MediaQueryListEvent)>,
    }

    impl Drop for ActiveProbe {
        fn drop(&mut self) {
            self.query.set_onchange(None);
        }
    }

    thread_local! {
        pub(super) static SLOT: RefCell<ProbeSlot> = RefCell::new(ProbeSlot::default());
        pub(super) static ACTIVE: RefCell<Option<ActiveProbe>> = const { RefCell::new(None) };
    }

    pub(super) fn attach(device: &DeviceStore) -> Option<ActiveProbe> {
        let breakpoint = device.breakpoint();
        let query = leptos::prelude::window()
            .match_media(&mobile_query(breakpoint))
            .ok()
            .flatten()?;

        // observation writes: no-ops until the store has hydrated
        let store = device.store().clone();
        store.apply_observed(|pref| pref.is_mobile = query.matches());

        let onchange = Closure::wrap(Box::new(move |event: web_sys::MediaQueryListEvent| {
            store.apply_observed(|pref| pref.is_mobile = event.matches());
        }) as Box<dyn FnMut(web_sys::MediaQueryListEvent)>);
        query.set_onchange(Some(onchange.as_ref().unchecked_ref()));

        Some(ActiveProbe {
            query,
            _onchange: onchange,
        })
    }
}

/// Register a consumer; attaches the listener if it is the first, or retries
/// an attachment an earlier consumer failed to make.
#[cfg(not(feature = "ssr"))]
pub(crate) fn acquire(device: &DeviceStore) {
    let attached = listener::ACTIVE.with(|active| active.borrow().is_some());
    let needed = listener::SLOT
        .with(|slot| slot.borrow_mut().retain(device.breakpoint(), attached));
    if needed {
        let probe = listener::attach(device);
        listener::ACTIVE.with(|active| *active.borrow_mut() = probe);
    }
}

/// Drop a consumer; tears the listener down if it was the last.
#[cfg(not(feature = "ssr"))]
pub(crate) fn release(_device: &DeviceStore) {
    let last = listener::SLOT.with(|slot| slot.borrow_mut().release());
    if last {
        listener::ACTIVE.with(|active| *active.borrow_mut() = None);
    }
}

/// Reconcile an attached listener with the store after the breakpoint may
/// have changed outside of `acquire`: swap it for the new query, or when the
/// query is unchanged re-read the current match. Called on breakpoint edits
/// and once device hydration lands, since a listener attached during first
/// render was built from the pre-hydration value.
#[cfg(not(feature = "ssr"))]
pub(crate) fn rebuild(device: &DeviceStore) {
    let breakpoint = device.breakpoint();
    let retuned = listener::SLOT.with(|slot| slot.borrow_mut().retune(breakpoint));
    if retuned {
        // replacing the slot drops the old listener before the new one lands
        let probe = listener::attach(device);
        listener::ACTIVE.with(|active| *active.borrow_mut() = probe);
    } else if listener::ACTIVE.with(|active| active.borrow().is_some()) {
        if let Some(matches) = current_match(breakpoint) {
            device.store().apply_observed(|pref| pref.is_mobile = matches);
        }
    }
}
