//! Client stores: the live, reactive side of each preference domain.
//!
//! One store instance per domain is constructed at application start and
//! shared through context; the store is the sole mutator of its in-memory
//! state. Setters validate, suppress no-op changes, and persist through the
//! injected [`CookieJar`] so every accepted write lands in the cookie the
//! server reads on the next request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use leptos::prelude::*;

use crate::codec;
use crate::cookie::CookieJar;
use crate::prefs::{
    CollapseMode, DeviceClassPref, LocaleCode, LocalePref, Preference, Side, SidebarPref,
    SidebarVariant,
};

pub struct PrefStore<P: Preference> {
    value: ArcRwSignal<P>,
    hydrated: ArcRwSignal<bool>,
    /// Latched by any setter that lands before hydration, so the hydrator
    /// cannot clobber a user interaction that raced it.
    touched: Arc<AtomicBool>,
    jar: Arc<dyn CookieJar>,
}

impl<P: Preference> Clone for PrefStore<P> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            hydrated: self.hydrated.clone(),
            touched: self.touched.clone(),
            jar: self.jar.clone(),
        }
    }
}

impl<P: Preference> PrefStore<P> {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self {
            value: ArcRwSignal::new(P::default()),
            hydrated: ArcRwSignal::new(false),
            touched: Arc::new(AtomicBool::new(false)),
            jar,
        }
    }

    pub fn value(&self) -> ArcReadSignal<P> {
        self.value.read_only()
    }

    pub fn hydrated(&self) -> ArcReadSignal<bool> {
        self.hydrated.read_only()
    }

    /// One-shot read of the current value and hydration flag.
    pub fn snapshot(&self) -> (P, bool) {
        (self.value.get_untracked(), self.hydrated.get_untracked())
    }

    /// Replace the whole record. Out-of-domain values are rejected and
    /// logged; a value equal to the current one is a no-op, so subscribers
    /// are not notified and no redundant cookie write happens.
    ///
    /// Returns whether the value was applied.
    pub fn set(&self, next: P) -> bool {
        if !next.is_valid() {
            #[cfg(debug_assertions)]
            log::warn!("rejected out-of-domain value for '{}'", P::COOKIE_NAME);
            return false;
        }
        if self.value.with_untracked(|current| *current == next) {
            return false;
        }
        self.value.set(next.clone());
        if !self.hydrated.get_untracked() {
            self.touched.store(true, Ordering::Relaxed);
        }
        self.jar.write(P::COOKIE_NAME, &codec::encode(&next));
        true
    }

    /// Read-modify-write helper for field-level setters.
    pub fn update_field(&self, mutate: impl FnOnce(&mut P)) -> bool {
        let mut next = self.value.get_untracked();
        mutate(&mut next);
        self.set(next)
    }

    /// Write an environment observation rather than a user choice. Dropped
    /// until the store is hydrated: the hydrator takes the live reading
    /// through its probe input, and an observation must not latch `touched`
    /// or overwrite the cookie the hydrator has yet to reconcile.
    pub(crate) fn apply_observed(&self, mutate: impl FnOnce(&mut P)) -> bool {
        if !self.hydrated.get_untracked() {
            return false;
        }
        self.update_field(mutate)
    }

    pub(crate) fn jar(&self) -> &Arc<dyn CookieJar> {
        &self.jar
    }

    pub(crate) fn touched(&self) -> bool {
        self.touched.load(Ordering::Relaxed)
    }

    /// Install the hydration winner. A pre-hydration user write wins over the
    /// hydrator; `persist` is false when the winner is already what the
    /// cookie holds.
    pub(crate) fn apply_hydrated(&self, winner: P, persist: bool) {
        if !self.touched() && self.value.with_untracked(|current| *current != winner) {
            self.value.set(winner.clone());
            if persist {
                self.jar.write(P::COOKIE_NAME, &codec::encode(&winner));
            }
        }
        self.hydrated.set(true);
    }

    /// Adopt the request snapshot on the server render pass.
    #[cfg(feature = "ssr")]
    pub(crate) fn adopt(&self, value: P) {
        if value.is_valid() {
            self.value.set(value);
        }
    }
}

#[derive(Clone)]
pub struct LocaleStore {
    store: PrefStore<LocalePref>,
}

impl LocaleStore {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self {
            store: PrefStore::new(jar),
        }
    }

    /// Direction is derived from the code; a mismatched pair is
    /// unrepresentable through this setter.
    pub fn set_locale(&self, code: LocaleCode) {
        self.store.set(LocalePref::new(code));
    }

    pub fn code(&self) -> LocaleCode {
        self.store.snapshot().0.code
    }

    pub fn value(&self) -> ArcReadSignal<LocalePref> {
        self.store.value()
    }

    pub fn hydrated(&self) -> ArcReadSignal<bool> {
        self.store.hydrated()
    }

    pub fn snapshot(&self) -> (LocalePref, bool) {
        self.store.snapshot()
    }

    pub(crate) fn store(&self) -> &PrefStore<LocalePref> {
        &self.store
    }
}

#[derive(Clone)]
pub struct DeviceStore {
    store: PrefStore<DeviceClassPref>,
}

impl DeviceStore {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self {
            store: PrefStore::new(jar),
        }
    }

    pub fn set_is_mobile(&self, is_mobile: bool) {
        self.store.update_field(|pref| pref.is_mobile = is_mobile);
    }

    /// Changing the breakpoint retunes the shared media-query probe: the old
    /// listener is torn down and one for the new query attached.
    pub fn set_breakpoint(&self, breakpoint_px: u32) {
        let changed = self
            .store
            .update_field(|pref| pref.breakpoint_px = breakpoint_px);
        #[cfg(not(feature = "ssr"))]
        if changed {
            crate::probe::rebuild(self);
        }
        #[cfg(feature = "ssr")]
        let _ = changed;
    }

    pub fn breakpoint(&self) -> u32 {
        self.store.snapshot().0.breakpoint_px
    }

    pub fn value(&self) -> ArcReadSignal<DeviceClassPref> {
        self.store.value()
    }

    pub fn hydrated(&self) -> ArcReadSignal<bool> {
        self.store.hydrated()
    }

    pub fn snapshot(&self) -> (DeviceClassPref, bool) {
        self.store.snapshot()
    }

    pub(crate) fn store(&self) -> &PrefStore<DeviceClassPref> {
        &self.store
    }
}

#[derive(Clone)]
pub struct SidebarStore {
    store: PrefStore<SidebarPref>,
}

impl SidebarStore {
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self {
            store: PrefStore::new(jar),
        }
    }

    pub fn set_open(&self, open: bool) {
        self.store.update_field(|pref| pref.open = open);
    }

    pub fn set_open_on_mobile(&self, open: bool) {
        self.store.update_field(|pref| pref.open_on_mobile = open);
    }

    /// Toggle whichever open flag applies to the current device class.
    pub fn toggle(&self, is_mobile: bool) {
        self.store.update_field(|pref| {
            if is_mobile {
                pref.open_on_mobile = !pref.open_on_mobile;
            } else {
                pref.open = !pref.open;
            }
        });
    }

    pub fn set_side(&self, side: Side) {
        self.store.update_field(|pref| pref.side = side);
    }

    pub fn set_variant(&self, variant: SidebarVariant) {
        self.store.update_field(|pref| pref.variant = variant);
    }

    pub fn set_collapse_mode(&self, mode: CollapseMode) {
        self.store.update_field(|pref| pref.collapse_mode = mode);
    }

    pub fn value(&self) -> ArcReadSignal<SidebarPref> {
        self.store.value()
    }

    pub fn hydrated(&self) -> ArcReadSignal<bool> {
        self.store.hydrated()
    }

    pub fn snapshot(&self) -> (SidebarPref, bool) {
        self.store.snapshot()
    }

    pub(crate) fn store(&self) -> &PrefStore<SidebarPref> {
        &self.store
    }
}
