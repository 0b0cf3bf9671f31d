//! One-shot reconciliation of server, cookie, probe and default state.
//!
//! The precedence rule: server-supplied SSR data beats the client cookie
//! (the server already read the cookie when it rendered, so it is the
//! fresher read), the cookie beats the live runtime probe, and the probe
//! beats the hard-coded default. A user write that landed before hydration
//! beats everything; the hydrator only flips the flag in that case.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::codec;
use crate::prefs::Preference;
use crate::store::PrefStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    Server,
    Cookie,
    Probe,
    Default,
}

/// Pick the winning initial value.
pub fn resolve_initial<P: Preference>(
    ssr: Option<P>,
    cookie: Option<P>,
    probe: Option<P>,
) -> (P, HydrationSource) {
    if let Some(value) = ssr {
        return (value, HydrationSource::Server);
    }
    if let Some(value) = cookie {
        return (value, HydrationSource::Cookie);
    }
    if let Some(value) = probe {
        return (value, HydrationSource::Probe);
    }
    (P::default(), HydrationSource::Default)
}

/// `unhydrated -> hydrated`, one way, once. Re-invocation under
/// duplicate-mount environments is a no-op.
#[derive(Debug, Default)]
pub struct Hydrator {
    ran: AtomicBool,
}

impl Hydrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::Relaxed)
    }

    /// Reconcile and install the winner. Returns where the winner came from,
    /// or `None` when this hydrator already ran.
    pub fn run<P: Preference>(
        &self,
        store: &PrefStore<P>,
        ssr: Option<P>,
        probe: Option<P>,
    ) -> Option<HydrationSource> {
        if self.ran.swap(true, Ordering::Relaxed) {
            return None;
        }

        let cookie = store
            .jar()
            .read(P::COOKIE_NAME)
            .and_then(|raw| codec::decode_strict::<P>(&raw));
        let ssr = ssr.filter(Preference::is_valid);
        let probe = probe.filter(Preference::is_valid);

        let (winner, source) = resolve_initial(ssr, cookie.clone(), probe);
        // no redundant write when the cookie already holds the winner
        let persist = cookie.as_ref() != Some(&winner);
        store.apply_hydrated(winner, persist);
        Some(source)
    }
}

/// Run a hydrator in a mount effect. Effects only run on the client, which
/// gives the "first client render" timing; the internal guard absorbs any
/// duplicate effect invocation.
#[cfg(not(feature = "ssr"))]
pub fn hydrate_on_mount<P: Preference>(
    store: PrefStore<P>,
    ssr: Option<P>,
    probe: impl Fn() -> Option<P> + Send + Sync + 'static,
) {
    use leptos::prelude::Effect;

    let hydrator = Hydrator::new();
    Effect::new(move |_| {
        if let Some(source) = hydrator.run(&store, ssr.clone(), probe()) {
            log::debug!("hydrated '{}' from {source:?}", P::COOKIE_NAME);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{CookieJar, MemoryJar};
    use crate::prefs::{DeviceClassPref, Preference, SidebarPref};
    use crate::store::PrefStore;
    use std::sync::Arc;

    fn seeded_store(cookie: Option<&SidebarPref>) -> (Arc<MemoryJar>, PrefStore<SidebarPref>) {
        let jar = Arc::new(MemoryJar::new());
        if let Some(pref) = cookie {
            jar.seed(SidebarPref::COOKIE_NAME, &codec::encode(pref));
        }
        let store = PrefStore::new(jar.clone());
        (jar, store)
    }

    fn closed() -> SidebarPref {
        SidebarPref {
            open: false,
            ..Default::default()
        }
    }

    #[test]
    fn server_data_wins_over_cookie() {
        let open_cookie = SidebarPref::default();
        let (_, store) = seeded_store(Some(&open_cookie));

        let hydrator = Hydrator::new();
        let source = hydrator.run(&store, Some(closed()), None);

        assert_eq!(source, Some(HydrationSource::Server));
        let (pref, hydrated) = store.snapshot();
        assert!(!pref.open);
        assert!(hydrated);
    }

    #[test]
    fn cookie_wins_over_default() {
        let (jar, store) = seeded_store(Some(&closed()));

        let hydrator = Hydrator::new();
        let source = hydrator.run(&store, None, None);

        assert_eq!(source, Some(HydrationSource::Cookie));
        assert!(!store.snapshot().0.open);
        // the winner was read from the cookie; nothing to write back
        assert_eq!(jar.write_count(), 0);
    }

    #[test]
    fn probe_wins_over_default() {
        let jar = Arc::new(MemoryJar::new());
        let store: PrefStore<DeviceClassPref> = PrefStore::new(jar.clone());

        let probe = DeviceClassPref {
            is_mobile: true,
            ..Default::default()
        };
        let source = Hydrator::new().run(&store, None, Some(probe));

        assert_eq!(source, Some(HydrationSource::Probe));
        assert!(store.snapshot().0.is_mobile);
        // a probe result was not persisted anywhere yet, so it is written
        assert_eq!(jar.write_count(), 1);
    }

    #[test]
    fn default_applies_without_a_cookie_write() {
        let (jar, store) = seeded_store(None);
        let source = Hydrator::new().run(&store, None, None);

        assert_eq!(source, Some(HydrationSource::Default));
        assert_eq!(store.snapshot().0, SidebarPref::default());
        assert_eq!(jar.write_count(), 0);
    }

    #[test]
    fn matching_server_data_and_cookie_skip_the_write() {
        let pref = closed();
        let (jar, store) = seeded_store(Some(&pref));

        Hydrator::new().run(&store, Some(pref), None);
        assert_eq!(jar.write_count(), 0);
    }

    #[test]
    fn runs_exactly_once() {
        let open_cookie = SidebarPref::default();
        let (jar, store) = seeded_store(Some(&open_cookie));

        let hydrator = Hydrator::new();
        assert!(hydrator.run(&store, Some(closed()), None).is_some());
        assert!(hydrator.run(&store, Some(open_cookie), None).is_none());

        // one write and one surviving value from the first run
        assert_eq!(jar.write_count(), 1);
        assert!(!store.snapshot().0.open);
        assert!(hydrator.has_run());
    }

    #[test]
    fn user_write_before_hydration_wins() {
        let (_, store) = seeded_store(None);
        // user toggled before the hydrator got to run
        store.set(closed());

        Hydrator::new().run(&store, Some(SidebarPref::default()), None);

        let (pref, hydrated) = store.snapshot();
        assert!(!pref.open);
        assert!(hydrated);
    }

    #[test]
    fn viewport_observation_before_hydration_does_not_beat_the_cookie() {
        let saved = DeviceClassPref {
            is_mobile: false,
            breakpoint_px: 900,
            user_agent: None,
        };
        let jar = Arc::new(MemoryJar::new());
        jar.seed(DeviceClassPref::COOKIE_NAME, &codec::encode(&saved));
        let store: PrefStore<DeviceClassPref> = PrefStore::new(jar.clone());

        // the shared media-query listener reports a mobile viewport while
        // the store still holds its defaults; the write must be dropped
        assert!(!store.apply_observed(|pref| pref.is_mobile = true));

        let live = DeviceClassPref {
            is_mobile: true,
            ..Default::default()
        };
        let source = Hydrator::new().run(&store, Some(saved.clone()), Some(live));

        assert_eq!(source, Some(HydrationSource::Server));
        assert_eq!(store.snapshot().0, saved);
        // the saved cookie's breakpoint survives untouched
        assert_eq!(jar.write_count(), 0);
    }

    #[test]
    fn corrupt_cookie_falls_through_to_default() {
        let jar = Arc::new(MemoryJar::new());
        jar.seed(SidebarPref::COOKIE_NAME, "not-a-record");
        let store: PrefStore<SidebarPref> = PrefStore::new(jar.clone());

        let source = Hydrator::new().run(&store, None, None);
        assert_eq!(source, Some(HydrationSource::Default));
        assert_eq!(store.snapshot().0, SidebarPref::default());
    }
}
