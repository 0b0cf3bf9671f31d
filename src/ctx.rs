//! Context wiring: one shared instance of each store per application, plus
//! the hooks the component tree consumes.
//!
//! `provide_prefs_context` is called once near the root of the view tree.
//! On the server it adopts the request snapshot so the rendered markup
//! matches what the client will settle on; on the client it runs the
//! one-shot hydrators, brings the translator up once the locale store
//! reports hydrated, schedules the speculative catalog warm-up, and mirrors
//! `dir`/`lang` onto the document root.

use std::sync::Arc;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cookie::CookieJar;
use crate::i18n::{Catalog, CatalogSource, Translator};
use crate::prefs::{DeviceClassPref, LocaleCode, LocalePref, SidebarPref};
use crate::store::{DeviceStore, LocaleStore, SidebarStore};

/// Delay before the speculative catalog warm-up starts, so it never competes
/// with first-paint work.
#[cfg(not(feature = "ssr"))]
const PRELOAD_DELAY: std::time::Duration = std::time::Duration::from_millis(1500);

/// Server→client handoff props: the per-domain snapshots the server resolved
/// from the request, plus the catalog for the locale it rendered with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SsrPrefs {
    pub locale: Option<LocalePref>,
    pub device: Option<DeviceClassPref>,
    pub sidebar: Option<SidebarPref>,
    pub catalog: Option<(LocaleCode, Catalog)>,
}

impl SsrPrefs {
    /// Handoff props from a server-side request read.
    pub fn from_request(prefs: crate::server::RequestPrefs) -> Self {
        Self {
            locale: Some(prefs.locale),
            device: Some(prefs.device),
            sidebar: Some(prefs.sidebar),
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, code: LocaleCode, catalog: Catalog) -> Self {
        self.catalog = Some((code, catalog));
        self
    }
}

/// The shared mutable instances, one set per application.
#[derive(Clone)]
pub struct PrefsContext {
    pub locale: LocaleStore,
    pub device: DeviceStore,
    pub sidebar: SidebarStore,
    pub translator: Translator,
}

/// Build the stores, provide them through context, and wire hydration.
pub fn provide_prefs_context(initial: SsrPrefs, source: Arc<dyn CatalogSource>) -> PrefsContext {
    let jar = default_jar();
    let cx = PrefsContext {
        locale: LocaleStore::new(jar.clone()),
        device: DeviceStore::new(jar.clone()),
        sidebar: SidebarStore::new(jar),
        translator: Translator::new(source),
    };
    if let Some((code, catalog)) = initial.catalog.clone() {
        cx.translator.seed(code, catalog);
    }
    provide_context(cx.clone());

    #[cfg(feature = "ssr")]
    {
        // server pass: render straight from the request snapshot
        if let Some(value) = initial.locale {
            cx.locale.store().adopt(value);
        }
        if let Some(value) = initial.device {
            cx.device.store().adopt(value);
        }
        if let Some(value) = initial.sidebar {
            cx.sidebar.store().adopt(value);
        }
        if let Some((code, _)) = initial.catalog {
            cx.translator.adopt(code);
        }
    }

    #[cfg(not(feature = "ssr"))]
    {
        use crate::hydrate::hydrate_on_mount;

        hydrate_on_mount(cx.locale.store().clone(), initial.locale, || None);

        let breakpoint = initial
            .device
            .as_ref()
            .map(|device| device.breakpoint_px)
            .unwrap_or(crate::prefs::DEFAULT_MOBILE_BREAKPOINT);
        hydrate_on_mount(cx.device.store().clone(), initial.device, move || {
            probe_device(breakpoint)
        });

        // a listener attached during first render was tuned to the
        // pre-hydration breakpoint; reconcile it with the winner
        let device = cx.device.clone();
        Effect::new(move |_| {
            if device.hydrated().get() {
                crate::probe::rebuild(&device);
            }
        });

        hydrate_on_mount(cx.sidebar.store().clone(), initial.sidebar, || None);

        wire_translator(&cx);
        mirror_document_attrs(&cx);
    }

    cx
}

fn default_jar() -> Arc<dyn CookieJar> {
    #[cfg(not(feature = "ssr"))]
    {
        Arc::new(crate::cookie::BrowserJar)
    }
    #[cfg(feature = "ssr")]
    {
        // no document on the server; writes happen through response headers
        Arc::new(crate::cookie::MemoryJar::new())
    }
}

/// Live device class from the viewport, for the device hydrator.
#[cfg(not(feature = "ssr"))]
fn probe_device(breakpoint: u32) -> Option<DeviceClassPref> {
    let is_mobile = crate::probe::current_match(breakpoint)?;
    let user_agent = window().navigator().user_agent().ok();
    Some(DeviceClassPref {
        is_mobile,
        breakpoint_px: breakpoint,
        user_agent,
    })
}

/// Bring the translator up once the locale store has hydrated. Translating
/// before the true locale is known would flash the wrong language.
#[cfg(not(feature = "ssr"))]
fn wire_translator(cx: &PrefsContext) {
    let locale = cx.locale.clone();
    let translator = cx.translator.clone();
    Effect::new(move |_| {
        if !locale.hydrated().get() {
            return;
        }
        if translator.is_initialized() {
            return;
        }
        let code = locale.code();
        let init = translator.clone();
        leptos::task::spawn_local(async move { init.initialize(code).await });

        let warm = translator.clone();
        set_timeout(
            move || {
                leptos::task::spawn_local(async move { warm.preload_rest().await });
            },
            PRELOAD_DELAY,
        );
    });
}

/// Keep `dir` and `lang` on the document root in step with the locale store,
/// so layout mirroring flips with the language.
#[cfg(not(feature = "ssr"))]
fn mirror_document_attrs(cx: &PrefsContext) {
    let locale = cx.locale.value();
    Effect::new(move |_| {
        let pref = locale.get();
        if let Some(root) = document().document_element() {
            let _ = root.set_attribute("lang", pref.code.as_str());
            let _ = root.set_attribute("dir", pref.direction.as_str());
        }
    });
}

pub fn use_prefs() -> Option<PrefsContext> {
    use_context::<PrefsContext>()
}

/// Panics if `provide_prefs_context` was not called above this point in the
/// view tree.
pub fn expect_prefs() -> PrefsContext {
    use_prefs().expect("PrefsContext not provided; call provide_prefs_context first")
}

pub fn use_locale() -> (ArcReadSignal<LocalePref>, ArcReadSignal<bool>) {
    let cx = expect_prefs();
    (cx.locale.value(), cx.locale.hydrated())
}

pub fn use_device() -> (ArcReadSignal<DeviceClassPref>, ArcReadSignal<bool>) {
    let cx = expect_prefs();
    (cx.device.value(), cx.device.hydrated())
}

pub fn use_sidebar() -> (ArcReadSignal<SidebarPref>, ArcReadSignal<bool>) {
    let cx = expect_prefs();
    (cx.sidebar.value(), cx.sidebar.hydrated())
}

pub fn use_translator() -> Translator {
    expect_prefs().translator
}

/// Device-class awareness for a component. Registers with the shared
/// viewport probe for the component's lifetime; however many components call
/// this, one listener exists.
pub fn use_mobile() -> Signal<bool> {
    let cx = expect_prefs();
    #[cfg(not(feature = "ssr"))]
    {
        crate::probe::acquire(&cx.device);
        let device = cx.device.clone();
        on_cleanup(move || crate::probe::release(&device));
    }
    let value = cx.device.value();
    Signal::derive(move || value.get().is_mobile)
}

/// Change the locale: persists the preference and swaps the catalog.
pub fn change_locale(code: LocaleCode) {
    let cx = expect_prefs();
    cx.locale.set_locale(code);
    let translator = cx.translator.clone();
    leptos::task::spawn_local(async move { translator.switch_locale(code).await });
}
