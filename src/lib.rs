//! Reactive, cookie-persisted UI preferences for Leptos admin dashboards.
//!
//! Three preference domains (locale/direction, device class, sidebar layout)
//! follow the same pattern: a strict JSON cookie codec, a server-side request
//! reader, a reactive client store, and a one-shot hydrator that reconciles
//! server-supplied data, the client cookie, and a live runtime probe on first
//! client render. A translation loader sits on top of the locale domain with
//! per-locale catalog caching, in-flight request coalescing, and a
//! speculative background warm-up.
//!
//! Nothing in this crate throws across its public boundary: malformed
//! cookies decode to defaults, failed catalog loads degrade to raw keys, and
//! out-of-domain setter inputs are rejected and logged. Preference plumbing
//! is never the reason a page fails to render.

pub mod codec;
pub mod cookie;
pub mod ctx;
pub mod hydrate;
pub mod i18n;
pub mod prefs;
pub mod probe;
pub mod server;
pub mod store;

pub use ctx::{
    change_locale, expect_prefs, provide_prefs_context, use_device, use_locale, use_mobile,
    use_prefs, use_sidebar, use_translator, PrefsContext, SsrPrefs,
};
pub use i18n::{Catalog, CatalogError, CatalogSource, StaticSource, Translator};
pub use prefs::{
    CollapseMode, DeviceClassPref, Direction, LocaleCode, LocalePref, Preference, Side,
    SidebarPref, SidebarVariant, DEFAULT_MOBILE_BREAKPOINT,
};
pub use store::{DeviceStore, LocaleStore, PrefStore, SidebarStore};

/// Reactive translation lookup, `tr!("nav.dashboard")` or
/// `tr!("greeting", name = user.name)`.
pub use prefs_leptos_macros::tr;
