//! Translation loading and lookup.
//!
//! The [`Translator`] owns one message catalog per locale, populated lazily
//! through a [`CatalogSource`]. Foreground switches and the speculative
//! background warm-up coalesce on a per-locale in-flight future, a later
//! `switch_locale` supersedes an earlier one still loading, and `translate`
//! never fails: before initialization or on a missing key it returns the key
//! itself, so a broken catalog costs raw strings instead of a render.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use leptos::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prefs::LocaleCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("no catalog available for locale '{0}'")]
    Missing(LocaleCode),
    #[error("failed to load catalog for locale '{0}': {1}")]
    Load(LocaleCode, String),
}

/// The full set of translated strings for one locale, keyed by dot path
/// (`"nav.dashboard.title"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Flatten a nested JSON object into dot-path keys. String, number and
    /// bool leaves become messages; anything else is dropped.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut messages = HashMap::new();
        flatten_into("", value, &mut messages);
        Self { messages }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            messages: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn flatten_into(prefix: &str, value: &serde_json::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, out);
            }
        }
        serde_json::Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        serde_json::Value::Number(_) | serde_json::Value::Bool(_) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        _ => {}
    }
}

/// Where catalogs come from. The loader does not care whether this is an
/// embedded table, the filesystem, or a network round trip; implement this
/// at the application edge to plug in transport.
pub trait CatalogSource: Send + Sync {
    fn load(&self, code: LocaleCode) -> BoxFuture<'static, Result<Catalog, CatalogError>>;
}

/// Catalogs held in memory, typically deserialized from embedded JSON.
#[derive(Debug, Default)]
pub struct StaticSource {
    catalogs: HashMap<LocaleCode, Catalog>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, code: LocaleCode, catalog: Catalog) -> Self {
        self.catalogs.insert(code, catalog);
        self
    }

    pub fn with_json(self, code: LocaleCode, json: &serde_json::Value) -> Self {
        self.with_catalog(code, Catalog::from_json(json))
    }
}

impl CatalogSource for StaticSource {
    fn load(&self, code: LocaleCode) -> BoxFuture<'static, Result<Catalog, CatalogError>> {
        let result = self
            .catalogs
            .get(&code)
            .cloned()
            .ok_or(CatalogError::Missing(code));
        async move { result }.boxed()
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<Catalog, CatalogError>>>;

/// Reactive catalog store and lookup.
#[derive(Clone)]
pub struct Translator {
    current: ArcRwSignal<Option<LocaleCode>>,
    initialized: ArcRwSignal<bool>,
    /// Bumped whenever a catalog lands, so `translate` re-runs in views even
    /// when the locale itself did not change.
    version: ArcRwSignal<u64>,
    catalogs: Arc<Mutex<HashMap<LocaleCode, Catalog>>>,
    inflight: Arc<Mutex<HashMap<LocaleCode, SharedLoad>>>,
    /// The most recently requested locale; a load resolving for anything
    /// else is stale and discarded.
    requested: Arc<Mutex<Option<LocaleCode>>>,
    preload_started: Arc<AtomicBool>,
    source: Arc<dyn CatalogSource>,
}

impl Translator {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            current: ArcRwSignal::new(None),
            initialized: ArcRwSignal::new(false),
            version: ArcRwSignal::new(0),
            catalogs: Arc::new(Mutex::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            requested: Arc::new(Mutex::new(None)),
            preload_started: Arc::new(AtomicBool::new(false)),
            source,
        }
    }

    /// Install a server-delivered catalog ahead of any load, so first paint
    /// translates without waiting on the source.
    pub fn seed(&self, code: LocaleCode, catalog: Catalog) {
        lock(&self.catalogs).insert(code, catalog);
        self.version.update(|v| *v += 1);
    }

    /// Come up synchronously on the server render pass: the request already
    /// resolved the locale and its catalog, so there is nothing to load.
    #[cfg(feature = "ssr")]
    pub fn adopt(&self, code: LocaleCode) {
        self.current.set(Some(code));
        self.initialized.set(true);
    }

    pub fn current_locale(&self) -> Option<LocaleCode> {
        self.current.get_untracked()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get_untracked()
    }

    /// Load the catalog for the hydrated locale and come up. Runs once; a
    /// load failure still initializes so the UI degrades to raw keys instead
    /// of hanging in a loading state.
    pub async fn initialize(&self, code: LocaleCode) {
        if self.initialized.get_untracked() {
            return;
        }
        *lock(&self.requested) = Some(code);
        if let Err(err) = self.load_cached(code).await {
            log::warn!("initial catalog load failed: {err}");
        }
        if *lock(&self.requested) == Some(code) {
            self.current.set(Some(code));
        }
        self.initialized.set(true);
    }

    /// Switch the active locale, loading its catalog if needed. A later call
    /// supersedes this one: whichever locale was requested last is the one
    /// that settles, regardless of load completion order.
    pub async fn switch_locale(&self, code: LocaleCode) {
        if self.current.get_untracked() == Some(code) {
            return;
        }
        *lock(&self.requested) = Some(code);
        let result = self.load_cached(code).await;
        if *lock(&self.requested) != Some(code) {
            // superseded while loading; drop this resolution
            return;
        }
        if let Err(err) = result {
            log::warn!("catalog load failed: {err}");
        }
        self.current.set(Some(code));
    }

    /// Warm the cache for every locale not yet loaded, so later switches are
    /// instant. Idempotent per tab session. Shares in-flight loads with any
    /// concurrent foreground switch instead of duplicating them.
    pub async fn preload_rest(&self) {
        if self.preload_started.swap(true, Ordering::Relaxed) {
            return;
        }
        for code in LocaleCode::ALL {
            if self.current.get_untracked() == Some(code) {
                continue;
            }
            if lock(&self.catalogs).contains_key(&code) {
                continue;
            }
            if let Err(err) = self.load_cached(code).await {
                log::debug!("background preload skipped: {err}");
            }
        }
    }

    pub fn translate(&self, key: &str) -> String {
        self.translate_with(key, &[])
    }

    /// Look `key` up in the current catalog and substitute `{name}`
    /// placeholders from `args`. Unknown keys come back verbatim; unmatched
    /// placeholders are left in place.
    pub fn translate_with(&self, key: &str, args: &[(&str, String)]) -> String {
        // track locale, init flag and catalog arrivals for reactive callers
        self.version.track();
        if !self.initialized.get() {
            return key.to_string();
        }
        let Some(code) = self.current.get() else {
            return key.to_string();
        };
        let template = lock(&self.catalogs)
            .get(&code)
            .and_then(|catalog| catalog.get(key).map(str::to_string));
        match template {
            Some(template) => interpolate(&template, args),
            None => key.to_string(),
        }
    }

    async fn load_cached(&self, code: LocaleCode) -> Result<Catalog, CatalogError> {
        if let Some(found) = lock(&self.catalogs).get(&code).cloned() {
            return Ok(found);
        }
        let load = self.shared_load(code);
        let result = load.await;
        lock(&self.inflight).remove(&code);
        if let Ok(catalog) = &result {
            lock(&self.catalogs).insert(code, catalog.clone());
            self.version.update(|v| *v += 1);
        }
        result
    }

    /// One in-flight load per locale; concurrent callers await the same
    /// future.
    fn shared_load(&self, code: LocaleCode) -> SharedLoad {
        if let Some(pending) = lock(&self.inflight).get(&code) {
            return pending.clone();
        }
        let load = self.source.load(code).shared();
        lock(&self.inflight).insert(code, load.clone());
        load
    }
}

fn interpolate(template: &str, args: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in args {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;
    use serde_json::json;

    fn english() -> Catalog {
        Catalog::from_pairs([
            ("nav.dashboard", "Dashboard"),
            ("greeting", "Hello, {name}!"),
        ])
    }

    fn ready_source() -> Arc<StaticSource> {
        Arc::new(
            StaticSource::new()
                .with_catalog(LocaleCode::En, english())
                .with_catalog(
                    LocaleCode::Fr,
                    Catalog::from_pairs([("nav.dashboard", "Tableau de bord")]),
                ),
        )
    }

    /// Source whose loads resolve only when the test releases them, for
    /// exercising in-flight ordering.
    #[derive(Default)]
    struct GatedSource {
        pending: Mutex<Vec<(LocaleCode, oneshot::Sender<Result<Catalog, CatalogError>>)>>,
        calls: Mutex<Vec<LocaleCode>>,
    }

    impl GatedSource {
        fn resolve(&self, code: LocaleCode, result: Result<Catalog, CatalogError>) {
            let mut pending = lock(&self.pending);
            let index = pending
                .iter()
                .position(|(pending_code, _)| *pending_code == code)
                .expect("no pending load for locale");
            let (_, sender) = pending.remove(index);
            let _ = sender.send(result);
        }

        fn call_count(&self, code: LocaleCode) -> usize {
            lock(&self.calls).iter().filter(|c| **c == code).count()
        }
    }

    impl CatalogSource for GatedSource {
        fn load(&self, code: LocaleCode) -> BoxFuture<'static, Result<Catalog, CatalogError>> {
            lock(&self.calls).push(code);
            let (sender, receiver) = oneshot::channel();
            lock(&self.pending).push((code, sender));
            async move {
                receiver
                    .await
                    .unwrap_or(Err(CatalogError::Load(code, "canceled".into())))
            }
            .boxed()
        }
    }

    #[test]
    fn flattens_nested_json_to_dot_paths() {
        let catalog = Catalog::from_json(&json!({
            "nav": { "dashboard": { "title": "Dashboard" } },
            "count": 3,
            "skipped": [1, 2],
        }));
        assert_eq!(catalog.get("nav.dashboard.title"), Some("Dashboard"));
        assert_eq!(catalog.get("count"), Some("3"));
        assert_eq!(catalog.get("skipped"), None);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn translate_before_initialize_returns_the_key() {
        let translator = Translator::new(ready_source());
        assert_eq!(translator.translate("nav.dashboard"), "nav.dashboard");
    }

    #[test]
    fn translate_after_initialize() {
        let translator = Translator::new(ready_source());
        LocalPool::new().run_until(translator.initialize(LocaleCode::En));

        assert!(translator.is_initialized());
        assert_eq!(translator.current_locale(), Some(LocaleCode::En));
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        // missing key degrades to the key itself
        assert_eq!(translator.translate("missing.key"), "missing.key");
    }

    #[test]
    fn interpolation_substitutes_and_leaves_unmatched_verbatim() {
        let translator = Translator::new(ready_source());
        LocalPool::new().run_until(translator.initialize(LocaleCode::En));

        assert_eq!(
            translator.translate_with("greeting", &[("name", "Ada".to_string())]),
            "Hello, Ada!"
        );
        // no value supplied: the placeholder stays as written
        assert_eq!(translator.translate("greeting"), "Hello, {name}!");
    }

    #[test]
    fn seeded_catalog_skips_the_source() {
        let source = Arc::new(GatedSource::default());
        let translator = Translator::new(source.clone());
        translator.seed(LocaleCode::En, english());

        LocalPool::new().run_until(translator.initialize(LocaleCode::En));
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert_eq!(source.call_count(LocaleCode::En), 0);
    }

    #[test]
    fn failed_load_still_initializes() {
        let translator = Translator::new(Arc::new(StaticSource::new()));
        LocalPool::new().run_until(translator.initialize(LocaleCode::Fr));

        assert!(translator.is_initialized());
        assert_eq!(translator.current_locale(), Some(LocaleCode::Fr));
        assert_eq!(translator.translate("anything"), "anything");
    }

    #[test]
    fn initialize_runs_once() {
        let translator = Translator::new(ready_source());
        let mut pool = LocalPool::new();
        pool.run_until(translator.initialize(LocaleCode::En));
        pool.run_until(translator.initialize(LocaleCode::Fr));

        assert_eq!(translator.current_locale(), Some(LocaleCode::En));
    }

    #[test]
    fn switch_to_current_is_a_noop() {
        let source = Arc::new(GatedSource::default());
        let translator = Translator::new(source.clone());
        translator.seed(LocaleCode::En, english());
        let mut pool = LocalPool::new();
        pool.run_until(translator.initialize(LocaleCode::En));

        pool.run_until(translator.switch_locale(LocaleCode::En));
        assert_eq!(source.call_count(LocaleCode::En), 0);
    }

    #[test]
    fn later_switch_supersedes_earlier() {
        let source = Arc::new(GatedSource::default());
        let translator = Translator::new(source.clone());
        translator.seed(LocaleCode::En, english());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        pool.run_until(translator.initialize(LocaleCode::En));

        let first = translator.clone();
        spawner
            .spawn_local(async move { first.switch_locale(LocaleCode::Fr).await })
            .unwrap();
        let second = translator.clone();
        spawner
            .spawn_local(async move { second.switch_locale(LocaleCode::Ar).await })
            .unwrap();
        pool.run_until_stalled();

        // the later request resolves first and settles
        source.resolve(
            LocaleCode::Ar,
            Ok(Catalog::from_pairs([("nav.dashboard", "لوحة القيادة")])),
        );
        pool.run_until_stalled();
        assert_eq!(translator.current_locale(), Some(LocaleCode::Ar));

        // the stale French resolution arrives afterwards and is discarded
        source.resolve(
            LocaleCode::Fr,
            Ok(Catalog::from_pairs([("nav.dashboard", "Tableau de bord")])),
        );
        pool.run_until_stalled();
        assert_eq!(translator.current_locale(), Some(LocaleCode::Ar));
        assert_eq!(translator.translate("nav.dashboard"), "لوحة القيادة");
    }

    #[test]
    fn foreground_switch_shares_the_background_load() {
        let source = Arc::new(GatedSource::default());
        let translator = Translator::new(source.clone());
        translator.seed(LocaleCode::En, english());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        pool.run_until(translator.initialize(LocaleCode::En));

        // background warm-up starts loading fr first
        let background = translator.clone();
        spawner
            .spawn_local(async move { background.preload_rest().await })
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(source.call_count(LocaleCode::Fr), 1);

        // a foreground switch for the same locale joins the in-flight load
        let foreground = translator.clone();
        spawner
            .spawn_local(async move { foreground.switch_locale(LocaleCode::Fr).await })
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(source.call_count(LocaleCode::Fr), 1);

        source.resolve(
            LocaleCode::Fr,
            Ok(Catalog::from_pairs([("nav.dashboard", "Tableau de bord")])),
        );
        pool.run_until_stalled();
        assert_eq!(translator.current_locale(), Some(LocaleCode::Fr));
        assert_eq!(translator.translate("nav.dashboard"), "Tableau de bord");
    }

    #[test]
    fn preload_runs_once_per_session() {
        let source = Arc::new(GatedSource::default());
        let translator = Translator::new(source.clone());
        translator.seed(LocaleCode::En, english());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        pool.run_until(translator.initialize(LocaleCode::En));

        for _ in 0..2 {
            let warm = translator.clone();
            spawner
                .spawn_local(async move { warm.preload_rest().await })
                .unwrap();
        }
        pool.run_until_stalled();

        // the second trigger is a no-op: one load for the first uncached locale
        assert_eq!(source.call_count(LocaleCode::Fr), 1);
    }
}
