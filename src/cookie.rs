//! Cookie access behind a small jar trait.
//!
//! The stores never touch `document.cookie` directly; they write through a
//! [`CookieJar`] handed to them at construction. The browser jar is the real
//! one, the memory jar backs the server render pass and the tests, and
//! [`parse_cookie_header`] is the pure read used on the request path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub trait CookieJar: Send + Sync {
    fn read(&self, name: &str) -> Option<String>;
    fn write(&self, name: &str, value: &str);
}

/// Pull one cookie's value out of a `Cookie` request header.
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `document.cookie`-backed jar for client builds.
#[cfg(not(feature = "ssr"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserJar;

#[cfg(not(feature = "ssr"))]
impl CookieJar for BrowserJar {
    fn read(&self, name: &str) -> Option<String> {
        use web_sys::wasm_bindgen::JsCast;

        let document = leptos::prelude::document()
            .dyn_into::<web_sys::HtmlDocument>()
            .ok()?;
        let cookies = document.cookie().ok()?;
        parse_cookie_header(&cookies, name)
    }

    fn write(&self, name: &str, value: &str) {
        use web_sys::wasm_bindgen::JsCast;

        use crate::codec::COOKIE_ATTRS;

        let Ok(document) = leptos::prelude::document().dyn_into::<web_sys::HtmlDocument>() else {
            return;
        };
        if let Err(err) = document.set_cookie(&format!("{name}={value}; {COOKIE_ATTRS}")) {
            log::warn!("failed to write cookie '{name}': {err:?}");
        }
    }
}

/// In-memory jar. Backs the server render pass (where there is no document)
/// and lets tests observe exactly how many writes a code path performs.
#[derive(Debug, Default)]
pub struct MemoryJar {
    cookies: Mutex<HashMap<String, String>>,
    writes: AtomicU32,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cookie without counting it as a write.
    pub fn seed(&self, name: &str, value: &str) {
        lock(&self.cookies).insert(name.to_string(), value.to_string());
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl CookieJar for MemoryJar {
    fn read(&self, name: &str) -> Option<String> {
        lock(&self.cookies).get(name).cloned()
    }

    fn write(&self, name: &str, value: &str) {
        lock(&self.cookies).insert(name.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
