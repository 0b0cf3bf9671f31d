use proc_macro::TokenStream;

mod tr;

/// A reactive translation lookup for Leptos views.
///
/// `tr!` expands to a derived signal that resolves a dot-path message key
/// through the translator in the surrounding `PrefsContext`, so the text
/// re-renders whenever the locale changes or a catalog finishes loading.
/// Lookup never fails: before the translator is initialized, or when the key
/// is missing from the current catalog, the signal yields the key itself.
///
/// ## Syntax
/// ```ignore
/// tr!("message.key" [, name = value]*);
/// ```
///
/// ### Parameters
/// -   **`"message.key"`**: a string literal naming the message by dot path.
/// -   **`name = value`** (optional): interpolation arguments. `name` must be
///     an identifier matching a `{name}` placeholder in the message; `value`
///     is any expression implementing `ToString`. Placeholders without a
///     matching argument are left verbatim.
///
/// ## Context
/// The macro expects a `prefs_leptos::PrefsContext` to be available, provided
/// via `prefs_leptos::provide_prefs_context`.
///
/// ## Returns
/// A `leptos::prelude::Signal<String>`.
#[proc_macro]
pub fn tr(input: TokenStream) -> TokenStream {
    tr::tr_impl(input)
}
