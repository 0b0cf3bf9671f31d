//! Server-side request reading.
//!
//! Everything here is a pure function of the incoming request headers so the
//! server render can produce markup that matches what the client will settle
//! on after hydration. Absent or corrupt cookies are a normal first-visit
//! case and resolve to the same hard-coded defaults the client stores use;
//! nothing on this path can fail.

use crate::codec;
use crate::cookie::parse_cookie_header;
use crate::prefs::{DeviceClassPref, LocalePref, Preference, SidebarPref};

/// Read one preference from a request's `Cookie` header.
pub fn read_pref<P: Preference>(cookie_header: Option<&str>) -> P {
    let raw = cookie_header.and_then(|header| parse_cookie_header(header, P::COOKIE_NAME));
    codec::decode(raw.as_deref())
}

/// Substrings that mark a user agent as a handheld device. Advisory only;
/// the live viewport probe takes over once the client hydrates.
const MOBILE_UA_HINTS: [&str; 4] = ["Mobi", "Android", "iPhone", "iPad"];

pub fn sniff_mobile(user_agent: &str) -> bool {
    MOBILE_UA_HINTS.iter().any(|hint| user_agent.contains(hint))
}

/// Device class for a request: the cookie if one validates, otherwise a
/// default seeded from the user agent so the first render picks the right
/// layout more often than not.
pub fn read_device_pref(
    cookie_header: Option<&str>,
    user_agent: Option<&str>,
) -> DeviceClassPref {
    let raw =
        cookie_header.and_then(|header| parse_cookie_header(header, DeviceClassPref::COOKIE_NAME));
    if let Some(found) = raw.as_deref().and_then(codec::decode_strict::<DeviceClassPref>) {
        return found;
    }

    let mut pref = DeviceClassPref::default();
    if let Some(ua) = user_agent {
        pref.is_mobile = sniff_mobile(ua);
        pref.user_agent = Some(ua.to_string());
    }
    pref
}

/// The full preference snapshot for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPrefs {
    pub locale: LocalePref,
    pub device: DeviceClassPref,
    pub sidebar: SidebarPref,
}

pub fn read_request_prefs(cookie_header: Option<&str>, user_agent: Option<&str>) -> RequestPrefs {
    RequestPrefs {
        locale: read_pref(cookie_header),
        device: read_device_pref(cookie_header, user_agent),
        sidebar: read_pref(cookie_header),
    }
}

/// `Set-Cookie` header value for a server action that persists a preference.
pub fn set_cookie_header<P: Preference>(value: &P) -> String {
    format!(
        "{}={}; {}",
        P::COOKIE_NAME,
        codec::encode(value),
        codec::COOKIE_ATTRS
    )
}
