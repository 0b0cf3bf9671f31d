//! The preference domains: locale, device class, and sidebar layout.
//!
//! Each domain is a small closed record persisted as a JSON cookie. The
//! [`Preference`] trait ties a record to its cookie name and its cross-field
//! invariants; everything a Rust enum can already rule out is left to serde.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// The closed set of locales the dashboard ships catalogs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleCode {
    En,
    Fr,
    Es,
    De,
    Ar,
    He,
}

impl LocaleCode {
    pub const ALL: [LocaleCode; 6] = [
        LocaleCode::En,
        LocaleCode::Fr,
        LocaleCode::Es,
        LocaleCode::De,
        LocaleCode::Ar,
        LocaleCode::He,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LocaleCode::En => "en",
            LocaleCode::Fr => "fr",
            LocaleCode::Es => "es",
            LocaleCode::De => "de",
            LocaleCode::Ar => "ar",
            LocaleCode::He => "he",
        }
    }

    /// The direction is fully determined by the code.
    pub fn direction(self) -> Direction {
        match self {
            LocaleCode::Ar | LocaleCode::He => Direction::Rtl,
            _ => Direction::Ltr,
        }
    }
}

impl std::fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted UI setting group.
///
/// `is_valid` covers the invariants the type system cannot: a decoded record
/// with one invalid field is rejected in its entirety, never partially
/// accepted.
pub trait Preference:
    Clone + PartialEq + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Cookie this preference persists to.
    const COOKIE_NAME: &'static str;

    fn is_valid(&self) -> bool;
}

/// Locale preference. `direction` is redundant with `code` on purpose: the
/// server-rendered markup reads it without consulting the direction table,
/// and a mismatched pair fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalePref {
    pub code: LocaleCode,
    pub direction: Direction,
}

impl LocalePref {
    pub fn new(code: LocaleCode) -> Self {
        Self {
            code,
            direction: code.direction(),
        }
    }
}

impl Default for LocalePref {
    fn default() -> Self {
        Self::new(LocaleCode::En)
    }
}

impl Preference for LocalePref {
    const COOKIE_NAME: &'static str = "ui_locale";

    fn is_valid(&self) -> bool {
        self.direction == self.code.direction()
    }
}

/// Viewport breakpoint below which the dashboard renders its mobile layout.
pub const DEFAULT_MOBILE_BREAKPOINT: u32 = 768;

/// Device-class preference. `is_mobile` is advisory: once the client is
/// hydrated the live media-query probe is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClassPref {
    pub is_mobile: bool,
    pub breakpoint_px: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for DeviceClassPref {
    fn default() -> Self {
        Self {
            is_mobile: false,
            breakpoint_px: DEFAULT_MOBILE_BREAKPOINT,
            user_agent: None,
        }
    }
}

impl Preference for DeviceClassPref {
    const COOKIE_NAME: &'static str = "ui_device";

    fn is_valid(&self) -> bool {
        self.breakpoint_px > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarVariant {
    Sidebar,
    Floating,
    Inset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseMode {
    Offcanvas,
    Icon,
    None,
}

/// Sidebar layout preference. No cross-field invariants; every field is
/// closed by its enum domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarPref {
    pub open: bool,
    pub open_on_mobile: bool,
    pub side: Side,
    pub variant: SidebarVariant,
    pub collapse_mode: CollapseMode,
}

impl Default for SidebarPref {
    fn default() -> Self {
        Self {
            open: true,
            open_on_mobile: false,
            side: Side::Left,
            variant: SidebarVariant::Sidebar,
            collapse_mode: CollapseMode::Offcanvas,
        }
    }
}

impl Preference for SidebarPref {
    const COOKIE_NAME: &'static str = "ui_sidebar";

    fn is_valid(&self) -> bool {
        true
    }
}
