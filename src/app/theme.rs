use crate::model::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
        }
    }
}

/// `auto` follows the system preference; explicit choices win.
pub fn resolve(theme: Theme, prefers_dark: bool) -> ResolvedTheme {
    match theme {
        Theme::Light => ResolvedTheme::Light,
        Theme::Dark => ResolvedTheme::Dark,
        Theme::Auto if prefers_dark => ResolvedTheme::Dark,
        Theme::Auto => ResolvedTheme::Light,
    }
}
