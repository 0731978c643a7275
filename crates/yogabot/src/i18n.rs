use std::borrow::Cow;
use std::collections::HashMap;

use fluent_templates::{fluent_bundle::FluentValue, static_loader, Loader};
use unic_langid::{langid, LanguageIdentifier};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "ru",
        // Telegram renders the Unicode isolation marks as garbage
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// Default language identifier used as a fallback.
pub const DEFAULT_LANG: LanguageIdentifier = langid!("ru");

const ENGLISH: LanguageIdentifier = langid!("en");

/// Picks the bot language from a Telegram `language_code`.
///
/// Russian speakers and unknown locales get Russian, everyone else English.
pub fn lang_from_code(code: Option<&str>) -> LanguageIdentifier {
    let Some(code) = code else {
        return DEFAULT_LANG;
    };
    let primary = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
    match primary.as_str() {
        "" | "ru" | "uk" | "be" | "kk" => DEFAULT_LANG,
        _ => ENGLISH,
    }
}

/// Returns a localized string for the given key.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    LOCALES
        .try_lookup(lang, key)
        .or_else(|| LOCALES.try_lookup(&DEFAULT_LANG, key))
        .unwrap_or_else(|| key.to_string())
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &[(&'static str, FluentValue<'static>)]) -> String {
    let args: HashMap<Cow<'static, str>, FluentValue<'static>> =
        args.iter().map(|(k, v)| (Cow::Borrowed(*k), v.clone())).collect();

    LOCALES
        .try_lookup_with_args(lang, key, &args)
        .or_else(|| LOCALES.try_lookup_with_args(&DEFAULT_LANG, key, &args))
        .unwrap_or_else(|| key.to_string())
}

/// Shorthand for building an interpolation argument.
pub fn arg(name: &'static str, value: impl Into<FluentValue<'static>>) -> (&'static str, FluentValue<'static>) {
    (name, value.into())
}
