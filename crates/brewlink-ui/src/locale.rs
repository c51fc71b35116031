//! Locale detection from the host's reported language list.

/// Options for [`detect_locale`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocaleOptions {
    /// Keep only the primary subtag (`en-US` becomes `en`).
    pub country_code_only: bool,
}

/// Return the first reported language tag, or `None` when nothing is reported.
///
/// Only the first entry is considered; a blank first entry counts as no
/// report. The caller supplies its own fallback locale.
#[must_use]
pub fn detect_locale<S: AsRef<str>>(languages: &[S], options: LocaleOptions) -> Option<String> {
    let tag = languages.first()?.as_ref().trim();
    if tag.is_empty() {
        return None;
    }
    let tag = if options.country_code_only {
        tag.split(['-', '_']).next().unwrap_or(tag)
    } else {
        tag
    };
    tracing::debug!(locale = tag, "locale detected");
    Some(tag.to_string())
}

/// Languages reported by POSIX locale variables read through `lookup`.
///
/// `LANGUAGE` (colon-separated) wins, then `LC_ALL`, then `LANG`. Encoding
/// and modifier suffixes are stripped and the `C`/`POSIX` locales ignored.
#[must_use]
pub fn languages_from_env(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    if let Some(list) = lookup("LANGUAGE") {
        let languages: Vec<String> = list
            .split(':')
            .filter_map(normalize_posix_locale)
            .collect();
        if !languages.is_empty() {
            return languages;
        }
    }
    ["LC_ALL", "LANG"]
        .into_iter()
        .find_map(|name| lookup(name).as_deref().and_then(normalize_posix_locale))
        .into_iter()
        .collect()
}

/// Languages reported by the current process environment.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn env_languages() -> Vec<String> {
    languages_from_env(|name| std::env::var(name).ok())
}

fn normalize_posix_locale(raw: &str) -> Option<String> {
    let tag = raw.split(['.', '@']).next().unwrap_or_default().trim();
    match tag {
        "" | "C" | "POSIX" => None,
        _ => Some(tag.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const COUNTRY_ONLY: LocaleOptions = LocaleOptions {
        country_code_only: true,
    };

    #[test]
    fn returns_first_tag_trimmed() {
        assert_eq!(
            detect_locale(&[" en-US ", "de-DE"], LocaleOptions::default()).as_deref(),
            Some("en-US")
        );
    }

    #[test]
    fn country_code_only_keeps_primary_subtag() {
        assert_eq!(detect_locale(&["pt-BR"], COUNTRY_ONLY).as_deref(), Some("pt"));
        assert_eq!(detect_locale(&["en_GB"], COUNTRY_ONLY).as_deref(), Some("en"));
        assert_eq!(detect_locale(&["nl"], COUNTRY_ONLY).as_deref(), Some("nl"));
    }

    #[test]
    fn nothing_reported_is_none() {
        assert_eq!(detect_locale::<&str>(&[], LocaleOptions::default()), None);
        assert_eq!(detect_locale(&["   "], COUNTRY_ONLY), None);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn language_list_takes_precedence() {
        let languages = languages_from_env(env(&[
            ("LANGUAGE", "fr_CA:fr:en"),
            ("LANG", "de_DE.UTF-8"),
        ]));
        assert_eq!(languages, vec!["fr_CA", "fr", "en"]);
    }

    #[test]
    fn falls_back_to_lc_all_then_lang() {
        assert_eq!(
            languages_from_env(env(&[("LC_ALL", "sv_SE.UTF-8"), ("LANG", "de_DE")])),
            vec!["sv_SE"]
        );
        assert_eq!(
            languages_from_env(env(&[("LANGUAGE", ""), ("LANG", "de_DE.UTF-8@euro")])),
            vec!["de_DE"]
        );
    }

    #[test]
    fn c_locale_reports_nothing() {
        let languages = languages_from_env(env(&[("LANG", "C.UTF-8")]));
        assert!(languages.is_empty());
        assert_eq!(detect_locale(&languages, LocaleOptions::default()), None);
    }
}
