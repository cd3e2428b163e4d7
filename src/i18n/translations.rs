use std::collections::{BTreeMap, HashMap};

use super::Locale;

/// (key, bg, en)
const ENTRIES: &[(&str, &str, &str)] = &[
    ("nav.home", "Начало", "Home"),
    ("nav.news", "Новини", "News"),
    ("nav.achievements", "Постижения", "Achievements"),
    ("nav.teachers", "Преподаватели", "Teachers"),
    ("nav.courses", "Курсове", "Courses"),
    ("nav.contact", "Контакти", "Contact"),
    ("contact.sent", "Съобщението е изпратено успешно.", "Your message has been sent."),
    ("admin.loaded", "Заредени са {count} записа.", "Loaded {count} records."),
    ("admin.load_failed", "Неуспешно зареждане на данните.", "Failed to load data."),
    ("admin.created", "Записът е създаден.", "Record created."),
    ("admin.updated", "Записът е обновен.", "Record updated."),
    ("admin.deleted", "Записът е изтрит.", "Record deleted."),
    (
        "admin.bulk_delete.summary",
        "Изтрити: {deleted}. Неуспешни: {failed}.",
        "Deleted: {deleted}. Failed: {failed}.",
    ),
    (
        "admin.bulk_status.published",
        "Публикувани записи: {count}.",
        "Published {count} records.",
    ),
    (
        "admin.bulk_status.unpublished",
        "Скрити записи: {count}.",
        "Unpublished {count} records.",
    ),
    ("admin.status.published", "Записът е публикуван.", "Record published."),
    ("admin.status.unpublished", "Записът е скрит.", "Record unpublished."),
    ("admin.empty_selection", "Няма избрани записи.", "No records selected."),
    ("admin.busy", "Изчакайте текущата операция да приключи.", "Wait for the current operation to finish."),
    ("admin.upload_done", "Изображението е качено.", "Image uploaded."),
];

/// Static UI dictionary, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Translations {
    by_locale: HashMap<Locale, HashMap<&'static str, &'static str>>,
}

impl Translations {
    pub fn builtin() -> Self {
        let mut bg = HashMap::with_capacity(ENTRIES.len());
        let mut en = HashMap::with_capacity(ENTRIES.len());
        for (key, bg_text, en_text) in ENTRIES {
            bg.insert(*key, *bg_text);
            en.insert(*key, *en_text);
        }

        let mut by_locale = HashMap::new();
        by_locale.insert(Locale::Bg, bg);
        by_locale.insert(Locale::En, en);
        Self { by_locale }
    }

    /// Looks `key` up for `locale`, then for the default locale, then returns the key itself.
    pub fn get<'a>(&'a self, locale: Locale, key: &'a str) -> &'a str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(Locale::DEFAULT, key))
            .unwrap_or(key)
    }

    /// Like [`Translations::get`], replacing `{name}` placeholders.
    pub fn format(&self, locale: Locale, key: &str, args: &[(&str, String)]) -> String {
        let mut text = self.get(locale, key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    pub fn dictionary(&self, locale: Locale) -> BTreeMap<&'static str, &'static str> {
        self.by_locale
            .get(&locale)
            .map(|entries| entries.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&'static str> {
        self.by_locale
            .get(&locale)
            .and_then(|entries| entries.get(key))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_has_both_locales() {
        for (key, bg, en) in ENTRIES {
            assert!(!bg.is_empty(), "missing bg text for {key}");
            assert!(!en.is_empty(), "missing en text for {key}");
        }
    }

    #[test]
    fn unknown_key_returns_key() {
        let t = Translations::builtin();
        assert_eq!(t.get(Locale::En, "no.such.key"), "no.such.key");
    }

    #[test]
    fn interpolates_placeholders() {
        let t = Translations::builtin();
        let text = t.format(
            Locale::En,
            "admin.bulk_delete.summary",
            &[("deleted", "3".to_string()), ("failed", "1".to_string())],
        );
        assert_eq!(text, "Deleted: 3. Failed: 1.");
    }

    #[test]
    fn dictionary_lists_all_keys() {
        let t = Translations::builtin();
        assert_eq!(t.dictionary(Locale::Bg).len(), ENTRIES.len());
        assert_eq!(t.dictionary(Locale::Bg)["nav.news"], "Новини");
    }
}
