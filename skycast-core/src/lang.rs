/// Convert a caller locale ("pt-BR", "zh_TW", "de") into the provider's `lang` tag.
///
/// Brazilian Portuguese and the Chinese variants have dedicated tags; every
/// other locale is reduced to its bare language code. Empty means "en".
pub fn provider_language(locale: &str) -> String {
    let mut parts = locale.split(['-', '_']);
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().unwrap_or_default().to_ascii_uppercase();

    match (language.as_str(), region.as_str()) {
        ("", _) => "en".to_string(),
        ("pt", "BR") => "pt_br".to_string(),
        ("zh", "") | ("zh", "CN") => "zh_cn".to_string(),
        ("zh", "TW") => "zh_tw".to_string(),
        _ => language,
    }
}
