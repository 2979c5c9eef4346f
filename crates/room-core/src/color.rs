/// Neutral gray used whenever a color is missing or unrecognised.
pub const DEFAULT_COLOR: &str = "#808080";

/// Bilingual (English/Polish) color names with their canonical hex values.
/// Polish names appear both with and without diacritics.
pub const COLOR_TABLE: [(&str, &str); 37] = [
    ("red", "#dc2626"),
    ("czerwony", "#dc2626"),
    ("blue", "#2563eb"),
    ("niebieski", "#2563eb"),
    ("green", "#16a34a"),
    ("zielony", "#16a34a"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("szary", "#808080"),
    ("white", "#ffffff"),
    ("biały", "#ffffff"),
    ("bialy", "#ffffff"),
    ("black", "#1f2937"),
    ("czarny", "#1f2937"),
    ("brown", "#92400e"),
    ("brązowy", "#92400e"),
    ("brazowy", "#92400e"),
    ("beige", "#d4c4a8"),
    ("beżowy", "#d4c4a8"),
    ("bezowy", "#d4c4a8"),
    ("yellow", "#eab308"),
    ("żółty", "#eab308"),
    ("zolty", "#eab308"),
    ("orange", "#ea580c"),
    ("pomarańczowy", "#ea580c"),
    ("pomaranczowy", "#ea580c"),
    ("pink", "#ec4899"),
    ("różowy", "#ec4899"),
    ("purple", "#9333ea"),
    ("fioletowy", "#9333ea"),
    ("wood", "#8B4513"),
    ("drewno", "#8B4513"),
    ("silver", "#c0c0c0"),
    ("srebrny", "#c0c0c0"),
    ("gold", "#ffd700"),
    ("złoty", "#ffd700"),
    ("zloty", "#ffd700"),
];

/// Maps a free-form color to a hex string.
///
/// Values starting with `#` pass through untouched, even if they are not valid
/// hex. Unknown names and missing input fall back to [`DEFAULT_COLOR`].
pub fn normalize_color(input: Option<&str>) -> String {
    let Some(raw) = input.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_COLOR.to_string();
    };

    if raw.starts_with('#') {
        return raw.to_string();
    }

    lookup_color(raw).unwrap_or(DEFAULT_COLOR).to_string()
}

/// Case-insensitive lookup of a color name in [`COLOR_TABLE`].
pub fn lookup_color(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_lowercase();
    COLOR_TABLE
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, hex)| *hex)
}
