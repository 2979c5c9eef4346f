use crate::types::Size;

/// Scale applied to assets that have no entry in [`MODEL_SCALES`].
pub const FALLBACK_MODEL_SCALE: f64 = 1.5;

/// Keyword to asset path table. Substring fallback walks it in this order.
pub const MODEL_KEYWORDS: [(&str, &str); 27] = [
    ("sofa", "/models/sofa.glb"),
    ("kanapa", "/models/sofa.glb"),
    ("couch", "/models/sofa.glb"),
    ("chair", "/models/chair.glb"),
    ("krzesło", "/models/chair.glb"),
    ("krzeslo", "/models/chair.glb"),
    ("fotel", "/models/chair.glb"),
    ("table", "/models/table.glb"),
    ("stół", "/models/table.glb"),
    ("stol", "/models/table.glb"),
    ("stolik", "/models/table.glb"),
    ("bed", "/models/bed.glb"),
    ("łóżko", "/models/bed.glb"),
    ("lozko", "/models/bed.glb"),
    ("lamp", "/models/lamp.glb"),
    ("lampa", "/models/lamp.glb"),
    ("wardrobe", "/models/wardrobe.glb"),
    ("szafa", "/models/wardrobe.glb"),
    ("regał", "/models/wardrobe.glb"),
    ("regal", "/models/wardrobe.glb"),
    ("tv", "/models/tv.glb"),
    ("telewizor", "/models/tv.glb"),
    ("plant", "/models/plant.glb"),
    ("roślina", "/models/plant.glb"),
    ("roslina", "/models/plant.glb"),
    ("kwiat", "/models/plant.glb"),
    ("doniczka", "/models/plant.glb"),
];

/// Default uniform scale per asset. The bundled low-poly assets are small.
pub const MODEL_SCALES: [(&str, f64); 8] = [
    ("/models/sofa.glb", 2.0),
    ("/models/chair.glb", 1.8),
    ("/models/table.glb", 2.0),
    ("/models/bed.glb", 2.2),
    ("/models/lamp.glb", 2.0),
    ("/models/wardrobe.glb", 2.0),
    ("/models/tv.glb", 2.5),
    ("/models/plant.glb", 1.5),
];

/// Resolves a furniture type label to a pre-built asset.
///
/// Exact (case-insensitive) keyword matches win. Otherwise the first keyword
/// that contains the label, or is contained in it, is used, so descriptive
/// phrases like "wygodna kanapa" still resolve.
pub fn find_model_path(kind: Option<&str>) -> Option<&'static str> {
    let lowered = kind.map(str::trim).filter(|value| !value.is_empty())?.to_lowercase();

    if let Some((_, path)) = MODEL_KEYWORDS.iter().find(|(key, _)| *key == lowered) {
        return Some(*path);
    }

    MODEL_KEYWORDS
        .iter()
        .find(|(key, _)| lowered.contains(key) || key.contains(lowered.as_str()))
        .map(|(_, path)| *path)
}

/// Default scale for an asset, or [`FALLBACK_MODEL_SCALE`] when unlisted.
pub fn default_model_scale(path: &str) -> f64 {
    MODEL_SCALES
        .iter()
        .find(|(asset, _)| *asset == path)
        .map(|(_, scale)| *scale)
        .unwrap_or(FALLBACK_MODEL_SCALE)
}

/// Distinct asset paths in catalog order, for preloading.
pub fn asset_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = Vec::new();
    for (_, path) in MODEL_KEYWORDS {
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Keywords grouped by the asset they resolve to, in catalog order.
pub fn keywords_by_asset() -> Vec<(&'static str, Vec<&'static str>)> {
    asset_paths()
        .into_iter()
        .map(|path| {
            let keywords = MODEL_KEYWORDS
                .iter()
                .filter(|(_, asset)| *asset == path)
                .map(|(key, _)| *key)
                .collect();
            (path, keywords)
        })
        .collect()
}

/// The closed furniture vocabulary with built-in default dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FurnitureKind {
    Sofa,
    Table,
    Chair,
    Lamp,
    Wardrobe,
    Bed,
}

impl FurnitureKind {
    pub const ALL: [FurnitureKind; 6] = [
        FurnitureKind::Sofa,
        FurnitureKind::Table,
        FurnitureKind::Chair,
        FurnitureKind::Lamp,
        FurnitureKind::Wardrobe,
        FurnitureKind::Bed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FurnitureKind::Sofa => "sofa",
            FurnitureKind::Table => "table",
            FurnitureKind::Chair => "chair",
            FurnitureKind::Lamp => "lamp",
            FurnitureKind::Wardrobe => "wardrobe",
            FurnitureKind::Bed => "bed",
        }
    }

    pub fn parse(name: &str) -> Option<FurnitureKind> {
        let lowered = name.trim().to_lowercase();
        FurnitureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
    }

    pub fn default_size(self) -> Size {
        match self {
            FurnitureKind::Sofa => Size::new(2.0, 0.9, 0.8),
            FurnitureKind::Table => Size::new(1.2, 0.8, 0.75),
            FurnitureKind::Chair => Size::new(0.45, 0.45, 0.9),
            FurnitureKind::Lamp => Size::new(0.4, 0.4, 1.5),
            FurnitureKind::Wardrobe => Size::new(1.5, 0.6, 2.2),
            FurnitureKind::Bed => Size::new(1.6, 2.0, 0.5),
        }
    }
}
