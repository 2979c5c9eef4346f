pub mod catalog;
pub mod color;
pub mod store;
pub mod types;

pub use catalog::{
    FALLBACK_MODEL_SCALE, FurnitureKind, MODEL_KEYWORDS, MODEL_SCALES, asset_paths,
    default_model_scale, find_model_path, keywords_by_asset,
};
pub use color::{COLOR_TABLE, DEFAULT_COLOR, lookup_color, normalize_color};
pub use store::{HistoryEntry, SceneStore};
pub use types::{
    Legs, Material, Part, Representation, Rotation, SceneObject, Shape, Size, Vec2, Vec3,
    next_object_id,
};
