//! Repairs an untrusted JSON document from the model into a [`SceneObject`].
//!
//! The document is read field by field and never leaves this module; every
//! missing or mistyped field falls back to a default so the result is always
//! complete. Only a non-object document, or a type outside the closed set when
//! [`TypePolicy::ClosedSet`] is selected, is rejected.

use room_core::{
    FurnitureKind, Legs, Material, Part, Representation, Rotation, SceneObject, Shape, Size, Vec2,
    Vec3, default_model_scale, find_model_path, next_object_id, normalize_color,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Label used when the model gives no usable `type`.
pub const PLACEHOLDER_TYPE: &str = "przedmiot";

/// Scale the model tends to echo back without meaning it.
pub const UNHELPFUL_SCALE: f64 = 1.0;

const DEFAULT_PART_EDGE: f64 = 0.5;

/// How to treat a `type` outside the built-in furniture set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePolicy {
    /// Keep any non-empty label, substituting [`PLACEHOLDER_TYPE`] when absent.
    #[default]
    Label,
    /// Only accept sofa, table, chair, lamp, wardrobe and bed.
    ClosedSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub type_policy: TypePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("unsupported furniture type '{0}'")]
    UnsupportedType(String),
}

/// Turns a parsed model response into a render-ready object with a fresh id.
pub fn normalize(parsed: &Value, config: &NormalizerConfig) -> Result<SceneObject, NormalizeError> {
    let Some(fields) = parsed.as_object() else {
        return Err(NormalizeError::NotAnObject(json_kind(parsed)));
    };

    let kind = resolve_kind(fields.get("type"), config.type_policy)?;
    let position = fields
        .get("position")
        .and_then(Value::as_object)
        .map(|position| Vec2 {
            x: number_or(position.get("x"), 0.0),
            z: number_or(position.get("z"), 0.0),
        })
        .unwrap_or_default();
    let rotation = Rotation {
        y: fields
            .get("rotation")
            .and_then(Value::as_object)
            .map_or(0.0, |rotation| number_or(rotation.get("y"), 0.0)),
    };
    let color = normalize_color(fields.get("color").and_then(Value::as_str));
    let size = read_size(
        fields.get("size"),
        FurnitureKind::parse(&kind).map(FurnitureKind::default_size),
    );
    let legs = fields
        .get("legs")
        .and_then(Value::as_str)
        .and_then(Legs::parse);

    let representation = resolve_representation(fields, &kind, &color);

    Ok(SceneObject {
        id: next_object_id(),
        kind,
        position,
        rotation,
        color,
        size,
        legs,
        representation,
    })
}

fn resolve_kind(value: Option<&Value>, policy: TypePolicy) -> Result<String, NormalizeError> {
    let label = value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|label| !label.is_empty());

    match policy {
        TypePolicy::Label => Ok(label.map_or_else(
            || {
                debug!("response has no type, using placeholder label");
                PLACEHOLDER_TYPE.to_string()
            },
            str::to_string,
        )),
        TypePolicy::ClosedSet => label
            .and_then(FurnitureKind::parse)
            .map(|kind| kind.as_str().to_string())
            .ok_or_else(|| NormalizeError::UnsupportedType(label.unwrap_or_default().to_string())),
    }
}

fn resolve_representation(fields: &Map<String, Value>, kind: &str, color: &str) -> Representation {
    let wants_model = fields
        .get("useModel")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if wants_model {
        let model_path = fields
            .get("modelPath")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .or_else(|| find_model_path(Some(kind)));

        match model_path {
            Some(model_path) => {
                let scale = match number(fields.get("scale")) {
                    Some(scale) if scale > 0.0 && scale != UNHELPFUL_SCALE => scale,
                    _ => default_model_scale(model_path),
                };
                return Representation::ModelBacked {
                    model_path: model_path.to_string(),
                    scale,
                };
            }
            None => debug!(kind, "no catalog model for type, falling back to parts"),
        }
    }

    Representation::Procedural {
        parts: normalize_parts(fields.get("parts"), color),
    }
}

fn normalize_parts(value: Option<&Value>, object_color: &str) -> Vec<Part> {
    let parts = value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(normalize_part)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        debug!("response has no usable parts, synthesizing a placeholder block");
        return vec![fallback_part(object_color)];
    }
    parts
}

fn normalize_part(fields: &Map<String, Value>) -> Part {
    Part {
        shape: fields
            .get("shape")
            .and_then(Value::as_str)
            .and_then(Shape::parse)
            .unwrap_or(Shape::Box),
        position: read_vec3(fields.get("position")),
        size: fields
            .get("size")
            .and_then(Value::as_object)
            .map(|size| Size {
                width: positive_or(size.get("width"), DEFAULT_PART_EDGE),
                height: positive_or(size.get("height"), DEFAULT_PART_EDGE),
                depth: positive_or(size.get("depth"), DEFAULT_PART_EDGE),
            })
            .unwrap_or(Size::cube(DEFAULT_PART_EDGE)),
        color: normalize_color(fields.get("color").and_then(Value::as_str)),
        rotation: read_vec3(fields.get("rotation")),
        material: fields
            .get("material")
            .and_then(Value::as_str)
            .and_then(Material::parse)
            .unwrap_or_default(),
    }
}

/// Single rounded block resting on the floor.
fn fallback_part(color: &str) -> Part {
    Part {
        shape: Shape::RoundedBox,
        position: Vec3 {
            x: 0.0,
            y: DEFAULT_PART_EDGE / 2.0,
            z: 0.0,
        },
        size: Size::cube(DEFAULT_PART_EDGE),
        color: color.to_string(),
        rotation: Vec3::default(),
        material: Material::Default,
    }
}

/// Merges the usable dimensions of `value` over `defaults`, one dimension at a
/// time. Without defaults all three dimensions must be present.
fn read_size(value: Option<&Value>, defaults: Option<Size>) -> Option<Size> {
    let size = value.and_then(Value::as_object);
    let dimension = |name: &str| {
        size
            .and_then(|size| number(size.get(name)))
            .filter(|value| *value > 0.0)
    };
    let (width, height, depth) = (dimension("width"), dimension("height"), dimension("depth"));

    match defaults {
        Some(defaults) => Some(Size {
            width: width.unwrap_or(defaults.width),
            height: height.unwrap_or(defaults.height),
            depth: depth.unwrap_or(defaults.depth),
        }),
        None => Some(Size {
            width: width?,
            height: height?,
            depth: depth?,
        }),
    }
}

fn read_vec3(value: Option<&Value>) -> Vec3 {
    value
        .and_then(Value::as_object)
        .map(|vector| Vec3 {
            x: number_or(vector.get("x"), 0.0),
            y: number_or(vector.get("y"), 0.0),
            z: number_or(vector.get("z"), 0.0),
        })
        .unwrap_or_default()
}

/// Accepts JSON numbers and numeric strings; rejects non-finite values.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

fn number_or(value: Option<&Value>, default: f64) -> f64 {
    number(value).unwrap_or(default)
}

fn positive_or(value: Option<&Value>, default: f64) -> f64 {
    number(value).filter(|value| *value > 0.0).unwrap_or(default)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use room_core::{DEFAULT_COLOR, FALLBACK_MODEL_SCALE, Legs, Material, Representation, SceneObject, Shape};
    use serde_json::{Value, json};

    use super::{
        NormalizeError, NormalizerConfig, PLACEHOLDER_TYPE, TypePolicy, normalize,
    };

    fn run(value: Value) -> SceneObject {
        normalize(&value, &NormalizerConfig::default()).expect("normalization should succeed")
    }

    fn parts(object: &SceneObject) -> &[room_core::Part] {
        match &object.representation {
            Representation::Procedural { parts } => parts,
            Representation::ModelBacked { .. } => panic!("expected a procedural object"),
        }
    }

    #[test]
    fn minimal_object_is_completed() {
        let object = run(json!({"type": "chair"}));

        assert_eq!(object.kind, "chair");
        assert_eq!(object.position.x, 0.0);
        assert_eq!(object.position.z, 0.0);
        assert_eq!(object.rotation.y, 0.0);
        assert_eq!(object.color, DEFAULT_COLOR);
        assert!(!object.id.is_empty());
        assert!(!parts(&object).is_empty());
        let size = object.size.expect("chair should get a default size");
        assert!((size.height - 0.9).abs() < 1e-12);
    }

    #[test]
    fn missing_type_gets_placeholder_label() {
        assert_eq!(run(json!({})).kind, PLACEHOLDER_TYPE);
        assert_eq!(run(json!({"type": "   "})).kind, PLACEHOLDER_TYPE);
        assert_eq!(run(json!({"type": 42})).kind, PLACEHOLDER_TYPE);
        assert_eq!(run(json!({"type": "unicorn lamp"})).kind, "unicorn lamp");
    }

    #[test]
    fn closed_set_policy_rejects_unknown_types() {
        let config = NormalizerConfig {
            type_policy: TypePolicy::ClosedSet,
        };
        let error = normalize(&json!({"type": "piano"}), &config)
            .expect_err("piano is outside the closed set");
        assert_eq!(error, NormalizeError::UnsupportedType("piano".to_string()));

        let accepted =
            normalize(&json!({"type": " Sofa "}), &config).expect("sofa is in the closed set");
        assert_eq!(accepted.kind, "sofa");
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let error = normalize(&json!([1, 2]), &NormalizerConfig::default())
            .expect_err("arrays are not objects");
        assert_eq!(error, NormalizeError::NotAnObject("an array"));
    }

    #[test]
    fn mistyped_fields_fall_back_to_defaults() {
        let object = run(json!({
            "type": "table",
            "position": "middle",
            "rotation": {"y": "1.5"},
            "color": 12,
            "legs": "wobbly",
            "size": {"width": 2.0}
        }));

        assert_eq!(object.position.x, 0.0);
        assert!((object.rotation.y - 1.5).abs() < 1e-12);
        assert_eq!(object.color, DEFAULT_COLOR);
        assert_eq!(object.legs, None);
        let size = object.size.expect("table should get a size");
        assert!((size.width - 2.0).abs() < 1e-12);
        assert!((size.depth - 0.8).abs() < 1e-12);
        assert!((size.height - 0.75).abs() < 1e-12);
    }

    #[test]
    fn partial_size_is_merged_over_type_defaults() {
        let object = run(json!({"type": "sofa", "size": {"width": 3.0, "height": -1}}));
        let size = object.size.expect("sofa should get a size");
        assert!((size.width - 3.0).abs() < 1e-12);
        assert!((size.depth - 0.9).abs() < 1e-12);
        assert!((size.height - 0.8).abs() < 1e-12);
    }

    #[test]
    fn partial_size_without_type_defaults_is_dropped() {
        assert_eq!(run(json!({"type": "piano", "size": {"width": 1.5}})).size, None);
        let size = run(json!({
            "type": "piano",
            "size": {"width": 1.5, "depth": "0.6", "height": 1.1}
        }))
        .size
        .expect("complete size should be kept");
        assert!((size.depth - 0.6).abs() < 1e-12);
    }

    #[test]
    fn explicit_size_and_legs_are_kept() {
        let object = run(json!({
            "type": "sofa",
            "size": {"width": 2.4, "depth": 1.0, "height": 0.85},
            "legs": "LOW"
        }));
        let size = object.size.expect("explicit size should be kept");
        assert!((size.width - 2.4).abs() < 1e-12);
        assert_eq!(object.legs, Some(Legs::Low));
    }

    #[test]
    fn model_path_is_resolved_from_type_with_catalog_scale() {
        let object = run(json!({"type": "wygodna kanapa", "useModel": true, "scale": 1.0}));
        assert_eq!(
            object.representation,
            Representation::ModelBacked {
                model_path: "/models/sofa.glb".to_string(),
                scale: 2.0,
            }
        );
    }

    #[test]
    fn explicit_model_scale_is_kept() {
        let object = run(json!({
            "type": "chair",
            "useModel": true,
            "modelPath": "/models/chair.glb",
            "scale": 2.5
        }));
        assert_eq!(
            object.representation,
            Representation::ModelBacked {
                model_path: "/models/chair.glb".to_string(),
                scale: 2.5,
            }
        );
    }

    #[test]
    fn unlisted_model_path_is_kept_with_fallback_scale() {
        let object = run(json!({
            "type": "spaceship",
            "useModel": true,
            "modelPath": "/models/custom.glb"
        }));
        assert_eq!(
            object.representation,
            Representation::ModelBacked {
                model_path: "/models/custom.glb".to_string(),
                scale: FALLBACK_MODEL_SCALE,
            }
        );
    }

    #[test]
    fn blank_model_path_is_resolved_from_type() {
        let object = run(json!({
            "type": "lampa",
            "useModel": true,
            "modelPath": "  "
        }));
        assert_eq!(
            object.representation,
            Representation::ModelBacked {
                model_path: "/models/lamp.glb".to_string(),
                scale: 2.0,
            }
        );
    }

    #[test]
    fn unresolvable_model_degrades_to_parts() {
        let object = run(json!({
            "type": "spaceship",
            "useModel": true,
            "color": "zielony"
        }));
        let parts = parts(&object);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].shape, Shape::RoundedBox);
        assert_eq!(parts[0].color, "#16a34a");
        assert!((parts[0].position.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn parts_are_defaulted_individually() {
        let object = run(json!({
            "type": "console",
            "useModel": false,
            "parts": [
                {"shape": "roundedBox", "color": "black", "material": "plastic",
                 "position": {"x": 0, "y": 0.05, "z": 0},
                 "size": {"width": 0.4, "height": 0.1, "depth": 0.3}},
                {"shape": "hexagon"},
                "not a part"
            ]
        }));

        let parts = parts(&object);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].shape, Shape::RoundedBox);
        assert_eq!(parts[0].color, "#1f2937");
        assert_eq!(parts[0].material, Material::Plastic);
        assert!((parts[0].size.depth - 0.3).abs() < 1e-12);

        assert_eq!(parts[1].shape, Shape::Box);
        assert_eq!(parts[1].color, DEFAULT_COLOR);
        assert_eq!(parts[1].material, Material::Default);
        assert!((parts[1].size.width - 0.5).abs() < 1e-12);
        assert_eq!(parts[1].rotation.x, 0.0);
    }

    #[test]
    fn empty_parts_get_a_placeholder_in_object_color() {
        let object = run(json!({"type": "thing", "parts": [], "color": "#123456"}));
        let parts = parts(&object);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].color, "#123456");
    }

    #[test]
    fn ids_come_from_the_normalizer_only() {
        let object = run(json!({"type": "chair", "id": "model-chosen"}));
        assert_ne!(object.id, "model-chosen");
    }

    #[test]
    fn normalizing_twice_only_changes_the_id() {
        let inputs = [
            json!({"type": "chair", "color": "red", "position": {"x": 1.25, "z": -2}}),
            json!({"type": "kanapa", "useModel": true, "rotation": {"y": 3.14}}),
            json!({"type": "lamp", "legs": "none", "parts": [
                {"shape": "cylinder", "size": {"width": 0.3, "height": 1.4, "depth": 0.3}},
                {"shape": "cone", "material": "fabric", "color": "beige"}
            ]}),
        ];

        for input in inputs {
            let first = run(input);
            let reparsed = serde_json::to_value(&first).expect("object should serialize");
            let second = run(reparsed);
            assert_ne!(first.id, second.id);

            let without_id = |object: SceneObject| SceneObject {
                id: String::new(),
                ..object
            };
            assert_eq!(without_id(first), without_id(second));
        }
    }
}
