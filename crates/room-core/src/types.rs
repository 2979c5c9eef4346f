use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Position on the floor plane. The room spans roughly [-4, 4] on both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub z: f64,
}

/// Point or Euler rotation in object space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Heading of a placed object around the vertical axis, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub y: f64,
}

/// Extents in meters. For cylinders and spheres `width` is the diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Size {
    /// Builds a size from floor footprint first, then height.
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub const fn cube(edge: f64) -> Self {
        Self::new(edge, edge, edge)
    }
}

/// Primitive vocabulary for procedural parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Box,
    Cylinder,
    Sphere,
    Cone,
    Torus,
    Capsule,
    RoundedBox,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::Box,
        Shape::Cylinder,
        Shape::Sphere,
        Shape::Cone,
        Shape::Torus,
        Shape::Capsule,
        Shape::RoundedBox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Box => "box",
            Shape::Cylinder => "cylinder",
            Shape::Sphere => "sphere",
            Shape::Cone => "cone",
            Shape::Torus => "torus",
            Shape::Capsule => "capsule",
            Shape::RoundedBox => "roundedBox",
        }
    }

    /// Parses a shape name, accepting the camelCase, snake_case and kebab-case
    /// spellings of `roundedBox`.
    pub fn parse(name: &str) -> Option<Shape> {
        let folded = name
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-' && *ch != ' ')
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "box" | "cube" => Some(Shape::Box),
            "cylinder" => Some(Shape::Cylinder),
            "sphere" => Some(Shape::Sphere),
            "cone" => Some(Shape::Cone),
            "torus" => Some(Shape::Torus),
            "capsule" => Some(Shape::Capsule),
            "roundedbox" => Some(Shape::RoundedBox),
            _ => None,
        }
    }
}

/// Rendering hint for a part. Carries no physical meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Wood,
    Metal,
    Fabric,
    Plastic,
    Glass,
    #[default]
    Default,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Wood,
        Material::Metal,
        Material::Fabric,
        Material::Plastic,
        Material::Glass,
        Material::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Metal => "metal",
            Material::Fabric => "fabric",
            Material::Plastic => "plastic",
            Material::Glass => "glass",
            Material::Default => "default",
        }
    }

    pub fn parse(name: &str) -> Option<Material> {
        Material::ALL
            .into_iter()
            .find(|material| material.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Leg style for the furniture subset that has legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Legs {
    High,
    Low,
    None,
}

impl Legs {
    pub fn parse(name: &str) -> Option<Legs> {
        match name.trim().to_lowercase().as_str() {
            "high" => Some(Legs::High),
            "low" => Some(Legs::Low),
            "none" => Some(Legs::None),
            _ => None,
        }
    }
}

/// One primitive contributing to a procedural object. `position` is relative to
/// the center of the object's base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub shape: Shape,
    pub position: Vec3,
    pub size: Size,
    pub color: String,
    pub rotation: Vec3,
    pub material: Material,
}

/// How an object is drawn: a pre-built asset or a list of primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    ModelBacked { model_path: String, scale: f64 },
    Procedural { parts: Vec<Part> },
}

impl Representation {
    pub fn uses_model(&self) -> bool {
        matches!(self, Representation::ModelBacked { .. })
    }
}

/// A furniture or decor item placed in the room. Only the normalizer builds
/// these; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SceneObjectWire", try_from = "SceneObjectWire")]
pub struct SceneObject {
    pub id: String,
    pub kind: String,
    pub position: Vec2,
    pub rotation: Rotation,
    pub color: String,
    pub size: Option<Size>,
    pub legs: Option<Legs>,
    pub representation: Representation,
}

/// Flat camelCase layout consumed by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneObjectWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    position: Vec2,
    rotation: Rotation,
    color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    legs: Option<Legs>,
    use_model: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parts: Option<Vec<Part>>,
}

impl From<SceneObject> for SceneObjectWire {
    fn from(object: SceneObject) -> Self {
        let (use_model, model_path, scale, parts) = match object.representation {
            Representation::ModelBacked { model_path, scale } => {
                (true, Some(model_path), Some(scale), None)
            }
            Representation::Procedural { parts } => (false, None, None, Some(parts)),
        };
        Self {
            id: object.id,
            kind: object.kind,
            position: object.position,
            rotation: object.rotation,
            color: object.color,
            size: object.size,
            legs: object.legs,
            use_model,
            model_path,
            scale,
            parts,
        }
    }
}

impl TryFrom<SceneObjectWire> for SceneObject {
    type Error = String;

    fn try_from(wire: SceneObjectWire) -> Result<Self, Self::Error> {
        let representation = if wire.use_model {
            let model_path = wire
                .model_path
                .ok_or_else(|| "model-backed object is missing modelPath".to_string())?;
            Representation::ModelBacked {
                model_path,
                scale: wire.scale.unwrap_or(1.0),
            }
        } else {
            let parts = wire.parts.unwrap_or_default();
            if parts.is_empty() {
                return Err("procedural object has no parts".to_string());
            }
            Representation::Procedural { parts }
        };

        Ok(Self {
            id: wire.id,
            kind: wire.kind,
            position: wire.position,
            rotation: wire.rotation,
            color: wire.color,
            size: wire.size,
            legs: wire.legs,
            representation,
        })
    }
}

static OBJECT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh object id of the form `<unix-millis>-<sequence>`. Ids sort
/// lexically in creation order within one process.
pub fn next_object_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    let sequence = OBJECT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{millis:013}-{sequence:08}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        Legs, Material, Part, Representation, Rotation, SceneObject, Shape, Size, Vec2, Vec3,
        next_object_id,
    };

    fn procedural_chair() -> SceneObject {
        SceneObject {
            id: "1".to_string(),
            kind: "chair".to_string(),
            position: Vec2 { x: 1.0, z: -2.0 },
            rotation: Rotation { y: 0.5 },
            color: "#dc2626".to_string(),
            size: Some(Size::new(0.45, 0.45, 0.9)),
            legs: Some(Legs::High),
            representation: Representation::Procedural {
                parts: vec![Part {
                    shape: Shape::RoundedBox,
                    position: Vec3 {
                        x: 0.0,
                        y: 0.25,
                        z: 0.0,
                    },
                    size: Size::cube(0.5),
                    color: "#dc2626".to_string(),
                    rotation: Vec3::default(),
                    material: Material::Fabric,
                }],
            },
        }
    }

    #[test]
    fn shape_parse_accepts_rounded_box_spellings() {
        for name in ["roundedBox", "rounded_box", "rounded-box", "RoundedBox"] {
            assert_eq!(Shape::parse(name), Some(Shape::RoundedBox), "{name}");
        }
        assert_eq!(Shape::parse("pyramid"), None);
        for shape in Shape::ALL {
            assert_eq!(Shape::parse(shape.as_str()), Some(shape));
        }
    }

    #[test]
    fn material_parse_is_case_insensitive() {
        assert_eq!(Material::parse("Wood"), Some(Material::Wood));
        assert_eq!(Material::parse(" GLASS "), Some(Material::Glass));
        assert_eq!(Material::parse("velvet"), None);
    }

    #[test]
    fn procedural_object_serializes_to_flat_wire_format() {
        let value = serde_json::to_value(procedural_chair()).expect("object should serialize");
        assert_eq!(value["type"], json!("chair"));
        assert_eq!(value["useModel"], json!(false));
        assert_eq!(value["legs"], json!("high"));
        assert_eq!(value["parts"][0]["shape"], json!("roundedBox"));
        assert_eq!(value["parts"][0]["material"], json!("fabric"));
        assert!(value.get("modelPath").is_none());
        assert!(value.get("scale").is_none());
    }

    #[test]
    fn model_backed_object_serializes_path_and_scale() {
        let object = SceneObject {
            representation: Representation::ModelBacked {
                model_path: "/models/chair.glb".to_string(),
                scale: 1.8,
            },
            ..procedural_chair()
        };
        let value = serde_json::to_value(&object).expect("object should serialize");
        assert_eq!(value["useModel"], json!(true));
        assert_eq!(value["modelPath"], json!("/models/chair.glb"));
        assert_eq!(value["scale"], json!(1.8));
        assert!(value.get("parts").is_none());

        let back: SceneObject = serde_json::from_value(value).expect("object should deserialize");
        assert_eq!(back, object);
    }

    #[test]
    fn wire_format_rejects_half_populated_objects() {
        let missing_path = json!({
            "id": "1", "type": "sofa", "position": {"x": 0.0, "z": 0.0},
            "rotation": {"y": 0.0}, "color": "#808080", "useModel": true
        });
        assert!(serde_json::from_value::<SceneObject>(missing_path).is_err());

        let no_parts = json!({
            "id": "1", "type": "sofa", "position": {"x": 0.0, "z": 0.0},
            "rotation": {"y": 0.0}, "color": "#808080", "useModel": false, "parts": []
        });
        assert!(serde_json::from_value::<SceneObject>(no_parts).is_err());
    }

    #[test]
    fn object_ids_are_unique_and_ordered() {
        let ids = (0..64).map(|_| next_object_id()).collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, ids);
    }
}
