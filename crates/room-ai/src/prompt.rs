use std::fmt::Write as _;

use room_core::{COLOR_TABLE, Material, SceneObject, Shape, keywords_by_asset};

/// Marker appended when the room holds nothing yet.
pub const EMPTY_ROOM_MARKER: &str = "The room is empty.";

/// Heading that introduces the list of objects already placed.
pub const EXISTING_OBJECTS_HEADING: &str = "CURRENT OBJECTS IN THE ROOM:";

const INSTRUCTIONS: &str = r##"You are an interior designer and 3D artist. The user wants to add one item to an 8x8 meter room.

IMPORTANT: Reply with ONLY valid JSON, with no text before or after it.

Response schema for a READY-MADE MODEL (preferred for standard furniture):
{
  "type": "item name",
  "useModel": true,
  "modelPath": "/models/name.glb",
  "position": {"x": number, "z": number},
  "rotation": {"y": number},
  "scale": number,
  "color": "#hex"
}

Response schema for a PROCEDURAL item (for custom or fanciful objects):
{
  "type": "item name",
  "useModel": false,
  "position": {"x": number, "z": number},
  "rotation": {"y": number},
  "color": "#hex",
  "parts": [
    {
      "shape": <shape>,
      "position": {"x": number, "y": number, "z": number},
      "size": {"width": number, "height": number, "depth": number},
      "color": "#hex",
      "rotation": {"x": number, "y": number, "z": number},
      "material": <material>
    }
  ]
}

Rules:
1. Standard furniture (sofa, chair, table, lamp, wardrobe, bed, TV, plant) uses a ready-made model (useModel: true).
2. Custom or fanciful items are generated procedurally (useModel: false).
3. rotation.y is in radians (0 = facing the camera, 3.14159 = facing away).
4. scale: 1.0 = natural size, <1 = smaller, >1 = larger.

Procedural modelling rules:
- Every item is made of parts, each one a 3D primitive.
- Part positions are RELATIVE to the item's origin (0,0,0 = center of its base, y=0 on the floor).
- For cylinder: width = diameter, height = height. For sphere: width = diameter.
- Pick a material for each part so it renders convincingly.
- Keep proportions realistic; prefer roundedBox for furniture bodies.

Coordinate conventions and placement rules:
- The room spans x and z from -4 to 4 with (0,0) at its center; keep items within -3.5 to 3.5.
- Walls: z=-4 (back), x=-4 (left), x=4 (right).
- TVs and pictures go against the back wall (z=-3.9) with rotation.y=0.
- Seating goes along walls or forms a corner group.
- Small tables go next to sofas and armchairs, or in the middle.
- Plants go in corners.
- Avoid collisions with the items already in the room."##;

/// The two text segments sent to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub system_text: String,
    pub user_text: String,
}

/// Composes the instruction block and room context for one placement.
pub fn build_request(user_text: &str, existing: &[SceneObject]) -> PlacementRequest {
    let mut system_text = String::from(INSTRUCTIONS);
    system_text.push_str("\n\n");
    system_text.push_str(&catalog_section());
    system_text.push_str("\n\n");
    system_text.push_str(&color_section());
    system_text.push_str("\n\n");
    system_text.push_str(&room_context(existing));

    PlacementRequest {
        system_text,
        user_text: format!("Create a 3D model: {user_text}"),
    }
}

/// Describes what is already in the room so the model can avoid it. The list
/// is advisory; placements are not checked against it.
pub fn room_context(existing: &[SceneObject]) -> String {
    if existing.is_empty() {
        return EMPTY_ROOM_MARKER.to_string();
    }

    let mut context = String::from(EXISTING_OBJECTS_HEADING);
    for object in existing {
        let _ = write!(
            context,
            "\n- {} at ({:.1}, {:.1})",
            object.kind, object.position.x, object.position.z
        );
    }
    context.push_str("\n\nPlace the new item so it does not collide with the existing ones.");
    context
}

fn catalog_section() -> String {
    let mut section = String::from("AVAILABLE READY-MADE MODELS (use them when they fit):");
    for (path, keywords) in keywords_by_asset() {
        let _ = write!(section, "\n- {}: {path}", keywords.join("/"));
    }

    let shapes = Shape::ALL.map(|shape| format!("\"{}\"", shape.as_str()));
    let materials = Material::ALL.map(|material| format!("\"{}\"", material.as_str()));
    let _ = write!(
        section,
        "\n\nAllowed <shape> values: {}\nAllowed <material> values: {}",
        shapes.join(" | "),
        materials.join(" | ")
    );
    section
}

fn color_section() -> String {
    let entries = COLOR_TABLE
        .iter()
        .map(|(name, hex)| format!("{name}={hex}"))
        .collect::<Vec<_>>();
    format!("COLORS: {}", entries.join(", "))
}
