//! Node sprites: per-instance attribute packing and the sprite program.
//!
//! Every node is one instance of a shared six-vertex quad. An instance
//! carries its centre, radius, tint and five icon indices (foreground,
//! background and four corner decorators); the fragment shader looks the
//! icons up in the atlas from those indices.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::atlas::{HALF_PIXEL, ICONS_PER_ROW, ICON_UV_SIZE, NO_ICON};
use crate::layout::{Node, Quadrant};
use crate::shader::ShaderSource;

/// Corners of the two triangles that make a sprite, in units of radius.
pub const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

/// Beyond this view-space depth (in node radii) only the background shows.
pub const FAR_FG_DISTANCE: f32 = -100.0;
/// Nearer than this view-space depth (in node radii) the foreground is opaque.
pub const NEAR_FG_DISTANCE: f32 = -50.0;

/// Decorators take up a third of the sprite in each direction.
pub const DECORATOR_SCALE: f32 = 3.0;

/// Fragments less opaque than this are discarded.
pub const MIN_ALPHA: f32 = 0.1;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeInstance {
    pub xyz: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    /// Foreground, background.
    pub icons: [u16; 2],
    /// Top-left, top-right, bottom-left, bottom-right.
    pub decorators: [u16; 4],
}

impl From<&Node> for NodeInstance {
    fn from(node: &Node) -> Self {
        Self {
            xyz: node.position.to_array(),
            radius: node.radius,
            color: node.color,
            icons: [node.fg, node.bg],
            decorators: node.decorators,
        }
    }
}

pub fn pack_nodes(nodes: &[Node]) -> Vec<NodeInstance> {
    nodes.iter().map(NodeInstance::from).collect()
}

/// Sprite texture coordinate of a quad corner: v runs down the image.
pub fn corner_uv(corner: [f32; 2]) -> Vec2 {
    Vec2::new(corner[0] + 1.0, 1.0 - corner[1]) * 0.5
}

/// World position of one sprite corner, facing the camera.
pub fn billboard_corner(centre: Vec3, radius: f32, corner: [f32; 2], view: &Mat4) -> Vec3 {
    let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
    let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);
    centre + right * corner[0] * radius + up * corner[1] * radius
}

/// GLSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Opacity of the foreground and decorator icons at view depth `view_z`.
///
/// Small far-away sprites fade to their tinted background, since the icons
/// would be unreadable anyway.
pub fn foreground_alpha(view_z: f32, radius: f32) -> f32 {
    smoothstep(FAR_FG_DISTANCE, NEAR_FG_DISTANCE, view_z / radius)
}

/// Which decorator (if any) covers sprite coordinate `uv`.
pub fn decorator_quadrant(uv: Vec2) -> Option<Quadrant> {
    let inv = 1.0 / DECORATOR_SCALE;
    let left = uv.x < inv;
    let right = uv.x >= 1.0 - inv;
    let top = uv.y < inv;
    let bottom = uv.y >= 1.0 - inv;

    match (left, right, top, bottom) {
        (true, _, true, _) => Some(Quadrant::TopLeft),
        (_, true, true, _) => Some(Quadrant::TopRight),
        (true, _, _, true) => Some(Quadrant::BottomLeft),
        (_, true, _, true) => Some(Quadrant::BottomRight),
        _ => None,
    }
}

/// Coordinate inside the decorator icon for sprite coordinate `uv`.
pub fn decorator_uv(quadrant: Quadrant, uv: Vec2) -> Vec2 {
    let shift = 1.0 - 1.0 / DECORATOR_SCALE;
    let local = match quadrant {
        Quadrant::TopLeft => uv,
        Quadrant::TopRight => Vec2::new(uv.x - shift, uv.y),
        Quadrant::BottomLeft => Vec2::new(uv.x, uv.y - shift),
        Quadrant::BottomRight => uv - shift,
    };
    local * DECORATOR_SCALE
}

/// The decorator icon drawn at `uv`, if there is one.
pub fn decorator_at(instance: &NodeInstance, uv: Vec2) -> Option<u16> {
    decorator_quadrant(uv)
        .map(|q| instance.decorators[q as usize])
        .filter(|&icon| icon != NO_ICON)
}

/// Vertex shader: billboards the quad and works out how much of the
/// foreground shows at this depth.
pub fn node_vertex_shader() -> String {
    ShaderSource::new()
        .vec2_array("CORNERS", &QUAD_CORNERS)
        .float("FAR_FG_DISTANCE", FAR_FG_DISTANCE)
        .float("NEAR_FG_DISTANCE", NEAR_FG_DISTANCE)
        .finish(NODE_VS)
}

/// Fragment shader: decorators, then foreground, over the tinted background.
pub fn node_fragment_shader() -> String {
    ShaderSource::new()
        .uint("NO_ICON", u32::from(NO_ICON))
        .uint("ICONS_PER_ROW", ICONS_PER_ROW)
        .float("ICON_UV_SIZE", ICON_UV_SIZE)
        .float("HALF_PIXEL", HALF_PIXEL)
        .float("DECORATOR_SCALE", DECORATOR_SCALE)
        .float("MIN_ALPHA", MIN_ALPHA)
        .finish(NODE_FS)
}

const NODE_VS: &str = r#"uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;

in vec3 a_xyz;
in float a_radius;
in vec3 a_color;
in uvec2 a_icons;
in uvec4 a_decorators;

centroid out vec2 v_uv;
out vec4 v_color;
flat out uvec2 f_icons;
flat out uvec4 f_decorators;
flat out float f_alpha;

void main() {
  vec2 corner = CORNERS[gl_VertexID];
  v_uv = vec2(corner.x + 1.0, 1.0 - corner.y) * 0.5;
  v_color = vec4(a_color, 1.0);

  vec4 mPosition = u_model * vec4(a_xyz, 1.0);

  // Billboard: offset the corner along the camera's right and up axes.
  vec3 cameraRight = vec3(u_view[0].x, u_view[1].x, u_view[2].x);
  vec3 cameraUp = vec3(u_view[0].y, u_view[1].y, u_view[2].y);
  mPosition.xyz += (cameraRight * corner.x + cameraUp * corner.y) * a_radius;

  vec4 mvPosition = u_view * mPosition;
  f_alpha = smoothstep(FAR_FG_DISTANCE, NEAR_FG_DISTANCE, mvPosition.z / a_radius);

  gl_Position = u_projection * mvPosition;

  f_icons = a_icons;
  f_decorators = a_decorators;
}
"#;

const NODE_FS: &str = r#"centroid in vec2 v_uv;
in vec4 v_color;
flat in uvec2 f_icons;
flat in uvec4 f_decorators;
flat in float f_alpha;

uniform sampler2D u_atlas;

out vec4 outColor;

// Sample half a pixel in from each edge so neighbouring icons do not bleed in.
vec2 iconxy(uint ix) {
  vec2 cell = vec2(float(ix % ICONS_PER_ROW), float(ix / ICONS_PER_ROW));
  return cell / float(ICONS_PER_ROW) + vec2(HALF_PIXEL);
}

vec4 decorator(uint icon, vec2 local, vec4 current) {
  if (icon == NO_ICON) {
    return current;
  }
  vec4 d = texture(u_atlas, iconxy(icon) + ICON_UV_SIZE * local * DECORATOR_SCALE);
  return d.a >= MIN_ALPHA ? d : current;
}

void main() {
  vec4 bg = texture(u_atlas, iconxy(f_icons[1]) + ICON_UV_SIZE * v_uv) * v_color;

  if (f_alpha <= 0.0) {
    outColor = bg;
  } else {
    const float inv = 1.0 / DECORATOR_SCALE;
    bool left = v_uv.x < inv;
    bool right = v_uv.x >= 1.0 - inv;
    bool top = v_uv.y < inv;
    bool bottom = v_uv.y >= 1.0 - inv;

    // Decorators sit in front; the foreground only fills where none drew.
    outColor = vec4(0.0);
    if (left && top) {
      outColor = decorator(f_decorators[0], v_uv, outColor);
    } else if (right && top) {
      outColor = decorator(f_decorators[1], vec2(v_uv.x - (1.0 - inv), v_uv.y), outColor);
    } else if (left && bottom) {
      outColor = decorator(f_decorators[2], vec2(v_uv.x, v_uv.y - (1.0 - inv)), outColor);
    } else if (right && bottom) {
      outColor = decorator(f_decorators[3], v_uv - (1.0 - inv), outColor);
    }

    if (outColor.a == 0.0) {
      outColor = texture(u_atlas, iconxy(f_icons[0]) + ICON_UV_SIZE * v_uv);
    }

    if (f_alpha >= 1.0) {
      if (outColor.a < MIN_ALPHA) {
        outColor = bg;
      }
    } else {
      outColor = mix(bg, outColor, outColor.a * f_alpha);
    }
  }

  if (outColor.a < MIN_ALPHA) {
    discard;
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::texture_index;
    use crate::shader::{declarations, declared_float};

    fn node() -> Node {
        Node {
            position: Vec3::new(1.0, 2.0, 3.0),
            radius: 1.5,
            color: [0.1, 0.2, 0.3],
            fg: 3,
            bg: 13,
            decorators: [9, NO_ICON, NO_ICON, 5],
        }
    }

    #[test]
    fn instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<NodeInstance>(), 40);

        let packed = pack_nodes(&[node()]);
        let bytes: &[u8] = bytemuck::cast_slice(&packed);
        assert_eq!(bytes.len(), 40);
        // Icons follow the colour, little-endian u16s.
        assert_eq!(&bytes[28..32], &[3, 0, 13, 0]);
        assert_eq!(&bytes[32..34], &[9, 0]);
        assert_eq!(&bytes[34..36], &[0xff, 0xff]);
    }

    #[test]
    fn quad_covers_the_sprite() {
        let uvs: Vec<Vec2> = QUAD_CORNERS.iter().map(|&c| corner_uv(c)).collect();
        assert_eq!(uvs[0], Vec2::new(0.0, 1.0));
        assert_eq!(uvs[4], Vec2::new(1.0, 0.0));

        // Both triangles wind the same way.
        let cross = |a: [f32; 2], b: [f32; 2], c: [f32; 2]| {
            (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
        };
        let c = QUAD_CORNERS;
        assert!(cross(c[0], c[1], c[2]) > 0.0);
        assert!(cross(c[3], c[4], c[5]) > 0.0);
    }

    #[test]
    fn sprite_faces_the_camera() {
        let view = Mat4::look_at_rh(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        let centre = Vec3::new(0.0, 0.0, 0.0);
        let corner = billboard_corner(centre, 2.0, [1.0, 1.0], &view);
        // Looking down -x, so the sprite lies in the y/z plane.
        assert!(corner.x.abs() < 1e-5);
        assert!((corner.y - 2.0).abs() < 1e-5);
        assert!((corner.z.abs() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn foreground_fades_with_distance() {
        assert_eq!(foreground_alpha(-10.0, 1.0), 1.0);
        assert_eq!(foreground_alpha(-200.0, 1.0), 0.0);
        assert!((foreground_alpha(-75.0, 1.0) - 0.5).abs() < 1e-6);
        // Bigger nodes stay readable further away.
        assert_eq!(foreground_alpha(-150.0, 3.0), 1.0);
    }

    #[test]
    fn decorators_live_in_corners() {
        assert_eq!(decorator_quadrant(Vec2::new(0.1, 0.1)), Some(Quadrant::TopLeft));
        assert_eq!(decorator_quadrant(Vec2::new(0.9, 0.1)), Some(Quadrant::TopRight));
        assert_eq!(decorator_quadrant(Vec2::new(0.1, 0.9)), Some(Quadrant::BottomLeft));
        assert_eq!(decorator_quadrant(Vec2::new(0.9, 0.9)), Some(Quadrant::BottomRight));
        assert_eq!(decorator_quadrant(Vec2::new(0.5, 0.1)), None);
        assert_eq!(decorator_quadrant(Vec2::new(0.5, 0.5)), None);
    }

    #[test]
    fn decorator_uv_spans_the_icon() {
        let lo = decorator_uv(Quadrant::BottomRight, Vec2::new(2.0 / 3.0, 2.0 / 3.0));
        let hi = decorator_uv(Quadrant::BottomRight, Vec2::new(1.0, 1.0));
        assert!(lo.length() < 1e-5);
        assert!((hi - Vec2::ONE).length() < 1e-5);
    }

    #[test]
    fn absent_decorators_are_skipped() {
        let instance = NodeInstance::from(&node());
        assert_eq!(decorator_at(&instance, Vec2::new(0.1, 0.1)), texture_index("true"));
        assert_eq!(decorator_at(&instance, Vec2::new(0.9, 0.1)), None);
        assert_eq!(decorator_at(&instance, Vec2::new(0.9, 0.9)), texture_index("china"));
    }

    #[test]
    fn shader_attributes_match_instance_fields() {
        let vs = node_vertex_shader();
        for name in ["a_xyz", "a_radius", "a_color", "a_icons", "a_decorators"] {
            assert!(vs.contains(name), "{name} missing");
        }
        assert!(node_fragment_shader().contains("uniform sampler2D u_atlas"));
    }

    #[test]
    fn shaders_use_the_host_constants() {
        let vs = node_vertex_shader();
        assert_eq!(declared_float(&vs, "FAR_FG_DISTANCE"), FAR_FG_DISTANCE);
        assert_eq!(declared_float(&vs, "NEAR_FG_DISTANCE"), NEAR_FG_DISTANCE);
        assert_eq!(declarations(&vs, "CORNERS").len(), 1);
        assert!(vs.contains(&format!("CORNERS[{}]", QUAD_CORNERS.len())));

        let fs = node_fragment_shader();
        assert_eq!(declared_float(&fs, "HALF_PIXEL"), HALF_PIXEL);
        assert_eq!(declared_float(&fs, "ICON_UV_SIZE"), ICON_UV_SIZE);
        assert_eq!(declared_float(&fs, "DECORATOR_SCALE"), DECORATOR_SCALE);
        assert_eq!(declared_float(&fs, "MIN_ALPHA"), MIN_ALPHA);
        assert_eq!(declarations(&fs, "NO_ICON"), vec!["65535u"]);
        assert_eq!(declarations(&fs, "ICONS_PER_ROW"), vec![format!("{ICONS_PER_ROW}u").as_str()]);
    }
}
