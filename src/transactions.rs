//! Transaction lines: per-instance packing and procedural line geometry.
//!
//! A transaction is drawn as one instance of twelve vertices that carry no
//! data of their own. The vertex shader builds everything from the instance
//! attributes and `gl_VertexID`:
//!
//! * vertices 0..6: the line body, a camera-facing quad,
//! * vertices 6..9: the arrowhead where the line meets `to`,
//! * vertices 9..12: the arrowhead where the line meets `from`.
//!
//! The line is trimmed to the surface of both node spheres, then pulled back
//! further at each end that has an arrowhead so the arrow tip lands on the
//! surface. Ends without an arrowhead produce a zero-area triangle.
//! [`line_vertices`] is the same computation on the host.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::camera::Matrices;
use crate::layout::{Graph, ARROW_HEAD, ARROW_TAIL};
use crate::shader::ShaderSource;

pub const VERTICES_PER_LINE: usize = 12;

/// Half the body width of a line of width 1.
pub const LINE_HALF_WIDTH: f32 = 0.0625;
/// Arrowhead length for a line of width 1.
pub const ARROW_LENGTH: f32 = 0.5;
/// Half the arrowhead base for a line of width 1.
pub const ARROW_HALF_WIDTH: f32 = 0.2;
/// Distance between neighbouring lines of a parallel bundle.
pub const PARALLEL_SPACING: f32 = 0.4;
/// Lines are drawn slightly translucent.
pub const LINE_ALPHA: f32 = 0.75;

/// Body quad corners as (position along the line, side).
const BODY: [[f32; 2]; 6] = [
    [0.0, -1.0],
    [1.0, -1.0],
    [0.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineInstance {
    pub from: [f32; 3],
    pub from_radius: f32,
    pub to: [f32; 3],
    pub to_radius: f32,
    pub color: [f32; 3],
    pub width: f32,
    pub offset: f32,
    pub flags: u32,
}

impl LineInstance {
    fn midpoint(&self) -> Vec3 {
        (Vec3::from(self.from) + Vec3::from(self.to)) * 0.5
    }
}

/// One instance per transaction. Transactions naming a node that does not
/// exist are dropped.
pub fn pack_transactions(graph: &Graph) -> Vec<LineInstance> {
    graph
        .transactions
        .iter()
        .filter_map(|tx| {
            let from = graph.nodes.get(tx.vx0 as usize);
            let to = graph.nodes.get(tx.vx1 as usize);
            let (Some(from), Some(to)) = (from, to) else {
                log::warn!("transaction {} -> {} names a missing node", tx.vx0, tx.vx1);
                return None;
            };
            Some(LineInstance {
                from: from.position.to_array(),
                from_radius: from.radius,
                to: to.position.to_array(),
                to_radius: to.radius,
                color: tx.color,
                width: tx.width,
                offset: tx.offset,
                flags: tx.arrows,
            })
        })
        .collect()
}

/// Order translucent lines furthest-first from `eye`. Equal distances keep
/// their original order so the draw order is stable between frames.
pub fn sort_back_to_front(lines: &mut [LineInstance], eye: Vec3) {
    lines.sort_by(|a, b| {
        let da = a.midpoint().distance_squared(eye);
        let db = b.midpoint().distance_squared(eye);
        db.total_cmp(&da)
    });
}

/// Distance from a node centre to where a line offset sideways by `offset`
/// leaves the node's sphere.
fn surface_distance(radius: f32, offset: f32) -> f32 {
    (radius * radius - offset * offset).max(0.0).sqrt()
}

/// World-space vertices of one line instance, as the vertex shader emits
/// them.
pub fn line_vertices(line: &LineInstance, matrices: &Matrices) -> [Vec3; VERTICES_PER_LINE] {
    let p0 = matrices.model.transform_point3(Vec3::from(line.from));
    let p1 = matrices.model.transform_point3(Vec3::from(line.to));
    let [_, camera_up, camera_out] = matrices.camera_basis();

    let mut out = [p0; VERTICES_PER_LINE];

    let d = p1 - p0;
    let len = d.length();
    let shift_by = line.offset * PARALLEL_SPACING;
    let r0 = surface_distance(line.from_radius, shift_by);
    let r1 = surface_distance(line.to_radius, shift_by);
    if len <= r0 + r1 {
        // No part of the shifted line lies outside both spheres.
        return out;
    }

    let dir = d / len;
    let perp = dir.cross(camera_out);
    let perp = if perp.length() < 1e-4 {
        camera_up
    } else {
        perp.normalize()
    };
    let shift = perp * shift_by;

    let a = p0 + dir * r0 + shift;
    let b = p1 - dir * r1 + shift;
    let span = len - r0 - r1;
    let arrow = |flag: u32| {
        if line.flags & flag != 0 {
            (ARROW_LENGTH * line.width).min(span * 0.5)
        } else {
            0.0
        }
    };
    let head_len = arrow(ARROW_HEAD);
    let tail_len = arrow(ARROW_TAIL);

    let body_a = a + dir * tail_len;
    let body_b = b - dir * head_len;
    let half_width = LINE_HALF_WIDTH * line.width;
    for (vx, [t, side]) in BODY.into_iter().enumerate() {
        out[vx] = body_a.lerp(body_b, t) + perp * side * half_width;
    }

    let arrow_half = ARROW_HALF_WIDTH * line.width;
    let head_base = body_b;
    out[6] = b;
    out[7] = if head_len > 0.0 { head_base + perp * arrow_half } else { b };
    out[8] = if head_len > 0.0 { head_base - perp * arrow_half } else { b };

    let tail_base = body_a;
    out[9] = a;
    out[10] = if tail_len > 0.0 { tail_base + perp * arrow_half } else { a };
    out[11] = if tail_len > 0.0 { tail_base - perp * arrow_half } else { a };

    out
}

/// Vertex shader: the twelve vertices of one line, from the instance alone.
pub fn line_vertex_shader() -> String {
    ShaderSource::new()
        .float("LINE_HALF_WIDTH", LINE_HALF_WIDTH)
        .float("ARROW_LENGTH", ARROW_LENGTH)
        .float("ARROW_HALF_WIDTH", ARROW_HALF_WIDTH)
        .float("PARALLEL_SPACING", PARALLEL_SPACING)
        .float("LINE_ALPHA", LINE_ALPHA)
        .uint("ARROW_HEAD", ARROW_HEAD)
        .uint("ARROW_TAIL", ARROW_TAIL)
        .vec2_array("BODY", &BODY)
        .finish(LINE_VS)
}

pub fn line_fragment_shader() -> String {
    ShaderSource::new().finish(LINE_FS)
}

const LINE_VS: &str = r#"uniform mat4 u_model;
uniform mat4 u_view;
uniform mat4 u_projection;

in vec3 a_from;
in float a_from_radius;
in vec3 a_to;
in float a_to_radius;
in vec3 a_color;
in float a_width;
in float a_offset;
in uint a_flags;

out vec4 v_color;

float surfaceDistance(float radius, float offset) {
  return sqrt(max(radius * radius - offset * offset, 0.0));
}

float arrowLength(uint flag, float span) {
  return (a_flags & flag) != 0u ? min(ARROW_LENGTH * a_width, span * 0.5) : 0.0;
}

void main() {
  v_color = vec4(a_color, LINE_ALPHA);

  vec3 p0 = (u_model * vec4(a_from, 1.0)).xyz;
  vec3 p1 = (u_model * vec4(a_to, 1.0)).xyz;
  vec3 cameraUp = vec3(u_view[0].y, u_view[1].y, u_view[2].y);
  vec3 cameraOut = vec3(u_view[0].z, u_view[1].z, u_view[2].z);

  vec3 d = p1 - p0;
  float len = length(d);
  float shiftBy = a_offset * PARALLEL_SPACING;
  float r0 = surfaceDistance(a_from_radius, shiftBy);
  float r1 = surfaceDistance(a_to_radius, shiftBy);

  vec3 pos = p0;
  if (len > r0 + r1) {
    vec3 dir = d / len;
    vec3 perp = cross(dir, cameraOut);
    perp = length(perp) < 1e-4 ? cameraUp : normalize(perp);
    vec3 shift = perp * shiftBy;

    vec3 a = p0 + dir * r0 + shift;
    vec3 b = p1 - dir * r1 + shift;
    float span = len - r0 - r1;
    float headLen = arrowLength(ARROW_HEAD, span);
    float tailLen = arrowLength(ARROW_TAIL, span);
    vec3 bodyA = a + dir * tailLen;
    vec3 bodyB = b - dir * headLen;
    float arrowHalf = ARROW_HALF_WIDTH * a_width;

    int vx = gl_VertexID;
    if (vx < 6) {
      vec2 c = BODY[vx];
      pos = mix(bodyA, bodyB, c.x) + perp * c.y * LINE_HALF_WIDTH * a_width;
    } else if (vx < 9) {
      pos = b;
      if (headLen > 0.0 && vx > 6) {
        pos = bodyB + perp * arrowHalf * (vx == 7 ? 1.0 : -1.0);
      }
    } else {
      pos = a;
      if (tailLen > 0.0 && vx > 9) {
        pos = bodyA + perp * arrowHalf * (vx == 10 ? 1.0 : -1.0);
      }
    }
  }

  gl_Position = u_projection * u_view * vec4(pos, 1.0);
}
"#;

const LINE_FS: &str = r#"in vec4 v_color;

out vec4 outColor;

void main() {
  outColor = v_color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Orbit};
    use crate::layout::{Node, Transaction};
    use crate::shader::{declarations, declared_float};

    fn matrices() -> Matrices {
        Matrices::new(&Camera::framing(1.0, 10.0), &Orbit::default(), 1.0)
    }

    fn line(flags: u32, offset: f32) -> LineInstance {
        LineInstance {
            from: [-5.0, 0.0, 0.0],
            from_radius: 1.0,
            to: [5.0, 0.0, 0.0],
            to_radius: 1.0,
            color: [1.0, 1.0, 1.0],
            width: 1.0,
            offset,
            flags,
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<LineInstance>(), 56);
    }

    #[test]
    fn body_stops_at_node_surfaces() {
        let vs = line_vertices(&line(0, 0.0), &matrices());
        let xs: Vec<f32> = vs[..6].iter().map(|v| v.x).collect();
        let min = xs.iter().cloned().fold(f32::MAX, f32::min);
        let max = xs.iter().cloned().fold(f32::MIN, f32::max);
        assert!((min + 4.0).abs() < 1e-5);
        assert!((max - 4.0).abs() < 1e-5);
    }

    #[test]
    fn body_is_a_camera_facing_strip() {
        // Camera looks down -z, so the line widens along y.
        let vs = line_vertices(&line(0, 0.0), &matrices());
        for v in &vs[..6] {
            assert!(v.z.abs() < 1e-5);
            assert!((v.y.abs() - LINE_HALF_WIDTH).abs() < 1e-5);
        }
        // Both sides are used.
        assert!(vs[..6].iter().any(|v| v.y > 0.0));
        assert!(vs[..6].iter().any(|v| v.y < 0.0));
    }

    #[test]
    fn arrowhead_tip_touches_the_surface() {
        let vs = line_vertices(&line(ARROW_HEAD, 0.0), &matrices());
        assert!(close(vs[6], Vec3::new(4.0, 0.0, 0.0)));
        let base = 4.0 - ARROW_LENGTH;
        assert!((vs[7].x - base).abs() < 1e-5);
        assert!((vs[7].y.abs() - ARROW_HALF_WIDTH).abs() < 1e-5);
        assert!((vs[7].y + vs[8].y).abs() < 1e-5);

        // The body ends where the arrow starts.
        let body_end = vs[..6].iter().map(|v| v.x).fold(f32::MIN, f32::max);
        assert!((body_end - base).abs() < 1e-5);

        // No tail arrow: all three tail vertices coincide.
        assert!(close(vs[9], vs[10]) && close(vs[10], vs[11]));
    }

    #[test]
    fn tail_arrow_points_backwards() {
        let vs = line_vertices(&line(ARROW_TAIL, 0.0), &matrices());
        assert!(close(vs[9], Vec3::new(-4.0, 0.0, 0.0)));
        assert!(vs[10].x > vs[9].x);
        assert!(close(vs[6], vs[7]) && close(vs[7], vs[8]));
    }

    #[test]
    fn arrows_never_cross_each_other() {
        let mut short = line(ARROW_HEAD | ARROW_TAIL, 0.0);
        short.from = [-1.2, 0.0, 0.0];
        short.to = [1.2, 0.0, 0.0];
        short.width = 4.0;
        let vs = line_vertices(&short, &matrices());
        // Both arrow bases meet at the middle.
        assert!(vs[7].x.abs() < 1e-5);
        assert!(vs[10].x.abs() < 1e-5);
    }

    #[test]
    fn overlapping_nodes_draw_nothing() {
        let mut overlap = line(ARROW_HEAD, 0.0);
        overlap.from = [0.0, 0.0, 0.0];
        overlap.to = [1.5, 0.0, 0.0];
        let vs = line_vertices(&overlap, &matrices());
        assert!(vs.iter().all(|v| *v == vs[0]));
    }

    #[test]
    fn shifted_line_fits_where_the_centre_line_does_not() {
        let m = matrices();
        let mut close_pair = line(ARROW_HEAD, 0.0);
        close_pair.from = [0.0, 0.0, 0.0];
        close_pair.to = [1.9, 0.0, 0.0];
        assert!(line_vertices(&close_pair, &m).iter().all(|&v| v == Vec3::ZERO));

        // Off-centre, the line leaves each sphere sooner and a short piece
        // remains between them.
        close_pair.offset = 1.0;
        let shift = PARALLEL_SPACING;
        let r = surface_distance(1.0, shift);
        let vs = line_vertices(&close_pair, &m);
        assert!((vs[9].x - r).abs() < 1e-4);
        assert!((vs[6].x - (1.9 - r)).abs() < 1e-4);
        assert!((vs[6].y.abs() - shift).abs() < 1e-4);
    }

    #[test]
    fn parallel_lines_shift_sideways_and_reach_the_surface() {
        let m = matrices();
        let above = line_vertices(&line(0, 1.0), &m);
        let below = line_vertices(&line(0, -1.0), &m);

        let centre = |vs: &[Vec3; 12]| vs[..6].iter().map(|v| v.y).sum::<f32>() / 6.0;
        let up = centre(&above);
        let down = centre(&below);
        assert!((up.abs() - PARALLEL_SPACING).abs() < 1e-5);
        assert!((up + down).abs() < 1e-5);

        // An offset line leaves the sphere closer to the centre plane.
        let s = PARALLEL_SPACING;
        let expected = 5.0 - (1.0 - s * s).sqrt();
        let max = above[..6].iter().map(|v| v.x).fold(f32::MIN, f32::max);
        assert!((max - expected).abs() < 1e-4);
    }

    #[test]
    fn reversed_line_with_negated_offset_overlaps() {
        let m = matrices();
        let forward = line(0, 1.0);
        let mut backward = line(0, -1.0);
        std::mem::swap(&mut backward.from, &mut backward.to);

        let f = line_vertices(&forward, &m);
        let b = line_vertices(&backward, &m);
        let mean = |vs: &[Vec3; 12]| vs[..6].iter().copied().sum::<Vec3>() / 6.0;
        assert!(close(mean(&f), mean(&b)));
    }

    #[test]
    fn line_towards_the_camera_uses_camera_up() {
        let mut toward = line(0, 0.0);
        toward.from = [0.0, 0.0, -5.0];
        toward.to = [0.0, 0.0, 5.0];
        let vs = line_vertices(&toward, &matrices());
        for v in &vs[..6] {
            assert!(v.x.abs() < 1e-5);
            assert!((v.y.abs() - LINE_HALF_WIDTH).abs() < 1e-5);
        }
    }

    #[test]
    fn sorted_far_to_near_with_stable_ties() {
        let at = |x: f32, z: f32, tag: f32| LineInstance {
            from: [x, 0.0, z],
            to: [x, 0.0, z],
            width: tag,
            ..line(0, 0.0)
        };
        let mut lines = vec![at(0.0, 5.0, 1.0), at(0.0, -5.0, 2.0), at(3.0, 0.0, 3.0), at(-3.0, 0.0, 4.0)];
        sort_back_to_front(&mut lines, Vec3::new(0.0, 0.0, 20.0));
        let order: Vec<f32> = lines.iter().map(|l| l.width).collect();
        assert_eq!(order, vec![2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn packing_drops_dangling_transactions() {
        let node = |x: f32| Node {
            position: Vec3::new(x, 0.0, 0.0),
            radius: 1.0,
            color: [0.0; 3],
            fg: 0,
            bg: 0,
            decorators: [crate::atlas::NO_ICON; 4],
        };
        let graph = Graph {
            nodes: vec![node(0.0), node(4.0)],
            transactions: vec![Transaction::new(0, 1, [1.0, 0.0, 0.0]), Transaction::new(1, 7, [0.0; 3])],
        };
        let lines = pack_transactions(&graph);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to, [4.0, 0.0, 0.0]);
        assert_eq!(lines[0].flags, ARROW_HEAD);
    }

    #[test]
    fn shader_constants_match_host() {
        let vs = line_vertex_shader();
        for (name, value) in [
            ("LINE_HALF_WIDTH", LINE_HALF_WIDTH),
            ("ARROW_LENGTH", ARROW_LENGTH),
            ("ARROW_HALF_WIDTH", ARROW_HALF_WIDTH),
            ("PARALLEL_SPACING", PARALLEL_SPACING),
            ("LINE_ALPHA", LINE_ALPHA),
        ] {
            assert_eq!(declared_float(&vs, name), value, "{name}");
        }
        assert_eq!(declarations(&vs, "ARROW_HEAD"), vec!["1u"]);
        assert_eq!(declarations(&vs, "ARROW_TAIL"), vec!["2u"]);
        assert_eq!(declarations(&vs, "BODY").len(), 1);
        assert!(line_fragment_shader().starts_with("#version 300 es"));
    }
}
