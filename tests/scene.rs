//! End to end on the host: config -> graph -> packed instances -> geometry.

use glam::Vec3;

use graph_viz_wasm::atlas::NO_ICON;
use graph_viz_wasm::build_graph;
use graph_viz_wasm::camera::{Camera, Matrices, Orbit, CAMERA_NEAR};
use graph_viz_wasm::config::VizConfig;
use graph_viz_wasm::layout::coords_radius;
use graph_viz_wasm::nodes::pack_nodes;
use graph_viz_wasm::transactions::{line_vertices, pack_transactions, sort_back_to_front};

fn scene(toml: &str) -> (VizConfig, graph_viz_wasm::layout::Graph) {
    let config = VizConfig::from_toml_str(toml).unwrap();
    let graph = build_graph(&config);
    (config, graph)
}

#[test]
fn every_transaction_reaches_the_gpu() {
    let (config, graph) = scene("nodes = 500");
    let nodes = pack_nodes(&graph.nodes);
    let lines = pack_transactions(&graph);

    assert_eq!(nodes.len(), config.nodes);
    assert_eq!(lines.len(), graph.transactions.len());
    assert!(nodes.iter().all(|n| n.icons[0] != NO_ICON && n.icons[1] != NO_ICON));
}

#[test]
fn framed_scene_is_in_front_of_the_camera() {
    let (_, graph) = scene("nodes = 1000\nseed = 7");
    let camera = Camera::framing(1.0, coords_radius(&graph.nodes));
    let m = Matrices::new(&camera, &Orbit::default(), 1.0);
    let model_view = m.view * m.model;

    for node in &graph.nodes {
        let z = model_view.transform_point3(node.position).z;
        assert!(z < -CAMERA_NEAR, "node at {:?} is behind the near plane", node.position);
    }

    let centre = (m.projection * model_view).project_point3(Vec3::ZERO);
    assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
}

#[test]
fn line_geometry_stays_finite_from_any_angle() {
    let (_, graph) = scene("nodes = 200\ncluster = \"ring\"");
    let mut lines = pack_transactions(&graph);
    let camera = Camera::framing(1.5, coords_radius(&graph.nodes));

    for step in 0..8 {
        let mut orbit = Orbit::default();
        orbit.x_rot = step as f32 * 0.8;
        orbit.y_rot = step as f32 * 0.3;
        let m = Matrices::new(&camera, &orbit, 1.5);

        sort_back_to_front(&mut lines, m.eye_in_model_space());
        for line in &lines {
            for v in line_vertices(line, &m) {
                assert!(v.is_finite(), "{line:?} produced {v:?}");
            }
        }
    }
}
