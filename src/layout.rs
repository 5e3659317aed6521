//! Synthetic graph layout.
//!
//! [`sphere_builder`] places a small fixed cluster of nodes at the origin and
//! spreads the rest over a sphere with a golden-angle (Fibonacci) spiral, then
//! links nodes that share a foreground icon so there is something to draw
//! between them.

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;
use serde::Deserialize;

use crate::atlas::{known_index, BG_ICONS, FG_ICONS, NO_ICON};

/// Transaction flag: draw an arrowhead where the line meets `vx1`.
pub const ARROW_HEAD: u32 = 1 << 0;
/// Transaction flag: draw an arrowhead where the line meets `vx0`.
pub const ARROW_TAIL: u32 = 1 << 1;

/// Decorator slots, in the order they are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 3],
    pub fg: u16,
    pub bg: u16,
    /// Indexed by [`Quadrant`]; [`NO_ICON`] where there is no decorator.
    pub decorators: [u16; 4],
}

impl Node {
    fn new(position: Vec3, color: [f32; 3], fg: &str, bg: &str) -> Self {
        Self {
            position,
            radius: 1.0,
            color,
            fg: known_index(fg),
            bg: known_index(bg),
            decorators: [NO_ICON; 4],
        }
    }

    fn with_decorator(mut self, quadrant: Quadrant, icon: &str) -> Self {
        self.decorators[quadrant as usize] = known_index(icon);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub vx0: u32,
    pub vx1: u32,
    pub color: [f32; 3],
    pub width: f32,
    /// [`ARROW_HEAD`] / [`ARROW_TAIL`] bits.
    pub arrows: u32,
    /// Position within a bundle of parallel lines, in line widths.
    pub offset: f32,
}

impl Transaction {
    pub fn new(vx0: u32, vx1: u32, color: [f32; 3]) -> Self {
        Self {
            vx0,
            vx1,
            color,
            width: 1.0,
            arrows: ARROW_HEAD,
            offset: 0.0,
        }
    }

    fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    fn with_arrows(mut self, arrows: u32) -> Self {
        self.arrows = arrows;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub transactions: Vec<Transaction>,
}

/// The fixed group of nodes placed at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    /// Four nodes in a square, one decorator each.
    Square,
    /// The square plus a row of six nodes above it, joined by parallel
    /// transactions.
    #[default]
    Ring,
}

impl Cluster {
    pub fn node_count(self) -> usize {
        match self {
            Cluster::Square => 4,
            Cluster::Ring => 10,
        }
    }

    fn nodes(self) -> Vec<Node> {
        let mut nodes = vec![
            Node::new(Vec3::new(-1.0, 1.0, 0.0), [1.0, 0.0, 0.0], "dalek", "round_circle")
                .with_decorator(Quadrant::TopLeft, "true"),
            Node::new(Vec3::new(1.0, 1.0, 0.0), [0.0, 1.0, 0.0], "hal-9000", "flat_square")
                .with_decorator(Quadrant::TopRight, "false"),
            Node::new(Vec3::new(-1.0, -1.0, 0.0), [0.0, 0.0, 0.0], "mr_squiggle", "flat_circle")
                .with_decorator(Quadrant::BottomLeft, "ukraine"),
            Node::new(Vec3::new(1.0, -1.0, 0.0), [1.0, 1.0, 0.0], "tardis", "round_square")
                .with_decorator(Quadrant::BottomRight, "china"),
        ];

        if self == Cluster::Ring {
            for i in 0..6 {
                let x = -5.0 + 2.0 * i as f32;
                let grey = 0.4 + 0.1 * i as f32;
                let mut node = Node::new(
                    Vec3::new(x, 4.0, 0.0),
                    [grey, grey, 1.0],
                    FG_ICONS[i % FG_ICONS.len()],
                    "round_circle",
                );
                if i % 2 == 0 {
                    node = node.with_decorator(Quadrant::TopRight, "check");
                }
                nodes.push(node);
            }
        }

        nodes
    }

    /// Bundles of lines between the ring nodes: both directions, mixed widths
    /// and arrowheads.
    fn transactions(self) -> Vec<Transaction> {
        if self != Cluster::Ring {
            return Vec::new();
        }

        const CYAN: [f32; 3] = [0.0, 0.8, 0.8];
        const ORANGE: [f32; 3] = [1.0, 0.5, 0.0];
        const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

        vec![
            Transaction::new(4, 5, CYAN),
            Transaction::new(5, 4, ORANGE),
            Transaction::new(4, 5, WHITE)
                .with_width(2.0)
                .with_arrows(ARROW_HEAD | ARROW_TAIL),
            Transaction::new(6, 7, CYAN),
            Transaction::new(6, 7, ORANGE).with_arrows(0),
            Transaction::new(8, 9, WHITE).with_arrows(ARROW_TAIL),
            Transaction::new(9, 0, ORANGE).with_width(0.5),
        ]
    }
}

/// Build the synthetic scene: `cluster` at the origin plus enough sphere nodes
/// to make `n` in total.
pub fn sphere_builder<R: Rng>(n: usize, cluster: Cluster, rng: &mut R) -> Graph {
    let mut nodes = cluster.nodes();
    let n = n.max(cluster.node_count()) - cluster.node_count();

    if n > 0 {
        let offset = 2.0 / n as f32;
        let increment = PI * (3.0 - 5f32.sqrt());

        // Grow the sphere with the node count, with a lower limit.
        let sphere_radius = 8.0 + (n as f32).sqrt();

        for position in 0..n {
            let y = (position as f32 * offset - 1.0) + offset / 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let phi = ((position + 1) % n) as f32 * increment;
            let x = phi.cos() * r;
            let z = phi.sin() * r;

            let color = [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()];
            let mut node = Node::new(
                Vec3::new(x, y, z) * sphere_radius,
                color,
                FG_ICONS[position % FG_ICONS.len()],
                BG_ICONS[position % BG_ICONS.len()],
            );

            let corner = position % 5;
            for (quadrant, icon, needs) in [
                (Quadrant::TopLeft, "true", 1),
                (Quadrant::TopRight, "false", 2),
                (Quadrant::BottomLeft, "ukraine", 3),
                (Quadrant::BottomRight, "china", 4),
            ] {
                if corner >= needs {
                    node = node.with_decorator(quadrant, icon);
                }
            }

            nodes.push(node);
        }
    }

    let mut transactions = cluster.transactions();
    transactions.extend(chain_by_icon(&nodes, known_index("dalek"), |t| {
        [1.0 - t, 1.0 - t, t]
    }));
    transactions.extend(chain_by_icon(&nodes, known_index("hal-9000"), |t| {
        [1.0, t, t]
    }));
    assign_parallel_offsets(&mut transactions);

    Graph {
        nodes,
        transactions,
    }
}

/// Link every node showing `icon` to the previous one, in index order.
///
/// `color` receives the link's position along the chain, in `(0, 1]`.
fn chain_by_icon(nodes: &[Node], icon: u16, color: impl Fn(f32) -> [f32; 3]) -> Vec<Transaction> {
    let members: Vec<u32> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.fg == icon)
        .map(|(ix, _)| ix as u32)
        .collect();

    let len = members.len().saturating_sub(1) as f32;
    members
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Transaction::new(pair[0], pair[1], color((i + 1) as f32 / len)))
        .collect()
}

/// Spread transactions that join the same pair of nodes side by side.
///
/// A bundle of `m` lines gets offsets `k - (m-1)/2`, centred on the line
/// between the nodes. The perpendicular a line is offset along flips with its
/// direction, so lines stored the other way round get the negated offset and
/// the whole bundle fans out on one side consistently.
pub fn assign_parallel_offsets(transactions: &mut [Transaction]) {
    let mut bundles: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (ix, tx) in transactions.iter().enumerate() {
        if tx.vx0 == tx.vx1 {
            continue;
        }
        let key = (tx.vx0.min(tx.vx1), tx.vx0.max(tx.vx1));
        bundles.entry(key).or_default().push(ix);
    }

    for members in bundles.values() {
        let centre = (members.len() - 1) as f32 / 2.0;
        for (k, &ix) in members.iter().enumerate() {
            let tx = &mut transactions[ix];
            let offset = k as f32 - centre;
            tx.offset = if tx.vx0 < tx.vx1 { offset } else { -offset };
        }
    }
}

/// Distance of the furthest node centre from the origin.
pub fn coords_radius(nodes: &[Node]) -> f32 {
    nodes
        .iter()
        .map(|node| node.position.length_squared())
        .fold(0.0, f32::max)
        .sqrt()
}
