//! Layered top-to-bottom layout for projected graphs
//!
//! A reduced Sugiyama pipeline: break back edges, rank by longest path from
//! the roots, order each rank by the barycenter of its parents, then assign
//! coordinates with fixed spacing. Positions are the top-left corner of each
//! node, matching what the UI layer expects.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::graph::{EdgeId, Graph, GraphEdge, GraphNode, NodeId};

pub use crate::graph::{Point, Size};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Also compute a viewport that fits the whole graph.
    pub refit: bool,
}

/// Rectangle the UI should show to fit the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub positions: HashMap<NodeId, Point>,
    pub ranks: HashMap<NodeId, usize>,
    pub viewport: Option<Viewport>,
}

impl LayoutResult {
    pub fn apply(&self, graph: &mut Graph) {
        for node in &mut graph.nodes {
            if let Some(p) = self.positions.get(&node.id) {
                node.position = *p;
            }
        }
    }
}

enum StackItem {
    Node(usize),
    Exit(usize),
}

/// Edges that survive the acyclic pass, as `(source, target)` indices.
/// A DFS from every node in input order drops edges that point back onto
/// the current path; self loops are dropped too.
fn acyclic_edges(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, &(v, w)) in edges.iter().enumerate() {
        if v != w {
            out_edges[v].push(i);
        }
    }

    let mut visited = vec![false; n];
    let mut on_path = vec![false; n];
    let mut reversed = vec![false; edges.len()];

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut stack = vec![StackItem::Node(start)];
        while let Some(item) = stack.pop() {
            match item {
                StackItem::Exit(v) => on_path[v] = false,
                StackItem::Node(v) => {
                    if visited[v] {
                        continue;
                    }
                    visited[v] = true;
                    on_path[v] = true;
                    stack.push(StackItem::Exit(v));
                    for &e in out_edges[v].iter().rev() {
                        let w = edges[e].1;
                        if on_path[w] {
                            reversed[e] = true;
                        } else if !visited[w] {
                            stack.push(StackItem::Node(w));
                        }
                    }
                }
            }
        }
    }

    edges
        .iter()
        .enumerate()
        .filter(|&(i, &(v, w))| v != w && !reversed[i])
        .map(|(_, &e)| e)
        .collect()
}

/// Longest-path ranking: sources get rank 0, every other node sits one rank
/// below its deepest parent.
fn longest_path_ranks(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(v, w) in edges {
        indegree[w] += 1;
        children[v].push(w);
    }

    let mut rank = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
    while let Some(v) = queue.pop_front() {
        for &w in &children[v] {
            rank[w] = rank[w].max(rank[v] + 1);
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    rank
}

/// Group nodes by rank, then sweep down ordering each layer by the mean
/// position of its parents. Ties keep input order.
fn order_layers(n: usize, ranks: &[usize], edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map(|r| r + 1).unwrap_or(0);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for v in 0..n {
        layers[ranks[v]].push(v);
    }

    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(v, w) in edges {
        parents[w].push(v);
    }

    let mut order = vec![0.0f64; n];
    for layer in &layers {
        for (i, &v) in layer.iter().enumerate() {
            order[v] = i as f64;
        }
    }

    for r in 1..layers.len() {
        let mut keyed: Vec<(f64, usize, usize)> = layers[r]
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let barycenter = if parents[v].is_empty() {
                    i as f64
                } else {
                    parents[v].iter().map(|&p| order[p]).sum::<f64>() / parents[v].len() as f64
                };
                (barycenter, i, v)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        layers[r] = keyed.into_iter().map(|(_, _, v)| v).collect();
        for (i, &v) in layers[r].iter().enumerate() {
            order[v] = i as f64;
        }
    }
    layers
}

/// Position every node. Pure function of the graph shape, the measured sizes
/// and the spacing config.
pub fn compute_layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    sizes: &HashMap<NodeId, Size>,
    config: &LayoutConfig,
    options: LayoutOptions,
) -> LayoutResult {
    let n = nodes.len();
    let slot: HashMap<&NodeId, usize> = nodes.iter().enumerate().map(|(i, node)| (&node.id, i)).collect();
    let indexed: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|e| Some((*slot.get(&e.source)?, *slot.get(&e.target)?)))
        .collect();

    let size_of = |i: usize| -> Size {
        sizes
            .get(&nodes[i].id)
            .copied()
            .or(nodes[i].measured_size)
            .unwrap_or(config.default_node_size)
    };

    let dag = acyclic_edges(n, &indexed);
    let ranks = longest_path_ranks(n, &dag);
    let layers = order_layers(n, &ranks, &dag);

    let mut positions = HashMap::with_capacity(n);
    let mut rank_map = HashMap::with_capacity(n);
    let mut top = 0.0;
    for (r, layer) in layers.iter().enumerate() {
        let rank_height = layer.iter().map(|&v| size_of(v).height).fold(0.0, f64::max);
        let total_width: f64 = layer.iter().map(|&v| size_of(v).width).sum::<f64>()
            + config.node_sep * layer.len().saturating_sub(1) as f64;

        let mut left = -total_width / 2.0;
        for &v in layer {
            let size = size_of(v);
            positions.insert(
                nodes[v].id.clone(),
                Point {
                    x: left,
                    y: top + (rank_height - size.height) / 2.0,
                },
            );
            rank_map.insert(nodes[v].id.clone(), r);
            left += size.width + config.node_sep;
        }
        top += rank_height + config.rank_sep;
    }

    let viewport = if options.refit && n > 0 {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for (i, node) in nodes.iter().enumerate() {
            let p = positions[&node.id];
            let s = size_of(i);
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x + s.width);
            max_y = max_y.max(p.y + s.height);
        }
        Some(Viewport {
            x: min_x - config.padding,
            y: min_y - config.padding,
            width: max_x - min_x + 2.0 * config.padding,
            height: max_y - min_y + 2.0 * config.padding,
        })
    } else {
        None
    };

    debug!(
        nodes = n,
        edges = indexed.len(),
        back_edges = indexed.len() - dag.len(),
        ranks = layers.len(),
        refit = options.refit,
        "layout computed"
    );

    LayoutResult {
        positions,
        ranks: rank_map,
        viewport,
    }
}

/// Graph shape a layout was computed for.
#[derive(Debug, Clone, PartialEq)]
struct Shape {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    sizes: Vec<Option<(u64, u64)>>,
}

impl Shape {
    fn of(graph: &Graph, sizes: &HashMap<NodeId, Size>) -> Shape {
        let mut measured: Vec<(&NodeId, Option<Size>)> = graph
            .nodes
            .iter()
            .map(|n| (&n.id, sizes.get(&n.id).copied().or(n.measured_size)))
            .collect();
        measured.sort_by(|a, b| a.0.cmp(b.0));
        let mut edges: Vec<EdgeId> = graph.edges.iter().map(|e| e.id.clone()).collect();
        edges.sort();
        let nodes = measured.iter().map(|(id, _)| (*id).clone()).collect();
        let sizes = measured
            .iter()
            .map(|(_, size)| size.map(|s| (s.width.to_bits(), s.height.to_bits())))
            .collect();
        Shape { nodes, edges, sizes }
    }
}

/// Re-runs the layout only when the graph shape or measured sizes change,
/// and refits the viewport only on the first layout or when asked to.
#[derive(Debug, Default)]
pub struct LayoutSession {
    shape: Option<Shape>,
    fitted: bool,
}

impl LayoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, so the next layout counts as an initial load.
    pub fn reset(&mut self) {
        self.shape = None;
        self.fitted = false;
    }

    /// Lay out `graph` if needed and write positions back into it.
    /// Returns `None` when nothing changed since the last layout.
    pub fn update(
        &mut self,
        graph: &mut Graph,
        sizes: &HashMap<NodeId, Size>,
        config: &LayoutConfig,
        request_refit: bool,
    ) -> Option<LayoutResult> {
        let shape = Shape::of(graph, sizes);
        if !request_refit && self.shape.as_ref() == Some(&shape) {
            return None;
        }

        let refit = request_refit || !self.fitted;
        let result = compute_layout(&graph.nodes, &graph.edges, sizes, config, LayoutOptions { refit });
        result.apply(graph);
        self.shape = Some(shape);
        self.fitted = true;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeStyle, GraphEdge};
    use crate::models::ItemId;

    fn node(item: u32) -> GraphNode {
        GraphNode {
            id: NodeId::for_item(ItemId(item)),
            item_id: ItemId(item),
            recipe_id: None,
            quantity: 1.0,
            runs: 0,
            position: Point::default(),
            measured_size: None,
            is_done: false,
        }
    }

    fn edge(a: u32, b: u32) -> GraphEdge {
        let source = NodeId::for_item(ItemId(a));
        let target = NodeId::for_item(ItemId(b));
        GraphEdge {
            id: EdgeId::between(&source, &target),
            source,
            target,
            style: EdgeStyle::default(),
        }
    }

    fn graph(nodes: &[u32], edges: &[(u32, u32)]) -> Graph {
        Graph {
            target: ItemId(nodes[0]),
            quantity: 1.0,
            nodes: nodes.iter().map(|&i| node(i)).collect(),
            edges: edges.iter().map(|&(a, b)| edge(a, b)).collect(),
            edge_revision: 0,
        }
    }

    fn rank(result: &LayoutResult, item: u32) -> usize {
        result.ranks[&NodeId::for_item(ItemId(item))]
    }

    #[test]
    fn ranks_follow_longest_path() {
        // 1 -> 2 -> 3, and 1 -> 3 directly
        let g = graph(&[1, 2, 3], &[(1, 2), (2, 3), (1, 3)]);
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &LayoutConfig::default(), LayoutOptions::default());
        assert_eq!(rank(&r, 1), 0);
        assert_eq!(rank(&r, 2), 1);
        assert_eq!(rank(&r, 3), 2);
        let y1 = r.positions[&NodeId::for_item(ItemId(1))].y;
        let y3 = r.positions[&NodeId::for_item(ItemId(3))].y;
        assert!(y3 > y1);
    }

    #[test]
    fn back_edges_do_not_break_ranking() {
        let g = graph(&[1, 2], &[(1, 2), (2, 1), (1, 1)]);
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &LayoutConfig::default(), LayoutOptions::default());
        assert_eq!(rank(&r, 1), 0);
        assert_eq!(rank(&r, 2), 1);
    }

    #[test]
    fn rank_is_centered_with_fixed_spacing() {
        let g = graph(&[1, 2, 3], &[(1, 2), (1, 3)]);
        let cfg = LayoutConfig::default();
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &cfg, LayoutOptions::default());
        let p2 = r.positions[&NodeId::for_item(ItemId(2))];
        let p3 = r.positions[&NodeId::for_item(ItemId(3))];
        let w = cfg.default_node_size.width;
        assert_eq!(p3.x - p2.x, w + cfg.node_sep);
        assert_eq!(p2.x, -(2.0 * w + cfg.node_sep) / 2.0);
        assert_eq!(p2.y, cfg.default_node_size.height + cfg.rank_sep);
        let p1 = r.positions[&NodeId::for_item(ItemId(1))];
        assert_eq!(p1.x, -w / 2.0);
    }

    #[test]
    fn measured_sizes_are_used() {
        let g = graph(&[1, 2], &[(1, 2)]);
        let mut sizes = HashMap::new();
        sizes.insert(NodeId::for_item(ItemId(1)), Size { width: 100.0, height: 200.0 });
        let cfg = LayoutConfig::default();
        let r = compute_layout(&g.nodes, &g.edges, &sizes, &cfg, LayoutOptions::default());
        assert_eq!(r.positions[&NodeId::for_item(ItemId(2))].y, 200.0 + cfg.rank_sep);
    }

    #[test]
    fn barycenter_keeps_children_under_parents() {
        // 1 -> 2, 1 -> 3; 3 -> 4; 2 -> 5. Input order puts 4 before 5.
        let g = graph(&[1, 2, 3, 4, 5], &[(1, 2), (1, 3), (3, 4), (2, 5)]);
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &LayoutConfig::default(), LayoutOptions::default());
        let x4 = r.positions[&NodeId::for_item(ItemId(4))].x;
        let x5 = r.positions[&NodeId::for_item(ItemId(5))].x;
        assert!(x5 < x4);
    }

    #[test]
    fn viewport_only_on_refit() {
        let g = graph(&[1, 2], &[(1, 2)]);
        let cfg = LayoutConfig::default();
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &cfg, LayoutOptions::default());
        assert!(r.viewport.is_none());
        let r = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &cfg, LayoutOptions { refit: true });
        let vp = r.viewport.unwrap();
        assert_eq!(vp.width, cfg.default_node_size.width + 2.0 * cfg.padding);
        assert_eq!(vp.height, 2.0 * cfg.default_node_size.height + cfg.rank_sep + 2.0 * cfg.padding);
    }

    #[test]
    fn layout_is_deterministic() {
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        let cfg = LayoutConfig::default();
        let a = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &cfg, LayoutOptions::default());
        let b = compute_layout(&g.nodes, &g.edges, &HashMap::new(), &cfg, LayoutOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn session_refits_once_and_skips_unchanged_shapes() {
        let mut g = graph(&[1, 2], &[(1, 2)]);
        let cfg = LayoutConfig::default();
        let mut session = LayoutSession::new();
        let sizes = HashMap::new();

        let first = session.update(&mut g, &sizes, &cfg, false).unwrap();
        assert!(first.viewport.is_some());
        assert_eq!(g.nodes[1].position, first.positions[&g.nodes[1].id]);

        // completion toggles do not change the shape
        g.nodes[1].is_done = true;
        assert!(session.update(&mut g, &sizes, &cfg, false).is_none());

        let mut sizes = HashMap::new();
        sizes.insert(g.nodes[0].id.clone(), Size { width: 10.0, height: 10.0 });
        let resized = session.update(&mut g, &sizes, &cfg, false).unwrap();
        assert!(resized.viewport.is_none());

        let explicit = session.update(&mut g, &sizes, &cfg, true).unwrap();
        assert!(explicit.viewport.is_some());

        session.reset();
        assert!(session.update(&mut g, &sizes, &cfg, false).unwrap().viewport.is_some());
    }

    #[test]
    fn measured_size_on_node_counts_as_shape_change() {
        let mut g = graph(&[3, 1, 2], &[(3, 1), (3, 2)]);
        let cfg = LayoutConfig::default();
        let mut session = LayoutSession::new();
        let sizes = HashMap::new();
        session.update(&mut g, &sizes, &cfg, false).unwrap();

        g.nodes[2].measured_size = Some(Size { width: 300.0, height: 90.0 });
        let r = session.update(&mut g, &sizes, &cfg, false).unwrap();
        assert!(r.viewport.is_none());
        assert!(session.update(&mut g, &sizes, &cfg, false).is_none());
    }
}
