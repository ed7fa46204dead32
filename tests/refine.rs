use edgegraph::{Graph, Primitive, PrimitiveKind, Vec3};

fn cycle_from(points: &[Vec3], width: f32) -> Primitive {
    let mut prim = Primitive::new(PrimitiveKind::MinimalCycle, 0);
    let mut ids = Vec::new();
    for &p in points {
        ids.push(prim.graph.add_node(p));
    }
    for i in 0..ids.len() {
        let eid = prim.graph.add_edge(ids[i], ids[(i + 1) % ids.len()], width);
        if let Some(eid) = eid {
            if let Some(e) = prim.graph.edge_mut(eid) {
                e.in_cycle = true;
            }
        }
    }
    prim.calculate_bounds();
    prim
}

#[test]
fn shift_insets_square_by_half_width() {
    let square = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let mut prim = cycle_from(&square, 0.2);
    prim.process(false);
    assert!(prim.is_processed());
    // every corner moves to the crossing of the two offset edge lines
    let (min_x, min_z, max_x, max_z) = prim.bounds();
    assert!((min_x - 0.1).abs() < 1e-4, "min_x {}", min_x);
    assert!((min_z - 0.1).abs() < 1e-4, "min_z {}", min_z);
    assert!((max_x - 0.9).abs() < 1e-4, "max_x {}", max_x);
    assert!((max_z - 0.9).abs() < 1e-4, "max_z {}", max_z);
    // centroid comes from the pre-shift boundary
    assert!(prim.centroid.distance(Vec3::new(0.5, 0.0, 0.5)) < 1e-5);
    assert!(prim.is_valid());
}

#[test]
fn collinear_node_falls_back_to_sideways_shift() {
    let points = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.5, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let mut prim = cycle_from(&points, 0.2);
    prim.process(false);
    // the straight-through node slides along the edge normal only
    assert!(
        prim.graph
            .nodes
            .iter()
            .any(|n| n.pos.distance(Vec3::new(0.5, 0.0, 0.1)) < 1e-4),
        "expected a node at (0.5, 0, 0.1)"
    );
}

#[test]
fn processing_chamfers_an_acute_sliver() {
    // 3 degree apex at the origin, arms 20 long
    let points = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(20.0, 0.0, -0.524),
        Vec3::new(20.0, 0.0, 0.524),
    ];
    let mut prim = cycle_from(&points, 0.0);
    assert!(!prim.evaluate());

    prim.process(true);

    // the apex is replaced by two pushed-back nodes and a cut edge
    assert_eq!(prim.graph.node_count(), 4);
    assert_eq!(prim.graph.edge_count(), 4);
    assert!(!prim.graph.nodes.iter().any(|n| n.pos.distance(Vec3::ZERO) < 1.0));
    assert!(prim.is_valid());
}

#[test]
fn process_runs_only_once() {
    let square = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let mut prim = cycle_from(&square, 0.2);
    prim.process(false);
    let positions: Vec<Vec3> = prim.graph.nodes.iter().map(|n| n.pos).collect();
    prim.process(false);
    let again: Vec<Vec3> = prim.graph.nodes.iter().map(|n| n.pos).collect();
    assert_eq!(positions, again);
}

#[test]
fn winding_sort_drops_unreached_strays() {
    let square = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    let mut prim = cycle_from(&square, 0.0);
    // a disconnected island next to the cycle
    let s1 = prim.graph.add_node(Vec3::new(3.0, 0.0, 3.0));
    let s2 = prim.graph.add_node(Vec3::new(4.0, 0.0, 3.0));
    prim.graph.add_edge(s1, s2, 0.0);
    prim.process(false);
    assert_eq!(prim.graph.node_count(), 4);
    assert_eq!(prim.graph.edge_count(), 4);
}

#[test]
fn pipeline_extract_process_generate() {
    let mut g = Graph::new();
    let a = g.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = g.add_node(Vec3::new(10.0, 0.0, 0.0));
    let c = g.add_node(Vec3::new(10.0, 0.0, 10.0));
    let d = g.add_node(Vec3::new(0.0, 0.0, 10.0));
    g.add_edge(a, b, 0.5);
    g.add_edge(b, c, 0.5);
    g.add_edge(c, d, 0.5);
    g.add_edge(d, a, 0.5);

    let mut prims = edgegraph::extract_minimal_cycles(&g).unwrap();
    assert_eq!(prims.len(), 1);
    let prim = &mut prims[0];
    prim.process(true);
    assert!(prim.is_valid());

    prim.generate(9).unwrap();
    assert!(!prim.targets.is_empty());
    let (min_x, min_z, max_x, max_z) = prim.bounds();
    for t in &prim.targets {
        assert!(t.x >= min_x && t.x <= max_x);
        assert!(t.z >= min_z && t.z <= max_z);
    }
    assert!(prim.sub.node_count() > prim.graph.node_count());
}
