use edgegraph::{extract_minimal_cycles, Graph, PrimitiveKind, Vec3};

fn square(width: f32) -> Graph {
    let mut g = Graph::new();
    let a = g.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = g.add_node(Vec3::new(1.0, 0.0, 0.0));
    let c = g.add_node(Vec3::new(1.0, 0.0, 1.0));
    let d = g.add_node(Vec3::new(0.0, 0.0, 1.0));
    g.add_edge(a, b, width);
    g.add_edge(b, c, width);
    g.add_edge(c, d, width);
    g.add_edge(d, a, width);
    g
}

#[test]
fn square_decomposes_into_one_cycle() {
    let g = square(0.4);
    let prims = extract_minimal_cycles(&g).unwrap();
    assert_eq!(prims.len(), 1);
    let p = &prims[0];
    assert_eq!(p.kind, PrimitiveKind::MinimalCycle);
    assert_eq!(p.graph.node_count(), 4);
    assert_eq!(p.graph.edge_count(), 4);
    for e in &p.graph.edges {
        assert_eq!(e.width, 0.4);
        assert!(e.in_cycle);
    }
    assert_eq!(p.bounds(), (0.0, 0.0, 1.0, 1.0));
    assert!(p.centroid.distance(Vec3::new(0.5, 0.0, 0.5)) < 1e-5);
    // the source graph is never consumed
    assert_eq!(g.node_count(), 4);
    assert_eq!(g.edge_count(), 4);
}

#[test]
fn open_chain_becomes_one_filament() {
    let mut g = Graph::new();
    let a = g.add_node(Vec3::new(0.0, 0.0, 0.0));
    let b = g.add_node(Vec3::new(1.0, 0.0, 0.0));
    let c = g.add_node(Vec3::new(2.0, 0.0, 0.5));
    g.add_edge(a, b, 0.3);
    g.add_edge(b, c, 0.7);
    let prims = extract_minimal_cycles(&g).unwrap();
    assert_eq!(prims.len(), 1);
    let p = &prims[0];
    assert_eq!(p.kind, PrimitiveKind::Filament);
    assert_eq!(p.graph.node_count(), 3);
    assert_eq!(p.graph.edge_count(), 2);
    let mut widths: Vec<f32> = p.graph.edges.iter().map(|e| e.width).collect();
    widths.sort_by(f32::total_cmp);
    assert_eq!(widths, vec![0.3, 0.7]);
}

#[test]
fn bowtie_yields_two_cycles_with_private_copies() {
    // two triangles meeting at a single shared vertex
    let mut g = Graph::new();
    let l1 = g.add_node(Vec3::new(0.0, 0.0, 0.0));
    let l2 = g.add_node(Vec3::new(0.0, 0.0, 2.0));
    let c = g.add_node(Vec3::new(1.0, 0.0, 1.0));
    let r1 = g.add_node(Vec3::new(2.0, 0.0, 0.0));
    let r2 = g.add_node(Vec3::new(2.0, 0.0, 2.0));
    g.add_edge(l1, l2, 0.0);
    g.add_edge(l2, c, 0.0);
    g.add_edge(c, l1, 0.0);
    g.add_edge(c, r1, 0.0);
    g.add_edge(r1, r2, 0.0);
    g.add_edge(r2, c, 0.0);

    let prims = extract_minimal_cycles(&g).unwrap();
    let cycles: Vec<_> = prims
        .iter()
        .filter(|p| p.kind == PrimitiveKind::MinimalCycle)
        .collect();
    assert_eq!(cycles.len(), 2);
    for p in &cycles {
        assert_eq!(p.graph.node_count(), 3);
        assert_eq!(p.graph.edge_count(), 3);
        // each cycle carries its own copy of the shared vertex
        assert!(p
            .graph
            .nodes
            .iter()
            .any(|n| n.pos.distance(Vec3::new(1.0, 0.0, 1.0)) < 1e-6));
    }
    assert_ne!(cycles[0].key, cycles[1].key);
}

#[test]
fn plus_shape_is_all_filaments() {
    let mut g = Graph::new();
    let center = g.add_node(Vec3::new(0.0, 0.0, 0.0));
    let arms = [
        g.add_node(Vec3::new(-1.0, 0.0, 0.0)),
        g.add_node(Vec3::new(1.0, 0.0, 0.0)),
        g.add_node(Vec3::new(0.0, 0.0, -1.0)),
        g.add_node(Vec3::new(0.0, 0.0, 1.0)),
    ];
    for arm in arms {
        g.add_edge(center, arm, 0.2);
    }
    let prims = extract_minimal_cycles(&g).unwrap();
    assert!(!prims.is_empty());
    assert!(prims.iter().all(|p| p.kind == PrimitiveKind::Filament));
    let total_edges: usize = prims.iter().map(|p| p.graph.edge_count()).sum();
    assert_eq!(total_edges, 4);
}

#[test]
fn grid_decomposes_into_unit_cells() {
    // 3x3 node grid, 12 edges, four unit faces
    let mut g = Graph::new();
    let mut ids = Vec::new();
    for i in 0..3 {
        for j in 0..3 {
            ids.push(g.add_node(Vec3::new(i as f32, 0.0, j as f32)));
        }
    }
    let at = |i: usize, j: usize| ids[i * 3 + j];
    for i in 0..3 {
        for j in 0..3 {
            if i + 1 < 3 {
                g.add_edge(at(i, j), at(i + 1, j), 0.0);
            }
            if j + 1 < 3 {
                g.add_edge(at(i, j), at(i, j + 1), 0.0);
            }
        }
    }
    let prims = extract_minimal_cycles(&g).unwrap();
    let cycles: Vec<_> = prims
        .iter()
        .filter(|p| p.kind == PrimitiveKind::MinimalCycle)
        .collect();
    assert_eq!(cycles.len(), 4);
    for p in &cycles {
        assert_eq!(p.graph.node_count(), 4);
        assert_eq!(p.graph.edge_count(), 4);
        let (min_x, min_z, max_x, max_z) = p.bounds();
        assert!((max_x - min_x - 1.0).abs() < 1e-6);
        assert!((max_z - min_z - 1.0).abs() < 1e-6);
    }
}

#[test]
fn cycle_with_tagged_stub_leaves_no_filament() {
    // a pendant hangs off the square; once the cycle is peeled, the
    // tagged boundary remainder is discarded rather than re-emitted
    let mut g = square(0.0);
    let b = g.nodes[1].id;
    let stub = g.add_node(Vec3::new(2.0, 0.0, 0.0));
    g.add_edge(b, stub, 0.9);
    let prims = extract_minimal_cycles(&g).unwrap();
    assert_eq!(prims.len(), 2);
    let filaments: Vec<_> = prims
        .iter()
        .filter(|p| p.kind == PrimitiveKind::Filament)
        .collect();
    assert_eq!(filaments.len(), 1);
    // only the stub edge survives as filament material
    assert_eq!(filaments[0].graph.edge_count(), 1);
    assert_eq!(filaments[0].graph.edges[0].width, 0.9);
}

#[test]
fn colinear_fan_is_deterministic() {
    let build = || {
        let mut g = Graph::new();
        let c = g.add_node(Vec3::ZERO);
        for p in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ] {
            let n = g.add_node(p);
            g.add_edge(c, n, 0.1);
        }
        g
    };
    let summary = |g: &Graph| {
        extract_minimal_cycles(g)
            .unwrap()
            .iter()
            .map(|p| (p.kind, p.graph.node_count(), p.graph.edge_count()))
            .collect::<Vec<_>>()
    };
    let one = summary(&build());
    let two = summary(&build());
    assert_eq!(one, two);
    assert!(one.iter().all(|(k, _, _)| *k == PrimitiveKind::Filament));
}

#[test]
fn empty_graph_yields_no_primitives() {
    let g = Graph::new();
    let prims = extract_minimal_cycles(&g).unwrap();
    assert!(prims.is_empty());
}

#[test]
fn random_graphs_never_panic() {
    // cheap deterministic fuzz; decomposition must settle or report an
    // iteration cap, never hang or panic
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };
    for _ in 0..200 {
        let mut g = Graph::new();
        let n = 3 + (next() % 8) as usize;
        let ids: Vec<_> = (0..n)
            .map(|_| {
                let x = (next() % 100) as f32 * 0.1;
                let z = (next() % 100) as f32 * 0.1;
                g.add_node(Vec3::new(x, 0.0, z))
            })
            .collect();
        for _ in 0..(next() % 12) {
            let a = ids[(next() as usize) % n];
            let b = ids[(next() as usize) % n];
            g.add_edge(a, b, 0.1);
        }
        let _ = extract_minimal_cycles(&g);
    }
}

#[test]
fn isolated_nodes_are_discarded() {
    let mut g = square(0.0);
    g.add_node(Vec3::new(5.0, 0.0, 5.0));
    let prims = extract_minimal_cycles(&g).unwrap();
    assert_eq!(prims.len(), 1);
    assert_eq!(prims[0].kind, PrimitiveKind::MinimalCycle);
}
