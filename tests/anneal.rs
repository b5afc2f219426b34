// SPDX-License-Identifier: Apache-2.0

use bstar_floorplan::*;
use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::rstest;

fn three_blocks() -> Design {
    let blocks = vec![
        Block::new("A", 4, 2).unwrap(),
        Block::new("B", 2, 2).unwrap(),
        Block::new("C", 3, 3).unwrap(),
    ];
    Design::new(Outline::new(10, 10), blocks, Vec::new())
}

fn options(iterations: usize) -> AnnealOptions {
    AnnealOptions {
        iterations,
        report_interval: 0,
        ..AnnealOptions::default()
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(1234)]
fn three_blocks_area_only(#[case] seed: u64) {
    let design = three_blocks();
    let annealer =
        Annealer::new(&design, 1.0, options(5000), StdRng::seed_from_u64(seed)).unwrap();
    let norm = annealer.normalization();
    let result = annealer.run();

    assert!(result.feasible);
    assert_eq!(result.stats.iterations, 5000);
    assert!(!result.stats.cancelled);

    let rects = result.blocks.iter().map(Block::rect).collect::<Vec<_>>();
    for r in &rects {
        assert!(r.min_x >= 0 && r.min_y >= 0);
        assert!(r.max_x <= 10 && r.max_y <= 10);
    }
    for (a, b) in rects.iter().tuple_combinations() {
        assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
    }

    let bbox = bounding_box(&result.blocks);
    assert_eq!(result.area, bbox.area());
    assert_eq!((result.width, result.height), (bbox.width(), bbox.height()));
    assert_eq!(result.wirelength, 0);
    assert!((result.cost - result.area as f64 / norm.area).abs() < 1e-12);
    // total block area is 8 + 4 + 9
    assert!(result.area >= 21);
}

#[test]
fn normalization_is_positive() {
    let design = three_blocks();
    let annealer = Annealer::new(&design, 0.5, options(0), StdRng::seed_from_u64(3)).unwrap();
    let norm = annealer.normalization();
    assert!(norm.area > 0.0);
    assert!(norm.wirelength > 0.0);
}

#[test]
fn single_block() {
    let design = Design::new(
        Outline::new(5, 5),
        vec![Block::new("only", 3, 4).unwrap()],
        vec![Terminal::new("p", 5, 5)],
    );
    let result = floorplan(&design, 0.5, options(200), StdRng::seed_from_u64(5)).unwrap();
    assert!(result.feasible);
    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].origin(), (0, 0));
}

#[test]
fn infeasible_outline_reports_last_state() {
    // total block area exceeds the outline, so no placement can fit
    let design = Design::new(
        Outline::new(3, 3),
        vec![Block::new("a", 3, 3).unwrap(), Block::new("b", 2, 2).unwrap()],
        Vec::new(),
    );
    let result = floorplan(&design, 1.0, options(500), StdRng::seed_from_u64(9)).unwrap();
    assert!(!result.feasible);
    assert_eq!(result.blocks.len(), 2);
    assert_eq!(result.area, bounding_box(&result.blocks).area());
}

#[test]
fn result_figures_match_placement() {
    let mut blocks = Vec::new();
    for i in 0..8 {
        blocks.push(Block::new(format!("m{i}"), 2 + i % 3, 3 + i % 2).unwrap());
    }
    let terminals = vec![Terminal::new("west", 0, 10), Terminal::new("east", 30, 10)];
    let mut design = Design::new(Outline::new(30, 30), blocks, terminals);
    design.connect(&["west", "m0", "m5"]);
    design.connect(&["m1", "m2", "m3"]);
    design.connect(&["east", "m7"]);
    design.connect(&["m4", "m6", "m0"]);

    let result = floorplan(&design, 0.5, options(20_000), StdRng::seed_from_u64(77)).unwrap();
    assert_eq!(
        result.feasible,
        validate::is_feasible(&result.blocks, &design.outline())
    );
    assert_eq!(result.wirelength, wirelength(&design, &result.blocks));
    assert_eq!(result.area, area(&result.blocks));
}

#[test]
fn same_seed_same_result() {
    let design = three_blocks();
    let a = floorplan(&design, 0.5, options(1000), StdRng::seed_from_u64(11)).unwrap();
    let b = floorplan(&design, 0.5, options(1000), StdRng::seed_from_u64(11)).unwrap();
    assert_eq!(a.blocks, b.blocks);
    assert_eq!(a.cost, b.cost);
    assert_eq!(a.stats, b.stats);
}

#[test]
fn zero_time_limit_stops_immediately() {
    let design = three_blocks();
    let opts = AnnealOptions {
        time_limit: Some(std::time::Duration::ZERO),
        ..options(1_000_000)
    };
    let result = floorplan(&design, 0.5, opts, StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(result.stats.iterations, 0);
    assert!(result.stats.cancelled);
    // the initial level-order packing of these blocks is already feasible
    assert!(result.feasible);
}
