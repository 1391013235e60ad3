// Integration tests for the end-to-end scope pipeline:
//   the signed 4x4 scenario, per-cell distances, coordinate round-trips,
//   rasterization idempotence, and the aggregate reconciliation properties.

use geo::Point;
use ndarray::array;

use reachgrid::{
    cell_records, compute_distances, rasterize, run_scope, AnalysisConfig, ClassPolicy,
    DistanceBands, Feature, FeatureSet, Grid, GridTransform,
};

/// 4x4 signed population grid with 1 km cells: an urban block in the
/// north-west, a rural block in the north-east, empty south half.
fn signed_grid() -> Grid {
    let data = array![
        [100.0, 100.0, -50.0, -50.0],
        [100.0, 100.0, -50.0, -50.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
    ];
    let t = GridTransform::north_up(0.0, 4000.0, 1000.0, 1000.0).unwrap();
    Grid::from_array(data, t, 32633, -9999.0).unwrap()
}

/// One occupied road cell at (0, 0).
fn road_at_origin_cell() -> FeatureSet {
    FeatureSet::new(vec![Feature::new(Point::new(500.0, 3500.0).into())], Some(32633))
}

#[test]
fn signed_scenario_distances_are_euclidean() {
    let grid = signed_grid();
    let occupancy = rasterize(&road_at_origin_cell(), &grid).unwrap();
    let field = compute_distances(&occupancy, 1.0, 1.0).unwrap();
    let records = cell_records(
        &grid,
        &field,
        ClassPolicy::Sign,
        &DistanceBands::standard(),
    ).unwrap();
    assert_eq!(records.len(), 8);

    let km = |row: usize, col: usize| {
        records.iter()
            .find(|r| (r.row, r.col) == (row, col))
            .map(|r| r.distance_km)
            .unwrap()
    };
    assert_eq!(km(0, 0), 0.0);
    assert!((km(0, 1) - 1.0).abs() < 1e-9);
    assert!((km(1, 0) - 1.0).abs() < 1e-9);
    assert!((km(1, 1) - 2f64.sqrt()).abs() < 1e-9);
    assert!((km(0, 2) - 2.0).abs() < 1e-9);
    assert!((km(0, 3) - 3.0).abs() < 1e-9);
    assert!((km(1, 2) - 5f64.sqrt()).abs() < 1e-9);
    assert!((km(1, 3) - 10f64.sqrt()).abs() < 1e-9);

    // Zero-valued southern cells never become records.
    assert!(records.iter().all(|r| r.row < 2));
}

#[test]
fn signed_scenario_aggregates_by_class_and_band() {
    let result = run_scope(
        "testland",
        &signed_grid(),
        &road_at_origin_cell(),
        &AnalysisConfig::new(ClassPolicy::Sign),
    ).unwrap();

    assert_eq!(result.totals.population, 600.0);
    assert_eq!(result.totals.urban, 400.0);
    assert_eq!(result.totals.rural, 200.0);
    assert_eq!(result.totals.cells, 8);

    // 0-1km holds the three nearest urban cells; no rural cell is that close.
    assert_eq!(result.bands[0].label, "0-1km");
    assert_eq!(result.bands[0].urban, 300.0);
    assert_eq!(result.bands[0].rural, 0.0);
    assert_eq!(result.bands[0].cells, 3);

    // Within 1 km: 300 of 400 urban (75%), none of the rural population.
    let within_1km = &result.cumulative[0];
    assert_eq!(within_1km.threshold_km, 1.0);
    assert_eq!(within_1km.urban, 300.0);
    assert_eq!(within_1km.rural, 0.0);
    assert!((within_1km.urban_share - 0.5).abs() < 1e-12); // of the scope total
    assert_eq!(within_1km.no_access.total, 300.0);
    assert_eq!(within_1km.no_access.urban, Some(100.0));
    assert_eq!(within_1km.no_access.rural, Some(200.0));

    let gap = result.gap.expect("both classes populated");
    assert!((gap.coverage[0].urban_pct - 75.0).abs() < 1e-9);
    assert_eq!(gap.coverage[0].rural_pct, 0.0);
    assert!((gap.coverage[0].gap_pct - 75.0).abs() < 1e-9);
}

#[test]
fn aggregate_tables_reconcile() {
    let result = run_scope(
        "testland",
        &signed_grid(),
        &road_at_origin_cell(),
        &AnalysisConfig::new(ClassPolicy::Sign),
    ).unwrap();

    // Band sums partition the scope totals exactly.
    let band_pop: f64 = result.bands.iter().map(|b| b.population).sum();
    let band_urban: f64 = result.bands.iter().map(|b| b.urban).sum();
    let band_cells: u64 = result.bands.iter().map(|b| b.cells).sum();
    assert_eq!(band_pop, result.totals.population);
    assert_eq!(band_urban, result.totals.urban);
    assert_eq!(band_cells, result.totals.cells);

    // Shares of the complete band partition sum to one.
    let share_sum: f64 = result.bands.iter()
        .map(|b| b.population / result.totals.population)
        .sum();
    assert!((share_sum - 1.0).abs() < 1e-3);

    // Cumulative series are non-decreasing and residuals non-negative.
    for pair in result.cumulative.windows(2) {
        assert!(pair[1].urban >= pair[0].urban);
        assert!(pair[1].rural >= pair[0].rural);
        assert!(pair[1].total >= pair[0].total);
    }
    for row in &result.cumulative {
        assert!(row.no_access.total >= 0.0);
        assert!((row.total + row.no_access.total - result.totals.population).abs() < 1e-9);
    }

    // Everything is reachable within the outermost threshold here.
    let last = result.cumulative.last().unwrap();
    assert_eq!(last.total, result.totals.population);
    assert!((last.total_share - 1.0).abs() < 1e-12);
}

#[test]
fn threshold_policy_splits_on_density() {
    let data = array![
        [400.0, 250.0],
        [300.0, 10.0],
    ];
    let t = GridTransform::north_up(0.0, 2000.0, 1000.0, 1000.0).unwrap();
    let grid = Grid::from_array(data, t, 32633, -9999.0).unwrap();
    let roads = FeatureSet::new(
        vec![Feature::new(Point::new(500.0, 1500.0).into())],
        Some(32633),
    );

    let result = run_scope(
        "testland",
        &grid,
        &roads,
        &AnalysisConfig::new(ClassPolicy::Threshold { min_urban_density: 300.0 }),
    ).unwrap();

    assert_eq!(result.totals.urban, 700.0); // 400 + 300
    assert_eq!(result.totals.rural, 260.0); // 250 + 10
    assert_eq!(result.totals.population, 960.0);
}

#[test]
fn rasterizing_duplicate_features_is_idempotent() {
    let grid = signed_grid();
    let single = road_at_origin_cell();
    let double = FeatureSet::new(
        vec![
            Feature::new(Point::new(500.0, 3500.0).into()),
            Feature::new(Point::new(500.0, 3500.0).into()),
        ],
        Some(32633),
    );

    let once = rasterize(&single, &grid).unwrap();
    let twice = rasterize(&double, &grid).unwrap();
    assert_eq!(once.data(), twice.data());

    let config = AnalysisConfig::new(ClassPolicy::Sign);
    let a = run_scope("testland", &grid, &single, &config).unwrap();
    let b = run_scope("testland", &grid, &double, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn coordinates_round_trip_within_half_a_cell() {
    let grid = signed_grid();
    for &(x, y) in &[
        (10.0, 3990.0),
        (499.9, 500.1),
        (2750.0, 1250.0),
        (3999.0, 1.0),
        (1234.5, 2345.6),
    ] {
        let (row, col) = grid.cell_of(x, y).expect("inside the extent");
        let (cx, cy) = grid.coord_of(row, col);
        assert!((cx - x).abs() <= 500.0);
        assert!((cy - y).abs() <= 500.0);
        // The center resolves back to the same cell.
        assert_eq!(grid.cell_of(cx, cy), Some((row, col)));
    }
}
