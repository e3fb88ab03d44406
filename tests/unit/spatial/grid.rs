//! Tests for grid construction, probing bookkeeping and bilinear lookup

#[cfg(test)]
mod tests {
    use probegrid::io::configuration::MAX_GRID_DIMENSION;
    use probegrid::spatial::grid::{HeightGrid, HeightRange, PointUpdate, ProbePoint};
    use probegrid::{GridError, Vector2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn unit_grid() -> HeightGrid {
        HeightGrid::new(1.0, 1.0, Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0))
            .expect("valid 3x3 grid")
    }

    fn fill(grid: &mut HeightGrid, height: impl Fn(usize, usize) -> f64) {
        for x in 0..grid.size_x() {
            for y in 0..grid.size_y() {
                grid.set_height(x, y, height(x, y))
                    .expect("index inside grid");
            }
        }
    }

    // Tests point counts use ceiling division so spacing is never exceeded
    // Verified by replacing ceil with floor
    #[test]
    fn test_new_derives_point_counts_from_spacing() {
        let grid = unit_grid();
        assert_eq!(grid.size_x(), 3);
        assert_eq!(grid.size_y(), 3);
        assert_eq!(grid.total_points(), 9);

        let uneven = HeightGrid::new(0.4, 2.0, Vector2::new(0.0, 0.0), Vector2::new(1.0, 5.0))
            .expect("valid grid");
        assert_eq!(uneven.size_x(), 4);
        assert_eq!(uneven.size_y(), 4);
        assert!(uneven.grid_x() <= 0.4);
        assert!(uneven.grid_y() <= 2.0);
    }

    // Tests reversed bounds are swapped per axis before storage
    // Verified by storing bounds unchanged
    #[test]
    fn test_new_normalizes_inverted_bounds() {
        let grid = HeightGrid::with_uniform_spacing(
            1.0,
            Vector2::new(5.0, 5.0),
            Vector2::new(0.0, 0.0),
        )
        .expect("valid grid");

        assert_eq!(grid.min(), Vector2::new(0.0, 0.0));
        assert_eq!(grid.max(), Vector2::new(5.0, 5.0));
        assert_eq!(grid.size_x(), 6);
        assert_eq!(grid.size_y(), 6);

        let mixed = HeightGrid::with_uniform_spacing(
            1.0,
            Vector2::new(0.0, 3.0),
            Vector2::new(2.0, -1.0),
        )
        .expect("valid grid");
        assert_eq!(mixed.min(), Vector2::new(0.0, -1.0));
        assert_eq!(mixed.max(), Vector2::new(2.0, 3.0));
    }

    // Tests zero-width and zero-height areas are rejected
    // Verified by removing the degenerate area check
    #[test]
    fn test_new_rejects_degenerate_area() {
        let flat_x = HeightGrid::new(1.0, 1.0, Vector2::new(1.0, 0.0), Vector2::new(1.0, 4.0));
        assert!(matches!(flat_x, Err(GridError::DegenerateArea { .. })));

        let flat_y = HeightGrid::new(1.0, 1.0, Vector2::new(0.0, 2.0), Vector2::new(4.0, 2.0));
        assert!(matches!(flat_y, Err(GridError::DegenerateArea { .. })));
    }

    // Tests explicit sizes below two points per axis are rejected
    // Verified by lowering the minimum to one point
    #[test]
    fn test_with_size_rejects_small_grid() {
        let result = HeightGrid::with_size(1, 3, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        assert!(matches!(
            result,
            Err(GridError::GridTooSmall {
                size_x: 1,
                size_y: 3
            })
        ));
    }

    // Tests invalid spacing and oversized grids are reported as parameter errors
    // Verified by removing spacing validation
    #[test]
    fn test_new_rejects_invalid_spacing() {
        let zero = HeightGrid::new(0.0, 1.0, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        assert!(matches!(
            zero,
            Err(GridError::InvalidParameter {
                parameter: "spacing_x",
                ..
            })
        ));

        let negative = HeightGrid::new(1.0, -1.0, Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        assert!(matches!(
            negative,
            Err(GridError::InvalidParameter {
                parameter: "spacing_y",
                ..
            })
        ));

        let huge = HeightGrid::with_size(
            MAX_GRID_DIMENSION + 1,
            2,
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
        );
        assert!(matches!(huge, Err(GridError::InvalidParameter { .. })));
    }

    // Tests pending points are listed with x as the outer loop
    // Verified by swapping loop order
    #[test]
    fn test_not_probed_starts_in_row_major_order() {
        let grid = HeightGrid::new(1.0, 1.0, Vector2::new(0.0, 0.0), Vector2::new(1.0, 2.0))
            .expect("valid 2x3 grid");

        assert_eq!(
            grid.not_probed(),
            &[(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
        assert_eq!(grid.next_unprobed(), Some((0, 0)));
        assert_eq!(grid.progress(), 0);
        assert!(grid.height_range().is_none());
        assert!(
            grid.points()
                .iter()
                .all(|point| *point == ProbePoint::NotProbed)
        );
    }

    // Tests corner indices map exactly onto the stored bounds
    // Verified by dividing by size instead of size - 1
    #[test]
    fn test_grid_to_world_maps_corners_to_bounds() {
        let grid = unit_grid();
        assert_eq!(grid.grid_to_world(0, 0), grid.min());
        assert_eq!(grid.grid_to_world(2, 2), grid.max());
        assert_eq!(grid.grid_to_world(1, 2), Vector2::new(1.0, 2.0));

        let odd = HeightGrid::new(0.3, 0.7, Vector2::new(-1.0, -2.0), Vector2::new(1.0, 2.5))
            .expect("valid grid");
        assert!(odd.grid_to_world(0, 0).approx_eq(odd.min(), 1e-12));
        assert!(
            odd.grid_to_world(odd.size_x() - 1, odd.size_y() - 1)
                .approx_eq(odd.max(), 1e-12)
        );
    }

    // Tests recording a height removes the point from the pending list
    // Verified by leaving the pending list untouched in set_height
    #[test]
    fn test_set_height_advances_progress() {
        let mut grid = unit_grid();

        grid.set_height(1, 2, 0.5).expect("index inside grid");
        assert_eq!(grid.progress(), 1);
        assert!(!grid.not_probed().contains(&(1, 2)));
        assert_eq!(grid.height(1, 2).ok(), Some(ProbePoint::Probed(0.5)));

        grid.set_height(1, 2, 0.75).expect("index inside grid");
        assert_eq!(grid.progress(), 1, "re-measuring must not count twice");
        assert_eq!(grid.height(1, 2).ok(), Some(ProbePoint::Probed(0.75)));

        fill(&mut grid, |_, _| 0.0);
        assert!(grid.is_complete());
        assert_eq!(grid.next_unprobed(), None);
    }

    // Tests remaining pending points keep their original order
    // Verified by using swap_remove instead of remove
    #[test]
    fn test_set_height_preserves_pending_order() {
        let mut grid = unit_grid();
        grid.set_height(0, 1, 1.0).expect("index inside grid");
        grid.set_height(2, 0, 1.0).expect("index inside grid");

        assert_eq!(
            grid.not_probed(),
            &[(0, 0), (0, 2), (1, 0), (1, 1), (1, 2), (2, 1), (2, 2)]
        );
    }

    // Tests out-of-range indices are rejected without mutating state
    // Verified by removing the bounds check
    #[test]
    fn test_set_height_rejects_out_of_range_index() {
        let mut grid = unit_grid();

        let result = grid.set_height(3, 0, 1.0);
        assert!(matches!(
            result,
            Err(GridError::IndexOutOfRange {
                x: 3,
                y: 0,
                size_x: 3,
                size_y: 3
            })
        ));
        assert!(grid.height_range().is_none());
        assert!(matches!(
            grid.height(0, 7),
            Err(GridError::IndexOutOfRange { .. })
        ));
    }

    // Tests non-finite heights are refused
    // Verified by removing the finiteness check
    #[test]
    fn test_set_height_rejects_non_finite_height() {
        let mut grid = unit_grid();
        assert!(grid.set_height(0, 0, f64::NAN).is_err());
        assert!(grid.set_height(0, 0, f64::INFINITY).is_err());
        assert_eq!(grid.progress(), 0);
    }

    // Tests the height range tracks the extremes of every recorded height
    // Verified by only updating the maximum
    #[test]
    fn test_height_range_tracks_extremes() {
        let mut grid = HeightGrid::new(1.0, 1.0, Vector2::new(0.0, 0.0), Vector2::new(9.0, 9.0))
            .expect("valid grid");
        let mut rng = StdRng::seed_from_u64(42);
        let mut expected_min = f64::INFINITY;
        let mut expected_max = f64::NEG_INFINITY;

        for _ in 0..200 {
            let x = rng.random_range(0..grid.size_x());
            let y = rng.random_range(0..grid.size_y());
            let height = rng.random_range(-5.0..5.0);
            expected_min = expected_min.min(height);
            expected_max = expected_max.max(height);
            grid.set_height(x, y, height).expect("index inside grid");
        }

        assert_eq!(
            grid.height_range(),
            Some(HeightRange {
                min: expected_min,
                max: expected_max
            })
        );
    }

    // Tests repeating a measurement leaves the range unchanged
    // Verified by resetting the range on each update
    #[test]
    fn test_repeated_height_is_idempotent() {
        let mut grid = unit_grid();
        grid.set_height(0, 0, -1.0).expect("index inside grid");
        grid.set_height(1, 1, 2.0).expect("index inside grid");
        let before = grid.height_range();

        grid.set_height(1, 1, 2.0).expect("index inside grid");
        assert_eq!(grid.height_range(), before);
        assert_eq!(grid.min_height(), Some(-1.0));
        assert_eq!(grid.max_height(), Some(2.0));
    }

    // Tests a flat probed surface interpolates to its height plus offset
    // Verified by dropping the z offset term
    #[test]
    fn test_interpolate_flat_surface_with_offset() {
        let mut grid = unit_grid();
        fill(&mut grid, |_, _| 0.0);

        let height = grid.interpolate_height(1.0, 1.0).expect("all points probed");
        assert!(height.abs() < f64::EPSILON);

        grid.set_z_offset(0.25);
        let offset = grid.interpolate_height(1.0, 1.0).expect("all points probed");
        assert!((offset - 0.25).abs() < f64::EPSILON);
        assert_eq!(grid.height(1, 1).ok(), Some(ProbePoint::Probed(0.0)));
    }

    // Tests the bilinear blend between four distinct corners
    // Verified by swapping tx and ty in the blend
    #[test]
    fn test_interpolate_blends_four_neighbors() {
        let mut grid = unit_grid();
        grid.set_height(0, 0, 0.0).expect("index inside grid");
        grid.set_height(1, 0, 1.0).expect("index inside grid");
        grid.set_height(0, 1, 2.0).expect("index inside grid");
        grid.set_height(1, 1, 3.0).expect("index inside grid");

        let center = grid.interpolate_height(0.5, 0.5).expect("neighbors probed");
        assert!((center - 1.5).abs() < 1e-12);

        let along_x = grid.interpolate_height(0.25, 0.0).expect("neighbors probed");
        assert!((along_x - 0.25).abs() < 1e-12);

        let along_y = grid.interpolate_height(0.0, 0.75).expect("neighbors probed");
        assert!((along_y - 1.5).abs() < 1e-12);
    }

    // Tests every probed point is reproduced exactly at its world position
    // Verified by blending with the wrong neighbor on exact grid points
    #[test]
    fn test_interpolate_reproduces_grid_points() {
        let mut grid = HeightGrid::new(0.5, 0.25, Vector2::new(-1.0, 0.0), Vector2::new(1.0, 1.0))
            .expect("valid grid");
        fill(&mut grid, |x, y| (x * 10 + y) as f64 * 0.125);
        grid.set_z_offset(-0.5);

        for x in 0..grid.size_x() {
            for y in 0..grid.size_y() {
                let position = grid.grid_to_world(x, y);
                let height = grid.interpolate_at(position).expect("all points probed");
                let expected = (x * 10 + y) as f64 * 0.125 - 0.5;
                assert!(
                    (height - expected).abs() < f64::EPSILON,
                    "point ({x}, {y}) gave {height}, expected {expected}"
                );
            }
        }
    }

    // Decimal bounds whose grid positions are not exact in binary
    const DECIMAL_GEOMETRIES: [(f64, f64, (f64, f64), (f64, f64)); 5] = [
        (0.1, 0.1, (0.1, 0.1), (0.7, 0.7)),
        (0.3, 0.7, (-1.1, 0.2), (1.3, 4.4)),
        (2.5, 1.7, (10.1, -3.3), (30.7, 9.9)),
        (7.3, 3.1, (1000.3, -250.7), (1200.9, -20.1)),
        (0.01, 0.03, (0.05, 0.15), (0.12, 0.45)),
    ];

    fn decimal_grid(geometry: (f64, f64, (f64, f64), (f64, f64))) -> HeightGrid {
        let (spacing_x, spacing_y, min, max) = geometry;
        HeightGrid::new(spacing_x, spacing_y, min.into(), max.into()).expect("valid grid")
    }

    // Tests a point's own world position reads back its exact height on
    // decimal bounds, plus the offset
    // Verified by removing the snap onto whole indices
    #[test]
    fn test_interpolate_reproduces_grid_points_on_decimal_bounds() {
        for geometry in DECIMAL_GEOMETRIES {
            let mut grid = decimal_grid(geometry);
            fill(&mut grid, |x, y| 0.1 * (x * 7 + y) as f64 + 0.3);
            grid.set_z_offset(0.1);

            for x in 0..grid.size_x() {
                for y in 0..grid.size_y() {
                    let expected = 0.1 * (x * 7 + y) as f64 + 0.3 + 0.1;
                    assert_eq!(
                        grid.interpolate_at(grid.grid_to_world(x, y)).ok(),
                        Some(expected),
                        "point ({x}, {y}) of {geometry:?}"
                    );
                }
            }
        }
    }

    // Tests a lone probed point can be read back while its neighbors are
    // still pending
    // Verified by removing the snap onto whole indices
    #[test]
    fn test_interpolate_single_probed_point_on_decimal_bounds() {
        for geometry in DECIMAL_GEOMETRIES {
            let template = decimal_grid(geometry);

            for x in 0..template.size_x() {
                for y in 0..template.size_y() {
                    let mut grid = decimal_grid(geometry);
                    grid.set_height(x, y, 0.7).expect("index inside grid");

                    assert_eq!(
                        grid.interpolate_at(grid.grid_to_world(x, y)).ok(),
                        Some(0.7),
                        "point ({x}, {y}) of {geometry:?}"
                    );
                }
            }
        }
    }

    // Tests the last index maps exactly onto the upper bound
    // Verified by accumulating min + index * spacing
    #[test]
    fn test_grid_to_world_hits_bounds_exactly_on_decimal_bounds() {
        for geometry in DECIMAL_GEOMETRIES {
            let grid = decimal_grid(geometry);
            let last = grid.grid_to_world(grid.size_x() - 1, grid.size_y() - 1);
            assert_eq!(grid.grid_to_world(0, 0), grid.min());
            assert_eq!(last, grid.max());
            assert!(grid.contains(last.x, last.y));
        }
    }

    // Tests queries on the upper edge stay inside the matrix
    // Verified by removing the clamp on fractional indices
    #[test]
    fn test_interpolate_on_upper_edge() {
        let mut grid = HeightGrid::new(0.1, 0.1, Vector2::new(0.0, 0.0), Vector2::new(0.3, 0.3))
            .expect("valid grid");
        fill(&mut grid, |_, _| 1.0);

        let height = grid.interpolate_height(0.3, 0.3).expect("edge inside bounds");
        assert!((height - 1.0).abs() < 1e-12);
    }

    // Tests positions outside the bounds return the highest recorded height
    // Verified by returning the lowest height instead
    #[test]
    fn test_interpolate_outside_bounds_returns_max_height() {
        let mut grid = unit_grid();
        fill(&mut grid, |x, y| (x + y) as f64);
        grid.set_z_offset(10.0);

        let outside = grid.interpolate_height(3.0, 3.0).expect("max height known");
        assert!((outside - 4.0).abs() < f64::EPSILON);

        let below = grid.interpolate_height(1.0, -0.001).expect("max height known");
        assert!((below - 4.0).abs() < f64::EPSILON);
    }

    // Tests out-of-bounds lookups on an empty grid report missing data
    // Verified by returning negative infinity
    #[test]
    fn test_interpolate_outside_bounds_without_data() {
        let grid = unit_grid();
        assert!(matches!(
            grid.interpolate_height(-1.0, 0.0),
            Err(GridError::NoHeightData)
        ));
    }

    // Tests a missing neighbor fails instead of degrading the estimate
    // Verified by treating unprobed points as zero
    #[test]
    fn test_interpolate_requires_probed_neighbors() {
        let mut grid = unit_grid();
        grid.set_height(0, 0, 1.0).expect("index inside grid");

        let result = grid.interpolate_height(0.5, 0.5);
        assert!(matches!(
            result,
            Err(GridError::UnprobedNeighbor { x: 1, y: 0 })
        ));

        let exact = grid.interpolate_height(0.0, 0.0).expect("single point probed");
        assert!((exact - 1.0).abs() < f64::EPSILON);
    }

    // Tests only cells with four probed corners are reported complete
    // Verified by checking three corners only
    #[test]
    fn test_complete_cells_requires_all_corners() {
        let mut grid = unit_grid();
        assert_eq!(grid.complete_cells().count(), 0);

        grid.set_height(0, 0, 0.0).expect("index inside grid");
        grid.set_height(1, 0, 0.0).expect("index inside grid");
        grid.set_height(0, 1, 0.0).expect("index inside grid");
        assert_eq!(grid.complete_cells().count(), 0);

        grid.set_height(1, 1, 0.0).expect("index inside grid");
        grid.set_height(2, 1, 0.0).expect("index inside grid");
        assert_eq!(grid.complete_cells().collect::<Vec<_>>(), vec![(0, 0)]);

        fill(&mut grid, |_, _| 0.0);
        assert_eq!(
            grid.complete_cells().collect::<Vec<_>>(),
            vec![(0, 0), (0, 1), (1, 0), (1, 1)]
        );
    }

    // Tests subscribers run once per update after the mutation is visible
    // Verified by publishing before updating the pending list
    #[test]
    fn test_subscribers_notified_after_each_update() {
        let mut grid = unit_grid();
        let received: Rc<RefCell<Vec<PointUpdate>>> = Rc::default();

        let sink = Rc::clone(&received);
        let id = grid.subscribe(move |update| sink.borrow_mut().push(*update));

        grid.set_height(2, 1, 0.5).expect("index inside grid");
        grid.set_height(0, 0, -0.5).expect("index inside grid");

        assert_eq!(
            *received.borrow(),
            vec![
                PointUpdate {
                    x: 2,
                    y: 1,
                    height: 0.5,
                    progress: 1,
                    total_points: 9
                },
                PointUpdate {
                    x: 0,
                    y: 0,
                    height: -0.5,
                    progress: 2,
                    total_points: 9
                },
            ]
        );

        assert!(grid.unsubscribe(id));
        grid.set_height(1, 1, 0.0).expect("index inside grid");
        assert_eq!(received.borrow().len(), 2);
        assert!(!grid.unsubscribe(id));
    }

    // Tests failed updates publish nothing
    // Verified by publishing before the bounds check
    #[test]
    fn test_failed_update_is_not_published() {
        let mut grid = unit_grid();
        let calls = Rc::new(RefCell::new(0_usize));

        let counter = Rc::clone(&calls);
        grid.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(grid.set_height(5, 5, 1.0).is_err());
        assert_eq!(*calls.borrow(), 0);
    }
}
