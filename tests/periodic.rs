use mesh_tesselate::prelude::*;

#[test]
fn planar_grid_with_poles_fixture() {
    // 3 latitude rows x 4 longitude columns, wrap + both poles.
    let b = PeriodicMeshBuilder::new(&[3, 4], true).unwrap();
    assert_eq!(b.num_regular_nodes(), 12);
    assert_eq!(b.num_pole_nodes(), 2);
    assert_eq!(b.num_nodes(), 14);

    let elements = b.build().unwrap();
    // 6 interior + 2 seam + 4 south caps + 4 north caps.
    assert_eq!(elements.num_cells(), 16);
    assert!(elements.indices().iter().all(|&i| i < b.num_nodes()));
}

#[test]
fn planar_grid_without_poles() {
    let b = PeriodicMeshBuilder::new(&[3, 4], false).unwrap();
    assert_eq!(b.num_pole_nodes(), 0);
    let elements = b.build().unwrap();
    // 6 interior + 2 seam, no caps.
    assert_eq!(elements.num_cells(), 8);
}

#[test]
fn every_column_is_stitched_across_the_seam() {
    let b = PeriodicMeshBuilder::new(&[4, 5], false).unwrap();
    let elements = b.build().unwrap();
    // Seam quads join the last column back to the first: one per row pair.
    // Node layout is row-fastest, so the column of a node is index / rows.
    let (rows, cols) = (4, 5);
    let seam: Vec<&[usize]> = elements
        .cells()
        .filter(|c| {
            c.iter().any(|&i| i / rows == 0) && c.iter().any(|&i| i / rows == cols - 1)
        })
        .collect();
    assert_eq!(seam.len(), rows - 1);
}

#[test]
fn volumetric_grid_with_poles() {
    // 5 vertical layers over a 3x4 planar grid.
    let b = PeriodicMeshBuilder::new(&[3, 4, 5], true).unwrap();
    assert_eq!(b.num_regular_nodes(), 60);
    assert_eq!(b.num_pole_nodes(), 10);
    assert_eq!(b.num_nodes(), 70);

    let elements = b.build().unwrap();
    assert_eq!(elements.nodes_per_cell(), 8);
    // Per layer pair: 6 interior + 2 seam + 4 + 4 caps = 16, times 4 pairs.
    assert_eq!(elements.num_cells(), 64);
    assert!(elements.indices().iter().all(|&i| i < b.num_nodes()));
}

#[test]
fn degenerate_shapes_are_rejected() {
    assert!(PeriodicMeshBuilder::new(&[4], true).is_err());
    assert!(PeriodicMeshBuilder::new(&[1, 4], true).is_err());
    assert!(PeriodicMeshBuilder::new(&[3, 4, 5, 6], true).is_err());
}
