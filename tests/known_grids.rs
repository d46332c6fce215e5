use std::sync::atomic::AtomicBool;

use mandelbrot_image::{
    colour::{self, ColourMap, Transform},
    generate, generate_cancellable, Complex, Error, IterationBudget, Size, Viewport,
};

fn rows(grid: &mandelbrot_image::SampleGrid) -> Vec<Vec<u32>> {
    grid.rows().map(<[u32]>::to_vec).collect()
}

#[test]
fn three_by_three_unit_grid() {
    // Row j samples imaginary part j - 1, column i samples real part i - 1.
    //   row 0: -1-i escapes at 2, -i cycles, 1-i escapes at 1
    //   row 1: -1 cycles, 0 is fixed, 1 escapes at 2 (z_2 = 2 is not outside)
    //   row 2: mirror of row 0
    let grid = generate(Complex::ZERO, 10, 3, 3, 1.0).unwrap();
    assert_eq!(rows(&grid), vec![vec![2, 9, 1], vec![9, 9, 2], vec![2, 9, 1]]);
}

#[test]
fn even_grid_is_offset_towards_negative_side() {
    let grid = generate(Complex::ZERO, 10, 2, 2, 1.0).unwrap();
    // Samples: -1-i, -i / -1, 0.
    assert_eq!(rows(&grid), vec![vec![2, 9], vec![9, 9]]);
}

#[test]
fn zero_budget_and_zero_width_are_rejected() {
    assert!(matches!(
        generate(Complex::ZERO, 0, 3, 3, 1.0),
        Err(Error::InvalidArgument {
            parameter: "max_iter",
            ..
        })
    ));
    assert!(matches!(
        generate(Complex::ZERO, 10, 0, 3, 1.0),
        Err(Error::InvalidArgument {
            parameter: "width",
            ..
        })
    ));
}

#[test]
fn seahorse_valley_view_extent() {
    let size = Size::new(1080, 1080);
    let viewport =
        Viewport::fit_extent(Complex::new(-1.1195, 0.2718), size, Complex::new(0.005, 0.005))
            .unwrap();
    let extent = viewport.plane_extent();
    let span = 1080.0 * viewport.scale();
    assert!((span - 0.00375).abs() < 1e-15);
    assert!((extent.z2.real - extent.z1.real - span).abs() < 1e-15);
    assert!((extent.z2.imaginary - extent.z1.imaginary - span).abs() < 1e-15);
    assert!(extent.z1.real < -1.1195 && extent.z2.real > -1.1195);
    assert!(extent.z1.imaginary < 0.2718 && extent.z2.imaginary > 0.2718);
}

#[test]
fn cancelled_before_start_returns_no_grid() {
    let viewport = Viewport::new(Complex::ZERO, Size::new(16, 16), 0.25).unwrap();
    let budget = IterationBudget::new(100).unwrap();
    let cancel = AtomicBool::new(true);
    assert_eq!(
        generate_cancellable(&viewport, budget, &cancel),
        Err(Error::Cancelled)
    );
}

#[test]
fn uncancelled_generation_completes() {
    let viewport = Viewport::new(Complex::new(-0.5, 0.0), Size::new(16, 9), 0.25).unwrap();
    let budget = IterationBudget::new(100).unwrap();
    let cancel = AtomicBool::new(false);
    let grid = generate_cancellable(&viewport, budget, &cancel).unwrap();
    assert_eq!(grid, mandelbrot_image::generate_viewport(&viewport, budget));
}

#[test]
fn rendering_puts_first_grid_row_at_the_bottom() {
    let grid = generate(Complex::ZERO, 10, 3, 3, 1.0).unwrap();
    let rendering = colour::render(&grid, Transform::Linear, ColourMap::Gray);
    assert_eq!(rendering.size, Size::new(3, 3));
    // Bottom-right image pixel is grid cell (0, 2), which escaped at 1.
    assert_eq!(rendering.levels[8], 0.0);
    // Bottom-left is (0, 0), which escaped at 2.
    assert_eq!(rendering.levels[6], 1.0 / 8.0);
}
