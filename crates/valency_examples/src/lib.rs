#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, render_grid_annotations, render_placements};
