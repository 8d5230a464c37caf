use std::collections::BTreeMap;
use std::fmt::Write as _;

use glam::Vec3;
use tracing_subscriber::EnvFilter;
use valency::prelude::*;

/// Installs a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Renders a row-major grid, top row first. Annotated nodes show the first letter of
/// their pattern; others show `.`.
pub fn render_grid_annotations(width: usize, annotations: &NodeAnnotations) -> String {
    let height = annotations.len().div_ceil(width.max(1));
    let mut out = String::new();
    for y in (0..height).rev() {
        for x in 0..width {
            let c = annotations
                .pattern_name(y * width + x)
                .and_then(|name| name.chars().next())
                .unwrap_or('.');
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Renders placements onto the XY plane, one character per unit cell. Seeds show `*`;
/// other modules show the first letter of their name.
pub fn render_placements(outputs: &[PlacedOutput]) -> String {
    let mut cells: BTreeMap<(i32, i32), char> = BTreeMap::new();
    for row in outputs {
        let center = Vec3::from(row.transform.translation);
        let key = (center.x.round() as i32, center.y.round() as i32);
        let glyph = if row.parent.is_none() {
            '*'
        } else {
            row.module_name.chars().next().unwrap_or('?')
        };
        cells.insert(key, glyph);
    }

    let Some(min_x) = cells.keys().map(|k| k.0).min() else {
        return String::new();
    };
    let max_x = cells.keys().map(|k| k.0).max().unwrap_or(min_x);
    let min_y = cells.keys().map(|k| k.1).min().unwrap_or(0);
    let max_y = cells.keys().map(|k| k.1).max().unwrap_or(min_y);

    let mut out = String::new();
    for y in (min_y..=max_y).rev() {
        for x in min_x..=max_x {
            out.push(cells.get(&(x, y)).copied().unwrap_or(' '));
        }
        let _ = writeln!(out);
    }
    out
}
