use rayon::prelude::*;

use crate::entity::Block;
use crate::grid::{Grid, neighbors4};
use crate::layout::CityMap;

/// Temperature grid of one block: block heat everywhere, item heat over each
/// item's footprint (later items overwrite earlier ones).
pub fn block_grid(block: &Block) -> Grid<f32> {
    let mut grid = Grid::filled(block.size, block.size, block.heat);
    for item in &block.items {
        grid.fill_rect(item.footprint(), item.heat);
    }
    grid
}

/// One Jacobi pass: every cell moves `rate` of the way toward the mean of its
/// in-bounds 4-neighbors. Reads `src`, writes `dst`.
pub fn diffuse_step(src: &Grid<f32>, dst: &mut Grid<f32>, rate: f32) {
    let (w, h) = (src.w, src.h);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            let mut n = 0u32;
            for (nx, ny) in neighbors4(x, y, w, h) {
                sum += src.get(nx, ny);
                n += 1;
            }
            let cur = src.get(x, y);
            let next = if n > 0 {
                cur + rate * (sum / n as f32 - cur)
            } else {
                cur
            };
            dst.set(x, y, next);
        }
    }
}

pub fn diffuse(grid: &mut Grid<f32>, rate: f32, iterations: usize) {
    let mut scratch = grid.clone();
    for _ in 0..iterations {
        diffuse_step(grid, &mut scratch, rate);
        std::mem::swap(grid, &mut scratch);
    }
}

/// Diffuse inside one block and write the footprint means back.
pub fn diffuse_block(block: &mut Block, rate: f32, iterations: usize) {
    let mut grid = block_grid(block);
    diffuse(&mut grid, rate, iterations);
    for item in &mut block.items {
        if let Some(mean) = grid.rect_mean(item.footprint()) {
            item.heat = mean;
        }
    }
    block.heat = grid.mean();
}

/// Per-block diffusion over the whole map. Blocks do not exchange heat.
pub fn heat_diffusion(map: &mut CityMap, rate: f32, iterations: usize) {
    map.blocks
        .par_iter_mut()
        .for_each(|block| diffuse_block(block, rate, iterations));
}
