use std::f32::consts::PI;

use rayon::prelude::*;

use crate::entity::Rgb;
use crate::grid::Grid;
use crate::layout::CityMap;
use crate::rng::Rng;

pub const RAIN_SPECKLE: Rgb = [93, 226, 231];
pub const SNOW_SPECKLE: Rgb = [255, 255, 255];

/// Thermal colormap range (Celsius).
pub const THERMAL_MIN: f32 = 0.0;
pub const THERMAL_MAX: f32 = 100.0;

const PANEL_GAP: usize = 10;
const COLORBAR_W: usize = 12;
const BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// Day/night factor: -0.8 at noon, 1.0 at midnight.
#[inline]
pub fn brightness_factor(hour: usize) -> f32 {
    0.1 - 0.9 * ((2.0 * PI / 24.0) * (hour as f32 - 6.0)).sin()
}

/// Refresh every display colour for the given hour of day.
pub fn apply_daylight(map: &mut CityMap, hour: usize) {
    let factor = brightness_factor(hour);
    for block in &mut map.blocks {
        block.day_night(factor);
    }
}

#[inline]
fn put(rgba: &mut [u8], w: usize, x: usize, y: usize, c: Rgb) {
    let i = (y * w + x) * 4;
    rgba[i..i + 3].copy_from_slice(&c);
    rgba[i + 3] = 255;
}

/// Composite the visual map: block background first, then items in list order.
pub fn render_city(map: &CityMap) -> Vec<u8> {
    let w = map.width_px();
    let h = map.height_px();
    let mut rgba = vec![0u8; w * h * 4];

    for block in &map.blocks {
        let (bx, by) = block.topleft;
        for y in by..(by + block.size).min(h) {
            for x in bx..(bx + block.size).min(w) {
                put(&mut rgba, w, x, y, block.colour);
            }
        }
        for item in &block.items {
            let fp = item.footprint();
            let Some((x0, y0, x1, y1)) = fp.clip(block.size, block.size) else {
                continue;
            };
            for ly in y0..y1 {
                for lx in x0..x1 {
                    let dx = (lx as i32 - fp.x) as usize;
                    let dy = (ly as i32 - fp.y) as usize;
                    put(&mut rgba, w, bx + lx, by + ly, item.pixel(dx, dy));
                }
            }
        }
    }

    rgba
}

/// Replace each pixel with `colour` with probability `intensity`.
pub fn apply_speckle(rgba: &mut [u8], rng: &mut Rng, intensity: f32, colour: Rgb) {
    if intensity <= 0.0 {
        return;
    }
    for px in rgba.chunks_exact_mut(4) {
        if rng.chance(intensity) {
            px[..3].copy_from_slice(&colour);
        }
    }
}

/// Matplotlib-style "jet" ramp for t in [0, 1].
#[inline]
fn jet(t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let ch = |offset: f32| ((1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0) * 255.0).round() as u8;
    [ch(3.0), ch(2.0), ch(1.0), 255]
}

/// Render the thermal grid with a fixed 0..100 jet scale.
pub fn render_thermal(temp: &Grid<f32>) -> Vec<u8> {
    let w = temp.w;
    let h = temp.h;
    let mut rgba = vec![0u8; w * h * 4];
    let range = THERMAL_MAX - THERMAL_MIN;

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let t = (temp.get(x, y) - THERMAL_MIN) / range;
            row[x * 4..x * 4 + 4].copy_from_slice(&jet(t));
        }
    });

    rgba
}

/// Visual map and thermal map side by side, with a colorbar for the thermal scale.
/// Returns (rgba, width, height).
pub fn compose_panels(visual: &[u8], thermal: &[u8], w: usize, h: usize) -> (Vec<u8>, usize, usize) {
    let out_w = w * 2 + PANEL_GAP * 2 + COLORBAR_W;
    let mut out = vec![0u8; out_w * h * 4];
    for px in out.chunks_exact_mut(4) {
        px.copy_from_slice(&BACKGROUND);
    }

    let thermal_x = w + PANEL_GAP;
    let bar_x = thermal_x + w + PANEL_GAP;
    for y in 0..h {
        let src = y * w * 4;
        let dst = y * out_w * 4;
        out[dst..dst + w * 4].copy_from_slice(&visual[src..src + w * 4]);
        let tdst = dst + thermal_x * 4;
        out[tdst..tdst + w * 4].copy_from_slice(&thermal[src..src + w * 4]);

        // Hot at the top.
        let t = if h > 1 { 1.0 - y as f32 / (h - 1) as f32 } else { 1.0 };
        let c = jet(t);
        for x in bar_x..bar_x + COLORBAR_W {
            let i = dst + x * 4;
            out[i..i + 4].copy_from_slice(&c);
        }
    }

    (out, out_w, h)
}
