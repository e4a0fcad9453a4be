//! Summary charts drawn with imageproc onto RGBA images, labelled with an
//! embedded TrueType font.

use std::collections::BTreeMap;

use ab_glyph::{FontRef, PxScale};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::sim::SimReport;

const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

pub const CHART_W: u32 = 800;
pub const CHART_H: u32 = 450;
const BAR_CHART_W: u32 = 1200;
const BAR_CHART_H: u32 = 600;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TEXT: Rgba<u8> = Rgba([20, 20, 20, 255]);
const AXIS: Rgba<u8> = Rgba([30, 30, 30, 255]);
const GRID: Rgba<u8> = Rgba([225, 225, 225, 255]);
const LEGEND_EDGE: Rgba<u8> = Rgba([190, 190, 190, 255]);

const TITLE_PX: f32 = 18.0;
const LABEL_PX: f32 = 14.0;
const TICK_PX: f32 = 12.0;

const MARGIN_L: u32 = 72;
const MARGIN_R: u32 = 24;
const MARGIN_T: u32 = 40;
const MARGIN_B: u32 = 56;

const DASH_ON: f32 = 6.0;
const DASH_PERIOD: f32 = 12.0;
const LEGEND_SAMPLE: f32 = 24.0;
const LEGEND_ROW: u32 = 18;

pub const TIME_AXIS: &str = "Time (hours)";
pub const TEMP_AXIS: &str = "Temperature (°C)";

/// Matplotlib "tab10" cycle.
pub const CYCLE: [[u8; 4]; 10] = [
    [31, 119, 180, 255],
    [255, 127, 14, 255],
    [44, 160, 44, 255],
    [214, 39, 40, 255],
    [148, 103, 189, 255],
    [140, 86, 75, 255],
    [227, 119, 194, 255],
    [127, 127, 127, 255],
    [188, 189, 34, 255],
    [23, 190, 207, 255],
];

// Coolwarm stops
const COOL: [u8; 4] = [59, 76, 192, 255];
const NEUTRAL: [u8; 4] = [221, 221, 221, 255];
const WARM: [u8; 4] = [180, 4, 38, 255];

/// The font every chart is labelled with.
pub fn chart_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(FONT_BYTES).context("loading embedded chart font")
}

pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f32],
    pub colour: [u8; 4],
    pub dashed: bool,
}

/// Title and axis captions of one chart.
pub struct Axes<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
}

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

fn coolwarm(t: f32) -> [u8; 4] {
    if t < 0.5 {
        lerp_color(COOL, NEUTRAL, t * 2.0)
    } else {
        lerp_color(NEUTRAL, WARM, (t - 0.5) * 2.0)
    }
}

/// Filled rectangle from corner coordinates; empty spans draw nothing.
fn fill(img: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, c: Rgba<u8>) {
    let (w, h) = ((x1 - x0).round(), (y1 - y0).round());
    if w >= 1.0 && h >= 1.0 {
        let rect = Rect::at(x0.round() as i32, y0.round() as i32).of_size(w as u32, h as u32);
        draw_filled_rect_mut(img, rect, c);
    }
}

struct Canvas<'f> {
    img: RgbaImage,
    font: &'f FontRef<'static>,
}

impl<'f> Canvas<'f> {
    fn new(w: u32, h: u32, font: &'f FontRef<'static>) -> Self {
        Self {
            img: RgbaImage::from_pixel(w, h, WHITE),
            font,
        }
    }

    /// Plot area as (x0, y0, x1, y1).
    fn plot_area(&self) -> (f32, f32, f32, f32) {
        (
            MARGIN_L as f32,
            MARGIN_T as f32,
            (self.img.width() - MARGIN_R) as f32,
            (self.img.height() - MARGIN_B) as f32,
        )
    }

    fn text_width(&self, px: f32, s: &str) -> f32 {
        text_size(PxScale::from(px), self.font, s).0 as f32
    }

    fn text(&mut self, x: f32, y: f32, px: f32, s: &str) {
        draw_text_mut(
            &mut self.img,
            TEXT,
            x.round() as i32,
            y.round() as i32,
            PxScale::from(px),
            self.font,
            s,
        );
    }

    fn text_centered(&mut self, cx: f32, y: f32, px: f32, s: &str) {
        let w = self.text_width(px, s);
        self.text(cx - w / 2.0, y, px, s);
    }

    /// Text reading bottom to top, centred on `(cx, cy)`.
    fn text_vertical(&mut self, cx: f32, cy: f32, px: f32, s: &str) {
        let w = self.text_width(px, s) as u32 + 2;
        let h = (px * 1.4).ceil() as u32;
        let mut strip = RgbaImage::from_pixel(w, h, WHITE);
        draw_text_mut(&mut strip, TEXT, 1, 0, PxScale::from(px), self.font, s);
        let rotated = imageops::rotate270(&strip);
        let x = (cx - rotated.width() as f32 / 2.0).round() as i64;
        let y = (cy - rotated.height() as f32 / 2.0).round() as i64;
        imageops::replace(&mut self.img, &rotated, x, y);
    }

    /// Two pixels thick so series stand out against the grid.
    fn stroke(&mut self, a: (f32, f32), b: (f32, f32), c: Rgba<u8>) {
        draw_line_segment_mut(&mut self.img, a, b, c);
        draw_line_segment_mut(&mut self.img, (a.0, a.1 + 1.0), (b.0, b.1 + 1.0), c);
    }

    /// `phase` carries the dash position across segments so dashes continue
    /// through polyline joints.
    fn dashed(&mut self, a: (f32, f32), b: (f32, f32), c: Rgba<u8>, phase: &mut f32) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt();
        let at = |s: f32| (a.0 + dx * s / len, a.1 + dy * s / len);
        let mut t = 0.0;
        while t < len {
            let in_period = *phase % DASH_PERIOD;
            let on = in_period < DASH_ON;
            let left = if on { DASH_ON - in_period } else { DASH_PERIOD - in_period };
            let step = left.min(len - t);
            if on {
                self.stroke(at(t), at(t + step), c);
            }
            t += step;
            *phase += step;
        }
    }

    /// Grid, axes, tick labels, title and axis captions. `y_ticks` and
    /// `x_ticks` pair a label with its pixel coordinate.
    fn decorate(&mut self, axes: &Axes, y_ticks: &[(String, f32)], x_ticks: &[(String, f32)]) {
        let (x0, y0, x1, y1) = self.plot_area();
        for (label, y) in y_ticks {
            draw_line_segment_mut(&mut self.img, (x0, *y), (x1, *y), GRID);
            draw_line_segment_mut(&mut self.img, (x0 - 4.0, *y), (x0, *y), AXIS);
            let w = self.text_width(TICK_PX, label);
            self.text(x0 - 8.0 - w, y - TICK_PX * 0.6, TICK_PX, label);
        }
        for (label, x) in x_ticks {
            draw_line_segment_mut(&mut self.img, (*x, y0), (*x, y1), GRID);
            draw_line_segment_mut(&mut self.img, (*x, y1), (*x, y1 + 4.0), AXIS);
            self.text_centered(*x, y1 + 6.0, TICK_PX, label);
        }
        draw_line_segment_mut(&mut self.img, (x0, y1), (x1, y1), AXIS);
        draw_line_segment_mut(&mut self.img, (x0, y0), (x0, y1), AXIS);

        let (w, h) = (self.img.width() as f32, self.img.height() as f32);
        self.text_centered(w / 2.0, 10.0, TITLE_PX, axes.title);
        self.text_centered((x0 + x1) / 2.0, h - LABEL_PX - 10.0, LABEL_PX, axes.x_label);
        self.text_vertical(LABEL_PX, (y0 + y1) / 2.0, LABEL_PX, axes.y_label);
    }

    /// Boxed legend in the top-right corner of the plot area.
    fn legend(&mut self, entries: &[(&str, Rgba<u8>, bool)]) {
        if entries.is_empty() {
            return;
        }
        let (_, y0, x1, _) = self.plot_area();
        let text_w = entries
            .iter()
            .map(|(label, _, _)| self.text_width(TICK_PX, label))
            .fold(0.0, f32::max);
        let box_w = 8.0 + LEGEND_SAMPLE + 6.0 + text_w + 8.0;
        let box_h = (entries.len() as u32 * LEGEND_ROW + 8) as f32;
        let (bx, by) = (x1 - box_w - 8.0, y0 + 8.0);
        fill(&mut self.img, bx, by, bx + box_w, by + box_h, WHITE);
        let edge = Rect::at(bx.round() as i32, by.round() as i32)
            .of_size(box_w.round() as u32, box_h.round() as u32);
        draw_hollow_rect_mut(&mut self.img, edge, LEGEND_EDGE);

        for (i, &(label, colour, dashed)) in entries.iter().enumerate() {
            let row_y = by + 4.0 + (i as u32 * LEGEND_ROW) as f32;
            let mid = row_y + LEGEND_ROW as f32 / 2.0;
            let (a, b) = ((bx + 8.0, mid), (bx + 8.0 + LEGEND_SAMPLE, mid));
            if dashed {
                self.dashed(a, b, colour, &mut 0.0);
            } else {
                self.stroke(a, b, colour);
            }
            self.text(bx + 8.0 + LEGEND_SAMPLE + 6.0, mid - TICK_PX * 0.6, TICK_PX, label);
        }
    }
}

fn value_range<'a>(values: impl Iterator<Item = &'a f32>) -> Option<(f32, f32)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        None
    } else if hi - lo < 1e-3 {
        Some((lo - 1.0, hi + 1.0))
    } else {
        let pad = (hi - lo) * 0.05;
        Some((lo - pad, hi + pad))
    }
}

/// Five labelled ticks spanning `lo..hi`, mapped onto the plot's y range.
fn value_ticks(lo: f32, hi: f32, y0: f32, y1: f32) -> Vec<(String, f32)> {
    const N: usize = 5;
    (0..=N)
        .map(|i| {
            let t = i as f32 / N as f32;
            let v = lo + (hi - lo) * t;
            let label = if hi - lo < 5.0 { format!("{v:.1}") } else { format!("{v:.0}") };
            (label, y1 - t * (y1 - y0))
        })
        .collect()
}

/// Multi-series line chart over sample index (hours), with a tick per day
/// (every six hours for single-day runs) and a named legend.
pub fn line_chart(font: &FontRef<'static>, axes: &Axes, series: &[Series], w: u32, h: u32) -> RgbaImage {
    let mut canvas = Canvas::new(w, h, font);
    let (x0, y0, x1, y1) = canvas.plot_area();
    let len = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let to_x = |i: usize| {
        let tx = if len > 1 { i as f32 / (len - 1) as f32 } else { 0.5 };
        x0 + tx * (x1 - x0)
    };

    let Some((lo, hi)) = value_range(series.iter().flat_map(|s| s.values.iter())) else {
        canvas.decorate(axes, &[], &[]);
        return canvas.img;
    };
    let step = if len > 24 { 24 } else { 6 };
    let x_ticks: Vec<(String, f32)> = (0..len).step_by(step).map(|i| (i.to_string(), to_x(i))).collect();
    canvas.decorate(axes, &value_ticks(lo, hi, y0, y1), &x_ticks);

    let to_px = |i: usize, v: f32| (to_x(i), y1 - (v - lo) / (hi - lo) * (y1 - y0));
    for s in series {
        let colour = Rgba(s.colour);
        let pts: Vec<(f32, f32)> = s.values.iter().enumerate().map(|(i, &v)| to_px(i, v)).collect();
        let mut phase = 0.0;
        match pts.as_slice() {
            [] => {}
            [p] => canvas.stroke(*p, *p, colour),
            _ => {
                for pair in pts.windows(2) {
                    if s.dashed {
                        canvas.dashed(pair[0], pair[1], colour, &mut phase);
                    } else {
                        canvas.stroke(pair[0], pair[1], colour);
                    }
                }
            }
        }
    }

    let entries: Vec<(&str, Rgba<u8>, bool)> =
        series.iter().map(|s| (s.label, Rgba(s.colour), s.dashed)).collect();
    canvas.legend(&entries);
    canvas.img
}

/// Bars sorted ascending, coloured cool to warm, each named underneath.
/// The y-axis spans min-5..max+5.
pub fn bar_chart(font: &FontRef<'static>, axes: &Axes, bars: &[(&str, f32)], w: u32, h: u32) -> RgbaImage {
    let mut canvas = Canvas::new(w, h, font);
    if bars.is_empty() {
        canvas.decorate(axes, &[], &[]);
        return canvas.img;
    }

    let sorted = bar_order(bars);
    let lo = sorted[0].1 - 5.0;
    let hi = sorted[sorted.len() - 1].1 + 5.0;

    let (x0, y0, x1, y1) = canvas.plot_area();
    let slot = (x1 - x0) / sorted.len() as f32;
    let bar_w = (slot * 0.7).max(1.0);
    let centre = |i: usize| x0 + slot * (i as f32 + 0.5);

    // Names sit where x tick labels go; no tick marks or grid lines for bars.
    canvas.decorate(axes, &value_ticks(lo, hi, y0, y1), &[]);
    for (i, &(name, v)) in sorted.iter().enumerate() {
        let t = if sorted.len() > 1 { i as f32 / (sorted.len() - 1) as f32 } else { 0.5 };
        let top = (y1 - (v - lo) / (hi - lo) * (y1 - y0)).clamp(y0, y1);
        let cx = centre(i);
        fill(&mut canvas.img, cx - bar_w / 2.0, top, cx + bar_w / 2.0, y1, Rgba(coolwarm(t)));
        canvas.text_centered(cx, y1 + 6.0, TICK_PX, name);
    }
    canvas.img
}

/// Bars in the order `bar_chart` draws them.
pub fn bar_order<'a>(bars: &[(&'a str, f32)]) -> Vec<(&'a str, f32)> {
    let mut out = bars.to_vec();
    out.sort_by(|a, b| a.1.total_cmp(&b.1));
    out
}

/// One finished chart image.
pub struct Chart {
    pub name: &'static str,
    pub rgba: Vec<u8>,
    pub w: usize,
    pub h: usize,
    /// Series or bar labels in drawing order.
    pub labels: Vec<String>,
}

impl Chart {
    fn from_image(name: &'static str, img: RgbaImage, labels: Vec<String>) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        Self {
            name,
            rgba: img.into_raw(),
            w,
            h,
            labels,
        }
    }
}

fn history_chart<K>(
    font: &FontRef<'static>,
    name: &'static str,
    title: &str,
    history: &BTreeMap<K, Vec<f32>>,
    kind_name: impl Fn(&K) -> &'static str,
) -> Chart {
    let labels: Vec<String> = history.keys().map(|k| format!("{} Temperature", kind_name(k))).collect();
    let series: Vec<Series> = history
        .values()
        .zip(&labels)
        .enumerate()
        .map(|(i, (v, label))| Series {
            label,
            values: v,
            colour: CYCLE[i % CYCLE.len()],
            dashed: false,
        })
        .collect();
    let axes = Axes {
        title,
        x_label: TIME_AXIS,
        y_label: TEMP_AXIS,
    };
    let img = line_chart(font, &axes, &series, CHART_W, CHART_H);
    Chart::from_image(name, img, labels)
}

/// The four post-run charts: real vs depicted, block kinds, item kinds, and
/// run-wide averages.
pub fn summary_charts(report: &SimReport, font: &FontRef<'static>) -> Vec<Chart> {
    let temps = [
        Series {
            label: "Real Temperature",
            values: &report.real,
            colour: [0, 0, 255, 255],
            dashed: false,
        },
        Series {
            label: "Depicted Temperature",
            values: &report.depicted,
            colour: [255, 0, 0, 255],
            dashed: true,
        },
    ];
    let axes = Axes {
        title: "Real vs Depicted Temperature Over Time",
        x_label: TIME_AXIS,
        y_label: TEMP_AXIS,
    };
    let real_vs_depicted = Chart::from_image(
        "real_vs_depicted",
        line_chart(font, &axes, &temps, CHART_W, CHART_H),
        temps.iter().map(|s| s.label.to_string()).collect(),
    );

    let averages = report.averages();
    let axes = Axes {
        title: "Average Temperature of Blocks and Items",
        x_label: "Block/Item Type",
        y_label: TEMP_AXIS,
    };
    let averages = Chart::from_image(
        "average_temperatures",
        bar_chart(font, &axes, &averages, BAR_CHART_W, BAR_CHART_H),
        bar_order(&averages).iter().map(|(n, _)| n.to_string()).collect(),
    );

    vec![
        real_vs_depicted,
        history_chart(
            font,
            "block_temperatures",
            "Block Types Temperature Over Time",
            &report.block_history,
            |k| k.name(),
        ),
        history_chart(
            font,
            "item_temperatures",
            "Item Types Temperature Over Time",
            &report.item_history,
            |k| k.name(),
        ),
        averages,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BlockKind;

    const PLAIN: Axes<'static> = Axes {
        title: "",
        x_label: "",
        y_label: "",
    };

    fn font() -> FontRef<'static> {
        chart_font().unwrap()
    }

    fn is_ink(p: &Rgba<u8>) -> bool {
        p.0[..3].iter().all(|&c| c < 96)
    }

    /// Text-coloured pixels inside `x0..x1 × y0..y1`.
    fn ink(img: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| is_ink(img.get_pixel(x, y)))
            .count()
    }

    fn sample_report() -> SimReport {
        let mut report = SimReport {
            real: vec![20.0, 25.0, 30.0],
            depicted: vec![40.0, 45.0, 41.0],
            ..SimReport::default()
        };
        report.block_history.insert(BlockKind::Water, vec![50.0, 51.0, 52.0]);
        report.block_history.insert(BlockKind::Ground, vec![60.0, 61.0, 62.0]);
        report
    }

    #[test]
    fn line_chart_draws_series_colour() {
        let values = [0.0, 10.0, 5.0, 10.0];
        let series = [Series { label: "a", values: &values, colour: CYCLE[3], dashed: false }];
        let img = line_chart(&font(), &PLAIN, &series, 300, 200);
        assert_eq!((img.width(), img.height()), (300, 200));
        let hits = img.pixels().filter(|p| p.0 == CYCLE[3]).count();
        assert!(hits > 50);
    }

    #[test]
    fn dashed_series_has_gaps() {
        let values = [5.0, 5.0, 5.0];
        let count = |dashed| {
            let series = [Series { label: "", values: &values, colour: CYCLE[1], dashed }];
            let img = line_chart(&font(), &PLAIN, &series, 400, 200);
            img.pixels().filter(|p| p.0 == CYCLE[1]).count()
        };
        assert!(count(true) < count(false));
    }

    #[test]
    fn empty_inputs_give_blank_axes() {
        let font = font();
        let img = line_chart(&font, &PLAIN, &[], 200, 160);
        assert_eq!(*img.get_pixel(MARGIN_L, 160 - MARGIN_B), AXIS);
        let img = bar_chart(&font, &PLAIN, &[], 200, 160);
        assert_eq!(*img.get_pixel(MARGIN_L, 160 - MARGIN_B), AXIS);
    }

    #[test]
    fn titles_and_axis_labels_are_drawn() {
        let font = font();
        let values = [20.0, 30.0, 25.0];
        let series = [Series { label: "", values: &values, colour: CYCLE[0], dashed: false }];
        let axes = Axes {
            title: "Real vs Depicted Temperature Over Time",
            x_label: TIME_AXIS,
            y_label: TEMP_AXIS,
        };
        let (w, h) = (CHART_W, CHART_H);
        let labelled = line_chart(&font, &axes, &series, w, h);
        let plain = line_chart(&font, &PLAIN, &series, w, h);

        // Title band above the plot, right of the y tick labels.
        assert!(ink(&labelled, MARGIN_L + 1, 0, w, MARGIN_T) > 30);
        assert_eq!(ink(&plain, MARGIN_L + 1, 0, w, MARGIN_T), 0);
        // X caption below the tick labels.
        assert!(ink(&labelled, MARGIN_L, h - 24, w, h) > 20);
        assert_eq!(ink(&plain, MARGIN_L, h - 24, w, h), 0);
        // Rotated y caption left of the tick labels.
        assert!(ink(&labelled, 0, MARGIN_T, 24, h - MARGIN_B) > 20);
        assert_eq!(ink(&plain, 0, MARGIN_T, 24, h - MARGIN_B), 0);
    }

    #[test]
    fn legend_names_are_drawn() {
        let font = font();
        let values = [20.0, 30.0, 25.0];
        let named = [Series { label: "Real Temperature", values: &values, colour: CYCLE[0], dashed: false }];
        let unnamed = [Series { label: "", values: &values, colour: CYCLE[0], dashed: false }];
        let a = line_chart(&font, &PLAIN, &named, CHART_W, CHART_H);
        let b = line_chart(&font, &PLAIN, &unnamed, CHART_W, CHART_H);
        let plot = (MARGIN_L + 1, MARGIN_T + 1, CHART_W - MARGIN_R, CHART_H - MARGIN_B);
        assert!(ink(&a, plot.0, plot.1, plot.2, plot.3) > ink(&b, plot.0, plot.1, plot.2, plot.3) + 20);
    }

    #[test]
    fn bar_names_are_drawn_under_the_axis() {
        let font = font();
        let y1 = 300 - MARGIN_B;
        let named = bar_chart(&font, &PLAIN, &[("Water", 40.0), ("Road", 60.0)], 400, 300);
        let unnamed = bar_chart(&font, &PLAIN, &[("", 40.0), ("", 60.0)], 400, 300);
        assert!(ink(&named, MARGIN_L + 1, y1 + 2, 400, y1 + 24) > 20);
        assert_eq!(ink(&unnamed, MARGIN_L + 1, y1 + 2, 400, y1 + 24), 0);
    }

    #[test]
    fn summary_has_four_charts() {
        let charts = summary_charts(&sample_report(), &font());
        let names: Vec<_> = charts.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["real_vs_depicted", "block_temperatures", "item_temperatures", "average_temperatures"]
        );
        for c in &charts {
            assert_eq!(c.rgba.len(), c.w * c.h * 4);
        }
        assert_eq!(charts[1].labels, ["Ground Temperature", "Water Temperature"]);
        assert_eq!(charts[3].labels, ["Water", "Ground"]);
        assert_eq!((charts[3].w, charts[3].h), (BAR_CHART_W as usize, BAR_CHART_H as usize));
    }

    #[test]
    fn bars_sorted_ascending() {
        let order = bar_order(&[("b", 3.0), ("a", 1.0), ("c", 2.0)]);
        let names: Vec<_> = order.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["a", "c", "b"]);
        let img = bar_chart(&font(), &PLAIN, &[("b", 3.0), ("a", 1.0), ("c", 2.0)], 300, 200);
        assert!(img.pixels().any(|p| p.0 == COOL));
        assert!(img.pixels().any(|p| p.0 == WARM));
    }
}
