pub mod chart;
pub mod config;
pub mod diffusion;
pub mod entity;
pub mod grid;
pub mod layout;
pub mod palette;
pub mod prompt;
pub mod render;
pub mod report;
pub mod rng;
pub mod sim;
pub mod thermal;
pub mod weather;

use std::time::Instant;

use anyhow::Result;

use config::Params;
use layout::CityMap;
use palette::Palette;
use rng::Rng;
use sim::{HourFrame, SimReport};

pub struct Run {
    pub map: CityMap,
    pub report: SimReport,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Build the map and run the whole simulation. All randomness comes from
/// `params.seed`.
pub fn simulate<F>(params: &Params, palette: &Palette, on_hour: F) -> Result<(Run, Vec<Timing>)>
where
    F: FnMut(&HourFrame) -> Result<()>,
{
    let mut timings = Vec::new();
    let total_start = Instant::now();
    let mut rng = Rng::new(params.seed);

    // 1. Layout
    let t = Instant::now();
    let mut map = layout::make_map(params, palette, &mut rng);
    timings.push(Timing {
        name: "layout",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Hour loop
    let t = Instant::now();
    let report = sim::run_simulation(&mut map, params, &mut rng, on_hour)?;
    timings.push(Timing {
        name: "simulation",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    Ok((Run { map, report }, timings))
}
