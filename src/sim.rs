use std::collections::BTreeMap;
use std::f32::consts::PI;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::config::{Params, Weather};
use crate::diffusion::heat_diffusion;
use crate::entity::{BlockKind, Cover, ItemKind};
use crate::layout::CityMap;
use crate::render::{self, RAIN_SPECKLE, SNOW_SPECKLE};
use crate::rng::Rng;
use crate::thermal::generate_thermal;
use crate::weather::{self, WeatherState};

/// Snow cooling applied before rendering, per unit of progress.
const SNOW_DROP_BEFORE: f32 = 5.0;
/// Snow cooling applied after sampling, per unit of progress.
const SNOW_DROP_AFTER: f32 = 30.0;

const REAL_FLOOD_COOLING: f32 = 10.0;
const REAL_SNOW_COOLING: f32 = 50.0;

/// Everything produced for one simulated hour, handed to the frame sink.
pub struct HourFrame<'a> {
    pub hour: usize,
    pub day: usize,
    pub hour_of_day: usize,
    pub weather: WeatherState,
    pub w: usize,
    pub h: usize,
    pub visual: &'a [u8],
    pub thermal: &'a [u8],
    pub real: f32,
    pub depicted: f32,
}

/// Time series collected over a run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimReport {
    pub real: Vec<f32>,
    pub depicted: Vec<f32>,
    pub block_history: BTreeMap<BlockKind, Vec<f32>>,
    pub item_history: BTreeMap<ItemKind, Vec<f32>>,
}

/// Base "real" air temperature for an hour of day, before weather.
pub fn base_real_temperature(hour_of_day: usize) -> f32 {
    30.0 + 10.0 * ((2.0 * PI / 24.0) * (hour_of_day as f32 - 6.0)).sin()
}

pub fn real_temperature(hour_of_day: usize, weather: Weather, state: WeatherState) -> f32 {
    let base = base_real_temperature(hour_of_day);
    match weather {
        Weather::Normal => base,
        Weather::Rain { .. } => base - REAL_FLOOD_COOLING * state.progress,
        Weather::Snow => base - REAL_SNOW_COOLING * state.progress,
    }
}

fn mean(v: &[f32]) -> f32 {
    v.iter().sum::<f32>() / v.len() as f32
}

/// Run `params.num_days` days hour by hour, mutating `map` in place.
/// `on_hour` sees each rendered frame; an error from it stops the run.
pub fn run_simulation<F>(
    map: &mut CityMap,
    params: &Params,
    rng: &mut Rng,
    mut on_hour: F,
) -> Result<SimReport>
where
    F: FnMut(&HourFrame) -> Result<()>,
{
    let total_hours = params.total_hours();
    let mut report = SimReport::default();
    let cover = match params.weather {
        Weather::Normal => None,
        Weather::Rain { .. } => Some(Cover::Flood),
        Weather::Snow => Some(Cover::Snow),
    };

    for hour in 0..total_hours {
        let day = hour / 24;
        let hour_of_day = hour % 24;

        heat_diffusion(map, params.diffusion_rate, params.diffusion_iterations);
        let state = weather::state_for(params.weather, hour, total_hours);

        if params.weather == Weather::Snow {
            weather::simulate_snow(map, SNOW_DROP_BEFORE * state.progress);
        }
        if let Some(cover) = cover {
            weather::apply_covers(map, cover, state.progress);
        }

        render::apply_daylight(map, hour_of_day);
        let mut visual = render::render_city(map);
        match params.weather {
            Weather::Rain { .. } => {
                render::apply_speckle(&mut visual, rng, state.intensity, RAIN_SPECKLE)
            }
            Weather::Snow => render::apply_speckle(&mut visual, rng, state.intensity, SNOW_SPECKLE),
            Weather::Normal => {}
        }

        let flood_level = match params.weather {
            Weather::Rain { .. } => state.progress,
            _ => 0.0,
        };
        let field = generate_thermal(map, hour_of_day, flood_level);
        let thermal = render::render_thermal(&field.grid);

        let real = real_temperature(hour_of_day, params.weather, state);
        let depicted = field.depicted();

        on_hour(&HourFrame {
            hour,
            day,
            hour_of_day,
            weather: state,
            w: map.width_px(),
            h: map.height_px(),
            visual: &visual,
            thermal: &thermal,
            real,
            depicted,
        })?;

        if params.weather == Weather::Snow {
            weather::simulate_snow(map, SNOW_DROP_AFTER * state.progress);
        }

        info!(
            "Day {:02} {:02}:00  {} progress {:.2}  real {:.2}  depicted {:.2}",
            day + 1,
            hour_of_day,
            params.weather.label(),
            state.progress,
            real,
            depicted
        );

        report.real.push(real);
        report.depicted.push(depicted);
        for (kind, temps) in &field.blocks {
            report.block_history.entry(*kind).or_default().push(mean(temps));
        }
        for (kind, temps) in &field.items {
            report.item_history.entry(*kind).or_default().push(mean(temps));
        }
    }

    Ok(report)
}

impl SimReport {
    /// Run-wide average per kind name, for blocks and items together.
    pub fn averages(&self) -> Vec<(&'static str, f32)> {
        let blocks = self.block_history.iter().map(|(k, v)| (k.name(), v));
        let items = self.item_history.iter().map(|(k, v)| (k.name(), v));
        blocks
            .chain(items)
            .filter(|(_, v)| !v.is_empty())
            .map(|(name, v)| (name, mean(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::make_map;
    use crate::palette::Palette;

    fn params(weather: Weather, days: usize) -> Params {
        Params {
            weather,
            num_days: days,
            pause_ms: 0,
            ..Params::default()
        }
    }

    #[test]
    fn real_temperature_curve() {
        assert!((base_real_temperature(12) - 40.0).abs() < 1e-4);
        assert!((base_real_temperature(0) - 20.0).abs() < 1e-4);
        let full = WeatherState { progress: 1.0, intensity: 0.0 };
        assert!((real_temperature(12, Weather::Snow, full) + 10.0).abs() < 1e-4);
        assert!(
            (real_temperature(12, Weather::Rain { stop_rain: 0 }, full) - 30.0).abs() < 1e-4
        );
    }

    #[test]
    fn one_sample_per_hour() {
        let p = params(Weather::Normal, 1);
        let mut rng = Rng::new(p.seed);
        let mut map = make_map(&p, &Palette::default(), &mut rng);
        let mut frames = 0;
        let report = run_simulation(&mut map, &p, &mut rng, |f| {
            assert_eq!(f.visual.len(), f.w * f.h * 4);
            assert_eq!(f.thermal.len(), f.visual.len());
            frames += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(frames, 24);
        assert_eq!(report.real.len(), 24);
        assert_eq!(report.depicted.len(), 24);
        for kind in BlockKind::ALL {
            assert_eq!(report.block_history[&kind].len(), 24);
        }
        assert!(report.depicted.iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn snow_covers_ground_and_warms_houses_to_ceiling() {
        let p = params(Weather::Snow, 1);
        let mut rng = Rng::new(p.seed);
        let mut map = make_map(&p, &Palette::default(), &mut rng);
        run_simulation(&mut map, &p, &mut rng, |_| Ok(())).unwrap();

        for b in &map.blocks {
            match b.kind {
                BlockKind::Water => assert_eq!(b.cover, None),
                _ => assert_eq!(b.cover, Some(Cover::Snow)),
            }
            assert!(b.heat >= -5.0);
            for it in &b.items {
                if it.kind.is_indoor() {
                    assert!(it.heat <= 25.0 + 1e-3);
                }
            }
        }
    }

    #[test]
    fn rain_floods_and_cools() {
        let p = params(Weather::Rain { stop_rain: 0 }, 2);
        let mut rng = Rng::new(p.seed);
        let mut map = make_map(&p, &Palette::default(), &mut rng);
        let report = run_simulation(&mut map, &p, &mut rng, |_| Ok(())).unwrap();

        assert!(map.blocks.iter().all(|b| b.cover == Some(Cover::Flood)));
        // Same hour of day, day one is dry at 01:00 while day two is fully flooded.
        assert!(report.real[25] < report.real[1]);
    }

    #[test]
    fn sink_error_stops_run() {
        let p = params(Weather::Normal, 1);
        let mut rng = Rng::new(p.seed);
        let mut map = make_map(&p, &Palette::default(), &mut rng);
        let mut seen = 0;
        let res = run_simulation(&mut map, &p, &mut rng, |_| {
            seen += 1;
            if seen == 3 {
                anyhow::bail!("display closed");
            }
            Ok(())
        });
        assert!(res.is_err());
        assert_eq!(seen, 3);
    }

    #[test]
    fn averages_skip_absent_kinds() {
        let mut p = params(Weather::Normal, 1);
        p.add_parks = false;
        let mut rng = Rng::new(p.seed);
        let mut map = make_map(&p, &Palette::default(), &mut rng);
        let report = run_simulation(&mut map, &p, &mut rng, |_| Ok(())).unwrap();
        let names: Vec<_> = report.averages().into_iter().map(|(n, _)| n).collect();
        assert!(!names.contains(&"Park"));
        assert!(!names.contains(&"MerryGo"));
        assert!(names.contains(&"Ground"));
        assert!(names.contains(&"House"));
    }
}
