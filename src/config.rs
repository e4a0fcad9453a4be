use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Smallest map accepted from the prompts.
pub const MIN_BLOCKS: usize = 12;

/// Weather mode for a run. Rain and snow are never combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Weather {
    Normal,
    /// `stop_rain`: hours of dry spell before the flood peaks.
    Rain { stop_rain: u32 },
    Snow,
}

impl Weather {
    pub fn label(self) -> &'static str {
        match self {
            Weather::Normal => "normal",
            Weather::Rain { .. } => "rain",
            Weather::Snow => "snow",
        }
    }
}

/// All tunable parameters of a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Layout
    pub rows: usize,
    pub cols: usize,
    pub add_forests: bool,
    pub add_parks: bool,

    // Simulation
    pub num_days: usize,
    pub weather: Weather,
    pub diffusion_rate: f32,
    pub diffusion_iterations: usize,

    // Run
    pub seed: u64,
    /// Pause between simulated hours.
    pub pause_ms: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            add_forests: true,
            add_parks: true,
            num_days: 2,
            weather: Weather::Normal,
            diffusion_rate: 0.01,
            diffusion_iterations: 3,
            seed: 42,
            pause_ms: 100,
        }
    }
}

impl Params {
    /// Read a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn total_hours(&self) -> usize {
        self.num_days * 24
    }
}

/// Preset runs selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    Snow,
    Rain,
    Normal,
}

impl Scenario {
    pub fn params(self) -> Params {
        let weather = match self {
            Scenario::Snow => Weather::Snow,
            Scenario::Rain => Weather::Rain { stop_rain: 0 },
            Scenario::Normal => Weather::Normal,
        };
        Params {
            weather,
            ..Params::default()
        }
    }
}
