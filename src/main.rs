use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use citysim::chart::{chart_font, summary_charts};
use citysim::config::{Params, Scenario};
use citysim::palette::{Palette, load_colours};
use citysim::prompt::Prompter;
use citysim::render::compose_panels;
use citysim::report::write_summary_table;
use citysim::rng::Rng;
use citysim::sim::SimReport;

const SALT_PROMPT: u64 = 0x9A0B_7E11_0000_0001;

#[derive(Parser, Debug)]
#[command(name = "citysim")]
#[command(about = "Procedural city map with day/night, flood, snow and heat simulation", long_about = None)]
struct Args {
    /// Preset scenario. Without one, the run is configured interactively.
    #[arg(value_enum)]
    scenario: Option<Scenario>,

    /// Seed for layout, colours and weather speckle
    #[arg(long)]
    seed: Option<u64>,

    /// CSV of `type,r,g,b` house and tree colours
    #[arg(long, default_value = "colours.csv")]
    colours: PathBuf,

    /// JSON file with parameter overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the live panel, charts and summary
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,

    /// Pause between simulated hours, in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Also keep every hourly frame as frame_NNNN.png
    #[arg(long, default_value_t = false)]
    frames: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    params: &'a Params,
    report: &'a SimReport,
}

fn save(path: &Path, rgba: &[u8], w: usize, h: usize) -> Result<()> {
    image::save_buffer(path, rgba, w as u32, h as u32, image::ColorType::Rgba8)
        .with_context(|| format!("saving {}", path.display()))
}

fn resolve_params(args: &Args) -> Result<Params> {
    let mut base = match &args.config {
        Some(path) => Params::from_json_file(path)?,
        None => Params::default(),
    };
    if let Some(seed) = args.seed {
        base.seed = seed;
    }
    if let Some(pause_ms) = args.pause_ms {
        base.pause_ms = pause_ms;
    }

    let params = match args.scenario {
        Some(scenario) => {
            info!("Running {:?} scenario with preset configuration.", scenario);
            let preset = scenario.params();
            Params {
                rows: preset.rows,
                cols: preset.cols,
                num_days: preset.num_days,
                add_forests: preset.add_forests,
                add_parks: preset.add_parks,
                weather: preset.weather,
                ..base
            }
        }
        None => {
            println!("Running simulation with user input.");
            let mut rng = Rng::new(base.seed ^ SALT_PROMPT);
            let stdin = io::stdin();
            Prompter::new(stdin.lock(), io::stdout()).collect(base, &mut rng)
        }
    };
    Ok(params)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let params = resolve_params(&args)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let (house, tree) = load_colours(&args.colours);
    let palette = Palette::from_lists(house, tree);

    info!(
        "Simulating {}x{} blocks for {} day(s), weather={}, seed={}",
        params.rows,
        params.cols,
        params.num_days,
        params.weather.label(),
        params.seed
    );

    let live_path = args.out.join("live.png");
    let pause = Duration::from_millis(params.pause_ms);
    let (run, timings) = citysim::simulate(&params, &palette, |frame| {
        let (panel, w, h) = compose_panels(frame.visual, frame.thermal, frame.w, frame.h);
        save(&live_path, &panel, w, h)?;
        if args.frames {
            save(&args.out.join(format!("frame_{:04}.png", frame.hour)), &panel, w, h)?;
        }
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
        Ok(())
    })?;

    let font = chart_font()?;
    for chart in summary_charts(&run.report, &font) {
        let path = args.out.join(format!("{}.png", chart.name));
        save(&path, &chart.rgba, chart.w, chart.h)?;
        info!("Saved {} [{}]", path.display(), chart.labels.join(", "));
    }

    let summary_path = args.out.join("summary.json");
    let file = std::fs::File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(
        BufWriter::new(file),
        &Summary {
            params: &params,
            report: &run.report,
        },
    )
    .with_context(|| format!("writing {}", summary_path.display()))?;
    info!("Saved {}", summary_path.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary_table(&mut out, &run.report)?;
    out.flush()?;

    info!("Timings:");
    for t in &timings {
        info!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    Ok(())
}
