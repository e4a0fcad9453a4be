use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::entity::Rgb;
use crate::rng::Rng;

#[derive(Deserialize)]
struct ColourRow {
    #[serde(rename = "type")]
    kind: String,
    r: u8,
    g: u8,
    b: u8,
}

/// Candidate colours for houses and greenery. Empty lists mean "use the default".
#[derive(Clone, Debug, Default)]
pub struct Palette {
    pub house: Vec<Rgb>,
    pub tree: Vec<Rgb>,
}

impl Palette {
    pub fn from_lists(house: Option<Vec<Rgb>>, tree: Option<Vec<Rgb>>) -> Self {
        Self {
            house: house.unwrap_or_default(),
            tree: tree.unwrap_or_default(),
        }
    }

    pub fn house_colour(&self, rng: &mut Rng, fallback: Rgb) -> Rgb {
        rng.choose(&self.house).copied().unwrap_or(fallback)
    }

    pub fn tree_colour(&self, rng: &mut Rng, fallback: Rgb) -> Rgb {
        rng.choose(&self.tree).copied().unwrap_or(fallback)
    }
}

fn read_rows(path: &Path) -> Result<(Vec<Rgb>, Vec<Rgb>)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut house = Vec::new();
    let mut tree = Vec::new();
    for row in reader.deserialize() {
        let row: ColourRow = row.with_context(|| format!("parsing {}", path.display()))?;
        match row.kind.to_lowercase().as_str() {
            "house" => house.push([row.r, row.g, row.b]),
            "tree" => tree.push([row.r, row.g, row.b]),
            _ => {}
        }
    }
    Ok((house, tree))
}

/// Load `type,r,g,b` rows. A missing or unreadable file yields `(None, None)`
/// after a notice; callers then use the built-in colours.
pub fn load_colours(path: &Path) -> (Option<Vec<Rgb>>, Option<Vec<Rgb>>) {
    if !path.exists() {
        warn!("CSV file '{}' not found. Using default colors.", path.display());
        return (None, None);
    }
    match read_rows(path) {
        Ok((house, tree)) => (Some(house), Some(tree)),
        Err(e) => {
            warn!("Error reading CSV file: {:#}", e);
            (None, None)
        }
    }
}
