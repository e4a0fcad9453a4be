use crate::config::Weather;
use crate::entity::{BlockKind, Cover, ItemKind};
use crate::layout::CityMap;

/// Hour the weather ramp starts.
pub const RAMP_START: usize = 3;
/// Hours before the end of the run at which the ramp completes.
pub const RAMP_TAIL: usize = 6;

const RAMP_MAX_INTENSITY: f32 = 0.1;
const SNOW_PEAK_INTENSITY: f32 = 0.3;
const RAIN_PEAK_INTENSITY: f32 = 0.1;

/// Snow floor for outdoor heat values.
const SNOW_FLOOR: f32 = -5.0;
/// Indoor warming per adjustment and its ceiling.
const INDOOR_WARMING: f32 = 15.0;
const INDOOR_CEILING: f32 = 25.0;

/// Progress of the active weather in [0, 1] and its speckle intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeatherState {
    pub progress: f32,
    pub intensity: f32,
}

/// (end hour, ramp duration) for a run of `total_hours`.
fn ramp(total_hours: usize) -> (i64, i64) {
    let end = total_hours as i64 - RAMP_TAIL as i64;
    (end, end - RAMP_START as i64)
}

fn ramp_state(hour: i64, duration: i64) -> WeatherState {
    let progress = if duration > 0 {
        ((hour - RAMP_START as i64) as f32 / duration as f32).clamp(0.0, 1.0)
    } else {
        1.0
    };
    WeatherState {
        progress,
        intensity: RAMP_MAX_INTENSITY.min(progress * 0.2),
    }
}

/// Linear snow ramp from `RAMP_START` to `total - RAMP_TAIL`, then pinned at 1.
pub fn snow_state(hour: usize, total_hours: usize) -> WeatherState {
    let h = hour as i64;
    let (end, duration) = ramp(total_hours);
    if h >= end {
        WeatherState {
            progress: 1.0,
            intensity: SNOW_PEAK_INTENSITY,
        }
    } else if h >= RAMP_START as i64 {
        ramp_state(h, duration)
    } else {
        WeatherState::default()
    }
}

/// Rain ramp. With a `stop_rain` delay, the last `stop_rain` hours before the
/// peak are a dry spell with no progress and no rain.
pub fn rain_state(hour: usize, total_hours: usize, stop_rain: u32) -> WeatherState {
    let h = hour as i64;
    let (end, duration) = ramp(total_hours);
    let shifted = h + stop_rain as i64;
    if (RAMP_START as i64..end).contains(&shifted) {
        ramp_state(h, duration)
    } else if h >= end {
        WeatherState {
            progress: 1.0,
            intensity: RAIN_PEAK_INTENSITY,
        }
    } else {
        WeatherState::default()
    }
}

/// Weather for `hour` under the given mode. Normal weather never progresses.
pub fn state_for(weather: Weather, hour: usize, total_hours: usize) -> WeatherState {
    match weather {
        Weather::Normal => WeatherState::default(),
        Weather::Rain { stop_rain } => rain_state(hour, total_hours, stop_rain),
        Weather::Snow => snow_state(hour, total_hours),
    }
}

/// Progress above which a block of `kind` gets covered. None: never covered.
pub fn block_threshold(cover: Cover, kind: BlockKind) -> Option<f32> {
    match (cover, kind) {
        (Cover::Flood, BlockKind::Ground | BlockKind::Water | BlockKind::Forest | BlockKind::Park) => {
            Some(0.2)
        }
        (Cover::Snow, BlockKind::Ground | BlockKind::Forest | BlockKind::Park) => Some(0.2),
        (_, BlockKind::Road) => Some(0.4),
        (Cover::Snow, BlockKind::Water) => None,
    }
}

/// Progress above which an item of `kind` gets covered. None: never covered.
pub fn item_threshold(cover: Cover, kind: ItemKind) -> Option<f32> {
    match kind {
        ItemKind::Pond if cover == Cover::Flood => Some(0.2),
        ItemKind::Street | ItemKind::WhiteLines => Some(0.5),
        ItemKind::MerryGo => Some(0.6),
        ItemKind::Bushes => Some(0.8),
        _ => None,
    }
}

#[inline]
fn crosses(threshold: Option<f32>, progress: f32) -> bool {
    threshold.is_some_and(|t| progress > t)
}

/// Set the sticky cover on every block and item whose threshold `progress` exceeds.
pub fn apply_covers(map: &mut CityMap, cover: Cover, progress: f32) {
    if progress <= 0.0 {
        return;
    }
    for block in &mut map.blocks {
        if crosses(block_threshold(cover, block.kind), progress) {
            block.cover = Some(cover);
        }
        for item in &mut block.items {
            if crosses(item_threshold(cover, item.kind), progress) {
                item.cover = Some(cover);
            }
        }
    }
}

/// Snow chills blocks and outdoor items by `drop` (floored) while houses and
/// apartments warm up (capped).
pub fn simulate_snow(map: &mut CityMap, drop: f32) {
    for block in &mut map.blocks {
        block.heat = (block.heat - drop).max(SNOW_FLOOR);
        for item in &mut block.items {
            item.heat = if item.kind.is_indoor() {
                (item.heat + INDOOR_WARMING).min(INDOOR_CEILING)
            } else {
                (item.heat - drop).max(SNOW_FLOOR)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Block, Item, BLOCK_SIZE, DEFAULT_HOUSE_COLOUR};
    use crate::layout::place_blocks;

    const EPS: f32 = 1e-4;

    fn block_covered(cover: Cover, kind: BlockKind, progress: f32) -> bool {
        let mut map = place_blocks(1, 1);
        map.blocks[0] = Block::new(kind, (0, 0), BLOCK_SIZE);
        apply_covers(&mut map, cover, progress);
        map.blocks[0].cover == Some(cover)
    }

    fn item_covered(cover: Cover, kind: ItemKind, progress: f32) -> bool {
        let mut map = place_blocks(1, 1);
        map.blocks[0].add_item(Item::new(kind, (12, 12), [0, 0, 0]));
        apply_covers(&mut map, cover, progress);
        map.blocks[0].items[0].cover == Some(cover)
    }

    #[test]
    fn flood_block_thresholds() {
        for kind in [BlockKind::Ground, BlockKind::Water, BlockKind::Forest, BlockKind::Park] {
            assert!(!block_covered(Cover::Flood, kind, 0.2));
            assert!(block_covered(Cover::Flood, kind, 0.2 + EPS));
        }
        assert!(!block_covered(Cover::Flood, BlockKind::Road, 0.4));
        assert!(block_covered(Cover::Flood, BlockKind::Road, 0.4 + EPS));
    }

    #[test]
    fn flood_item_thresholds() {
        let cases = [
            (ItemKind::Pond, 0.2),
            (ItemKind::Street, 0.5),
            (ItemKind::WhiteLines, 0.5),
            (ItemKind::MerryGo, 0.6),
            (ItemKind::Bushes, 0.8),
        ];
        for (kind, t) in cases {
            assert!(!item_covered(Cover::Flood, kind, t - EPS), "{kind:?}");
            assert!(!item_covered(Cover::Flood, kind, t), "{kind:?}");
            assert!(item_covered(Cover::Flood, kind, t + EPS), "{kind:?}");
        }
        for kind in [ItemKind::Tree, ItemKind::House, ItemKind::Apartment, ItemKind::Slide] {
            assert!(!item_covered(Cover::Flood, kind, 1.0));
        }
    }

    #[test]
    fn snow_thresholds() {
        assert!(!block_covered(Cover::Snow, BlockKind::Water, 1.0));
        assert!(!block_covered(Cover::Snow, BlockKind::Park, 0.2));
        assert!(block_covered(Cover::Snow, BlockKind::Park, 0.2 + EPS));
        assert!(!block_covered(Cover::Snow, BlockKind::Road, 0.4));
        assert!(block_covered(Cover::Snow, BlockKind::Road, 0.4 + EPS));
        assert!(!item_covered(Cover::Snow, ItemKind::Pond, 1.0));
        assert!(!item_covered(Cover::Snow, ItemKind::MerryGo, 0.6));
        assert!(item_covered(Cover::Snow, ItemKind::MerryGo, 0.6 + EPS));
        assert!(!item_covered(Cover::Snow, ItemKind::Bushes, 0.8));
        assert!(item_covered(Cover::Snow, ItemKind::Bushes, 0.8 + EPS));
    }

    #[test]
    fn cover_is_sticky() {
        let mut map = place_blocks(2, 2);
        map.blocks[0] = Block::new(BlockKind::Ground, (0, 0), BLOCK_SIZE);
        apply_covers(&mut map, Cover::Flood, 0.5);
        apply_covers(&mut map, Cover::Flood, 0.0);
        assert_eq!(map.blocks[0].cover, Some(Cover::Flood));
    }

    #[test]
    fn snow_ramp() {
        let total = 48;
        assert_eq!(snow_state(0, total), WeatherState::default());
        assert_eq!(snow_state(3, total).progress, 0.0);
        let mid = snow_state(22, total);
        assert!((mid.progress - 19.0 / 39.0).abs() < EPS);
        assert!((mid.intensity - 0.1).abs() < EPS);
        let early = snow_state(5, total);
        assert!((early.intensity - 0.2 * 2.0 / 39.0).abs() < EPS);
        assert_eq!(
            snow_state(42, total),
            WeatherState { progress: 1.0, intensity: 0.3 }
        );
        let mut prev = 0.0;
        for hour in 0..total {
            let p = snow_state(hour, total).progress;
            assert!(p >= prev);
            prev = p;
        }
    }

    #[test]
    fn rain_dry_spell() {
        let total = 48;
        // Without a delay rain is the same ramp as snow, but peaks at 0.1.
        assert_eq!(rain_state(20, total, 0).progress, snow_state(20, total).progress);
        assert_eq!(rain_state(45, total, 0).intensity, 0.1);
        // With a 5 hour delay, hours 37..42 are dry.
        assert!(rain_state(36, total, 5).progress > 0.0);
        assert_eq!(rain_state(37, total, 5), WeatherState::default());
        assert_eq!(rain_state(41, total, 5), WeatherState::default());
        assert_eq!(rain_state(42, total, 5).progress, 1.0);
        // Early onset never produces negative progress.
        assert_eq!(rain_state(0, total, 5).progress, 0.0);
    }

    #[test]
    fn normal_weather_is_calm() {
        for hour in 0..48 {
            assert_eq!(state_for(Weather::Normal, hour, 48), WeatherState::default());
        }
    }

    #[test]
    fn snow_adjusts_heat() {
        let mut map = place_blocks(1, 1);
        map.blocks[0] = Block::new(BlockKind::Ground, (0, 0), BLOCK_SIZE);
        map.blocks[0].add_item(Item::new(ItemKind::House, (12, 12), DEFAULT_HOUSE_COLOUR));
        map.blocks[0].add_item(Item::fixed(ItemKind::Pond, (5, 5)));
        map.blocks[0].items[0].heat = 5.0;

        simulate_snow(&mut map, 10.0);
        let b = &map.blocks[0];
        assert_eq!(b.heat, 50.0);
        assert_eq!(b.items[0].heat, 20.0);
        assert_eq!(b.items[1].heat, 40.0);

        simulate_snow(&mut map, 100.0);
        let b = &map.blocks[0];
        assert_eq!(b.heat, -5.0);
        assert_eq!(b.items[0].heat, 25.0);
        assert_eq!(b.items[1].heat, -5.0);
    }
}
