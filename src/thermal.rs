use std::collections::BTreeMap;
use std::f32::consts::PI;

use crate::entity::{BlockKind, ItemKind};
use crate::grid::{Grid, Rect};
use crate::layout::CityMap;

/// Cooling per unit of flood progress.
const FLOOD_COOLING: f32 = 20.0;

/// Depicted temperature of an entity with heat value `heat_val` at `hour` of day.
/// Daytime heating peaks at 13:00, evening cooldown peaks at 01:00. Never negative.
pub fn thermal_equation(heat_val: f32, hour: usize, flood_level: f32) -> f32 {
    let h = hour as f32;
    let heat = heat_val + 15.0 * ((2.0 * PI / 24.0) * (h - 7.0)).sin();
    let cooldown = 10.0 * ((2.0 * PI / 24.0) * (h - 19.0)).sin();
    (heat - cooldown - FLOOD_COOLING * flood_level).max(0.0)
}

/// Pixel-aligned thermal map plus the per-kind samples that produced it.
pub struct ThermalField {
    pub grid: Grid<f32>,
    pub blocks: BTreeMap<BlockKind, Vec<f32>>,
    pub items: BTreeMap<ItemKind, Vec<f32>>,
}

impl ThermalField {
    /// Map-wide average, the "depicted" temperature.
    pub fn depicted(&self) -> f32 {
        self.grid.mean()
    }
}

/// Evaluate every block and item for `hour`. Heat values are left untouched.
pub fn generate_thermal(map: &CityMap, hour: usize, flood_level: f32) -> ThermalField {
    let mut grid = Grid::new(map.width_px(), map.height_px());
    let mut blocks: BTreeMap<BlockKind, Vec<f32>> = BTreeMap::new();
    let mut items: BTreeMap<ItemKind, Vec<f32>> = BTreeMap::new();

    for block in &map.blocks {
        let (bx, by) = block.topleft;
        let block_temp = thermal_equation(block.heat, hour, flood_level);
        grid.fill_rect(
            Rect {
                x: bx as i32,
                y: by as i32,
                w: block.size,
                h: block.size,
            },
            block_temp,
        );
        blocks.entry(block.kind).or_default().push(block_temp);

        for item in &block.items {
            let item_temp = thermal_equation(item.heat, hour, flood_level);
            let fp = item.footprint();
            if let Some((x0, y0, x1, y1)) = fp.clip(block.size, block.size) {
                grid.fill_rect(
                    Rect {
                        x: (bx + x0) as i32,
                        y: (by + y0) as i32,
                        w: x1 - x0,
                        h: y1 - y0,
                    },
                    item_temp,
                );
            }
            items.entry(item.kind).or_default().push(item_temp);
        }
    }

    ThermalField {
        grid,
        blocks,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Block, Item, BLOCK_SIZE};
    use crate::layout::place_blocks;

    #[test]
    fn equation_at_seven() {
        let expected = (50.0f32 - 10.0 * ((2.0 * PI / 24.0) * (7.0 - 19.0)).sin()).max(0.0);
        let got = thermal_equation(50.0, 7, 0.0);
        assert!((got - expected).abs() < 1e-4, "{got} vs {expected}");
        // sin(-pi) is zero, so this is just the heat value.
        assert!((got - 50.0).abs() < 1e-4);
    }

    #[test]
    fn equation_never_negative() {
        for hour in 0..24 {
            for heat in [-100.0, -5.0, 0.0, 10.0, 90.0] {
                for flood in [0.0, 0.5, 1.0, 5.0] {
                    assert!(thermal_equation(heat, hour, flood) >= 0.0);
                }
            }
        }
    }

    #[test]
    fn flood_cools() {
        let dry = thermal_equation(60.0, 13, 0.0);
        let wet = thermal_equation(60.0, 13, 1.0);
        assert!((dry - wet - 20.0).abs() < 1e-4);
    }

    #[test]
    fn field_paints_items_over_blocks() {
        let mut map = place_blocks(1, 1);
        let mut block = Block::new(BlockKind::Ground, (0, 0), BLOCK_SIZE);
        let mut pond = Item::fixed(ItemKind::Pond, (10, 12));
        pond.heat = 10.0;
        block.add_item(pond);
        map.blocks[0] = block;

        let field = generate_thermal(&map, 7, 0.0);
        assert!((field.grid.get(0, 0) - thermal_equation(60.0, 7, 0.0)).abs() < 1e-5);
        assert!((field.grid.get(10, 12) - thermal_equation(10.0, 7, 0.0)).abs() < 1e-5);
        assert_eq!(field.blocks[&BlockKind::Ground].len(), 1);
        assert_eq!(field.items[&ItemKind::Pond].len(), 1);
        assert!(!field.items.contains_key(&ItemKind::Tree));
    }
}
