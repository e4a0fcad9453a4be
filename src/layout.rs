use tracing::{debug, info};

use crate::config::Params;
use crate::entity::{
    Block, BlockKind, DEFAULT_HOUSE_COLOUR, DEFAULT_TREE_COLOUR, Item, ItemKind, BLOCK_SIZE,
};
use crate::palette::Palette;
use crate::rng::Rng;

const FOREST_SPAN: usize = 2;
const TREES_PER_FOREST: usize = 30;
const PLACEMENT_ATTEMPTS: usize = 50;

const HOUSE_BOUNDARY: i32 = 5;
const HOUSE_TREES: usize = 5;
const APARTMENT_BOUNDARY: i32 = 6;
const APARTMENT_BUSHES: usize = 10;

/// Dense row-major tiling of `rows × cols` blocks.
#[derive(Clone, Debug)]
pub struct CityMap {
    pub rows: usize,
    pub cols: usize,
    pub block_size: usize,
    pub blocks: Vec<Block>,
}

impl CityMap {
    pub fn width_px(&self) -> usize {
        self.cols * self.block_size
    }

    pub fn height_px(&self) -> usize {
        self.rows * self.block_size
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        i * self.cols + j
    }

    pub fn block(&self, i: usize, j: usize) -> &Block {
        &self.blocks[self.index(i, j)]
    }

    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }

    /// Swap the tile at `(i, j)` for a fresh block of `kind`, dropping its items.
    fn replace(&mut self, i: usize, j: usize, kind: BlockKind) -> &mut Block {
        let idx = self.index(i, j);
        let topleft = self.blocks[idx].topleft;
        self.blocks[idx] = Block::new(kind, topleft, self.block_size);
        &mut self.blocks[idx]
    }
}

/// Ground everywhere except the bottom row and right column, which are water.
pub fn place_blocks(rows: usize, cols: usize) -> CityMap {
    let mut blocks = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let kind = if i + 1 == rows || j + 1 == cols {
                BlockKind::Water
            } else {
                BlockKind::Ground
            };
            blocks.push(Block::new(kind, (BLOCK_SIZE * j, BLOCK_SIZE * i), BLOCK_SIZE));
        }
    }
    CityMap {
        rows,
        cols,
        block_size: BLOCK_SIZE,
        blocks,
    }
}

/// Forest on the ground tiles of the 2×2 region at the origin.
pub fn add_forest(map: &mut CityMap, palette: &Palette, rng: &mut Rng) {
    for i in 0..FOREST_SPAN.min(map.rows) {
        for j in 0..FOREST_SPAN.min(map.cols) {
            if map.block(i, j).kind != BlockKind::Ground {
                continue;
            }
            let block = map.replace(i, j, BlockKind::Forest);
            for _ in 0..TREES_PER_FOREST {
                let colour = palette.tree_colour(rng, DEFAULT_TREE_COLOUR);
                let pos = (rng.range_i32(4, 22), rng.range_i32(4, 22));
                block.add_item(Item::new(ItemKind::Tree, pos, colour));
            }
        }
    }
}

/// Scatter up to `want` items of `kind` around `building`, rejecting samples
/// whose corners touch its guard rectangle.
fn scatter_around(
    block: &mut Block,
    building: &Item,
    boundary: i32,
    kind: ItemKind,
    want: usize,
    palette: &Palette,
    rng: &mut Rng,
) -> usize {
    let (size, _) = kind.size();
    let size = size as i32;
    let mut placed = 0;
    let mut attempts = 0;
    while placed < want && attempts < PLACEMENT_ATTEMPTS {
        let x = rng.range_i32(3, 22);
        let y = rng.range_i32(3, 22);
        if !building.guard_contains(x, y, boundary)
            && !building.guard_contains(x + size, y + size, boundary)
        {
            let colour = palette.tree_colour(rng, DEFAULT_TREE_COLOUR);
            block.add_item(Item::new(kind, (x, y), colour));
            placed += 1;
        }
        attempts += 1;
    }
    placed
}

/// Houses with trees on every third ground row, apartments with bushes elsewhere.
pub fn add_households(map: &mut CityMap, palette: &Palette, rng: &mut Rng) {
    for i in 0..map.rows.saturating_sub(1) {
        for j in 0..map.cols.saturating_sub(1) {
            let idx = map.index(i, j);
            let block = &mut map.blocks[idx];
            if block.kind != BlockKind::Ground {
                continue;
            }
            let colour = palette.house_colour(rng, DEFAULT_HOUSE_COLOUR);
            let (building, boundary, greenery, want) = if i % 3 == 0 {
                let pos = (rng.range_i32(6, 19), rng.range_i32(3, 22));
                (
                    Item::new(ItemKind::House, pos, colour),
                    HOUSE_BOUNDARY,
                    ItemKind::Tree,
                    HOUSE_TREES,
                )
            } else {
                let pos = (rng.range_i32(8, 17), rng.range_i32(4, 21));
                (
                    Item::new(ItemKind::Apartment, pos, colour),
                    APARTMENT_BOUNDARY,
                    ItemKind::Bushes,
                    APARTMENT_BUSHES,
                )
            };
            block.add_item(building.clone());
            let placed = scatter_around(block, &building, boundary, greenery, want, palette, rng);
            if placed < want {
                debug!(
                    "block ({}, {}): placed {}/{} {}",
                    i,
                    j,
                    placed,
                    want,
                    greenery.name()
                );
            }
        }
    }
}

/// Full-width road strip on every fifth row.
pub fn add_roads(map: &mut CityMap, palette: &Palette, rng: &mut Rng) {
    for i in 0..map.rows.saturating_sub(1) {
        if i % 5 != 4 {
            continue;
        }
        for j in 0..map.cols {
            let colour = palette.tree_colour(rng, DEFAULT_TREE_COLOUR);
            let block = map.replace(i, j, BlockKind::Road);
            block.add_item(Item::fixed(ItemKind::Street, (12, 12)));
            block.add_item(Item::fixed(ItemKind::WhiteLines, (5, 13)));
            block.add_item(Item::new(ItemKind::Bushes, (6, 22), colour));
            block.add_item(Item::new(ItemKind::Bushes, (6, 2), colour));
        }
    }
}

/// Playgrounds on rows `i % 5 == 3`, every seventh column.
pub fn add_parks(map: &mut CityMap, palette: &Palette, rng: &mut Rng) {
    for i in 0..map.rows.saturating_sub(1) {
        if i % 5 != 3 {
            continue;
        }
        for j in 0..map.cols.saturating_sub(1) {
            if j % 7 != 1 {
                continue;
            }
            let block = map.replace(i, j, BlockKind::Park);
            for c in [3, 8, 13, 18] {
                let colour = palette.tree_colour(rng, DEFAULT_TREE_COLOUR);
                block.add_item(Item::new(ItemKind::Bushes, (c, 2), colour));
                block.add_item(Item::new(ItemKind::Bushes, (2, c), colour));
            }
            block.add_item(Item::fixed(ItemKind::MerryGo, (20, 20)));
            block.add_item(Item::fixed(ItemKind::Slide, (10, 20)));
            let colour = palette.tree_colour(rng, DEFAULT_TREE_COLOUR);
            block.add_item(Item::new(ItemKind::Tree, (20, 10), colour));
            block.add_item(Item::fixed(ItemKind::Pond, (10, 12)));
        }
    }
}

/// Build the full city. Forest, road and park tiles replace the tile beneath
/// them, so the map always holds `rows × cols` blocks and no hidden ground
/// block or household survives under an overlay. Per-kind temperature
/// averages therefore only count visible tiles; a stacked-layer model that
/// kept the covered ground blocks (and a doubled water corner) would weigh
/// Ground and Water higher.
pub fn make_map(params: &Params, palette: &Palette, rng: &mut Rng) -> CityMap {
    let mut map = place_blocks(params.rows, params.cols);

    if params.add_forests {
        add_forest(&mut map, palette, rng);
    } else {
        info!("Skipping forest");
    }

    add_households(&mut map, palette, rng);
    add_roads(&mut map, palette, rng);

    if params.add_parks {
        add_parks(&mut map, palette, rng);
    } else {
        info!("Skipping parks");
    }

    map
}
