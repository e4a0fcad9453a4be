use serde::Serialize;

use crate::grid::Rect;

pub type Rgb = [u8; 3];

/// Side length of every block in pixels.
pub const BLOCK_SIZE: usize = 25;

/// Per-channel day/night brightness boost at full strength.
const BRIGHTNESS: [f32; 3] = [50.0, 30.0, 30.0];
const SHADE_MIN: f32 = 50.0;
const BLOCK_SHADE_MAX: f32 = 255.0;
const ITEM_SHADE_MAX: f32 = 250.0;

/// Outside-circle fill for the merry-go-round mask.
const MERRYGO_SURROUND: Rgb = [153, 255, 204];

pub const DEFAULT_TREE_COLOUR: Rgb = [40, 200, 23];
pub const DEFAULT_HOUSE_COLOUR: Rgb = [154, 200, 53];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BlockKind {
    Ground,
    Water,
    Forest,
    Road,
    Park,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Ground,
        BlockKind::Water,
        BlockKind::Forest,
        BlockKind::Road,
        BlockKind::Park,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Ground => "Ground",
            BlockKind::Water => "Water",
            BlockKind::Forest => "Forest",
            BlockKind::Road => "Road",
            BlockKind::Park => "Park",
        }
    }

    pub fn default_colour(self) -> Rgb {
        match self {
            BlockKind::Ground => [239, 168, 61],
            BlockKind::Water => [0, 119, 190],
            BlockKind::Forest => [120, 202, 123],
            BlockKind::Road => [94, 82, 82],
            BlockKind::Park => [153, 255, 204],
        }
    }

    pub fn default_heat(self) -> f32 {
        match self {
            BlockKind::Ground => 60.0,
            BlockKind::Water | BlockKind::Forest => 50.0,
            BlockKind::Road | BlockKind::Park => 80.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ItemKind {
    Tree,
    House,
    Bushes,
    Street,
    MerryGo,
    Slide,
    Pond,
    WhiteLines,
    Apartment,
}

impl ItemKind {
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Tree,
        ItemKind::House,
        ItemKind::Bushes,
        ItemKind::Street,
        ItemKind::MerryGo,
        ItemKind::Slide,
        ItemKind::Pond,
        ItemKind::WhiteLines,
        ItemKind::Apartment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Tree => "Tree",
            ItemKind::House => "House",
            ItemKind::Bushes => "Bushes",
            ItemKind::Street => "Street",
            ItemKind::MerryGo => "MerryGo",
            ItemKind::Slide => "Slide",
            ItemKind::Pond => "Pond",
            ItemKind::WhiteLines => "White_lines",
            ItemKind::Apartment => "Apartment",
        }
    }

    /// (height, width) in pixels.
    pub fn size(self) -> (usize, usize) {
        match self {
            ItemKind::Tree => (5, 5),
            ItemKind::House => (6, 12),
            ItemKind::Apartment => (8, 16),
            ItemKind::Street => (15, 25),
            ItemKind::WhiteLines => (1, 5),
            ItemKind::Pond => (7, 7),
            ItemKind::Bushes => (3, 3),
            ItemKind::MerryGo => (8, 8),
            ItemKind::Slide => (4, 4),
        }
    }

    pub fn default_heat(self) -> f32 {
        match self {
            ItemKind::Tree | ItemKind::Bushes => 70.0,
            ItemKind::House | ItemKind::Apartment => 80.0,
            ItemKind::Street | ItemKind::WhiteLines => 80.0,
            ItemKind::Pond => 50.0,
            ItemKind::MerryGo | ItemKind::Slide => 90.0,
        }
    }

    /// Fixed colour for kinds that never come from the palette.
    pub fn fixed_colour(self) -> Option<Rgb> {
        match self {
            ItemKind::Street => Some([48, 46, 46]),
            ItemKind::WhiteLines => Some([255, 255, 255]),
            ItemKind::Pond => Some([51, 53, 255]),
            ItemKind::MerryGo => Some([150, 50, 50]),
            ItemKind::Slide => Some([150, 50, 150]),
            _ => None,
        }
    }

    /// Houses and apartments are heated from inside.
    pub fn is_indoor(self) -> bool {
        matches!(self, ItemKind::House | ItemKind::Apartment)
    }
}

/// Sticky weather cover. A covered entity shows the cover colour wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cover {
    Flood,
    Snow,
}

impl Cover {
    pub fn colour(self) -> Rgb {
        match self {
            Cover::Flood => [0, 119, 190],
            Cover::Snow => [255, 255, 255],
        }
    }
}

/// Apply the day/night boost to a base colour.
#[inline]
pub fn shade(base: Rgb, factor: f32, max: f32) -> Rgb {
    let k = 1.0 - factor;
    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = (base[c] as f32 + BRIGHTNESS[c] * k).clamp(SHADE_MIN, max) as u8;
    }
    out
}

#[derive(Clone, Debug)]
pub struct Item {
    pub kind: ItemKind,
    /// Centre, in block-local pixels.
    pub pos: (i32, i32),
    /// (height, width).
    pub size: (usize, usize),
    pub base_colour: Rgb,
    pub colour: Rgb,
    pub heat: f32,
    pub cover: Option<Cover>,
}

impl Item {
    pub fn new(kind: ItemKind, pos: (i32, i32), colour: Rgb) -> Self {
        Self {
            kind,
            pos,
            size: kind.size(),
            base_colour: colour,
            colour,
            heat: kind.default_heat(),
            cover: None,
        }
    }

    /// Item with its kind's fixed colour (falls back to the default tree green).
    pub fn fixed(kind: ItemKind, pos: (i32, i32)) -> Self {
        Self::new(kind, pos, kind.fixed_colour().unwrap_or(DEFAULT_TREE_COLOUR))
    }

    pub fn footprint(&self) -> Rect {
        let (h, w) = self.size;
        Rect {
            x: self.pos.0 - (w / 2) as i32,
            y: self.pos.1 - (h / 2) as i32,
            w,
            h,
        }
    }

    /// Guard rectangle used to keep greenery off buildings. Anchored at `pos`
    /// (not the footprint) and grown by `boundary` on every side.
    pub fn guard_contains(&self, x: i32, y: i32, boundary: i32) -> bool {
        let (h, w) = self.size;
        let left = self.pos.0 - boundary;
        let right = self.pos.0 + w as i32 + boundary;
        let top = self.pos.1 - boundary;
        let bottom = self.pos.1 + h as i32 + boundary;
        (left..=right).contains(&x) && (top..=bottom).contains(&y)
    }

    pub fn day_night(&mut self, factor: f32) {
        self.colour = match self.cover {
            Some(cover) => cover.colour(),
            None => shade(self.base_colour, factor, ITEM_SHADE_MAX),
        };
    }

    /// Colour at item-local pixel `(dx, dy)`.
    #[inline]
    pub fn pixel(&self, dx: usize, dy: usize) -> Rgb {
        if self.kind == ItemKind::MerryGo && !in_circle(dx, dy, self.size) {
            return MERRYGO_SURROUND;
        }
        self.colour
    }
}

fn in_circle(dx: usize, dy: usize, (h, w): (usize, usize)) -> bool {
    let cx = h as f32 / 2.0 - 0.5;
    let cy = w as f32 / 2.0 - 0.5;
    let fx = dx as f32 - cx;
    let fy = dy as f32 - cy;
    (fx * fx + fy * fy).sqrt() <= (h.min(w) / 2) as f32
}

#[derive(Clone, Debug)]
pub struct Block {
    pub kind: BlockKind,
    /// Top-left pixel in map coordinates.
    pub topleft: (usize, usize),
    pub size: usize,
    pub base_colour: Rgb,
    pub colour: Rgb,
    pub heat: f32,
    pub cover: Option<Cover>,
    pub items: Vec<Item>,
}

impl Block {
    pub fn new(kind: BlockKind, topleft: (usize, usize), size: usize) -> Self {
        let colour = kind.default_colour();
        Self {
            kind,
            topleft,
            size,
            base_colour: colour,
            colour,
            heat: kind.default_heat(),
            cover: None,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn day_night(&mut self, factor: f32) {
        self.colour = match self.cover {
            Some(cover) => cover.colour(),
            None => shade(self.base_colour, factor, BLOCK_SHADE_MAX),
        };
        for item in &mut self.items {
            item.day_night(factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_is_centred() {
        let house = Item::new(ItemKind::House, (10, 8), DEFAULT_HOUSE_COLOUR);
        assert_eq!(house.footprint(), Rect { x: 4, y: 5, w: 12, h: 6 });
    }

    #[test]
    fn shade_clamps_both_ends() {
        assert_eq!(shade([0, 0, 0], 1.0, 255.0), [50, 50, 50]);
        assert_eq!(shade([250, 250, 250], -0.8, 250.0), [250, 250, 250]);
        // 100 + 50 * 0.5 = 125, 100 + 30 * 0.5 = 115
        assert_eq!(shade([100, 100, 100], 0.5, 255.0), [125, 115, 115]);
    }

    #[test]
    fn cover_wins_over_brightness() {
        let mut block = Block::new(BlockKind::Ground, (0, 0), BLOCK_SIZE);
        block.cover = Some(Cover::Snow);
        block.day_night(-0.8);
        assert_eq!(block.colour, [255, 255, 255]);
    }

    #[test]
    fn merrygo_corners_are_masked() {
        let mut m = Item::fixed(ItemKind::MerryGo, (20, 20));
        m.day_night(1.0);
        assert_eq!(m.pixel(0, 0), MERRYGO_SURROUND);
        assert_eq!(m.pixel(4, 4), m.colour);
    }

    #[test]
    fn guard_is_inclusive() {
        let house = Item::new(ItemKind::House, (10, 10), DEFAULT_HOUSE_COLOUR);
        assert!(house.guard_contains(5, 5, 5));
        assert!(house.guard_contains(27, 21, 5));
        assert!(!house.guard_contains(28, 21, 5));
        assert!(!house.guard_contains(4, 10, 5));
    }
}
