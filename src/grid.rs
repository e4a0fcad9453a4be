/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Bounded topology: no wrapping on either axis.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

/// Axis-aligned pixel rectangle, possibly partly outside a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    /// Clip to `[0, gw) × [0, gh)`, returning `(x0, y0, x1, y1)` or None if empty.
    pub fn clip(&self, gw: usize, gh: usize) -> Option<(usize, usize, usize, usize)> {
        let x0 = self.x.max(0) as usize;
        let y0 = self.y.max(0) as usize;
        let x1 = (self.x + self.w as i32).clamp(0, gw as i32) as usize;
        let y1 = (self.y + self.h as i32).clamp(0, gh as i32) as usize;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }
}

impl<T: Copy> Grid<T> {
    pub fn filled(w: usize, h: usize, v: T) -> Self {
        Self {
            data: vec![v; w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Overwrite the clipped part of `rect`.
    pub fn fill_rect(&mut self, rect: Rect, v: T) {
        if let Some((x0, y0, x1, y1)) = rect.clip(self.w, self.h) {
            for y in y0..y1 {
                let row = y * self.w;
                self.data[row + x0..row + x1].fill(v);
            }
        }
    }
}

impl Grid<f32> {
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        (sum / self.data.len() as f64) as f32
    }

    /// Mean over the clipped part of `rect`; None if nothing is left after clipping.
    pub fn rect_mean(&self, rect: Rect) -> Option<f32> {
        let (x0, y0, x1, y1) = rect.clip(self.w, self.h)?;
        let mut sum = 0.0f64;
        for y in y0..y1 {
            let row = y * self.w;
            sum += self.data[row + x0..row + x1].iter().map(|&v| v as f64).sum::<f64>();
        }
        Some((sum / ((x1 - x0) * (y1 - y0)) as f64) as f32)
    }
}

/// 4-connected in-bounds neighbors. Edge cells get fewer.
pub fn neighbors4(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    let offsets: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    let mut out = [(0usize, 0usize); 4];
    let mut n = 0;
    for (dx, dy) in offsets {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
            out[n] = (nx as usize, ny as usize);
            n += 1;
        }
    }
    out.into_iter().take(n)
}
