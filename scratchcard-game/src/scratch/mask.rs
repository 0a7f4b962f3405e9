use super::Point;

/// A coverable surface that can only be erased, never re-covered.
pub trait CoverageMask {
    /// Clears the part of the disc that overlaps the surface.
    fn erase_disc(&mut self, center: Point, radius: f32);

    /// Fraction of the surface that is fully erased, in `[0, 1]`.
    fn scratched_fraction(&self) -> f64;

    /// Restores full coverage.
    fn reset(&mut self);
}

const OPAQUE: u8 = u8::MAX;

/// One alpha byte per pixel. A pixel counts as erased only at alpha zero.
#[derive(Debug, Clone)]
pub struct RasterMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
    erased: usize,
}

impl RasterMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![OPAQUE; width as usize * height as usize],
            erased: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_erased(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.alpha[self.index(x, y)] == 0
    }

    /// Recounts every pixel. Always agrees with the running counter.
    pub fn rescan_fraction(&self) -> f64 {
        let erased = self.alpha.iter().filter(|alpha| **alpha == 0).count();
        fraction(erased, self.alpha.len())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl CoverageMask for RasterMask {
    /// Pixels whose centre lies within `radius` of `center` are cleared.
    fn erase_disc(&mut self, center: Point, radius: f32) {
        if self.alpha.is_empty() || radius <= 0.0 {
            return;
        }

        let clamp = |value: f32, limit: u32| value.floor().clamp(0.0, limit as f32 - 1.0) as u32;
        let x_min = clamp(center.x - radius, self.width);
        let x_max = clamp(center.x + radius, self.width);
        let y_min = clamp(center.y - radius, self.height);
        let y_max = clamp(center.y + radius, self.height);
        let radius_sq = radius * radius;

        for y in y_min..=y_max {
            let dy = y as f32 + 0.5 - center.y;
            for x in x_min..=x_max {
                let dx = x as f32 + 0.5 - center.x;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let index = self.index(x, y);
                if self.alpha[index] != 0 {
                    self.alpha[index] = 0;
                    self.erased += 1;
                }
            }
        }
    }

    fn scratched_fraction(&self) -> f64 {
        fraction(self.erased, self.alpha.len())
    }

    fn reset(&mut self) {
        self.alpha.fill(OPAQUE);
        self.erased = 0;
    }
}

fn fraction(erased: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    erased as f64 / total as f64
}
