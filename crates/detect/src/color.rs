use image::Rgb;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MAX_HUE: u8 = 179;
pub const MAX_SAT: u8 = 255;
pub const MAX_VAL: u8 = 255;

/// 8-bit HSV triple. Hue is halved degrees (`0..=179`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct Hsv {
    #[schemars(range(max = 179))]
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl Hsv {
    pub const fn new(hue: u8, sat: u8, val: u8) -> Self {
        Self { hue, sat, val }
    }

    pub fn from_rgb(pixel: &Rgb<u8>) -> Self {
        rgb_to_hsv(pixel[0], pixel[1], pixel[2])
    }
}

/// Inclusive HSV box selecting one target colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HsvFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub min: Hsv,
    pub max: Hsv,
}

impl HsvFilter {
    pub fn new(min: Hsv, max: Hsv) -> Self {
        Self { name: None, min, max }
    }

    pub fn named(name: impl Into<String>, min: Hsv, max: Hsv) -> Self {
        Self { name: Some(name.into()), min, max }
    }

    /// Accepts every pixel: (0, 0, 0) to (179, 255, 255)
    pub fn full_range() -> Self {
        Self::new(Hsv::new(0, 0, 0), Hsv::new(MAX_HUE, MAX_SAT, MAX_VAL))
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.min.hue..=self.max.hue).contains(&hsv.hue)
            && (self.min.sat..=self.max.sat).contains(&hsv.sat)
            && (self.min.val..=self.max.val).contains(&hsv.val)
    }

    /// Midpoint of the box, used as the representative colour of its objects.
    pub fn average_color(&self) -> Hsv {
        let mid = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
        Hsv {
            hue: mid(self.min.hue, self.max.hue),
            sat: mid(self.min.sat, self.max.sat),
            val: mid(self.min.val, self.max.val),
        }
    }
}

impl Default for HsvFilter {
    fn default() -> Self {
        Self::full_range()
    }
}

/// RGB to 8-bit HSV (H in `0..=179`, S and V in `0..=255`).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let sat = if v == 0 { 0 } else { (255 * diff + v / 2) / v };

    let hue = if diff == 0 {
        0.0
    } else {
        let diff = diff as f32;
        let mut h = if v == r {
            60.0 * (g - b) as f32 / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff
        };
        if h < 0.0 {
            h += 360.0;
        }
        h
    };

    Hsv {
        hue: ((hue / 2.0).round() as u16 % 180) as u8,
        sat: sat as u8,
        val: v as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv::new(0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv::new(60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv::new(120, 255, 255));
    }

    #[test]
    fn test_grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv(0, 0, 0), Hsv::new(0, 0, 0));
        assert_eq!(rgb_to_hsv(128, 128, 128), Hsv::new(0, 0, 128));
        assert_eq!(rgb_to_hsv(255, 255, 255), Hsv::new(0, 0, 255));
    }

    #[test]
    fn test_hue_stays_below_180() {
        // Magenta-red just below 360 degrees must not round up to 180
        let hsv = rgb_to_hsv(255, 0, 1);
        assert!(hsv.hue <= MAX_HUE);
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let filter = HsvFilter::new(Hsv::new(10, 100, 100), Hsv::new(20, 200, 200));
        assert!(filter.contains(Hsv::new(10, 100, 100)));
        assert!(filter.contains(Hsv::new(20, 200, 200)));
        assert!(!filter.contains(Hsv::new(21, 150, 150)));
        assert!(!filter.contains(Hsv::new(15, 99, 150)));
    }

    #[test]
    fn test_average_color() {
        let filter = HsvFilter::new(Hsv::new(10, 100, 0), Hsv::new(20, 201, 255));
        assert_eq!(filter.average_color(), Hsv::new(15, 150, 127));
        assert!(HsvFilter::full_range().contains(Hsv::new(179, 255, 255)));
    }
}
