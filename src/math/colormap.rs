use std::fmt;
use std::str::FromStr;

use crate::error::PlotError;

pub type Rgb = [f32; 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colormap {
    Autumn,
    Bone,
    Cool,
    Copper,
    Greys,
    Hsv,
    Hot,
    Jet,
    Rainbow,
    RainbowSoft,
    Spring,
    Summer,
    Winter,
    Solid(SolidColor),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolidColor {
    Black,
    Blue,
    Cyan,
    Fuchsia,
    Green,
    Red,
    White,
    Yellow,
}

const JET: &[Rgb] = &[
    [0.0, 0.0, 0.5],
    [0.0, 0.0, 1.0],
    [0.0, 0.5, 1.0],
    [0.0, 1.0, 1.0],
    [0.5, 1.0, 0.5],
    [1.0, 1.0, 0.0],
    [1.0, 0.5, 0.0],
    [1.0, 0.0, 0.0],
    [0.5, 0.0, 0.0],
];

const HOT: &[Rgb] = &[
    [0.0, 0.0, 0.0],
    [0.3, 0.0, 0.0],
    [0.6, 0.0, 0.0],
    [0.9, 0.0, 0.0],
    [0.93, 0.27, 0.0],
    [0.97, 0.55, 0.0],
    [1.0, 0.82, 0.0],
    [1.0, 0.87, 0.25],
    [1.0, 0.91, 0.5],
    [1.0, 0.96, 0.75],
    [1.0, 1.0, 1.0],
];

const BONE: &[Rgb] = &[
    [0.0, 0.0, 0.0],
    [0.08, 0.08, 0.11],
    [0.16, 0.16, 0.23],
    [0.25, 0.25, 0.34],
    [0.33, 0.33, 0.45],
    [0.41, 0.44, 0.54],
    [0.5, 0.56, 0.62],
    [0.58, 0.67, 0.7],
    [0.66, 0.78, 0.78],
    [0.83, 0.89, 0.89],
    [1.0, 1.0, 1.0],
];

const HSV: &[Rgb] = &[
    [1.0, 0.0, 0.0],
    [1.0, 0.5, 0.0],
    [0.97, 1.0, 0.01],
    [0.0, 0.99, 0.04],
    [0.0, 0.98, 0.52],
    [0.0, 0.98, 1.0],
    [0.01, 0.49, 1.0],
    [0.03, 0.0, 0.99],
    [1.0, 0.0, 0.96],
    [1.0, 0.0, 0.49],
    [1.0, 0.0, 0.02],
];

const RAINBOW: &[Rgb] = &[
    [0.5, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.5, 0.0],
    [1.0, 0.0, 0.0],
];

const RAINBOW_SOFT: &[Rgb] = &[
    [0.49, 0.0, 0.7],
    [0.45, 0.0, 0.85],
    [0.42, 0.15, 0.89],
    [0.38, 0.29, 0.93],
    [0.27, 0.57, 0.91],
    [0.0, 0.8, 0.77],
    [0.0, 0.95, 0.55],
    [0.38, 1.0, 0.34],
    [0.86, 1.0, 0.27],
    [1.0, 0.75, 0.0],
    [1.0, 0.47, 0.0],
    [1.0, 0.25, 0.0],
];

const COOL: &[Rgb] = &[[0.0, 1.0, 1.0], [1.0, 0.0, 1.0]];
const COPPER: &[Rgb] = &[[0.0, 0.0, 0.0], [1.0, 0.78, 0.5]];
const GREYS: &[Rgb] = &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
const AUTUMN: &[Rgb] = &[[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
const SPRING: &[Rgb] = &[[1.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
const SUMMER: &[Rgb] = &[[0.0, 0.5, 0.4], [1.0, 1.0, 0.4]];
const WINTER: &[Rgb] = &[[0.0, 0.0, 1.0], [0.0, 1.0, 0.5]];

impl SolidColor {
    pub const ALL: [SolidColor; 8] = [
        SolidColor::Black,
        SolidColor::Blue,
        SolidColor::Cyan,
        SolidColor::Fuchsia,
        SolidColor::Green,
        SolidColor::Red,
        SolidColor::White,
        SolidColor::Yellow,
    ];

    pub fn rgb(self) -> Rgb {
        match self {
            SolidColor::Black => [0.0, 0.0, 0.0],
            SolidColor::Blue => [0.0, 0.0, 1.0],
            SolidColor::Cyan => [0.0, 1.0, 1.0],
            SolidColor::Fuchsia => [1.0, 0.0, 1.0],
            SolidColor::Green => [0.0, 0.5, 0.0],
            SolidColor::Red => [1.0, 0.0, 0.0],
            SolidColor::White => [1.0, 1.0, 1.0],
            SolidColor::Yellow => [1.0, 1.0, 0.0],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolidColor::Black => "black",
            SolidColor::Blue => "blue",
            SolidColor::Cyan => "cyan",
            SolidColor::Fuchsia => "fuchsia",
            SolidColor::Green => "green",
            SolidColor::Red => "red",
            SolidColor::White => "white",
            SolidColor::Yellow => "yellow",
        }
    }
}

impl FromStr for SolidColor {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolidColor::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| PlotError::UnknownColormap(s.to_string()))
    }
}

impl fmt::Display for SolidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Colormap {
    pub const GRADIENTS: [Colormap; 13] = [
        Colormap::Autumn,
        Colormap::Bone,
        Colormap::Cool,
        Colormap::Copper,
        Colormap::Greys,
        Colormap::Hsv,
        Colormap::Hot,
        Colormap::Jet,
        Colormap::Rainbow,
        Colormap::RainbowSoft,
        Colormap::Spring,
        Colormap::Summer,
        Colormap::Winter,
    ];

    /// Every colormap the panel offers: gradients first, then the solid colors.
    pub fn all() -> impl Iterator<Item = Colormap> {
        Self::GRADIENTS
            .into_iter()
            .chain(SolidColor::ALL.into_iter().map(Colormap::Solid))
    }

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Autumn => "autumn",
            Colormap::Bone => "bone",
            Colormap::Cool => "cool",
            Colormap::Copper => "copper",
            Colormap::Greys => "greys",
            Colormap::Hsv => "hsv",
            Colormap::Hot => "hot",
            Colormap::Jet => "jet",
            Colormap::Rainbow => "rainbow",
            Colormap::RainbowSoft => "rainbow_soft",
            Colormap::Spring => "spring",
            Colormap::Summer => "summer",
            Colormap::Winter => "winter",
            Colormap::Solid(c) => c.name(),
        }
    }

    /// Evenly spaced color stops. Solid colors are a two-stop constant ramp.
    pub fn stops(self) -> ColorStops {
        match self {
            Colormap::Autumn => ColorStops::Table(AUTUMN),
            Colormap::Bone => ColorStops::Table(BONE),
            Colormap::Cool => ColorStops::Table(COOL),
            Colormap::Copper => ColorStops::Table(COPPER),
            Colormap::Greys => ColorStops::Table(GREYS),
            Colormap::Hsv => ColorStops::Table(HSV),
            Colormap::Hot => ColorStops::Table(HOT),
            Colormap::Jet => ColorStops::Table(JET),
            Colormap::Rainbow => ColorStops::Table(RAINBOW),
            Colormap::RainbowSoft => ColorStops::Table(RAINBOW_SOFT),
            Colormap::Spring => ColorStops::Table(SPRING),
            Colormap::Summer => ColorStops::Table(SUMMER),
            Colormap::Winter => ColorStops::Table(WINTER),
            Colormap::Solid(c) => ColorStops::Constant(c.rgb()),
        }
    }
}

impl FromStr for Colormap {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colormap::all()
            .find(|c| c.name() == s)
            .ok_or_else(|| PlotError::UnknownColormap(s.to_string()))
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ColorStops {
    Table(&'static [Rgb]),
    Constant(Rgb),
}

impl ColorStops {
    /// Maps `t` in `[0, 1]` to a color. Values outside the range are clamped.
    pub fn sample(&self, t: f32) -> Rgb {
        let table = match self {
            ColorStops::Table(table) => *table,
            ColorStops::Constant(c) => return *c,
        };

        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if t >= 1.0 {
            return table[table.len() - 1];
        }
        let segments = (table.len() - 1) as f32;
        let pos = t * segments;
        let lo = (pos.floor() as usize).min(table.len() - 2);
        let frac = pos - lo as f32;

        let a = table[lo];
        let b = table[lo + 1];
        [
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        ]
    }
}

#[cfg(test)]
impl ColorStops {
    pub fn first(&self) -> Rgb {
        match self {
            ColorStops::Table(t) => t[0],
            ColorStops::Constant(c) => *c,
        }
    }

    pub fn last(&self) -> Rgb {
        match self {
            ColorStops::Table(t) => t[t.len() - 1],
            ColorStops::Constant(c) => *c,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColorStops::Table(t) => t.len(),
            ColorStops::Constant(_) => 2,
        }
    }

    /// Per-channel lower and upper bound over all stops.
    pub fn channel_bounds(&self) -> (Rgb, Rgb) {
        let table: &[Rgb] = match self {
            ColorStops::Table(table) => table,
            ColorStops::Constant(c) => std::slice::from_ref(c),
        };

        let mut lo = [f32::MAX; 3];
        let mut hi = [f32::MIN; 3];
        for stop in table {
            for k in 0..3 {
                lo[k] = lo[k].min(stop[k]);
                hi[k] = hi[k].max(stop[k]);
            }
        }
        (lo, hi)
    }
}
