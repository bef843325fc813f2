/// An 8-bit color stored in TGA channel order: blue, green, red, alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bgra(pub [u8; 4]);

impl Bgra {
    pub const BLACK: Bgra = Bgra([0, 0, 0, 255]);
    pub const WHITE: Bgra = Bgra([255, 255, 255, 255]);

    pub fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self([b, g, r, a])
    }

    /// Builds a color from an `image` crate RGBA texel.
    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        Self([rgba[2], rgba[1], rgba[0], rgba[3]])
    }

    pub fn blue(&self) -> u8 {
        self.0[0]
    }

    pub fn green(&self) -> u8 {
        self.0[1]
    }

    pub fn red(&self) -> u8 {
        self.0[2]
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    /// Red, green, blue triple as stored in a 24-bit RGB image row.
    pub fn to_rgb(self) -> [u8; 3] {
        [self.red(), self.green(), self.blue()]
    }
}

/// Adds the flat ambient term to a lit channel and clamps into `0..=255`.
///
/// `intensity` is the summed diffuse + specular factor. NaN maps to the
/// ambient level so a broken fragment never produces garbage.
#[inline]
pub fn shade_channel(ambient: f64, base: u8, intensity: f64) -> u8 {
    let value = ambient + base as f64 * intensity;
    if value.is_nan() {
        return ambient.clamp(0.0, 255.0) as u8;
    }
    value.clamp(0.0, 255.0) as u8
}
