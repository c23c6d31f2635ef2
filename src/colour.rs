/// A colour, expressed in RGB, CMYK, or grey colour spaces
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Colour {
    /// DeviceRGB colour; r, g, b, range from 0.0 to 1.0
    RGB { r: f32, g: f32, b: f32 },
    /// DeviceCMYK colour; c, m, y, and k range from 0.0 to 1.0
    CMYK { c: f32, m: f32, y: f32, k: f32 },
    /// DeviceGray colour; g ranges from 0.0 to 1.0
    Grey { g: f32 },
}

impl Colour {
    /// Create a new colour in the RGB space. r, g, and b range from 0.0 to 1.0
    pub fn new_rgb(r: f32, g: f32, b: f32) -> Colour {
        Colour::RGB { r, g, b }
    }

    /// Create a new colour in the RGB space. r, g, and b range from 0 to 255
    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour::RGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create a new colour in the Gray space, g ranges from 0.0 to 1.0
    pub fn new_grey(g: f32) -> Colour {
        Colour::Grey { g }
    }

    /// Parse a CSS-style hex colour: `#RRGGBB` or the short `#RGB` form. The leading
    /// `#` is optional. Returns [None] for anything else, including alpha forms.
    pub fn from_hex(hex: &str) -> Option<Colour> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Colour::new_rgb_bytes(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |s: &str| channel(s).map(|v| v * 17);
                Some(Colour::new_rgb_bytes(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }
}

impl<T: Into<f32>> From<(T, T, T)> for Colour {
    fn from(c: (T, T, T)) -> Self {
        Colour::RGB {
            r: c.0.into(),
            g: c.1.into(),
            b: c.2.into(),
        }
    }
}

/// A list of pre-defined colour constants
pub mod colours {
    use super::*;

    pub const BLACK: Colour = Colour::Grey { g: 0.0 };
    pub const WHITE: Colour = Colour::Grey { g: 1.0 };

    /// The brand blue (`#1089ED`) used for catalog and product titles
    pub const BRAND_BLUE: Colour = Colour::RGB {
        r: 0.063,
        g: 0.537,
        b: 0.929,
    };

    /// Body text: captions and price lines
    pub const TEXT: Colour = Colour::RGB {
        r: 0.2,
        g: 0.2,
        b: 0.2,
    };

    /// Secondary text: product descriptions
    pub const MUTED_TEXT: Colour = Colour::RGB {
        r: 0.35,
        g: 0.35,
        b: 0.35,
    };
}
