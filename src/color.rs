// Simple color struct, created from an unsigned 32 representing RRGGBB.
// Alpha is supplied per draw call since every particle and line fades differently.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    // Warm off-white used for both particles and connection lines
    pub const STONE: Color = Color::from_u32(0xF5F5F4);

    pub const fn from_u32(num: u32) -> Color {
        let r = (num >> 16) as u8;
        let g = (num >> 8) as u8;
        let b = num as u8;

        Color { r, g, b }
    }

    pub fn css_rgba(&self, alpha: f64) -> String {
        let alpha = if alpha.is_finite() {
            alpha.max(0.0).min(1.0)
        } else {
            0.0
        };
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_rgb_channels() {
        assert_eq!(
            Color::from_u32(0x102030),
            Color {
                r: 0x10,
                g: 0x20,
                b: 0x30
            }
        );
    }

    #[test]
    fn formats_css_with_clamped_alpha() {
        assert_eq!(Color::STONE.css_rgba(0.25), "rgba(245, 245, 244, 0.25)");
        assert_eq!(Color::STONE.css_rgba(3.0), "rgba(245, 245, 244, 1)");
        assert_eq!(Color::STONE.css_rgba(-1.0), "rgba(245, 245, 244, 0)");
        assert_eq!(Color::STONE.css_rgba(f64::NAN), "rgba(245, 245, 244, 0)");
    }
}
