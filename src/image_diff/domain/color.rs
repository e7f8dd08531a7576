#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
/// Anything else falls back to the default highlight color.
pub fn parse_hex_color(hex_str: &str) -> Color {
    let hex = hex_str.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range).and_then(|s| u8::from_str_radix(s, 16).ok())
    };

    let parsed = match hex.len() {
        6 => match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => Some(Color::new(r, g, b, 255)),
            _ => None,
        },
        8 => match (channel(0..2), channel(2..4), channel(4..6), channel(6..8)) {
            (Some(r), Some(g), Some(b), Some(a)) => Some(Color::new(r, g, b, a)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_default()
}
