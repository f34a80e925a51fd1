use eframe::egui::Color32;

const fn nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

const fn channel(bytes: &[u8], at: usize) -> Option<u8> {
    match (nibble(bytes[at]), nibble(bytes[at + 1])) {
        (Some(high), Some(low)) => Some(high * 16 + low),
        _ => None,
    }
}

/// Parses `#RRGGBB` or `RRGGBB`.
pub const fn parse_hex(hex: &str) -> Option<Color32> {
    let bytes = hex.as_bytes();
    let start = if !bytes.is_empty() && bytes[0] == b'#' { 1 } else { 0 };
    if bytes.len() - start != 6 {
        return None;
    }
    match (
        channel(bytes, start),
        channel(bytes, start + 2),
        channel(bytes, start + 4),
    ) {
        (Some(r), Some(g), Some(b)) => Some(Color32::from_rgb(r, g, b)),
        _ => None,
    }
}

// Only used to build constants, so a bad literal fails the build.
const fn hex(literal: &str) -> Color32 {
    match parse_hex(literal) {
        Some(color) => color,
        None => panic!("malformed colour literal"),
    }
}

/// Dashboard colours, handed to the rendering code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color32,
    pub secondary: Color32,
    pub muted: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub rooms: [Color32; 3],
}

impl Palette {
    pub const DASHBOARD: Palette = Palette {
        primary: hex("#6979F8"),
        secondary: hex("#BE52F2"),
        muted: hex("#969696"),
        success: hex("#10B981"),
        warning: hex("#F59E0B"),
        danger: hex("#EF4444"),
        rooms: [hex("#6979F8"), hex("#BE52F2"), hex("#FF5EDF")],
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::DASHBOARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_or_without_hash() {
        assert_eq!(parse_hex("#10B981"), Some(Color32::from_rgb(16, 185, 129)));
        assert_eq!(parse_hex("ff5edf"), Some(Color32::from_rgb(255, 94, 223)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#GG0000"), None);
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#"), None);
    }

    #[test]
    fn dashboard_palette_is_the_default() {
        assert_eq!(Palette::default(), Palette::DASHBOARD);
        assert_eq!(Palette::DASHBOARD.primary, Color32::from_rgb(105, 121, 248));
        assert_eq!(Palette::DASHBOARD.rooms[2], Color32::from_rgb(255, 94, 223));
    }
}
