use catalog::poi::Category;

pub const MARKER_SIZE_PX: u32 = 32;
pub const ACTIVE_MARKER_SIZE_PX: u32 = 40;

/// Display color and icon for one category.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CategoryStyle {
    /// `#rrggbb`.
    pub color_hex: &'static str,
    /// Icon name from the lucide set.
    pub icon: &'static str,
}

impl CategoryStyle {
    pub const fn new(color_hex: &'static str, icon: &'static str) -> Self {
        Self { color_hex, icon }
    }

    /// Color as linear `[r, g, b, a]` in 0..=1. Malformed hex yields opaque grey.
    pub fn rgba(&self) -> [f32; 4] {
        parse_hex(self.color_hex).unwrap_or([0.5, 0.5, 0.5, 1.0])
    }
}

pub fn category_style(category: Category) -> CategoryStyle {
    match category {
        Category::Landmark => CategoryStyle::new("#f59e0b", "Camera"),
        Category::Cafe => CategoryStyle::new("#8b5cf6", "Coffee"),
        Category::Shopping | Category::Grocery => CategoryStyle::new("#ec4899", "ShoppingBag"),
        Category::Restaurant | Category::RestaurantBar => {
            CategoryStyle::new("#10b981", "Utensils")
        }
        Category::Entertainment => CategoryStyle::new("#3b82f6", "Music"),
        Category::Other => CategoryStyle::new("#6b7280", "MapPin"),
    }
}

fn parse_hex(hex: &str) -> Option<[f32; 4]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(digits.get(i..i + 2)?, 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?, 1.0])
}

/// Resolved marker appearance for one POI.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub category: CategoryStyle,
    pub size_px: u32,
    pub bounce: bool,
    /// Pixel offset of the icon tip from its top-left corner.
    pub icon_anchor: [u32; 2],
    /// Popup offset relative to the icon anchor.
    pub popup_anchor: [i32; 2],
}

impl MarkerStyle {
    pub fn new(category: Category, active: bool) -> Self {
        let size_px = if active {
            ACTIVE_MARKER_SIZE_PX
        } else {
            MARKER_SIZE_PX
        };
        Self {
            category: category_style(category),
            size_px,
            bounce: active,
            icon_anchor: [size_px / 2, size_px],
            popup_anchor: [0, -(size_px as i32)],
        }
    }
}
