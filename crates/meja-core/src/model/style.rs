//! Cell styles and the value types they are built from.
//!
//! Styles are named and shared: a [`StyleRegistry`] is owned jointly by a
//! workbook and all of its sheets, and cells refer to styles by name. The
//! empty name is the default style.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::value::CellType;

/// Name of the default cell style.
pub const DEFAULT_STYLE: &str = "";

/// An RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`, with or without the leading `#`.
    pub fn parse(s: &str) -> Option<Color> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// `0xRRGGBB`, alpha dropped.
    pub fn to_rgb_u32(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub fn to_css(&self) -> String {
        if self.a == 255 {
            self.to_string()
        } else {
            format!(
                "rgba({},{},{},{:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Font attributes. Sizes are in points.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_through: bool,
    pub color: Color,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            family: "Helvetica".to_string(),
            size: 10.0,
            bold: false,
            italic: false,
            underline: false,
            strike_through: false,
            color: Color::BLACK,
        }
    }
}

/// Average glyph width relative to the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.6;
/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

impl Font {
    /// Approximate extent of `text` set in this font, as `(width, height)`.
    ///
    /// Uses a fixed average glyph width; each line of `text` adds one line height.
    pub fn text_dimension(&self, text: &str) -> (f32, f32) {
        let lines = text.lines().count().max(1);
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        (
            widest as f32 * self.size * GLYPH_WIDTH_FACTOR,
            lines as f32 * self.size * LINE_HEIGHT_FACTOR,
        )
    }

    /// Width of a single space.
    pub fn space_width(&self) -> f32 {
        self.size * GLYPH_WIDTH_FACTOR
    }

    pub fn css_style(&self) -> String {
        let mut css = format!(
            "font-family: {}; font-size: {}pt; color: {};",
            css_font_family(&self.family),
            self.size,
            self.color.to_css()
        );
        if self.bold {
            css.push_str(" font-weight: bold;");
        }
        if self.italic {
            css.push_str(" font-style: italic;");
        }
        match (self.underline, self.strike_through) {
            (true, true) => css.push_str(" text-decoration: underline line-through;"),
            (true, false) => css.push_str(" text-decoration: underline;"),
            (false, true) => css.push_str(" text-decoration: line-through;"),
            (false, false) => {}
        }
        css
    }
}

fn css_font_family(family: &str) -> String {
    if family.contains(' ') {
        format!("'{family}'")
    } else {
        family.to_string()
    }
}

/// Horizontal alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HAlign {
    Left,
    Center,
    Right,
    Justify,
    /// Text to the left, everything else to the right.
    #[default]
    Automatic,
}

impl HAlign {
    pub fn css(&self) -> &'static str {
        match self {
            HAlign::Left => "text-align: left;",
            HAlign::Center => "text-align: center;",
            HAlign::Right => "text-align: right;",
            HAlign::Justify => "text-align: justify;",
            HAlign::Automatic => "",
        }
    }

    /// Justified text always wraps.
    pub fn wraps(&self) -> bool {
        matches!(self, HAlign::Justify)
    }
}

/// Vertical alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
    Justify,
    Distributed,
}

impl VAlign {
    pub fn css(&self) -> &'static str {
        match self {
            VAlign::Top => "vertical-align: top;",
            VAlign::Middle => "vertical-align: middle;",
            VAlign::Bottom => "vertical-align: bottom;",
            VAlign::Justify | VAlign::Distributed => "vertical-align: middle;",
        }
    }

    pub fn wraps(&self) -> bool {
        matches!(self, VAlign::Justify | VAlign::Distributed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
}

/// One side of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn inverse(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub fn css_name(&self) -> &'static str {
        match self {
            Direction::North => "top",
            Direction::East => "right",
            Direction::South => "bottom",
            Direction::West => "left",
        }
    }

    fn index(&self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

/// A border line. Width is in points; zero width means no border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderStyle {
    pub width: f32,
    pub color: Color,
}

impl BorderStyle {
    pub const NONE: BorderStyle = BorderStyle {
        width: 0.0,
        color: Color::BLACK,
    };

    pub fn new(width: f32, color: Color) -> Self {
        BorderStyle { width, color }
    }

    pub fn is_none(&self) -> bool {
        self.width <= 0.0
    }

    pub fn css(&self) -> String {
        if self.is_none() {
            "none".to_string()
        } else {
            format!("{}pt solid {}", self.width, self.color.to_css())
        }
    }
}

impl Default for BorderStyle {
    fn default() -> Self {
        BorderStyle::NONE
    }
}

/// Formatting attributes of a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellStyle {
    pub font: Font,
    pub fill_bg_color: Color,
    pub fill_fg_color: Color,
    pub fill_pattern: FillPattern,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub(crate) borders: [BorderStyle; 4],
    pub wrap: bool,
    /// Number or date pattern; empty means the locale default.
    pub data_format: String,
    /// Text rotation in degrees, counter-clockwise.
    pub rotation: i16,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            font: Font::default(),
            fill_bg_color: Color::WHITE,
            fill_fg_color: Color::BLACK,
            fill_pattern: FillPattern::None,
            h_align: HAlign::Automatic,
            v_align: VAlign::Middle,
            borders: [BorderStyle::NONE; 4],
            wrap: false,
            data_format: String::new(),
            rotation: 0,
        }
    }
}

impl CellStyle {
    pub fn border(&self, direction: Direction) -> BorderStyle {
        self.borders[direction.index()]
    }

    pub fn set_border(&mut self, direction: Direction, border: BorderStyle) {
        self.borders[direction.index()] = border;
    }

    pub fn set_borders(&mut self, border: BorderStyle) {
        self.borders = [border; 4];
    }

    pub fn copy_style(&mut self, other: &CellStyle) {
        self.clone_from(other);
    }

    /// Resolve [`HAlign::Automatic`] for content of the given type.
    pub fn effective_h_align(&self, cell_type: CellType) -> HAlign {
        match self.h_align {
            HAlign::Automatic => match cell_type {
                CellType::Text | CellType::Blank => HAlign::Left,
                _ => HAlign::Right,
            },
            other => other,
        }
    }

    /// Whether text wraps, either explicitly or because the alignment demands it.
    pub fn effective_wrap(&self) -> bool {
        self.wrap || self.h_align.wraps() || self.v_align.wraps()
    }
}

/// Named styles shared by a workbook and its sheets.
#[derive(Debug)]
pub struct StyleRegistry {
    styles: RwLock<BTreeMap<String, Arc<CellStyle>>>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(DEFAULT_STYLE.to_string(), Arc::new(CellStyle::default()));
        StyleRegistry {
            styles: RwLock::new(styles),
        }
    }
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a style, creating it from defaults when unknown.
    pub fn get(&self, name: &str) -> Arc<CellStyle> {
        if let Some(style) = self.styles.read().get(name) {
            return Arc::clone(style);
        }
        let mut styles = self.styles.write();
        Arc::clone(
            styles
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(CellStyle::default())),
        )
    }

    pub fn default_style(&self) -> Arc<CellStyle> {
        self.get(DEFAULT_STYLE)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.read().contains_key(name)
    }

    /// Style names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.styles.read().keys().cloned().collect()
    }

    /// Modify a style in place. Cells holding an `Arc` to the old style keep it.
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut CellStyle) -> R) -> R {
        let mut styles = self.styles.write();
        let entry = styles
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CellStyle::default()));
        f(Arc::make_mut(entry))
    }

    /// Replace the named style with a copy of `style`.
    pub fn copy_style(&self, name: &str, style: &CellStyle) {
        self.styles
            .write()
            .insert(name.to_string(), Arc::new(style.clone()));
    }

    /// Copy every style of `other` into this registry.
    pub fn copy_from(&self, other: &StyleRegistry) {
        if std::ptr::eq(self, other) {
            return;
        }
        let source: Vec<(String, Arc<CellStyle>)> = other
            .styles
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        let mut styles = self.styles.write();
        for (name, style) in source {
            styles.insert(name, Arc::new(style.as_ref().clone()));
        }
    }
}
