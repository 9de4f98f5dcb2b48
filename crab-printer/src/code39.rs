//! Code 39 symbol renderer
//!
//! Turns a sanitized text payload into an abstract bar/space sequence.
//! Drawing the elements to a surface (screen raster, ESC/POS raster) is left
//! to the caller; the same [`Symbol`] can be laid out at any [`Density`]
//! without changing the encoded content.
//!
//! Each symbol of the 44-character alphabet is a fixed 12-element pattern.
//! Elements alternate starting with a bar (even positions are bars, odd
//! positions are spaces) and a `1` marks a wide element.

use tracing::{instrument, warn};

/// Start/stop sentinel, brackets every encoded string
pub const SENTINEL: char = '*';

/// Wide elements are this many times the narrow width
pub const WIDE_RATIO: u32 = 3;

/// Number of elements in a single symbol pattern
pub const ELEMENTS_PER_SYMBOL: usize = 12;

const PATTERNS: [(char, &str); 44] = [
    ('0', "101001101101"),
    ('1', "110100101011"),
    ('2', "101100101011"),
    ('3', "110110010101"),
    ('4', "101001101011"),
    ('5', "110100110101"),
    ('6', "101100110101"),
    ('7', "101001011011"),
    ('8', "110100101101"),
    ('9', "101100101101"),
    ('A', "110101001011"),
    ('B', "101101001011"),
    ('C', "110110100101"),
    ('D', "101011001011"),
    ('E', "110101100101"),
    ('F', "101101100101"),
    ('G', "101010011011"),
    ('H', "110101001101"),
    ('I', "101101001101"),
    ('J', "101011001101"),
    ('K', "110101010011"),
    ('L', "101101010011"),
    ('M', "110110101001"),
    ('N', "101011010011"),
    ('O', "110101101001"),
    ('P', "101101101001"),
    ('Q', "101010110011"),
    ('R', "110101011001"),
    ('S', "101101011001"),
    ('T', "101011011001"),
    ('U', "110010101011"),
    ('V', "100110101011"),
    ('W', "110011010101"),
    ('X', "100101101011"),
    ('Y', "110010110101"),
    ('Z', "100110110101"),
    ('-', "100101011011"),
    ('.', "110010101101"),
    (' ', "100110101101"),
    ('$', "100100100101"),
    ('/', "100100101001"),
    ('+', "100101001001"),
    ('%', "101001001001"),
    ('*', "100101101101"),
];

/// Look up the 12-element pattern of a character (`None` if unmapped)
pub fn pattern(c: char) -> Option<&'static str> {
    PATTERNS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, pattern)| *pattern)
}

/// Whether a character belongs to the Code 39 alphabet
pub fn is_encodable(c: char) -> bool {
    pattern(c).is_some()
}

/// One abstract bar or space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub is_bar: bool,
    pub is_wide: bool,
}

/// Element widths and quiet margin, in dots or pixels
///
/// Only pixel widths scale between densities; the element sequence is fixed
/// by the encoded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    narrow: u32,
    quiet: u32,
}

impl Density {
    /// On-screen preview
    pub const SCREEN: Density = Density {
        narrow: 2,
        quiet: 10,
    };

    /// Physical print (thicker modules, bigger quiet zone)
    pub const PRINT: Density = Density {
        narrow: 3,
        quiet: 20,
    };

    /// `narrow` is clamped to at least one dot
    pub fn new(narrow: u32, quiet: u32) -> Self {
        Self {
            narrow: narrow.max(1),
            quiet,
        }
    }

    /// Width of a narrow element
    pub fn narrow(&self) -> u32 {
        self.narrow
    }

    pub fn wide(&self) -> u32 {
        self.narrow.saturating_mul(WIDE_RATIO)
    }

    /// Blank margin before the first and after the last element
    pub fn quiet(&self) -> u32 {
        self.quiet
    }

    fn width_of(&self, element: &Element) -> u32 {
        if element.is_wide {
            self.wide()
        } else {
            self.narrow
        }
    }
}

impl Default for Density {
    fn default() -> Self {
        Self::SCREEN
    }
}

/// A laid-out element: bar or space and its width at a given density
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bar {
    pub is_bar: bool,
    pub width: u32,
}

/// An encoded Code 39 string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    content: String,
    elements: Vec<Element>,
    skipped: Vec<char>,
}

impl Symbol {
    /// Encode text as `*TEXT*`
    ///
    /// Text is uppercased. Characters without a pattern are skipped and
    /// reported through [`Symbol::skipped`]; the render never fails.
    /// Each symbol is followed by one narrow inter-character space, up to and
    /// including the stop sentinel.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn encode(text: &str) -> Self {
        let content = format!("{SENTINEL}{}{SENTINEL}", text.to_uppercase());
        let mut elements = Vec::with_capacity(content.len() * (ELEMENTS_PER_SYMBOL + 1));
        let mut skipped = Vec::new();

        for c in content.chars() {
            let Some(modules) = pattern(c) else {
                skipped.push(c);
                continue;
            };
            for (i, module) in modules.bytes().enumerate() {
                elements.push(Element {
                    is_bar: i % 2 == 0,
                    is_wide: module == b'1',
                });
            }
            // Inter-character gap
            elements.push(Element {
                is_bar: false,
                is_wide: false,
            });
        }

        if !skipped.is_empty() {
            warn!(skipped = ?skipped, "unmapped characters omitted from barcode");
        }

        Self {
            content,
            elements,
            skipped,
        }
    }

    /// The bracketed, uppercased content (including any skipped characters)
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Characters that had no pattern and were left out
    pub fn skipped(&self) -> &[char] {
        &self.skipped
    }

    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Lay the elements out at a density
    pub fn layout(&self, density: Density) -> Layout {
        let bars = self
            .elements
            .iter()
            .map(|e| Bar {
                is_bar: e.is_bar,
                width: density.width_of(e),
            })
            .collect();
        Layout { bars, density }
    }
}

/// Elements with concrete widths, framed by the quiet margin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    bars: Vec<Bar>,
    density: Density,
}

impl Layout {
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn density(&self) -> Density {
        self.density
    }

    /// Width of the element run, without margins
    pub fn content_width(&self) -> u32 {
        self.bars.iter().map(|b| b.width).sum()
    }

    /// Total width including both quiet margins
    pub fn total_width(&self) -> u32 {
        self.content_width() + self.density.quiet * 2
    }

    /// Expand the layout into one row of dots (`true` = black), margins included
    pub fn to_row(&self) -> Vec<bool> {
        let mut row = Vec::with_capacity(self.total_width() as usize);
        row.resize(self.density.quiet as usize, false);
        for bar in &self.bars {
            row.extend(std::iter::repeat_n(bar.is_bar, bar.width as usize));
        }
        row.resize(row.len() + self.density.quiet as usize, false);
        row
    }
}

/// Render a layout as a grayscale image (black bars on white)
#[cfg(feature = "image")]
pub fn to_image(layout: &Layout, height: u32) -> image::GrayImage {
    let row = layout.to_row();
    let width = row.len() as u32;
    image::GrayImage::from_fn(width, height.max(1), |x, _| {
        if row[x as usize] {
            image::Luma([0u8])
        } else {
            image::Luma([255u8])
        }
    })
}
