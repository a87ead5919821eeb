//! Minimal PDF drawing on top of `lopdf`.
//!
//! Pages are US Letter with the two standard Helvetica faces. Text is
//! measured with the built-in AFM advance widths so layouts can wrap and
//! center without embedding fonts. Content streams are left uncompressed.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::PdfError;

/// US Letter width in points.
pub const PAGE_WIDTH: f32 = 612.0;

/// US Letter height in points.
pub const PAGE_HEIGHT: f32 = 792.0;

/// Advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Width used for characters outside the table.
const DEFAULT_WIDTH: u16 = 556;

/// One of the two standard faces used on receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
        }
    }

    const fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }

    fn char_width(self, c: char) -> u16 {
        let table = match self {
            Self::Regular => &HELVETICA_WIDTHS,
            Self::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        u32::from(c)
            .checked_sub(32)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| table.get(i))
            .copied()
            .unwrap_or(DEFAULT_WIDTH)
    }

    /// Rendered width of `text` at `size` points.
    #[must_use]
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        // Widths are small integers; f32 represents them exactly.
        #[allow(clippy::cast_precision_loss)]
        let units = units as f32;
        units * size / 1000.0
    }
}

/// RGB fill color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Self = Self(0.0, 0.0, 0.0);
    pub const GREY: Self = Self(0.4, 0.4, 0.4);
}

/// Font, size and color for a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    #[must_use]
    pub const fn regular(size: f32) -> Self {
        Self {
            font: Font::Regular,
            size,
            color: Color::BLACK,
        }
    }

    #[must_use]
    pub const fn bold(size: f32) -> Self {
        Self {
            font: Font::Bold,
            size,
            color: Color::BLACK,
        }
    }

    #[must_use]
    pub const fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    #[must_use]
    pub fn width(&self, text: &str) -> f32 {
        self.font.text_width(text, self.size)
    }
}

/// Encode text for a WinAnsi Type1 font. Latin-1 maps directly; anything
/// else becomes `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap to `max_width`. A single word wider than the limit
/// gets a line of its own.
#[must_use]
pub fn wrap_text(text: &str, style: &TextStyle, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };

        if style.width(&candidate) > max_width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// =============================================================================
// PdfBuilder
// =============================================================================

/// Accumulates drawing operations page by page.
#[derive(Debug)]
pub struct PdfBuilder {
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    /// A document with one empty page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Start a new page; subsequent drawing goes there.
    pub fn add_page(&mut self) {
        self.finished.push(std::mem::take(&mut self.current));
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    /// Draw a single line of text with its baseline at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, style: &TextStyle, text: &str) {
        let Color(r, g, b) = style.color;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(style.font.resource_name().to_vec()),
                    style.size.into(),
                ],
            ),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Stroke a straight line.
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32) {
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![thickness.into()]),
            Operation::new("m", vec![from.0.into(), from.1.into()]),
            Operation::new("l", vec![to.0.into(), to.1.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Stroke a rectangle with its lower-left corner at `(x, y)`.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, thickness: f32) {
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![thickness.into()]),
            Operation::new(
                "re",
                vec![x.into(), y.into(), width.into(), height.into()],
            ),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Assemble and serialize the document.
    ///
    /// # Errors
    ///
    /// Returns `PdfError` if a content stream cannot be encoded or the
    /// document cannot be written.
    pub fn finish(mut self) -> Result<Vec<u8>, PdfError> {
        self.add_page();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.finished.len());
        for operations in self.finished {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

// =============================================================================
// Layout
// =============================================================================

/// A top-down cursor over a [`PdfBuilder`] that starts new pages when the
/// cursor drops below the bottom margin.
#[derive(Debug)]
pub struct Layout {
    pdf: PdfBuilder,
    x: f32,
    y: f32,
    top: f32,
    bottom: f32,
    continuation: Option<&'static str>,
}

impl Layout {
    /// Left margin `x`, first baseline `top`, page break below `bottom`.
    #[must_use]
    pub fn new(x: f32, top: f32, bottom: f32) -> Self {
        Self {
            pdf: PdfBuilder::new(),
            x,
            y: top,
            top,
            bottom,
            continuation: None,
        }
    }

    /// Text written at the foot of a page before breaking to the next.
    #[must_use]
    pub const fn with_continuation(mut self, note: &'static str) -> Self {
        self.continuation = Some(note);
        self
    }

    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Usable width between the side margins.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        2.0f32.mul_add(-self.x, PAGE_WIDTH)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pdf.page_count()
    }

    /// Move the cursor down.
    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Break to a new page if fewer than `height` points remain.
    pub fn ensure(&mut self, height: f32) {
        if self.y - height < self.bottom {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        if let Some(note) = self.continuation {
            let style = TextStyle::regular(10.0);
            self.pdf.text(self.x, 60.0, &style, note);
            self.pdf
                .line((self.x, 50.0), (PAGE_WIDTH - self.x, 50.0), 1.0);
        }
        self.pdf.add_page();
        self.y = self.top;
    }

    /// Draw one line at the cursor, then move down by `advance`.
    pub fn text(&mut self, text: &str, style: &TextStyle, advance: f32) {
        self.ensure(0.0);
        self.pdf.text(self.x, self.y, style, text);
        self.y -= advance;
    }

    /// Word-wrap to `max_width`, drawing each line `leading` points apart.
    pub fn paragraph(&mut self, text: &str, style: &TextStyle, max_width: f32, leading: f32) {
        for line in wrap_text(text, style, max_width) {
            self.text(&line, style, leading);
        }
    }

    /// Horizontal rule across the content width at the cursor.
    pub fn rule(&mut self, thickness: f32) {
        self.ensure(0.0);
        self.pdf
            .line((self.x, self.y), (PAGE_WIDTH - self.x, self.y), thickness);
    }

    /// Centered text inside a stroked box, baseline at the cursor.
    pub fn boxed_center(&mut self, text: &str, style: &TextStyle, padding: f32, height: f32) {
        self.ensure(height);
        let width = style.width(text);
        let x = (PAGE_WIDTH - width) / 2.0;
        self.pdf
            .rect(x - padding, self.y - 10.0, 2.0f32.mul_add(padding, width), height, 2.0);
        self.pdf.text(x, self.y, style, text);
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns `PdfError` if the document cannot be written.
    pub fn finish(self) -> Result<Vec<u8>, PdfError> {
        self.pdf.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_uses_afm_metrics() {
        // "Hi" = H(722) + i(222)
        let w = Font::Regular.text_width("Hi", 10.0);
        assert!((w - 9.44).abs() < 0.001);
        // Bold i is wider
        assert!(Font::Bold.text_width("i", 10.0) > Font::Regular.text_width("i", 10.0));
        // Non-ASCII falls back to the default width
        assert!((Font::Regular.text_width("é", 1000.0) - 556.0).abs() < 0.001);
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let style = TextStyle::regular(9.0);
        let text = "No goods or services were provided in exchange for this contribution. \
                    Please retain this receipt for your tax records.";
        let lines = wrap_text(text, &style, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(style.width(line) <= 200.0, "too wide: {line}");
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_wrap_text_long_word_alone() {
        let style = TextStyle::regular(12.0);
        let lines = wrap_text("a Supercalifragilisticexpialidocious b", &style, 50.0);
        assert_eq!(lines, vec!["a", "Supercalifragilisticexpialidocious", "b"]);
        assert!(wrap_text("   ", &style, 50.0).is_empty());
    }

    #[test]
    fn test_encode_text_latin1() {
        assert_eq!(encode_text("Café"), b"Caf\xe9".to_vec());
        assert_eq!(encode_text("日本"), b"??".to_vec());
    }

    #[test]
    fn test_builder_produces_loadable_pdf() {
        let mut pdf = PdfBuilder::new();
        pdf.text(50.0, 742.0, &TextStyle::bold(24.0), "Hello Receipt");
        pdf.add_page();
        pdf.line((50.0, 700.0), (562.0, 700.0), 2.0);
        let bytes = pdf.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert!(bytes.windows(13).any(|w| w == b"Hello Receipt"));
    }

    #[test]
    fn test_layout_breaks_pages_with_continuation() {
        let mut layout = Layout::new(60.0, 740.0, 120.0).with_continuation("Continued on next page...");
        for i in 0..60 {
            layout.text(&format!("line {i}"), &TextStyle::regular(10.0), 20.0);
        }
        assert!(layout.page_count() >= 2);
        let bytes = layout.finish().unwrap();
        assert!(bytes.windows(25).any(|w| w == b"Continued on next page..."));
    }
}
