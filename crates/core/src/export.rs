//! Printable page templates, export filenames and report links.
//!
//! Every export renders the same A4 landscape template: the Japanese text,
//! the English text in a large face, and the brand label as footer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::phrase::PhraseEntry;

/// A4 landscape at 96 dpi, in CSS pixels.
pub const A4_LANDSCAPE_PX: (u32, u32) = (1123, 794);

/// Device scale used when rasterising a page.
pub const RASTER_SCALE: f64 = 2.0;

/// Texts longer than this many characters get the smaller fullscreen face.
const FULLSCREEN_LONG_TEXT: usize = 10;

/// The `{jp, en}` projection that gets printed or exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PrintPage {
    pub jp: String,
    pub en: String,
}

impl From<&PhraseEntry> for PrintPage {
    fn from(entry: &PhraseEntry) -> Self {
        Self { jp: entry.jp.clone(), en: entry.en.clone() }
    }
}

/// Font sizes of the fullscreen overlay, in vmin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Fullscreen {
    pub jp: String,
    pub en: String,
    pub jp_vmin: u32,
    pub en_vmin: u32,
}

impl Fullscreen {
    pub fn new(page: &PrintPage) -> Self {
        Self { jp: page.jp.clone(), en: page.en.clone(), jp_vmin: font_vmin(&page.jp), en_vmin: font_vmin(&page.en) }
    }
}

fn font_vmin(text: &str) -> u32 {
    if text.chars().count() > FULLSCREEN_LONG_TEXT { 8 } else { 12 }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One A4 landscape page section.
pub fn page_section(page: &PrintPage, brand_label: &str) -> String {
    format!(
        r#"<section class="a4-page">
  <div class="a4-card">
    <div class="jp">{jp}</div>
    <div class="en">{en}</div>
    <div class="brand">{brand}</div>
  </div>
</section>"#,
        jp = escape_html(&page.jp),
        en = escape_html(&page.en),
        brand = escape_html(brand_label),
    )
}

const PAGE_STYLE: &str = r#"* { box-sizing: border-box; }
html, body { margin: 0; padding: 0; }
@page { size: A4 landscape; margin: 0; }
.a4-page {
  width: 297mm; height: 210mm; padding: 20mm;
  display: flex; flex-direction: column; justify-content: center; align-items: center;
  text-align: center; background: white; page-break-after: always; page-break-inside: avoid;
  font-family: -apple-system, BlinkMacSystemFont, 'Noto Sans JP', 'Hiragino Sans', sans-serif;
}
.a4-page:last-child { page-break-after: avoid; }
.a4-card { width: 100%; padding: 40px 30px; border-radius: 20px; }
.jp { font-size: 28pt; font-weight: 600; color: #1a2a3a; margin-bottom: 10px; }
.en { font-size: 56pt; font-weight: 700; color: #1a2a3a; margin-bottom: 10px; line-height: 1.15; }
.brand {
  border-top: 2px solid #f1f2f6; padding-top: 20px; font-size: 10pt; color: #bdc3c7;
  font-weight: bold; letter-spacing: 2px; text-transform: uppercase;
}
.raster { width: 297mm; height: 210mm; page-break-after: always; }
.raster:last-child { page-break-after: avoid; }
.raster img { width: 100%; height: 100%; display: block; }"#;

/// Wrap page sections into a standalone printable document.
pub fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><style>{PAGE_STYLE}</style></head>\n<body>\n{body}\n</body></html>"
    )
}

/// Printable document for a single phrase.
pub fn print_document(page: &PrintPage, brand_label: &str) -> String {
    document(&page_section(page, brand_label))
}

/// Section embedding an already rasterised page image.
pub fn raster_section(png_base64: &str) -> String {
    format!(r#"<section class="raster"><img src="data:image/png;base64,{png_base64}" alt=""></section>"#)
}

fn sanitize_filename_part(part: &str) -> String {
    part.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control() { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// `<brand>_<japaneseText>.png`, with characters unsafe in filenames replaced.
pub fn image_filename(brand: &str, jp: &str) -> String {
    format!("{}_{}.png", sanitize_filename_part(brand), sanitize_filename_part(jp))
}

/// `<brand>_<YYYYMMDD-HHMMSS>.pdf`
pub fn pdf_filename(brand: &str, at: &DateTime<Utc>) -> String {
    format!("{}_{}.pdf", sanitize_filename_part(brand), at.format("%Y%m%d-%H%M%S"))
}

/// Text sent with a phrase report: `jp`, `en` and the optional context, one per line.
pub fn report_summary(entry: &PhraseEntry) -> String {
    match entry.context.as_deref() {
        Some(context) if !context.is_empty() => format!("{}\n{}\n{}", entry.jp, entry.en, context),
        _ => format!("{}\n{}", entry.jp, entry.en),
    }
}

/// Pre-filled report form URL for an entry.
pub fn report_url(form_url: &str, field: &str, entry: &PhraseEntry) -> Result<Url, Error> {
    let mut url = Url::parse(form_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut().append_pair(field, &report_summary(entry));
    Ok(url)
}
