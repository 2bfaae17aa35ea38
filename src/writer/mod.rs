//! PDF writing for composed slip documents.
//!
//! ## Architecture
//!
//! ```text
//! CompositionPlan
//!     ↓
//! [ContentStreamBuilder] (placements → content stream bytes)
//!     ↓
//! [PdfWriter] (pages, resources, Info, xref)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```
//! use voter_slip::writer::{ContentStreamBuilder, OutputFont, PdfWriter, Resources};
//!
//! let mut writer = PdfWriter::new();
//! let mut font = OutputFont::new(None).unwrap();
//! let font_ref = writer.reserve_id();
//!
//! let mut content = ContentStreamBuilder::new();
//! content.begin_text().set_font("F1", 12.0);
//! font.show_text(&mut content, "Hello", 72.0, 720.0, 12.0);
//! content.end_text();
//!
//! font.write(&mut writer, font_ref);
//! let mut resources = Resources::new();
//! resources.add_font("F1", font_ref);
//! writer.add_page(612.0, 792.0, content.build(), resources);
//!
//! let bytes = writer.finish().unwrap();
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! ```

mod content_stream;
mod font_manager;
mod image_handler;
mod object_serializer;
mod pdf_writer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp, TextArrayItem};
pub use font_manager::{
    EmbeddedFont, FontMetrics, FontResource, GlyphRun, Helvetica, OutputFont, ShapedGlyph, Shaper,
};
pub use image_handler::{is_jpeg, is_png, ColorSpace, ImageData, ImageFormat};
pub use object_serializer::{format_real, ObjectSerializer};
pub use pdf_writer::{PdfWriter, PdfWriterConfig, Resources};
