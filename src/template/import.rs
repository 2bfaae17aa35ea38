//! Copies a template's background into an output document as a Form XObject.
//!
//! PDF templates contribute their first page: the decoded content becomes
//! the form's stream and every object reachable from the page resources is
//! copied with fresh ids. Raster templates are wrapped in a form that
//! letterboxes the image inside the canvas. The built-in design is drawn
//! afresh with the document's own font, so that font is embedded once.

use super::builtin;
use super::scanner::{load_document, page_box, page_content, page_ids, page_resources};
use super::{TemplateDescriptor, TemplateKind};
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};
use crate::writer::{ContentStreamBuilder, ImageData, OutputFont, PdfWriter, Resources};
use lopdf::{Document, ObjectId};
use std::collections::HashMap;

/// A template background written into an output document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedTemplate {
    /// The Form XObject
    pub xobject: ObjectRef,
    /// Form width in template units
    pub width: f32,
    /// Form height in template units
    pub height: f32,
}

/// The output document's text font, written later under `id`.
#[derive(Debug)]
pub struct SharedFont<'f, 'a> {
    /// Font drawing slip text
    pub font: &'f mut OutputFont<'a>,
    /// Reserved id of its font dictionary
    pub id: ObjectRef,
    /// Resource name it is selected by
    pub resource: &'f str,
}

/// Write the descriptor's background into `writer`.
///
/// Returns `None` for a blank descriptor. The built-in design draws its
/// labels with `font`.
pub fn import_template(
    descriptor: &TemplateDescriptor,
    writer: &mut PdfWriter,
    font: SharedFont<'_, '_>,
) -> Result<Option<ImportedTemplate>> {
    match descriptor.kind() {
        TemplateKind::Blank => Ok(None),
        TemplateKind::Pdf => import_pdf_page(descriptor.source(), writer).map(Some),
        TemplateKind::Image => import_image(descriptor, writer).map(Some),
        TemplateKind::Builtin => Ok(Some(draw_builtin(descriptor, writer, font))),
    }
}

fn draw_builtin(descriptor: &TemplateDescriptor, writer: &mut PdfWriter, shared: SharedFont<'_, '_>) -> ImportedTemplate {
    let (width, height) = (descriptor.canvas_width(), descriptor.canvas_height());
    let mut content = ContentStreamBuilder::new();
    builtin::draw(&mut content, shared.font, shared.resource);

    let mut resources = Resources::new();
    resources.add_font(shared.resource, shared.id);

    let dict: Dict = [
        ("Type", Object::name("XObject")),
        ("Subtype", Object::name("Form")),
        ("BBox", Object::reals(&[0.0, 0.0, width, height])),
        ("Resources", resources.to_object()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    ImportedTemplate {
        xobject: writer.add_stream(dict, content.build()),
        width,
        height,
    }
}

fn import_pdf_page(bytes: &[u8], writer: &mut PdfWriter) -> Result<ImportedTemplate> {
    let doc = load_document(bytes)?;
    let page_id = page_ids(&doc)[0];
    let [x0, y0, x1, y1] = page_box(&doc, page_id)?;
    let content = page_content(&doc, page_id)?;

    let mut copier = ObjectCopier::new(&doc);
    let resources = match page_resources(&doc, page_id) {
        Some(resources) => copier.copy_dictionary(writer, resources),
        None => Dict::new(),
    };
    log::debug!("imported template page with {} referenced objects", copier.copied());

    let dict: Dict = [
        ("Type", Object::name("XObject")),
        ("Subtype", Object::name("Form")),
        ("BBox", Object::reals(&[x0, y0, x1, y1])),
        ("Matrix", Object::reals(&[1.0, 0.0, 0.0, 1.0, -x0, -y0])),
        ("Resources", Object::Dictionary(resources)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    Ok(ImportedTemplate {
        xobject: writer.add_stream(dict, content),
        width: x1 - x0,
        height: y1 - y0,
    })
}

fn import_image(descriptor: &TemplateDescriptor, writer: &mut PdfWriter) -> Result<ImportedTemplate> {
    let image = ImageData::from_bytes(descriptor.source()).map_err(|e| Error::InvalidTemplate(e.to_string()))?;
    let (width, height) = (descriptor.canvas_width(), descriptor.canvas_height());
    let (fit_w, fit_h) = image.fit_to_box(width, height);

    let image_ref = image.write(writer);
    let mut content = ContentStreamBuilder::new();
    content.draw_xobject("Im0", (width - fit_w) / 2.0, (height - fit_h) / 2.0, fit_w, fit_h);

    let mut resources = Resources::new();
    resources.add_xobject("Im0", image_ref);

    let mut dict = Dict::new();
    dict.insert("Type".to_string(), Object::name("XObject"));
    dict.insert("Subtype".to_string(), Object::name("Form"));
    dict.insert("BBox".to_string(), Object::reals(&[0.0, 0.0, width, height]));
    dict.insert("Resources".to_string(), resources.to_object());

    Ok(ImportedTemplate {
        xobject: writer.add_stream(dict, content.build()),
        width,
        height,
    })
}

/// Deep copy of lopdf objects into a [`PdfWriter`], one new id per source id.
struct ObjectCopier<'a> {
    doc: &'a Document,
    ids: HashMap<ObjectId, ObjectRef>,
}

impl<'a> ObjectCopier<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            ids: HashMap::new(),
        }
    }

    fn copied(&self) -> usize {
        self.ids.len()
    }

    fn copy_dictionary(&mut self, writer: &mut PdfWriter, dict: &lopdf::Dictionary) -> Dict {
        let mut out = Dict::new();
        for (key, value) in dict.iter() {
            // the page tree stays behind; Length is recomputed on write
            if key.as_slice() == b"Parent" || key.as_slice() == b"Length" {
                continue;
            }
            out.insert(String::from_utf8_lossy(key).into_owned(), self.copy(writer, value));
        }
        out
    }

    fn copy(&mut self, writer: &mut PdfWriter, obj: &lopdf::Object) -> Object {
        match obj {
            lopdf::Object::Null => Object::Null,
            lopdf::Object::Boolean(b) => Object::Boolean(*b),
            lopdf::Object::Integer(i) => Object::Integer(*i),
            lopdf::Object::Real(r) => Object::Real(f64::from(*r)),
            lopdf::Object::Name(name) => Object::Name(String::from_utf8_lossy(name).into_owned()),
            lopdf::Object::String(bytes, _) => Object::String(bytes.clone()),
            lopdf::Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy(writer, item)).collect())
            },
            lopdf::Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(writer, dict)),
            lopdf::Object::Stream(stream) => {
                let dict = self.copy_dictionary(writer, &stream.dict);
                Object::stream(dict, stream.content.clone())
            },
            lopdf::Object::Reference(id) => Object::Reference(self.copy_reference(writer, *id)),
        }
    }

    fn copy_reference(&mut self, writer: &mut PdfWriter, id: ObjectId) -> ObjectRef {
        if let Some(existing) = self.ids.get(&id) {
            return *existing;
        }
        let target = writer.reserve_id();
        self.ids.insert(id, target);

        let copied = match self.doc.get_object(id) {
            Ok(obj) => self.copy(writer, obj),
            Err(_) => Object::Null,
        };
        writer.set_object(target, copied);
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AspectRatio;

    /// Import with Helvetica as the document font under a reserved id.
    fn import(descriptor: &TemplateDescriptor, writer: &mut PdfWriter) -> (Option<ImportedTemplate>, ObjectRef) {
        let mut font = OutputFont::new(None).unwrap();
        let id = writer.reserve_id();
        let shared = SharedFont {
            font: &mut font,
            id,
            resource: "F1",
        };
        let imported = import_template(descriptor, writer, shared).unwrap();
        font.write(writer, id);
        (imported, id)
    }

    #[test]
    fn test_blank_imports_nothing() {
        let mut writer = PdfWriter::new();
        let blank = TemplateDescriptor::blank(100.0, 100.0);
        assert!(import(&blank, &mut writer).0.is_none());
    }

    #[test]
    fn test_builtin_draws_with_document_font() {
        let descriptor = TemplateDescriptor::builtin(None).unwrap();
        let mut writer = PdfWriter::with_config(crate::writer::PdfWriterConfig::default().with_compress(false));
        let (imported, font_id) = import(&descriptor, &mut writer);
        let imported = imported.unwrap();
        assert_eq!((imported.width, imported.height), (260.0, 210.0));

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Form"));
        assert!(text.contains(&format!("/Font <</F1 {}>>", font_id)));
        assert!(text.contains("(Voter No:) Tj"));
        assert_eq!(text.matches("/BaseFont /Helvetica").count(), 1);
    }

    #[test]
    fn test_pdf_page_copies_its_resources() {
        let source = TemplateDescriptor::builtin(None).unwrap().source().to_vec();
        let descriptor = TemplateDescriptor::from_bytes(source, AspectRatio::Square).unwrap();
        let mut writer = PdfWriter::new();
        let (imported, _) = import(&descriptor, &mut writer);
        assert_eq!(imported.map(|i| (i.width, i.height)), Some((260.0, 210.0)));

        // the template's own Helvetica plus the document font
        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8_lossy(&bytes).matches("/BaseFont /Helvetica").count(), 2);
    }

    #[test]
    fn test_image_is_letterboxed() {
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([10, 20, 30]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut png, image::ImageOutputFormat::Png)
            .unwrap();
        let descriptor = TemplateDescriptor::from_bytes(png.into_inner(), AspectRatio::Square).unwrap();

        let mut writer = PdfWriter::with_config(crate::writer::PdfWriterConfig::default().with_compress(false));
        let (imported, _) = import(&descriptor, &mut writer);
        let imported = imported.unwrap();
        assert_eq!((imported.width, imported.height), (300.0, 300.0));

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        // 2:1 image in a square canvas: full width, centered vertically
        assert!(text.contains("300 0 0 150 0 75 cm"));
        assert!(text.contains("/Im0 Do"));
    }
}
