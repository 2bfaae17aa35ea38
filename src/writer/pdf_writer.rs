//! PDF document writer.
//!
//! Assembles complete PDF documents with proper structure:
//! header, body, xref table, and trailer. Objects may be added in any
//! order; ids are handed out on insertion or reserved up front so that
//! forward references (a page pointing at its parent) stay simple.

use super::object_serializer::ObjectSerializer;
use crate::error::Result;
use crate::object::{Dict, Object, ObjectRef};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to Flate-compress streams
    pub compress: bool,
    /// Fixed creation date; the current time when unset
    pub creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            creator: Some("voter_slip".to_string()),
            compress: true,
            creation_date: None,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Pin the creation date.
    pub fn with_creation_date(mut self, date: chrono::DateTime<chrono::Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Named resources a page or form XObject draws with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    /// Font resources (`/F1` → font dictionary)
    pub fonts: BTreeMap<String, ObjectRef>,
    /// XObject resources (`/Tpl` → form or image)
    pub xobjects: BTreeMap<String, ObjectRef>,
}

impl Resources {
    /// Create an empty resource set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font under `name`.
    pub fn add_font(&mut self, name: impl Into<String>, font: ObjectRef) -> &mut Self {
        self.fonts.insert(name.into(), font);
        self
    }

    /// Register an XObject under `name`.
    pub fn add_xobject(&mut self, name: impl Into<String>, xobject: ObjectRef) -> &mut Self {
        self.xobjects.insert(name.into(), xobject);
        self
    }

    /// Resource dictionary object.
    pub fn to_object(&self) -> Object {
        let refs = |map: &BTreeMap<String, ObjectRef>| {
            Object::Dictionary(
                map.iter()
                    .map(|(k, v)| (k.clone(), Object::Reference(*v)))
                    .collect(),
            )
        };
        let mut dict = Dict::new();
        dict.insert(
            "ProcSet".to_string(),
            Object::Array(vec![Object::name("PDF"), Object::name("Text"), Object::name("ImageC")]),
        );
        if !self.fonts.is_empty() {
            dict.insert("Font".to_string(), refs(&self.fonts));
        }
        if !self.xobjects.is_empty() {
            dict.insert("XObject".to_string(), refs(&self.xobjects));
        }
        Object::Dictionary(dict)
    }
}

/// Internal page data.
#[derive(Debug)]
struct PageData {
    id: ObjectRef,
    content: ObjectRef,
    width: f32,
    height: f32,
    resources: Resources,
}

/// PDF document writer.
#[derive(Debug)]
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    /// Object ID counter
    next_obj_id: u32,
    /// Allocated objects (id -> object)
    objects: HashMap<u32, Object>,
    catalog_id: ObjectRef,
    pages_id: ObjectRef,
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            next_obj_id: 3,
            objects: HashMap::new(),
            catalog_id: ObjectRef::new(1, 0),
            pages_id: ObjectRef::new(2, 0),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PdfWriterConfig {
        &self.config
    }

    /// Reserve an object id to be filled later with [`PdfWriter::set_object`].
    pub fn reserve_id(&mut self) -> ObjectRef {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        ObjectRef::new(id, 0)
    }

    /// Store an object under a reserved id.
    pub fn set_object(&mut self, id: ObjectRef, obj: Object) {
        self.objects.insert(id.id, obj);
    }

    /// Add an object and return its reference.
    pub fn add_object(&mut self, obj: Object) -> ObjectRef {
        let id = self.reserve_id();
        self.set_object(id, obj);
        id
    }

    /// Build a stream object, compressing the data when enabled and the
    /// dictionary carries no filter yet.
    pub fn make_stream(&self, mut dict: Dict, data: Vec<u8>) -> Object {
        if self.config.compress && !dict.contains_key("Filter") {
            match compress_data(&data) {
                Ok(compressed) => {
                    dict.insert("Filter".to_string(), Object::name("FlateDecode"));
                    return Object::stream(dict, compressed);
                },
                Err(e) => log::warn!("Stream compression failed, writing raw data: {}", e),
            }
        }
        Object::stream(dict, data)
    }

    /// Add a stream object.
    pub fn add_stream(&mut self, dict: Dict, data: Vec<u8>) -> ObjectRef {
        let stream = self.make_stream(dict, data);
        self.add_object(stream)
    }

    /// Add a page with its content stream and resources.
    pub fn add_page(&mut self, width: f32, height: f32, content: Vec<u8>, resources: Resources) {
        let content = self.add_stream(Dict::new(), content);
        let id = self.reserve_id();
        self.pages.push(PageData {
            id,
            content,
            width,
            height,
            resources,
        });
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn info_object(&self) -> Object {
        let date = self.config.creation_date.unwrap_or_else(chrono::Utc::now);
        let mut info = Dict::new();
        let text = |s: &str| Object::String(s.as_bytes().to_vec());
        if let Some(title) = &self.config.title {
            info.insert("Title".to_string(), text(title));
        }
        if let Some(author) = &self.config.author {
            info.insert("Author".to_string(), text(author));
        }
        if let Some(creator) = &self.config.creator {
            info.insert("Creator".to_string(), text(creator));
        }
        info.insert(
            "Producer".to_string(),
            text(concat!("voter_slip ", env!("CARGO_PKG_VERSION"))),
        );
        info.insert(
            "CreationDate".to_string(),
            text(&date.format("D:%Y%m%d%H%M%SZ").to_string()),
        );
        Object::Dictionary(info)
    }

    /// Build the complete PDF document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::compact();

        let pages = std::mem::take(&mut self.pages);
        let mut kids = Vec::with_capacity(pages.len());
        for page in &pages {
            let page_obj = Object::dict([
                ("Type", Object::name("Page")),
                ("Parent", Object::Reference(self.pages_id)),
                ("MediaBox", Object::reals(&[0.0, 0.0, page.width, page.height])),
                ("Contents", Object::Reference(page.content)),
                ("Resources", page.resources.to_object()),
            ]);
            self.set_object(page.id, page_obj);
            kids.push(Object::Reference(page.id));
        }

        let pages_obj = Object::dict([
            ("Type", Object::name("Pages")),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ]);
        self.set_object(self.pages_id, pages_obj);
        self.set_object(
            self.catalog_id,
            Object::dict([
                ("Type", Object::name("Catalog")),
                ("Pages", Object::Reference(self.pages_id)),
            ]),
        );
        let info = self.info_object();
        let info_id = self.add_object(info);

        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", self.config.version)?;
        // Binary marker
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets: Vec<Option<usize>> = vec![None; self.next_obj_id as usize];
        let mut ids: Vec<u32> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(obj) = self.objects.get(&id) {
                offsets[id as usize] = Some(output.len());
                output.extend_from_slice(&serializer.serialize_indirect(id, 0, obj));
            }
        }

        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", self.next_obj_id)?;
        // Object 0 and any reserved-but-unused id are free
        for (id, offset) in offsets.iter().enumerate() {
            match offset {
                Some(offset) if id > 0 => writeln!(output, "{:010} 00000 n ", offset)?,
                _ => writeln!(output, "0000000000 65535 f ")?,
            }
        }

        let trailer = Object::dict([
            ("Size", Object::Integer(i64::from(self.next_obj_id))),
            ("Root", Object::Reference(self.catalog_id)),
            ("Info", Object::Reference(info_id)),
        ]);
        writeln!(output, "trailer")?;
        output.extend_from_slice(&serializer.serialize(&trailer));
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!(
            "Wrote PDF: {} pages, {} objects, {} bytes",
            pages.len(),
            self.next_obj_id - 1,
            output.len()
        );
        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
