//! Raster images as PDF image XObjects.
//!
//! - **JPEG**: passed through unchanged with the DCTDecode filter
//! - **PNG**: decoded with `image`, pixel data Flate-compressed, alpha
//!   written as a soft mask

use super::pdf_writer::PdfWriter;
use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectRef};

/// Encoding of the image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image (DCTDecode filter)
    Jpeg,
    /// Decoded pixels, compressed by the writer
    Png,
}

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Image data for PDF embedding.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space
    pub color_space: ColorSpace,
    /// Image format
    pub format: ImageFormat,
    /// JPEG bytes or raw pixels
    pub data: Vec<u8>,
    /// Optional alpha channel (raw, one byte per pixel)
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageData {
    /// Sniff the format and load an image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if is_jpeg(data) {
            return Self::from_jpeg(data.to_vec());
        }
        if is_png(data) {
            return Self::from_png(data);
        }
        Err(Error::Image("unsupported image format".to_string()))
    }

    /// Load a JPEG image for pass-through embedding.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(&data)?;
        Ok(Self {
            width,
            height,
            color_space,
            format: ImageFormat::Jpeg,
            data,
            soft_mask: None,
        })
    }

    /// Decode a PNG image.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|e| Error::Image(e.to_string()))?;
        let (width, height) = img.dimensions();

        let (color_space, pixels, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let (gray, alpha): (Vec<u8>, Vec<u8>) =
                    la.pixels().map(|p| (p.0[0], p.0[1])).unzip();
                (ColorSpace::DeviceGray, gray, Some(alpha))
            },
            image::ColorType::Rgba8 | image::ColorType::Rgba16 => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        // a fully opaque alpha channel adds nothing
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 0xFF));

        Ok(Self {
            width,
            height,
            color_space,
            format: ImageFormat::Png,
            data: pixels,
            soft_mask: alpha,
        })
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Largest size with this image's aspect ratio that fits the box.
    pub fn fit_to_box(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let aspect = self.aspect_ratio();
        if max_height <= 0.0 {
            return (0.0, 0.0);
        }
        if aspect > max_width / max_height {
            (max_width, max_width / aspect)
        } else {
            (max_height * aspect, max_height)
        }
    }

    fn base_dict(&self, color_space: ColorSpace) -> Dict {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("XObject"));
        dict.insert("Subtype".to_string(), Object::name("Image"));
        dict.insert("Width".to_string(), Object::Integer(i64::from(self.width)));
        dict.insert("Height".to_string(), Object::Integer(i64::from(self.height)));
        dict.insert("ColorSpace".to_string(), Object::name(color_space.pdf_name()));
        dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
        dict
    }

    /// Write the image (and its soft mask) and return the XObject reference.
    pub fn write(&self, writer: &mut PdfWriter) -> ObjectRef {
        let mut dict = self.base_dict(self.color_space);

        if let Some(mask) = &self.soft_mask {
            let mask_ref = writer.add_stream(self.base_dict(ColorSpace::DeviceGray), mask.clone());
            dict.insert("SMask".to_string(), Object::Reference(mask_ref));
        }

        if self.format == ImageFormat::Jpeg {
            dict.insert("Filter".to_string(), Object::name("DCTDecode"));
            if self.color_space == ColorSpace::DeviceCMYK {
                // Adobe JPEGs store CMYK inverted
                dict.insert("Decode".to_string(), Object::reals(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]));
            }
        }
        writer.add_stream(dict, self.data.clone())
    }
}

/// Whether the bytes start with the JPEG SOI marker.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
}

/// Whether the bytes start with the PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(b"\x89PNG\r\n\x1a\n")
}

/// Read dimensions and components from the first SOF segment.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace)> {
    if !is_jpeg(data) {
        return Err(Error::Image("not a JPEG".to_string()));
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;

        if marker == 0xFF || marker == 0x00 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }

        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let Some(segment) = data.get(pos..pos + 8) else {
                return Err(Error::Image("truncated JPEG header".to_string()));
            };
            let height = u32::from(u16::from_be_bytes([segment[3], segment[4]]));
            let width = u32::from(u16::from_be_bytes([segment[5], segment[6]]));
            let color_space = match segment[7] {
                1 => ColorSpace::DeviceGray,
                4 => ColorSpace::DeviceCMYK,
                _ => ColorSpace::DeviceRGB,
            };
            return Ok((width, height, color_space));
        }

        let Some(len) = data.get(pos..pos + 2) else {
            break;
        };
        pos += usize::from(u16::from_be_bytes([len[0], len[1]]));
    }

    Err(Error::Image("could not find JPEG dimensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, alpha]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_decode() {
        let img = ImageData::from_bytes(&png_bytes(4, 3, 0xFF)).unwrap();
        assert_eq!((img.width, img.height), (4, 3));
        assert_eq!(img.color_space, ColorSpace::DeviceRGB);
        assert_eq!(img.data.len(), 4 * 3 * 3);
        assert!(img.soft_mask.is_none());
    }

    #[test]
    fn test_png_alpha_becomes_soft_mask() {
        let img = ImageData::from_bytes(&png_bytes(2, 2, 0x80)).unwrap();
        assert_eq!(img.soft_mask.as_ref().map(Vec::len), Some(4));

        let mut writer = PdfWriter::new();
        let xobject = img.write(&mut writer);
        assert_eq!(xobject.id, 4);
    }

    #[test]
    fn test_jpeg_header() {
        // SOI, APP0 (length 4), SOF0 for 16x8 with 3 components
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x08, 0x00, 0x10, 0x03]);
        let img = ImageData::from_bytes(&data).unwrap();
        assert_eq!((img.width, img.height), (16, 8));
        assert_eq!(img.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(ImageData::from_bytes(b"GIF89a"), Err(Error::Image(_))));
        assert!(matches!(ImageData::from_bytes(&[0xFF, 0xD8, 0x00]), Err(Error::Image(_))));
    }

    #[test]
    fn test_fit_to_box() {
        let img = ImageData {
            width: 200,
            height: 100,
            color_space: ColorSpace::DeviceRGB,
            format: ImageFormat::Png,
            data: Vec::new(),
            soft_mask: None,
        };
        assert_eq!(img.fit_to_box(100.0, 100.0), (100.0, 50.0));
        assert_eq!(img.fit_to_box(100.0, 20.0), (40.0, 20.0));
    }
}
