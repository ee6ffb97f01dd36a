//! PDF reading using lopdf and pdf-extract.

use std::collections::BTreeMap;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, trace, warn};

use super::{K1Source, Result, TableGrid};
use crate::error::PdfError;

/// Concrete [`K1Source`] backed by lopdf (structure, annotations, images)
/// and pdf-extract (text).
pub struct PdfReader {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_table_columns: usize,
}

impl PdfReader {
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_table_columns: 2,
        }
    }

    /// Set the minimum cell count for a text line to count as a table row.
    pub fn with_min_table_columns(mut self, columns: usize) -> Self {
        self.min_table_columns = columns.max(2);
        self
    }

    /// Load a PDF from bytes. Failure here is fatal for the document;
    /// per-channel extraction failures later are not.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty-password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn read_annotation(&self, annot: &Dictionary) -> Option<(String, String)> {
        let name = match annot.get(b"T") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => return None,
        };
        if name.is_empty() {
            return None;
        }

        let value = match annot.get(b"V") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            // Checkbox / radio appearance state
            Ok(Object::Name(state)) => {
                let state = String::from_utf8_lossy(state).to_string();
                if state == "Off" {
                    return None;
                }
                state
            }
            _ => return None,
        };

        let value = value.trim().replace("\r\n", "\n").replace('\r', "\n");
        if value.is_empty() {
            return None;
        }

        trace!("annotation {} = {:?}", name, value);
        Some((name, value))
    }

    fn try_image_from_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("image XObject: {}x{}", width, height);

        let data = match stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => stream.content.clone(),
        };

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG stream, already compressed
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("unsupported image filter");
                    return None;
                }
                _ => {}
            }
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("unsupported bits per component: {}", bits);
            return None;
        }

        raw_to_image(&data, width, height, color_space)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl K1Source for PdfReader {
    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn form_fields(&self) -> Result<BTreeMap<String, String>> {
        let doc = self.document()?;
        let mut fields = BTreeMap::new();

        for (_page_num, page_id) in doc.get_pages() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| PdfError::AnnotationRead(e.to_string()))?;

            let Ok(annots) = page.get(b"Annots") else {
                continue;
            };

            // Annots may be inline or a reference to an array
            let annots = match annots {
                Object::Array(arr) => arr.clone(),
                Object::Reference(id) => match doc.get_object(*id) {
                    Ok(Object::Array(arr)) => arr.clone(),
                    _ => continue,
                },
                _ => continue,
            };

            for entry in &annots {
                let dict = match entry {
                    Object::Dictionary(d) => d,
                    Object::Reference(id) => match doc.get_object(*id) {
                        Ok(Object::Dictionary(d)) => d,
                        _ => continue,
                    },
                    _ => continue,
                };

                if let Some((name, value)) = self.read_annotation(dict) {
                    fields.insert(name, value);
                }
            }
        }

        debug!("Read {} filled form fields", fields.len());
        Ok(fields)
    }

    fn tables(&self) -> Result<Vec<TableGrid>> {
        let text = self.text()?;
        Ok(grids_from_text(&text, self.min_table_columns))
    }

    fn page_images(&self) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let mut images = Vec::new();

        for (_id, object) in doc.objects.iter() {
            if let Some(img) = self.try_image_from_object(object) {
                images.push(img);
            }
        }

        if images.is_empty() {
            warn!("No embedded images found in PDF");
        } else {
            debug!("Extracted {} embedded images", images.len());
        }
        Ok(images)
    }
}

/// Decode a PDF text string, handling the UTF-16BE BOM form.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let expected_rgb = (width * height * 3) as usize;
    let expected_gray = (width * height) as usize;

    if (color_space == b"DeviceRGB" || color_space == b"RGB") && data.len() >= expected_rgb {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for chunk in data[..expected_rgb].chunks(3) {
            rgba.extend_from_slice(chunk);
            rgba.push(255);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    if (color_space == b"DeviceGray" || color_space == b"G") && data.len() >= expected_gray {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for &gray in &data[..expected_gray] {
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    trace!(
        "could not decode raw image: len={}, colorspace={:?}",
        data.len(),
        String::from_utf8_lossy(color_space)
    );
    None
}

/// Split text into table grids: runs of consecutive lines that each break
/// into at least `min_columns` cells on tabs, pipes, or 2+ spaces.
fn grids_from_text(text: &str, min_columns: usize) -> Vec<TableGrid> {
    let mut grids = Vec::new();
    let mut current: TableGrid = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= min_columns {
            current.push(cells);
        } else {
            if current.len() >= 2 {
                grids.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() >= 2 {
        grids.push(current);
    }

    grids
}

fn split_cells(line: &str) -> Vec<String> {
    let normalized = line.replace('\t', "  ").replace('|', "  ");
    normalized
        .split("  ")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_starts_empty() {
        let reader = PdfReader::new();
        assert_eq!(reader.page_count(), 0);
        assert!(reader.text().is_err());
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'K', 0x00, b'-', 0x00, b'1'];
        assert_eq!(decode_pdf_string(&bytes), "K-1");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }

    #[test]
    fn test_grids_from_text() {
        let text = "Capital Account Analysis\n\
                    Beginning capital account  |  500,000\n\
                    Capital contributed  |  25,000\n\
                    Ending capital account  |  559,000\n\
                    \n\
                    just prose here";
        let grids = grids_from_text(text, 2);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].len(), 3);
        assert_eq!(grids[0][0], vec!["Beginning capital account", "500,000"]);
    }

    #[test]
    fn test_single_table_row_is_not_a_grid() {
        let grids = grids_from_text("lone label  |  42", 2);
        assert!(grids.is_empty());
    }
}
