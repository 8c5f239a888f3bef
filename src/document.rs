//! Document assembly.
//!
//! [`assemble_document`] turns an ordered frame sequence into a [`Document`]
//! with one page per frame, each image laid out by [`PageLayout::fit`].
//! Every frame is decoded first to confirm its real pixel size; a single
//! undecodable frame fails the whole document.
//!
//! With the `rayon` feature the per-frame decode runs in parallel. Pages are
//! still assembled in input order.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{DocumentOptions, FlipbookError, PageSize, SampleConfig, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! let frames = flipbook::extract_frames(&mut source, &SampleConfig::default(), &Default::default())?;
//!
//! let options = DocumentOptions::new()
//!     .with_page_size(PageSize::LETTER.landscape())
//!     .with_title("Lecture 4");
//! let document = flipbook::assemble_document(&frames, &options)?;
//! document.save("lecture-4.pdf")?;
//! # Ok::<(), FlipbookError>(())
//! ```

use std::{fs, path::Path};

use image::{ColorType, DynamicImage, codecs::jpeg::JpegEncoder};
use lopdf::{
    Dictionary, Document as PdfDocument, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    configuration::ExtractOptions,
    error::FlipbookError,
    layout::{PageLayout, PageSize},
    progress::{OperationType, ProgressTracker},
    sampler::Frame,
};

/// Quality used when a non-JPEG frame has to be re-encoded for embedding.
const REENCODE_QUALITY: u8 = 90;

/// Document-level settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct DocumentOptions {
    /// Size of every page. Defaults to A4 landscape.
    pub page_size: PageSize,
    /// Optional title written to the PDF metadata.
    pub title: Option<String>,
}

impl DocumentOptions {
    /// Options with the default page size and no title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Colour model of an embedded page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageColorSpace {
    /// Three-channel RGB.
    Rgb,
    /// Single-channel grayscale.
    Gray,
}

impl ImageColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            ImageColorSpace::Rgb => "DeviceRGB",
            ImageColorSpace::Gray => "DeviceGray",
        }
    }
}

/// A JPEG image ready to be embedded in a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// JPEG bytes.
    pub jpeg_bytes: Vec<u8>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Colour model of the JPEG data.
    pub color_space: ImageColorSpace,
}

/// One page: an image and where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Geometry of the image on the page.
    pub layout: PageLayout,
    /// The embedded image.
    pub image: PageImage,
    /// Sequence index of the frame this page came from.
    pub sequence_index: u64,
}

/// An assembled, immutable multi-page document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pages: Vec<Page>,
    title: Option<String>,
}

impl Document {
    /// Pages in frame order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Document title, if one was set.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Serialise the document as PDF.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::DocumentWrite`] if serialisation fails.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, FlipbookError> {
        let mut pdf = PdfDocument::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());

        for (index, page) in self.pages.iter().enumerate() {
            let image = &page.image;
            let image_id = pdf.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => Object::Integer(image.width.into()),
                    "Height" => Object::Integer(image.height.into()),
                    "ColorSpace" => image.color_space.pdf_name(),
                    "BitsPerComponent" => Object::Integer(8),
                    "Filter" => "DCTDecode",
                },
                image.jpeg_bytes.clone(),
            ));

            let layout = &page.layout;
            // PDF user space starts at the bottom-left corner.
            let bottom = layout.page_height - layout.image_y - layout.render_height;
            let image_name = format!("Im{index}");
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            real(layout.render_width),
                            Object::Integer(0),
                            Object::Integer(0),
                            real(layout.render_height),
                            real(layout.image_x),
                            real(bottom),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(image_name.clone().into_bytes())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_bytes = content
                .encode()
                .map_err(|error| FlipbookError::DocumentWrite(error.to_string()))?;
            let content_id = pdf.add_object(Stream::new(Dictionary::new(), content_bytes));

            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(layout.page_width),
                    real(layout.page_height),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        image_name => image_id,
                    },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count),
            }),
        );

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal("flipbook"),
        };
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = pdf.add_object(info);
        pdf.trailer.set("Info", info_id);

        let mut output = Vec::new();
        pdf.save_to(&mut output)
            .map_err(|error| FlipbookError::DocumentWrite(error.to_string()))?;

        log::debug!(
            "Serialised {} pages into {} bytes of PDF",
            self.pages.len(),
            output.len()
        );
        Ok(output)
    }

    /// Serialise the document as PDF and write it to `path`.
    ///
    /// # Errors
    ///
    /// [`FlipbookError::DocumentWrite`] or [`FlipbookError::IoError`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FlipbookError> {
        let bytes = self.to_pdf_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Assemble `frames` into a document, one page per frame.
///
/// An empty frame slice produces an empty document.
///
/// # Errors
///
/// [`FlipbookError::InvalidConfig`] for an invalid page size,
/// [`FlipbookError::DecodeFailed`] if any frame cannot be decoded or decodes
/// to a size other than its recorded one.
pub fn assemble_document(
    frames: &[Frame],
    options: &DocumentOptions,
) -> Result<Document, FlipbookError> {
    assemble_document_with_options(frames, options, &ExtractOptions::default())
}

/// Like [`assemble_document`] with progress reporting and cancellation.
///
/// Progress is reported as [`OperationType::DocumentAssembly`], one step per
/// decoded frame.
pub fn assemble_document_with_options(
    frames: &[Frame],
    options: &DocumentOptions,
    extract_options: &ExtractOptions,
) -> Result<Document, FlipbookError> {
    options.page_size.validate()?;

    let mut tracker = ProgressTracker::new(
        extract_options.progress.clone(),
        OperationType::DocumentAssembly,
        frames.len() as u64,
    );

    let images = decode_frames(frames, extract_options, &mut tracker)?;

    let pages: Vec<Page> = frames
        .iter()
        .zip(images)
        .map(|(frame, image)| Page {
            layout: PageLayout::fit(image.width, image.height, options.page_size),
            image,
            sequence_index: frame.sequence_index,
        })
        .collect();

    tracker.finish();
    log::info!(
        "Assembled {} pages at {:.1}x{:.1} pt",
        pages.len(),
        options.page_size.width,
        options.page_size.height
    );

    Ok(Document {
        pages,
        title: options.title.clone(),
    })
}

#[cfg(not(feature = "rayon"))]
fn decode_frames(
    frames: &[Frame],
    options: &ExtractOptions,
    tracker: &mut ProgressTracker,
) -> Result<Vec<PageImage>, FlipbookError> {
    frames
        .iter()
        .map(|frame| {
            if options.is_cancelled() {
                return Err(FlipbookError::Cancelled);
            }
            let image = decode_frame(frame)?;
            tracker.advance(Some(frame.timestamp));
            Ok(image)
        })
        .collect()
}

#[cfg(feature = "rayon")]
fn decode_frames(
    frames: &[Frame],
    options: &ExtractOptions,
    tracker: &mut ProgressTracker,
) -> Result<Vec<PageImage>, FlipbookError> {
    use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

    let images = frames
        .par_iter()
        .map(|frame| {
            if options.is_cancelled() {
                return Err(FlipbookError::Cancelled);
            }
            decode_frame(frame)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for frame in frames {
        tracker.advance(Some(frame.timestamp));
    }
    Ok(images)
}

/// Decode one frame, check its size and prepare it for embedding.
fn decode_frame(frame: &Frame) -> Result<PageImage, FlipbookError> {
    let decode_failed = |reason: String| FlipbookError::DecodeFailed {
        sequence_index: frame.sequence_index,
        reason,
    };

    let decoded =
        image::load_from_memory(&frame.image_bytes).map_err(|error| decode_failed(error.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    if (width, height) != (frame.width, frame.height) {
        return Err(decode_failed(format!(
            "image is {width}x{height} but the frame records {}x{}",
            frame.width, frame.height
        )));
    }

    let components = jpeg_component_count(&frame.image_bytes);
    let (jpeg_bytes, color_space) = match embeddable_color_space(components, decoded.color()) {
        Some(color_space) => (frame.image_bytes.clone(), color_space),
        None => (
            reencode_as_jpeg(&decoded).map_err(|error| decode_failed(error.to_string()))?,
            ImageColorSpace::Rgb,
        ),
    };

    Ok(PageImage {
        jpeg_bytes,
        width,
        height,
        color_space,
    })
}

/// Colour space for embedding the JPEG data unchanged, or `None` if it has to
/// be re-encoded.
///
/// The decoder converts CMYK and YCCK JPEGs to RGB, so the stored component
/// count has to agree with the decoded colour type.
fn embeddable_color_space(components: Option<u8>, decoded: ColorType) -> Option<ImageColorSpace> {
    match (components, decoded) {
        (Some(3), ColorType::Rgb8) => Some(ImageColorSpace::Rgb),
        (Some(1), ColorType::L8) => Some(ImageColorSpace::Gray),
        _ => None,
    }
}

/// Component count from the frame header of a baseline, extended or
/// progressive JPEG. `None` for anything else.
fn jpeg_component_count(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut position = 2;
    loop {
        if *bytes.get(position)? != 0xFF {
            return None;
        }
        // Markers may be preceded by any number of fill bytes.
        while *bytes.get(position + 1)? == 0xFF {
            position += 1;
        }
        let marker = *bytes.get(position + 1)?;
        position += 2;

        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length =
            u16::from_be_bytes([*bytes.get(position)?, *bytes.get(position + 1)?]) as usize;
        match marker {
            0xC0..=0xC2 => return bytes.get(position + 7).copied(),
            0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => return None,
            _ => {}
        }
        if length < 2 {
            return None;
        }
        position += length;
    }
}

fn reencode_as_jpeg(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, REENCODE_QUALITY).encode_image(&image.to_rgb8())?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{GrayImage, RgbImage};

    fn encode_rgb(image: &RgbImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, 80)
            .encode_image(image)
            .unwrap();
        buffer
    }

    fn encode_gray(image: &GrayImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, 80)
            .encode_image(image)
            .unwrap();
        buffer
    }

    /// SOI, an APP14 "Adobe" segment and a four-component SOF0 header.
    fn cmyk_header() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
        bytes.extend_from_slice(b"Adobe");
        bytes.extend_from_slice(&[0x00, 0x64, 0x00, 0x00, 0x00, 0x00, 0x02]);
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x10, 0x00, 0x10, 0x04]);
        for id in 1..=4_u8 {
            bytes.extend_from_slice(&[id, 0x11, 0x00]);
        }
        bytes
    }

    #[test]
    fn counts_rgb_and_gray_components() {
        let rgb = encode_rgb(&RgbImage::new(16, 8));
        let gray = encode_gray(&GrayImage::new(16, 8));
        assert_eq!(jpeg_component_count(&rgb), Some(3));
        assert_eq!(jpeg_component_count(&gray), Some(1));
    }

    #[test]
    fn counts_four_component_header() {
        assert_eq!(jpeg_component_count(&cmyk_header()), Some(4));
    }

    #[test]
    fn non_jpeg_and_truncated_data_have_no_count() {
        assert_eq!(jpeg_component_count(b"\x89PNG\r\n"), None);
        assert_eq!(jpeg_component_count(&[0xFF, 0xD8, 0xFF]), None);
        assert_eq!(jpeg_component_count(&[]), None);
    }

    #[test]
    fn four_component_jpeg_decoded_as_rgb_is_reencoded() {
        assert_eq!(embeddable_color_space(Some(4), ColorType::Rgb8), None);
        assert_eq!(embeddable_color_space(None, ColorType::Rgb8), None);
        assert_eq!(embeddable_color_space(Some(3), ColorType::L8), None);
        assert_eq!(
            embeddable_color_space(Some(3), ColorType::Rgb8),
            Some(ImageColorSpace::Rgb)
        );
        assert_eq!(
            embeddable_color_space(Some(1), ColorType::L8),
            Some(ImageColorSpace::Gray)
        );
    }
}
