use crate::constants::{
    LARGE_PNG_PIXELS, LIBDEFLATER_LEVEL, OXIPNG_PRESET, PNG_DITHERING_LEVEL, PNG_QUANT_SPEED,
};
use crate::formats::SupportedFormat;
use crate::parameters::{CodecParameters, JpegParameters, PngParameters, WebpParameters};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{
    ColorType, DynamicImage, ExtendedColorType, ImageFormat, ImageReader, ImageResult, RgbaImage,
};
use imagequant::{Attributes, Image as QuantImage, RGBA};
use oxipng::{Deflaters, Options, StripChunks};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::num::NonZeroU8;
use std::path::Path;
use webp::Encoder as LossyWebpEncoder;

/// Failure reported by a codec, with a numeric result code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    pub code: i32,
    pub message: String,
}

impl CodecError {
    pub const READ: i32 = 1;
    pub const DECODE: i32 = 2;
    pub const ENCODE: i32 = 3;
    pub const WRITE: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodecError {}

/// Format-specific compression routine.
///
/// `input` and `output` may be the same path; implementations must read the
/// input completely before writing.
pub trait Codec: Send + Sync {
    fn compress(
        &self,
        input: &Path,
        output: &Path,
        params: &CodecParameters,
    ) -> std::result::Result<(), CodecError>;
}

/// Default codec: `image` for JPEG, `imagequant` + `oxipng` for PNG, `webp` and
/// `image` for lossy and lossless WebP
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn compress(
        &self,
        input: &Path,
        output: &Path,
        params: &CodecParameters,
    ) -> std::result::Result<(), CodecError> {
        let data = fs::read(input).map_err(|e| CodecError::new(CodecError::READ, e.to_string()))?;
        let format = SupportedFormat::from_bytes(&data)
            .map_err(|e| CodecError::new(CodecError::UNSUPPORTED, e.to_string()))?;

        let compressed = match format {
            SupportedFormat::Jpeg => compress_jpeg(&data, &params.jpeg)?,
            SupportedFormat::Png => compress_png(&data, &params.png)?,
            SupportedFormat::WebP => compress_webp(&data, &params.webp)?,
        };

        fs::write(output, compressed).map_err(|e| CodecError::new(CodecError::WRITE, e.to_string()))
    }
}

fn decode(data: &[u8], format: SupportedFormat) -> std::result::Result<DynamicImage, CodecError> {
    image::load_from_memory_with_format(data, format.to_image_format())
        .map_err(|e| CodecError::new(CodecError::DECODE, e.to_string()))
}

fn encode_error(e: impl fmt::Display) -> CodecError {
    CodecError::new(CodecError::ENCODE, e.to_string())
}

fn compress_jpeg(data: &[u8], params: &JpegParameters) -> std::result::Result<Vec<u8>, CodecError> {
    // quality 0 is the lossless path: the scan data is kept byte for byte
    if params.quality == 0 {
        return Ok(if params.copy_metadata {
            data.to_vec()
        } else {
            strip_jpeg_metadata(data)
        });
    }

    let img = decode(data, SupportedFormat::Jpeg)?;
    let mut encoded = encode_jpeg(&img, params.quality).map_err(encode_error)?;

    if params.copy_metadata {
        let segments = jpeg_metadata_segments(data);
        if !segments.is_empty() {
            encoded = insert_jpeg_segments(&encoded, &segments);
        }
    }

    Ok(encoded)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        match img.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                encoder.encode_image(&img.to_luma8())?
            }
            _ => encoder.encode_image(&img.to_rgb8())?,
        }
    }
    Ok(buffer)
}

fn compress_png(data: &[u8], params: &PngParameters) -> std::result::Result<Vec<u8>, CodecError> {
    let mut source: Cow<'_, [u8]> = Cow::Borrowed(data);

    if params.lossy_8bit || !params.preserve_transparency {
        let img = decode(data, SupportedFormat::Png)?;
        if let Some(reduced) = reduce_png(img, params)? {
            let mut buffer = Vec::new();
            reduced
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(encode_error)?;
            source = Cow::Owned(buffer);
        }
    }

    let (width, height) = ImageReader::with_format(Cursor::new(source.as_ref()), ImageFormat::Png)
        .into_dimensions()
        .map_err(|e| CodecError::new(CodecError::DECODE, e.to_string()))?;
    let iterations = if width as u64 * height as u64 > LARGE_PNG_PIXELS {
        params.iterations_large
    } else {
        params.iterations
    };

    let mut oxipng_options = Options::from_preset(OXIPNG_PRESET);
    oxipng_options.deflate = match NonZeroU8::new(iterations) {
        Some(iterations) => Deflaters::Zopfli { iterations },
        None => Deflaters::Libdeflater {
            compression: LIBDEFLATER_LEVEL,
        },
    };
    oxipng_options.strip = if params.keep_metadata {
        StripChunks::None
    } else {
        StripChunks::Safe
    };

    oxipng::optimize_from_memory(&source, &oxipng_options).map_err(encode_error)
}

/// Applies the lossy PNG reductions; `None` when nothing had to change.
///
/// Transparency is flattened first, so a quantized palette only carries
/// alpha when it is preserved.
fn reduce_png(
    img: DynamicImage,
    params: &PngParameters,
) -> std::result::Result<Option<DynamicImage>, CodecError> {
    let mut img = img;
    let mut changed = false;

    if !params.preserve_transparency && img.color().has_alpha() {
        img = match img.color() {
            ColorType::La8 | ColorType::La16 => DynamicImage::ImageLuma8(img.to_luma8()),
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        };
        changed = true;
    }

    if params.lossy_8bit {
        img = quantize_palette(&img)?;
        changed = true;
    }

    Ok(changed.then_some(img))
}

/// Maps the image onto a palette of at most 256 colors with dithering.
///
/// The result is still RGBA; oxipng then stores it as an indexed PNG.
fn quantize_palette(img: &DynamicImage) -> std::result::Result<DynamicImage, CodecError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<RGBA> = rgba
        .pixels()
        .map(|p| RGBA::new(p[0], p[1], p[2], p[3]))
        .collect();

    let mut attr = Attributes::new();
    attr.set_speed(PNG_QUANT_SPEED).map_err(encode_error)?;
    let mut liq_image = QuantImage::new(
        &attr,
        pixels.as_slice(),
        width as usize,
        height as usize,
        0.0,
    )
    .map_err(encode_error)?;
    let mut quantized = attr.quantize(&mut liq_image).map_err(encode_error)?;
    quantized
        .set_dithering_level(PNG_DITHERING_LEVEL)
        .map_err(encode_error)?;
    let (palette, indices) = quantized.remapped(&mut liq_image).map_err(encode_error)?;

    let mut expanded = Vec::with_capacity(indices.len() * 4);
    for index in indices {
        let color = palette[index as usize];
        expanded.extend_from_slice(&[color.r, color.g, color.b, color.a]);
    }
    RgbaImage::from_raw(width, height, expanded)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| CodecError::new(CodecError::ENCODE, "palette remap size mismatch"))
}

fn compress_webp(data: &[u8], params: &WebpParameters) -> std::result::Result<Vec<u8>, CodecError> {
    let img = decode(data, SupportedFormat::WebP)?;
    let encoded = if params.lossless {
        encode_webp_lossless(&img).map_err(encode_error)?
    } else {
        encode_webp_lossy(&img, params.quality)
    };

    // re-encoding an already compact source can only lose
    if encoded.len() >= data.len() {
        return Ok(data.to_vec());
    }
    Ok(encoded)
}

fn encode_webp_lossy(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let quality = quality.clamp(1, 100) as f32;
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        LossyWebpEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode(quality)
            .to_vec()
    } else {
        let rgb = img.to_rgb8();
        LossyWebpEncoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode(quality)
            .to_vec()
    }
}

fn encode_webp_lossless(img: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut buffer);
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        encoder.encode(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)?;
    } else {
        let rgb = img.to_rgb8();
        encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
    }
    Ok(buffer)
}

/// Encodes at the highest fidelity the format offers.
///
/// Used for the intermediate file written after a resize, before the codec
/// applies the real compression parameters.
pub fn encode_image(img: &DynamicImage, format: SupportedFormat, quality: u8) -> ImageResult<Vec<u8>> {
    match format {
        SupportedFormat::Jpeg => encode_jpeg(img, quality),
        SupportedFormat::Png => {
            let mut buffer = Vec::new();
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
            Ok(buffer)
        }
        SupportedFormat::WebP => encode_webp_lossless(img),
    }
}

const MARKER_SOS: u8 = 0xDA;
const MARKER_EOI: u8 = 0xD9;
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP2: u8 = 0xE2;
const MARKER_APP13: u8 = 0xED;
const MARKER_COM: u8 = 0xFE;

struct JpegHeader<'a> {
    segments: Vec<(u8, &'a [u8])>,
    /// Offset of the first byte after the parsed header segments
    end: usize,
}

/// Splits the marker segments preceding the first scan.
fn parse_jpeg_header(data: &[u8]) -> Option<JpegHeader<'_>> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut segments = Vec::new();
    let mut pos = 2;
    while pos + 4 <= data.len() && data[pos] == 0xFF {
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == MARKER_SOS || marker == MARKER_EOI {
            break;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            break;
        }
        segments.push((marker, &data[pos..pos + 2 + len]));
        pos += 2 + len;
    }

    Some(JpegHeader { segments, end: pos })
}

/// EXIF/XMP, ICC and IPTC segments of a JPEG, markers included.
pub fn jpeg_metadata_segments(data: &[u8]) -> Vec<Vec<u8>> {
    parse_jpeg_header(data)
        .map(|header| {
            header
                .segments
                .into_iter()
                .filter(|(marker, _)| matches!(*marker, MARKER_APP1 | MARKER_APP2 | MARKER_APP13))
                .map(|(_, bytes)| bytes.to_vec())
                .collect()
        })
        .unwrap_or_default()
}

/// Drops EXIF/XMP, IPTC and comment segments; the ICC profile is kept so
/// colors render the same.
pub fn strip_jpeg_metadata(data: &[u8]) -> Vec<u8> {
    let Some(header) = parse_jpeg_header(data) else {
        return data.to_vec();
    };

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..2]);
    for (marker, bytes) in &header.segments {
        if !matches!(*marker, MARKER_APP1 | MARKER_APP13 | MARKER_COM) {
            out.extend_from_slice(bytes);
        }
    }
    out.extend_from_slice(&data[header.end..]);
    out
}

/// Inserts raw segments right after SOI, or after a leading JFIF APP0.
pub fn insert_jpeg_segments(data: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    let Some(header) = parse_jpeg_header(data) else {
        return data.to_vec();
    };

    let insert_at = match header.segments.first() {
        Some((MARKER_APP0, bytes)) => 2 + bytes.len(),
        _ => 2,
    };

    let extra: usize = segments.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(data.len() + extra);
    out.extend_from_slice(&data[..insert_at]);
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&data[insert_at..]);
    out
}
