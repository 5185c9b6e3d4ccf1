// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JPEG page encoder built on the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use paperkit_core::error::EngineError;
use paperkit_core::types::jpeg_quality_percent;
use tracing::debug;

use crate::traits::{EngineResult, ImageEncoder, RenderedPage};

/// Encodes rendered pages as baseline JPEG.
///
/// JPEG has no alpha channel, so transparent pixels are composited onto white
/// (the colour of an empty page) before encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegPageEncoder;

impl ImageEncoder for JpegPageEncoder {
    fn encode_lossy(&self, page: RenderedPage, quality: f32) -> EngineResult<Vec<u8>> {
        let percent = jpeg_quality_percent(quality);
        let rgb = flatten_onto_white(page.as_image());
        // The RGBA buffer is no longer needed once flattened.
        drop(page);

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, percent);
        rgb.write_with_encoder(encoder)
            .map_err(|err| EngineError::Failed(format!("JPEG encoding failed: {err}")))?;

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            percent,
            bytes = buffer.len(),
            "Page encoded"
        );
        Ok(buffer)
    }
}

/// Number of colour components declared by the first SOF marker of a JPEG
/// stream (1 grey, 3 YCbCr/RGB, 4 CMYK/YCCK), or `None` if no frame header
/// is found.
///
/// Decoders convert CMYK to RGB on the fly, so the decoded colour type cannot
/// tell whether the raw bytes are safe to embed as `/DeviceRGB`.
pub fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut pos = 2;
    loop {
        // Markers may be preceded by any number of 0xFF fill bytes.
        while *bytes.get(pos)? != 0xFF {
            pos += 1;
        }
        while *bytes.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos)?;
        pos += 1;
        match marker {
            0xD8 | 0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                // length(2) precision(1) height(2) width(2) components(1)
                return bytes.get(pos + 7).copied();
            }
            _ => {
                let length = u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]);
                pos += usize::from(length);
            }
        }
    }
}

/// Alpha-composite an RGBA image onto an opaque white background.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = u16::from(a);
        let blend = |channel: u8| -> u8 {
            ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// SOI, an Adobe APP14 segment and a 4-component baseline frame header:
/// the start of a CMYK JPEG.
#[cfg(test)]
pub(crate) fn cmyk_header() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(&[0xFF, 0xEE, 0x00, 0x0E]);
    bytes.extend_from_slice(b"Adobe\x00\x64\x00\x00\x00\x00\x00");
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x08, 0x00, 0x08, 0x04]);
    for id in 1..=4u8 {
        bytes.extend_from_slice(&[id, 0x11, 0x00]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x ^ y) % 256) as u8, 255])
        })
    }

    #[test]
    fn output_is_a_decodable_jpeg() {
        let page = RenderedPage::from_image(gradient(64, 48));
        let bytes = JpegPageEncoder.encode_lossy(page, 0.85).unwrap();

        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn lower_quality_produces_fewer_bytes() {
        let high = JpegPageEncoder
            .encode_lossy(RenderedPage::from_image(gradient(128, 128)), 0.95)
            .unwrap();
        let low = JpegPageEncoder
            .encode_lossy(RenderedPage::from_image(gradient(128, 128)), 0.2)
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn component_count_is_read_from_the_frame_header() {
        let page = RenderedPage::from_image(gradient(16, 16));
        let rgb = JpegPageEncoder.encode_lossy(page, 0.8).unwrap();
        assert_eq!(jpeg_components(&rgb), Some(3));

        assert_eq!(jpeg_components(&cmyk_header()), Some(4));
        assert_eq!(jpeg_components(b"not a jpeg"), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF]), None);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let flat = flatten_onto_white(&image);
        assert_eq!(*flat.get_pixel(0, 0), Rgb([255, 255, 255]));

        let opaque = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        assert_eq!(*flatten_onto_white(&opaque).get_pixel(0, 0), Rgb([10, 20, 30]));
    }
}
