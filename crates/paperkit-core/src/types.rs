// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Paperkit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PaperkitError, Result};

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    WebP,
    /// Recognised so it can be rejected with a clear message; no decoder.
    Heic,
    /// QuickTime movie, recognised but not converted.
    QuickTime,
}

impl DocumentType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Heic => "image/heic",
            Self::QuickTime => "video/quicktime",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "heic" | "heif" => Some(Self::Heic),
            "mov" | "qt" => Some(Self::QuickTime),
            _ => None,
        }
    }

    /// Identify a document from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        // ISO base media: size(4) "ftyp" brand(4)
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            return match &bytes[8..12] {
                b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"mif1" | b"msf1" => {
                    Some(Self::Heic)
                }
                b"qt  " => Some(Self::QuickTime),
                _ => None,
            };
        }
        None
    }

    /// Whether the type is a raster image this workspace can decode.
    pub fn is_decodable_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::WebP)
    }
}

// -- Rasterizing pipeline -----------------------------------------------------

/// Largest accepted render scale. A US Letter page at this scale is a
/// 4896×6336 bitmap, about 124 MB of RGBA.
pub const MAX_SCALE: f32 = 8.0;

/// Render scale and lossy re-encode quality for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Render resolution multiplier (1.0 = 72 dpi, one pixel per point).
    pub scale: f32,
    /// Lossy encode fidelity in `[0, 1]`.
    pub quality: f32,
}

impl RasterOptions {
    /// High-fidelity preset used when unlocking.
    pub const UNLOCK: Self = Self {
        scale: 2.0,
        quality: 0.85,
    };

    /// Preset used when exporting pages as standalone JPEGs.
    pub const PAGE_EXPORT: Self = Self {
        scale: 2.0,
        quality: 0.8,
    };

    /// Build validated options.
    pub fn new(scale: f32, quality: f32) -> Result<Self> {
        let options = Self { scale, quality };
        options.validate()?;
        Ok(options)
    }

    /// Check `0 < scale <= MAX_SCALE` and `quality` within `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(PaperkitError::InvalidInput(format!(
                "scale must be greater than 0 and at most {MAX_SCALE}, got {}",
                self.scale
            )));
        }
        validate_quality(self.quality)
    }
}

/// Reject qualities outside `[0, 1]` (and NaN).
pub fn validate_quality(quality: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(PaperkitError::InvalidInput(format!(
            "quality must be between 0 and 1, got {quality}"
        )));
    }
    Ok(())
}

/// Map a `[0, 1]` quality onto the 1-100 scale JPEG encoders expect.
pub fn jpeg_quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Named aggressiveness for PDF compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl CompressionLevel {
    /// The built-in render scale / quality pair for this level.
    pub fn default_preset(&self) -> RasterOptions {
        match self {
            Self::High => RasterOptions {
                scale: 1.5,
                quality: 0.7,
            },
            Self::Medium => RasterOptions {
                scale: 1.0,
                quality: 0.5,
            },
            Self::Low => RasterOptions {
                scale: 0.8,
                quality: 0.3,
            },
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        f.write_str(name)
    }
}

impl FromStr for CompressionLevel {
    type Err = PaperkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(PaperkitError::InvalidInput(format!(
                "unknown level '{other}' (expected high, medium, or low)"
            ))),
        }
    }
}

/// Render scale / quality for each compression level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionPresets {
    pub high: RasterOptions,
    pub medium: RasterOptions,
    pub low: RasterOptions,
}

impl CompressionPresets {
    pub fn preset(&self, level: CompressionLevel) -> RasterOptions {
        match level {
            CompressionLevel::High => self.high,
            CompressionLevel::Medium => self.medium,
            CompressionLevel::Low => self.low,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.high.validate()?;
        self.medium.validate()?;
        self.low.validate()
    }
}

impl Default for CompressionPresets {
    fn default() -> Self {
        Self {
            high: CompressionLevel::High.default_preset(),
            medium: CompressionLevel::Medium.default_preset(),
            low: CompressionLevel::Low.default_preset(),
        }
    }
}

// -- Page tools ---------------------------------------------------------------

/// A clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Self = Self(0);

    /// Accepts any multiple of 90 (negative values rotate anticlockwise).
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(PaperkitError::InvalidInput(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }
        Ok(Self(degrees.rem_euclid(360) as u16))
    }

    /// Normalised degrees in `{0, 90, 180, 270}`.
    pub fn degrees(&self) -> u16 {
        self.0
    }

    /// Add this rotation to an existing `/Rotate` value, normalised to `[0, 360)`.
    pub fn apply_to(&self, existing: i64) -> i64 {
        (existing + i64::from(self.0)).rem_euclid(360)
    }
}

/// Inclusive, 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Clamp to a document of `total` pages. Fails when nothing is left.
    pub fn clamp_to(&self, total: u32) -> Result<(u32, u32)> {
        let start = self.start.max(1);
        let end = self.end.min(total);
        if total == 0 || start > end {
            return Err(PaperkitError::InvalidInput("invalid page range".into()));
        }
        Ok((start, end))
    }
}

impl FromStr for PageRange {
    type Err = PaperkitError;

    /// Parses `"3"` or `"2-5"`.
    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                PaperkitError::InvalidInput(format!("'{part}' is not a page number"))
            })
        };
        match s.split_once('-') {
            Some((start, end)) => Ok(Self::new(parse(start)?, parse(end)?)),
            None => {
                let page = parse(s)?;
                Ok(Self::new(page, page))
            }
        }
    }
}

/// One page of an organized document: which source page, and how much to
/// rotate it on top of its existing rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeEntry {
    /// 1-based page number in the source document.
    pub page: u32,
    pub rotation: Rotation,
}

impl FromStr for OrganizeEntry {
    type Err = PaperkitError;

    /// Parses `"4"` or `"4:90"`.
    fn from_str(s: &str) -> Result<Self> {
        let (page, rotation) = match s.split_once(':') {
            Some((page, degrees)) => {
                let degrees = degrees.trim().parse::<i32>().map_err(|_| {
                    PaperkitError::InvalidInput(format!("'{degrees}' is not a rotation"))
                })?;
                (page, Rotation::from_degrees(degrees)?)
            }
            None => (s, Rotation::NONE),
        };
        let page = page
            .trim()
            .parse::<u32>()
            .map_err(|_| PaperkitError::InvalidInput(format!("'{page}' is not a page number")))?;
        Ok(Self { page, rotation })
    }
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PaperkitError::InvalidInput(format!(
                "'{hex}' is not a #RRGGBB colour"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|err| PaperkitError::InvalidInput(err.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Channels scaled to `[0, 1]` as PDF colour operators expect.
    pub fn to_unit(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl FromStr for Rgb {
    type Err = PaperkitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Text stamped diagonally across every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    pub text: String,
    /// Fill opacity in `[0, 1]`.
    pub opacity: f32,
    pub color: Rgb,
    /// Font size in points.
    pub font_size: f32,
    /// Counter-clockwise text angle in degrees.
    pub angle_degrees: f32,
}

impl WatermarkOptions {
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(PaperkitError::InvalidInput("watermark text is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(PaperkitError::InvalidInput(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(PaperkitError::InvalidInput(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".into(),
            opacity: 0.3,
            color: Rgb { r: 255, g: 0, b: 0 },
            font_size: 50.0,
            angle_degrees: 45.0,
        }
    }
}

// -- Images -------------------------------------------------------------------

/// Output encodings for image compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = PaperkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "image/jpeg" => Ok(Self::Jpeg),
            "png" | "image/png" => Ok(Self::Png),
            "webp" | "image/webp" => Ok(Self::WebP),
            other => Err(PaperkitError::InvalidInput(format!(
                "unknown image format '{other}'"
            ))),
        }
    }
}

/// Settings for the standalone image compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCompressionOptions {
    /// Encode quality in `[0, 1]`; ignored when `target_size_kb` is set.
    pub quality: f32,
    /// Search for the best quality that fits under this many KiB.
    pub target_size_kb: Option<u32>,
    pub max_width: u32,
    pub max_height: u32,
    pub format: ImageFormat,
}

impl ImageCompressionOptions {
    pub fn validate(&self) -> Result<()> {
        validate_quality(self.quality)?;
        if self.max_width == 0 || self.max_height == 0 {
            return Err(PaperkitError::InvalidInput(
                "maximum dimensions must be non-zero".into(),
            ));
        }
        if self.target_size_kb == Some(0) {
            return Err(PaperkitError::InvalidInput(
                "target size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ImageCompressionOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            target_size_kb: None,
            max_width: 1920,
            max_height: 1920,
            format: ImageFormat::Jpeg,
        }
    }
}

/// Quality presets for images → PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImagePdfQuality {
    /// Keep JPEGs untouched; other formats are converted at high quality.
    #[default]
    High,
    Medium,
    Low,
}

impl ImagePdfQuality {
    /// Re-encode quality, or `None` to keep the source encoding when possible.
    pub fn reencode_quality(&self) -> Option<f32> {
        match self {
            Self::High => None,
            Self::Medium => Some(0.6),
            Self::Low => Some(0.3),
        }
    }
}

impl FromStr for ImagePdfQuality {
    type Err = PaperkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(PaperkitError::InvalidInput(format!(
                "unknown quality '{other}' (expected high, medium, or low)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_recognises_common_formats() {
        assert_eq!(DocumentType::sniff(b"%PDF-1.7\n"), Some(DocumentType::Pdf));
        assert_eq!(
            DocumentType::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]),
            Some(DocumentType::Jpeg)
        );
        assert_eq!(
            DocumentType::sniff(b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00"),
            Some(DocumentType::Heic)
        );
        assert_eq!(DocumentType::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some(DocumentType::WebP));
        assert_eq!(DocumentType::sniff(b"hello"), None);
    }

    #[test]
    fn compression_presets_match_levels() {
        let presets = CompressionPresets::default();
        assert_eq!(presets.preset(CompressionLevel::High), RasterOptions { scale: 1.5, quality: 0.7 });
        assert_eq!(presets.preset(CompressionLevel::Medium), RasterOptions { scale: 1.0, quality: 0.5 });
        assert_eq!(presets.preset(CompressionLevel::Low), RasterOptions { scale: 0.8, quality: 0.3 });
        assert_eq!(CompressionLevel::default(), CompressionLevel::Medium);
    }

    #[test]
    fn raster_options_reject_bad_values() {
        assert!(RasterOptions::new(0.0, 0.5).is_err());
        assert!(RasterOptions::new(-1.0, 0.5).is_err());
        assert!(RasterOptions::new(f32::NAN, 0.5).is_err());
        assert!(RasterOptions::new(1.0, 1.5).is_err());
        assert!(RasterOptions::new(1.0, f32::NAN).is_err());
        assert!(RasterOptions::new(2.0, 0.85).is_ok());
    }

    #[test]
    fn raster_scale_is_capped() {
        assert!(RasterOptions::new(MAX_SCALE, 0.5).is_ok());
        assert!(RasterOptions::new(MAX_SCALE + 0.1, 0.5).is_err());
        assert!(RasterOptions::new(1.0e6, 0.5).is_err());
        assert!(RasterOptions::new(f32::INFINITY, 0.5).is_err());
    }

    #[test]
    fn jpeg_quality_maps_to_percent() {
        assert_eq!(jpeg_quality_percent(0.85), 85);
        assert_eq!(jpeg_quality_percent(0.0), 1);
        assert_eq!(jpeg_quality_percent(1.0), 100);
    }

    #[test]
    fn rotation_normalises() {
        assert_eq!(Rotation::from_degrees(-90).unwrap().degrees(), 270);
        assert_eq!(Rotation::from_degrees(450).unwrap().degrees(), 90);
        assert!(Rotation::from_degrees(45).is_err());
        assert_eq!(Rotation::from_degrees(90).unwrap().apply_to(270), 0);
    }

    #[test]
    fn page_range_clamps() {
        assert_eq!(PageRange::new(0, 99).clamp_to(5).unwrap(), (1, 5));
        assert_eq!("2-3".parse::<PageRange>().unwrap(), PageRange::new(2, 3));
        assert_eq!("4".parse::<PageRange>().unwrap(), PageRange::new(4, 4));
        assert!(PageRange::new(6, 9).clamp_to(5).is_err());
    }

    #[test]
    fn organize_entry_parses_rotation() {
        let entry: OrganizeEntry = "3:180".parse().unwrap();
        assert_eq!(entry.page, 3);
        assert_eq!(entry.rotation.degrees(), 180);
        let plain: OrganizeEntry = "7".parse().unwrap();
        assert_eq!(plain.rotation, Rotation::NONE);
        assert!("x:90".parse::<OrganizeEntry>().is_err());
    }

    #[test]
    fn hex_colour_parses() {
        assert_eq!(Rgb::from_hex("#FF0000").unwrap(), Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(Rgb::from_hex("00ff7f").unwrap(), Rgb { r: 0, g: 255, b: 127 });
        assert!(Rgb::from_hex("#F00").is_err());
        assert!(Rgb::from_hex("#GG0000").is_err());
    }

    #[test]
    fn level_round_trips_through_display() {
        for level in [CompressionLevel::High, CompressionLevel::Medium, CompressionLevel::Low] {
            assert_eq!(level.to_string().parse::<CompressionLevel>().unwrap(), level);
        }
    }
}
