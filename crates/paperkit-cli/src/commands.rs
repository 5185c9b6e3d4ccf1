// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument definitions and one handler per tool.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::password::{Password, derive_password, validate_year_of_birth};
use paperkit_core::types::{
    CompressionLevel, DocumentType, ImageCompressionOptions, ImageFormat, ImagePdfQuality,
    OrganizeEntry, PageRange, Rgb, Rotation, WatermarkOptions,
};
use paperkit_document::{PageImage, PdfReader, PdfWriter, compress_image, merge_pdfs, zip_pages};
use tracing::info;

use crate::services::app_services::AppServices;

/// Local-only PDF unlock, compression, and page tools.
#[derive(Parser, Debug)]
#[command(name = "paperkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.json in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove the password from a PDF by re-rendering every page
    Unlock {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// The document password
        #[arg(long, conflicts_with_all = ["name", "yob"], required_unless_present_all = ["name", "yob"])]
        password: Option<String>,
        /// Full name, used with --yob to derive the password
        #[arg(long, requires = "yob")]
        name: Option<String>,
        /// Four-digit year of birth
        #[arg(long, requires = "name")]
        yob: Option<String>,
    },

    /// Shrink a PDF by re-rendering its pages at lower resolution and quality
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// high, medium, or low
        #[arg(short, long, default_value = "medium")]
        level: CompressionLevel,
    },

    /// Combine PDFs, in the order given
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a page range ("3" or "2-5", 1-based, inclusive)
    Split {
        input: PathBuf,
        #[arg(short, long)]
        pages: PageRange,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate every page by a multiple of 90 degrees (clockwise)
    Rotate {
        input: PathBuf,
        #[arg(short, long, default_value_t = 90, allow_hyphen_values = true)]
        degrees: i32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reorder, drop, and rotate pages: --pages 3,1:90,2
    Organize {
        input: PathBuf,
        #[arg(short, long, value_delimiter = ',', required = true)]
        pages: Vec<OrganizeEntry>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Stamp text diagonally across every page
    Watermark {
        input: PathBuf,
        #[arg(short, long)]
        text: Option<String>,
        /// Fill opacity between 0 and 1
        #[arg(long)]
        opacity: Option<f32>,
        /// Colour as #RRGGBB
        #[arg(long)]
        color: Option<Rgb>,
        #[arg(long)]
        font_size: Option<f32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a PDF with one page per image
    ImagesToPdf {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// high (keep JPEGs as-is), medium, or low
        #[arg(short, long, default_value = "high")]
        quality: ImagePdfQuality,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export every page as page-N.jpg, packed into one ZIP
    PdfToJpg {
        input: PathBuf,
        /// ZIP archive to write (default: <input>-images.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write loose images into this directory instead of a ZIP
        #[arg(long, conflicts_with = "output")]
        out_dir: Option<PathBuf>,
        /// Password, if the PDF is protected
        #[arg(long)]
        password: Option<String>,
    },

    /// Downscale and re-encode an image
    CompressImage {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Quality between 0 and 1 (JPEG only)
        #[arg(short, long)]
        quality: Option<f32>,
        /// Search for the best quality under this many KiB
        #[arg(long)]
        target_kb: Option<u32>,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        /// jpeg, png, or webp
        #[arg(short, long)]
        format: Option<ImageFormat>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

/// Run one command to completion.
pub fn run(command: Command, services: &AppServices) -> Result<()> {
    match command {
        Command::Unlock {
            input,
            output,
            password,
            name,
            yob,
        } => {
            let password = resolve_password(password, name.as_deref(), yob.as_deref())?;
            let source = read_input(&input, DocumentType::Pdf)?;
            let unlocked = services.pipeline().unlock_pdf(&source, &password)?;
            let output = output.unwrap_or_else(|| sibling(&input, "unlocked", "pdf"));
            write_output(&output, &unlocked, Some(source.len()))
        }

        Command::Compress {
            input,
            output,
            level,
        } => {
            let source = read_input(&input, DocumentType::Pdf)?;
            let compressed = services.pipeline().compress_pdf(&source, level)?;
            let output = output.unwrap_or_else(|| sibling(&input, "compressed", "pdf"));
            write_output(&output, &compressed, Some(source.len()))
        }

        Command::Merge { inputs, output } => {
            let sources = inputs
                .iter()
                .map(|path| read_input(path, DocumentType::Pdf))
                .collect::<Result<Vec<_>>>()?;
            let slices: Vec<&[u8]> = sources.iter().map(Vec::as_slice).collect();
            write_output(&output, &merge_pdfs(&slices)?, None)
        }

        Command::Split {
            input,
            pages,
            output,
        } => {
            let reader = open_pdf(&input)?;
            let split = reader.split(pages)?;
            let suffix = format!("pages-{}-{}", pages.start, pages.end);
            let output = output.unwrap_or_else(|| sibling(&input, &suffix, "pdf"));
            write_output(&output, &split, None)
        }

        Command::Rotate {
            input,
            degrees,
            output,
        } => {
            let rotation = Rotation::from_degrees(degrees)?;
            let rotated = open_pdf(&input)?.rotate_all(rotation)?;
            let output = output.unwrap_or_else(|| sibling(&input, "rotated", "pdf"));
            write_output(&output, &rotated, None)
        }

        Command::Organize {
            input,
            pages,
            output,
        } => {
            let organized = open_pdf(&input)?.organize(&pages)?;
            let output = output.unwrap_or_else(|| sibling(&input, "organized", "pdf"));
            write_output(&output, &organized, None)
        }

        Command::Watermark {
            input,
            text,
            opacity,
            color,
            font_size,
            output,
        } => {
            let defaults = &services.config().watermark;
            let options = WatermarkOptions {
                text: text.unwrap_or_else(|| defaults.text.clone()),
                opacity: opacity.unwrap_or(defaults.opacity),
                color: color.unwrap_or(defaults.color),
                font_size: font_size.unwrap_or(defaults.font_size),
                angle_degrees: defaults.angle_degrees,
            };
            let marked = open_pdf(&input)?.watermark(&options)?;
            let output = output.unwrap_or_else(|| sibling(&input, "watermarked", "pdf"));
            write_output(&output, &marked, None)
        }

        Command::ImagesToPdf {
            inputs,
            quality,
            output,
        } => {
            let images = inputs
                .iter()
                .map(|path| read_image(path))
                .collect::<Result<Vec<_>>>()?;
            let slices: Vec<&[u8]> = images.iter().map(Vec::as_slice).collect();
            let pdf = PdfWriter::new().images_to_pdf(&slices, quality)?;
            write_output(&output, &pdf, None)
        }

        Command::PdfToJpg {
            input,
            output,
            out_dir,
            password,
        } => {
            let source = read_input(&input, DocumentType::Pdf)?;
            let password = password.map(Password::new);
            let pages = services
                .pipeline()
                .export_pages(&source, password.as_ref())?;
            write_pages(&input, &pages, output, out_dir)
        }

        Command::CompressImage {
            input,
            output,
            quality,
            target_kb,
            max_width,
            max_height,
            format,
        } => {
            let defaults = &services.config().image;
            let options = ImageCompressionOptions {
                quality: quality.unwrap_or(defaults.quality),
                target_size_kb: target_kb.or(defaults.target_size_kb),
                max_width: max_width.unwrap_or(defaults.max_width),
                max_height: max_height.unwrap_or(defaults.max_height),
                format: format.unwrap_or(defaults.format),
            };
            let data = read_image(&input)?;
            let compressed = compress_image(&data, &options)?;
            if !compressed.within_target {
                eprintln!(
                    "warning: could not reach {} KiB even at the lowest quality",
                    options.target_size_kb.unwrap_or_default()
                );
            }
            let output = output.unwrap_or_else(|| {
                sibling(&input, "compressed", compressed.format.extension())
            });
            write_output(&output, &compressed.bytes, Some(data.len()))
        }

        Command::Config { write } => {
            let json = serde_json::to_string_pretty(services.config())?;
            println!("{json}");
            if write {
                services.save_config()?;
                println!("Saved to {}", services.config_path().display());
            }
            Ok(())
        }
    }
}

// -- Helpers ------------------------------------------------------------------

/// Use the password as given, or derive it from name and year of birth.
fn resolve_password(
    password: Option<String>,
    name: Option<&str>,
    yob: Option<&str>,
) -> Result<Password> {
    match (password, name, yob) {
        (Some(password), _, _) => Ok(Password::new(password)),
        (None, Some(name), Some(yob)) => {
            if name.trim().is_empty() {
                return Err(PaperkitError::InvalidInput("name is empty".into()));
            }
            validate_year_of_birth(yob)?;
            Ok(derive_password(name, yob))
        }
        _ => Err(PaperkitError::InvalidInput(
            "give --password, or both --name and --yob".into(),
        )),
    }
}

/// Read a file and check its magic bytes match `expected`.
fn read_input(path: &Path, expected: DocumentType) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    match DocumentType::sniff(&bytes) {
        Some(kind) if kind == expected => Ok(bytes),
        Some(kind) => Err(PaperkitError::UnsupportedDocument(format!(
            "{} is {}, expected {}",
            path.display(),
            kind.mime_type(),
            expected.mime_type()
        ))),
        None => Err(PaperkitError::UnsupportedDocument(format!(
            "{} is not a recognised {}",
            path.display(),
            expected.mime_type()
        ))),
    }
}

/// Read a file that must be a decodable raster image.
fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    let kind = DocumentType::sniff(&bytes).or_else(|| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentType::from_extension)
    });
    match kind {
        Some(kind) if kind.is_decodable_image() => Ok(bytes),
        Some(kind) => Err(PaperkitError::UnsupportedDocument(kind.mime_type().into())),
        None => Err(PaperkitError::UnsupportedDocument(format!(
            "{} is not a recognised image",
            path.display()
        ))),
    }
}

fn open_pdf(path: &Path) -> Result<PdfReader> {
    let bytes = read_input(path, DocumentType::Pdf)?;
    PdfReader::from_bytes(&bytes)
}

/// Exported pages go into `<input>-images.zip` unless a directory is asked for.
fn write_pages(
    input: &Path,
    pages: &[PageImage],
    output: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(&dir)?;
        for page in pages {
            std::fs::write(dir.join(&page.name), &page.bytes)?;
        }
        info!(dir = %dir.display(), pages = pages.len(), "Pages written");
        println!("Wrote {} pages to {}", pages.len(), dir.display());
        return Ok(());
    }

    let archive = zip_pages(pages)?;
    let output = output.unwrap_or_else(|| sibling(input, "images", "zip"));
    write_output(&output, &archive, None)
}

/// `dir/report.pdf` + `unlocked` → `dir/report-unlocked.pdf`.
fn sibling(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    input.with_file_name(format!("{}-{suffix}.{extension}", file_stem(input)))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into())
}

fn write_output(path: &Path, bytes: &[u8], input_len: Option<usize>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Output written");

    match input_len {
        Some(before) => println!(
            "Wrote {} ({}, was {})",
            path.display(),
            human_size(bytes.len()),
            human_size(before)
        ),
        None => println!("Wrote {} ({})", path.display(), human_size(bytes.len())),
    }
    Ok(())
}

fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KIB {
        format!("{bytes} B")
    } else if value < KIB * KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{:.1} MiB", value / (KIB * KIB))
    }
}
