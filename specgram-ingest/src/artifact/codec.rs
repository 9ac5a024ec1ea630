//! PNG artifact encoding and decoding
//!
//! One pixel per grid cell: `x` = time frame, `y` = frequency bin. Each 8-bit
//! pixel packs one quantized integer:
//!
//! | Packing | R          | G         | B        | A           |
//! |---------|------------|-----------|----------|-------------|
//! | `Rgba`  | bits 16-23 | bits 8-15 | bits 0-7 | bits 24-31  |
//! | `Rgb`   | bits 16-23 | bits 8-15 | bits 0-7 | (none)      |
//!
//! `Rgb` keeps only the low 24 bits. Decoding reads the packing from the PNG
//! color type.

use super::quantize::QuantizedGrid;
use crate::error::{AssetIoError, SpectroError};
use ndarray::Array2;
use png::{BitDepth, ColorType};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File extension of persisted artifacts
pub const ARTIFACT_EXTENSION: &str = "png";

/// Suffix of artifacts still being written
pub const TEMP_SUFFIX: &str = "tmp";

/// How a quantized integer is stored in a pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelPacking {
    /// Lossless 32-bit packing
    #[default]
    Rgba,
    /// Low 24 bits only
    Rgb,
}

impl PixelPacking {
    fn color_type(&self) -> ColorType {
        match self {
            PixelPacking::Rgba => ColorType::Rgba,
            PixelPacking::Rgb => ColorType::Rgb,
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelPacking::Rgba => 4,
            PixelPacking::Rgb => 3,
        }
    }

    fn pack(&self, value: u32, out: &mut Vec<u8>) {
        let [high, r, g, b] = value.to_be_bytes();
        out.extend_from_slice(&[r, g, b]);
        if *self == PixelPacking::Rgba {
            out.push(high);
        }
    }

    fn unpack(&self, pixel: &[u8]) -> u32 {
        let high = match self {
            PixelPacking::Rgba => pixel[3],
            PixelPacking::Rgb => 0,
        };
        u32::from_be_bytes([high, pixel[0], pixel[1], pixel[2]])
    }
}

impl FromStr for PixelPacking {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgba" => Ok(PixelPacking::Rgba),
            "rgb" => Ok(PixelPacking::Rgb),
            other => Err(SpectroError::InvalidConfig(format!(
                "unknown pixel packing '{}'",
                other
            ))),
        }
    }
}

/// Decoded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrogramImage {
    width: usize,
    height: usize,
    packing: PixelPacking,
    pixels: Vec<u32>,
}

impl SpectrogramImage {
    /// Time-axis length
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frequency-axis length
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn packing(&self) -> PixelPacking {
        self.packing
    }

    /// Value at time frame `x`, frequency bin `y`
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// All frequency bins of time frame `x`
    pub fn column(&self, x: usize) -> Option<Vec<u32>> {
        (x < self.width).then(|| {
            (0..self.height)
                .map(|y| self.pixels[y * self.width + x])
                .collect()
        })
    }

    /// Scanline-ordered values
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn is_all_zero(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    /// Values as `[time][frequency]`, the orientation of the source matrix
    pub fn to_matrix(&self) -> Array2<u32> {
        Array2::from_shape_fn((self.width, self.height), |(x, y)| {
            self.pixels[y * self.width + x]
        })
    }
}

/// `<path>.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Encode `grid` as a PNG at `path`
///
/// Writes `<path>.tmp` and renames it into place. On failure the temporary
/// file is removed and `path` is left as it was.
pub fn encode_artifact(
    grid: &QuantizedGrid,
    packing: PixelPacking,
    path: &Path,
) -> Result<(), AssetIoError> {
    let temp_path = temp_path_for(path);
    let result = write_png(grid, packing, &temp_path)
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(AssetIoError::from));

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn write_png(grid: &QuantizedGrid, packing: PixelPacking, path: &Path) -> Result<(), AssetIoError> {
    let mut bytes = Vec::with_capacity(grid.values().len() * packing.bytes_per_pixel());
    for &value in grid.values() {
        packing.pack(value, &mut bytes);
    }

    let mut out = BufWriter::new(File::create(path)?);
    {
        let mut encoder = png::Encoder::new(&mut out, grid.width() as u32, grid.height() as u32);
        encoder.set_color(packing.color_type());
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&bytes)?;
        writer.finish()?;
    }
    out.flush()?;
    Ok(())
}

/// Decode a PNG artifact
pub fn decode_artifact(path: &Path) -> Result<SpectrogramImage, AssetIoError> {
    let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.bit_depth != BitDepth::Eight {
        return Err(AssetIoError::UnsupportedArtifact(format!(
            "{}: bit depth {:?}",
            path.display(),
            info.bit_depth
        )));
    }
    let packing = match info.color_type {
        ColorType::Rgba => PixelPacking::Rgba,
        ColorType::Rgb => PixelPacking::Rgb,
        other => {
            return Err(AssetIoError::UnsupportedArtifact(format!(
                "{}: color type {:?}",
                path.display(),
                other
            )))
        }
    };

    let width = info.width as usize;
    let height = info.height as usize;
    let bpp = packing.bytes_per_pixel();
    let mut pixels = Vec::with_capacity(width * height);
    for line in buf.chunks(info.line_size).take(height) {
        pixels.extend(line[..width * bpp].chunks_exact(bpp).map(|px| packing.unpack(px)));
    }

    Ok(SpectrogramImage {
        width,
        height,
        packing,
        pixels,
    })
}
