//! The catalogue of built-in style models and the description of a resolved
//! model that a `Session` runs.

use crate::Error;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Edge length of the square content image every built-in model expects
pub const CONTENT_IMAGE_SIZE: u32 = 256;

/// Largest square input edge a session accepts
pub const MAX_INPUT_SIZE: u32 = 4096;

/// The pre-trained styles that ship with known model file names.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Style {
    Hayao,
    Paprika,
    Selfie2Anime,
    AnimeSketch,
    OpenSketch,
    Contour,
}

impl Default for Style {
    fn default() -> Self {
        Self::Hayao
    }
}

impl Style {
    /// Every built-in style, in the order they are listed to users
    pub fn all() -> &'static [Style] {
        &[
            Self::Hayao,
            Self::Paprika,
            Self::Selfie2Anime,
            Self::AnimeSketch,
            Self::OpenSketch,
            Self::Contour,
        ]
    }

    /// The key used to select this style, eg. `hayao_style`
    pub fn name(self) -> &'static str {
        match self {
            Self::Hayao => "hayao_style",
            Self::Paprika => "paprika_style",
            Self::Selfie2Anime => "selfie2anime",
            Self::AnimeSketch => "anime_sketch",
            Self::OpenSketch => "open_sketch",
            Self::Contour => "contour_style",
        }
    }

    /// File name of the model, relative to the model directory
    pub fn model_file(self) -> &'static str {
        match self {
            Self::Hayao => "animeganv2_hayao_256x256_float16_quant.tflite",
            Self::Paprika => "animeganv2_paprika_256x256_float16_quant.tflite",
            Self::Selfie2Anime => "selfie2anime_256x256_float16_quant.tflite",
            Self::AnimeSketch => "anime_style_256x256_float16.tflite",
            Self::OpenSketch => "opensketch_style_256x256_float16.tflite",
            Self::Contour => "contour_style_256x256_float16.tflite",
        }
    }

    /// Sketch models produce a single channel, everything else is color
    pub fn output_kind(self) -> OutputKind {
        match self {
            Self::AnimeSketch | Self::OpenSketch | Self::Contour => OutputKind::Grayscale,
            Self::Hayao | Self::Paprika | Self::Selfie2Anime => OutputKind::Rgb,
        }
    }

    pub fn normalization(self) -> Normalization {
        match self.output_kind() {
            OutputKind::Rgb => Normalization::SignedUnit,
            OutputKind::Grayscale => Normalization::Unit,
        }
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|style| style.name() == s)
            .ok_or_else(|| Error::UnknownStyle(s.to_owned()))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The layout of the tensor a model writes, which decides how it is turned
/// back into an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// `[1, H, W, 3]`
    Rgb,
    /// `[1, H, W, 1]`
    Grayscale,
}

impl OutputKind {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Grayscale => 1,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => f.write_str("rgb"),
            Self::Grayscale => f.write_str("grayscale"),
        }
    }
}

/// Mapping between 8-bit pixel values and the floats a model consumes and
/// produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `[0, 255]` <-> `[-1.0, 1.0]`
    SignedUnit,
    /// `[0, 255]` <-> `[0.0, 1.0]`
    Unit,
}

impl Normalization {
    #[inline]
    pub fn to_model(self, value: u8) -> f32 {
        match self {
            Self::SignedUnit => f32::from(value) / 127.5 - 1.0,
            Self::Unit => f32::from(value) / 255.0,
        }
    }

    /// Converts a model value back into a pixel, saturating values the model
    /// pushed outside of its nominal range
    #[inline]
    pub fn to_pixel(self, value: f32) -> u8 {
        let scaled = match self {
            Self::SignedUnit => (value + 1.0) * 127.5,
            Self::Unit => value * 255.0,
        };

        if scaled.is_nan() {
            0
        } else {
            scaled.round().max(0.0).min(255.0) as u8
        }
    }
}

/// Everything needed to load and post-process one model
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub path: PathBuf,
    pub output: OutputKind,
    pub normalization: Normalization,
    /// Edge length of the square input, the output has the same size
    pub input_size: u32,
}

impl ModelSpec {
    /// Resolves a built-in style to its model file inside `model_dir`
    pub fn for_style<P: AsRef<Path>>(style: Style, model_dir: P) -> Self {
        Self {
            name: style.name().to_owned(),
            path: model_dir.as_ref().join(style.model_file()),
            output: style.output_kind(),
            normalization: style.normalization(),
            input_size: CONTENT_IMAGE_SIZE,
        }
    }

    /// Describes a model that isn't part of the built-in catalogue
    pub fn custom<S: Into<String>, P: Into<PathBuf>>(
        name: S,
        path: P,
        output: OutputKind,
        normalization: Normalization,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            output,
            normalization,
            input_size: CONTENT_IMAGE_SIZE,
        }
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// The `[N, H, W, C]` shape the output tensor must have
    pub fn output_shape(&self) -> [usize; 4] {
        crate::tensor::expected_output_shape(self.output, self.input_size)
    }
}
