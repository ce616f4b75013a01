use std::fmt;

#[derive(Debug)]
pub struct InvalidRange {
    pub(crate) min: f32,
    pub(crate) max: f32,
    pub(crate) value: f32,
    pub(crate) name: &'static str,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter '{}' - value '{}' is outside the range of {}-{}",
            self.name, self.value, self.min, self.max
        )
    }
}

#[derive(Debug)]
pub struct ShapeMismatch {
    pub(crate) expected: Vec<usize>,
    pub(crate) actual: Vec<usize>,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the model produced a tensor of shape {:?}, but {:?} was expected",
            self.actual, self.expected
        )
    }
}

#[derive(Debug)]
pub enum Error {
    /// An error in the image library occurred, eg failed to load/save
    Image(image::ImageError),
    /// Reading a model or writing an output failed
    Io(std::io::Error),
    /// The YAML configuration could not be parsed
    Config(serde_yaml::Error),
    /// The requested style is neither built-in nor configured
    UnknownStyle(String),
    /// The model file extension is not one the inference engine can read
    UnsupportedModelFormat(String),
    /// The user specified an image format we don't support as the output
    UnsupportedOutputFormat(String),
    /// An input parameter had an invalid range specified
    InvalidRange(InvalidRange),
    /// The inference engine failed to load or optimize the model
    ModelLoad(String),
    /// The inference engine failed while running the model
    Inference(String),
    /// The output tensor doesn't have the shape the model family requires
    OutputShape(ShapeMismatch),
}

impl Error {
    pub(crate) fn output_shape(expected: &[usize], actual: &[usize]) -> Self {
        Self::OutputShape(ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(ie) => write!(f, "{}", ie),
            Self::Io(io) => write!(f, "{}", io),
            Self::Config(ce) => write!(f, "invalid configuration: {}", ce),
            Self::UnknownStyle(name) => write!(f, "invalid style model '{}'", name),
            Self::UnsupportedModelFormat(path) => write!(
                f,
                "the model '{}' is not a supported format, expected a .tflite or .onnx file",
                path
            ),
            Self::UnsupportedOutputFormat(fmt) => {
                write!(f, "the output format '{}' is not supported", fmt)
            }
            Self::InvalidRange(ir) => write!(f, "{}", ir),
            Self::ModelLoad(msg) => write!(f, "failed to load model: {}", msg),
            Self::Inference(msg) => write!(f, "inference failed: {}", msg),
            Self::OutputShape(sm) => write!(f, "{}", sm),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(ie: image::ImageError) -> Self {
        Self::Image(ie)
    }
}

impl From<std::io::Error> for Error {
    fn from(io: std::io::Error) -> Self {
        Self::Io(io)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(ce: serde_yaml::Error) -> Self {
        Self::Config(ce)
    }
}
