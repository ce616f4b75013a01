//! The seam between a `Session` and the inference engine.

use crate::{errors::InvalidRange, Error};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tract_onnx::prelude::*;

/// Where the forward pass is executed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Delegate {
    Cpu,
    Gpu,
}

impl Default for Delegate {
    fn default() -> Self {
        Self::Cpu
    }
}

impl FromStr for Delegate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            other => Err(format!("delegate `{}` not one of: 'cpu', 'gpu'", other)),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Delegate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Gpu => f.write_str("gpu"),
        }
    }
}

/// Interpreter configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InterpreterOptions {
    pub threads: usize,
    pub delegate: Delegate,
}

pub const DEFAULT_THREADS: usize = 4;
pub const MAX_THREADS: usize = 1024;

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            delegate: Delegate::Cpu,
        }
    }
}

impl InterpreterOptions {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: MAX_THREADS as f32,
                value: self.threads as f32,
                name: "threads",
            }));
        }

        Ok(())
    }
}

/// Runs a single forward pass of an image-to-image model.
///
/// The input is always a `[1, H, W, 3]` tensor, the output is whatever the
/// model produced, the `Session` validates its shape.
pub trait Interpreter: Send + Sync {
    fn run(&self, input: tract_ndarray::Array4<f32>) -> Result<tract_ndarray::ArrayD<f32>, Error>;

    /// The delegate the forward pass actually runs on
    fn delegate(&self) -> Delegate {
        Delegate::Cpu
    }
}

impl<I: Interpreter + ?Sized> Interpreter for Box<I> {
    fn run(&self, input: tract_ndarray::Array4<f32>) -> Result<tract_ndarray::ArrayD<f32>, Error> {
        (**self).run(input)
    }

    fn delegate(&self) -> Delegate {
        (**self).delegate()
    }
}

type Plan = TypedSimplePlan<TypedModel>;

/// An `Interpreter` backed by `tract`, reading either `.tflite` or `.onnx`
/// model files.
pub struct TractInterpreter {
    plan: Plan,
    options: InterpreterOptions,
}

impl TractInterpreter {
    /// Loads, optimizes and plans the model at `path` for a square input of
    /// `input_size` pixels.
    pub fn load<P: AsRef<Path>>(
        path: P,
        input_size: u32,
        options: InterpreterOptions,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        options.validate()?;

        tracing::debug!(
            model = %path.display(),
            delegate = %options.delegate,
            threads = options.threads,
            "loading interpreter"
        );

        let mut options = options;
        if options.delegate == Delegate::Gpu {
            tracing::warn!("no GPU delegate is available for this engine, running on the CPU");
            options.delegate = Delegate::Cpu;
        }

        // Fail early with the io error rather than the engine's message
        std::fs::metadata(path)?;

        let size = input_size as usize;
        let input_fact = f32::fact([1, size, size, 3]);

        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        let model = match ext.as_deref() {
            Some("tflite") => {
                let mut model = tract_tflite::tflite()
                    .model_for_path(path)
                    .map_err(load_err)?;
                model.set_input_fact(0, input_fact).map_err(load_err)?;
                model.into_optimized().map_err(load_err)?
            }
            Some("onnx") => tract_onnx::onnx()
                .model_for_path(path)
                .and_then(|model| model.with_input_fact(0, input_fact.into()))
                .and_then(|model| model.into_optimized())
                .map_err(load_err)?,
            _ => return Err(Error::UnsupportedModelFormat(path.display().to_string())),
        };

        let plan = SimplePlan::new(model).map_err(load_err)?;

        Ok(Self { plan, options })
    }

    pub fn options(&self) -> InterpreterOptions {
        self.options
    }
}

fn load_err(err: TractError) -> Error {
    Error::ModelLoad(format!("{:#}", err))
}

fn inference_err(err: TractError) -> Error {
    Error::Inference(format!("{:#}", err))
}

impl Interpreter for TractInterpreter {
    fn run(&self, input: tract_ndarray::Array4<f32>) -> Result<tract_ndarray::ArrayD<f32>, Error> {
        let input: Tensor = input.into();
        let outputs = self.plan.run(tvec!(input.into())).map_err(inference_err)?;

        let output = outputs
            .get(0)
            .ok_or_else(|| Error::Inference("the model produced no outputs".to_owned()))?;

        let output = output.cast_to::<f32>().map_err(inference_err)?;
        let view = output.to_array_view::<f32>().map_err(inference_err)?;

        Ok(view.to_owned())
    }

    fn delegate(&self) -> Delegate {
        self.options.delegate
    }
}
