use crate::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Style transfer session.
///
/// A session owns a loaded interpreter and can be run any number of times,
/// each `run()` applies the style to one content image and returns the
/// result together with the time spent in each stage.
///
/// # Example
/// ```no_run
/// let session = style_transfer::Session::builder()
///     .style(style_transfer::Style::Paprika)
///     .model_dir("models")
///     .build().expect("failed to build session");
///
/// let stylized = session.run(&"photo.jpg").expect("failed to stylize");
/// stylized.save("photo_paprika.png").expect("failed to save image");
/// ```
pub struct Session {
    interpreter: Box<dyn Interpreter>,
    spec: ModelSpec,
    options: InterpreterOptions,
}

impl Session {
    /// Creates a new session builder with default parameters.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn model(&self) -> &ModelSpec {
        &self.spec
    }

    /// The options the interpreter actually runs with, the delegate may
    /// differ from the requested one if it was unavailable.
    pub fn options(&self) -> InterpreterOptions {
        InterpreterOptions {
            threads: self.options.threads,
            delegate: self.interpreter.delegate(),
        }
    }

    /// Applies the style to a single content image.
    pub fn run<'a, I: Into<ImageSource<'a>>>(&self, content: I) -> Result<Stylized, Error> {
        tracing::info!(style = %self.spec.name, "running model");

        let size = self.spec.input_size;
        let norm = self.spec.normalization;

        let full = Instant::now();
        let pre = Instant::now();

        let content = load_dynamic_image(content.into())?.to_rgb8();
        let input = tensor::image_to_tensor(&content, size, norm);
        let pre_process = pre.elapsed();

        let transfer = Instant::now();
        let output = self.interpreter.run(input)?;
        let style_transfer = transfer.elapsed();
        tracing::debug!(
            style = %self.spec.name,
            shape = ?output.shape(),
            elapsed_ms = style_transfer.as_millis() as u64,
            "model execution completed"
        );

        let post = Instant::now();
        let image = match self.spec.output {
            OutputKind::Grayscale => {
                tracing::debug!("converting to grayscale image");
                image::DynamicImage::ImageLuma8(tensor::tensor_to_grayscale(&output, size, norm)?)
            }
            OutputKind::Rgb => {
                tracing::debug!("converting to color image");
                image::DynamicImage::ImageRgb8(tensor::tensor_to_rgb(&output, size, norm)?)
            }
        };
        let post_process = post.elapsed();

        let timings = Timings {
            pre_process,
            style_predict: Duration::default(),
            style_transfer,
            post_process,
            full: full.elapsed(),
        };
        tracing::debug!(full_ms = timings.full.as_millis() as u64, "time to run everything");

        let options = self.options();
        Ok(Stylized {
            image,
            timings,
            log: ExecutionLog {
                input_size: size,
                gpu_enabled: options.delegate == Delegate::Gpu,
                threads: options.threads,
                timings,
            },
        })
    }

    /// Applies the style to many content images, sharing the loaded model
    /// between up to `threads` workers.
    ///
    /// Results are returned in the same order as `contents`, a failure for
    /// one image doesn't affect the others.
    pub fn run_batch<'a, I, E>(
        &self,
        contents: I,
        mut progress: Option<Box<dyn BatchProgress + 'a>>,
    ) -> Vec<Result<Stylized, Error>>
    where
        I: IntoIterator<Item = E>,
        E: Into<ImageSource<'a>>,
    {
        let contents: Vec<ImageSource<'a>> = contents.into_iter().map(Into::into).collect();
        let total = contents.len();
        let n_workers = self.options.threads.min(total);

        let mut results: Vec<Option<Result<Stylized, Error>>> =
            std::iter::repeat_with(|| None).take(total).collect();

        let report = |progress: &mut Option<Box<dyn BatchProgress + 'a>>, current| {
            if let Some(ref mut progress) = progress {
                progress.update(BatchUpdate { current, total });
            }
        };

        // for WASM we do not have threads and crossbeam panics,
        // so let's just run everything on this thread
        if cfg!(target_arch = "wasm32") || n_workers <= 1 {
            for (i, content) in contents.into_iter().enumerate() {
                results[i] = Some(self.run(content));
                report(&mut progress, i + 1);
            }
        } else {
            let finished = Mutex::new(Vec::with_capacity(total));

            #[cfg(not(target_arch = "wasm32"))]
            {
                let queue = Mutex::new(contents.into_iter().enumerate());
                let done = AtomicUsize::new(0);
                let remaining_threads = AtomicUsize::new(n_workers);

                struct Retire<'r>(&'r AtomicUsize);

                impl Drop for Retire<'_> {
                    fn drop(&mut self) {
                        self.0.fetch_sub(1, Ordering::SeqCst);
                    }
                }

                let worker_fn = || {
                    let _retire = Retire(&remaining_threads);
                    loop {
                        let next = match queue.lock() {
                            Ok(mut queue) => queue.next(),
                            Err(_) => None,
                        };

                        let (i, content) = match next {
                            Some(next) => next,
                            None => break,
                        };

                        let res = self.run(content);
                        if let Ok(mut finished) = finished.lock() {
                            finished.push((i, res));
                        }
                        done.fetch_add(1, Ordering::SeqCst);
                    }
                };

                let scoped = crossbeam_utils::thread::scope(|scope| {
                    for _ in 0..n_workers {
                        scope.spawn(|_| (worker_fn)());
                    }

                    let mut last = 0;
                    loop {
                        let workers_left = remaining_threads.load(Ordering::SeqCst);
                        let current = done.load(Ordering::SeqCst);

                        if current != last {
                            report(&mut progress, current);
                            last = current;
                        }

                        if workers_left == 0 {
                            break;
                        }

                        std::thread::sleep(Duration::from_millis(10));
                    }
                });

                if scoped.is_err() {
                    tracing::warn!("a batch worker panicked");
                }
            }

            let finished = finished
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for (i, res) in finished {
                results[i] = Some(res);
            }
        }

        results
            .into_iter()
            .map(|res| {
                res.unwrap_or_else(|| Err(Error::Inference("the batch worker panicked".to_owned())))
            })
            .collect()
    }
}

/// Builds a session by choosing a model and interpreter options, calling
/// `build` loads the model.
#[derive(Default)]
pub struct SessionBuilder {
    style: Style,
    spec: Option<ModelSpec>,
    model_dir: Option<PathBuf>,
    input_size: Option<u32>,
    options: InterpreterOptions,
    interpreter: Option<Box<dyn Interpreter>>,
}

impl SessionBuilder {
    /// Creates a new `SessionBuilder`, can also be created via
    /// `Session::builder()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects one of the built-in styles.
    ///
    /// Default: `hayao_style`
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Uses a fully described model instead of a built-in style, this takes
    /// precedence over `style` and `model_dir`.
    pub fn model_spec(mut self, spec: ModelSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// The directory the built-in model files are loaded from.
    ///
    /// Default: `models`
    pub fn model_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Overrides the edge length of the square input the model is fed.
    ///
    /// Default: 256
    pub fn input_size(mut self, size: u32) -> Self {
        self.input_size = Some(size);
        self
    }

    /// The number of CPU threads, which is also the number of images that
    /// are processed concurrently by `run_batch`.
    ///
    /// Default: 4
    pub fn threads(mut self, count: usize) -> Self {
        self.options.threads = count;
        self
    }

    /// Requests the forward pass to run on the given delegate.
    ///
    /// Default: `Delegate::Cpu`
    pub fn delegate(mut self, delegate: Delegate) -> Self {
        self.options.delegate = delegate;
        self
    }

    /// Shorthand for `delegate(Delegate::Gpu)` when `use_gpu` is true
    pub fn use_gpu(self, use_gpu: bool) -> Self {
        self.delegate(if use_gpu { Delegate::Gpu } else { Delegate::Cpu })
    }

    /// Runs the session with an already constructed interpreter rather than
    /// loading the model file.
    pub fn interpreter<I: Interpreter + 'static>(mut self, interpreter: I) -> Self {
        self.interpreter = Some(Box::new(interpreter));
        self
    }

    /// Creates a `Session`, or returns an error if invalid parameters were
    /// specified or the model failed to load.
    pub fn build(self) -> Result<Session, Error> {
        self.options.validate()?;

        let spec = match self.spec {
            Some(spec) => spec,
            None => ModelSpec::for_style(
                self.style,
                self.model_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            ),
        };

        let spec = match self.input_size {
            Some(size) => spec.with_input_size(size),
            None => spec,
        };

        if spec.input_size == 0 || spec.input_size > model::MAX_INPUT_SIZE {
            return Err(Error::InvalidRange(errors::InvalidRange {
                min: 1.0,
                max: model::MAX_INPUT_SIZE as f32,
                value: spec.input_size as f32,
                name: "input-size",
            }));
        }

        let interpreter = match self.interpreter {
            Some(interpreter) => interpreter,
            None => Box::new(TractInterpreter::load(
                &spec.path,
                spec.input_size,
                self.options,
            )?),
        };

        tracing::debug!(
            style = %spec.name,
            output = %spec.output,
            threads = self.options.threads,
            delegate = %interpreter.delegate(),
            "session ready"
        );

        Ok(Session {
            interpreter,
            spec,
            options: self.options,
        })
    }
}

/// Time spent in each stage of a run
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Timings {
    /// Decoding, resizing and normalizing the content image
    pub pre_process: Duration,
    /// Predicting a style bottleneck, always zero for single network models
    pub style_predict: Duration,
    /// The forward pass
    pub style_transfer: Duration,
    /// Turning the output tensor into an image
    pub post_process: Duration,
    pub full: Duration,
}

/// Human readable summary of a run
#[derive(Copy, Clone, Debug)]
pub struct ExecutionLog {
    pub input_size: u32,
    pub gpu_enabled: bool,
    pub threads: usize,
    pub timings: Timings,
}

impl fmt::Display for ExecutionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Input Image Size: {} x {}",
            self.input_size, self.input_size
        )?;
        writeln!(f, "GPU enabled: {}", self.gpu_enabled)?;
        writeln!(f, "Number of threads: {}", self.threads)?;
        writeln!(
            f,
            "Transferring style execution time: {} ms",
            self.timings.style_transfer.as_millis()
        )?;
        writeln!(
            f,
            "Post-process execution time: {} ms",
            self.timings.post_process.as_millis()
        )?;
        writeln!(
            f,
            "Full execution time: {} ms",
            self.timings.full.as_millis()
        )
    }
}

/// The output of a single run
pub struct Stylized {
    image: image::DynamicImage,
    timings: Timings,
    log: ExecutionLog,
}

impl Stylized {
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Saves the stylized image to the specified path, the format is derived
    /// from the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent_path) = path.parent() {
            std::fs::create_dir_all(parent_path)?;
        }

        self.image.save(path)?;
        Ok(())
    }

    /// Writes the stylized image to the specified stream
    pub fn write<W: std::io::Write>(
        &self,
        writer: &mut W,
        fmt: image::ImageOutputFormat,
    ) -> Result<(), Error> {
        // The encoders want to seek, which stdout can't do
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, fmt)?;
        writer.write_all(buffer.get_ref())?;
        Ok(())
    }

    pub fn into_image(self) -> image::DynamicImage {
        self.image
    }
}

impl AsRef<image::DynamicImage> for Stylized {
    fn as_ref(&self) -> &image::DynamicImage {
        &self.image
    }
}

/// Progress of a `run_batch` call
pub struct BatchUpdate {
    /// The number of images that have been processed
    pub current: usize,
    pub total: usize,
}

/// Allows a batch run to update external callers with its progress
pub trait BatchProgress {
    fn update(&mut self, info: BatchUpdate);
}

impl<G> BatchProgress for G
where
    G: FnMut(BatchUpdate) + Send,
{
    fn update(&mut self, info: BatchUpdate) {
        self(info)
    }
}
