use std::sync::{Arc, Mutex};
use style_transfer as st;
use st::image::{self, GenericImageView};
use st::tensor::ArrayD;

/// Hands the normalized input straight back
struct Echo;

impl st::Interpreter for Echo {
    fn run(&self, input: st::tensor::Array4<f32>) -> Result<ArrayD<f32>, st::Error> {
        Ok(input.into_dyn())
    }
}

/// Produces a tensor filled with a single value
struct Constant {
    channels: usize,
    value: f32,
}

impl st::Interpreter for Constant {
    fn run(&self, input: st::tensor::Array4<f32>) -> Result<ArrayD<f32>, st::Error> {
        let shape = input.shape();
        Ok(ArrayD::from_elem(
            vec![1, shape[1], shape[2], self.channels],
            self.value,
        ))
    }
}

/// Fails every other call, starting with the first
struct Flaky(Mutex<usize>);

impl st::Interpreter for Flaky {
    fn run(&self, input: st::tensor::Array4<f32>) -> Result<ArrayD<f32>, st::Error> {
        let mut calls = self.0.lock().unwrap();
        *calls += 1;

        if *calls % 2 == 1 {
            Err(st::Error::Inference("out of memory".to_owned()))
        } else {
            Ok(input.into_dyn())
        }
    }
}

struct OnGpu;

impl st::Interpreter for OnGpu {
    fn run(&self, input: st::tensor::Array4<f32>) -> Result<ArrayD<f32>, st::Error> {
        Ok(input.into_dyn())
    }

    fn delegate(&self) -> st::Delegate {
        st::Delegate::Gpu
    }
}

fn rgb_spec(size: u32) -> st::ModelSpec {
    st::ModelSpec::custom(
        "echo",
        "echo.onnx",
        st::OutputKind::Rgb,
        st::Normalization::SignedUnit,
    )
    .with_input_size(size)
}

fn gray_spec(size: u32) -> st::ModelSpec {
    st::ModelSpec::custom(
        "sketch",
        "sketch.tflite",
        st::OutputKind::Grayscale,
        st::Normalization::Unit,
    )
    .with_input_size(size)
}

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> image::DynamicImage {
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb(rgb),
    ))
}

#[test]
fn rgb_model_round_trips_content() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(16))
        .interpreter(Echo)
        .build()
        .unwrap();

    let stylized = session.run(solid(16, 16, [12, 200, 97])).unwrap();
    let img = stylized.as_ref();

    assert_eq!(img.color(), image::ColorType::Rgb8);
    assert_eq!(img.dimensions(), (16, 16));
    assert!(img.to_rgb8().pixels().all(|p| p.0 == [12, 200, 97]));
}

#[test]
fn content_is_resized_to_model_input() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(8))
        .interpreter(Echo)
        .build()
        .unwrap();

    let stylized = session.run(solid(40, 20, [255, 255, 255])).unwrap();
    assert_eq!(stylized.into_image().dimensions(), (8, 8));
}

#[test]
fn input_size_override_applies_to_builtin_styles() {
    let session = st::Session::builder()
        .style(st::Style::Contour)
        .input_size(4)
        .interpreter(Constant {
            channels: 1,
            value: 0.0,
        })
        .build()
        .unwrap();

    assert_eq!(session.model().name, "contour_style");
    assert_eq!(session.model().output, st::OutputKind::Grayscale);

    let stylized = session.run(solid(9, 9, [1, 2, 3])).unwrap();
    assert_eq!(stylized.as_ref().dimensions(), (4, 4));
}

#[test]
fn sketch_models_produce_grayscale() {
    let session = st::Session::builder()
        .model_spec(gray_spec(8))
        .interpreter(Constant {
            channels: 1,
            value: 1.0,
        })
        .build()
        .unwrap();

    let stylized = session.run(solid(8, 8, [0, 0, 0])).unwrap();
    let img = stylized.into_image();

    assert_eq!(img.color(), image::ColorType::L8);
    assert!(img.to_luma8().pixels().all(|p| p[0] == 255));
}

#[test]
fn sketch_model_rejects_color_tensor() {
    let session = st::Session::builder()
        .model_spec(gray_spec(8))
        .interpreter(Echo)
        .build()
        .unwrap();

    match session.run(solid(8, 8, [0, 0, 0])) {
        Err(e @ st::Error::OutputShape(_)) => {
            assert_eq!(
                e.to_string(),
                "the model produced a tensor of shape [1, 8, 8, 3], but [1, 8, 8, 1] was expected"
            );
        }
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("a color tensor was accepted by a grayscale model"),
    }
}

#[test]
fn execution_log_lists_every_stage() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(8))
        .threads(2)
        .interpreter(Echo)
        .build()
        .unwrap();

    let stylized = session.run(solid(8, 8, [5, 5, 5])).unwrap();
    let timings = *stylized.timings();

    assert_eq!(timings.style_predict, std::time::Duration::default());
    assert!(timings.full >= timings.style_transfer);
    assert!(timings.full >= timings.post_process);

    let log = stylized.log().to_string();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "Input Image Size: 8 x 8");
    assert_eq!(lines[1], "GPU enabled: false");
    assert_eq!(lines[2], "Number of threads: 2");
    assert!(lines[3].starts_with("Transferring style execution time: "));
    assert!(lines[4].starts_with("Post-process execution time: "));
    assert!(lines[5].starts_with("Full execution time: "));
    assert!(lines[5].ends_with(" ms"));
}

#[test]
fn execution_log_reports_the_delegate_in_use() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .use_gpu(true)
        .interpreter(OnGpu)
        .build()
        .unwrap();

    assert_eq!(session.options().delegate, st::Delegate::Gpu);
    let stylized = session.run(solid(4, 4, [0, 0, 0])).unwrap();
    assert!(stylized.log().gpu_enabled);

    // Asking for the GPU doesn't help if the interpreter runs on the CPU
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .use_gpu(true)
        .interpreter(Echo)
        .build()
        .unwrap();

    let stylized = session.run(solid(4, 4, [0, 0, 0])).unwrap();
    assert!(!stylized.log().gpu_enabled);
}

#[test]
fn failed_run_does_not_poison_session() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .interpreter(Flaky(Mutex::new(0)))
        .build()
        .unwrap();

    assert!(matches!(
        session.run(solid(4, 4, [9, 9, 9])),
        Err(st::Error::Inference(_))
    ));
    assert!(session.run(solid(4, 4, [9, 9, 9])).is_ok());
}

#[test]
fn undecodable_content_is_an_image_error() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .interpreter(Echo)
        .build()
        .unwrap();

    assert!(matches!(
        session.run(st::ImageSource::Memory(b"not an image")),
        Err(st::Error::Image(_))
    ));
}

#[test]
fn batch_keeps_input_order() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .threads(3)
        .interpreter(Echo)
        .build()
        .unwrap();

    let mut sources: Vec<st::ImageSource<'_>> = (0..7u8)
        .map(|i| solid(4, 4, [i * 30, 0, 0]).into())
        .collect();
    sources.insert(3, st::ImageSource::Memory(b"garbage"));

    let updates = Arc::new(Mutex::new(Vec::new()));
    let progress = {
        let updates = updates.clone();
        move |update: st::BatchUpdate| updates.lock().unwrap().push((update.current, update.total))
    };

    let results = session.run_batch(sources, Some(Box::new(progress)));
    assert_eq!(results.len(), 8);

    let reds: Vec<_> = results
        .iter()
        .map(|res| {
            res.as_ref()
                .ok()
                .map(|stylized| stylized.as_ref().to_rgb8().get_pixel(0, 0)[0])
        })
        .collect();

    assert_eq!(
        reds,
        [
            Some(0),
            Some(30),
            Some(60),
            None,
            Some(90),
            Some(120),
            Some(150),
            Some(180)
        ]
    );

    let updates = updates.lock().unwrap();
    assert_eq!(updates.last(), Some(&(8, 8)));
    assert!(updates.windows(2).all(|w| w[0].0 < w[1].0));
}

#[test]
fn single_threaded_batch() {
    let session = st::Session::builder()
        .model_spec(gray_spec(4))
        .threads(1)
        .interpreter(Constant {
            channels: 1,
            value: 0.0,
        })
        .build()
        .unwrap();

    let results = session.run_batch(vec![solid(4, 4, [1, 1, 1]), solid(2, 2, [0, 0, 0])], None);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Result::is_ok));
}

#[test]
fn empty_batch() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .interpreter(Echo)
        .build()
        .unwrap();

    let results = session.run_batch(Vec::<st::ImageSource<'_>>::new(), None);
    assert!(results.is_empty());
}

#[test]
fn invalid_parameters_are_rejected() {
    let res = st::Session::builder()
        .model_spec(rgb_spec(4))
        .threads(0)
        .interpreter(Echo)
        .build();
    assert!(matches!(res, Err(st::Error::InvalidRange(_))));

    let res = st::Session::builder()
        .model_spec(rgb_spec(4))
        .input_size(0)
        .interpreter(Echo)
        .build();
    assert!(matches!(res, Err(st::Error::InvalidRange(_))));

    let res = st::Session::builder()
        .model_spec(rgb_spec(4))
        .threads(100_000)
        .interpreter(Echo)
        .build();
    assert!(matches!(res, Err(st::Error::InvalidRange(_))));

    let res = st::Session::builder()
        .model_spec(rgb_spec(4))
        .input_size(st::model::MAX_INPUT_SIZE + 1)
        .interpreter(Echo)
        .build();
    match res {
        Err(e @ st::Error::InvalidRange(_)) => assert_eq!(
            e.to_string(),
            "parameter 'input-size' - value '4097' is outside the range of 1-4096"
        ),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("an oversized input was accepted"),
    }
}

#[test]
fn missing_model_file_fails_to_build() {
    let res = st::Session::builder()
        .style(st::Style::Selfie2Anime)
        .model_dir("this/dir/does/not/exist")
        .build();

    assert!(matches!(res, Err(st::Error::Io(_))));
}

#[test]
fn writes_encoded_image() {
    let session = st::Session::builder()
        .model_spec(rgb_spec(4))
        .interpreter(Echo)
        .build()
        .unwrap();

    let stylized = session.run(solid(4, 4, [40, 80, 120])).unwrap();

    let mut png = Vec::new();
    stylized
        .write(&mut png, image::ImageOutputFormat::Png)
        .unwrap();

    let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(3, 3).0, [40, 80, 120]);

    let dir = std::env::temp_dir().join("style-transfer-session-test");
    let path = dir.join("nested").join("out.png");
    stylized.save(&path).unwrap();
    assert_eq!(image::open(&path).unwrap().dimensions(), (4, 4));
}
