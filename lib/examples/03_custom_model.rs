use style_transfer as st;

fn main() -> Result<(), st::Error> {
    // models that are not part of the built-in catalogue need to say how
    // their output is laid out and how pixels are normalized
    let spec = st::ModelSpec::custom(
        "face_paint",
        "models/face_paint_512.onnx",
        st::OutputKind::Rgb,
        st::Normalization::SignedUnit,
    )
    .with_input_size(512);

    let session = st::Session::builder()
        .model_spec(spec)
        // falls back to the CPU if no GPU delegate is available
        .use_gpu(true)
        .build()?;

    let stylized = session.run(&"imgs/portrait.jpg")?;
    eprint!("{}", stylized.log());

    stylized.save("out/03.jpg")
}
