use style_transfer as st;

fn main() -> Result<(), st::Error> {
    let session = st::Session::builder()
        // sketch styles produce a grayscale image
        .style(st::Style::OpenSketch)
        .model_dir("models")
        // stylize up to 2 images at the same time
        .threads(2)
        .build()?;

    let inputs = ["imgs/portrait.jpg", "imgs/street.jpg", "imgs/cat.jpg"];

    let results = session.run_batch(
        inputs.iter(),
        Some(Box::new(|update: st::BatchUpdate| {
            println!("{}/{} images done", update.current, update.total);
        })),
    );

    for (i, res) in results.into_iter().enumerate() {
        res?.save(format!("out/02_{}.png", i))?;
    }

    Ok(())
}
