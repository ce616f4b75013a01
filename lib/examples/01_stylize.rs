use style_transfer as st;

fn main() -> Result<(), st::Error> {
    let session = st::Session::builder()
        // pick one of the built-in styles, the model file is looked up
        // in the model directory
        .style(st::Style::Paprika)
        .model_dir("models")
        .build()?;

    // apply the style to a single content image
    let stylized = session.run(&"imgs/portrait.jpg")?;

    // the execution log contains the time spent in each stage
    print!("{}", stylized.log());

    // save the result to the disk
    stylized.save("out/01.png")
}
