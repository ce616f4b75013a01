use structopt::StructOpt;

mod progress;

use std::path::{Path, PathBuf};
use style_transfer::{
    image::ImageOutputFormat as ImgFmt, Config, Delegate, Error, ImageSource, ModelSpec,
    Session, Stylized,
};

fn parse_img_fmt(input: &str) -> Result<ImgFmt, String> {
    let fmt = match input {
        "png" => ImgFmt::Png,
        "jpg" => ImgFmt::Jpeg(90),
        "bmp" => ImgFmt::Bmp,
        other => {
            return Err(format!(
                "image format `{}` not one of: 'png', 'jpg', 'bmp'",
                other
            ))
        }
    };

    Ok(fmt)
}

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
struct Stylize {
    /// The style to apply, see `list-styles` for the available ones.
    /// Defaults to `hayao_style`
    #[structopt(long)]
    style: Option<String>,
    /// Load the model from this file instead of the style's file in the model
    /// directory. The style still decides how the output is post-processed.
    #[structopt(long, parse(from_os_str))]
    model: Option<PathBuf>,
    /// The path to save the stylized image to, the file extension of the path
    /// determines the image format used. You may use `-` for stdout.
    ///
    /// When more than one content image is given this is a directory, and
    /// each image is saved as `<name>_<style>.png` inside of it.
    #[structopt(long = "out", short, parse(from_os_str))]
    output_path: PathBuf,
    /// The format to save the stylized image as.
    ///
    /// NOTE: this will only apply when stdout is specified via `-o -`, otherwise the image
    /// format is determined by the file extension of the path provided to `-o`
    #[structopt(
        long,
        default_value = "png",
        parse(try_from_str = parse_img_fmt)
    )]
    out_fmt: ImgFmt,
    /// Print the execution log with the per-stage timings to stderr
    #[structopt(long)]
    timings: bool,
    /// Don't show a progress bar when stylizing several images
    #[structopt(long)]
    no_progress: bool,
    /// Path(s) to the content images
    #[structopt(parse(from_os_str), required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Applies a style to one or more content images
    #[structopt(name = "stylize")]
    Stylize(Stylize),
    /// Lists the styles that can be selected, and their model files
    #[structopt(name = "list-styles")]
    ListStyles,
}

#[derive(StructOpt)]
#[structopt(
    name = "style-transfer",
    about = "Applies pre-trained anime and sketch styles to images",
    rename_all = "kebab-case"
)]
struct Opt {
    /// A YAML configuration file, any flag given on the command line takes
    /// precedence over the same setting in the file
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// The directory the model files of the built-in styles are loaded from.
    /// Defaults to `models`
    #[structopt(long, parse(from_os_str))]
    model_dir: Option<PathBuf>,
    /// Request the GPU delegate, falls back to the CPU if it is unavailable
    #[structopt(long)]
    gpu: bool,
    /// The number of CPU threads, which is also the number of images that are
    /// stylized concurrently. Defaults to 4
    #[structopt(short = "t", long)]
    threads: Option<usize>,
    /// Overrides the edge length of the square model input
    #[structopt(long)]
    in_size: Option<u32>,
    /// Increase logging, `-v` for info and `-vv` for debug. `RUST_LOG`
    /// overrides this
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
    #[structopt(subcommand)]
    cmd: Subcommand,
}

fn print_error(e: &dyn std::fmt::Display) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("\x1b[31merror\x1b[0m: {}", e);
    } else {
        eprintln!("error: {}", e);
    }
}

fn main() {
    let args = Opt::from_args();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match real_main(args) {
        Ok(0) => {}
        Ok(_failed) => std::process::exit(1),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Returns the number of content images that failed to be stylized
fn real_main(args: Opt) -> Result<usize, Error> {
    let mut config = match args.config {
        Some(ref path) => Config::from_yaml_file(path)?,
        None => Config::default(),
    };

    // Flags win over the configuration file
    if let Some(dir) = args.model_dir {
        config.model_dir = Some(dir);
    }
    if let Some(threads) = args.threads {
        config.threads = Some(threads);
    }
    if args.gpu {
        config.delegate = Some(Delegate::Gpu);
    }
    if let Some(size) = args.in_size {
        config.input_size = Some(size);
    }

    match args.cmd {
        Subcommand::ListStyles => {
            for spec in config.style_specs() {
                println!(
                    "{:<16} {:<10} {}",
                    spec.name,
                    spec.output.to_string(),
                    spec.path.display()
                );
            }

            Ok(0)
        }
        Subcommand::Stylize(stylize) => run_stylize(&config, stylize),
    }
}

fn run_stylize(config: &Config, args: Stylize) -> Result<usize, Error> {
    let to_stdout = args.output_path.to_str() == Some("-");
    let is_batch = args.inputs.len() > 1;

    if is_batch && to_stdout {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "only a single content image can be written to stdout",
        )));
    }

    // Check that the extension for the path supplied by the user is one of the ones we support
    if !is_batch && !to_stdout {
        style_transfer::check_output_extension(&args.output_path)?;
    }

    let style = args
        .style
        .as_deref()
        .or_else(|| config.style.as_deref())
        .unwrap_or_else(|| style_transfer::Style::default().name());

    let mut spec: ModelSpec = config.resolve(style)?;
    if let Some(model) = args.model.clone() {
        spec.path = model;
    }

    let options = config.interpreter_options();
    let session = Session::builder()
        .model_spec(spec)
        .threads(options.threads)
        .delegate(options.delegate)
        .build()?;

    if !is_batch {
        let stylized = session.run(&args.inputs[0])?;

        if args.timings {
            eprint!("{}", stylized.log());
        }

        if to_stdout {
            let out = std::io::stdout();
            let mut out = out.lock();
            stylized.write(&mut out, args.out_fmt)?;
        } else {
            stylized.save(&args.output_path)?;
        }

        return Ok(0);
    }

    let progress: Option<Box<dyn style_transfer::BatchProgress>> = if !args.no_progress {
        Some(Box::new(progress::BatchBar::new(args.inputs.len())))
    } else {
        None
    };

    let results = session.run_batch(args.inputs.iter().map(ImageSource::from), progress);

    let mut failed = 0;
    for (input, res) in args.inputs.iter().zip(results) {
        match res.and_then(|stylized| {
            save_into(&stylized, &args.output_path, input, &session.model().name, args.timings)
        }) {
            Ok(()) => {}
            Err(e) => {
                print_error(&format_args!("{}: {}", input.display(), e));
                failed += 1;
            }
        }
    }

    Ok(failed)
}

fn save_into(
    stylized: &Stylized,
    dir: &Path,
    input: &Path,
    style: &str,
    print_timings: bool,
) -> Result<(), Error> {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_else(|| "image".into());

    let path = dir.join(format!("{}_{}.png", stem, style));

    if print_timings {
        eprint!("{}:\n{}", input.display(), stylized.log());
    }

    stylized.save(&path)
}
