use std::env;
use std::io;
use std::io::prelude::*;
use std::process;
use std::time::Instant;

use log::info;

use reflectance_marker::text::write_detailed;
use reflectance_marker::{CurveBatch, CurveParser, MarkerParameters, ParsingMode, SmoothingMethod};

const USAGE: &str = "Usage: reflectance-marker -a <n> -r <n> [options] [files]

Options:
  -a, --amplitude <n>  Amplitude to detect, in percentage [0, 100]  [default: 20]
  -r, --range <n>      Range over which to perform the detection     [default: 50]
  -l, --lookahead <n>  Slope detection lookahead                     [default: 5]
  -s, --smooth <n>     Smoothing window size                         [default: 10]
  -m, --multi          Select the multi wavelength column format
      --auto           Detect the column format from the first row
  -h, --header         Skip header
  -c, --reference      Use the reference smoothing, re-summing every window
      --help           Show this message";

#[derive(Debug)]
struct Arguments {
    parameters: MarkerParameters,
    parser: CurveParser,
    method: SmoothingMethod,
    files: Vec<String>,
}

/// Any number with no fractional part is accepted, so `20` and `20.0` are equal
fn integer_argument(name: &str, value: Option<String>) -> Result<f64, String> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .ok_or_else(|| format!("argument `{name}' must be an integer"))
}

fn count_argument(name: &str, value: Option<String>) -> Result<usize, String> {
    let value = integer_argument(name, value)?;
    if value < 0.0 {
        return Err(format!("argument `{name}' must not be negative"));
    }
    Ok(value as usize)
}

impl Arguments {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Option<Self>, String> {
        let mut parameters = MarkerParameters::default();
        let mut skip_header = false;
        let mut parsing_mode = ParsingMode::Single;
        let mut method = SmoothingMethod::RunningSum;
        let mut files = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-a" | "--amplitude" => {
                    parameters.amplitude = integer_argument("-a --amplitude", args.next())?
                }
                "-r" | "--range" => {
                    parameters.range = integer_argument("-r --range", args.next())?
                }
                "-l" | "--lookahead" => {
                    parameters.lookahead = count_argument("-l --lookahead", args.next())?
                }
                "-s" | "--smooth" => {
                    parameters.smoothing_window = count_argument("-s --smooth", args.next())?
                }
                "-m" | "--multi" => parsing_mode = ParsingMode::Multi,
                "--auto" => parsing_mode = ParsingMode::Auto,
                "-h" | "--header" => skip_header = true,
                "-c" | "--reference" => method = SmoothingMethod::Resum,
                "--help" => return Ok(None),
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(format!("unknown argument `{flag}'"))
                }
                _ => files.push(arg),
            }
        }

        parameters.validate().map_err(|e| e.to_string())?;

        Ok(Some(Self {
            parameters,
            parser: CurveParser::new(skip_header, parsing_mode),
            method,
            files,
        }))
    }
}

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    let args = match Arguments::parse(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(message) => {
            eprintln!("\n  error: {message}\n\n{USAGE}");
            process::exit(1);
        }
    };
    info!("Running with {:?}", args);

    let batch = CurveBatch::new(args.parser, args.parameters, args.method);
    let start = Instant::now();
    let entries = batch.analyse_files(&args.files);
    info!(
        "Analysed {} files in {} milliseconds",
        entries.len(),
        start.elapsed().as_millis()
    );

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    for entry in entries.iter() {
        match &entry.result {
            Ok(marker) => {
                write_detailed(marker, &mut writer)?;
                writeln!(writer)?;
            }
            Err(err) => writeln!(writer, "Error reading file {}:   {}", entry.name, err)?,
        }
    }
    writer.flush()?;
    Ok(())
}
