use crate::config::{SolverKind, load_config};
use crate::ir::ShapeKind;
use crate::layout::{compute_error_layout, compute_layout};
use crate::layout_dump::write_layout_dump;
use crate::parser::{build_dataset, parse_payload};
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apack", version, about = "Proportional area packing charts rendered to SVG/PNG")]
pub struct Args {
    /// Input payload (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (themeVariables, layout and render overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Shape used for every item
    #[arg(long = "shape", value_enum)]
    pub shape: Option<ShapeArg>,

    /// Layout solver
    #[arg(long = "solver", value_enum)]
    pub solver: Option<SolverArg>,

    /// Write computed placements as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ShapeArg {
    Circle,
    Square,
    Triangle,
}

impl From<ShapeArg> for ShapeKind {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Circle => ShapeKind::Circle,
            ShapeArg::Square => ShapeKind::Square,
            ShapeArg::Triangle => ShapeKind::Triangle,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SolverArg {
    Relax,
    Tangent,
    Auto,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Relax => SolverKind::Relax,
            SolverArg::Tangent => SolverKind::Tangent,
            SolverArg::Auto => SolverKind::Auto,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let payload = parse_payload(&input)?;
    payload.style.apply(&mut config);

    // Flags win over both the config file and the payload style.
    if let Some(width) = args.width {
        config.layout.canvas.width = width;
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.layout.canvas.height = height;
        config.render.height = height;
    }
    if let Some(shape) = args.shape {
        config.layout.shape = shape.into();
    }
    if let Some(solver) = args.solver {
        config.layout.solver = solver.into();
    }

    let (layout, failure) = match build_dataset(&payload, &config) {
        Ok(dataset) => (compute_layout(&dataset, &config.theme, &config.layout), None),
        Err(err) => (compute_error_layout(&err, &config.layout), Some(err)),
    };

    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &layout)?;
    }

    let svg = render_svg(&layout, &config.theme);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "apack", "-i", "data.json", "-w", "800", "--shape", "triangle", "--solver", "auto",
            "--dumpLayout", "dump.json", "-vv",
        ])
        .expect("args");
        assert_eq!(args.width, Some(800.0));
        assert!(matches!(args.shape, Some(ShapeArg::Triangle)));
        assert_eq!(SolverKind::from(args.solver.expect("solver")), SolverKind::Auto);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.dump_layout, Some(PathBuf::from("dump.json")));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert!(ensure_output(&Some(PathBuf::from("a.png")), "png").is_ok());
    }
}
