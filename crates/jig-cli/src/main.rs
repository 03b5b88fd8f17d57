//! Switch test jig generator

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use jig_core::{
    CaseModel, CaseParameters, DEFAULT_TESSELLATION_TOLERANCE, Dimensions, ExportError, ExportOptions,
    ModelError, OutlineError, Outlines, ParamError, export_model,
};

#[derive(Parser, Debug)]
#[command(name = "jig", version, about = "Generate a keyboard switch test jig")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the jig and write STL meshes with a manifest
    Generate(GenerateArgs),
    /// Print the derived dimensions
    Dimensions(ParamsArg),
    /// Write the default parameters as RON
    Params {
        /// Output file, stdout when omitted
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ParamsArg {
    /// RON parameter file, defaults when omitted
    #[arg(long, short = 'p')]
    params: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    params: ParamsArg,

    /// Directory holding pcb.dxf, shim.dxf and fauxkey.dxf
    #[arg(long, default_value = ".")]
    outlines: PathBuf,

    /// Use plain PCB-sized rectangles instead of DXF outlines
    #[arg(long, conflicts_with = "outlines")]
    rectangles: bool,

    /// Output directory
    #[arg(long, short = 'o', default_value = "out")]
    out: PathBuf,

    /// Tessellation tolerance in millimetres
    #[arg(long, default_value_t = DEFAULT_TESSELLATION_TOLERANCE)]
    tolerance: f64,

    /// Also write the key PCB and shim meshes
    #[arg(long)]
    include_hidden: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Outline(#[from] OutlineError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("No CAD kernel is available in this build")]
    NoKernel,
    #[error("Failed to format output: {0}")]
    Format(String),
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jig=info,jig_core=info,jig_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Generate(args) => generate(&args),
        Command::Dimensions(args) => {
            let params = load_params(args.params.as_deref())?;
            println!("{}", dimensions_report(&params)?);
            Ok(())
        }
        Command::Params { out } => {
            let params = CaseParameters::default();
            match out {
                Some(path) => params.save(&path)?,
                None => println!("{}", params.to_ron_string()?),
            }
            Ok(())
        }
    }
}

fn load_params(path: Option<&Path>) -> Result<CaseParameters, ParamError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading parameters");
            CaseParameters::load(path)
        }
        None => Ok(CaseParameters::default()),
    }
}

fn dimensions_report(params: &CaseParameters) -> Result<String, CliError> {
    params.validate()?;
    let dims = Dimensions::new(&params.balanced());
    ron::ser::to_string_pretty(&dims, ron::ser::PrettyConfig::default())
        .map_err(|e| CliError::Format(e.to_string()))
}

fn generate(args: &GenerateArgs) -> Result<(), CliError> {
    let params = load_params(args.params.params.as_deref())?;
    let outlines = if args.rectangles {
        Outlines::rectangles(params.pcb_width, params.pcb_height)
    } else {
        tracing::info!(dir = %args.outlines.display(), "loading outlines");
        Outlines::load_dir(&args.outlines)?
    };

    let kernel = jig_cad::default_kernel();
    if !kernel.is_available() {
        return Err(CliError::NoKernel);
    }

    let model = CaseModel::plan(&params, &outlines)?;
    let built = model.build(kernel.as_ref())?;

    let options = ExportOptions {
        output_dir: args.out.clone(),
        tolerance: args.tolerance,
        include_hidden: args.include_hidden,
    };
    let manifest = export_model(&built, kernel.as_ref(), &options)?;
    tracing::info!(
        parts = manifest.parts.len(),
        dir = %options.output_dir.display(),
        "jig generated"
    );
    Ok(())
}
