use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::error;
use log::info;
use log::LevelFilter;
use msp_solver::convert::read_csplib;
use msp_solver::convert::write_instances;
use msp_solver::convert::ConvertError;

/// Splits a CSPLib file of Meeting Scheduling instances into one instance file per problem.
#[derive(Debug, Parser)]
#[command(author, version, about, arg_required_else_help = true)]
struct Args {
    /// The CSPLib file to convert.
    input: PathBuf,

    /// The directory in which `problem<k>.txt` is written for the k-th instance.
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Enables log message output.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), ConvertError> {
    let args = Args::parse();

    env_logger::Builder::new()
        .format(move |buf, record| writeln!(buf, "% {}", record.args()))
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .target(env_logger::Target::Stderr)
        .init();

    let instances = read_csplib(File::open(&args.input)?)?;
    let paths = write_instances(&instances, &args.output_dir)?;
    info!("Converted {} instances", paths.len());

    for path in paths {
        println!("{}", path.display());
    }

    Ok(())
}
