use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;

use cyclescope::config::Config;
use cyclescope::logger::{self, LoggerMode};
use cyclescope::{Pipeline, PipelineOptions, Severity, log_error, log_info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "cyclescope: animate the execution of a tabular program.",
    long_about = "Runs a program given as `pc@code@cyclecount@nextpc@meta` rows and \
    renders one frame per clock cycle, highlighting the active instruction.\n\
    The frames are written as a looping GIF."
)]
struct Cli {
    /// Program file to run
    #[arg(value_name = "PROGRAM", required_unless_present = "print_config")]
    program: Option<PathBuf>,

    /// Where to write the animation [default: result.gif]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Duration of each frame in milliseconds
    #[arg(long, value_name = "MS")]
    frame_delay: Option<u32>,

    /// Abort after this many executed instructions (0 = no limit)
    #[arg(long, value_name = "N")]
    max_steps: Option<usize>,

    /// Frame rendering threads
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Font scale factor
    #[arg(long, value_name = "N")]
    scale: Option<u32>,

    /// Write the visits, cycle trace and final environment as JSON
    #[arg(long, value_name = "PATH")]
    dump_trace: Option<PathBuf>,

    /// Run and trace the program without rendering
    #[arg(long)]
    check: bool,

    /// Extra configuration file, applied over the user and project files
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Show debug messages
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Also write logs to the rotating log file
    #[arg(long)]
    log_file: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) {
        let overrides = Config {
            output: self.output.clone(),
            frame_delay_ms: self.frame_delay,
            max_steps: self.max_steps,
            workers: self.workers,
            render: cyclescope::config::RenderSection {
                scale: self.scale,
                ..Default::default()
            },
        };
        config.merge(overrides);
    }

    /// Only errors reach the terminal while printing the configuration, so
    /// stdout holds nothing but the TOML.
    fn max_level(&self) -> Severity {
        if self.print_config || self.quiet {
            Severity::Error
        } else if self.verbose {
            Severity::Debug
        } else {
            Severity::Info
        }
    }
}

fn print_config(config: &Config) -> anyhow::Result<()> {
    let text = config
        .to_toml()
        .context("could not serialize the configuration")?;
    print!("{}", text);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mode = if cli.log_file {
        LoggerMode::TerminalAndFile
    } else {
        LoggerMode::Terminal
    };
    logger::init(mode, cli.max_level());
    if let Some(path) = logger::get_log_file_path() {
        log_info!("Logging to {}", path.display());
    }

    let mut config = Config::load(cli.config.as_deref());
    cli.apply_to(&mut config);

    if cli.print_config {
        if let Err(e) = print_config(&config) {
            log_error!("{:#}", e);
            process::exit(1);
        }
        return;
    }

    let Some(program) = cli.program.as_deref() else {
        log_error!("no program file given");
        process::exit(1);
    };
    let options = PipelineOptions {
        dump_trace: cli.dump_trace.clone(),
        check: cli.check,
        ..PipelineOptions::from(&config)
    };
    match Pipeline::new(options).run(program) {
        Ok(summary) => {
            if let Some(output) = summary.output {
                log_info!(
                    "{} cycles over {} steps, saved to {}",
                    summary.cycles,
                    summary.steps,
                    output.display()
                );
            } else {
                log_info!("OK: {} cycles over {} steps", summary.cycles, summary.steps);
            }
        }
        Err(e) => {
            log_error!("{}: {}", e.kind(), e);
            process::exit(1);
        }
    }
}
