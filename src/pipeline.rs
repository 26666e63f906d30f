//! End-to-end driver: load, interpret, trace, render, assemble.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::lang::Environment;
use crate::program::{Program, load_program};
use crate::render::{
    AnimationAssembler, GifAssembler, RenderError, RenderStyle, TextRenderer, render_frames,
};
use crate::vm::{CycleTrace, Visit, build_trace, interpret};
use crate::{log_debug, log_info};

/// Settings for one run, usually resolved from a [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub output: PathBuf,
    pub frame_delay_ms: u32,
    pub step_limit: Option<usize>,
    pub workers: usize,
    pub style: RenderStyle,
    /// Where to write the JSON run report, if anywhere.
    pub dump_trace: Option<PathBuf>,
    /// Stop once the trace is built. Nothing is rendered.
    pub check: bool,
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        PipelineOptions {
            output: config.output(),
            frame_delay_ms: config.frame_delay_ms(),
            step_limit: config.step_limit(),
            workers: config.workers(),
            style: config.render_style(),
            dump_trace: None,
            check: false,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions::from(&Config::default())
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub steps: usize,
    pub cycles: usize,
    /// Path of the written animation, `None` for a check-only run.
    pub output: Option<PathBuf>,
}

/// Serialized with `--dump-trace`.
#[derive(Debug, Serialize)]
pub struct TraceReport<'a> {
    pub visits: &'a [Visit],
    pub trace: &'a CycleTrace,
    pub env: &'a Environment,
}

pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Pipeline { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run(&self, program_path: &Path) -> Result<Summary, Error> {
        let program = load_program(program_path)?;
        log_info!(
            "Loaded {} instructions from {}",
            program.len(),
            program_path.display()
        );
        self.run_program(&program)
    }

    pub fn run_program(&self, program: &Program) -> Result<Summary, Error> {
        let execution = interpret(program, self.options.step_limit)?;
        let trace = build_trace(&execution.pc_visits(), program)?;
        log_info!(
            "Program ran {} steps over {} visible cycles",
            execution.visits.len(),
            trace.len()
        );

        // A failing run leaves no report behind.
        if !self.options.check && trace.is_empty() {
            return Err(RenderError::EmptyTrace.into());
        }
        if let Some(path) = &self.options.dump_trace {
            let report = TraceReport {
                visits: &execution.visits,
                trace: &trace,
                env: &execution.env,
            };
            write_report(path, &report)?;
            log_info!("Trace report written to {}", path.display());
        }

        let mut summary = Summary {
            steps: execution.visits.len(),
            cycles: trace.len(),
            output: None,
        };
        if self.options.check {
            return Ok(summary);
        }

        let visible = program.visible();
        let renderer = TextRenderer::for_cycles(self.options.style, trace.len());
        let assembler = GifAssembler::new(self.options.frame_delay_ms);
        let mut gif = Vec::new();
        render_frames(&renderer, &visible, &trace, self.options.workers, |frames| {
            assembler.assemble(frames, &mut gif)
        })?;
        log_debug!("Encoded {} bytes of GIF", gif.len());

        let output = &self.options.output;
        fs::write(output, &gif).map_err(|source| Error::Io {
            path: output.clone(),
            source,
        })?;
        log_info!("Animation written to {}", output.display());

        summary.output = Some(output.clone());
        Ok(summary)
    }
}

fn write_report(path: &Path, report: &TraceReport<'_>) -> Result<(), Error> {
    let io_error = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|e| io_error(e.into()))?;
    writer.flush().map_err(io_error)
}
