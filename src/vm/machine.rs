use serde::Serialize;

use crate::error::Error;
use crate::lang::Environment;
use crate::program::{Effect, ENTRY_PC, Pc, Program, ProgramError, TERMINAL_PC};
use crate::log_debug;

/// One executed instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    pub pc: Pc,
    pub next_pc: Pc,
    /// Bindings right after the instruction's effect.
    pub env: Environment,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Execution {
    pub visits: Vec<Visit>,
    pub env: Environment,
}

impl Execution {
    /// Visited program counters, in order. The terminal sentinel is not included.
    pub fn pc_visits(&self) -> Vec<Pc> {
        self.visits.iter().map(|v| v.pc).collect()
    }
}

/// Walks a [`Program`] one instruction at a time.
///
/// The machine owns the environment for the whole run; nothing else
/// reads or writes it until the run is over.
#[derive(Debug, Clone)]
pub struct Machine<'p> {
    program: &'p Program,
    env: Environment,
    pc: Pc,
    previous: Option<Pc>,
    steps: usize,
    step_limit: Option<usize>,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program) -> Self {
        Machine {
            program,
            env: Environment::new(),
            pc: ENTRY_PC,
            previous: None,
            steps: 0,
            step_limit: None,
        }
    }

    /// Fails the run once more than `limit` instructions have executed.
    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    #[inline]
    pub fn pc(&self) -> Pc {
        self.pc
    }

    #[inline]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn has_halted(&self) -> bool {
        self.pc == TERMINAL_PC
    }

    /// Executes the current instruction. Returns `None` once halted.
    pub fn step(&mut self) -> Result<Option<Visit>, Error> {
        if self.has_halted() {
            return Ok(None);
        }
        if let Some(limit) = self.step_limit {
            if self.steps >= limit {
                return Err(ProgramError::StepLimitExceeded { limit, pc: self.pc }.into());
            }
        }

        let pc = self.pc;
        let instruction = self.program.lookup(pc).ok_or(ProgramError::MissingInstruction {
            pc,
            from: self.previous,
        })?;

        instruction.effect.apply(&mut self.env).map_err(|source| {
            let (field, text) = match &instruction.effect {
                Effect::Assign { name, assignment } => {
                    (format!("assign {}", name), assignment.source().to_owned())
                }
                other => (other.to_string(), other.to_string()),
            };
            Error::Expression { pc, field, text, source }
        })?;

        let next_pc = instruction
            .next_pc
            .evaluate_pc(&self.env)
            .map_err(|source| Error::Expression {
                pc,
                field: "nextpc".to_owned(),
                text: instruction.next_pc.source().to_owned(),
                source,
            })?;

        self.steps += 1;
        self.previous = Some(pc);
        self.pc = next_pc;
        Ok(Some(Visit {
            pc,
            next_pc,
            env: self.env.clone(),
        }))
    }

    /// Runs until the terminal sentinel is reached.
    pub fn run(mut self) -> Result<Execution, Error> {
        let mut visits = Vec::new();
        while let Some(visit) = self.step()? {
            visits.push(visit);
        }
        log_debug!("Program halted after {} steps", self.steps);
        Ok(Execution {
            visits,
            env: self.env,
        })
    }
}

/// Runs `program` from a fresh environment.
pub fn interpret(program: &Program, step_limit: Option<usize>) -> Result<Execution, Error> {
    Machine::new(program).with_step_limit(step_limit).run()
}
