use serde::Serialize;

use crate::program::{Pc, Program, ProgramError, TERMINAL_PC};

/// One entry per clock cycle: the `pc` whose instruction occupies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CycleTrace {
    cycles: Vec<Pc>,
}

impl CycleTrace {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pc> + '_ {
        self.cycles.iter().copied()
    }

    pub fn as_slice(&self) -> &[Pc] {
        &self.cycles
    }
}

impl From<Vec<Pc>> for CycleTrace {
    fn from(cycles: Vec<Pc>) -> Self {
        CycleTrace { cycles }
    }
}

/// Expands visited `pc`s into cycles.
///
/// Each visible instruction fills `cycle_cost` consecutive cycles. Hidden
/// instructions and the terminal sentinel contribute nothing.
pub fn build_trace(visits: &[Pc], program: &Program) -> Result<CycleTrace, ProgramError> {
    let mut cycles = Vec::new();
    let mut from = None;
    for &pc in visits {
        if pc == TERMINAL_PC {
            continue;
        }
        let instruction = program
            .lookup(pc)
            .ok_or(ProgramError::MissingInstruction { pc, from })?;
        from = Some(pc);
        if instruction.is_visual() {
            cycles.extend(std::iter::repeat(pc).take(instruction.cycle_cost as usize));
        }
    }
    Ok(CycleTrace { cycles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse_program;

    fn program() -> Program {
        parse_program(
            "pc@code@cyclecount@nextpc@meta\n\
             1@a@2@2@pass\n\
             2@?@4@3@pass\n\
             3@c@1@-1@exit\n",
        )
        .unwrap()
    }

    #[test]
    fn expands_cycle_costs() {
        let trace = build_trace(&[1, 2, 3], &program()).unwrap();
        assert_eq!(trace.as_slice(), &[1, 1, 3]);
    }

    #[test]
    fn terminal_sentinel_is_ignored() {
        let trace = build_trace(&[1, 3, -1], &program()).unwrap();
        assert_eq!(trace.as_slice(), &[1, 1, 3]);
    }

    #[test]
    fn hidden_only_gives_empty_trace() {
        let trace = build_trace(&[2, 2], &program()).unwrap();
        assert!(trace.is_empty());
        assert!(build_trace(&[], &program()).unwrap().is_empty());
    }

    #[test]
    fn unknown_pc() {
        assert_eq!(
            build_trace(&[1, 9], &program()),
            Err(ProgramError::MissingInstruction { pc: 9, from: Some(1) })
        );
    }

    #[test]
    fn serializes_as_plain_list() {
        let trace = CycleTrace::from(vec![1, 1, 3]);
        assert_eq!(serde_json::to_string(&trace).unwrap(), "[1,1,3]");
    }
}
