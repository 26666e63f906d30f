//! The instruction table.
//!
//! A [`Program`] is the ordered, immutable list of instructions read from a
//! program file. It is shared read-only by the machine, the trace builder
//! and the renderer.

use crate::error::Error;
use crate::lang::Expression;

pub mod effect;
pub mod error;
pub mod loader;

pub use effect::Effect;
pub use error::{FileFormatError, FormatIssue, FormatIssueKind, ProgramError};
pub use loader::{Row, load_program, parse_program, parse_rows};

/// Program counter.
pub type Pc = i64;

/// `pc` reached when the program is over. Never looked up.
pub const TERMINAL_PC: Pc = -1;
/// `pc` the machine starts from.
pub const ENTRY_PC: Pc = 1;
/// Code text marking an instruction that runs but is never drawn.
pub const NON_VISUAL_MARKER: &str = "?";

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub pc: Pc,
    /// Source line shown in the animation.
    pub text: String,
    pub cycle_cost: u32,
    pub next_pc: Expression,
    pub effect: Effect,
}

impl Instruction {
    /// Builds an instruction from a loaded row, parsing its expressions.
    pub fn from_row(row: &Row) -> Result<Self, Error> {
        let next_pc = Expression::parse(&row.next_pc).map_err(|source| Error::Expression {
            pc: row.pc,
            field: "nextpc".to_owned(),
            text: row.next_pc.trim().to_owned(),
            source,
        })?;
        Ok(Instruction {
            pc: row.pc,
            text: row.code.clone(),
            cycle_cost: row.cycle_cost,
            next_pc,
            effect: Effect::parse(row.pc, &row.meta)?,
        })
    }

    pub fn is_visual(&self) -> bool {
        self.text.trim() != NON_VISUAL_MARKER
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Checks that `pc`s increase by exactly one from the first instruction
    /// and that every instruction takes at least one cycle.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, ProgramError> {
        for (index, pair) in instructions.windows(2).enumerate() {
            let expected = pair[0].pc.saturating_add(1);
            if pair[1].pc != expected {
                return Err(ProgramError::NonContiguous {
                    index: index + 1,
                    expected,
                    found: pair[1].pc,
                });
            }
        }
        if let Some(bad) = instructions.iter().find(|i| i.cycle_cost == 0) {
            return Err(ProgramError::ZeroCycleCost { pc: bad.pc });
        }
        Ok(Program { instructions })
    }

    pub fn from_rows(rows: &[Row]) -> Result<Self, Error> {
        let instructions = rows
            .iter()
            .map(Instruction::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Program::new(instructions)?)
    }

    pub fn lookup(&self, pc: Pc) -> Option<&Instruction> {
        let base = self.instructions.first()?.pc;
        let offset = usize::try_from(pc.checked_sub(base)?).ok()?;
        self.instructions.get(offset)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instructions drawn in the animation, in table order.
    pub fn visible(&self) -> Vec<&Instruction> {
        self.instructions.iter().filter(|i| i.is_visual()).collect()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pc: Pc, code: &str, cycles: u32, next: &str, meta: &str) -> Row {
        Row {
            pc,
            code: code.to_owned(),
            cycle_cost: cycles,
            next_pc: next.to_owned(),
            meta: meta.to_owned(),
        }
    }

    #[test]
    fn lookup_by_offset_from_base() {
        let program = Program::from_rows(&[
            row(0, "a", 1, "1", "pass"),
            row(1, "b", 1, "2", "pass"),
            row(2, "c", 1, "-1", "exit"),
        ])
        .unwrap();
        assert_eq!(program.lookup(1).map(|i| i.text.as_str()), Some("b"));
        assert_eq!(program.lookup(2).map(|i| i.text.as_str()), Some("c"));
        assert!(program.lookup(3).is_none());
        assert!(program.lookup(-1).is_none());
        assert!(program.lookup(i64::MIN).is_none());
    }

    #[test]
    fn visibility_marker() {
        let program = Program::from_rows(&[
            row(1, "x = 1", 1, "2", "pass"),
            row(2, " ? ", 5, "3", "pass"),
            row(3, "?!", 1, "-1", "exit"),
        ])
        .unwrap();
        let visible: Vec<Pc> = program.visible().iter().map(|i| i.pc).collect();
        assert_eq!(visible, vec![1, 3]);
    }

    #[test]
    fn rejects_gaps() {
        let rows = [row(1, "a", 1, "2", "pass"), row(2, "b", 1, "-1", "pass")];
        let instructions = Program::from_rows(&rows).unwrap().instructions().to_vec();
        let mut shuffled = instructions.clone();
        shuffled[1].pc = 4;
        assert_eq!(
            Program::new(shuffled),
            Err(ProgramError::NonContiguous { index: 1, expected: 2, found: 4 })
        );
    }

    #[test]
    fn rejects_zero_cycle_cost() {
        let err = Program::from_rows(&[row(1, "a", 1, "2", "pass"), row(2, "b", 0, "-1", "pass")])
            .unwrap_err();
        assert!(matches!(err, Error::Program(ProgramError::ZeroCycleCost { pc: 2 })));

        let mut instructions = Program::from_rows(&[row(1, "a", 1, "-1", "pass")])
            .unwrap()
            .instructions()
            .to_vec();
        instructions[0].cycle_cost = 0;
        assert_eq!(Program::new(instructions), Err(ProgramError::ZeroCycleCost { pc: 1 }));
    }

    #[test]
    fn nextpc_syntax_errors_name_the_instruction() {
        let err = Program::from_rows(&[row(1, "a", 1, "2 +", "pass")]).unwrap_err();
        match err {
            Error::Expression { pc, field, text, .. } => {
                assert_eq!(pc, 1);
                assert_eq!(field, "nextpc");
                assert_eq!(text, "2 +");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
