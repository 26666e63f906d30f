//! Reader for `@`-separated program files.
//!
//! ```text
//! pc@code@cyclecount@nextpc@meta
//! 1@i = 0@1@2@assign i=0
//! 2@i = i + 1@2@2 if i < 3 else 3@assign i=i+1
//! 3@done@1@-1@exit
//! ```
//!
//! Every malformed row is collected before giving up, so a single run shows
//! all the problems of a file. Blank lines are ignored.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::log_debug;

use super::error::{FileFormatError, FormatIssue, FormatIssueKind};
use super::{Pc, Program};

pub const FIELD_SEPARATOR: char = '@';
pub const HEADER: [&str; 5] = ["pc", "code", "cyclecount", "nextpc", "meta"];

/// A syntactically valid row whose expressions are still text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub pc: Pc,
    pub code: String,
    pub cycle_cost: u32,
    pub next_pc: String,
    pub meta: String,
}

pub fn parse_rows(text: &str) -> Result<Vec<Row>, FileFormatError> {
    let mut issues = Vec::new();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    match lines.next() {
        None => issues.push(FormatIssue {
            row: None,
            line: 1,
            raw: String::new(),
            kind: FormatIssueKind::MissingHeader,
        }),
        Some((line, raw)) => {
            let found: Vec<String> = raw
                .split(FIELD_SEPARATOR)
                .map(|c| c.trim().to_owned())
                .collect();
            if found != HEADER {
                issues.push(FormatIssue {
                    row: None,
                    line,
                    raw: raw.to_owned(),
                    kind: FormatIssueKind::BadHeader { found },
                });
            }
        }
    }

    let mut rows = Vec::new();
    let mut previous_pc: Option<Pc> = None;
    for (row, (line, raw)) in lines.enumerate() {
        let issue = |kind| FormatIssue {
            row: Some(row),
            line,
            raw: raw.to_owned(),
            kind,
        };
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
        if fields.len() != HEADER.len() {
            issues.push(issue(FormatIssueKind::WrongArity { found: fields.len() }));
            // Assume the row held the expected pc so one bad row is one issue.
            previous_pc = previous_pc.map(|p| p.saturating_add(1));
            continue;
        }

        let pc = fields[0].trim().parse::<Pc>();
        let cycle_cost = fields[2].trim().parse::<u32>().ok().filter(|c| *c > 0);

        let pc = match pc {
            Ok(pc) => pc,
            Err(_) => {
                issues.push(issue(FormatIssueKind::InvalidPc {
                    field: fields[0].to_owned(),
                }));
                if cycle_cost.is_none() {
                    issues.push(issue(FormatIssueKind::InvalidCycleCount {
                        field: fields[2].to_owned(),
                    }));
                }
                previous_pc = previous_pc.map(|p| p.saturating_add(1));
                continue;
            }
        };
        if let Some(expected) = previous_pc.map(|p| p.saturating_add(1)) {
            if pc != expected {
                issues.push(issue(FormatIssueKind::NonContiguousPc { expected, found: pc }));
            }
        }
        previous_pc = Some(pc);

        let Some(cycle_cost) = cycle_cost else {
            issues.push(issue(FormatIssueKind::InvalidCycleCount {
                field: fields[2].to_owned(),
            }));
            continue;
        };

        rows.push(Row {
            pc,
            code: fields[1].to_owned(),
            cycle_cost,
            next_pc: fields[3].to_owned(),
            meta: fields[4].trim().to_owned(),
        });
    }

    if issues.is_empty() {
        Ok(rows)
    } else {
        Err(FileFormatError { issues })
    }
}

/// Parses program text into a runnable [`Program`].
pub fn parse_program(text: &str) -> Result<Program, Error> {
    let rows = parse_rows(text)?;
    log_debug!("Parsed {} program rows", rows.len());
    Program::from_rows(&rows)
}

pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_program(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_LINE: &str = "pc@code@cyclecount@nextpc@meta";

    #[test]
    fn reads_rows_verbatim() {
        let text = format!("{}\n1@  x = 1@3@2@assign x=1 \n2@?@1@-1@exit\n", HEADER_LINE);
        let rows = parse_rows(&text).unwrap();
        assert_eq!(
            rows,
            vec![
                Row {
                    pc: 1,
                    code: "  x = 1".to_owned(),
                    cycle_cost: 3,
                    next_pc: "2".to_owned(),
                    meta: "assign x=1".to_owned(),
                },
                Row {
                    pc: 2,
                    code: "?".to_owned(),
                    cycle_cost: 1,
                    next_pc: "-1".to_owned(),
                    meta: "exit".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn header_whitespace_is_tolerated() {
        let text = " pc @ code@cyclecount @nextpc@ meta\r\n1@a@1@-1@pass\r\n";
        assert_eq!(parse_rows(text).unwrap().len(), 1);
    }

    #[test]
    fn bad_header() {
        let err = parse_rows("pc@code@cycles@nextpc@meta\n1@a@1@-1@pass").unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].row, None);
        assert!(matches!(err.issues[0].kind, FormatIssueKind::BadHeader { .. }));
    }

    #[test]
    fn empty_file() {
        let err = parse_rows("\n\n").unwrap_err();
        assert_eq!(err.issues[0].kind, FormatIssueKind::MissingHeader);
    }

    #[test]
    fn skipped_pc_cites_the_row() {
        let text = format!("{}\n1@a@1@3@pass\n3@b@1@-1@exit\n", HEADER_LINE);
        let err = parse_rows(&text).unwrap_err();
        assert_eq!(
            err.issues,
            vec![FormatIssue {
                row: Some(1),
                line: 3,
                raw: "3@b@1@-1@exit".to_owned(),
                kind: FormatIssueKind::NonContiguousPc { expected: 2, found: 3 },
            }]
        );
    }

    #[test]
    fn every_bad_row_is_reported() {
        let text = format!(
            "{}\n1@a@1@2@pass\nx@b@1@3@pass\n3@c@zero@4@pass\n\
             4@d@0@5@pass\n5@e@1@-1\n7@f@1@-1@exit\n",
            HEADER_LINE
        );
        let err = parse_rows(&text).unwrap_err();
        let kinds: Vec<(Option<usize>, &FormatIssueKind)> =
            err.issues.iter().map(|i| (i.row, &i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (Some(1), &FormatIssueKind::InvalidPc { field: "x".to_owned() }),
                (Some(2), &FormatIssueKind::InvalidCycleCount { field: "zero".to_owned() }),
                (Some(3), &FormatIssueKind::InvalidCycleCount { field: "0".to_owned() }),
                (Some(4), &FormatIssueKind::WrongArity { found: 4 }),
                (Some(5), &FormatIssueKind::NonContiguousPc { expected: 6, found: 7 }),
            ]
        );
        let shown = err.to_string();
        assert!(shown.starts_with("5 error(s)"));
        assert!(shown.contains("x@b@1@3@pass"));
    }

    #[test]
    fn expression_errors_surface_after_format_checks() {
        let text = format!("{}\n1@a@1@)@pass\n", HEADER_LINE);
        assert!(matches!(parse_program(&text), Err(Error::Expression { pc: 1, .. })));
    }

    #[test]
    fn unknown_meta_is_a_program_error() {
        let text = format!("{}\n1@a@1@-1@jump 3\n", HEADER_LINE);
        assert!(matches!(
            parse_program(&text),
            Err(Error::Program(crate::program::ProgramError::UnknownEffect { pc: 1, .. }))
        ));
    }
}
