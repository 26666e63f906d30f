use super::{CycleTrace, Execution, Machine, build_trace, interpret};
use crate::error::Error;
use crate::lang::Value;
use crate::program::{Program, ProgramError, parse_program};

const HEADER: &str = "pc@code@cyclecount@nextpc@meta";

fn program(rows: &[&str]) -> Program {
    let text = std::iter::once(HEADER)
        .chain(rows.iter().copied())
        .collect::<Vec<_>>()
        .join("\n");
    parse_program(&text).expect("program should load")
}

fn run_and_trace(rows: &[&str]) -> (Execution, CycleTrace) {
    let program = program(rows);
    let execution = interpret(&program, Some(10_000)).expect("run failed");
    let trace = build_trace(&execution.pc_visits(), &program).expect("trace failed");
    (execution, trace)
}

#[test]
fn single_pass_row() {
    let (execution, trace) = run_and_trace(&["1@x=5@1@-1@pass"]);
    assert!(!execution.env.contains("x"));
    assert_eq!(execution.pc_visits(), vec![1]);
    assert_eq!(execution.visits[0].next_pc, -1);
    assert_eq!(trace.as_slice(), &[1]);
}

#[test]
fn assignment_then_exit() {
    let (execution, trace) = run_and_trace(&["1@n = 1@3@2@assign n=1", "2@end@1@-1@exit"]);
    assert_eq!(trace.as_slice(), &[1, 1, 1, 2]);
    assert_eq!(execution.visits[0].env.get("n"), Some(Value::Integer(1)));
    assert_eq!(execution.env.get("n"), Some(Value::Integer(1)));
}

#[test]
fn hidden_rows_still_run() {
    let (execution, trace) = run_and_trace(&[
        "1@start@1@2@pass",
        "2@?@5@3@assign k=41",
        "3@k += 1@2@-1@assign k=k+1",
    ]);
    assert_eq!(execution.pc_visits(), vec![1, 2, 3]);
    assert_eq!(execution.env.get("k"), Some(Value::Integer(42)));
    assert_eq!(trace.as_slice(), &[1, 3, 3]);
}

#[test]
fn hidden_first_instruction() {
    let (_, trace) = run_and_trace(&["1@?@3@2@pass", "2@only@2@-1@exit"]);
    assert_eq!(trace.as_slice(), &[2, 2]);
}

#[test]
fn loop_with_conditional_jump() {
    let (execution, trace) = run_and_trace(&[
        "1@i = 0@1@2@assign i=0",
        "2@i = i + 1@2@2 if i < 3 else 3@assign i=i+1",
        "3@done@1@-1@exit",
    ]);
    assert_eq!(execution.pc_visits(), vec![1, 2, 2, 2, 3]);
    assert_eq!(execution.env.get("i"), Some(Value::Integer(3)));
    assert_eq!(trace.len(), 1 + 3 * 2 + 1);
}

#[test]
fn reruns_are_identical() {
    let rows = [
        "1@a@1@2@assign x=2",
        "2@b@2@3 if x > 1 else 1@assign x=x*x",
        "3@c@1@-1@exit",
    ];
    let program = program(&rows);
    let first = interpret(&program, None).unwrap();
    let second = interpret(&program, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        build_trace(&first.pc_visits(), &program).unwrap(),
        build_trace(&second.pc_visits(), &program).unwrap()
    );
}

#[test]
fn trace_is_idempotent() {
    let program = program(&["1@a@2@2@pass", "2@b@3@-1@exit"]);
    let visits = interpret(&program, None).unwrap().pc_visits();
    let once = build_trace(&visits, &program).unwrap();
    let twice = build_trace(&visits, &program).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.as_slice(), &[1, 1, 2, 2, 2]);
}

#[test]
fn jump_to_missing_pc() {
    let program = program(&["1@a@1@5@pass", "2@b@1@-1@exit"]);
    match interpret(&program, None) {
        Err(Error::Program(ProgramError::MissingInstruction { pc, from })) => {
            assert_eq!(pc, 5);
            assert_eq!(from, Some(1));
        }
        other => panic!("expected a missing instruction, got {:?}", other),
    }
}

#[test]
fn missing_entry_point() {
    let program = program(&["0@a@1@-1@pass"]);
    assert!(matches!(
        interpret(&program, None),
        Err(Error::Program(ProgramError::MissingInstruction { pc: 1, from: None }))
    ));
}

#[test]
fn infinite_loops_hit_the_step_limit() {
    let program = program(&["1@spin@1@1@pass"]);
    assert!(matches!(
        interpret(&program, Some(50)),
        Err(Error::Program(ProgramError::StepLimitExceeded { limit: 50, pc: 1 }))
    ));
}

#[test]
fn undefined_name_in_nextpc() {
    let program = program(&["1@a@1@target@pass"]);
    match interpret(&program, None) {
        Err(Error::Expression { pc, field, text, .. }) => {
            assert_eq!(pc, 1);
            assert_eq!(field, "nextpc");
            assert_eq!(text, "target");
        }
        other => panic!("expected an expression error, got {:?}", other),
    }
}

#[test]
fn failing_assignment_names_the_variable() {
    let program = program(&["1@a@1@-1@assign y=1 // 0"]);
    match interpret(&program, None) {
        Err(Error::Expression { field, .. }) => assert_eq!(field, "assign y"),
        other => panic!("expected an expression error, got {:?}", other),
    }
}

#[test]
fn fractional_pc_is_rejected() {
    let program = program(&["1@a@1@1.5@pass"]);
    assert!(matches!(interpret(&program, None), Err(Error::Expression { .. })));
}

#[test]
fn stepping_by_hand() {
    let program = program(&["1@a@1@2@assign v=7", "2@b@1@-1@exit"]);
    let mut machine = Machine::new(&program);
    assert_eq!(machine.pc(), 1);
    let visit = machine.step().unwrap().unwrap();
    assert_eq!((visit.pc, visit.next_pc), (1, 2));
    assert_eq!(machine.env().get("v"), Some(Value::Integer(7)));
    machine.step().unwrap();
    assert!(machine.has_halted());
    assert_eq!(machine.steps(), 2);
    assert!(machine.step().unwrap().is_none());
}
