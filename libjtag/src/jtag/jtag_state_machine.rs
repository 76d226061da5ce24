use std::collections::VecDeque;

use log::trace;
use rust_fsm::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JtagState {
    Reset,
    RunIdle,
    SelectDRScan,
    CaptureDR,
    ShiftDR,
    Exit1DR,
    PauseDR,
    Exit2DR,
    UpdateDR,
    SelectIRScan,
    CaptureIR,
    ShiftIR,
    Exit1IR,
    PauseIR,
    Exit2IR,
    UpdateIR,
}

/// TAP controller transitions, driven by the TMS level at each rising TCK edge.
#[derive(Debug)]
pub struct JtagStateMachine;

impl StateMachineImpl for JtagStateMachine {
    type Input = bool;
    type State = JtagState;
    type Output = ();

    const INITIAL_STATE: Self::State = JtagState::Reset;

    fn transition(state: &Self::State, input: &Self::Input) -> Option<Self::State> {
        use JtagState::*;

        let next = match (state, input) {
            (Reset, true) => Reset,
            (Reset, false) => RunIdle,
            (RunIdle, true) => SelectDRScan,
            (RunIdle, false) => RunIdle,

            // DR column
            (SelectDRScan, true) => SelectIRScan,
            (SelectDRScan, false) => CaptureDR,
            (CaptureDR, true) => Exit1DR,
            (CaptureDR, false) => ShiftDR,
            (ShiftDR, true) => Exit1DR,
            (ShiftDR, false) => ShiftDR,
            (Exit1DR, true) => UpdateDR,
            (Exit1DR, false) => PauseDR,
            (PauseDR, true) => Exit2DR,
            (PauseDR, false) => PauseDR,
            (Exit2DR, true) => UpdateDR,
            (Exit2DR, false) => ShiftDR,
            (UpdateDR, true) => SelectDRScan,
            (UpdateDR, false) => RunIdle,

            // IR column
            (SelectIRScan, true) => Reset,
            (SelectIRScan, false) => CaptureIR,
            (CaptureIR, true) => Exit1IR,
            (CaptureIR, false) => ShiftIR,
            (ShiftIR, true) => Exit1IR,
            (ShiftIR, false) => ShiftIR,
            (Exit1IR, true) => UpdateIR,
            (Exit1IR, false) => PauseIR,
            (PauseIR, true) => Exit2IR,
            (PauseIR, false) => PauseIR,
            (Exit2IR, true) => UpdateIR,
            (Exit2IR, false) => ShiftIR,
            (UpdateIR, true) => SelectDRScan,
            (UpdateIR, false) => RunIdle,
        };
        trace!("jtag state change: {:?} -> {:?}", state, next);
        Some(next)
    }

    fn output(_state: &Self::State, _input: &Self::Input) -> Option<Self::Output> {
        None
    }
}

/// Shortest TMS sequence leading from `from` to `to`. Empty when they are equal.
pub fn tms_path(from: JtagState, to: JtagState) -> Option<Vec<bool>> {
    let mut visited = vec![from];
    let mut queue = VecDeque::new();
    queue.push_back((from, Vec::new()));

    while let Some((state, path)) = queue.pop_front() {
        if state == to {
            return Some(path);
        }
        for &tms in &[false, true] {
            let next = match JtagStateMachine::transition(&state, &tms) {
                Some(next) => next,
                None => continue,
            };
            if !visited.contains(&next) {
                visited.push(next);
                let mut longer = path.clone();
                longer.push(tms);
                queue.push_back((next, longer));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(from: JtagState, tms: &[bool]) -> JtagState {
        let mut machine: StateMachine<JtagStateMachine> = StateMachine::from_state(from);
        for t in tms {
            machine.consume(t).unwrap();
        }
        *machine.state()
    }

    #[test]
    fn five_tms_highs_reset_from_anywhere() {
        for &from in &[
            JtagState::RunIdle,
            JtagState::ShiftDR,
            JtagState::PauseIR,
            JtagState::UpdateDR,
            JtagState::Exit2IR,
        ] {
            assert_eq!(walk(from, &[true; 5]), JtagState::Reset);
        }
    }

    #[test]
    fn shift_ir_from_reset() {
        let path = tms_path(JtagState::Reset, JtagState::ShiftIR).unwrap();
        assert_eq!(path, vec![false, true, true, false, false]);
    }

    #[test]
    fn shift_dr_back_to_idle() {
        let path = tms_path(JtagState::ShiftDR, JtagState::RunIdle).unwrap();
        assert_eq!(path, vec![true, true, false]);
    }

    #[test]
    fn every_state_reaches_every_other() {
        use JtagState::*;
        let states = [
            Reset, RunIdle, SelectDRScan, CaptureDR, ShiftDR, Exit1DR, PauseDR, Exit2DR,
            UpdateDR, SelectIRScan, CaptureIR, ShiftIR, Exit1IR, PauseIR, Exit2IR, UpdateIR,
        ];
        for &from in &states {
            for &to in &states {
                let path = tms_path(from, to).unwrap();
                assert_eq!(walk(from, &path), to);
                if from == to {
                    assert!(path.is_empty());
                }
            }
        }
    }
}
