/// Stage 1 as a state machine.
///
/// ENTERED → DIAGNOSTIC_ADDR → SCANNING → SCAN_FOUND | SCAN_BOUND_HIT →
/// DIAGNOSTIC_BOUNDS → RELOCATING → SELF_TEST_JUMP → HANDOFF, then IDLE
/// only if stage 2 returns.
///
/// In `Faithful` mode a bound hit is not a failure: the stale bounds are
/// shown and relocated anyway. `Strict` mode stops at the first
/// inconsistency, shows its token and goes to IDLE without touching
/// memory or jumping.
use core::fmt;

use crate::boot_log;
use crate::config::RELOCATION_OFFSET;
use crate::display::DiagnosticSink;
use crate::handoff::{self, ControlTransfer, EntryStub, HandoffError};
use crate::memory::ImageMemory;
use crate::reloc::{RelocError, RelocationPlan};
use crate::scan::{self, ScanError, ScanReport, BOUND_TOKEN};

#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageState {
    Entered,
    DiagnosticAddr,
    Scanning,
    ScanFound,
    ScanBoundHit,
    DiagnosticBounds,
    Relocating,
    SelfTestJump,
    Handoff,
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageMode {
    /// Historical behaviour, quirks included.
    Faithful,
    /// Validate bounds, copy and stub before each step.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageError {
    Scan(ScanError),
    Reloc(RelocError),
    Handoff(HandoffError),
}

impl StageError {
    pub fn token(&self) -> &'static [u8] {
        match self {
            StageError::Scan(e) => e.token(),
            StageError::Reloc(e) => e.token(),
            StageError::Handoff(e) => e.token(),
        }
    }
}

impl From<ScanError> for StageError {
    fn from(e: ScanError) -> Self {
        StageError::Scan(e)
    }
}

impl From<RelocError> for StageError {
    fn from(e: RelocError) -> Self {
        StageError::Reloc(e)
    }
}

impl From<HandoffError> for StageError {
    fn from(e: HandoffError) -> Self {
        StageError::Handoff(e)
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Scan(e) => write!(f, "scan: {}", e),
            StageError::Reloc(e) => write!(f, "relocation: {}", e),
            StageError::Handoff(e) => write!(f, "handoff: {}", e),
        }
    }
}

/// Longest possible path through the state machine.
pub const TRACE_CAPACITY: usize = 10;

/// States visited, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateTrace {
    states: [StageState; TRACE_CAPACITY],
    len: usize,
}

impl StateTrace {
    const fn new() -> Self {
        Self { states: [StageState::Entered; TRACE_CAPACITY], len: 0 }
    }

    fn push(&mut self, state: StageState) {
        if self.len < TRACE_CAPACITY {
            self.states[self.len] = state;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[StageState] {
        &self.states[..self.len]
    }

    pub fn last(&self) -> Option<StageState> {
        self.as_slice().last().copied()
    }

    pub fn contains(&self, state: StageState) -> bool {
        self.as_slice().contains(&state)
    }
}

/// What happened, available once `run` gets control back.
#[derive(Clone, Copy, Debug)]
pub struct StageReport {
    pub entry_arg: u32,
    pub scan: ScanReport,
    /// The copy that was performed, if any.
    pub plan: Option<RelocationPlan>,
    /// Self-test target check. In `Faithful` mode the jump is made even
    /// when this is an error.
    pub landing: Option<Result<u32, HandoffError>>,
    /// Why `Strict` mode stopped.
    pub error: Option<StageError>,
    pub trace: StateTrace,
}

pub struct Stage<'a, M: ?Sized, D: ?Sized, J: ?Sized> {
    mem: &'a mut M,
    display: &'a mut D,
    jumps: &'a mut J,
    stub: EntryStub,
    mode: StageMode,
    trace: StateTrace,
}

impl<'a, M, D, J> Stage<'a, M, D, J>
where
    M: ImageMemory + ?Sized,
    D: DiagnosticSink + ?Sized,
    J: ControlTransfer + ?Sized,
{
    pub fn new(
        mem: &'a mut M,
        display: &'a mut D,
        jumps: &'a mut J,
        stub: EntryStub,
        mode: StageMode,
    ) -> Self {
        Self { mem, display, jumps, stub, mode, trace: StateTrace::new() }
    }

    fn enter(&mut self, state: StageState) {
        boot_log!("[stage] {:?}", state);
        self.trace.push(state);
    }

    /// Run stage 1 with the argument the loader passed in. The argument is
    /// only displayed.
    ///
    /// Returns only if stage 2 returns, or if `Strict` mode refused to
    /// continue; either way the caller should idle.
    pub fn run(mut self, entry_arg: u32) -> StageReport {
        self.enter(StageState::Entered);

        self.enter(StageState::DiagnosticAddr);
        self.display.write_decimal(entry_arg);
        boot_log!("[stage] entry argument {:#x}", entry_arg);

        self.enter(StageState::Scanning);
        let scan = scan::scan(&*self.mem);
        if scan.bound_hit() {
            self.enter(StageState::ScanBoundHit);
            self.display.write_text(BOUND_TOKEN);
        } else {
            self.enter(StageState::ScanFound);
        }

        self.enter(StageState::DiagnosticBounds);
        self.display.write_text(b"S: ");
        self.display.write_decimal(scan.start);
        self.display.write_text(b"  E: ");
        self.display.write_decimal(scan.end);
        self.display.write_text(b"  ");

        let mut report = StageReport {
            entry_arg,
            scan,
            plan: None,
            landing: None,
            error: None,
            trace: self.trace,
        };

        let plan = match self.mode {
            StageMode::Faithful => RelocationPlan::new(scan.start, scan.end),
            StageMode::Strict => {
                match scan.validate().map_err(StageError::from).and_then(|p| {
                    RelocationPlan::checked(p.start, p.end).map_err(StageError::from)
                }) {
                    Ok(plan) => plan,
                    Err(e) => return self.halt(report, e),
                }
            }
        };

        self.enter(StageState::Relocating);
        plan.apply(&mut *self.mem);
        report.plan = Some(plan);

        self.enter(StageState::SelfTestJump);
        let landing = handoff::verify_landing(&*self.mem, &plan, self.stub);
        report.landing = Some(landing);
        match (landing, self.mode) {
            (Err(e), StageMode::Strict) => return self.halt(report, e.into()),
            (Err(e), StageMode::Faithful) => boot_log!("[stage] warning: {}", e),
            (Ok(_), _) => {}
        }
        unsafe { self.jumps.call_stub(self.stub.relocated(RELOCATION_OFFSET)) };

        self.enter(StageState::Handoff);
        unsafe { self.jumps.enter_stage2(RELOCATION_OFFSET) };

        boot_log!("[stage] stage 2 returned");
        self.enter(StageState::Idle);
        report.trace = self.trace;
        report
    }

    fn halt(mut self, mut report: StageReport, error: StageError) -> StageReport {
        boot_log!("[stage] refusing to continue: {}", error);
        self.display.write_text(error.token());
        self.enter(StageState::Idle);
        report.error = Some(error);
        report.trace = self.trace;
        report
    }
}
