/// End-to-end stage tests: RAM image, recording display, recorded jumps.
///
/// Run with: cargo test --lib
use super::*;
use crate::display::BufferSink;
use crate::handoff::mock::RecordingJumps;
use crate::memory::mock::RamImage;
use crate::scan::{ScanFlags, END_SENTINEL, START_SENTINEL};

use StageState::*;

const IMAGE_SIZE: usize = 0x2_0000;

struct Rig {
    img: RamImage,
    sink: BufferSink<128>,
    jumps: RecordingJumps,
}

impl Rig {
    fn new() -> Self {
        Self {
            img: RamImage::new(IMAGE_SIZE),
            sink: BufferSink::new(),
            jumps: RecordingJumps::default(),
        }
    }

    /// Payload at `[start, end)` with markers at both ends and filler that
    /// contains no marker bytes.
    fn with_payload(start: usize, end: usize) -> Self {
        let mut rig = Self::new();
        rig.img.place(start, &START_SENTINEL.bytes());
        for addr in start + 2..end {
            rig.img.place(addr, &[0x90]);
        }
        rig.img.place(end, &END_SENTINEL.bytes());
        rig
    }

    fn run(&mut self, stub: u32, mode: StageMode, entry_arg: u32) -> StageReport {
        Stage::new(&mut self.img, &mut self.sink, &mut self.jumps, EntryStub::at(stub), mode)
            .run(entry_arg)
    }

    fn text(&self) -> &[u8] {
        self.sink.as_bytes()
    }
}

#[test]
fn boots_embedded_payload() {
    let mut rig = Rig::with_payload(4, 12);
    let report = rig.run(6, StageMode::Faithful, 31744);

    assert_eq!(report.scan.bounds(), (4, 12));
    assert_eq!(report.plan, Some(RelocationPlan { src: 4, dest: 0x1_0004, len: 8 }));
    assert_eq!(rig.img.read_raw(0x1_0004, 8), rig.img.read_raw(4, 8));
    assert_eq!(rig.img.read_raw(0x1_000C, 2), &[0, 0]);
    assert_eq!(rig.text(), b"31744S: 4  E: 12  ");
    assert!(rig.text().ends_with(b"S: 4  E: 12  "));

    assert_eq!(report.landing, Some(Ok(0x1_0006)));
    assert_eq!(rig.jumps.stub_calls, vec![0x1_0006]);
    assert_eq!(rig.jumps.stage2_entries, vec![RELOCATION_OFFSET]);
    assert_eq!(report.error, None);
}

#[test]
fn full_state_sequence() {
    let mut rig = Rig::with_payload(4, 12);
    let report = rig.run(6, StageMode::Faithful, 0);

    assert_eq!(
        report.trace.as_slice(),
        &[
            Entered,
            DiagnosticAddr,
            Scanning,
            ScanFound,
            DiagnosticBounds,
            Relocating,
            SelfTestJump,
            Handoff,
            Idle,
        ],
    );
}

#[test]
fn bound_hit_still_relocates_and_hands_off() {
    let mut rig = Rig::new();
    let report = rig.run(0x40, StageMode::Faithful, 0);

    assert!(report.scan.bound_hit());
    assert_eq!(rig.text(), b"0PoopS: 0  E: 0  ");
    assert!(report.trace.contains(ScanBoundHit));
    assert!(report.trace.contains(Relocating));
    assert!(report.trace.contains(Handoff));
    assert_eq!(report.plan.map(|p| p.len), Some(0));
    assert_eq!(rig.jumps.stage2_entries, vec![RELOCATION_OFFSET]);
}

#[test]
fn bound_hit_self_test_runs_from_unplaced_memory() {
    let mut rig = Rig::new();
    let report = rig.run(0x40, StageMode::Faithful, 0);

    // Nothing was copied, so the jump target was never written by us.
    assert_eq!(
        report.landing,
        Some(Err(HandoffError::StubOutsidePayload { addr: 0x1_0040 })),
    );
    assert_eq!(rig.jumps.stub_calls, vec![0x1_0040]);
}

#[test]
fn end_without_start_relocates_from_zero() {
    let mut rig = Rig::new();
    rig.img.place(50, &END_SENTINEL.bytes());
    rig.img.place(10, &[0xAB, 0xCD]);
    let report = rig.run(10, StageMode::Faithful, 7);

    assert!(report.scan.flags.contains(ScanFlags::NO_START));
    assert_eq!(report.plan, Some(RelocationPlan { src: 0, dest: 0x1_0000, len: 50 }));
    assert_eq!(rig.img.read_raw(0x1_000A, 2), &[0xAB, 0xCD]);
    assert_eq!(rig.text(), b"7S: 0  E: 50  ");
    assert_eq!(report.landing, Some(Ok(0x1_000A)));
}

#[test]
#[should_panic(expected = "copy outside RamImage")]
fn stale_start_after_bound_hit_attempts_wrapped_copy() {
    // start=500, end=0: the size wraps to ~4 GiB and the copy is attempted.
    let mut rig = Rig::new();
    rig.img.place(500, &START_SENTINEL.bytes());
    rig.run(0x40, StageMode::Faithful, 0);
}

#[test]
fn strict_stops_on_bound_hit() {
    let mut rig = Rig::new();
    rig.img.place(500, &START_SENTINEL.bytes());
    let report = rig.run(0x40, StageMode::Strict, 1);

    assert_eq!(report.error, Some(StageError::Scan(ScanError::BoundExceeded)));
    assert_eq!(rig.text(), b"1PoopS: 500  E: 0  Poop");
    assert_eq!(report.trace.last(), Some(Idle));
    assert!(!report.trace.contains(Relocating));
    assert_eq!(report.plan, None);
    assert!(rig.jumps.stub_calls.is_empty());
    assert!(rig.jumps.stage2_entries.is_empty());
    assert_eq!(rig.img.read_raw(0x1_01F4, 2), &[0, 0]);
}

#[test]
fn strict_rejects_missing_start() {
    let mut rig = Rig::new();
    rig.img.place(50, &END_SENTINEL.bytes());
    let report = rig.run(10, StageMode::Strict, 0);

    assert_eq!(report.error, Some(StageError::Scan(ScanError::MissingStart)));
    assert!(rig.text().ends_with(b"E: 50  NoS"));
    assert!(rig.jumps.stub_calls.is_empty());
}

#[test]
fn strict_rejects_stub_outside_payload() {
    let mut rig = Rig::with_payload(0x100, 0x180);
    let report = rig.run(0x40, StageMode::Strict, 0);

    assert_eq!(
        report.error,
        Some(StageError::Handoff(HandoffError::StubOutsidePayload { addr: 0x1_0040 })),
    );
    assert!(report.trace.contains(Relocating));
    assert_eq!(report.trace.last(), Some(Idle));
    assert!(!report.trace.contains(Handoff));
    assert!(rig.text().ends_with(b"Jmp"));
    assert!(rig.jumps.stub_calls.is_empty());
    assert!(rig.jumps.stage2_entries.is_empty());
}

#[test]
fn strict_happy_path_matches_faithful() {
    let mut faithful = Rig::with_payload(0x20, 0x220);
    let mut strict = Rig::with_payload(0x20, 0x220);
    let a = faithful.run(0x30, StageMode::Faithful, 0x7C00);
    let b = strict.run(0x30, StageMode::Strict, 0x7C00);

    assert_eq!(a.plan, b.plan);
    assert_eq!(a.trace, b.trace);
    assert_eq!(b.error, None);
    assert_eq!(faithful.text(), strict.text());
    assert_eq!(strict.jumps.stub_calls, vec![0x1_0030]);
    assert_eq!(strict.jumps.stage2_entries, vec![RELOCATION_OFFSET]);
}

#[test]
fn error_display() {
    let e = StageError::from(RelocError::Overlap { len: 0x2_0000 });
    assert_eq!(e.token(), b"Ovl");
    assert_eq!(format!("{}", e), "relocation: relocation of 131072 bytes overlaps its own source");
}
