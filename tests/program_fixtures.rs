use gcode_kernel::geometry::DrillPhase;
use gcode_kernel::{
    build, parse_setup, DiagnosticKind, MachineParams, MachineSetup, MotionMode, Position,
    ToolOffsetTable, Toolpath, WorkOffsetTable,
};
use std::f64::consts::PI;
use std::path::PathBuf;

const EPS: f64 = 1e-6;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_text(name: &str) -> String {
    let path = fixture_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read fixture {path:?}: {e}"))
}

fn load_setup() -> MachineSetup {
    parse_setup(&load_text("machine.toml")).expect("parse machine.toml")
}

fn build_with_setup(program: &str) -> Toolpath {
    let setup = load_setup();
    build(
        &load_text(program),
        &setup.work_offsets,
        &setup.tool_offsets,
        &setup.machine,
    )
    .unwrap_or_else(|e| panic!("build {program}: {e}"))
}

fn build_plain(program: &str) -> Toolpath {
    build(
        &load_text(program),
        &WorkOffsetTable::new(),
        &ToolOffsetTable::new(),
        &MachineParams::new(5000.0),
    )
    .unwrap_or_else(|e| panic!("build {program}: {e}"))
}

// ── machine setup ─────────────────────────────────────────────────────────────

#[test]
fn machine_setup_fixture_parses() {
    let setup = load_setup();
    assert_eq!(setup.machine.rapid_feed, 5000.0);
    assert_eq!(setup.machine.max_lines, Some(10000));
    assert_eq!(
        setup.work_offsets.translation("G54"),
        Position::new(100.0, 50.0, -20.0)
    );
    let h1 = setup.tool_offsets.length_entry(1).expect("H1");
    assert!((h1.total() - 50.2).abs() < EPS);
    assert_eq!(setup.tool_offsets.radius(1), 3.0);
}

// ── pocket.nc ─────────────────────────────────────────────────────────────────

#[test]
fn pocket_builds_clean() {
    let tp = build_with_setup("pocket.nc");
    assert_eq!(tp.len(), 9);
    assert!(
        tp.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        tp.diagnostics()
    );
    let first = tp.command_at(0).expect("command 0");
    assert_eq!(first.line_number, 6);
    assert_eq!(first.start, Position::new(100.0, 50.0, -20.0));
    assert_eq!(first.spindle_speed, 12000.0);
    assert_eq!(first.modal.tool_number, 1);
}

#[test]
fn pocket_distances_and_time() {
    let stats = build_with_setup("pocket.nc").stats();
    let cutting = 66.0 + 5.0 * PI;
    assert!((stats.cutting_distance - cutting).abs() < EPS, "{stats:?}");
    assert!((stats.rapid_distance - 11.0).abs() < EPS, "{stats:?}");
    assert!((stats.total_distance - (cutting + 11.0)).abs() < EPS);

    let expected = 1.8 + (60.0 + 5.0 * PI) / 10.0 + 11.0 / 5000.0 * 60.0;
    assert!((stats.estimated_time - expected).abs() < EPS, "{stats:?}");
}

#[test]
fn pocket_bounds_are_in_machine_space() {
    let bb = build_with_setup("pocket.nc").stats().bounding_box;
    assert!((bb.min.x - 100.0).abs() < EPS && (bb.max.x - 120.0).abs() < EPS, "{bb:?}");
    assert!((bb.min.y - 50.0).abs() < EPS && (bb.max.y - 70.0).abs() < EPS, "{bb:?}");
    assert!((bb.min.z + 21.0).abs() < EPS && (bb.max.z + 15.0).abs() < EPS, "{bb:?}");
}

#[test]
fn pocket_arc_keeps_program_center_offset() {
    let tp = build_with_setup("pocket.nc");
    let index = tp.first_command_for_line(11).expect("arc line");
    let arc = tp.command_at(index).expect("arc command");
    assert_eq!(arc.motion_type, MotionMode::ArcCcw);
    let offset = arc.arc_center_offset().expect("center offset");
    assert!((offset.x + 10.0).abs() < EPS && offset.y.abs() < EPS, "{offset:?}");
    assert!((arc.arc_radius().expect("radius") - 10.0).abs() < EPS);
}

#[test]
fn pocket_rapids_stay_above_stock() {
    let tp = build_with_setup("pocket.nc");
    // Cut depth Z-1 is machine Z -21; the final retract starts there.
    assert!(tp.rapid_moves_below(-21.0).is_empty());
    assert_eq!(tp.rapid_moves_below(-20.0), vec![8]);
    assert_eq!(tp.rapid_moves_below(-14.0).len(), 3);
}

// ── drill_inch.nc ─────────────────────────────────────────────────────────────

#[test]
fn inch_drill_cycle_expands_every_hole() {
    let tp = build_plain("drill_inch.nc");
    assert_eq!(tp.len(), 12);
    assert_eq!(tp.first_command_for_line(5), Some(2));

    let plunges: Vec<_> = tp
        .commands()
        .iter()
        .filter(|c| c.drill_phase == Some(DrillPhase::Plunge))
        .collect();
    assert_eq!(plunges.len(), 3);
    for (plunge, x) in plunges.iter().zip([12.7, 38.1, 63.5]) {
        assert!((plunge.end.x - x).abs() < EPS, "{:?}", plunge.end);
        assert!((plunge.end.z + 6.35).abs() < EPS, "{:?}", plunge.end);
        assert!((plunge.start.z - 2.54).abs() < EPS, "{:?}", plunge.start);
        assert!((plunge.feed_rate - 254.0).abs() < EPS);
        assert!((plunge.duration - 2.1).abs() < EPS);
        assert!(!plunge.is_rapid);
    }
}

#[test]
fn inch_drill_retract_follows_g98_g99() {
    let tp = build_plain("drill_inch.nc");
    let retracts: Vec<_> = tp
        .commands()
        .iter()
        .filter(|c| c.drill_phase == Some(DrillPhase::Retract))
        .collect();
    assert_eq!(retracts.len(), 3);
    assert!(retracts.iter().all(|c| c.is_rapid));
    // Two G99 holes back to R0.1, then a G98 hole back to the Z1.0 start level.
    let levels: Vec<f64> = retracts.iter().map(|c| c.end.z).collect();
    for (level, expected) in levels.iter().zip([2.54, 2.54, 25.4]) {
        assert!((level - expected).abs() < EPS, "retract levels {levels:?}");
    }
    let last = tp.command_at(11).expect("final rapid");
    assert!((last.end.z - 25.4).abs() < EPS);
}

// ── sloppy.nc ─────────────────────────────────────────────────────────────────

#[test]
fn sloppy_program_still_simulates() {
    let tp = build_plain("sloppy.nc");
    assert_eq!(tp.len(), 7);

    let lexical: Vec<usize> = tp
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Lexical)
        .map(|d| d.line)
        .collect();
    assert_eq!(lexical, vec![4, 6]);

    let lines_with = |kind: DiagnosticKind| -> Vec<usize> {
        let mut lines: Vec<usize> = tp
            .diagnostics()
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.line)
            .collect();
        lines.dedup();
        lines
    };
    assert_eq!(lines_with(DiagnosticKind::Semantic), vec![5, 7, 9, 10]);
    assert_eq!(lines_with(DiagnosticKind::Geometric), vec![8, 11]);
}

#[test]
fn sloppy_program_resolves_each_mistake() {
    let tp = build_plain("sloppy.nc");
    let on_line = |line: usize| {
        let index = tp.first_command_for_line(line).expect("line has motion");
        tp.command_at(index).expect("command")
    };

    assert!(tp.first_command_for_line(5).is_none(), "passthrough line moved");

    let both_forms = on_line(7);
    let arc = both_forms.arc.expect("offset form wins");
    assert_eq!(arc.center, [15.0, 10.0]);

    let no_center = on_line(8);
    assert_eq!(no_center.motion_type, MotionMode::Linear);
    assert!(no_center.arc.is_none());

    let conflict = on_line(9);
    assert!(conflict.is_rapid);

    let circle = on_line(11);
    assert!(circle.arc.expect("full circle").full_circle);
    assert_eq!(circle.start, circle.end);
    assert!((circle.length - 10.0 * PI).abs() < EPS);
}
