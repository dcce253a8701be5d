use std::path::PathBuf;

use fbd_core::convert::{ConvertOptions, convert};
use fbd_core::model::{ArcEdge, EdgeLoop, LineEdge};
use fbd_io::fbd::GENERATOR;
use fbd_io::{DxfFacade, FbdEmitter, IoError, RecordLoader};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn square_converts_to_expected_fbd() {
    let records = DxfFacade::new()
        .load(&fixture("square.dxf"))
        .expect("读取 DXF 失败");
    assert_eq!(records.len(), 6);

    let conversion = convert(&records, &ConvertOptions::default()).expect("转换失败");
    assert_eq!(conversion.unsupported, vec!["CIRCLE".to_string()]);

    let text = FbdEmitter::default()
        .with_source("square.dxf")
        .render(&conversion);
    let expected = format!(
        "# Generated by {GENERATOR}
# from “square.dxf”

# Points extracted from DXF
pnt P1 0.0 0.0000000 0.0000000
pnt P2 0.0 0.1000000 0.0000000
pnt P3 0.0 0.1000000 0.0500000
pnt P4 0.0 0.0000000 0.0500000

# Lines extracted from DXF
line L1 P1 P2
line L2 P2 P3
line L3 P3 P4
line L4 P4 P1

# Detected surfaces
surf S1 L1 L2 L3 L4

# Show geometry up to now
plot pa all
plus la all
plus sa all
rot y
rot r 90
break
"
    );
    assert_eq!(text, expected);
}

#[test]
fn mixed_primitives_share_points_and_form_loops() {
    let records = DxfFacade::new()
        .load(&fixture("mixed.dxf"))
        .expect("读取 DXF 失败");
    let conversion = convert(&records, &ConvertOptions::default()).expect("转换失败");
    let model = &conversion.model;

    assert_eq!(model.points.len(), 14);
    assert_eq!(
        model.lines,
        vec![
            LineEdge { start: 0, end: 1 },
            LineEdge { start: 3, end: 4 },
            LineEdge { start: 4, end: 0 },
            LineEdge { start: 12, end: 13 },
            LineEdge { start: 13, end: 5 },
        ]
    );
    assert_eq!(
        model.arcs,
        vec![ArcEdge {
            start: 1,
            end: 3,
            center: 2
        }]
    );
    assert_eq!(model.splines.len(), 1);
    let spline = &model.splines[0];
    assert_eq!((spline.start(), spline.end()), (5, 12));
    assert_eq!(spline.interior(), &[6, 7, 8, 9, 10, 11]);

    assert_eq!(
        conversion.loops,
        vec![
            EdgeLoop::new(vec![4, 5, 7]),
            EdgeLoop::new(vec![1, 2, 3, 6]),
        ]
    );
    assert_eq!(conversion.unsupported, vec!["TEXT".to_string()]);

    let text = FbdEmitter::default().render(&conversion);
    assert!(text.contains("line L6 P02 P04 P03\n"), "{text}");
    assert!(
        text.contains("seqa A7 pnt P07 P08 P09 P10 P11 P12\nline L7 P06 P13 A7\n"),
        "{text}"
    );
    assert!(text.contains("surf S1 L4 L5 L7\nsurf S2 L1 L2 L3 L6\n"), "{text}");
}

#[test]
fn tight_tolerance_keeps_nearby_points_apart() {
    let records = DxfFacade::new()
        .load(&fixture("mixed.dxf"))
        .expect("读取 DXF 失败");
    let options = ConvertOptions {
        tolerance: 1e-6,
        ..ConvertOptions::default()
    };
    let conversion = convert(&records, &options).expect("转换失败");
    // 多段线末点 (0, 1e-5) 不再与原点合并，左侧四边形因此断开。
    assert_eq!(conversion.model.points.len(), 15);
    assert_eq!(conversion.loops, vec![EdgeLoop::new(vec![4, 5, 7])]);
}

#[test]
fn malformed_arc_aborts_conversion() {
    let records = DxfFacade::new()
        .load(&fixture("malformed_arc.dxf"))
        .expect("读取 DXF 失败");
    let err = convert(&records, &ConvertOptions::default()).expect_err("应当失败");
    assert!(err.to_string().contains("ARC"), "{err}");
}

#[test]
fn missing_file_is_a_read_error() {
    let result = DxfFacade::new().load(&fixture("does_not_exist.dxf"));
    assert!(matches!(result, Err(IoError::ReadError { .. })));
}

#[test]
fn save_writes_the_rendered_text() {
    let records = DxfFacade::new()
        .load(&fixture("square.dxf"))
        .expect("读取 DXF 失败");
    let conversion = convert(&records, &ConvertOptions::default()).expect("转换失败");
    let dir = tempfile::tempdir().expect("create temp dir");
    let target = dir.path().join("square.fbd");

    let emitter = FbdEmitter::new(1.0);
    emitter.save(&target, &conversion).expect("写入 FBD 失败");
    let written = std::fs::read_to_string(&target).expect("read back");
    assert_eq!(written, emitter.render(&conversion));
    assert!(written.contains("pnt P3 0.0 100.0000000 50.0000000\n"));
}
