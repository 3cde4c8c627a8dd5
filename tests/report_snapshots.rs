//! Snapshot tests for the plain-text layout report.

use gridscale::config::LayoutConstants;
use gridscale::layout::{FixedMetrics, FrameTime, LayoutEngine};
use gridscale::model::{Anchor, MarkerId, ModulationMarker, ModulationRatio, Rhythm, ScoreSnapshot};
use gridscale::report::{LayoutReport, Probes};

fn render(score: ScoreSnapshot) -> String {
    let mut engine =
        LayoutEngine::init(LayoutConstants::default(), score, FixedMetrics::new(600.0)).unwrap();
    engine.on_animation_frame(FrameTime::from_millis(16.0));

    let probes = Probes {
        columns: vec![2.0],
        xs: vec![52.5],
    };
    LayoutReport::new(&engine, &probes).to_string()
}

#[test]
fn report_without_modulation() {
    let output = render(ScoreSnapshot::new(Rhythm::new(vec![2, 2]), 88));
    insta::assert_snapshot!(output, @r"
Columns: 8 (4 legend, 4 musical), 5.000 units
  widths: 0.25 0.25 1 1 1 1 0.25 0.25
Macrobeats:
  0: columns 2..=3, 2 microbeats
  1: columns 4..=5, 2 microbeats
Tonic slots: none
Segments:
  0: x 0.000..inf, scale 1.000, 15.000 px/unit
Viewport:
  zoom 1.000 (min 0.455, max 3.000)
  cell 15.000 x 30.000 px, rank 15.000 px
  ranks 24..64 of 88, scroll 0.500 (360.000 px)
Dimensions:
  musical 60.000 px, legend 7.500 px, total 75 px
  drum 3 x 45.000 px = 135.000 px
Probes:
  column 2.000 -> x 7.500
  x 52.500 -> column 5.000
");
}

#[test]
fn report_with_compress_marker() {
    let mut score = ScoreSnapshot::new(Rhythm::new(vec![2, 2]), 88);
    score.modulation_markers.push(ModulationMarker::new(
        MarkerId::new("m1").unwrap(),
        ModulationRatio::Compress,
        Anchor::Measure(1),
    ));
    let output = render(score);
    insta::assert_snapshot!(output, @r"
Columns: 8 (4 legend, 4 musical), 5.000 units
  widths: 0.25 0.25 1 1 1 1 0.25 0.25
Macrobeats:
  0: columns 2..=3, 2 microbeats
  1: columns 4..=5, 2 microbeats
Tonic slots: none
Segments:
  0: x 0.000..22.500, scale 1.000, 15.000 px/unit
  1: x 22.500..inf, scale 0.667, 10.000 px/unit, after m1 (2:3)
Viewport:
  zoom 1.000 (min 0.455, max 3.000)
  cell 15.000 x 30.000 px, rank 15.000 px
  ranks 24..64 of 88, scroll 0.500 (360.000 px)
Dimensions:
  musical 45.000 px, legend 7.500 px, total 60 px
  drum 3 x 45.000 px = 135.000 px
Probes:
  column 2.000 -> x 7.500
  x 52.500 -> column 6.000
");
}
