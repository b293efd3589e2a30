use point_cloud_tiling::{
    HeightfieldReconstructor, MemorySource, Pipeline, PipelineConfig, PipelineError, PointRecord,
    Rgb8, TileKey, VertexClusterDecimator,
};
use std::fs;
use std::path::Path;

const TILE: f64 = 10.0;

/// Four dense 2x2 tiles plus one tile too sparse to mesh.
fn synthetic_cloud() -> Vec<PointRecord> {
    let colours = [[200, 40, 40], [40, 200, 40], [40, 40, 200], [200, 200, 40]];
    let mut points = Vec::new();
    for (t, (tx, ty)) in [(0, 0), (1, 0), (0, 1), (1, 1)].into_iter().enumerate() {
        for j in 0..20 {
            for i in 0..20 {
                let x = tx as f64 * TILE + i as f64 * 0.5;
                let y = ty as f64 * TILE + j as f64 * 0.5;
                points.push(PointRecord::new(x, y, (x * 0.1).sin(), Rgb8(colours[t])));
            }
        }
    }
    points.push(PointRecord::new(45.0, 45.0, 0.0, Rgb8([9, 9, 9])));
    points.push(PointRecord::new(45.5, 45.0, 0.0, Rgb8([9, 9, 9])));
    points
}

fn config(max_total_polycount: u64) -> PipelineConfig {
    PipelineConfig {
        tile_size: TILE,
        chunk_size: 37,
        max_total_polycount,
        meshing_depth: 3,
        texture_resolution: 32,
        show_progress: false,
        ..PipelineConfig::default()
    }
}

fn run(config: PipelineConfig, out: &Path) -> point_cloud_tiling::RunReport {
    let reconstructor = HeightfieldReconstructor;
    let decimator = VertexClusterDecimator;
    let mut source = MemorySource::new(synthetic_cloud(), true);
    Pipeline::new(config, &reconstructor, &decimator)
        .run(&mut source, "synthetic", out)
        .unwrap()
}

#[test]
fn full_run_writes_every_stage() {
    let tmp = tempfile::tempdir().unwrap();
    let report = run(config(1_000_000), tmp.path());

    assert_eq!(report.tiling.input_points, 1602);
    assert_eq!(report.tiling.tiles_written, 5);
    assert_eq!(report.meshing.dropped_by_reconstruction, vec![TileKey::new(4, 4)]);
    assert!(!report.meshing.decimated);
    assert_eq!(report.texturing.textured, 4);
    assert!(report.texturing.dropped_by_texturing.is_empty());

    assert!(!tmp.path().join("step1_tiling").join("tmp").exists());
    for base in ["tile_0_0", "tile_1_0", "tile_0_1", "tile_1_1"] {
        assert!(tmp.path().join("step1_tiling").join(format!("{base}.ply")).exists());
        assert!(tmp.path().join("step2_meshing").join(format!("{base}.ply")).exists());
        for ext in ["obj", "mtl", "png"] {
            assert!(
                tmp.path().join("step3_texturing").join(format!("{base}.{ext}")).exists(),
                "missing {base}.{ext}"
            );
        }
    }
    assert!(!tmp.path().join("step2_meshing").join("tile_4_4.ply").exists());

    let texture = image::open(tmp.path().join("step3_texturing").join("tile_0_0.png"))
        .unwrap()
        .to_rgb8();
    assert_eq!(texture.dimensions(), (32, 32));
    assert!(texture.pixels().all(|p| p.0 != [0, 0, 0]));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(json["texturing"]["textured"], 4);
    assert_eq!(json["tiling"]["tiles_written"], 5);
}

#[test]
fn budget_is_enforced_across_tiles() {
    let tmp = tempfile::tempdir().unwrap();
    let report = run(config(40), tmp.path());

    assert!(report.meshing.decimated);
    assert!(report.meshing.total_triangles_before > 40);
    assert!(report.meshing.total_triangles_after <= 40);
    assert_eq!(report.texturing.textured, 4);
}

#[test]
fn zero_share_of_budget_bakes_empty_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let report = run(config(1), tmp.path());

    assert!(report.meshing.decimated);
    assert_eq!(report.meshing.total_triangles_after, 0);
    assert!(report.meshing.dropped_by_decimation.is_empty());
    assert_eq!(report.texturing.textured, 4);
    assert!(report.texturing.dropped_by_texturing.is_empty());

    let texturing = tmp.path().join("step3_texturing");
    let obj = fs::read_to_string(texturing.join("tile_0_0.obj")).unwrap();
    assert!(obj.contains("mtllib tile_0_0.mtl"));
    assert!(!obj.lines().any(|l| l.starts_with("v ") || l.starts_with("f ")));
    assert!(texturing.join("tile_0_0.mtl").exists());
    let texture = image::open(texturing.join("tile_0_0.png")).unwrap().to_rgb8();
    assert_eq!(texture.dimensions(), (32, 32));
}

#[test]
fn reruns_replace_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    run(config(1_000_000), tmp.path());
    let first = fs::read(tmp.path().join("step1_tiling").join("tile_1_1.ply")).unwrap();
    let stray = tmp.path().join("step3_texturing").join("stale.png");
    fs::write(&stray, b"stale").unwrap();

    run(config(1_000_000), tmp.path());
    let second = fs::read(tmp.path().join("step1_tiling").join("tile_1_1.ply")).unwrap();
    assert_eq!(first, second);
    assert!(!stray.exists());
}

#[test]
fn missing_input_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let reconstructor = HeightfieldReconstructor;
    let decimator = VertexClusterDecimator;
    let err = Pipeline::new(config(1_000), &reconstructor, &decimator)
        .run_las(&tmp.path().join("missing.laz"), &out)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InputNotFound(_)));
    assert!(!out.exists());
}

#[test]
fn invalid_config_is_rejected_before_tiling() {
    let tmp = tempfile::tempdir().unwrap();
    let reconstructor = HeightfieldReconstructor;
    let decimator = VertexClusterDecimator;
    let mut source = MemorySource::new(synthetic_cloud(), true);
    let bad = PipelineConfig {
        tile_size: 0.0,
        ..config(1_000)
    };
    let err = Pipeline::new(bad, &reconstructor, &decimator)
        .run(&mut source, "synthetic", tmp.path())
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
    assert!(!tmp.path().join("step1_tiling").exists());
}
