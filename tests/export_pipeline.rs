//! End-to-end export through the real `image` backend and ZIP archiver.
//!
//! Small targets keep the renders fast; the preset sizes are exercised
//! through the quality gate, where a small photo must be rejected.

use image::{ImageFormat, RgbImage};
use print_exporter::archive::ZipArchiver;
use print_exporter::config::TargetSettings;
use print_exporter::export::{self, ExportError, ExportEvent, ExportRequest, Exporter};
use print_exporter::imaging::{EncodeSettings, RustBackend, open_source};
use print_exporter::naming;
use print_exporter::presets::{self, Orientation};
use print_exporter::types::{LayoutMode, OutputFormat, Rgb, Size, TargetSpec};
use std::io::{Cursor, Read};
use std::path::Path;
use tempfile::TempDir;

const PPM_300_DPI: u32 = 11811;

fn write_source(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let path = dir.join(name);
    img.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}

fn small_target(id: &str, width: u32, height: u32, mode: LayoutMode) -> TargetSpec {
    TargetSpec {
        id: id.into(),
        label: format!("{id} poster"),
        filename_tag: format!("{id}_{width}x{height}"),
        size: Size::new(width, height).unwrap(),
        mode,
        mat_percent: 10,
        background: Rgb::WHITE,
    }
}

fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

/// (type, data) of each PNG chunk.
fn png_chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    let mut chunks = Vec::new();
    let mut pos = 8;
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        chunks.push((kind, png[pos + 8..pos + 8 + len].to_vec()));
        pos += 12 + len;
    }
    chunks
}

#[test]
fn export_writes_zip_with_dpi_stamped_posters() {
    let tmp = TempDir::new().unwrap();
    let source_path = write_source(tmp.path(), "Beach Day.png", 300, 400);
    let source = open_source(&source_path).unwrap();

    let request = ExportRequest {
        targets: vec![
            small_target("crop", 120, 150, LayoutMode::Crop),
            small_target("fit", 150, 120, LayoutMode::Fit),
            small_target("mat", 100, 100, LayoutMode::Mat),
        ],
        formats: vec![OutputFormat::Jpeg, OutputFormat::Png],
        export_name: naming::export_name_from_path(&source_path),
    };
    let mut exporter = Exporter::new(
        RustBackend::new(),
        ZipArchiver::default(),
        EncodeSettings::default(),
    );
    let (tx, rx) = std::sync::mpsc::channel();
    let outcome = exporter.run(&source, &request, Some(tx)).unwrap();
    let events: Vec<ExportEvent> = rx.into_iter().collect();

    let saved = export::save_archive(&tmp.path().join("out"), &outcome.archive).unwrap();
    assert_eq!(saved.file_name().unwrap(), "Beach_Day_posters.zip");

    let entries = unzip(&std::fs::read(&saved).unwrap());
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Beach_Day_crop_120x150.png",
            "Beach_Day_crop_120x150.jpg",
            "Beach_Day_fit_150x120_fit.png",
            "Beach_Day_fit_150x120_fit.jpg",
            "Beach_Day_mat_100x100_mat.png",
            "Beach_Day_mat_100x100_mat.jpg",
        ]
    );

    for (name, bytes) in &entries {
        let decoded = image::load_from_memory(bytes).unwrap();
        let expected = if name.contains("120x150") {
            (120, 150)
        } else if name.contains("150x120") {
            (150, 120)
        } else {
            (100, 100)
        };
        assert_eq!((decoded.width(), decoded.height()), expected, "{name}");

        if name.ends_with(".png") {
            let chunks = png_chunks(bytes);
            let phys = chunks.iter().position(|(k, _)| k == b"pHYs").unwrap();
            let idat = chunks.iter().position(|(k, _)| k == b"IDAT").unwrap();
            assert!(phys < idat, "{name}: pHYs after IDAT");
            let data = &chunks[phys].1;
            assert_eq!(u32::from_be_bytes(data[0..4].try_into().unwrap()), PPM_300_DPI);
            assert_eq!(u32::from_be_bytes(data[4..8].try_into().unwrap()), PPM_300_DPI);
            assert_eq!(data[8], 1);
        } else {
            assert_eq!(&bytes[6..11], b"JFIF\0", "{name}");
            assert_eq!(&bytes[13..18], &[1, 0x01, 0x2C, 0x01, 0x2C], "{name}");
        }
    }

    assert!(matches!(
        events.last(),
        Some(ExportEvent::Progress { percent: 100, .. })
    ));
}

#[test]
fn mat_poster_has_background_border() {
    let tmp = TempDir::new().unwrap();
    let source_path = write_source(tmp.path(), "sq.png", 200, 200);
    let source = open_source(&source_path).unwrap();

    let request = ExportRequest {
        targets: vec![small_target("mat", 100, 100, LayoutMode::Mat)],
        formats: vec![OutputFormat::Png],
        export_name: "sq".into(),
    };
    let mut exporter = Exporter::new(
        RustBackend::new(),
        ZipArchiver::default(),
        EncodeSettings::default(),
    );
    let outcome = exporter.run(&source, &request, None).unwrap();
    let entries = unzip(&outcome.archive.bytes);
    let poster = image::load_from_memory(&entries[0].1).unwrap().to_rgb8();

    // 10% of 100 → 10 px of white on every side
    for (x, y) in [(2, 50), (97, 50), (50, 2), (50, 97)] {
        assert_eq!(poster.get_pixel(x, y).0, [255, 255, 255], "({x}, {y})");
    }
}

#[test]
fn small_photo_skips_every_preset() {
    let tmp = TempDir::new().unwrap();
    let source_path = write_source(tmp.path(), "tiny.png", 400, 300);
    let source = open_source(&source_path).unwrap();

    let orientation = Orientation::of(source.size());
    assert_eq!(orientation, Orientation::Landscape);
    let targets: Vec<TargetSpec> = presets::RATIO_GROUPS
        .iter()
        .map(|g| g.target(orientation, &TargetSettings::default()))
        .collect();

    let request = ExportRequest {
        targets,
        formats: vec![OutputFormat::Png],
        export_name: "tiny".into(),
    };
    let mut exporter = Exporter::new(
        RustBackend::new(),
        ZipArchiver::default(),
        EncodeSettings::default(),
    );
    let err = exporter.run(&source, &request, None).unwrap_err();
    let ExportError::NothingAchievable { skipped } = err else {
        panic!("expected NothingAchievable, got {err}");
    };
    assert_eq!(skipped.len(), presets::RATIO_GROUPS.len());
    assert_eq!(skipped[0].target.filename_tag, "36x24_landscape");
    assert_eq!(skipped[0].required_size, Size::new(10800, 7200).unwrap());
    // 400x300 into 3:2 keeps the full width: 400 × 267
    assert_eq!(skipped[0].achievable_crop_size, Size::new(400, 267).unwrap());
}

#[test]
fn zero_formats_is_rejected_before_any_work() {
    let tmp = TempDir::new().unwrap();
    let source_path = write_source(tmp.path(), "a.png", 50, 50);
    let source = open_source(&source_path).unwrap();

    let request = ExportRequest {
        targets: vec![small_target("a", 20, 20, LayoutMode::Crop)],
        formats: vec![],
        export_name: "a".into(),
    };
    let mut exporter = Exporter::new(
        RustBackend::new(),
        ZipArchiver::default(),
        EncodeSettings::default(),
    );
    assert!(matches!(
        exporter.run(&source, &request, None),
        Err(ExportError::Validation(_))
    ));
}
