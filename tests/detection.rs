use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use image::{ImageFormat, RgbImage};

use pokemon_card_scanner::detector::{DetectionConfig, Outcome};
use pokemon_card_scanner::events::{DetectionEvent, RecordingSink};
use pokemon_card_scanner::response::{scan_file, NegativeReason, ResponseShape};
use pokemon_card_scanner::vision::{rect_quad, FixedRecognizer, Point, RawDetection, SidecarRecognizer};
use pokemon_card_scanner::{DetectError, Matcher, ScanImage, TwoPassDetector, Vocabulary};

fn write_card(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::new(64, 48).save(&path).unwrap();
    path
}

/// Box of `area / 10` by 10 pixels
fn hit(text: &str, area: f64, confidence: f64) -> RawDetection {
    RawDetection::new(rect_quad(0.0, 0.0, area / 10.0, 10.0), text, confidence)
}

fn detector(detections: Vec<RawDetection>) -> TwoPassDetector {
    TwoPassDetector::new(
        Arc::new(FixedRecognizer::new(detections)),
        Arc::new(Vocabulary::builtin()),
    )
}

/// Single clean detection re-admits itself in the second pass
#[test]
fn test_single_name_card() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "pikachu.png");

    let outcome = detector(vec![hit("Pikachu", 1000.0, 0.9)])
        .detect_file(&card, &DetectionConfig::default())?;

    let Outcome::Found(matches) = outcome else {
        panic!("expected a match, got {outcome:?}");
    };
    assert_eq!(matches.len(), 1);
    assert_eq!(matches.first().name, "Pikachu");
    assert!(matches.first().similarity > 72.0);
    assert!((matches.first().confidence - 0.9).abs() < 1e-9);
    Ok(())
}

/// Card-type suffixes such as "VMAX" still match under the default scorer
#[test]
fn test_name_with_card_suffix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "vmax.png");

    let outcome = detector(vec![hit("Pikachu VMAX", 1000.0, 0.9)])
        .detect_file(&card, &DetectionConfig::default())?;

    assert_eq!(outcome.names(), vec!["Pikachu".to_string()]);
    Ok(())
}

/// Uploads are often saved under a generic name whatever their format
#[test]
fn test_jpeg_with_png_extension_is_scanned() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let upload = dir.path().join("upload.png");
    RgbImage::new(64, 48).save_with_format(&upload, ImageFormat::Jpeg)?;

    let outcome = detector(vec![hit("Eevee", 1000.0, 0.8)])
        .detect_file(&upload, &DetectionConfig::default())?;

    assert_eq!(outcome.names(), vec!["Eevee".to_string()]);
    Ok(())
}

/// Level label is far smaller than the name and never considered
#[test]
fn test_small_fragment_excluded_by_size() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "card.png");

    let outcome = detector(vec![hit("Pikachu", 1000.0, 0.9), hit("lv", 50.0, 0.8)])
        .detect_file(&card, &DetectionConfig::default())?;

    assert_eq!(outcome.names(), vec!["Pikachu".to_string()]);
    Ok(())
}

/// A typical card: name, HP, attacks, flavour text
#[test]
fn test_realistic_card_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "charmander.png");

    let detections = vec![
        RawDetection::new(rect_quad(20.0, 10.0, 40.0, 8.0), "BASIC", 0.95),
        RawDetection::new(rect_quad(60.0, 10.0, 180.0, 30.0), "Charmandr", 0.81),
        RawDetection::new(rect_quad(250.0, 12.0, 50.0, 26.0), "HP 70", 0.9),
        RawDetection::new(rect_quad(40.0, 300.0, 90.0, 14.0), "Ember", 0.88),
        RawDetection::new(rect_quad(240.0, 300.0, 20.0, 14.0), "30", 0.97),
        RawDetection::new(rect_quad(40.0, 420.0, 260.0, 10.0), "Obviously prefers hot places.", 0.6),
    ];

    let outcome = detector(detections).detect_file(&card, &DetectionConfig::default())?;
    assert_eq!(outcome.names(), vec!["Charmander".to_string()]);
    Ok(())
}

/// Rotated name on a tilted photo is measured by its bounding box
#[test]
fn test_rotated_region_uses_bounding_box() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "tilted.png");

    let tilted = RawDetection::new(
        [
            Point::new(10.0, 40.0),
            Point::new(110.0, 20.0),
            Point::new(112.0, 30.0),
            Point::new(12.0, 50.0),
        ],
        "Bulbasaur",
        0.7,
    );
    // bounding box 102 x 30 = 3060; the upright duplicate below is inside ±30%
    let upright = RawDetection::new(rect_quad(0.0, 100.0, 100.0, 30.0), "Bulbasaur", 0.6);

    let outcome = detector(vec![tilted, upright]).detect_file(&card, &DetectionConfig::default())?;
    assert_eq!(outcome.names().len(), 2);
    Ok(())
}

#[test]
fn test_undecodable_image_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let card = dir.path().join("broken.png");
    std::fs::write(&card, b"not an image").unwrap();

    let result = detector(vec![hit("Pikachu", 1000.0, 0.9)])
        .detect_file(&card, &DetectionConfig::default());

    assert!(matches!(result, Err(DetectError::ImageLoad { .. })));
}

#[test]
fn test_no_reference_is_not_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "trainer.png");

    let outcome = detector(vec![hit("Professor's Research", 2000.0, 0.9), hit("Trainer", 400.0, 0.9)])
        .detect_file(&card, &DetectionConfig::default())?;

    assert_eq!(outcome, Outcome::NoReference);
    Ok(())
}

#[test]
fn test_best_only_prefers_confident_match() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "binder.png");

    let detections = vec![
        hit("Raichu", 1000.0, 0.2),
        hit("Pikachu", 1000.0, 0.95),
        hit("Eevee", 1100.0, 0.5),
    ];
    let config = DetectionConfig {
        best_only: true,
        ..Default::default()
    };

    let image = ScanImage::open(&card)?;
    let best = detector(detections).detect_best(&image, &config)?;
    assert_eq!(best.found().unwrap().name, "Pikachu");
    Ok(())
}

#[test]
fn test_repeated_scans_are_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "card.png");
    let detector = detector(vec![
        hit("Mewtwo", 1200.0, 0.8),
        hit("Mew", 1000.0, 0.7),
        hit("Psychic", 400.0, 0.9),
    ]);

    let config = DetectionConfig::default();
    let first = detector.detect_file(&card, &config)?;
    let second = detector.detect_file(&card, &config)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_concurrent_scans_share_detector() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "card.png");
    let detector = detector(vec![hit("Gengar", 1000.0, 0.9), hit("Haunter", 900.0, 0.8)]);
    let config = DetectionConfig::default();

    let results: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| detector.detect_file(&card, &config).unwrap().names()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for names in results {
        assert_eq!(names, vec!["Gengar".to_string(), "Haunter".to_string()]);
    }
    Ok(())
}

#[test]
fn test_verbose_scan_records_events() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "card.png");
    let sink = Arc::new(RecordingSink::new());
    let detector = detector(vec![hit("Snorlax", 1000.0, 0.9), hit("120", 1000.0, 0.9)])
        .with_sink(sink.clone());

    let config = DetectionConfig {
        verbose: true,
        ..Default::default()
    };
    detector.detect_file(&card, &config)?;

    let events = sink.take();
    assert_eq!(events[0], DetectionEvent::Recognized { total: 2, kept: 1 });
    assert!(events
        .iter()
        .any(|e| matches!(e, DetectionEvent::MatchAccepted { name, .. } if name == "Snorlax")));
    Ok(())
}

#[test]
fn test_ignore_case_matcher() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "caps.png");

    let strict = detector(vec![hit("SNORLAX", 1000.0, 0.9)]);
    let relaxed = detector(vec![hit("SNORLAX", 1000.0, 0.9)])
        .with_matcher(Matcher::new(Default::default(), true));

    let config = DetectionConfig::default();
    assert_eq!(strict.detect_file(&card, &config)?, Outcome::NoReference);
    assert_eq!(relaxed.detect_file(&card, &config)?.names(), vec!["Snorlax".to_string()]);
    Ok(())
}

#[test]
fn test_scan_file_with_sidecar() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let card = write_card(dir.path(), "squirtle.png");
    std::fs::write(
        dir.path().join("squirtle.png.ocr.json"),
        r#"[
            [[[10, 10], [110, 10], [110, 30], [10, 30]], "Squirtle", 0.91],
            [[[10, 50], [30, 50], [30, 55], [10, 55]], "HP 50", 0.99]
        ]"#,
    )?;

    let detector = TwoPassDetector::new(
        Arc::new(SidecarRecognizer::default()),
        Arc::new(Vocabulary::builtin()),
    );
    let response = scan_file(&detector, &card, &DetectionConfig::default(), ResponseShape::All);
    let value = serde_json::to_value(&response)?;

    assert_eq!(value["success"], true);
    assert_eq!(value["count"], 1);
    assert_eq!(value["pokemon"][0]["name"], "Squirtle");
    Ok(())
}

#[test]
fn test_scan_file_reports_errors_and_negatives_separately() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let blank = write_card(dir.path(), "blank.png");
    std::fs::write(dir.path().join("blank.png.ocr.json"), "[]")?;
    let missing = dir.path().join("missing.png");

    let detector = TwoPassDetector::new(
        Arc::new(SidecarRecognizer::default()),
        Arc::new(Vocabulary::builtin()),
    );
    let config = DetectionConfig::default();

    let negative = scan_file(&detector, &blank, &config, ResponseShape::Best);
    assert!(!negative.success);
    assert!(negative.error.is_none());
    assert_eq!(negative.reason, Some(NegativeReason::NoReference));

    let failed = scan_file(&detector, &missing, &config, ResponseShape::Best);
    assert!(!failed.success);
    assert!(failed.error.is_some());
    assert!(failed.reason.is_none());
    Ok(())
}
