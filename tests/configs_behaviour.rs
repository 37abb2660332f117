mod common;
use crate::common::{
    DISTILL_CONFIG, KEYPOINT_CONFIG, TestResult, init_tracing, sample_config, write_config,
};

use expcfg::config::{
    DatasetConfig, ModelConfig, RunMode, StudentModelConfig, TestConfig, TrainConfig,
    load_and_validate, load_from_path,
};
use expcfg::errors::ExpcfgError;
use expcfg::Value;

#[test]
fn distill_config_resolves_and_validates() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(sample_config(DISTILL_CONFIG), Some(RunMode::Distill), None)?;

    assert_eq!(
        cfg.get("dataset.splits.train.images").and_then(Value::as_str),
        Some("./resource/dataset/coco2017/train2017")
    );
    assert_eq!(
        cfg["student_model"]["experiment"].as_str(),
        Some("coco2017-faster_rcnn-backbone_resnet50_from_faster_rcnn-backbone_resnet50")
    );
    assert_eq!(
        cfg["teacher_model"]["ckpt"].as_str(),
        Some("./resource/ckpt/org/coco2017-faster_rcnn-backbone_resnet50.pt")
    );
    assert_eq!(
        cfg["train"]["criterion"]["mimic_layer"].as_str(),
        Some("layer1")
    );

    Ok(())
}

#[test]
fn distill_config_typed_views() -> TestResult {
    init_tracing();

    let cfg = load_from_path(sample_config(DISTILL_CONFIG))?;

    let dataset: DatasetConfig = cfg.section("dataset")?;
    assert_eq!(dataset.root, "./resource/dataset/coco2017");
    assert_eq!(dataset.num_workers, 4);
    assert_eq!(dataset.aspect_ratio_group_factor, Some(3));
    let split_names: Vec<&str> = dataset.splits.keys().map(String::as_str).collect();
    assert_eq!(split_names, vec!["train", "val", "test"]);
    let train_split = &dataset.splits["train"];
    assert!(train_split.remove_non_annotated_imgs);
    assert_eq!(train_split.jpeg_quality, None);
    assert_eq!(
        train_split.annotations,
        "./resource/dataset/coco2017/annotations/instances_train2017.json"
    );

    let teacher: ModelConfig = cfg.section("teacher_model")?;
    assert_eq!(teacher.name, "faster_rcnn");
    assert_eq!(teacher.backbone, serde_json::json!("resnet50"));

    let student: StudentModelConfig = cfg.section("student_model")?;
    assert_eq!(student.frozen_modules, vec!["roi_heads", "rpn"]);
    assert!(student.distill_backbone_only);
    assert_eq!(student.model.backbone["name"], serde_json::json!("resnet50"));
    assert!(student.model.ckpt.starts_with("./resource/ckpt/mimic/"));

    let train: TrainConfig = cfg.section("train")?;
    assert_eq!(train.num_epochs, 20);
    assert_eq!(train.optimizer.kind, "SGD");
    assert_eq!(train.optimizer.params["lr"], serde_json::json!(0.001));
    assert_eq!(train.scheduler.kind, "MultiStepLR");
    assert_eq!(train.scheduler.params["milestones"], serde_json::json!([5, 15]));

    let test: TestConfig = cfg.section("test")?;
    assert_eq!(test.batch_size, 1);

    Ok(())
}

#[test]
fn keypoint_config_merges_split_defaults() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(sample_config(KEYPOINT_CONFIG), Some(RunMode::Train), None)?;
    cfg.validate(&RunMode::Test.schema())?;

    let train = &cfg["dataset"]["splits"]["train"];
    assert_eq!(train["remove_non_annotated_imgs"], Value::Bool(true));
    assert!(train["jpeg_quality"].is_null());
    assert_eq!(
        cfg["dataset"]["splits"]["val"]["remove_non_annotated_imgs"],
        Value::Bool(false)
    );
    assert_eq!(
        cfg["model"]["ckpt"].as_str(),
        Some("./resource/ckpt/org/coco2017-keypoint_rcnn-backbone_resnet50.pt")
    );
    assert_eq!(cfg["train"]["optimizer"]["params"]["weight_decay"], Value::Float(1.0e-4));

    Ok(())
}

#[test]
fn overrides_are_applied_before_validation() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(
        sample_config(KEYPOINT_CONFIG),
        Some(RunMode::Train),
        Some(r#"{"train": {"batch_size": 8, "optimizer": {"params": {"lr": 0.5}}}, "note": "smoke"}"#),
    )?;

    assert_eq!(cfg["train"]["batch_size"], Value::Int(8));
    assert_eq!(cfg["train"]["optimizer"]["params"]["lr"], Value::Float(0.5));
    // Untouched siblings survive the merge.
    assert_eq!(cfg["train"]["optimizer"]["params"]["momentum"], Value::Float(0.9));
    assert_eq!(cfg["train"]["optimizer"]["type"].as_str(), Some("SGD"));
    assert_eq!(cfg["note"].as_str(), Some("smoke"));

    let result = load_and_validate(
        sample_config(KEYPOINT_CONFIG),
        Some(RunMode::Train),
        Some(r#"{"train": {"batch_size": 0}}"#),
    );
    match result {
        Err(ExpcfgError::Validation(report)) => {
            assert!(report.mentions("train.batch_size"), "{report}");
        }
        other => panic!("Expected Validation error, got: {:?}", other),
    }

    Ok(())
}

#[test]
fn override_keys_keep_their_json_order() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(
        sample_config(KEYPOINT_CONFIG),
        None,
        Some(r#"{"extra": {"zz": 1, "aa": 2, "mm": 3}, "train": {"zz_new": true}}"#),
    )?;

    let extra = cfg["extra"].as_mapping().ok_or("extra is not a mapping")?;
    assert_eq!(extra.keys().collect::<Vec<_>>(), vec!["zz", "aa", "mm"]);
    // New keys go after the existing ones.
    let train_keys: Vec<&str> = cfg["train"]
        .as_mapping()
        .ok_or("train is not a mapping")?
        .keys()
        .collect();
    assert_eq!(train_keys.last(), Some(&"zz_new"));
    assert_eq!(train_keys.first(), Some(&"num_epochs"));

    let json = cfg.to_json();
    let extra_json: Vec<&str> = json["extra"]
        .as_object()
        .ok_or("extra is not an object")?
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(extra_json, vec!["zz", "aa", "mm"]);

    Ok(())
}

#[test]
fn config_written_to_disk_round_trips_through_loader() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = write_config(
        dir.path(),
        "dataset.yaml",
        r#"
dataset:
  root: &root_dir !join ['./resource/dataset/', 'coco2017']
  num_workers: 0
  splits:
    train:
      images: !join [*root_dir, '/train2017']
      annotations: !join [*root_dir, '/annotations/instances_train2017.json']
"#,
    )?;

    let cfg = load_and_validate(&path, Some(RunMode::Dataset), None)?;
    let dataset: DatasetConfig = cfg.section("dataset")?;
    assert_eq!(dataset.splits["train"].images, "./resource/dataset/coco2017/train2017");
    assert!(!dataset.splits["train"].remove_non_annotated_imgs);

    Ok(())
}

#[test]
fn typed_view_mismatch_names_the_section() -> TestResult {
    init_tracing();

    let cfg = expcfg::resolve("train:\n  num_epochs: twenty\n")?;
    match cfg.section::<TrainConfig>("train") {
        Err(ExpcfgError::Model { section, .. }) => assert_eq!(section, "train"),
        other => panic!("Expected Model error, got: {:?}", other),
    }

    Ok(())
}
