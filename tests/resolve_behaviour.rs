mod common;
use crate::common::{TestResult, init_tracing};

use expcfg::resolve::{AnchorTable, parse};
use expcfg::{Value, resolve};

#[test]
fn join_concatenates_literals_without_separator() -> TestResult {
    init_tracing();

    let cfg = resolve("path: !join ['a/', 'b']\n")?;
    assert_eq!(cfg["path"].as_str(), Some("a/b"));

    Ok(())
}

#[test]
fn join_substitutes_aliases_in_order() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
dataset_name: &dataset_name coco2017
model_name: &model_name faster_rcnn
experiment: !join [*dataset_name, '-', *model_name]
"#,
    )?;
    assert_eq!(cfg["experiment"].as_str(), Some("coco2017-faster_rcnn"));

    Ok(())
}

#[test]
fn dataset_paths_are_joined_from_root_dir() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
dataset:
  root: &root_dir !join ['./resource/dataset/', 'coco2017']
  splits:
    train:
      images: !join [*root_dir, '/train2017']
"#,
    )?;

    assert_eq!(
        cfg["dataset"]["root"].as_str(),
        Some("./resource/dataset/coco2017")
    );
    assert_eq!(
        cfg["dataset"]["splits"]["train"]["images"].as_str(),
        Some("./resource/dataset/coco2017/train2017")
    );
    assert_eq!(
        cfg.get("dataset.splits.train.images").and_then(Value::as_str),
        Some("./resource/dataset/coco2017/train2017")
    );

    Ok(())
}

#[test]
fn five_part_experiment_name() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
dataset:
  name: &dataset_name 'coco2017'
teacher_model:
  name: &teacher_model_name 'faster_rcnn'
  backbone: &teacher_backbone 'resnet50'
student_model:
  name: &student_model_name 'faster_rcnn'
  backbone: &student_backbone 'resnet18'
  experiment: !join [*dataset_name, '-', *student_model_name, '-backbone_', *student_backbone, '_from_', *teacher_model_name, '-backbone_', *teacher_backbone]
"#,
    )?;

    assert_eq!(
        cfg["student_model"]["experiment"].as_str(),
        Some("coco2017-faster_rcnn-backbone_resnet18_from_faster_rcnn-backbone_resnet50")
    );

    Ok(())
}

#[test]
fn anchor_reused_many_times_yields_identical_values() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
base: &base
  lr: 0.01
  milestones: [5, 15]
a: *base
b: *base
c: [*base, *base]
"#,
    )?;

    let base = &cfg["base"];
    assert!(base.as_mapping().is_some());
    assert_eq!(&cfg["a"], base);
    assert_eq!(&cfg["b"], base);
    assert_eq!(&cfg["c"][0], base);
    assert_eq!(&cfg["c"][1], base);

    Ok(())
}

#[test]
fn resolving_twice_gives_equal_trees() -> TestResult {
    init_tracing();

    let text = r#"
name: &n coco2017
root: &root !join ['./data/', *n]
splits:
  train: !join [*root, '/train']
  val: !join [*root, '/val']
"#;
    assert_eq!(resolve(text)?, resolve(text)?);

    Ok(())
}

#[test]
fn nested_join_and_alias_to_join() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
stem: &stem !join ['faster', '_', !join ['r', 'cnn']]
ckpt: !join ['./ckpt/', *stem, '.pt']
"#,
    )?;

    assert_eq!(cfg["stem"].as_str(), Some("faster_rcnn"));
    assert_eq!(cfg["ckpt"].as_str(), Some("./ckpt/faster_rcnn.pt"));

    Ok(())
}

#[test]
fn join_uses_scalar_string_forms() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
epochs: &epochs 20
lr: &lr 1.0
flag: &flag true
name: !join ['e', *epochs, '-lr', *lr, '-', *flag, '-', ~]
"#,
    )?;

    assert_eq!(cfg["epochs"].as_i64(), Some(20));
    assert_eq!(cfg["name"].as_str(), Some("e20-lr1.0-true-null"));

    Ok(())
}

#[test]
fn plain_scalars_are_typed_and_quoted_ones_stay_strings() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
int: 42
hex: 0x1F
neg: -7
float: 0.001
exp: 1.0e-4
inf: .inf
yes_flag: yes
off_flag: Off
null_value: ~
empty_value:
quoted_int: '42'
quoted_bool: "true"
tagged_str: !!str 3
tagged_float: !!float 3
"#,
    )?;

    assert_eq!(cfg["int"], Value::Int(42));
    assert_eq!(cfg["hex"], Value::Int(31));
    assert_eq!(cfg["neg"], Value::Int(-7));
    assert_eq!(cfg["float"], Value::Float(0.001));
    assert_eq!(cfg["exp"], Value::Float(1.0e-4));
    assert_eq!(cfg["inf"], Value::Float(f64::INFINITY));
    assert_eq!(cfg["yes_flag"], Value::Bool(true));
    assert_eq!(cfg["off_flag"], Value::Bool(false));
    assert!(cfg["null_value"].is_null());
    assert!(cfg["empty_value"].is_null());
    assert_eq!(cfg["quoted_int"], Value::String("42".into()));
    assert_eq!(cfg["quoted_bool"], Value::String("true".into()));
    assert_eq!(cfg["tagged_str"], Value::String("3".into()));
    assert_eq!(cfg["tagged_float"], Value::Float(3.0));

    Ok(())
}

#[test]
fn merge_keys_import_entries_and_explicit_keys_win() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
defaults: &defaults
  remove_non_annotated_imgs: false
  jpeg_quality: 95
extra: &extra
  jpeg_quality: 10
  num_workers: 2
train:
  <<: [*defaults, *extra]
  images: ./train2017
  remove_non_annotated_imgs: true
"#,
    )?;

    let train = cfg["train"].as_mapping().ok_or("train is not a mapping")?;
    let keys: Vec<&str> = train.keys().collect();
    assert_eq!(
        keys,
        vec!["remove_non_annotated_imgs", "jpeg_quality", "num_workers", "images"]
    );
    assert_eq!(cfg["train"]["remove_non_annotated_imgs"], Value::Bool(true));
    // The earlier merge source wins.
    assert_eq!(cfg["train"]["jpeg_quality"], Value::Int(95));
    assert_eq!(cfg["train"]["num_workers"], Value::Int(2));
    assert!(!train.contains_key("<<"));

    Ok(())
}

#[test]
fn quoted_merge_key_is_an_ordinary_key() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
base: &base {x: 1}
quoted:
  '<<': *base
  y: 2
plain:
  <<: *base
  y: 2
"#,
    )?;

    let quoted = cfg["quoted"].as_mapping().ok_or("quoted is not a mapping")?;
    assert_eq!(quoted.keys().collect::<Vec<_>>(), vec!["<<", "y"]);
    assert_eq!(cfg["quoted"]["<<"]["x"], Value::Int(1));
    assert_eq!(cfg["plain"]["x"], Value::Int(1));
    assert!(!cfg["plain"].as_mapping().ok_or("plain is not a mapping")?.contains_key("<<"));

    Ok(())
}

#[test]
fn keys_keep_their_source_text() -> TestResult {
    init_tracing();

    let cfg = resolve("1e3: a
0x10: b
on: c
~: d
'quoted': e
")?;

    let keys: Vec<&str> = cfg
        .root()
        .as_mapping()
        .ok_or("root is not a mapping")?
        .keys()
        .collect();
    assert_eq!(keys, vec!["1e3", "0x10", "on", "~", "quoted"]);
    assert_eq!(cfg["1e3"].as_str(), Some("a"));
    // Values are still typed.
    assert_eq!(resolve("v: 1e3
")?["v"], Value::Float(1000.0));

    Ok(())
}

#[test]
fn redefined_anchor_binds_to_latest_declaration() -> TestResult {
    init_tracing();

    let cfg = resolve(
        r#"
first: &name alpha
a: *name
second: &name beta
b: *name
"#,
    )?;

    assert_eq!(cfg["a"].as_str(), Some("alpha"));
    assert_eq!(cfg["b"].as_str(), Some("beta"));

    Ok(())
}

#[test]
fn duplicate_keys_keep_the_last_value() -> TestResult {
    init_tracing();

    let cfg = resolve("batch_size: 2\nbatch_size: 4\n")?;
    assert_eq!(cfg["batch_size"], Value::Int(4));
    assert_eq!(cfg.root().as_mapping().map(|m| m.len()), Some(1));

    Ok(())
}

#[test]
fn empty_document_resolves_to_null() -> TestResult {
    init_tracing();

    let cfg = resolve("# nothing here\n")?;
    assert!(cfg.root().is_null());
    assert!(cfg["anything"].is_null());

    Ok(())
}

#[test]
fn missing_keys_index_to_null_and_paths_reach_into_sequences() -> TestResult {
    init_tracing();

    let cfg = resolve("milestones: [5, 15]\nfrozen: [{name: rpn}]\n")?;
    assert!(cfg["dataset"]["splits"]["train"].is_null());
    assert_eq!(cfg.get("milestones.1"), Some(&Value::Int(15)));
    assert_eq!(cfg.get("frozen.0.name").and_then(Value::as_str), Some("rpn"));
    assert_eq!(cfg.get("milestones.7"), None);

    Ok(())
}

#[test]
fn anchor_table_records_names_paths_and_dependencies() -> TestResult {
    init_tracing();

    let doc = parse(
        r#"
dataset:
  name: &dataset_name coco2017
  root: &root_dir !join ['./resource/dataset/', *dataset_name]
"#,
    )?;
    let table = AnchorTable::build(&doc);
    assert_eq!(table.len(), 2);

    let names: Vec<&str> = table.entries().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["dataset_name", "root_dir"]);

    let root_dir = table
        .entries()
        .find(|e| e.name == "root_dir")
        .ok_or("root_dir not recorded")?;
    assert_eq!(root_dir.path.to_string(), "dataset.root");

    let deps: Vec<String> = table
        .dependencies_of(root_dir.id)
        .into_iter()
        .map(|id| table.name_of(id))
        .collect();
    assert_eq!(deps, vec!["dataset_name".to_string()]);

    let order: Vec<String> = table
        .resolution_order()?
        .into_iter()
        .map(|id| table.name_of(id))
        .collect();
    assert_eq!(order, vec!["dataset_name".to_string(), "root_dir".to_string()]);

    Ok(())
}

#[test]
fn resolved_config_serializes_in_document_order() -> TestResult {
    init_tracing();

    let cfg = resolve("zeta: 1\nalpha: !join ['a', 'b']\nmid: [true, ~]\n")?;
    let json = serde_json::to_string(&cfg)?;
    assert_eq!(json, r#"{"zeta":1,"alpha":"ab","mid":[true,null]}"#);
    assert_eq!(cfg.to_json().to_string(), json);

    Ok(())
}
