#![allow(dead_code)]
#![allow(unused_imports)]

use std::error::Error;

pub use expcfg_test_utils::builders::{DatasetDocBuilder, JoinDocBuilder};
pub use expcfg_test_utils::{init_tracing, sample_config, write_config};

pub type TestResult = Result<(), Box<dyn Error>>;

pub const DISTILL_CONFIG: &str =
    "coco2017/mimic/faster_rcnn-backbone_resnet50_from_faster_rcnn-backbone_resnet50.yaml";
pub const KEYPOINT_CONFIG: &str = "coco2017/org/keypoint_rcnn-backbone_resnet50.yaml";
