use proptest::prelude::*;

use expcfg::{Value, resolve};
use expcfg_test_utils::builders::{DatasetDocBuilder, JoinDocBuilder};

// Literals avoid control characters so they stay valid single-quoted YAML.
fn literal() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./ '#&*!:-]{0,12}"
}

fn operands() -> impl Strategy<Value = Vec<(bool, String)>> {
    proptest::collection::vec((any::<bool>(), literal()), 1..8)
}

proptest! {
    #[test]
    fn join_equals_concatenation(ops in operands()) {
        let mut builder = JoinDocBuilder::new("joined");
        for (anchored, s) in &ops {
            builder = if *anchored { builder.anchored(s) } else { builder.literal(s) };
        }

        let cfg = builder.resolve().expect("generated document resolves");
        let expected = builder.expected();
        prop_assert_eq!(cfg["joined"].as_str(), Some(expected.as_str()));
    }

    #[test]
    fn resolution_is_deterministic(ops in operands()) {
        let mut builder = JoinDocBuilder::new("joined");
        for (anchored, s) in &ops {
            builder = if *anchored { builder.anchored(s) } else { builder.literal(s) };
        }
        let text = builder.build();

        let first = resolve(&text).expect("generated document resolves");
        let second = resolve(&text).expect("generated document resolves");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn split_paths_share_the_joined_root(
        name in "[a-z][a-z0-9_]{0,10}",
        prefix in "[a-z./_]{1,16}",
        splits in proptest::collection::btree_set("[a-z]{1,6}", 1..4),
    ) {
        let mut builder = DatasetDocBuilder::new(&name).prefix(&prefix);
        for split in &splits {
            builder = builder.split(split, &format!("{split}2017"));
        }

        let cfg = builder.resolve().expect("generated document resolves");
        let root = format!("{prefix}{name}");
        prop_assert_eq!(cfg["dataset"]["root"].as_str(), Some(root.as_str()));
        for split in &splits {
            let images = cfg.get(&format!("dataset.splits.{split}.images")).and_then(Value::as_str);
            let expected = format!("{root}/{split}2017");
            prop_assert_eq!(images, Some(expected.as_str()));
        }
    }
}
