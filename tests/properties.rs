use proptest::prelude::*;

use table_repair::{config::RepairConfig, search};

fn cell_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("1".to_string()),
        Just("2".to_string()),
        Just("12".to_string()),
        Just("Revenue".to_string()),
        Just("(40)".to_string()),
        Just("$1,200.0".to_string()),
        Just("Net income:".to_string()),
        "[a-c0-9]{1,3}",
    ]
}

fn table_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    (1usize..4, 1usize..4).prop_flat_map(|(rows, cols)| {
        proptest::collection::vec(proptest::collection::vec(cell_strategy(), cols), rows)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn identical_tables_are_perfect(table in table_strategy()) {
        let outcome = search::repair(&table, &table, &[], &RepairConfig::default());
        prop_assert_eq!(outcome.initial_score.score, 1.0);
        prop_assert!(outcome.operations.is_empty());
        prop_assert_eq!(outcome.repaired_rows(), table);
    }

    #[test]
    fn committed_scores_never_decrease(
        generated in table_strategy(),
        groundtruth in table_strategy(),
    ) {
        let outcome = search::repair(&generated, &groundtruth, &[], &RepairConfig::default());
        let mut previous = outcome.initial_score.score;
        prop_assert!(previous <= 1.0);
        for (idx, logged) in outcome.operations.iter().enumerate() {
            prop_assert!(logged.score <= 1.0);
            if idx == 0 {
                prop_assert!(logged.score >= previous);
            } else {
                prop_assert!(logged.score > previous);
            }
            previous = logged.score;
        }
        prop_assert_eq!(outcome.final_score.score, previous);
        prop_assert!(outcome.final_score.score <= 1.0);
        prop_assert!(outcome.final_score.exact_matches <= outcome.final_score.groundtruth_cells);
    }
}
