//! Tests for the operation table

use s3_backup::managers::backup::{operations, Action, Operation};
use s3_backup::services::ServiceKind;
use s3_backup::stores::StoreKind;
use std::collections::HashSet;

#[test]
fn test_every_combination_is_runnable() {
    let ops = operations();
    assert_eq!(ops.len(), Action::ALL.len() * ServiceKind::ALL.len() * StoreKind::ALL.len());

    let distinct: HashSet<Operation> = ops.iter().copied().collect();
    assert_eq!(distinct.len(), ops.len());

    for action in Action::ALL {
        for service in ServiceKind::ALL {
            for store in StoreKind::ALL {
                assert!(ops.contains(&Operation::new(action, service, store)));
            }
        }
    }
}

#[test]
fn test_operation_names() {
    let names: Vec<String> = operations()
        .iter()
        .filter(|op| op.service == ServiceKind::Postgres)
        .map(ToString::to_string)
        .collect();

    assert_eq!(
        names,
        vec![
            "backup postgres via object-store",
            "backup postgres via filesystem",
            "restore postgres via object-store",
            "restore postgres via filesystem",
        ]
    );
}
