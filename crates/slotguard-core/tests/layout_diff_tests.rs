#![allow(clippy::unwrap_used, clippy::expect_used)]

use slotguard_core::model::StorageSize;
use slotguard_core::{
    diff, is_compatible, resolve, CompatLevel, Layout, LayoutError, Severity, TypeDescriptor,
    Variable,
};

fn layout(vars: &[(&str, TypeDescriptor)]) -> Layout {
    vars.iter()
        .map(|(name, ty)| Variable::new(*name, ty.clone()))
        .collect()
}

fn severities(old: &Layout, new: &Layout) -> Vec<Severity> {
    diff(old, new)
        .unwrap()
        .findings()
        .iter()
        .map(|f| f.severity)
        .collect()
}

fn token_v1() -> Layout {
    layout(&[
        ("owner", TypeDescriptor::address()),
        ("paused", TypeDescriptor::boolean()),
        ("totalSupply", TypeDescriptor::uint(256)),
        (
            "balances",
            TypeDescriptor::mapping("address", TypeDescriptor::uint(256)),
        ),
        ("name", TypeDescriptor::string()),
    ])
}

#[test]
fn test_identical_layouts_are_all_ok() {
    let v1 = token_v1();
    let report = diff(&v1, &v1).unwrap();
    assert!(report.ok());
    assert_eq!(report.findings().len(), v1.len());
    assert!(report
        .findings()
        .iter()
        .all(|f| f.severity == Severity::Ok));
}

#[test]
fn test_tail_append_is_ok() {
    let v1 = token_v1();
    let mut v2 = v1.clone();
    v2.push(Variable::new("decimals", TypeDescriptor::uint(8)));
    v2.push(Variable::new(
        "allowances",
        TypeDescriptor::mapping(
            "address",
            TypeDescriptor::mapping("address", TypeDescriptor::uint(256)),
        ),
    ));

    let report = diff(&v1, &v2).unwrap();
    assert!(report.ok());
    assert_eq!(report.findings().len(), 7);
    let appended = &report.findings()[5];
    assert!(appended.old.is_none());
    assert_eq!(appended.explanation, "appended at slot 4, offset 0");
}

#[test]
fn test_removing_last_variable_is_unsafe_remove() {
    let v1 = token_v1();
    let v2: Layout = v1.iter().take(4).cloned().collect();
    let report = diff(&v1, &v2).unwrap();
    assert!(!report.ok());
    let last = report.findings().last().unwrap();
    assert_eq!(last.severity, Severity::UnsafeRemove);
    assert_eq!(last.name(), "name");
    assert!(last.new.is_none());
}

#[test]
fn test_empty_old_layout_everything_appended() {
    let report = diff(&Layout::default(), &token_v1()).unwrap();
    assert!(report.ok());
    assert_eq!(report.findings().len(), 5);
    assert!(report.findings().iter().all(|f| f.old.is_none()));
}

#[test]
fn test_empty_new_layout_everything_removed() {
    let report = diff(&token_v1(), &Layout::default()).unwrap();
    assert!(!report.ok());
    assert_eq!(report.count(Severity::UnsafeRemove), 5);
}

#[test]
fn test_both_empty_is_ok_with_no_findings() {
    let report = diff(&Layout::default(), &Layout::default()).unwrap();
    assert!(report.ok());
    assert!(report.findings().is_empty());
}

#[test]
fn test_insert_in_middle_shifts_later_variables() {
    let v1 = layout(&[
        ("a", TypeDescriptor::uint(256)),
        ("b", TypeDescriptor::uint(256)),
    ]);
    let v2 = layout(&[
        ("a", TypeDescriptor::uint(256)),
        ("inserted", TypeDescriptor::address()),
        ("b", TypeDescriptor::uint(256)),
    ]);
    // Positional matching: `b` is now compared against the inserted address,
    // and the relocated `b` lands on fresh storage past the old tail.
    assert_eq!(
        severities(&v1, &v2),
        vec![Severity::Ok, Severity::UnsafeTypeChange, Severity::Ok]
    );
}

#[test]
fn test_swap_with_same_types_is_ok() {
    let v1 = layout(&[
        ("a", TypeDescriptor::uint(256)),
        ("b", TypeDescriptor::uint(256)),
    ]);
    let v2 = layout(&[
        ("b", TypeDescriptor::uint(256)),
        ("a", TypeDescriptor::uint(256)),
    ]);
    let report = diff(&v1, &v2).unwrap();
    assert!(report.ok());
    assert_eq!(
        report.findings()[0].explanation,
        "renamed from `a` to `b`"
    );
}

#[test]
fn test_swap_with_different_types_is_not_ok() {
    let v1 = layout(&[
        ("a", TypeDescriptor::uint(256)),
        ("b", TypeDescriptor::address()),
    ]);
    let v2 = layout(&[
        ("b", TypeDescriptor::address()),
        ("a", TypeDescriptor::uint(256)),
    ]);
    let report = diff(&v1, &v2).unwrap();
    assert!(!report.ok());
    assert_eq!(report.findings()[0].severity, Severity::UnsafeTypeChange);
}

#[test]
fn test_same_width_reinterpretation_warns_but_passes() {
    let v1 = layout(&[("admin", TypeDescriptor::uint(160))]);
    let v2 = layout(&[("admin", TypeDescriptor::address())]);
    let report = diff(&v1, &v2).unwrap();
    assert!(report.ok());
    assert_eq!(report.findings()[0].severity, Severity::Warning);
    assert_eq!(report.warnings().count(), 1);
}

#[test]
fn test_width_change_is_type_change() {
    let v1 = layout(&[("cap", TypeDescriptor::uint(256))]);
    let v2 = layout(&[("cap", TypeDescriptor::uint(128))]);
    assert_eq!(severities(&v1, &v2), vec![Severity::UnsafeTypeChange]);
}

#[test]
fn test_shrinking_packed_neighbour_moves_follower() {
    let v1 = layout(&[
        ("a", TypeDescriptor::uint(128)),
        ("b", TypeDescriptor::uint(64)),
    ]);
    let v2 = layout(&[
        ("a", TypeDescriptor::uint(64)),
        ("b", TypeDescriptor::uint(64)),
    ]);
    assert_eq!(
        severities(&v1, &v2),
        vec![Severity::UnsafeTypeChange, Severity::UnsafeResize]
    );
}

#[test]
fn test_mapping_value_change_is_reported_on_mapping() {
    let v1 = layout(&[(
        "balances",
        TypeDescriptor::mapping("address", TypeDescriptor::uint(256)),
    )]);
    let v2 = layout(&[(
        "balances",
        TypeDescriptor::mapping("address", TypeDescriptor::boolean()),
    )]);
    let report = diff(&v1, &v2).unwrap();
    let finding = &report.findings()[0];
    assert_eq!(finding.severity, Severity::UnsafeTypeChange);
    assert!(finding.explanation.starts_with("mapping value"));
}

#[test]
fn test_struct_member_append_inside_variable_is_ok() {
    let old_pos = TypeDescriptor::structure(
        "Position",
        vec![
            Variable::new("owner", TypeDescriptor::address()),
            Variable::new("amount", TypeDescriptor::uint(256)),
        ],
    );
    let new_pos = TypeDescriptor::structure(
        "Position",
        vec![
            Variable::new("owner", TypeDescriptor::address()),
            Variable::new("amount", TypeDescriptor::uint(256)),
            Variable::new("openedAt", TypeDescriptor::uint(64)),
        ],
    );
    let v1 = layout(&[(
        "positions",
        TypeDescriptor::mapping("uint256", old_pos.clone()),
    )]);
    let v2 = layout(&[(
        "positions",
        TypeDescriptor::mapping("uint256", new_pos.clone()),
    )]);
    assert!(diff(&v1, &v2).unwrap().ok());

    // The same growth as the last top-level variable only extends the tail.
    let v1 = layout(&[("pos", old_pos.clone())]);
    let v2 = layout(&[("pos", new_pos.clone())]);
    assert!(diff(&v1, &v2).unwrap().ok());

    // Followed by another variable it pushes that variable into a new slot.
    let v1 = layout(&[("pos", old_pos), ("tail", TypeDescriptor::boolean())]);
    let v2 = layout(&[("pos", new_pos), ("tail", TypeDescriptor::boolean())]);
    assert_eq!(
        severities(&v1, &v2),
        vec![Severity::Ok, Severity::UnsafeResize]
    );
}

#[test]
fn test_slot_hints_follow_manual_layout() {
    let v1 = layout(&[("impl", TypeDescriptor::address())]);
    let mut v2 = v1.clone();
    v2.push(
        Variable::new("beacon", TypeDescriptor::address())
            .with_slot_hint(u64::from(u32::MAX), 0),
    );
    let resolved = resolve(&v2).unwrap();
    assert_eq!(resolved[1].position(), (u64::from(u32::MAX), 0));
    assert!(diff(&v1, &v2).unwrap().ok());
}

#[test]
fn test_malformed_layout_is_an_error_not_a_finding() {
    let mut broken = TypeDescriptor::enumeration("State", 1);
    broken.size = None;
    let v1 = layout(&[("state", TypeDescriptor::enumeration("State", 1))]);
    let v2 = layout(&[("state", broken)]);
    let err = diff(&v1, &v2).unwrap_err();
    assert!(matches!(err, LayoutError::MissingSize { .. }));
    assert_eq!(err.variable(), "state");
}

#[test]
fn test_dynamic_size_on_value_kind_is_malformed() {
    let mut ty = TypeDescriptor::uint(64);
    ty.size = Some(StorageSize::Dynamic);
    // Dynamic scalars take a whole slot, so this resolves.
    assert!(resolve(&layout(&[("n", TypeDescriptor::uint(64)), ("x", ty)])).is_ok());

    let mut contract = TypeDescriptor::contract("Token");
    contract.size = Some(StorageSize::Dynamic);
    let err = resolve(&layout(&[("token", contract)])).unwrap_err();
    assert!(matches!(err, LayoutError::UnexpectedDynamicSize { .. }));
}

#[test]
fn test_oracle_is_reflexive_for_nested_types() {
    let nested = TypeDescriptor::mapping(
        "address",
        TypeDescriptor::dynamic_array(TypeDescriptor::fixed_array(
            TypeDescriptor::structure(
                "Lot",
                vec![
                    Variable::new("qty", TypeDescriptor::uint(128)),
                    Variable::new("price", TypeDescriptor::uint(128)),
                ],
            ),
            4,
        )),
    );
    let verdict = is_compatible(&nested, &nested).unwrap();
    assert_eq!(verdict.level, CompatLevel::Compatible);
    assert!(verdict.reason.is_none());
}

#[test]
fn test_report_serializes_with_stable_severity_names() {
    let v1 = layout(&[("a", TypeDescriptor::uint(256))]);
    let report = diff(&v1, &Layout::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["findings"][0]["severity"], "UNSAFE_REMOVE");
    assert_eq!(json["findings"][0]["old"]["slot"], 0);
}
