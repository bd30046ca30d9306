use approval_naming::prelude::*;
use approval_naming::sanitize::is_valid_file_name_char;
use approval_naming::{qualifier, scope};
use approval_naming_test_utils::ContextCheck;
use pretty_assertions::assert_eq;

#[test]
fn exits_before_namer_is_called() {
    let _check = ContextCheck::new();
    {
        let _machine = namer::unique_for_machine_name().unwrap();
    }
    assert_eq!(scope::depth(), 0);
}

#[test]
fn unique_for_runtime() {
    let _check = ContextCheck::new();
    let expected = qualifier::runtime(FailureMode::BestEffort).unwrap();
    let _runtime = namer::unique_for_runtime_with(FailureMode::BestEffort).unwrap();
    assert_eq!(
        namer::current_name().unwrap(),
        format!("additional_information.unique_for_runtime.{expected}")
    );
}

#[test]
fn without_extra_info() {
    let name = namer::current_name().unwrap();
    assert_eq!(name, "additional_information.without_extra_info");
}

#[test]
fn with_scenario_data() {
    let _check = ContextCheck::new();
    let _scenario = namer::for_scenario("scenarioname").unwrap();
    let name = namer::current_name().unwrap();
    assert_eq!(
        name,
        "additional_information.with_scenario_data.ForScenario.scenarioname"
    );
}

#[test]
fn with_scenario_data_scrubs_invalid_chars() {
    let _check = ContextCheck::new();
    let _scenario = namer::for_scenario("invalid/chars").unwrap();
    let name = namer::current_name().unwrap();
    assert_eq!(
        name,
        "additional_information.with_scenario_data_scrubs_invalid_chars.ForScenario.invalid_chars"
    );
}

fn with_multiple_part_scenario_data(a: &str, b: &str) {
    let _check = ContextCheck::new();
    let _scenario = namer::for_scenario_parts([a, b]).unwrap();
    let name = namer::current_name().unwrap();
    assert_eq!(
        name,
        "additional_information.with_multiple_part_scenario_data.ForScenario.foo.bar"
    );
}

#[test]
fn with_multiple_part_scenario_data_foo_bar() {
    with_multiple_part_scenario_data("foo", "bar");
}

#[test]
fn table_cases_report_the_test_function() {
    let _check = ContextCheck::new();
    let names: Vec<String> = ["small", "large"]
        .iter()
        .map(|size| {
            let _scenario = namer::for_scenario(size).unwrap();
            namer::current_name().unwrap()
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "additional_information.table_cases_report_the_test_function.ForScenario.small",
            "additional_information.table_cases_report_the_test_function.ForScenario.large",
        ]
    );
}

#[test]
fn test_multiple_names() {
    let _check = ContextCheck::new();
    let _outer = namer::for_scenario("scenario").unwrap();
    {
        let _inner = namer::for_scenario("machineName").unwrap();
        let name = namer::current_name().unwrap();
        assert_eq!(
            name,
            concat!(
                "additional_information.test_multiple_names",
                ".ForScenario.scenario.ForScenario.machineName"
            )
        );
    }
    assert_eq!(
        namer::current_name().unwrap(),
        "additional_information.test_multiple_names.ForScenario.scenario"
    );
}

#[test]
fn base_override_replaces_resolved_identity() {
    let _check = ContextCheck::new();
    let _base = namer::with_base_name("Legacy.Name").unwrap();
    let _user = namer::unique_for_user_name().unwrap();
    assert_eq!(
        namer::current_name().unwrap(),
        format!("Legacy.Name.{}", qualifier::user_name())
    );
}

#[test]
fn resolved_base_is_a_valid_file_name() {
    let name = namer::current_name().unwrap();
    assert!(name.chars().all(is_valid_file_name_char), "{name}");
    assert_eq!(name, "additional_information.resolved_base_is_a_valid_file_name");
}

#[test]
fn resolved_identity_is_structured() {
    let identity = approval_naming::resolve_base_identity().unwrap();
    assert_eq!(
        identity,
        BaseIdentity::new(
            vec!["additional_information".to_string()],
            "resolved_identity_is_structured"
        )
    );
}

mod nested_class_tests {
    use approval_naming::namer;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_nested_class() {
        let name = namer::current_name().unwrap();
        assert_eq!(
            name,
            "additional_information.nested_class_tests.with_nested_class"
        );
    }
}
