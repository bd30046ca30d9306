use approval_naming::config::{self, FailureMode, NamingConfig};
use approval_naming::prelude::*;
use approval_naming::scope;
use approval_naming_test_utils::ContextCheck;
use pretty_assertions::assert_eq;
use std::sync::Once;

fn configure() {
    static CONFIGURED: Once = Once::new();
    CONFIGURED.call_once(|| {
        config::set(
            NamingConfig::new()
                .with_failure_mode(FailureMode::BestEffort)
                .with_skip_prefix("config_overrides::support"),
        );
    });
}

mod support {
    use approval_naming::namer;

    pub fn approved_name() -> String {
        namer::current_name().unwrap()
    }
}

#[test]
fn helper_frames_are_skipped() {
    configure();
    assert_eq!(
        support::approved_name(),
        "config_overrides.helper_frames_are_skipped"
    );
}

#[test]
fn configured_mode_applies_to_environment_qualifiers() {
    configure();
    let _check = ContextCheck::new();
    let _os = namer::unique_for_os().unwrap();
    let _runtime = namer::unique_for_runtime().unwrap();
    assert_eq!(scope::depth(), 2);
    assert_eq!(config::current().failure_mode, FailureMode::BestEffort);
}
