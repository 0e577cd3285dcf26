//! Environment overrides live in their own test binary: they mutate
//! process-wide state.

use std::env;
use std::fs;

use exprtree::config::{local_config_path, Settings, ENV_PREFIX};
use exprtree::DumpStyle;
use tempfile::TempDir;

#[test]
fn given_env_vars_when_load_then_override_local_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[dump]\nstyle = \"flat\"\nprecision = 4\n",
    )
    .unwrap();

    env::set_var("EXPRTREE_DUMP__STYLE", "tree");
    env::set_var("EXPRTREE_DUMP__PRECISION", "8");
    let settings = Settings::load_from(None, Some(dir.path()), ENV_PREFIX);
    env::remove_var("EXPRTREE_DUMP__STYLE");
    env::remove_var("EXPRTREE_DUMP__PRECISION");

    let settings = settings.expect("load settings");
    assert_eq!(settings.dump.style, DumpStyle::Tree);
    assert_eq!(settings.dump.precision, 8);
}
