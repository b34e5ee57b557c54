use adaptable_notify::Settings;
use std::env;
use tempfile::TempDir;

// One test only: it changes the working directory and process environment.
#[test]
fn test_env_override_with_nested_keys() {
    let temp_dir = TempDir::new().unwrap();
    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(&temp_dir).unwrap();

    std::fs::create_dir_all(".adaptable").unwrap();
    std::fs::write(
        ".adaptable/settings.toml",
        "[watch]\ndebounce_ms = 75\ntick_ms = 5\n",
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("ADAPTABLE_WATCH__DEBOUNCE_MS", "320");
        env::set_var("ADAPTABLE_LOGGING__DEFAULT", "debug");
    }

    let settings = Settings::load();

    unsafe {
        env::remove_var("ADAPTABLE_WATCH__DEBOUNCE_MS");
        env::remove_var("ADAPTABLE_LOGGING__DEFAULT");
    }
    env::set_current_dir(original_dir).unwrap();

    let settings = settings.unwrap();
    // Environment wins over the file, the file over the defaults
    assert_eq!(settings.watch.debounce_ms, 320);
    assert_eq!(settings.watch.tick_ms, 5);
    assert_eq!(settings.logging.default, "debug");
    assert!(settings.structure.root_patterns.contains(&"*.ear".to_string()));
}
