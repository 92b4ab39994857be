use authgate::config::{Settings, DEFAULT_SERVER_URL};

#[test]
fn settings_round_trip_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let settings = Settings {
        server_url: "https://auth.example.com".to_string(),
    };
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.server_url, "https://auth.example.com");
}

#[test]
fn missing_settings_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.json");

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.server_url, DEFAULT_SERVER_URL);
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config").join("settings.json");

    Settings::default().save_to(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn malformed_settings_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(Settings::load_from(&path).is_err());
}
