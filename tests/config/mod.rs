use std::path::PathBuf;

use geoacl::config::Config;

pub fn write_config_to_file(config: &Config, name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    let json = serde_json::to_string(&config).unwrap();
    std::fs::write(&path, json).unwrap();

    assert_eq!(Config::from_file(path.to_str().unwrap()).unwrap(), *config);
    path
}
