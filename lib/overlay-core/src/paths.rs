use std::path::{Path, PathBuf};

const APP_DIR: &str = "OverlayWM";

fn app_dir(base: Option<PathBuf>) -> Option<PathBuf> {
    base.map(|dir| dir.join(APP_DIR))
}

/// Default location of `config.yaml`. Not created until the config is saved.
pub fn default_config_path() -> Option<PathBuf> {
    app_dir(dirs::config_dir()).map(|dir| dir.join("config.yaml"))
}

/// Path of the run log, creating its directory. `None` when there is no
/// local data directory or it cannot be created.
pub fn log_file_path() -> Option<PathBuf> {
    log_file_in(&app_dir(dirs::data_local_dir())?)
}

fn log_file_in(dir: &Path) -> Option<PathBuf> {
    std::fs::create_dir_all(dir).ok()?;
    Some(dir.join("overlay.log"))
}
