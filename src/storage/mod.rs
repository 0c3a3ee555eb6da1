use async_trait::async_trait;

use crate::AppSettings;

#[cfg(target_arch = "wasm32")]
mod browser_storage;
#[cfg(not(target_arch = "wasm32"))]
mod file_storage;

#[cfg(not(target_arch = "wasm32"))]
type AppStorage = file_storage::FileStorage;
#[cfg(target_arch = "wasm32")]
type AppStorage = browser_storage::IdbStorage;

#[async_trait(?Send)]
pub trait Storage {
    async fn save_settings(&self, settings: &AppSettings) -> anyhow::Result<()>;
    async fn load_settings(&self) -> anyhow::Result<Option<AppSettings>>;
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn get_storage() -> anyhow::Result<AppStorage> {
    use directories_next::ProjectDirs;
    use std::path::PathBuf;

    let base = if let Some(proj_dirs) = ProjectDirs::from("com", "N K", "mcpchat") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    };
    Ok(AppStorage::new(base))
}

#[cfg(target_arch = "wasm32")]
pub async fn get_storage() -> anyhow::Result<AppStorage> {
    AppStorage::new().await
}

/// Stored settings, or the defaults when nothing was saved or the store
/// is unreadable.
pub async fn load_or_default() -> AppSettings {
    use dioxus::logger::tracing::warn;

    let loaded: anyhow::Result<Option<AppSettings>> =
        async { get_storage().await?.load_settings().await }.await;
    match loaded {
        Ok(Some(settings)) => settings,
        Ok(None) => AppSettings::default(),
        Err(e) => {
            warn!("could not load settings: {e:#}");
            AppSettings::default()
        }
    }
}
