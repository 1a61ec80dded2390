use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::services::launcher::ProcessLauncher;

/// Lowercase application name to launch command.
#[derive(Debug, Clone)]
pub struct AppCatalog {
    commands: BTreeMap<String, String>,
}

impl Default for AppCatalog {
    fn default() -> Self {
        let builtin: &[(&str, &str)] = if cfg!(target_os = "windows") {
            &[
                ("microsoft edge", "\"C:/Program Files (x86)/Microsoft/Edge/Application/msedge.exe\""),
                ("notepad", "notepad"),
                ("calculator", "calc"),
                ("chrome", "cmd /C start chrome"),
                ("firefox", "cmd /C start firefox"),
                ("vs code", "code"),
            ]
        } else if cfg!(target_os = "macos") {
            &[
                ("microsoft edge", "open -a \"Microsoft Edge\""),
                ("notepad", "open -a TextEdit"),
                ("calculator", "open -a Calculator"),
                ("chrome", "open -a \"Google Chrome\""),
                ("firefox", "open -a Firefox"),
                ("vs code", "open -a \"Visual Studio Code\""),
            ]
        } else {
            &[
                ("microsoft edge", "microsoft-edge"),
                ("notepad", "gedit"),
                ("calculator", "gnome-calculator"),
                ("chrome", "google-chrome"),
                ("firefox", "firefox"),
                ("vs code", "code"),
            ]
        };
        Self::from_entries(builtin.iter().map(|(n, c)| (n.to_string(), c.to_string())))
    }
}

impl AppCatalog {
    pub fn empty() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut catalog = Self::empty();
        catalog.extend(entries);
        catalog
    }

    /// Adds or replaces entries.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, command) in entries {
            self.commands.insert(name.trim().to_lowercase(), command);
        }
    }

    pub fn command_for(&self, app_name: &str) -> Option<&str> {
        self.commands.get(&app_name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

pub struct AppLauncher {
    catalog: AppCatalog,
    launcher: Arc<dyn ProcessLauncher>,
}

impl AppLauncher {
    pub fn new(catalog: AppCatalog, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { catalog, launcher }
    }

    pub fn open(&self, app_name: &str) -> String {
        let app_name = app_name.trim();
        if app_name.is_empty() {
            return "Sorry, which application should I open?".to_string();
        }

        let Some(command) = self.catalog.command_for(app_name) else {
            warn!(
                "Application '{}' not found in the command map. Known: {}",
                app_name,
                self.catalog.names().collect::<Vec<_>>().join(", ")
            );
            return format!("Sorry, I don't know how to open {}.", app_name);
        };

        match self.launcher.launch(command) {
            Ok(()) => {
                info!("Opening {}...", app_name);
                format!("Opening {}...", app_name)
            }
            Err(e) => {
                warn!("An error occurred while trying to open {}: {}", app_name, e);
                format!("Sorry, I couldn't open {}: {}", app_name, e)
            }
        }
    }
}
