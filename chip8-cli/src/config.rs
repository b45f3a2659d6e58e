//! Application configuration
use std::{env, fs, path::PathBuf};

use chip8::{prelude::Chip8Conf, KeyCode};
use serde::Deserialize;

use crate::{error::AppResult, theme::Theme};

/// Environment variable holding the path to a configuration file.
pub const CONFIG_ENV: &str = "CHIP8_CONFIG";

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "chip8.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConf {
    pub vm: Chip8Conf,
    pub theme: Theme,
    /// Stop running after this many cycles.
    pub max_cycles: Option<usize>,
    /// Key presses replayed while the program runs.
    pub keys: Vec<KeyEvent>,
    /// Cycles at which the display switches to the next theme.
    pub theme_changes: Vec<usize>,
    /// Draw the display with ANSI colors.
    pub color: bool,
}

/// A scripted change of key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KeyEvent {
    /// Cycle at which the key changes state.
    pub cycle: usize,
    pub key: KeyCode,
    #[serde(default = "pressed_default")]
    pub pressed: bool,
}

fn pressed_default() -> bool {
    true
}

impl AppConf {
    /// Load the configuration file, falling back to defaults when there is none.
    pub fn load() -> AppResult<Self> {
        match Self::find_file() {
            Some(filepath) => {
                log::debug!("loading configuration from {}", filepath.display());
                let source = fs::read_to_string(&filepath)?;
                Self::from_yaml(&source)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(source: &str) -> AppResult<Self> {
        let mut conf: AppConf = serde_yaml::from_str(source)?;
        conf.keys.sort_by_key(|event| event.cycle);
        conf.theme_changes.sort_unstable();
        Ok(conf)
    }

    fn find_file() -> Option<PathBuf> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                path.is_file().then_some(path)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use chip8::Hz;

    use super::*;

    #[test]
    fn test_empty_config() {
        let conf = AppConf::from_yaml("{}").unwrap();
        assert_eq!(conf.theme, Theme::Default);
        assert_eq!(conf.max_cycles, None);
        assert!(conf.keys.is_empty());
        assert!(conf.theme_changes.is_empty());
        assert!(!conf.color);
        assert!(conf.vm.seed.is_none());
    }

    #[test]
    fn test_full_config() {
        let conf = AppConf::from_yaml(
            r#"
vm:
  clock_frequency: 500
  seed: 42
theme: spooky
max_cycles: 1000
color: true
theme_changes: [300, 100]
keys:
  - { cycle: 20, key: 5, pressed: false }
  - { cycle: 10, key: 5 }
"#,
        )
        .unwrap();

        assert_eq!(conf.vm.clock_frequency, Some(Hz(500)));
        assert_eq!(conf.vm.seed, Some(42));
        assert_eq!(conf.theme, Theme::Spooky);
        assert_eq!(conf.max_cycles, Some(1000));
        assert!(conf.color);
        assert_eq!(conf.theme_changes, vec![100, 300]);

        // sorted by cycle
        assert_eq!(
            conf.keys,
            vec![
                KeyEvent {
                    cycle: 10,
                    key: KeyCode::Key5,
                    pressed: true
                },
                KeyEvent {
                    cycle: 20,
                    key: KeyCode::Key5,
                    pressed: false
                },
            ]
        );
    }

    #[test]
    fn test_invalid_key() {
        let result = AppConf::from_yaml("keys: [{ cycle: 0, key: 16 }]");
        assert!(result.is_err());
    }
}
