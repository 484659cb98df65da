//! Device conditions a job waits on before activation.

use std::fs;
use std::path::{Path, PathBuf};

pub trait DeviceConditions: Send + Sync {
    fn is_charging(&self) -> bool;
}

/// Treats the device as permanently on external power.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCharging;

impl DeviceConditions for AlwaysCharging {
    fn is_charging(&self) -> bool {
        true
    }
}

/// Linux power supply class under sysfs.
///
/// Charging when any `Mains` or `USB` supply reports `online=1`. A machine
/// without any battery counts as charging.
#[derive(Debug, Clone)]
pub struct SysfsPower {
    root: PathBuf,
}

impl Default for SysfsPower {
    fn default() -> Self {
        Self::new("/sys/class/power_supply")
    }
}

impl SysfsPower {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

impl DeviceConditions for SysfsPower {
    fn is_charging(&self) -> bool {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), "power supply dir unreadable: {}", e);
                return true;
            }
        };
        let mut has_battery = false;
        for entry in entries.flatten() {
            let dir = entry.path();
            match read_trimmed(&dir.join("type")).as_deref() {
                Some("Mains") | Some("USB") => {
                    if read_trimmed(&dir.join("online")).as_deref() == Some("1") {
                        return true;
                    }
                }
                Some("Battery") => has_battery = true,
                _ => {}
            }
        }
        !has_battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(root: &Path, name: &str, kind: &str, online: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{kind}\n")).unwrap();
        if let Some(v) = online {
            fs::write(dir.join("online"), format!("{v}\n")).unwrap();
        }
    }

    #[test]
    fn no_battery_counts_as_charging() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SysfsPower::new(dir.path()).is_charging());
        assert!(SysfsPower::new(dir.path().join("missing")).is_charging());
    }

    #[test]
    fn battery_with_offline_adapter_is_not_charging() {
        let dir = tempfile::tempdir().unwrap();
        supply(dir.path(), "BAT0", "Battery", None);
        supply(dir.path(), "AC", "Mains", Some("0"));
        assert!(!SysfsPower::new(dir.path()).is_charging());
    }

    #[test]
    fn online_adapter_is_charging() {
        let dir = tempfile::tempdir().unwrap();
        supply(dir.path(), "BAT0", "Battery", None);
        supply(dir.path(), "usb0", "USB", Some("1"));
        assert!(SysfsPower::new(dir.path()).is_charging());
    }
}
