use std::path::{Path, PathBuf};

use glob::glob;
use log::{debug, log_enabled, Level};

use super::{Device, Error};

/// Finds and opens input event nodes matching a glob pattern.
#[derive(Debug, Clone)]
pub struct Registry {
    pattern: String,
}

impl Registry {
    pub const DEFAULT_PATTERN: &'static str = "/dev/input/event*";

    pub fn new() -> Self {
        Self::with_pattern(Self::DEFAULT_PATTERN)
    }

    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Registry {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Matching node paths, `event2` sorted before `event10`.
    pub fn paths(&self) -> Result<Vec<PathBuf>, Error> {
        let mut paths = glob(&self.pattern)?.collect::<Result<Vec<_>, _>>()?;
        paths.sort_by(|a, b| {
            a.parent()
                .cmp(&b.parent())
                .then_with(|| node_number(a).cmp(&node_number(b)))
                .then_with(|| a.cmp(b))
        });
        Ok(paths)
    }

    /// Opens every matching node.
    ///
    /// The first node that fails to open aborts discovery; handles opened up
    /// to that point are closed again and none are returned.
    pub fn discover(&self) -> Result<Vec<Device>, Error> {
        let mut devices = Vec::new();
        for path in self.paths()? {
            let dev = Device::open(&path)?;
            log_opened(&dev);
            devices.push(dev);
        }

        debug!("Discovered {} input devices matching {:?}", devices.len(), self.pattern);
        Ok(devices)
    }

    /// Opens every matching node and reports each outcome separately.
    pub fn discover_each(&self) -> Result<Vec<(PathBuf, Result<Device, Error>)>, Error> {
        let outcomes = self
            .paths()?
            .into_iter()
            .map(|path| {
                let dev = Device::open(&path);
                if let Ok(dev) = &dev {
                    log_opened(dev);
                }
                (path, dev)
            })
            .collect();
        Ok(outcomes)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens all `/dev/input/event*` nodes; see [`Registry::discover`].
pub fn discover() -> Result<Vec<Device>, Error> {
    Registry::new().discover()
}

fn node_number(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
    digits.parse().ok()
}

fn log_opened(dev: &Device) {
    if log_enabled!(Level::Debug) {
        match dev.name() {
            Ok(name) => debug!("Opened evdev input device {:?}: {:?}", dev.path(), name),
            Err(err) => debug!("Opened input device {:?} without a name: {}", dev.path(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_nodes(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    fn pattern(dir: &TempDir) -> String {
        format!("{}/event*", dir.path().display())
    }

    fn file_names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn natural_node_order() {
        let dir = fake_nodes(&["event10", "event2", "event0", "event1", "mouse0"]);
        let paths = Registry::with_pattern(pattern(&dir)).paths().unwrap();
        assert_eq!(file_names(paths), ["event0", "event1", "event2", "event10"]);
    }

    #[test]
    fn discover_opens_every_node() {
        let dir = fake_nodes(&["event3", "event1"]);
        let devices = Registry::with_pattern(pattern(&dir)).discover().unwrap();
        assert!(devices.iter().all(Device::is_open));
        assert_eq!(file_names(devices.iter().map(|d| d.path().to_path_buf())), ["event1", "event3"]);
    }

    #[test]
    fn discover_empty_pattern() {
        let dir = fake_nodes(&[]);
        assert!(Registry::with_pattern(pattern(&dir)).discover().unwrap().is_empty());
    }

    #[test]
    fn discover_is_all_or_nothing() {
        let dir = fake_nodes(&["event0", "event2"]);
        // A directory cannot be opened read-write
        fs::create_dir(dir.path().join("event1")).unwrap();

        match Registry::with_pattern(pattern(&dir)).discover() {
            Err(Error::OpenError(path, _)) => assert_eq!(path, dir.path().join("event1")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn discover_each_reports_per_node() {
        let dir = fake_nodes(&["event0", "event2"]);
        fs::create_dir(dir.path().join("event1")).unwrap();

        let outcomes = Registry::with_pattern(pattern(&dir)).discover_each().unwrap();
        let summary: Vec<(String, bool)> = outcomes
            .iter()
            .map(|(path, dev)| (file_names([path.clone()]).remove(0), dev.is_ok()))
            .collect();
        assert_eq!(
            summary,
            [
                ("event0".to_string(), true),
                ("event1".to_string(), false),
                ("event2".to_string(), true)
            ]
        );
    }

    #[test]
    fn invalid_pattern() {
        assert!(matches!(
            Registry::with_pattern("/dev/input/[event").paths(),
            Err(Error::PatternError(_))
        ));
    }

    #[test]
    fn default_pattern() {
        assert_eq!(Registry::default().pattern(), "/dev/input/event*");
    }
}
