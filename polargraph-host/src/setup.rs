//! Machine setup loading
//!
//! `.toml` files are read with serde; anything else is treated as the
//! line-oriented `label:value` format.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use polargraph_core::config::read_setup;
use polargraph_core::MachineSetup;

/// Load the machine setup from a file
pub fn load_setup(path: &Path) -> Result<MachineSetup> {
    if path.extension().is_some_and(|ext| ext == "toml") {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return parse_toml_setup(&text)
            .with_context(|| format!("invalid TOML in {}", path.display()));
    }

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_setup(BufReader::new(file))
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

/// Parse a TOML setup document
pub fn parse_toml_setup(text: &str) -> Result<MachineSetup, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toml_setup() {
        let text = "width = 500.0\n\
                    spool_radius = 5.0\n\
                    steps_per_revolution = 200.0\n\
                    initial_x = 250.0\n\
                    initial_y = 300.0\n";
        let setup = parse_toml_setup(text).unwrap();
        assert_eq!(setup.width, 500.0);
        assert_eq!(setup.initial_y, 300.0);
    }

    #[test]
    fn test_toml_missing_key() {
        assert!(parse_toml_setup("width = 500.0\n").is_err());
    }

    #[test]
    fn test_load_label_value_file() {
        let name = format!("polargraph-setup-{}.txt", std::process::id());
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "width:100\nspool radius:1\nsteps per rev:200\nx:50\ny:0").unwrap();
        drop(file);

        let setup = load_setup(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(setup.width, 100.0);
        assert_eq!(setup.initial_x, 50.0);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_setup(Path::new("/nonexistent/polargraph.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/polargraph.txt"));
    }
}
