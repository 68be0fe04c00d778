//! Files on disk and configs pointing at temporary directories

use format_shifter::config::{Config, OutputConfig, ToolsConfig};
use format_shifter::{DirectorySink, FileCollisionAction, FormatShifter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::fakes::TaggingCodec;

/// Scratch space holding picked inputs and written outputs
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn inputs(&self) -> PathBuf {
        self.dir.path().join("camera-roll")
    }

    pub fn outputs(&self) -> PathBuf {
        self.dir.path().join("exports")
    }

    /// Write an input file and return its path
    pub fn add_input(&self, name: &str, contents: &[u8]) -> PathBuf {
        std::fs::create_dir_all(self.inputs()).unwrap();
        let path = self.inputs().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Config writing to this workspace, with PATH search disabled
    pub fn config(&self) -> Config {
        Config {
            tools: ToolsConfig {
                magick_path: None,
                search_path: false,
                codec_timeout: None,
            },
            output: OutputConfig {
                output_dir: self.outputs(),
                app_folder: "FormatShifter".to_string(),
                file_collision: FileCollisionAction::Rename,
            },
            ..Default::default()
        }
    }

    /// Directory converted files land in
    pub fn target_dir(&self) -> PathBuf {
        self.outputs().join("FormatShifter")
    }

    /// Shifter with a tagging codec and a directory sink under this workspace
    pub fn shifter(&self, codec: Arc<TaggingCodec>) -> FormatShifter {
        let config = self.config();
        let sink = Arc::new(DirectorySink::from_config(&config.output));
        FormatShifter::with_components(config, codec, sink).unwrap()
    }
}

/// Sorted names of the files in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
