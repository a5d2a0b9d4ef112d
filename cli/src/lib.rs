use std::fs;
use std::path::{Path, PathBuf};

use detect::DetectError;
use image::RgbImage;
use thiserror::Error;

/// File extensions accepted as frames
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("No frames found in {0}")]
    NoFrames(String),
}

/// Ordered list of frame images, taken from files or directories.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSource {
    paths: Vec<PathBuf>,
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource {
    /// Files are kept in argument order; directories contribute their frames sorted by name
    pub fn from_paths<P: AsRef<Path>>(inputs: &[P]) -> Result<Self, CliError> {
        let mut paths = Vec::new();

        for input in inputs {
            let input = input.as_ref();
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file() && is_frame(path))
                    .collect();
                entries.sort();
                paths.extend(entries);
            } else {
                paths.push(input.to_path_buf());
            }
        }

        if paths.is_empty() {
            let names: Vec<String> = inputs.iter().map(|p| p.as_ref().display().to_string()).collect();
            return Err(CliError::NoFrames(names.join(", ")));
        }

        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Frame index, path and decoded image, lazily
    pub fn frames(&self) -> impl Iterator<Item = (u64, &Path, Result<RgbImage, CliError>)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(index, path)| (index as u64, path.as_path(), load_frame(path)))
    }
}

pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<RgbImage, CliError> {
    Ok(image::open(path)?.to_rgb8())
}

/// `<output_dir>/<frame stem>.<extension>`
pub fn output_path(output_dir: &Path, frame: &Path, extension: &str) -> PathBuf {
    let stem = frame
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    output_dir.join(format!("{}.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cnr_detect_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("Should create scratch dir");
        dir
    }

    #[test]
    fn test_directory_frames_are_sorted_and_filtered() {
        let dir = scratch_dir("sorted");
        for name in ["frame_002.png", "frame_001.png", "notes.txt", "frame_003.JPG"] {
            fs::write(dir.join(name), b"").expect("Should write file");
        }

        let source = FrameSource::from_paths(&[&dir]).expect("Should list frames");
        let names: Vec<String> = source
            .paths()
            .iter()
            .map(|p| p.file_name().expect("Should have name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["frame_001.png", "frame_002.png", "frame_003.JPG"]);

        fs::remove_dir_all(&dir).expect("Should clean up");
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        assert!(matches!(FrameSource::from_paths(&[&dir]), Err(CliError::NoFrames(_))));
        fs::remove_dir_all(&dir).expect("Should clean up");
    }

    #[test]
    fn test_frames_decode_lazily() {
        let dir = scratch_dir("decode");
        let good = dir.join("good.png");
        RgbImage::new(4, 3).save(&good).expect("Should save frame");
        let bad = dir.join("bad.png");
        fs::write(&bad, b"not a png").expect("Should write file");

        let source = FrameSource::from_paths(&[&good, &bad]).expect("Should list frames");
        let results: Vec<_> = source.frames().collect();
        assert_eq!(results[0].0, 0);
        assert_eq!(results[0].2.as_ref().expect("Should decode").dimensions(), (4, 3));
        assert!(results[1].2.is_err());

        fs::remove_dir_all(&dir).expect("Should clean up");
    }

    #[test]
    fn test_output_path_uses_frame_stem() {
        let path = output_path(Path::new("/tmp/out"), Path::new("/data/frame_007.png"), "geojson");
        assert_eq!(path, PathBuf::from("/tmp/out/frame_007.geojson"));
    }
}
