//! Search-path filesystem backed by the host OS.

use std::path::{Path, PathBuf};

use crate::runtime::{File, FileSystem, Image};
use crate::types::{TextureDesc, TextureFormat, TextureRegion};

/// Looks files up in an ordered list of directories. The most recently added directory is
/// searched first.
#[derive(Debug, Default, Clone)]
pub struct OsFileSystem {
    paths: Vec<PathBuf>,
}

impl OsFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one or more directories separated by `;`. Empty segments are ignored.
    pub fn add_path(&mut self, paths: &str) {
        for path in paths.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            tracing::debug!(path, "adding search path");
            self.paths.insert(0, PathBuf::from(path));
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_absolute() {
            return direct.is_file().then(|| direct.to_path_buf());
        }
        self.paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl FileSystem for OsFileSystem {
    fn find_file(&self, name: &str) -> Option<Box<dyn File>> {
        match self.locate(name) {
            Some(path) => Some(Box::new(DiskFile {
                display: path.to_string_lossy().into_owned(),
                path,
            })),
            None => {
                tracing::debug!(name, "file not found in any search path");
                None
            }
        }
    }
}

struct DiskFile {
    path: PathBuf,
    display: String,
}

impl File for DiskFile {
    fn path(&self) -> &str {
        &self.display
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn open_image(&self) -> Option<Box<dyn Image>> {
        let decoded = image::ImageReader::open(&self.path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());
        match decoded {
            Ok(decoded) => Some(Box::new(RgbaImage::new(decoded.to_rgba8()))),
            Err(err) => {
                tracing::warn!(path = %self.display, %err, "failed to decode image");
                None
            }
        }
    }
}

/// A decoded image held as 8-bit RGBA.
pub struct RgbaImage {
    pixels: image::RgbaImage,
}

impl RgbaImage {
    pub fn new(pixels: image::RgbaImage) -> Self {
        Self { pixels }
    }
}

impl Image for RgbaImage {
    fn desc(&self) -> TextureDesc {
        TextureDesc::new_2d(self.pixels.width(), self.pixels.height(), TextureFormat::Rgba8)
    }

    fn copy_region(&self, region: &TextureRegion) -> Option<Vec<u8>> {
        copy_rgba_region(self.pixels.as_raw(), self.pixels.width(), self.pixels.height(), region)
    }
}

/// Cuts `region` out of a tightly packed RGBA8 buffer of `width` x `height`.
pub(crate) fn copy_rgba_region(pixels: &[u8], width: u32, height: u32, region: &TextureRegion) -> Option<Vec<u8>> {
    let [x, y, _] = region.origin;
    if x >= width || y >= height {
        return None;
    }
    let w = match region.desc.width {
        0 => width - x,
        w if x + w <= width => w,
        _ => return None,
    };
    let h = match region.desc.height {
        0 => height - y,
        h if y + h <= height => h,
        _ => return None,
    };

    let stride = width as usize * 4;
    let mut out = Vec::with_capacity(w as usize * h as usize * 4);
    for row in y..y + h {
        let start = row as usize * stride + x as usize * 4;
        out.extend_from_slice(pixels.get(start..start + w as usize * 4)?);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn region(x: u32, y: u32, w: u32, h: u32) -> TextureRegion {
        TextureRegion {
            desc: TextureDesc::new_2d(w, h, TextureFormat::Rgba8),
            origin: [x, y, 0],
        }
    }

    #[test]
    fn copies_sub_rectangle() {
        // 3x2 image, each texel tagged with its index.
        let pixels: Vec<u8> = (0..6u8).flat_map(|i| [i; 4]).collect();
        let out = copy_rgba_region(&pixels, 3, 2, &region(1, 0, 2, 2)).unwrap();
        assert_eq!(out, [[1u8; 4], [2; 4], [4; 4], [5; 4]].concat());
    }

    #[test]
    fn zero_extent_runs_to_the_edge() {
        let pixels: Vec<u8> = (0..6u8).flat_map(|i| [i; 4]).collect();
        let out = copy_rgba_region(&pixels, 3, 2, &region(2, 1, 0, 0)).unwrap();
        assert_eq!(out, vec![5u8; 4]);
    }

    #[test]
    fn out_of_bounds_region_is_rejected() {
        let pixels = vec![0u8; 16];
        assert!(copy_rgba_region(&pixels, 2, 2, &region(2, 0, 1, 1)).is_none());
        assert!(copy_rgba_region(&pixels, 2, 2, &region(1, 1, 2, 1)).is_none());
    }

    #[test]
    fn most_recent_path_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("a.fx"), b"first").unwrap();
        std::fs::write(second.path().join("a.fx"), b"second").unwrap();

        let mut fs = OsFileSystem::new();
        fs.add_path(&format!("{};", first.path().display()));
        fs.add_path(&second.path().display().to_string());

        let file = fs.find_file("a.fx").unwrap();
        assert_eq!(file.read().unwrap(), b"second");
        assert!(fs.find_file("missing.fx").is_none());
    }

    #[test]
    fn non_image_file_does_not_open_as_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.png"), b"plain text").unwrap();
        let mut fs = OsFileSystem::new();
        fs.add_path(&dir.path().display().to_string());
        assert!(fs.find_file("notes.png").unwrap().open_image().is_none());
    }
}
