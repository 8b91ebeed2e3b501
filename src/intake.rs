use anyhow::{bail, Context};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::model::{FileKind, ImageRef, ImageSource};

const PLAN_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "pdf"];
const PHOTO_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp", "bmp"];

// US Letter at 72 dpi, the size a PDF placeholder page is drawn at.
const PLACEHOLDER_PAGE: (u32, u32) = (612, 792);

pub fn file_kind(name: &str) -> Option<FileKind> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpeg" | "jpg" => Some(FileKind::Jpeg),
        "png" => Some(FileKind::Png),
        "gif" => Some(FileKind::Gif),
        "pdf" => Some(FileKind::Pdf),
        _ => None,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("floor plan")
        .to_owned()
}

/// Image reference and display name for a floor plan on disk.
pub fn from_path(path: &Path) -> anyhow::Result<(ImageRef, String)> {
    let name = display_name(path);
    let Some(kind) = file_kind(&name) else {
        bail!("{name}: unsupported file type (expected JPEG, PNG, GIF or PDF)");
    };
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }
    let image = ImageRef {
        source: ImageSource::Path(path.to_path_buf()),
        kind,
    };
    Ok((image, name))
}

/// Picks the first dropped file with an accepted type. Files egui delivered
/// as bytes (web) are used directly, others by path.
pub fn from_dropped(files: &[egui::DroppedFile]) -> Option<(ImageRef, String)> {
    files.iter().find_map(|file| {
        let name = match (&file.path, file.name.is_empty()) {
            (Some(path), true) => display_name(path),
            _ => file.name.clone(),
        };
        let kind = file_kind(&name)?;
        let source = match (&file.bytes, &file.path) {
            (Some(bytes), _) => ImageSource::Bytes(bytes.clone()),
            (None, Some(path)) => ImageSource::Path(path.clone()),
            (None, None) => return None,
        };
        Some((ImageRef { source, kind }, name))
    })
}

/// Decodes the floor plan into pixels for display.
pub fn render(plan: &ImageRef) -> anyhow::Result<RgbaImage> {
    if plan.kind == FileKind::Pdf {
        log::warn!("PDF pages are not rasterized; showing a blank page instead");
        return Ok(placeholder_page());
    }
    let decoded = match &plan.source {
        ImageSource::Path(path) => {
            image::open(path).with_context(|| format!("decoding {}", path.display()))?
        }
        ImageSource::Bytes(bytes) => {
            image::load_from_memory(bytes).context("decoding dropped image")?
        }
    };
    Ok(decoded.to_rgba8())
}

/// Downscaled copy of `pixels` whose longer side is at most `max_side`, or
/// `None` when it already fits. The aspect ratio is kept, so marker
/// percentages mean the same thing on the copy.
pub fn fit_within(pixels: &RgbaImage, max_side: usize) -> Option<RgbaImage> {
    let (w, h) = pixels.dimensions();
    let longest = w.max(h) as usize;
    if longest <= max_side || max_side == 0 {
        return None;
    }
    let scale = max_side as f64 / longest as f64;
    let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_side as u32);
    let (new_w, new_h) = (fit(w), fit(h));
    log::info!("downscaling {w}x{h} floor plan to {new_w}x{new_h} for display");
    Some(imageops::resize(pixels, new_w, new_h, FilterType::Triangle))
}

fn placeholder_page() -> RgbaImage {
    let (w, h) = PLACEHOLDER_PAGE;
    let border = Rgba([180, 180, 180, 255]);
    RgbaImage::from_fn(w, h, |x, y| {
        if x < 2 || y < 2 || x >= w - 2 || y >= h - 2 {
            border
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

pub fn pick_floor_plan() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open floor plan")
        .add_filter("Floor plans", PLAN_EXTENSIONS)
        .pick_file()
}

pub fn pick_photo() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Attach photo")
        .add_filter("Images", PHOTO_EXTENSIONS)
        .pick_file()
}

/// Percent-encoded `file:` URI for a local photo.
pub fn photo_uri(path: &Path) -> String {
    match url::Url::from_file_path(path) {
        Ok(uri) => uri.into(),
        Err(()) => {
            log::warn!("{} is not an absolute path", path.display());
            format!("file://{}", path.display())
        }
    }
}

/// What to hand the egui image loaders for an attachment. Their file loader
/// takes a plain path after `file://`, so encoded file URIs are decoded back.
pub fn photo_source(attachment: &str) -> String {
    match url::Url::parse(attachment) {
        Ok(uri) if uri.scheme() == "file" => match uri.to_file_path() {
            Ok(path) => format!("file://{}", path.display()),
            Err(()) => attachment.to_owned(),
        },
        _ => attachment.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(RgbaImage::new(w, h));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_accepted_kinds() {
        assert_eq!(file_kind("ground.PNG"), Some(FileKind::Png));
        assert_eq!(file_kind("a.jpg"), Some(FileKind::Jpeg));
        assert_eq!(file_kind("a.jpeg"), Some(FileKind::Jpeg));
        assert_eq!(file_kind("anim.gif"), Some(FileKind::Gif));
        assert_eq!(file_kind("plans/level-2.pdf"), Some(FileKind::Pdf));
        assert_eq!(file_kind("notes.txt"), None);
        assert_eq!(file_kind("no_extension"), None);
    }

    #[test]
    fn test_from_path_rejects_unsupported_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("plan.txt");
        std::fs::write(&txt, b"hello").unwrap();
        assert!(from_path(&txt).is_err());
        assert!(from_path(&dir.path().join("absent.png")).is_err());
    }

    #[test]
    fn test_from_path_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.png");
        std::fs::write(&path, png_bytes(8, 5)).unwrap();

        let (image, name) = from_path(&path).unwrap();
        assert_eq!(name, "office.png");
        assert_eq!(image.kind, FileKind::Png);

        let pixels = render(&image).unwrap();
        assert_eq!(pixels.dimensions(), (8, 5));
    }

    #[test]
    fn test_render_bytes() {
        let image = ImageRef {
            source: ImageSource::Bytes(Arc::from(png_bytes(3, 4))),
            kind: FileKind::Png,
        };
        assert_eq!(render(&image).unwrap().dimensions(), (3, 4));
    }

    #[test]
    fn test_render_garbage_fails() {
        let image = ImageRef {
            source: ImageSource::Bytes(Arc::from(&b"not an image"[..])),
            kind: FileKind::Jpeg,
        };
        assert!(render(&image).is_err());
    }

    #[test]
    fn test_pdf_renders_placeholder() {
        let image = ImageRef {
            source: ImageSource::Bytes(Arc::from(&b"%PDF-1.7"[..])),
            kind: FileKind::Pdf,
        };
        assert_eq!(render(&image).unwrap().dimensions(), PLACEHOLDER_PAGE);
    }

    #[test]
    fn test_oversized_plan_is_downscaled() {
        let wide = RgbaImage::new(4096, 1024);
        let fitted = fit_within(&wide, 2048).unwrap();
        assert_eq!(fitted.dimensions(), (2048, 512));

        let sliver = RgbaImage::new(2049, 10);
        let fitted = fit_within(&sliver, 2048).unwrap();
        assert_eq!(fitted.width(), 2048);
        assert!(fitted.height() >= 1 && fitted.height() <= 10);

        assert!(fit_within(&RgbaImage::new(2048, 2048), 2048).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_photo_uri_is_encoded_and_loadable() {
        let uri = photo_uri(Path::new("/tmp/site photos/hall #2.jpg"));
        assert_eq!(uri, "file:///tmp/site%20photos/hall%20%232.jpg");
        assert_eq!(photo_source(&uri), "file:///tmp/site photos/hall #2.jpg");
    }

    #[test]
    fn test_remote_photo_source_passes_through() {
        let url = "https://example.com/photos/a%20b.jpg";
        assert_eq!(photo_source(url), url);
        assert_eq!(photo_source("not a uri"), "not a uri");
    }

    #[test]
    fn test_first_accepted_drop_wins() {
        let files = vec![
            egui::DroppedFile {
                name: "readme.md".into(),
                bytes: Some(Arc::from(&b"# hi"[..])),
                ..Default::default()
            },
            egui::DroppedFile {
                path: Some(PathBuf::from("/plans/first.png")),
                ..Default::default()
            },
            egui::DroppedFile {
                path: Some(PathBuf::from("/plans/second.jpg")),
                ..Default::default()
            },
        ];
        let (image, name) = from_dropped(&files).unwrap();
        assert_eq!(name, "first.png");
        assert!(matches!(image.source, ImageSource::Path(ref p) if p.ends_with("first.png")));
        assert!(from_dropped(&files[..1]).is_none());
    }
}
