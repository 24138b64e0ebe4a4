use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use gridglow_common::Rgba;
use image::{ImageFormat, RgbaImage};

use crate::pixels::PixelSurface;

/// Errors from exporting a [`PixelSurface`].
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl PixelSurface {
    /// Convert to an 8-bit image.
    ///
    /// With a `backdrop` every pixel is composited over that opaque color;
    /// without one the result keeps straight alpha.
    pub fn to_image(&self, backdrop: Option<Rgba>) -> RgbaImage {
        let width = self.width() as usize;
        RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let [r, g, b, a] = self.pixels[y as usize * width + x as usize];
            let rgba = match backdrop {
                Some(bg) => {
                    let [dr, dg, db, _] = bg.to_f32_array();
                    let inv = 1.0 - a;
                    [r + dr * inv, g + dg * inv, b + db * inv, 1.0]
                }
                None if a > 0.0 => [r / a, g / a, b / a, a],
                None => [0.0; 4],
            };
            image::Rgba(rgba.map(to_u8))
        })
    }

    /// PNG bytes of [`to_image`](Self::to_image).
    pub fn encode_png(&self, backdrop: Option<Rgba>) -> Result<Vec<u8>, RasterError> {
        let mut bytes = Cursor::new(Vec::new());
        self.to_image(backdrop).write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    /// Write [`to_image`](Self::to_image) to `path` as PNG.
    pub fn write_png(
        &self,
        path: impl AsRef<Path>,
        backdrop: Option<Rgba>,
    ) -> Result<(), RasterError> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.to_image(backdrop).write_to(&mut out, ImageFormat::Png)?;
        tracing::info!(
            path = %path.display(),
            width = self.width(),
            height = self.height(),
            "wrote snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use gridglow_common::Viewport;
    use gridglow_render::{Paint, Surface};

    fn half_red(w: u32, h: u32) -> PixelSurface {
        let mut s = PixelSurface::new(Viewport::new(w, h));
        s.fill_rect(
            Viewport::new(w, h).rect(),
            &Paint::Solid(Rgba::new(255, 0, 0, 0.5)),
        );
        s
    }

    #[test]
    fn straight_alpha_export() {
        let img = half_red(2, 2).to_image(None);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn empty_pixels_export_transparent() {
        let img = PixelSurface::new(Viewport::new(3, 1)).to_image(None);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn backdrop_flattens_to_opaque() {
        let bg = Rgba::opaque([0, 0, 255]);
        let mut s = half_red(4, 1);
        s.clear_rect(gridglow_common::Rect::new(2.0, 0.0, 2.0, 1.0));
        let img = s.to_image(Some(bg));
        assert_eq!(img.get_pixel(0, 0).0, [128, 0, 128, 255]);
        assert_eq!(img.get_pixel(3, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn png_round_trips_dimensions() {
        let mut s = PixelSurface::new(Viewport::new(17, 9));
        s.stroke_line(Vec2::ZERO, Vec2::new(16.0, 8.0), Rgba::opaque([1, 2, 3]), 1.0);
        let bytes = s.encode_png(None).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (17, 9));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn write_png_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        half_red(5, 5).write_png(&path, Some(Rgba::opaque([0, 0, 0]))).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 5);
    }

    #[test]
    fn write_png_into_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("frame.png");
        let err = half_red(1, 1).write_png(&path, None).unwrap_err();
        assert!(matches!(err, RasterError::Io(_)));
    }
}
