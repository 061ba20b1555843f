use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};
use ndarray::ArrayView3;

use crate::pipelines::PipelineError;

/// Container formats [`PixelImage::to_bytes`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    #[default]
    Png,
}

/// An 8-bit RGB raster derived from a finished sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage(RgbImage);

impl PixelImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_rgb(self) -> RgbImage {
        self.0
    }

    pub fn to_bytes(&self, format: OutputFormat) -> Result<Vec<u8>, PipelineError> {
        let mut buf = Vec::new();
        match format {
            OutputFormat::Png => PngEncoder::new(&mut buf).write_image(
                self.0.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgb8,
            )?,
        }
        Ok(buf)
    }
}

/// Min/max-normalizes a `(height, width, 3)` sample into an RGB8 image.
///
/// A constant sample has no range to normalize over and maps to black.
pub fn encode(sample: ArrayView3<'_, f32>) -> Result<PixelImage, PipelineError> {
    let (height, width, channels) = sample.dim();
    if channels != 3 {
        return Err(PipelineError::ShapeMismatch {
            expected: "(height, width, 3)".to_owned(),
            actual: format!("{:?}", sample.shape()),
        });
    }

    // f64 so that the span of two finite f32 extremes cannot overflow
    let (min, max) = sample
        .iter()
        .map(|&x| f64::from(x))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    let range = max - min;

    // iter() walks the logical (row, column, channel) order, which is the raw RGB layout
    let pixels: Vec<u8> = sample
        .iter()
        .map(|&x| {
            let normalized = if range > 0. {
                (f64::from(x) - min) / range
            } else {
                0.
            };
            (normalized * 255.).clamp(0., 255.) as u8
        })
        .collect();

    let width = u32::try_from(width).map_err(|_| shape_too_large(sample))?;
    let height = u32::try_from(height).map_err(|_| shape_too_large(sample))?;
    RgbImage::from_raw(width, height, pixels)
        .map(PixelImage)
        .ok_or_else(|| shape_too_large(sample))
}

fn shape_too_large(sample: ArrayView3<'_, f32>) -> PipelineError {
    PipelineError::ShapeMismatch {
        expected: "dimensions that fit a 32-bit raster".to_owned(),
        actual: format!("{:?}", sample.shape()),
    }
}

#[cfg(test)]
mod test {
    use ndarray::{Array3, Axis};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn constant_sample_encodes_to_black() {
        let image = encode(Array3::<f32>::zeros((4, 6, 3)).view()).unwrap();
        assert_eq!((image.width(), image.height()), (6, 4));
        assert!(image.as_rgb().as_raw().iter().all(|&c| c == 0));

        let image = encode(Array3::<f32>::from_elem((2, 2, 3), -3.5).view()).unwrap();
        assert!(image.as_rgb().as_raw().iter().all(|&c| c == 0));
    }

    #[test]
    fn rescales_to_full_range_and_truncates() {
        let mut sample = Array3::<f32>::zeros((1, 2, 3));
        sample.index_axis_mut(Axis(1), 0).assign(&ndarray::arr1(&[-1.0, 0.0, 0.5]));
        sample.index_axis_mut(Axis(1), 1).assign(&ndarray::arr1(&[1.0, -1.0, 0.0]));

        let image = encode(sample.view()).unwrap();
        assert_eq!(image.as_rgb().as_raw(), &vec![0, 127, 191, 255, 0, 127]);
        assert_eq!(image.as_rgb().get_pixel(1, 0).0, [255, 0, 127]);
    }

    #[test]
    fn extreme_finite_values_span_full_range() {
        let sample = ndarray::arr3(&[[[f32::MAX, -f32::MAX, 0.0]]]);
        let image = encode(sample.view()).unwrap();
        assert_eq!(image.into_rgb().into_raw(), vec![255, 0, 127]);
    }

    #[test]
    fn does_not_mutate_input() {
        let sample =
            Array3::<f32>::from_shape_fn((3, 3, 3), |(y, x, c)| (y * 9 + x * 3 + c) as f32);
        let before = sample.clone();
        let _ = encode(sample.view()).unwrap();
        assert_eq!(sample, before);
    }

    #[test]
    fn rejects_non_rgb_samples() {
        let result = encode(Array3::<f32>::zeros((2, 2, 4)).view());
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn png_bytes_decode_to_same_raster() {
        let sample = Array3::<f32>::from_shape_fn((5, 7, 3), |(y, x, c)| (y + x * c) as f32);
        let image = encode(sample.view()).unwrap();

        let bytes = image.to_bytes(OutputFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .unwrap()
            .to_rgb8();
        assert_eq!(&decoded, image.as_rgb());
    }
}
