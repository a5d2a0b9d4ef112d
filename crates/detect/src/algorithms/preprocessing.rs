use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{
    color::{Hsv, HsvFilter},
    error::{DetectError, Result},
    traits::{ColorSegmenter, ImagePreprocessor},
};

/// Sigma matching an automatically sized 3x3 Gaussian kernel
pub const DEFAULT_BLUR_SIGMA: f32 = 0.8;

/// Inclusive HSV in-range thresholding
#[derive(Debug, Clone, Default)]
pub struct HsvRangeSegmenter;

impl ColorSegmenter for HsvRangeSegmenter {
    fn segment(&self, frame: &RgbImage, filter: &HsvFilter) -> Result<GrayImage> {
        Ok(GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            if filter.contains(Hsv::from_rgb(frame.get_pixel(x, y))) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        }))
    }
}

/// Order of erode/dilate passes applied to a mask.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MorphologyOrder {
    /// erode, erode, dilate, dilate: removes specks only
    Open,
    /// erode, dilate, dilate, erode: removes specks, then closes small holes
    #[default]
    OpenClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MorphStep {
    Erode,
    Dilate,
}

impl MorphologyOrder {
    fn steps(self) -> [MorphStep; 4] {
        use MorphStep::*;
        match self {
            Self::Open => [Erode, Erode, Dilate, Dilate],
            Self::OpenClose => [Erode, Dilate, Dilate, Erode],
        }
    }
}

/// Erode/dilate with a square structuring element of side `2 * kernel_radius + 1`
#[derive(Debug, Clone)]
pub struct MorphologyPreprocessor {
    pub order: MorphologyOrder,
    pub kernel_radius: u8,
}

impl Default for MorphologyPreprocessor {
    fn default() -> Self {
        Self {
            order: MorphologyOrder::OpenClose,
            kernel_radius: 1,
        }
    }
}

impl ImagePreprocessor for MorphologyPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let mut mask = image.clone();
        for step in self.order.steps() {
            mask = match step {
                MorphStep::Erode => imageproc::morphology::erode(&mask, Norm::LInf, self.kernel_radius),
                MorphStep::Dilate => imageproc::morphology::dilate(&mask, Norm::LInf, self.kernel_radius),
            };
        }
        Ok(mask)
    }

    fn name(&self) -> &'static str {
        "morphology"
    }
}

/// Gaussian blur preprocessor for noise reduction
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: DEFAULT_BLUR_SIGMA }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if !(self.sigma > 0.0) {
            return Err(DetectError::ImageProcessing(format!(
                "blur sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }

    fn name(&self) -> &'static str {
        "gaussian_blur"
    }
}

/// Canny edge detection; the output marks edge pixels with 255
#[derive(Debug, Clone)]
pub struct CannyEdgePreprocessor {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyEdgePreprocessor {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 100.0,
        }
    }
}

impl ImagePreprocessor for CannyEdgePreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if self.low_threshold > self.high_threshold {
            return Err(DetectError::ImageProcessing(format!(
                "canny low threshold {} exceeds high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(imageproc::edges::canny(image, self.low_threshold, self.high_threshold))
    }

    fn name(&self) -> &'static str {
        "canny"
    }
}
