use image::{GrayImage, RgbImage};
use crate::{
    color::HsvFilter,
    error::Result,
    types::{ContourHierarchy, DetectedObject},
};

/// Trait for turning a colour frame into a binary mask
pub trait ColorSegmenter: Send + Sync {
    /// Mark pixels accepted by `filter` with 255, everything else with 0
    fn segment(&self, frame: &RgbImage, filter: &HsvFilter) -> Result<GrayImage>;
}

/// Trait for mask preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the mask (e.g. morphology, blur, edge detection)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;

    /// Short name used in logs and pipeline summaries
    fn name(&self) -> &'static str;
}

/// Trait for contour hierarchy extraction
pub trait HierarchyExtractor: Send + Sync {
    /// Extract the linked contour arena of a binary image
    fn extract_hierarchy(&self, image: &GrayImage) -> Result<ContourHierarchy>;
}

/// Trait for reducing a hierarchy to detected objects
pub trait ObjectReducer: Send + Sync {
    fn reduce(&self, hierarchy: &ContourHierarchy) -> Result<Vec<DetectedObject>>;
}
