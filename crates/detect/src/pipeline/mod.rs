pub mod builder;

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::{
    color::HsvFilter,
    config::DetectorConfig,
    error::Result,
    traits::{ColorSegmenter, HierarchyExtractor, ImagePreprocessor, ObjectReducer},
    types::{ContourHierarchy, DetectedObject},
};

/// Per-filter detection pipeline: segment, clean, extract, reduce.
pub struct Pipeline {
    segmenter: Box<dyn ColorSegmenter>,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    hierarchy_extractor: Box<dyn HierarchyExtractor>,
    reducer: Box<dyn ObjectReducer>,
}

/// Intermediate images of one pipeline run, for inspection.
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    /// Raw colour-filter output
    pub mask: GrayImage,
    /// Output of each preprocessor, in order
    pub stages: Vec<(&'static str, GrayImage)>,
    pub hierarchy: ContourHierarchy,
    pub objects: Vec<DetectedObject>,
}

impl PipelineTrace {
    /// Output of the named stage, if it ran
    pub fn stage(&self, name: &str) -> Option<&GrayImage> {
        self.stages.iter().find(|(n, _)| *n == name).map(|(_, img)| img)
    }

    /// Image the contours were extracted from
    pub fn final_image(&self) -> &GrayImage {
        self.stages.last().map(|(_, img)| img).unwrap_or(&self.mask)
    }
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Pipeline with the stages enabled in `config`
    pub fn from_config(config: &DetectorConfig) -> Self {
        builder::PipelineBuilder::from_config(config).build()
    }

    pub fn new(
        segmenter: Box<dyn ColorSegmenter>,
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        hierarchy_extractor: Box<dyn HierarchyExtractor>,
        reducer: Box<dyn ObjectReducer>,
    ) -> Self {
        Self {
            segmenter,
            preprocessors,
            hierarchy_extractor,
            reducer,
        }
    }

    /// Run one colour filter over a frame
    pub fn process(&self, frame: &RgbImage, filter: &HsvFilter) -> Result<Vec<DetectedObject>> {
        let mask = self.segmenter.segment(frame, filter)?;
        self.process_mask(&mask)
    }

    /// Run everything after colour segmentation on an existing mask
    pub fn process_mask(&self, mask: &GrayImage) -> Result<Vec<DetectedObject>> {
        let mut processed = mask.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }

        let hierarchy = self.hierarchy_extractor.extract_hierarchy(&processed)?;
        debug!(contours = hierarchy.len(), "extracted contour hierarchy");
        self.reducer.reduce(&hierarchy)
    }

    /// Same as [`Pipeline::process`] but keeps every intermediate image
    pub fn process_traced(&self, frame: &RgbImage, filter: &HsvFilter) -> Result<PipelineTrace> {
        let mask = self.segmenter.segment(frame, filter)?;

        let mut stages: Vec<(&'static str, GrayImage)> = Vec::with_capacity(self.preprocessors.len());
        for preprocessor in &self.preprocessors {
            let input = stages.last().map(|(_, img)| img).unwrap_or(&mask);
            let output = preprocessor.preprocess(input)?;
            stages.push((preprocessor.name(), output));
        }

        let source = stages.last().map(|(_, img)| img).unwrap_or(&mask);
        let hierarchy = self.hierarchy_extractor.extract_hierarchy(source)?;
        let objects = self.reducer.reduce(&hierarchy)?;

        Ok(PipelineTrace {
            mask,
            stages,
            hierarchy,
            objects,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let names: Vec<&str> = self.preprocessors.iter().map(|p| p.name()).collect();
        format!(
            "Pipeline: segment -> [{}] -> contours -> reduce",
            names.join(" -> ")
        )
    }
}
