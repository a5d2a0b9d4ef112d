use crate::{
    algorithms::{
        CannyEdgePreprocessor, ContourReducer, GaussianBlurPreprocessor, HsvRangeSegmenter,
        ImageprocHierarchyExtractor, MorphologyOrder, MorphologyPreprocessor, ReducerConfig,
    },
    config::DetectorConfig,
    pipeline::Pipeline,
    traits::{ColorSegmenter, HierarchyExtractor, ImagePreprocessor, ObjectReducer},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    segmenter: Option<Box<dyn ColorSegmenter>>,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    hierarchy_extractor: Option<Box<dyn HierarchyExtractor>>,
    reducer: Option<Box<dyn ObjectReducer>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            segmenter: None,
            preprocessors: Vec::new(),
            hierarchy_extractor: None,
            reducer: None,
        }
    }

    /// Pipeline matching a detector configuration
    pub fn from_config(config: &DetectorConfig) -> Self {
        let mut builder = Self::new();

        if config.morphology.enabled {
            builder = builder.add_preprocessor(MorphologyPreprocessor {
                order: config.morphology.order,
                kernel_radius: config.morphology.kernel_radius,
            });
        }
        if config.blur.enabled {
            builder = builder.with_blur(config.blur.sigma);
        }
        if config.edges.enabled {
            builder = builder.with_canny(config.edges.low_threshold, config.edges.high_threshold);
        }

        builder.set_reducer(
            ContourReducer::new(config.reducer.clone()).with_rectangles(config.fit_rectangles),
        )
    }

    /// Set the colour segmenter (replaces any existing one)
    pub fn set_segmenter<S>(mut self, segmenter: S) -> Self
    where
        S: ColorSegmenter + 'static,
    {
        self.segmenter = Some(Box::new(segmenter));
        self
    }

    /// Add a mask preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the hierarchy extractor (replaces any existing one)
    pub fn set_hierarchy_extractor<E>(mut self, extractor: E) -> Self
    where
        E: HierarchyExtractor + 'static,
    {
        self.hierarchy_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the object reducer (replaces any existing one)
    pub fn set_reducer<R>(mut self, reducer: R) -> Self
    where
        R: ObjectReducer + 'static,
    {
        self.reducer = Some(Box::new(reducer));
        self
    }

    /// Add a 3x3 erode/dilate pass in the given order
    pub fn with_morphology(self, order: MorphologyOrder) -> Self {
        self.add_preprocessor(MorphologyPreprocessor {
            order,
            kernel_radius: 1,
        })
    }

    pub fn with_blur(self, sigma: f32) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { sigma })
    }

    pub fn with_canny(self, low_threshold: f32, high_threshold: f32) -> Self {
        self.add_preprocessor(CannyEdgePreprocessor {
            low_threshold,
            high_threshold,
        })
    }

    /// Use the contour reducer with the given thresholds
    pub fn with_reducer(self, config: ReducerConfig, fit_rectangles: bool) -> Self {
        self.set_reducer(ContourReducer::new(config).with_rectangles(fit_rectangles))
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let segmenter = self.segmenter
            .unwrap_or_else(|| Box::new(HsvRangeSegmenter));

        let hierarchy_extractor = self.hierarchy_extractor
            .unwrap_or_else(|| Box::new(ImageprocHierarchyExtractor));

        let reducer = self.reducer
            .unwrap_or_else(|| Box::new(ContourReducer::default()));

        Pipeline::new(
            segmenter,
            self.preprocessors,
            hierarchy_extractor,
            reducer,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
