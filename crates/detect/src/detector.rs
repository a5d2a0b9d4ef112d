use std::borrow::Cow;
use std::sync::Arc;

use image::{imageops::FilterType, GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{debug, info};

use crate::{
    algorithms::fit_oriented_rectangle,
    config::DetectorConfig,
    error::Result,
    pipeline::Pipeline,
    render,
    types::{DetectedObject, FilterDetections, FrameReport, OrientedRect},
};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionMode {
    /// Single filter, intermediate images and fitted rectangles
    Debug,
    /// Every configured filter, centroids per frame
    #[default]
    Sensing,
}

impl DetectionMode {
    /// Get a list of all available mode names
    pub fn mode_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Debug => "Show thresholded mask, edges and minimum-area rectangles for one filter",
            Self::Sensing => "Report object positions for every configured colour filter",
        }
    }
}

/// Images and objects produced by a debug run over one frame.
#[derive(Debug, Clone)]
pub struct DebugFrame {
    pub thresholded: GrayImage,
    pub edges: GrayImage,
    /// Rectangle of every top-level contour plus the centre of each object
    pub min_rect: RgbImage,
    /// One per top-level contour, before area and noise filtering
    pub contour_rects: Vec<OrientedRect>,
    pub objects: Vec<DetectedObject>,
}

/// Runs the configured filters over frames.
#[derive(Clone)]
pub struct Detector {
    config: DetectorConfig,
    mode: DetectionMode,
    pipeline: Arc<Pipeline>,
}

impl Detector {
    pub fn new(mut config: DetectorConfig, mode: DetectionMode) -> Result<Self> {
        config.validate()?;
        if mode == DetectionMode::Debug {
            config.fit_rectangles = true;
        }

        let pipeline = Pipeline::from_config(&config);
        debug!(mode = %mode, filters = config.filters.len(), "{}", pipeline.info());

        Ok(Self {
            config,
            mode,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Resize the frame when the configuration asks for a fixed size
    pub fn prepare_frame<'a>(&self, frame: &'a RgbImage) -> Cow<'a, RgbImage> {
        let target = &self.config.frame;
        if target.resize && frame.dimensions() != (target.width, target.height) {
            Cow::Owned(image::imageops::resize(frame, target.width, target.height, FilterType::Triangle))
        } else {
            Cow::Borrowed(frame)
        }
    }

    /// Run every configured filter over one frame
    pub fn detect_frame(&self, frame_index: u64, frame: &RgbImage) -> Result<FrameReport> {
        let frame = self.prepare_frame(frame);

        let mut filters = Vec::with_capacity(self.config.filters.len());
        for (filter_id, filter) in self.config.filters.iter().enumerate() {
            let objects = self.pipeline.process(&frame, filter)?;
            debug!(frame_index, filter_id, objects = objects.len(), "filter done");
            filters.push(FilterDetections::new(filter_id, filter, objects));
        }

        let report = FrameReport {
            frame_index,
            image_width: frame.width(),
            image_height: frame.height(),
            filters,
        };
        info!(frame_index, objects = report.object_count(), "frame processed");
        Ok(report)
    }

    /// Run one filter and keep the intermediate images
    pub fn debug_frame(&self, frame: &RgbImage, filter_id: usize) -> Result<DebugFrame> {
        let filter = self.config.filter(filter_id)?;
        let frame = self.prepare_frame(frame);
        let trace = self.pipeline.process_traced(&frame, filter)?;

        let thresholded = trace.stage("morphology").unwrap_or(&trace.mask).clone();
        let edges = trace.final_image().clone();

        let nodes = trace.hierarchy.nodes();
        let contour_rects: Vec<OrientedRect> = trace
            .hierarchy
            .top_level_indices()?
            .into_iter()
            .map(|index| fit_oriented_rectangle(&nodes[index].contour))
            .collect();
        let min_rect =
            render::draw_min_rects(frame.width(), frame.height(), &contour_rects, &trace.objects);

        Ok(DebugFrame {
            thresholded,
            edges,
            min_rect,
            contour_rects,
            objects: trace.objects,
        })
    }
}
