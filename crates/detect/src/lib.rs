//! # Colour Object Detection Library
//!
//! A trait-based library for finding coloured objects in camera frames.
//! Each frame is thresholded against a bank of HSV filters, cleaned up,
//! turned into a contour hierarchy and reduced to a list of object centroids.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: swap segmenters, preprocessors, extractors or reducers
//! - **Pipeline System**: compose morphology, blur and edge stages per filter
//! - **Contour Reduction**: top-level contours filtered by area, with a noise ceiling
//! - **Oriented Rectangles**: minimum-area rectangles for debugging and pose hints
//! - **GeoJSON Support**: export per-frame detections
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use detect::{DetectionMode, Detector, DetectorConfig};
//!
//! let config = DetectorConfig::from_file("detector.toml")?;
//! let detector = Detector::new(config, DetectionMode::Sensing)?;
//!
//! let frame = image::open("frame.png")?.to_rgb8();
//! let report = detector.detect_frame(0, &frame)?;
//! report.save_geojson("frame.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reducing an Existing Hierarchy
//!
//! ```rust
//! use detect::{reduce_to_objects, ContourNode, Point};
//!
//! let square = vec![
//!     Point::new(0, 0),
//!     Point::new(10, 0),
//!     Point::new(10, 10),
//!     Point::new(0, 10),
//! ];
//! let objects = reduce_to_objects(&[ContourNode::leaf(square)], 50.0, 50)?;
//! assert_eq!(objects[0].center, [5.0, 5.0]);
//! # Ok::<(), detect::DetectError>(())
//! ```

pub mod error;
pub mod types;
pub mod color;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod config;
pub mod detector;
pub mod render;
pub mod io;

pub use error::{DetectError, Result};
pub use types::{
    Contour, ContourHierarchy, ContourNode, DetectedObject, FilterDetections, FrameReport,
    NodeLink, OrientedRect, Point, TrackedObject, NO_LINK,
};
pub use color::{rgb_to_hsv, Hsv, HsvFilter};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{builder::PipelineBuilder, Pipeline, PipelineTrace};
pub use config::DetectorConfig;
pub use detector::{DebugFrame, DetectionMode, Detector};
