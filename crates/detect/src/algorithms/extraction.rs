use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::{
    error::Result,
    traits::HierarchyExtractor,
    types::{Contour, ContourHierarchy, Point},
};

/// Imageproc-based hierarchy extractor
///
/// Any non-zero pixel counts as foreground. Contours come back in raster
/// order, so the first one is always an outer boundary.
///
/// The result has two levels: every outer boundary is top level and every
/// hole hangs off the boundary around it. An outer boundary nested inside a
/// hole is lifted back to the top level.
#[derive(Debug, Clone, Default)]
pub struct ImageprocHierarchyExtractor;

impl HierarchyExtractor for ImageprocHierarchyExtractor {
    fn extract_hierarchy(&self, binary_image: &GrayImage) -> Result<ContourHierarchy> {
        let contours = find_contours::<i32>(binary_image);

        let with_parents: Vec<(Contour, Option<usize>)> = contours
            .into_iter()
            .map(|contour| {
                let points = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x, p.y))
                    .collect();
                let parent = match contour.border_type {
                    BorderType::Outer => None,
                    BorderType::Hole => contour.parent,
                };
                (points, parent)
            })
            .collect();

        ContourHierarchy::from_parents(with_parents)
    }
}
