use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{debug, trace};

use crate::{
    algorithms::geometry::{fit_oriented_rectangle, Moments},
    error::Result,
    traits::ObjectReducer,
    types::{top_level_chain, ContourHierarchy, ContourNode, DetectedObject},
};

/// 20x20 px
pub const DEFAULT_MIN_AREA: f64 = 400.0;
pub const DEFAULT_NOISE_CEILING: usize = 50;

/// What the noise ceiling is compared against.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoiseCount {
    /// Every node in the hierarchy, holes and nested boundaries included
    #[default]
    AllNodes,
    /// Only the nodes on the top-level chain
    TopLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReducerConfig {
    /// Contours with area at or below this are discarded
    pub min_area: f64,
    /// A mask with this many components or more yields no detections.
    /// Zero makes every frame noisy.
    pub noise_ceiling: usize,
    pub noise_count: NoiseCount,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            noise_ceiling: DEFAULT_NOISE_CEILING,
            noise_count: NoiseCount::AllNodes,
        }
    }
}

/// Reduce one mask's contour nodes to object centroids.
///
/// Only the top-level chain starting at node 0 is visited. When
/// `nodes.len() >= noise_ceiling` the whole mask is treated as noise and the
/// result is empty. Objects keep the traversal order.
pub fn reduce_to_objects(
    nodes: &[ContourNode],
    min_area: f64,
    noise_ceiling: usize,
) -> Result<Vec<DetectedObject>> {
    let reducer = ContourReducer::new(ReducerConfig {
        min_area,
        noise_ceiling,
        noise_count: NoiseCount::AllNodes,
    });
    reducer.reduce_nodes(nodes)
}

/// Contour-to-object reduction with optional rectangle fitting.
#[derive(Debug, Clone, Default)]
pub struct ContourReducer {
    pub config: ReducerConfig,
    /// Attach a minimum-area rectangle to every emitted object
    pub fit_rectangles: bool,
}

impl ContourReducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config, fit_rectangles: false }
    }

    pub fn with_rectangles(mut self, fit_rectangles: bool) -> Self {
        self.fit_rectangles = fit_rectangles;
        self
    }

    pub fn reduce_nodes(&self, nodes: &[ContourNode]) -> Result<Vec<DetectedObject>> {
        let ceiling = self.config.noise_ceiling;

        let top_level = match self.config.noise_count {
            NoiseCount::AllNodes => {
                if nodes.len() >= ceiling {
                    debug!(components = nodes.len(), ceiling, "noisy filter, dropping frame");
                    return Ok(Vec::new());
                }
                top_level_chain(nodes)?
            }
            NoiseCount::TopLevel => {
                let top_level = top_level_chain(nodes)?;
                if top_level.len() >= ceiling {
                    debug!(components = top_level.len(), ceiling, "noisy filter, dropping frame");
                    return Ok(Vec::new());
                }
                top_level
            }
        };

        let mut objects = Vec::with_capacity(top_level.len());
        for index in top_level {
            let contour = &nodes[index].contour;
            let moments = Moments::of_contour(contour);

            let Some(center) = moments.centroid() else {
                trace!(index, "skipping zero-area contour");
                continue;
            };
            if moments.m00 <= self.config.min_area {
                trace!(index, area = moments.m00, "skipping small contour");
                continue;
            }

            let oriented_rect = self.fit_rectangles.then(|| fit_oriented_rectangle(contour));
            objects.push(DetectedObject {
                center,
                area: moments.m00,
                oriented_rect,
            });
        }

        debug!(objects = objects.len(), nodes = nodes.len(), "reduced contours");
        Ok(objects)
    }
}

impl ObjectReducer for ContourReducer {
    fn reduce(&self, hierarchy: &ContourHierarchy) -> Result<Vec<DetectedObject>> {
        self.reduce_nodes(hierarchy.nodes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DetectError,
        types::{Contour, ContourNode, Point, NO_LINK},
    };

    fn square_at(x: i32, y: i32, side: i32) -> Contour {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_single_square() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 10)]);
        let objects = reduce_to_objects(hierarchy.nodes(), 50.0, 50).expect("Should reduce");

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].area, 100.0);
        assert_eq!(objects[0].center, [5.0, 5.0]);
        assert!(objects[0].oriented_rect.is_none());
    }

    #[test]
    fn test_square_below_min_area() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 10)]);
        let objects = reduce_to_objects(hierarchy.nodes(), 150.0, 50).expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_area_equal_to_min_area_is_discarded() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 10)]);
        let objects = reduce_to_objects(hierarchy.nodes(), 100.0, 50).expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_noise_ceiling_drops_everything() {
        let contours = (0..60).map(|i| square_at(i * 30, 0, 25)).collect();
        let hierarchy = ContourHierarchy::flat(contours);
        let objects = reduce_to_objects(hierarchy.nodes(), 50.0, 50).expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_noise_ceiling_is_inclusive() {
        let below: Vec<Contour> = (0..49).map(|i| square_at(i * 30, 0, 25)).collect();
        let objects = reduce_to_objects(ContourHierarchy::flat(below).nodes(), 50.0, 50)
            .expect("Should reduce");
        assert_eq!(objects.len(), 49);

        let at: Vec<Contour> = (0..50).map(|i| square_at(i * 30, 0, 25)).collect();
        let objects = reduce_to_objects(ContourHierarchy::flat(at).nodes(), 50.0, 50)
            .expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_zero_ceiling_is_always_noisy() {
        assert!(reduce_to_objects(&[], 0.0, 0).expect("Should reduce").is_empty());
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 10)]);
        assert!(reduce_to_objects(hierarchy.nodes(), 0.0, 0).expect("Should reduce").is_empty());
    }

    #[test]
    fn test_empty_input() {
        let objects = reduce_to_objects(&[], 50.0, 50).expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_non_positive_min_area_keeps_non_degenerate_contours() {
        let degenerate = vec![Point::new(0, 0), Point::new(5, 5), Point::new(9, 9)];
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 2), degenerate, square_at(10, 10, 1)]);

        let objects = reduce_to_objects(hierarchy.nodes(), -5.0, 50).expect("Should reduce");
        assert_eq!(objects.len(), 2);
        assert!(objects.iter().all(|o| o.center[0].is_finite() && o.center[1].is_finite()));
    }

    #[test]
    fn test_zero_area_contour_never_emitted() {
        let hierarchy = ContourHierarchy::flat(vec![vec![Point::new(3, 3)]]);
        let objects = reduce_to_objects(hierarchy.nodes(), 0.0, 50).expect("Should reduce");
        assert!(objects.is_empty());
    }

    #[test]
    fn test_order_follows_top_level_links() {
        // Node order in the arena differs from link order: 0 -> 2 -> 1
        let nodes = vec![
            ContourNode::new(square_at(0, 0, 30), NO_LINK, 2),
            ContourNode::new(square_at(200, 0, 30), NO_LINK, NO_LINK),
            ContourNode::new(square_at(100, 0, 30), NO_LINK, 1),
        ];
        let objects = reduce_to_objects(&nodes, 50.0, 50).expect("Should reduce");

        let xs: Vec<f64> = objects.iter().map(|o| o.center[0]).collect();
        assert_eq!(xs, vec![15.0, 115.0, 215.0]);
    }

    #[test]
    fn test_children_are_not_visited() {
        let hierarchy = ContourHierarchy::from_parents(vec![
            (square_at(0, 0, 100), None),
            (square_at(10, 10, 50), Some(0)),
            (square_at(20, 20, 30), Some(1)),
            (square_at(300, 0, 40), None),
        ])
        .expect("Should build hierarchy");

        let objects = reduce_to_objects(hierarchy.nodes(), 50.0, 50).expect("Should reduce");
        let areas: Vec<f64> = objects.iter().map(|o| o.area).collect();
        assert_eq!(areas, vec![10_000.0, 1_600.0]);
    }

    #[test]
    fn test_every_object_exceeds_min_area() {
        let contours: Vec<Contour> = (1..40).map(|side| square_at(side * 50, 0, side)).collect();
        let hierarchy = ContourHierarchy::flat(contours);

        for min_area in [0.0, 10.0, 99.0, 100.0, 500.0, 1500.0] {
            let objects = reduce_to_objects(hierarchy.nodes(), min_area, 50).expect("Should reduce");
            assert!(objects.iter().all(|o| o.area > min_area));
            let expected = (1..40).filter(|side| (side * side) as f64 > min_area).count();
            assert_eq!(objects.len(), expected);
        }
    }

    #[test]
    fn test_reduction_is_idempotent() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 30), square_at(50, 50, 25)]);
        let reducer = ContourReducer::new(ReducerConfig::default()).with_rectangles(true);

        let first = reducer.reduce(&hierarchy).expect("Should reduce");
        let second = reducer.reduce(&hierarchy).expect("Should reduce");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_top_level_noise_count() {
        // 30 nested holes under one outer boundary: noisy by node count, fine by top-level count
        let mut contours = vec![(square_at(0, 0, 500), None)];
        contours.extend((0..59).map(|i| (square_at(5 + i * 8, 5, 4), Some(0))));
        let hierarchy = ContourHierarchy::from_parents(contours).expect("Should build hierarchy");

        let all_nodes = ContourReducer::new(ReducerConfig::default());
        assert!(all_nodes.reduce(&hierarchy).expect("Should reduce").is_empty());

        let top_level = ContourReducer::new(ReducerConfig {
            noise_count: NoiseCount::TopLevel,
            ..ReducerConfig::default()
        });
        let objects = top_level.reduce(&hierarchy).expect("Should reduce");
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].area, 250_000.0);
    }

    #[test]
    fn test_fitted_rectangles_are_attached() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(10, 20, 30)]);
        let reducer = ContourReducer::new(ReducerConfig::default()).with_rectangles(true);
        let objects = reducer.reduce(&hierarchy).expect("Should reduce");

        let rect = objects[0].oriented_rect.expect("Should fit a rectangle");
        assert_eq!(rect.angle, 0.0);
        assert!((rect.area() - 900.0).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_hierarchy_fails_fast() {
        let nodes = vec![
            ContourNode::new(square_at(0, 0, 30), NO_LINK, 1),
            ContourNode::new(square_at(50, 0, 30), NO_LINK, 0),
        ];
        let result = reduce_to_objects(&nodes, 50.0, 50);
        assert!(matches!(result, Err(DetectError::MalformedHierarchy { .. })));

        let dangling = vec![ContourNode::new(square_at(0, 0, 30), NO_LINK, 9)];
        assert!(reduce_to_objects(&dangling, 50.0, 50).is_err());
    }

    #[test]
    fn test_noise_count_names() {
        assert_eq!(NoiseCount::TopLevel.to_string(), "top_level");
        assert_eq!("all_nodes".parse::<NoiseCount>().expect("Should parse"), NoiseCount::AllNodes);
    }
}
