use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};

use crate::{
    color::{Hsv, HsvFilter},
    error::{DetectError, Result},
};

/// Raw link value stored in a [`ContourNode`].
pub type NodeLink = i32;

/// Sentinel for "no such node" in `first_child` / `next_sibling`.
///
/// Same convention as the `Vec4i` hierarchy of common vision libraries. Any
/// other negative value is a dangling link.
pub const NO_LINK: NodeLink = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Closed boundary of a connected region, in traversal order.
pub type Contour = Vec<Point>;

/// Convert a contour to a geo-types polygon for geometric operations
pub fn contour_to_polygon(contour: &[Point]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = contour
        .iter()
        .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourNode {
    pub contour: Contour,
    /// Index of the first nested contour, or [`NO_LINK`]
    pub first_child: NodeLink,
    /// Index of the next contour on the same level, or [`NO_LINK`]
    pub next_sibling: NodeLink,
}

impl ContourNode {
    pub fn new(contour: Contour, first_child: NodeLink, next_sibling: NodeLink) -> Self {
        Self { contour, first_child, next_sibling }
    }

    /// A node with no links in either direction
    pub fn leaf(contour: Contour) -> Self {
        Self::new(contour, NO_LINK, NO_LINK)
    }
}

/// Flat, index-linked arena of contours extracted from one binary mask.
///
/// Index 0 (when present) heads the chain of top-level boundaries; every
/// other top-level node is reached through `next_sibling`. Holes and nested
/// boundaries hang off `first_child`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourHierarchy {
    nodes: Vec<ContourNode>,
}

impl ContourHierarchy {
    pub fn new(nodes: Vec<ContourNode>) -> Self {
        Self { nodes }
    }

    /// Build a hierarchy where every contour is a top-level sibling, in order.
    pub fn flat(contours: Vec<Contour>) -> Self {
        let count = contours.len();
        let nodes = contours
            .into_iter()
            .enumerate()
            .map(|(i, contour)| {
                let next = if i + 1 < count { (i + 1) as NodeLink } else { NO_LINK };
                ContourNode::new(contour, NO_LINK, next)
            })
            .collect();
        Self { nodes }
    }

    /// Build the sibling/child arena from contours carrying parent indices.
    ///
    /// Siblings are chained in input order. The first contour must be a root.
    pub fn from_parents(contours: Vec<(Contour, Option<usize>)>) -> Result<Self> {
        let count = contours.len();
        let mut nodes: Vec<ContourNode> = Vec::with_capacity(count);
        let mut last_root: Option<usize> = None;
        let mut first_child: Vec<Option<usize>> = vec![None; count];
        let mut last_child: Vec<Option<usize>> = vec![None; count];

        for (index, (contour, parent)) in contours.into_iter().enumerate() {
            nodes.push(ContourNode::leaf(contour));

            match parent {
                None => {
                    match last_root {
                        Some(prev) => nodes[prev].next_sibling = index as NodeLink,
                        None if index != 0 => {
                            return Err(DetectError::MalformedHierarchy {
                                index: 0,
                                reason: "first contour is not a top-level boundary".to_string(),
                            });
                        }
                        None => {}
                    }
                    last_root = Some(index);
                }
                Some(parent) => {
                    if index == 0 {
                        return Err(DetectError::MalformedHierarchy {
                            index,
                            reason: "first contour is not a top-level boundary".to_string(),
                        });
                    }
                    if parent >= count || parent == index {
                        return Err(DetectError::MalformedHierarchy {
                            index,
                            reason: format!("parent {} out of range", parent),
                        });
                    }
                    match last_child[parent] {
                        Some(prev) => nodes[prev].next_sibling = index as NodeLink,
                        None => first_child[parent] = Some(index),
                    }
                    last_child[parent] = Some(index);
                }
            }
        }

        // Parents may appear after their children, so patch child links last.
        for (index, child) in first_child.into_iter().enumerate() {
            if let Some(child) = child {
                nodes[index].first_child = child as NodeLink;
            }
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[ContourNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ContourNode> {
        self.nodes.get(index)
    }

    pub fn into_nodes(self) -> Vec<ContourNode> {
        self.nodes
    }

    /// Indices of the top-level chain, in link order.
    pub fn top_level_indices(&self) -> Result<Vec<usize>> {
        top_level_chain(&self.nodes)
    }

    /// Indices of the direct children of `index`, in link order.
    pub fn children(&self, index: usize) -> Result<Vec<usize>> {
        let node = self.nodes.get(index).ok_or_else(|| DetectError::MalformedHierarchy {
            index,
            reason: "node index out of range".to_string(),
        })?;
        match resolve_link(&self.nodes, index, node.first_child, "first_child")? {
            Some(first) => walk_siblings(&self.nodes, first),
            None => Ok(Vec::new()),
        }
    }

    /// Check every link in the arena points at an existing node or is [`NO_LINK`].
    pub fn validate(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            resolve_link(&self.nodes, index, node.first_child, "first_child")?;
            resolve_link(&self.nodes, index, node.next_sibling, "next_sibling")?;
        }
        Ok(())
    }
}

/// Indices of the top-level chain of `nodes`, starting at index 0.
///
/// Fails on a dangling link or a cycle instead of looping; never takes more
/// than `nodes.len()` steps.
pub fn top_level_chain(nodes: &[ContourNode]) -> Result<Vec<usize>> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }
    walk_siblings(nodes, 0)
}

fn walk_siblings(nodes: &[ContourNode], start: usize) -> Result<Vec<usize>> {
    let mut visited = vec![false; nodes.len()];
    let mut chain = Vec::new();
    let mut current = Some(start);

    while let Some(index) = current {
        if visited[index] {
            return Err(DetectError::MalformedHierarchy {
                index,
                reason: "cycle in sibling chain".to_string(),
            });
        }
        visited[index] = true;
        chain.push(index);
        current = resolve_link(nodes, index, nodes[index].next_sibling, "next_sibling")?;
    }

    Ok(chain)
}

/// Interpret a raw link of node `index`: `Ok(None)` for [`NO_LINK`].
pub(crate) fn resolve_link(
    nodes: &[ContourNode],
    index: usize,
    link: NodeLink,
    field: &str,
) -> Result<Option<usize>> {
    if link == NO_LINK {
        return Ok(None);
    }
    if link < 0 || link as usize >= nodes.len() {
        return Err(DetectError::MalformedHierarchy {
            index,
            reason: format!("{} link {} is dangling ({} nodes)", field, link, nodes.len()),
        });
    }
    Ok(Some(link as usize))
}

/// Minimum-area rectangle of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect {
    pub center: [f64; 2],
    /// `[width, height]`; width lies along the rotation direction
    pub size: [f64; 2],
    /// Degrees in `[0, 90)`
    pub angle: f64,
    /// `c - u*w/2 - v*h/2`, `c + u*w/2 - v*h/2`, `c + u*w/2 + v*h/2`, `c - u*w/2 + v*h/2`
    pub corners: [[f64; 2]; 4],
}

impl OrientedRect {
    pub fn area(&self) -> f64 {
        self.size[0] * self.size[1]
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() <= f64::EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Centroid `(m10/m00, m01/m00)`
    pub center: [f64; 2],
    /// Zeroth moment in square pixels
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oriented_rect: Option<OrientedRect>,
}

/// Object record handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub filter_id: usize,
    pub center: [i32; 2],
    pub avg_color: Hsv,
}

impl TrackedObject {
    pub fn from_detection(filter_id: usize, filter: &HsvFilter, object: &DetectedObject) -> Self {
        Self {
            filter_id,
            center: [object.center[0].round() as i32, object.center[1].round() as i32],
            avg_color: filter.average_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDetections {
    pub filter_id: usize,
    pub filter_name: Option<String>,
    pub objects: Vec<DetectedObject>,
    pub tracked: Vec<TrackedObject>,
}

impl FilterDetections {
    pub fn new(filter_id: usize, filter: &HsvFilter, objects: Vec<DetectedObject>) -> Self {
        let tracked = objects
            .iter()
            .map(|object| TrackedObject::from_detection(filter_id, filter, object))
            .collect();
        Self {
            filter_id,
            filter_name: filter.name.clone(),
            objects,
            tracked,
        }
    }
}

/// Everything detected in one frame, one entry per active filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub image_width: u32,
    pub image_height: u32,
    pub filters: Vec<FilterDetections>,
}

impl FrameReport {
    pub fn object_count(&self) -> usize {
        self.filters.iter().map(|f| f.objects.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_at(x: i32, y: i32, side: i32) -> Contour {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_flat_hierarchy_links_siblings_in_order() {
        let hierarchy = ContourHierarchy::flat(vec![square_at(0, 0, 4), square_at(10, 0, 4), square_at(20, 0, 4)]);
        assert_eq!(hierarchy.top_level_indices().expect("Should walk"), vec![0, 1, 2]);
        assert_eq!(hierarchy.nodes()[2].next_sibling, NO_LINK);
        assert!(hierarchy.validate().is_ok());
    }

    #[test]
    fn test_from_parents_builds_child_chains() {
        // 0: outer, 1: hole of 0, 2: second outer, 3: hole of 0, 4: hole of 2
        let hierarchy = ContourHierarchy::from_parents(vec![
            (square_at(0, 0, 20), None),
            (square_at(2, 2, 3), Some(0)),
            (square_at(40, 0, 20), None),
            (square_at(10, 10, 3), Some(0)),
            (square_at(42, 2, 3), Some(2)),
        ])
        .expect("Should build hierarchy");

        assert_eq!(hierarchy.top_level_indices().expect("Should walk"), vec![0, 2]);
        assert_eq!(hierarchy.children(0).expect("Should walk children"), vec![1, 3]);
        assert_eq!(hierarchy.children(2).expect("Should walk children"), vec![4]);
        assert!(hierarchy.children(1).expect("Should walk children").is_empty());
        assert!(hierarchy.validate().is_ok());
    }

    #[test]
    fn test_from_parents_rejects_child_first() {
        let result = ContourHierarchy::from_parents(vec![
            (square_at(0, 0, 4), Some(1)),
            (square_at(0, 0, 10), None),
        ]);
        assert!(matches!(result, Err(DetectError::MalformedHierarchy { .. })));
    }

    #[test]
    fn test_dangling_link_is_reported() {
        let hierarchy = ContourHierarchy::new(vec![
            ContourNode::new(square_at(0, 0, 4), NO_LINK, 7),
        ]);
        assert!(matches!(
            hierarchy.top_level_indices(),
            Err(DetectError::MalformedHierarchy { index: 0, .. })
        ));
        assert!(hierarchy.validate().is_err());

        let negative = ContourHierarchy::new(vec![ContourNode::new(square_at(0, 0, 4), -3, NO_LINK)]);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_sibling_cycle_is_reported() {
        let hierarchy = ContourHierarchy::new(vec![
            ContourNode::new(square_at(0, 0, 4), NO_LINK, 1),
            ContourNode::new(square_at(10, 0, 4), NO_LINK, 0),
        ]);
        let err = hierarchy.top_level_indices().expect_err("Should detect the cycle");
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_tracked_object_rounds_center() {
        let filter = HsvFilter::new(Hsv::new(0, 0, 0), Hsv::new(100, 200, 50));
        let object = DetectedObject { center: [4.6, 2.4], area: 10.0, oriented_rect: None };
        let tracked = TrackedObject::from_detection(3, &filter, &object);
        assert_eq!(tracked.center, [5, 2]);
        assert_eq!(tracked.avg_color, Hsv::new(50, 100, 25));
        assert_eq!(tracked.filter_id, 3);
    }
}
