//! Multi-source fusion.
//!
//! Candidates from every tier are compared pairwise and grouped transitively: anything linked by
//! a chain of matches is one physical element. Ids are assigned afterwards in reading order (top
//! to bottom, then left to right) so the numbering is reproducible.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::{Candidate, DetectedElement};
use crate::heuristics::text_similarity;

/// Tunable thresholds for deciding whether two candidates are the same element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FusionConfig {
    /// IoU at or above which two rectangles are the same element regardless of labels.
    pub high_iou: f64,
    /// IoU at or above which agreeing labels and close centers are enough to merge.
    pub moderate_iou: f64,
    /// Minimum label similarity for the label-assisted rules.
    pub label_similarity: f64,
    /// Maximum center distance (pixels) for the label-assisted rules.
    pub max_center_distance: f64,
    /// Area (pixels²) under which both rectangles count as small, enabling the
    /// low-overlap center-distance rule.
    pub small_element_area: i64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            high_iou: 0.7,
            moderate_iou: 0.3,
            label_similarity: 0.8,
            max_center_distance: 12.0,
            small_element_area: 48 * 48,
        }
    }
}

/// Pairwise evidence between two candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub iou: f64,
    pub similarity: f64,
    pub center_distance: f64,
    pub both_small: bool,
}

impl MatchScore {
    pub fn between(a: &DetectedElement, b: &DetectedElement, config: &FusionConfig) -> Self {
        Self {
            iou: a.bounds.iou(&b.bounds),
            similarity: text_similarity(a.name.as_str(), b.name.as_str()),
            center_distance: a.bounds.center_distance(&b.bounds),
            both_small: a.bounds.area() <= config.small_element_area
                && b.bounds.area() <= config.small_element_area,
        }
    }

    /// Decision rule. Any merge requires positive overlap.
    pub fn is_same_element(&self, config: &FusionConfig) -> bool {
        if self.iou <= 0.0 {
            return false;
        }
        if self.iou >= config.high_iou {
            return true;
        }

        let corroborated = self.similarity >= config.label_similarity
            && self.center_distance <= config.max_center_distance;

        if self.iou >= config.moderate_iou {
            corroborated
        } else {
            self.both_small && corroborated
        }
    }
}

/// Whether two (possibly already merged) elements describe the same physical element.
pub fn is_match(a: &DetectedElement, b: &DetectedElement, config: &FusionConfig) -> bool {
    if a.bounds.is_degenerate() || b.bounds.is_degenerate() {
        return false;
    }
    // Two native elements are distinct even when they share a rectangle.
    if a.is_authoritative() && b.is_authoritative() {
        return false;
    }

    MatchScore::between(a, b, config).is_same_element(config)
}

/// Merge two matched elements into one.
///
/// Geometry comes from the accessibility-sourced side when there is one, otherwise from the
/// higher-confidence side (earlier wins ties). Sources are combined and the confidence is the
/// maximum of the two, so corroboration never lowers it.
pub fn merge_pair(a: &DetectedElement, b: &DetectedElement) -> DetectedElement {
    let (keep, other) = if precedence(a, b) == Ordering::Less {
        (b, a)
    } else {
        (a, b)
    };

    let element_type = if keep.is_authoritative() || !keep.element_type.is_generic() {
        keep.element_type.clone()
    } else if !other.element_type.is_generic() {
        other.element_type.clone()
    } else {
        keep.element_type.clone()
    };

    let name = if keep.name.trim().is_empty() {
        other.name.clone()
    } else {
        keep.name.clone()
    };

    DetectedElement {
        id: 0,
        element_type,
        name,
        bounds: keep.bounds,
        stable_id: keep.stable_id.clone().or_else(|| other.stable_id.clone()),
        is_enabled: keep.is_enabled,
        is_interactable: keep.is_interactable,
        sources: a.sources | b.sources,
        confidence: a.confidence.max(b.confidence),
    }
}

fn precedence(a: &DetectedElement, b: &DetectedElement) -> Ordering {
    a.is_authoritative()
        .cmp(&b.is_authoritative())
        .then_with(|| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(Ordering::Equal)
        })
}

/// Fusion output with diagnostics.
#[derive(Debug, Clone, Default)]
pub struct FusionReport {
    /// Final elements with ids `1..=N`.
    pub elements: Vec<DetectedElement>,
    /// Number of successful pairwise merges.
    pub merges: usize,
    /// For each output element, the ascending input indices that formed it.
    pub members: Vec<Vec<usize>>,
}

#[derive(Debug)]
struct Cluster {
    element: DetectedElement,
    members: Vec<usize>,
}

/// Fuse unified elements into a deduplicated, numbered list.
pub fn fuse(elements: Vec<DetectedElement>, config: &FusionConfig) -> Vec<DetectedElement> {
    fuse_with_report(elements, config).elements
}

/// Normalize tagged candidates and fuse them.
pub fn fuse_candidates(candidates: Vec<Candidate>, config: &FusionConfig) -> FusionReport {
    fuse_with_report(
        candidates.into_iter().map(Candidate::into_element).collect(),
        config,
    )
}

/// Fuse unified elements, also reporting merges and provenance.
///
/// Every pair of inputs is compared on its own rectangle and label; groups linked by a chain of
/// matches become one element. A link is refused when both groups already hold an accessibility
/// element. Each group is then folded by [`merge_pair`] in precedence order, so the merged fields
/// do not depend on which member came first.
pub fn fuse_with_report(elements: Vec<DetectedElement>, config: &FusionConfig) -> FusionReport {
    let input_len = elements.len();
    let mut groups = Groups::new(&elements);

    let mut merges = 0usize;
    for i in 0..input_len {
        for j in (i + 1)..input_len {
            if !is_match(&elements[i], &elements[j], config) {
                continue;
            }
            if groups.union(i, j) {
                debug!(left = i, right = j, "merging candidates");
                merges += 1;
            }
        }
    }

    let mut clusters: Vec<Cluster> = groups
        .into_members()
        .into_iter()
        .filter_map(|members| fold_members(&elements, members))
        .collect();
    clusters.sort_by(reading_order);

    let mut fused = Vec::with_capacity(clusters.len());
    let mut members = Vec::with_capacity(clusters.len());
    for (index, cluster) in clusters.into_iter().enumerate() {
        let mut element = cluster.element;
        element.id = index as u32 + 1;
        fused.push(element);
        members.push(cluster.members);
    }

    debug!(
        input = input_len,
        output = fused.len(),
        merges,
        "fusion complete"
    );

    FusionReport {
        elements: fused,
        merges,
        members,
    }
}

/// Build one element from a group, highest precedence first (earlier input wins ties).
fn fold_members(elements: &[DetectedElement], members: Vec<usize>) -> Option<Cluster> {
    let mut order = members.clone();
    order.sort_by(|&a, &b| precedence(&elements[b], &elements[a]).then_with(|| a.cmp(&b)));

    let (&first, rest) = order.split_first()?;
    let element = rest
        .iter()
        .fold(elements[first].clone(), |acc, &index| merge_pair(&acc, &elements[index]));

    Some(Cluster { element, members })
}

/// Disjoint sets over input indices.
struct Groups {
    parent: Vec<usize>,
    authoritative: Vec<bool>,
}

impl Groups {
    fn new(elements: &[DetectedElement]) -> Self {
        Self {
            parent: (0..elements.len()).collect(),
            authoritative: elements.iter().map(DetectedElement::is_authoritative).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    /// Join the groups of `a` and `b`. Returns whether a new link was made.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb || (self.authoritative[ra] && self.authoritative[rb]) {
            return false;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        self.authoritative[root] |= self.authoritative[child];
        true
    }

    /// Ascending member indices of every group, ordered by smallest member.
    fn into_members(mut self) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); self.parent.len()];
        for index in 0..self.parent.len() {
            let root = self.find(index);
            by_root[root].push(index);
        }
        by_root.retain(|members| !members.is_empty());
        by_root
    }
}

fn reading_order(a: &Cluster, b: &Cluster) -> Ordering {
    let (ra, rb) = (&a.element.bounds, &b.element.bounds);
    ra.top()
        .cmp(&rb.top())
        .then_with(|| ra.left().cmp(&rb.left()))
        .then_with(|| ra.bottom().cmp(&rb.bottom()))
        .then_with(|| ra.right().cmp(&rb.right()))
        .then_with(|| a.members.first().cmp(&b.members.first()))
}
