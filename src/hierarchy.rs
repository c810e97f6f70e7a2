//! World -> continent -> country tree and its sunburst partition.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::index::DerivedIndex;

pub const UNKNOWN_CONTINENT: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodePath {
    Root,
    Continent(String),
    Country { continent: String, country: String },
}

impl NodePath {
    pub fn depth(&self) -> usize {
        match self {
            NodePath::Root => 0,
            NodePath::Continent(_) => 1,
            NodePath::Country { .. } => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
    pub name: String,
    pub path: NodePath,
    /// Countries below this node; 1 for a country.
    pub value: usize,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn build(index: &DerivedIndex) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for country in &index.countries {
            let continent = index.continent_of(country).unwrap_or(UNKNOWN_CONTINENT).to_string();
            groups.entry(continent).or_default().push(country.clone());
        }
        let children: Vec<HierarchyNode> = groups
            .into_iter()
            .map(|(continent, countries)| {
                let leaves: Vec<HierarchyNode> = countries
                    .into_iter()
                    .map(|country| HierarchyNode {
                        name: country.clone(),
                        path: NodePath::Country { continent: continent.clone(), country },
                        value: 1,
                        children: Vec::new(),
                    })
                    .collect();
                HierarchyNode {
                    name: continent.clone(),
                    path: NodePath::Continent(continent),
                    value: leaves.iter().map(|l| l.value).sum(),
                    children: leaves,
                }
            })
            .collect();
        HierarchyNode {
            name: "World".to_string(),
            path: NodePath::Root,
            value: children.iter().map(|c| c.value).sum(),
            children,
        }
    }

    pub fn height(&self) -> usize {
        1 + self.children.iter().map(|c| c.height()).max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SunburstArc {
    pub path: NodePath,
    pub name: String,
    pub value: usize,
    pub depth: usize,
    /// Radians clockwise from twelve o'clock.
    pub start: f64,
    pub end: f64,
}

/// Angular partition of a hierarchy: one ring per depth, angle proportional to value.
#[derive(Clone, Debug)]
pub struct SunburstLayout {
    pub arcs: Vec<SunburstArc>,
    pub rings: usize,
}

impl SunburstLayout {
    pub fn new(root: &HierarchyNode) -> Self {
        let mut arcs = Vec::new();
        Self::partition(root, 0.0, TAU, &mut arcs);
        Self { arcs, rings: root.height() }
    }

    fn partition(node: &HierarchyNode, start: f64, end: f64, out: &mut Vec<SunburstArc>) {
        out.push(SunburstArc {
            path: node.path.clone(),
            name: node.name.clone(),
            value: node.value,
            depth: node.path.depth(),
            start,
            end,
        });
        if node.value == 0 {
            return;
        }
        let per_unit = (end - start) / node.value as f64;
        let mut cursor = start;
        for child in &node.children {
            let next = cursor + per_unit * child.value as f64;
            Self::partition(child, cursor, next, out);
            cursor = next;
        }
    }

    /// Arc under an offset `(dx, dy)` from the centre (screen y down) in a sunburst of `radius`.
    pub fn hit(&self, dx: f64, dy: f64, radius: f64) -> Option<&SunburstArc> {
        if self.rings == 0 || radius <= 0.0 {
            return None;
        }
        let r = (dx * dx + dy * dy).sqrt();
        if r > radius {
            return None;
        }
        let ring_width = radius / self.rings as f64;
        let depth = ((r / ring_width) as usize).min(self.rings - 1);
        let angle = dx.atan2(-dy).rem_euclid(TAU);
        self.arcs
            .iter()
            .find(|a| a.depth == depth && (depth == 0 || (angle >= a.start && angle < a.end)))
    }
}
