use geo::Rect;
use log::debug;
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};

use crate::{Building, ShadowCaster, Tree};

/// Spatial index over shadow casters in a metric plane
///
/// Only casters with a usable height are kept. Lookups return candidates
/// whose bounding box meets the query envelope, the exact participation
/// test is still up to the scorer.
pub struct CasterIndex {
    buildings: Vec<Building>,
    trees: Vec<Tree>,
    building_tree: RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>,
    tree_tree: RTree<GeomWithData<[f64; 2], usize>>,
}

impl CasterIndex {
    pub fn new(buildings: Vec<Building>, trees: Vec<Tree>) -> Self {
        let total_buildings = buildings.len();
        let total_trees = trees.len();

        let buildings: Vec<Building> = buildings
            .into_iter()
            .filter(|building| building.height().is_some())
            .collect();
        let trees: Vec<Tree> = trees
            .into_iter()
            .filter(|tree| tree.height().is_some())
            .collect();

        if buildings.len() < total_buildings || trees.len() < total_trees {
            debug!(
                "Excluded {} buildings and {} trees without usable height from shading",
                total_buildings - buildings.len(),
                total_trees - trees.len()
            );
        }

        let building_items = buildings
            .iter()
            .enumerate()
            .filter_map(|(idx, building)| {
                let rect = ShadowCaster::bounding_rect(building)?;
                Some(GeomWithData::new(
                    Rectangle::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    idx,
                ))
            })
            .collect();
        let tree_items = trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| GeomWithData::new([tree.location.x(), tree.location.y()], idx))
            .collect();

        Self {
            building_tree: RTree::bulk_load(building_items),
            tree_tree: RTree::bulk_load(tree_items),
            buildings,
            trees,
        }
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn buildings_in(&self, envelope: Rect<f64>) -> Vec<&Building> {
        self.building_tree
            .locate_in_envelope_intersecting(&to_aabb(envelope))
            .map(|entry| &self.buildings[entry.data])
            .collect()
    }

    pub fn trees_in(&self, envelope: Rect<f64>) -> Vec<&Tree> {
        self.tree_tree
            .locate_in_envelope_intersecting(&to_aabb(envelope))
            .map(|entry| &self.trees[entry.data])
            .collect()
    }
}

fn to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Point, polygon};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> geo::Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    #[test]
    fn lookup_returns_only_nearby_casters() {
        let index = CasterIndex::new(
            vec![
                Building::new(square(0.0, 0.0, 10.0), 20.0),
                Building::new(square(500.0, 500.0, 10.0), 20.0),
            ],
            vec![
                Tree::new(Point::new(5.0, 15.0), 4.0),
                Tree::new(Point::new(-300.0, 0.0), 4.0),
            ],
        );

        let envelope = Rect::new(Coord { x: -5.0, y: -5.0 }, Coord { x: 20.0, y: 20.0 });
        assert_eq!(index.buildings_in(envelope).len(), 1);
        assert_eq!(index.trees_in(envelope).len(), 1);
    }

    #[test]
    fn casters_without_height_are_dropped() {
        let index = CasterIndex::new(
            vec![
                Building::without_height(square(0.0, 0.0, 10.0)),
                Building::new(square(0.0, 0.0, 10.0), -4.0),
                Building::new(square(20.0, 0.0, 10.0), 8.0),
            ],
            vec![Tree::new(Point::new(0.0, 0.0), 0.0)],
        );

        assert_eq!(index.buildings().len(), 1);
        assert!(index.trees().is_empty());
    }
}
