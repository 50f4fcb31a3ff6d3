// world_pathfinder/pathfinder/src/world/building.rs
use crate::core::geometry::{Transform, Vec3};
use crate::systems::indoor::PortalLayout;
use std::sync::{Arc, Weak};

/// Static description shared by every placement of a building.
#[derive(Debug)]
pub struct BuildingTemplate {
    name: String,
    portal_layout: Option<Arc<PortalLayout>>,
}

impl BuildingTemplate {
    pub fn new(name: impl Into<String>, portal_layout: Option<Arc<PortalLayout>>) -> Self {
        BuildingTemplate { name: name.into(), portal_layout }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn portal_layout(&self) -> Option<&Arc<PortalLayout>> { self.portal_layout.as_ref() }
}

/// Interior cell of a building. Positions inside it are in the building's model space.
pub struct Cell {
    id: u64,
    cell_number: u32,
    building: Weak<Building>,
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell").field("id", &self.id).field("cell_number", &self.cell_number).finish()
    }
}

impl Cell {
    pub fn id(&self) -> u64 { self.id }
    pub fn cell_number(&self) -> u32 { self.cell_number }

    pub fn owning_building(&self) -> Option<Arc<Building>> {
        self.building.upgrade()
    }
}

/// Placed instance of a template.
#[derive(Debug)]
pub struct Building {
    id: u64,
    template: Arc<BuildingTemplate>,
    transform: Transform,
    cells: Vec<Arc<Cell>>,
}

impl Building {
    /// One cell per interior floor of the template's layout.
    pub fn new(id: u64, template: Arc<BuildingTemplate>, transform: Transform) -> Arc<Self> {
        let numbers: Vec<u32> = template
            .portal_layout()
            .map(|layout| layout.cell_numbers().filter(|n| *n != 0).collect())
            .unwrap_or_default();
        Self::with_cells(id, template, transform, &numbers)
    }

    /// Explicit cell numbering, independent of the template's layout.
    pub fn with_cells(id: u64, template: Arc<BuildingTemplate>, transform: Transform, cell_numbers: &[u32]) -> Arc<Self> {
        Arc::new_cyclic(|weak| Building {
            id,
            template,
            transform,
            cells: cell_numbers
                .iter()
                .map(|&n| Arc::new(Cell { id: (id << 16) | n as u64, cell_number: n, building: weak.clone() }))
                .collect(),
        })
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn template(&self) -> &BuildingTemplate { &self.template }
    pub fn transform(&self) -> &Transform { &self.transform }
    pub fn cells(&self) -> &[Arc<Cell>] { &self.cells }

    pub fn cell_by_number(&self, n: u32) -> Option<Arc<Cell>> {
        self.cells.iter().find(|c| c.cell_number == n).cloned()
    }

    pub fn to_model_space(&self, world: Vec3) -> Vec3 {
        self.transform.to_model_space(world)
    }

    pub fn to_world(&self, model: Vec3) -> Vec3 {
        self.transform.from_model_space(model)
    }
}
