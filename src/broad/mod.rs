//! Broadphase data and logic module: the tile grid and its boundary edges.

pub mod door;

use crate::{config::Config, error::WorldError, narrow::{Aabb, Segment}, Fp, Vec2};
use door::{Door, DoorId};
use fnv::FnvBuildHasher;
use indexmap::IndexMap;

// ---------- Colors ---------- //

/// Which entities an edge stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeColor {
    Neutral,
    Red,
    Blue,
    Players,
    Enemies,
}

/// The channel an entity collides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityColor {
    Neutral,
    Red,
    Blue,
    Enemy,
}

impl EdgeColor {
    #[inline]
    pub fn blocks(self, entity: EntityColor) -> bool {
        match self {
            EdgeColor::Neutral => true,
            EdgeColor::Red => entity != EntityColor::Red,
            EdgeColor::Blue => entity != EntityColor::Blue,
            EdgeColor::Players => !matches!(entity, EntityColor::Red | EntityColor::Blue),
            EdgeColor::Enemies => entity != EntityColor::Enemy,
        }
    }
}

/// A one-sided colored boundary. Only the side its normal faces is solid to movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub segment: Segment,
    pub color: EdgeColor,
}
impl Edge {
    #[inline]
    pub fn new(start: Vec2, end: Vec2, color: EdgeColor) -> Edge {
        Edge { segment: Segment::new(start, end), color }
    }
    #[inline]
    pub fn normal(&self) -> Vec2 {
        self.segment.normal
    }
    #[inline]
    pub fn blocks(&self, entity: EntityColor) -> bool {
        self.color.blocks(entity)
    }
}

// ---------- Cells ---------- //

/// A side of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}
impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
            Side::Bottom => (0, -1),
            Side::Top => (0, 1),
        }
    }
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
        }
    }
    pub fn segment(self, x: i32, y: i32) -> Segment {
        //! Returns this side of cell `(x, y)`, directed so its normal faces into the cell.
        let (x0, y0) = (x as Fp, y as Fp);
        let (x1, y1) = (x0 + 1.0, y0 + 1.0);
        match self {
            Side::Left => Segment::new(Vec2::new(x0, y1), Vec2::new(x0, y0)),
            Side::Right => Segment::new(Vec2::new(x1, y0), Vec2::new(x1, y1)),
            Side::Bottom => Segment::new(Vec2::new(x0, y0), Vec2::new(x1, y0)),
            Side::Top => Segment::new(Vec2::new(x1, y1), Vec2::new(x0, y1)),
        }
    }
}

/// Tile type. Slopes are named after the corner their solid half fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Empty,
    Solid,
    SlopeBottomLeft,
    SlopeBottomRight,
    SlopeTopLeft,
    SlopeTopRight,
}
impl CellType {
    pub fn from_code(code: u8) -> Option<CellType> {
        match code {
            0 => Some(CellType::Empty),
            1 => Some(CellType::Solid),
            2 => Some(CellType::SlopeBottomLeft),
            3 => Some(CellType::SlopeBottomRight),
            4 => Some(CellType::SlopeTopLeft),
            5 => Some(CellType::SlopeTopRight),
            _ => None,
        }
    }
    pub fn code(self) -> u8 {
        match self {
            CellType::Empty => 0,
            CellType::Solid => 1,
            CellType::SlopeBottomLeft => 2,
            CellType::SlopeBottomRight => 3,
            CellType::SlopeTopLeft => 4,
            CellType::SlopeTopRight => 5,
        }
    }

    pub fn side_occupied(self, side: Side) -> bool {
        //! Whether solid matter covers the whole of `side`.
        use CellType::*;
        match (self, side) {
            (Empty, _) => false,
            (Solid, _) => true,
            (SlopeBottomLeft, s) => s == Side::Left || s == Side::Bottom,
            (SlopeBottomRight, s) => s == Side::Right || s == Side::Bottom,
            (SlopeTopLeft, s) => s == Side::Left || s == Side::Top,
            (SlopeTopRight, s) => s == Side::Right || s == Side::Top,
        }
    }
    #[inline]
    pub fn left_wall_occupied(self) -> bool {
        self.side_occupied(Side::Left)
    }
    #[inline]
    pub fn right_wall_occupied(self) -> bool {
        self.side_occupied(Side::Right)
    }
    #[inline]
    pub fn floor_occupied(self) -> bool {
        self.side_occupied(Side::Bottom)
    }
    #[inline]
    pub fn ceiling_occupied(self) -> bool {
        self.side_occupied(Side::Top)
    }

    pub fn diagonal(self, x: i32, y: i32) -> Option<Segment> {
        //! Returns the hypotenuse of a slope cell, wound clockwise about its solid half.
        let (x0, y0) = (x as Fp, y as Fp);
        let (x1, y1) = (x0 + 1.0, y0 + 1.0);
        match self {
            CellType::Empty | CellType::Solid => None,
            CellType::SlopeBottomLeft => Some(Segment::new(Vec2::new(x0, y1), Vec2::new(x1, y0))),
            CellType::SlopeBottomRight => Some(Segment::new(Vec2::new(x0, y0), Vec2::new(x1, y1))),
            CellType::SlopeTopLeft => Some(Segment::new(Vec2::new(x1, y1), Vec2::new(x0, y0))),
            CellType::SlopeTopRight => Some(Segment::new(Vec2::new(x1, y0), Vec2::new(x0, y1))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub kind: CellType,
    /// Derived from neighbor adjacency by `World::create_all_edges`.
    structural: Vec<Edge>,
    /// Overlaid by doors; survives edge regeneration.
    doors: Vec<Edge>,
}
impl Cell {
    fn new(x: i32, y: i32, kind: CellType) -> Cell {
        Cell { x, y, kind, structural: Vec::new(), doors: Vec::new() }
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.structural.iter().chain(self.doors.iter())
    }
    #[inline]
    pub fn structural_edges(&self) -> &[Edge] {
        &self.structural
    }
    #[inline]
    pub fn door_edges(&self) -> &[Edge] {
        &self.doors
    }
    #[inline]
    pub fn bounding_box(&self) -> Aabb {
        let min = Vec2::new(self.x as Fp, self.y as Fp);
        Aabb { min, max: min + Vec2::splat(1.0) }
    }
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as Fp + 0.5, self.y as Fp + 0.5)
    }
}

// ---------- World ---------- //

/// A fixed-size grid of unit cells, cell `(x, y)` covering `[x, x+1] × [y, y+1]` with y up.
#[derive(Debug, Clone)]
pub struct World {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    doors: IndexMap<DoorId, Door, FnvBuildHasher>,
    next_door: u32,
    config: Config,
}

impl World {
    pub fn new(width: i32, height: i32) -> Result<World, WorldError> {
        //! Creates an empty grid. Its only edges are the ones facing the grid's border.
        if width <= 0 || height <= 0 {
            return Err(WorldError::EmptyGrid);
        }
        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(x, y, CellType::Empty));
            }
        }
        let mut world = World {
            width,
            height,
            cells,
            doors: IndexMap::default(),
            next_door: 0,
            config: Config::default(),
        };
        world.create_all_edges();
        Ok(world)
    }

    pub fn from_codes(width: i32, height: i32, codes: &[u8]) -> Result<World, WorldError> {
        //! Builds a grid from per-cell type codes, row by row starting from the bottom row.
        let mut world = World::new(width, height)?;
        if codes.len() != world.cells.len() {
            return Err(WorldError::SizeMismatch { expected: world.cells.len(), actual: codes.len() });
        }
        for (cell, code) in world.cells.iter_mut().zip(codes.iter()) {
            cell.kind = CellType::from_code(*code).ok_or(WorldError::UnknownCellCode(*code))?;
        }
        world.create_all_edges();
        Ok(world)
    }

    pub fn with_config(mut self, config: Config) -> World {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb { min: Vec2::ZERO, max: Vec2::new(self.width as Fp, self.height as Fp) }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }
    fn out_of_bounds(&self, x: i32, y: i32) -> WorldError {
        WorldError::OutOfBounds { x, y, width: self.width, height: self.height }
    }

    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }
    #[inline]
    pub fn cell_type(&self, x: i32, y: i32) -> CellType {
        //! Out-of-range cells are solid.
        self.cell(x, y).map_or(CellType::Solid, |c| c.kind)
    }
    pub fn cell_at(&self, point: Vec2) -> (i32, i32) {
        //! Grid coordinates of the cell containing `point`, which may be out of range.
        (point.x.floor() as i32, point.y.floor() as i32)
    }
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn create_all_edges(&mut self) {
        //! Regenerates every cell's structural edges from its neighbors. Door edges are kept.
        for i in 0..self.cells.len() {
            let edges = self.derive_edges(self.cells[i].x, self.cells[i].y);
            self.cells[i].structural = edges;
        }
    }

    fn derive_edges(&self, x: i32, y: i32) -> Vec<Edge> {
        //! Structural edges of cell `(x, y)`: one along each open side that faces an occupied
        //! neighbor side, plus a slope's diagonal.
        let kind = self.cell_type(x, y);
        let mut edges = Vec::new();
        for side in Side::ALL.iter() {
            let (dx, dy) = side.offset();
            if !kind.side_occupied(*side) && self.cell_type(x + dx, y + dy).side_occupied(side.opposite()) {
                edges.push(Edge { segment: side.segment(x, y), color: EdgeColor::Neutral });
            }
        }
        if let Some(segment) = kind.diagonal(x, y) {
            edges.push(Edge { segment, color: EdgeColor::Neutral });
        }
        edges
    }

    fn cell_range(&self, aabb: &Aabb) -> Option<(i32, i32, i32, i32)> {
        //! Clamped inclusive cell range overlapped by `aabb`, if any.
        let x0 = (aabb.min.x.floor() as i32).max(0);
        let y0 = (aabb.min.y.floor() as i32).max(0);
        let x1 = (aabb.max.x.floor() as i32).min(self.width - 1);
        let y1 = (aabb.max.y.floor() as i32).min(self.height - 1);
        if x0 > x1 || y0 > y1 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }

    pub fn cells_in_aabb(&self, aabb: &Aabb) -> Vec<&Cell> {
        let mut found = Vec::new();
        if let Some((x0, y0, x1, y1)) = self.cell_range(aabb) {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    found.push(&self.cells[(y * self.width + x) as usize]);
                }
            }
        }
        found
    }

    pub fn edges_in_aabb(&self, aabb: &Aabb, color: EntityColor) -> Vec<Edge> {
        //! Collects every edge in the cells overlapped by `aabb` that blocks `color`.
        let mut found = Vec::new();
        for cell in self.cells_in_aabb(aabb) {
            found.extend(cell.edges().filter(|e| e.blocks(color)).copied());
        }
        found
    }

    // ---------- Mutators ---------- //

    pub fn set_cell_type(&mut self, x: i32, y: i32, kind: CellType) -> Result<(), WorldError> {
        //! Changes a cell's type and rederives the structural edges of it and its four
        //! neighbors. Door edges are kept.
        let i = self.index(x, y).ok_or_else(|| self.out_of_bounds(x, y))?;
        self.cells[i].kind = kind;
        for &(cx, cy) in [(x, y), (x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)].iter() {
            if let Some(j) = self.index(cx, cy) {
                let edges = self.derive_edges(cx, cy);
                self.cells[j].structural = edges;
            }
        }
        Ok(())
    }

    pub fn add_door_edge(&mut self, x: i32, y: i32, edge: Edge) -> Result<bool, WorldError> {
        //! Attaches a door edge to a cell. Returns false if it was already attached.
        let i = self.index(x, y).ok_or_else(|| self.out_of_bounds(x, y))?;
        let doors = &mut self.cells[i].doors;
        if doors.contains(&edge) {
            Ok(false)
        } else {
            doors.push(edge);
            Ok(true)
        }
    }

    pub fn remove_door_edge(&mut self, x: i32, y: i32, edge: &Edge) -> Result<bool, WorldError> {
        //! Detaches a door edge from a cell. Returns false if it wasn't attached.
        let i = self.index(x, y).ok_or_else(|| self.out_of_bounds(x, y))?;
        let doors = &mut self.cells[i].doors;
        let before = doors.len();
        doors.retain(|e| e != edge);
        Ok(doors.len() != before)
    }

    #[inline]
    pub fn door_edge_exists(&self, x: i32, y: i32, edge: &Edge) -> bool {
        self.cell(x, y).map_or(false, |c| c.doors.contains(edge))
    }
}
