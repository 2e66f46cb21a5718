//! Doors: groups of colored edges attached to and detached from cells as a unit.

use super::{Edge, EdgeColor, Side, World};
use crate::error::WorldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DoorId(pub u32);

/// One face of a door, owned by cell `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorWall {
    pub x: i32,
    pub y: i32,
    pub edge: Edge,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Door {
    walls: Vec<DoorWall>,
}
impl Door {
    pub fn new() -> Door {
        Door::default()
    }

    pub fn with_wall(mut self, x: i32, y: i32, side: Side, color: EdgeColor) -> Door {
        //! Adds the face on `side` of cell `(x, y)`, facing into that cell.
        self.walls.push(DoorWall { x, y, edge: Edge { segment: side.segment(x, y), color } });
        self
    }

    pub fn barrier(x: i32, y: i32, side: Side, color: EdgeColor) -> Door {
        //! A door blocking both ways across `side` of cell `(x, y)`.
        let (dx, dy) = side.offset();
        Door::new()
            .with_wall(x, y, side, color)
            .with_wall(x + dx, y + dy, side.opposite(), color)
    }

    #[inline]
    pub fn walls(&self) -> &[DoorWall] {
        &self.walls
    }
}

impl World {
    pub fn register_door(&mut self, door: Door) -> Result<DoorId, WorldError> {
        //! Takes ownership of a door description. The door starts open.
        if let Some(wall) = door.walls.iter().find(|w| self.cell(w.x, w.y).is_none()) {
            return Err(self.out_of_bounds(wall.x, wall.y));
        }
        let id = DoorId(self.next_door);
        self.next_door += 1;
        self.doors.insert(id, door);
        Ok(id)
    }

    #[inline]
    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(&id)
    }
    pub fn doors(&self) -> impl Iterator<Item = (DoorId, &Door)> + '_ {
        self.doors.iter().map(|(id, door)| (*id, door))
    }

    fn door_walls(&self, id: DoorId) -> Result<Vec<DoorWall>, WorldError> {
        self.doors.get(&id).map(|d| d.walls.clone()).ok_or(WorldError::UnknownDoor(id))
    }

    pub fn close_door(&mut self, id: DoorId) -> Result<(), WorldError> {
        //! Attaches every face of the door. Closing a closed door changes nothing.
        for wall in self.door_walls(id)? {
            self.add_door_edge(wall.x, wall.y, wall.edge)?;
        }
        Ok(())
    }

    pub fn open_door(&mut self, id: DoorId) -> Result<(), WorldError> {
        for wall in self.door_walls(id)? {
            self.remove_door_edge(wall.x, wall.y, &wall.edge)?;
        }
        Ok(())
    }

    pub fn toggle_door(&mut self, id: DoorId) -> Result<bool, WorldError> {
        //! Returns whether the door is closed afterwards.
        if self.door_is_closed(id)? {
            self.open_door(id)?;
            Ok(false)
        } else {
            self.close_door(id)?;
            Ok(true)
        }
    }

    pub fn door_is_closed(&self, id: DoorId) -> Result<bool, WorldError> {
        //! A door is closed when all of its faces are attached.
        let door = self.doors.get(&id).ok_or(WorldError::UnknownDoor(id))?;
        Ok(door.walls.iter().all(|w| self.door_edge_exists(w.x, w.y, &w.edge)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broad::EntityColor;
    use crate::narrow::Aabb;
    use crate::Vec2;

    fn corridor() -> World {
        World::new(4, 1).unwrap()
    }

    #[test]
    fn barrier_faces_both_cells() {
        let door = Door::barrier(1, 0, Side::Right, EdgeColor::Neutral);
        assert_eq!(door.walls().len(), 2);
        assert_eq!((door.walls()[1].x, door.walls()[1].y), (2, 0));
        assert!(door.walls()[0].edge.normal().x < 0.0);
        assert!(door.walls()[1].edge.normal().x > 0.0);
    }

    #[test]
    fn closing_twice_does_not_duplicate() {
        let mut world = corridor();
        let id = world.register_door(Door::barrier(1, 0, Side::Right, EdgeColor::Red)).unwrap();
        assert!(!world.door_is_closed(id).unwrap());

        world.close_door(id).unwrap();
        let count = world.cell(1, 0).unwrap().edges().count();
        assert!(world.door_is_closed(id).unwrap());

        world.close_door(id).unwrap();
        assert!(world.door_is_closed(id).unwrap());
        assert_eq!(world.cell(1, 0).unwrap().edges().count(), count);
        assert_eq!(world.cell(1, 0).unwrap().door_edges().len(), 1);
    }

    #[test]
    fn toggling_opens_and_closes() {
        let mut world = corridor();
        let id = world.register_door(Door::barrier(1, 0, Side::Right, EdgeColor::Red)).unwrap();
        let probe = Aabb::new(Vec2::new(1.5, 0.2), Vec2::new(2.5, 0.8)).unwrap();
        let base = world.edges_in_aabb(&probe, EntityColor::Enemy).len();

        assert!(world.toggle_door(id).unwrap());
        assert_eq!(world.edges_in_aabb(&probe, EntityColor::Enemy).len(), base + 2);
        assert_eq!(world.edges_in_aabb(&probe, EntityColor::Red).len(), base);

        assert!(!world.toggle_door(id).unwrap());
        assert_eq!(world.edges_in_aabb(&probe, EntityColor::Enemy).len(), base);
    }

    #[test]
    fn unknown_and_out_of_range_doors() {
        let mut world = corridor();
        assert_eq!(world.close_door(DoorId(7)), Err(WorldError::UnknownDoor(DoorId(7))));
        // the far face would land outside the grid
        assert!(world.register_door(Door::barrier(3, 0, Side::Right, EdgeColor::Neutral)).is_err());
        assert_eq!(world.doors().count(), 0);
    }
}
