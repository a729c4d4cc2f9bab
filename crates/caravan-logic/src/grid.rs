//! Grid coordinate system for wagon storage.
//!
//! A wagon bed is a `width × height × length` block of cubic cells hanging
//! off a rigid body that can sit at any orientation. `GridFrame` maps between
//! world space and cells for one snapshot of that body's transform;
//! `GridLayout` holds the body-local description and produces a fresh frame
//! whenever the body moves.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (*self - *other).length()
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

/// Unit quaternion describing a body orientation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `angle` radians about `axis` (right-handed).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// Rotation about the vertical axis.
    pub fn from_yaw(angle: f32) -> Self {
        Self::from_axis_angle(Vec3::UP, angle)
    }

    /// Inverse of a unit quaternion (its conjugate).
    pub fn inverse(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(&v) * 2.0;
        v + t * self.w + q.cross(&t)
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;
    /// Hamilton product: `a * b` applies `b` first, then `a`.
    fn mul(self, b: Self) -> Self {
        let a = self;
        Self {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }
}

/// Integer cell address. Transient; computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Last cell covered by a footprint of `size` starting here.
    pub fn opposite_corner(&self, size: GridSize) -> Self {
        self.offset(size.x - 1, size.y - 1, size.z - 1)
    }
}

/// Extent in cells, used both for whole grids and module footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self::UNIT
    }
}

impl GridSize {
    pub const UNIT: Self = Self { x: 1, y: 1, z: 1 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Footprint after a quarter turn about the vertical axis.
    pub fn rotated(&self) -> Self {
        Self::new(self.z, self.y, self.x)
    }

    pub fn oriented(&self, rotation: ModuleRotation) -> Self {
        match rotation {
            ModuleRotation::Deg0 => *self,
            ModuleRotation::Deg90 => self.rotated(),
        }
    }

    pub fn volume(&self) -> i64 {
        self.x.max(0) as i64 * self.y.max(0) as i64 * self.z.max(0) as i64
    }

    /// Whether `cell` lies inside a grid of this extent.
    pub fn contains(&self, cell: GridCell) -> bool {
        (0..self.x).contains(&cell.x) && (0..self.y).contains(&cell.y) && (0..self.z).contains(&cell.z)
    }

    /// Whether a footprint of `size` at `origin` lies fully inside.
    pub fn fits(&self, origin: GridCell, size: GridSize) -> bool {
        self.contains(origin) && self.contains(origin.opposite_corner(size))
    }
}

/// Quarter-turn rotation of a module about the vertical axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleRotation {
    #[default]
    Deg0,
    Deg90,
}

impl ModuleRotation {
    pub fn toggled(self) -> Self {
        match self {
            ModuleRotation::Deg0 => ModuleRotation::Deg90,
            ModuleRotation::Deg90 => ModuleRotation::Deg0,
        }
    }

    pub fn is_rotated(self) -> bool {
        self == ModuleRotation::Deg90
    }

    pub fn yaw_radians(self) -> f32 {
        match self {
            ModuleRotation::Deg0 => 0.0,
            ModuleRotation::Deg90 => std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Body-local box the grid is centred under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Body-local grid description. Produces a [`GridFrame`] per transform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridLayout {
    pub size: GridSize,
    pub cell_size: f32,
    pub reference: Bounds,
}

impl GridLayout {
    /// Frame for the body's current transform. The grid is centred under the
    /// reference volume horizontally and starts at its base.
    pub fn frame_at(&self, body_position: Vec3, body_rotation: Quat) -> GridFrame {
        let half_width = self.size.x as f32 * self.cell_size * 0.5;
        let half_length = self.size.z as f32 * self.cell_size * 0.5;
        let local_origin = self.reference.center
            + Vec3::new(-half_width, -self.reference.half_extents.y, -half_length);

        GridFrame {
            origin: body_position + body_rotation.rotate(local_origin),
            cell_size: self.cell_size,
            rotation: body_rotation,
            size: self.size,
        }
    }
}

/// World ↔ grid mapping for one body transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub origin: Vec3,
    pub cell_size: f32,
    pub rotation: Quat,
    pub size: GridSize,
}

impl GridFrame {
    /// Cell enclosing `world`. Floors each axis so negative local
    /// coordinates land in the correct cell.
    pub fn world_to_grid(&self, world: Vec3) -> GridCell {
        let local = self.rotation.inverse().rotate(world - self.origin);
        GridCell::new(
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
            (local.z / self.cell_size).floor() as i32,
        )
    }

    /// World position of the centre of `cell`.
    pub fn grid_to_world(&self, cell: GridCell) -> Vec3 {
        let local = Vec3::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
            (cell.z as f32 + 0.5) * self.cell_size,
        );
        self.origin + self.rotation.rotate(local)
    }

    /// World position of the minimum corner of `cell`.
    pub fn cell_corner(&self, cell: GridCell) -> Vec3 {
        let local = Vec3::new(
            cell.x as f32 * self.cell_size,
            cell.y as f32 * self.cell_size,
            cell.z as f32 * self.cell_size,
        );
        self.origin + self.rotation.rotate(local)
    }

    /// World position of the centre of a footprint, for previews.
    pub fn footprint_center(&self, origin: GridCell, size: GridSize) -> Vec3 {
        let local = Vec3::new(
            (origin.x as f32 + size.x as f32 * 0.5) * self.cell_size,
            (origin.y as f32 + size.y as f32 * 0.5) * self.cell_size,
            (origin.z as f32 + size.z as f32 * 0.5) * self.cell_size,
        );
        self.origin + self.rotation.rotate(local)
    }

    pub fn is_valid(&self, cell: GridCell) -> bool {
        self.size.contains(cell)
    }

    pub fn can_fit(&self, origin: GridCell, size: GridSize) -> bool {
        self.size.fits(origin, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        GridLayout {
            size: GridSize::new(4, 3, 6),
            cell_size: 0.5,
            reference: Bounds {
                center: Vec3::new(0.0, 1.0, 0.0),
                half_extents: Vec3::new(1.0, 0.75, 1.5),
            },
        }
    }

    fn all_cells(size: GridSize) -> impl Iterator<Item = GridCell> {
        (0..size.x).flat_map(move |x| {
            (0..size.y).flat_map(move |y| (0..size.z).map(move |z| GridCell::new(x, y, z)))
        })
    }

    #[test]
    fn test_round_trip_identity() {
        let frame = layout().frame_at(Vec3::ZERO, Quat::IDENTITY);
        for cell in all_cells(frame.size) {
            assert_eq!(frame.world_to_grid(frame.grid_to_world(cell)), cell);
        }
    }

    #[test]
    fn test_round_trip_tilted_body() {
        let tilt = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.3), 0.4) * Quat::from_yaw(2.1);
        let frame = layout().frame_at(Vec3::new(12.0, -3.0, 40.5), tilt);
        for cell in all_cells(frame.size) {
            assert_eq!(frame.world_to_grid(frame.grid_to_world(cell)), cell);
        }
    }

    #[test]
    fn test_origin_centered_under_reference() {
        let frame = layout().frame_at(Vec3::ZERO, Quat::IDENTITY);
        // 4 cells * 0.5 wide => half width 1.0; 6 * 0.5 long => half length 1.5
        assert!((frame.origin.x + 1.0).abs() < 1e-5);
        assert!((frame.origin.y - 0.25).abs() < 1e-5);
        assert!((frame.origin.z + 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_frame_follows_moved_body() {
        let layout = layout();
        let before = layout.frame_at(Vec3::ZERO, Quat::IDENTITY);
        let after = layout.frame_at(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY);
        let world = before.grid_to_world(GridCell::new(1, 1, 1));
        // Same world point, different cell once the body has moved
        assert_ne!(after.world_to_grid(world), GridCell::new(1, 1, 1));
        assert_eq!(
            after.world_to_grid(world + Vec3::new(10.0, 0.0, 0.0)),
            GridCell::new(1, 1, 1)
        );
    }

    #[test]
    fn test_negative_local_floors() {
        let frame = layout().frame_at(Vec3::ZERO, Quat::IDENTITY);
        let just_outside = frame.origin + Vec3::new(-0.01, 0.1, 0.1);
        assert_eq!(frame.world_to_grid(just_outside), GridCell::new(-1, 0, 0));
    }

    #[test]
    fn test_yaw_quarter_turn_maps_axes() {
        let q = Quat::from_yaw(std::f32::consts::FRAC_PI_2);
        let v = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(v.x.abs() < 1e-5);
        assert!((v.z + 1.0).abs() < 1e-5);
        let back = q.inverse().rotate(v);
        assert!((back.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_validity_and_fit() {
        let size = GridSize::new(4, 3, 6);
        assert!(size.contains(GridCell::new(3, 2, 5)));
        assert!(!size.contains(GridCell::new(4, 0, 0)));
        assert!(!size.contains(GridCell::new(0, -1, 0)));
        assert!(size.fits(GridCell::new(2, 0, 4), GridSize::new(2, 1, 2)));
        assert!(!size.fits(GridCell::new(3, 0, 4), GridSize::new(2, 1, 2)));
    }

    #[test]
    fn test_double_rotation_restores_extents() {
        let footprint = GridSize::new(2, 1, 3);
        let rotation = ModuleRotation::Deg0;
        assert_eq!(footprint.oriented(rotation.toggled()), GridSize::new(3, 1, 2));
        assert_eq!(footprint.oriented(rotation.toggled().toggled()), footprint);
        assert_eq!(footprint.rotated().rotated(), footprint);
    }
}
