//! Occupancy grid snapshots
//!
//! This module provides the costmap snapshot a recovery behavior scans for
//! free space, plus a shared, live-updatable costmap that hosts can hand to
//! behaviors as a costmap service.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::common::types::{Point2D, Pose2D};
use crate::error::GridError;
use crate::interfaces::CostmapProvider;

/// Cost values for different types of cells
pub mod cost_values {
    pub const LETHAL_OBSTACLE: u8 = 254;
    pub const INSCRIBED_INFLATED_OBSTACLE: u8 = 253;
    pub const MEDIUM_COST: u8 = 128;
    pub const NO_COST: u8 = 0;
    pub const UNKNOWN_COST: u8 = 255;
}

/// An occupancy grid snapshot in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    pub width: usize,
    pub height: usize,
    pub resolution: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub data: Vec<u8>,
}

impl OccupancyGrid {
    /// Create a grid with every cell free
    pub fn new(width: usize, height: usize, resolution: f64, origin_x: f64, origin_y: f64) -> Self {
        OccupancyGrid {
            width,
            height,
            resolution,
            origin_x,
            origin_y,
            data: vec![cost_values::NO_COST; width * height],
        }
    }

    /// Wrap raw cost data, checking it matches the declared geometry
    pub fn from_data(
        width: usize,
        height: usize,
        resolution: f64,
        origin_x: f64,
        origin_y: f64,
        data: Vec<u8>,
    ) -> Result<Self, GridError> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(GridError::InvalidResolution(resolution));
        }
        if data.len() != width * height {
            return Err(GridError::SizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(OccupancyGrid {
            width,
            height,
            resolution,
            origin_x,
            origin_y,
            data,
        })
    }

    /// World-space extent of the grid: (min_x, max_x, min_y, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            self.origin_x + self.width as f64 * self.resolution,
            self.origin_y,
            self.origin_y + self.height as f64 * self.resolution,
        )
    }

    /// Whether a world point lies inside the grid's spatial bounds (edges included)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (min_x, max_x, min_y, max_y) = self.bounds();
        x >= min_x && x <= max_x && y >= min_y && y <= max_y
    }

    /// Convert world coordinates to map coordinates
    pub fn world_to_map(&self, x: f64, y: f64) -> (i64, i64) {
        let grid_x = ((x - self.origin_x) / self.resolution).floor() as i64;
        let grid_y = ((y - self.origin_y) / self.resolution).floor() as i64;
        (grid_x, grid_y)
    }

    /// Convert map coordinates to the world coordinate of the cell's lower corner
    pub fn map_to_world(&self, grid_x: usize, grid_y: usize) -> (f64, f64) {
        (
            self.origin_x + grid_x as f64 * self.resolution,
            self.origin_y + grid_y as f64 * self.resolution,
        )
    }

    /// Row-major index of a cell, if it is on the grid and backed by data
    pub fn index(&self, grid_x: i64, grid_y: i64) -> Option<usize> {
        if grid_x < 0 || grid_y < 0 || grid_x >= self.width as i64 || grid_y >= self.height as i64 {
            return None;
        }
        let index = grid_y as usize * self.width + grid_x as usize;
        (index < self.data.len()).then_some(index)
    }

    /// Get the cost at a specific position in map coordinates
    pub fn get_cost_map(&self, grid_x: i64, grid_y: i64) -> u8 {
        match self.index(grid_x, grid_y) {
            Some(index) => self.data[index],
            None => cost_values::UNKNOWN_COST,
        }
    }

    /// Get the cost at a specific position in world coordinates
    pub fn get_cost(&self, x: f64, y: f64) -> u8 {
        let (grid_x, grid_y) = self.world_to_map(x, y);
        self.get_cost_map(grid_x, grid_y)
    }

    /// Set the cost of a cell; off-grid cells are ignored
    pub fn set_cost_map(&mut self, grid_x: i64, grid_y: i64, cost: u8) {
        if let Some(index) = self.index(grid_x, grid_y) {
            self.data[index] = cost;
        }
    }

    /// Mark the cell containing a world point as a lethal obstacle
    pub fn mark_obstacle(&mut self, x: f64, y: f64) {
        let (grid_x, grid_y) = self.world_to_map(x, y);
        self.set_cost_map(grid_x, grid_y, cost_values::LETHAL_OBSTACLE);
    }

    /// Check if a point is an obstacle. Off-grid points count as obstacles.
    pub fn is_obstacle(&self, x: f64, y: f64) -> bool {
        self.get_cost(x, y) >= cost_values::INSCRIBED_INFLATED_OBSTACLE
    }

    /// All free cells (cost exactly zero) whose corner lies within `radius` of the pose
    pub fn gather_free_points(&self, pose: &Pose2D, radius: f64) -> Vec<Point2D> {
        let center = pose.position();
        let mut results = Vec::new();
        for i in 0..self.width {
            for j in 0..self.height {
                let Some(index) = self.index(i as i64, j as i64) else {
                    continue;
                };
                let (x, y) = self.map_to_world(i, j);
                let point = Point2D::new(x, y);
                if nalgebra::distance(&point, &center) <= radius
                    && self.data[index] == cost_values::NO_COST
                {
                    results.push(point);
                }
            }
        }
        results
    }
}

/// A costmap shared between the host that updates it and the behaviors that read it
#[derive(Debug, Clone)]
pub struct SharedCostmap {
    grid: Arc<RwLock<OccupancyGrid>>,
}

impl SharedCostmap {
    pub fn new(grid: OccupancyGrid) -> Self {
        SharedCostmap {
            grid: Arc::new(RwLock::new(grid)),
        }
    }

    /// Replace the current grid
    pub fn update(&self, grid: OccupancyGrid) -> Result<(), String> {
        let mut current = self
            .grid
            .write()
            .map_err(|_| "Failed to lock shared costmap".to_string())?;
        *current = grid;
        Ok(())
    }

    /// Mutate the current grid in place
    pub fn modify<F: FnOnce(&mut OccupancyGrid)>(&self, f: F) -> Result<(), String> {
        let mut current = self
            .grid
            .write()
            .map_err(|_| "Failed to lock shared costmap".to_string())?;
        f(&mut current);
        Ok(())
    }

    /// Copy of the current grid, or `None` if the lock is poisoned
    pub fn snapshot(&self) -> Option<OccupancyGrid> {
        self.grid.read().ok().map(|grid| grid.clone())
    }

    /// Check a world point against the live grid
    pub fn is_obstacle(&self, x: f64, y: f64) -> Result<bool, String> {
        let grid = self
            .grid
            .read()
            .map_err(|_| "Failed to lock shared costmap".to_string())?;
        Ok(grid.is_obstacle(x, y))
    }
}

impl CostmapProvider for SharedCostmap {
    // Reads are in-process and never wait on the timeout.
    fn fetch(&self, _timeout: Duration) -> Option<OccupancyGrid> {
        self.snapshot()
    }
}
