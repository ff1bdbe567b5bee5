//! The spatial tile index: a width×height grid of instance-id buckets.
//!
//! Rebuilt wholesale whenever the instance set changes; there is no
//! incremental move support. An id appears in at most one bucket, and that
//! bucket is always the one matching the instance's own coordinates.

use crate::model::InstanceId;

/// Grid occupancy index. Cells are addressed `(x, y)` with `0 <= x < width`,
/// `0 <= y < height`.
#[derive(Debug, Clone)]
pub struct TileIndex {
    width: u32,
    height: u32,
    buckets: Vec<Vec<InstanceId>>,
}

impl TileIndex {
    /// Allocate an all-empty grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buckets: vec![Vec::new(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Append an id to the bucket at `(x, y)`. Out-of-range coordinates are
    /// ignored; instance decoding upstream already rejects them.
    pub fn place(&mut self, id: InstanceId, x: u32, y: u32) {
        if let Some(bucket) = self.bucket_mut(x, y) {
            bucket.push(id);
        }
    }

    /// The ids occupying cell `(x, y)`, empty for out-of-range coordinates.
    pub fn bucket(&self, x: u32, y: u32) -> &[InstanceId] {
        self.index(x, y)
            .map(|i| self.buckets[i].as_slice())
            .unwrap_or(&[])
    }

    /// Total number of placed ids across all buckets.
    pub fn occupancy(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }

    fn bucket_mut(&mut self, x: u32, y: u32) -> Option<&mut Vec<InstanceId>> {
        self.index(x, y).map(move |i| &mut self.buckets[i])
    }
}
