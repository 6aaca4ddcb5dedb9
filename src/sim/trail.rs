//! Fixed-length point trail
//!
//! Points are stored oldest first. The buffer is allocated once and reused
//! when the owning particle is recycled.

use std::collections::VecDeque;

use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Trail {
    length: usize,
    points: VecDeque<Vec2>,
}

impl Trail {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            points: VecDeque::with_capacity(length),
        }
    }

    /// Max number of points kept
    pub fn length(&self) -> usize {
        self.length
    }

    /// Change the length and drop all points (used on recycle)
    pub fn reset(&mut self, length: usize) {
        self.length = length;
        self.points.clear();
        self.points.reserve(length);
    }

    /// Append a new head point, dropping the oldest past `length`
    pub fn update(&mut self, head: Vec2) {
        if self.length == 0 {
            return;
        }
        while self.points.len() >= self.length {
            self.points.pop_front();
        }
        self.points.push_back(head);
    }

    /// Drop the oldest point
    pub fn shorten(&mut self) {
        self.points.pop_front();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Newest point
    pub fn head(&self) -> Option<Vec2> {
        self.points.back().copied()
    }

    /// Points from oldest to newest
    pub fn points(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.points.iter().copied()
    }
}
