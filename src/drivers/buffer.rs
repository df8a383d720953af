use std::collections::VecDeque;
/// Rolling history of power vectors, all aligned to the canonical axis.
pub struct SweepBuffer {
    rows: VecDeque<Vec<f64>>,
    capacity: usize,
}
impl SweepBuffer {
    /// A capacity of zero is bumped to one so the latest sweep is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn push(&mut self, power: Vec<f64>) {
        if self.rows.len() == self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back(power);
    }
    /// Copies of the newest `count` rows, oldest first.
    pub fn snapshot(&self, count: usize) -> Vec<Vec<f64>> {
        let skip = self.rows.len().saturating_sub(count);
        self.rows.iter().skip(skip).cloned().collect()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Vec<f64>> {
        self.rows.iter()
    }
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
