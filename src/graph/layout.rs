use rand::Rng;

use crate::models::Position;

/// Default per-axis scatter width. Offsets stay within half of it on each
/// side of the base point.
pub const DEFAULT_SPREAD: f64 = 5.0;

/// Perturb `base` independently on each axis by a uniform offset in
/// `[-spread/2, +spread/2]`.
pub fn scatter<R: Rng>(base: Position, spread: f64, rng: &mut R) -> Position {
    Position {
        x: base.x + (rng.gen::<f64>() - 0.5) * spread,
        y: base.y + (rng.gen::<f64>() - 0.5) * spread,
        z: base.z + (rng.gen::<f64>() - 0.5) * spread,
    }
}

/// Layout seam used by the turn factory.
pub trait Layout: Send + Sync {
    /// Place a new node relative to its parent, or to the origin for a
    /// parentless node.
    fn place_child(&self, parent: Option<Position>) -> Position;
}

/// Production layout: scatter around the parent with a thread-local rng.
#[derive(Debug, Clone)]
pub struct ScatterLayout {
    spread: f64,
}

impl ScatterLayout {
    pub fn new(spread: f64) -> Self {
        Self { spread }
    }
}

impl Default for ScatterLayout {
    fn default() -> Self {
        Self::new(DEFAULT_SPREAD)
    }
}

impl Layout for ScatterLayout {
    fn place_child(&self, parent: Option<Position>) -> Position {
        let base = parent.unwrap_or(Position::ORIGIN);
        scatter(base, self.spread, &mut rand::thread_rng())
    }
}
