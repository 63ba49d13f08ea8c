use std::path::Path;

use crate::error::ApproximatorError;
use crate::game::NUM_ACTIONS;

/// One value per move, in the order up, down, left, right.
pub type ActionValues = [f32; NUM_ACTIONS];

/// Opaque action-value function the agent learns through.
///
/// Calls take `&mut self` (or `&self`) so a predict can never run while a fit
/// is in flight on the same approximator.
pub trait QApproximator {
    /// Action values for one feature vector.
    fn predict(&self, features: &[f32]) -> Result<ActionValues, ApproximatorError>;

    /// One gradient step pulling `predict(features)` towards `target`.
    fn fit(&mut self, features: &[f32], target: &ActionValues) -> Result<(), ApproximatorError>;

    /// Persist weights into the directory `locator`.
    fn save(&self, locator: &Path) -> Result<(), ApproximatorError>;

    /// Replace the current weights with the ones stored in `locator`.
    /// Fails with [`ApproximatorError::NotFound`] when nothing is stored there.
    fn load(&mut self, locator: &Path) -> Result<(), ApproximatorError>;

    /// Number of `fit` calls applied so far.
    fn fit_steps(&self) -> usize {
        0
    }
}
