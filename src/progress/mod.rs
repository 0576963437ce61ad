//! Progress tracking with observer callbacks
//!
//! - [`ProgressTracker`] - Single `(current, total)` counter
//! - [`MultiStageProgressTracker`] - Ordered, weighted stages with overall percentage
//!
//! Both offer scoped use through guards. A guard is finished explicitly;
//! dropping it unfinished (early `?` return, panic) reports failure.

use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

/// Observer for single-stage progress: `(current, total, message, percentage)`
pub type ProgressCallback = Box<dyn FnMut(usize, usize, &str, f64) + Send>;

/// Observer for staged progress: `(stage_name, current_step, total_steps, overall_percent)`
///
/// `current_step` is 1-based.
pub type StageCallback = Box<dyn FnMut(&str, usize, usize, f64) + Send>;

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Running,
    Completed,
    Failed,
}

// ============================================================================
// Single-stage tracker
// ============================================================================

/// `(current, total)` progress counter
pub struct ProgressTracker {
    current: usize,
    total: usize,
    message: String,
    state: ProgressState,
    started_at: Instant,
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &self.current)
            .field("total", &self.total)
            .field("message", &self.message)
            .field("state", &self.state)
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total,
            message: String::new(),
            state: ProgressState::Running,
            started_at: Instant::now(),
            callback: None,
        }
    }

    #[must_use]
    pub fn with_callback(mut self, callback: impl FnMut(usize, usize, &str, f64) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != ProgressState::Running
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Percentage complete, 0 when `total` is 0
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    fn notify(&mut self) {
        let percentage = self.percentage();
        if let Some(callback) = self.callback.as_mut() {
            callback(self.current, self.total, &self.message, percentage);
        }
    }

    /// Set progress, clamped to `[0, total]`
    pub fn update(&mut self, current: usize, message: impl Into<String>) {
        self.current = current.min(self.total);
        self.message = message.into();
        self.notify();
    }

    /// Advance by one
    pub fn increment(&mut self, message: impl Into<String>) {
        self.update(self.current.saturating_add(1), message);
    }

    /// Mark done: `current = total`
    pub fn complete(&mut self, message: impl Into<String>) {
        self.current = self.total;
        self.message = message.into();
        self.state = ProgressState::Completed;
        self.notify();
    }

    /// Mark failed, keeping the current position
    pub fn fail(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.state = ProgressState::Failed;
        self.notify();
    }

    /// Back to zero and running
    pub fn reset(&mut self) {
        self.current = 0;
        self.message.clear();
        self.state = ProgressState::Running;
        self.started_at = Instant::now();
    }

    /// Reset and return a guard; see [`ProgressGuard`]
    pub fn scope(&mut self) -> ProgressGuard<'_> {
        self.reset();
        ProgressGuard { tracker: self }
    }
}

/// Scoped handle over a [`ProgressTracker`]
///
/// Call [`ProgressGuard::finish`] on success. Dropping the guard while the
/// tracker is still running reports failure.
pub struct ProgressGuard<'a> {
    tracker: &'a mut ProgressTracker,
}

impl ProgressGuard<'_> {
    /// Complete the tracker and release it
    pub fn finish(self, message: impl Into<String>) {
        self.tracker.complete(message);
    }
}

fn unfinished_message() -> &'static str {
    if std::thread::panicking() {
        "중단됨"
    } else {
        "완료되지 않음"
    }
}

impl Deref for ProgressGuard<'_> {
    type Target = ProgressTracker;

    fn deref(&self) -> &Self::Target {
        self.tracker
    }
}

impl DerefMut for ProgressGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tracker
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        if self.tracker.is_finished() {
            return;
        }
        self.tracker.fail(unfinished_message());
    }
}

// ============================================================================
// Multi-stage tracker
// ============================================================================

#[derive(Debug, Clone)]
struct Stage {
    name: String,
    weight: f64,
    local: f64,
    completed: bool,
}

/// Snapshot of a multi-stage tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStatus {
    /// Name of the running stage; `None` once all stages are done
    pub current_stage: Option<String>,
    /// 1-based index of the running stage (equal to `total_stages` when done)
    pub current_step: usize,
    pub total_stages: usize,
    pub overall_progress: f64,
    pub state: ProgressState,
    pub message: String,
    pub elapsed_secs: f64,
}

/// Ordered stages with relative weights
///
/// Weights are normalized, so `[1, 1, 1, 1, 1]` and `[20, 20, 20, 20, 20]`
/// behave the same.
pub struct MultiStageProgressTracker {
    stages: Vec<Stage>,
    total_weight: f64,
    index: usize,
    state: ProgressState,
    message: String,
    started_at: Instant,
    callback: Option<StageCallback>,
}

impl std::fmt::Debug for MultiStageProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiStageProgressTracker")
            .field("stages", &self.stages)
            .field("index", &self.index)
            .field("state", &self.state)
            .finish()
    }
}

impl MultiStageProgressTracker {
    /// Create from `(name, weight)` pairs; non-positive weights count as 0
    ///
    /// If every weight is 0 the stages are weighted equally.
    pub fn new<S: Into<String>>(stages: impl IntoIterator<Item = (S, f64)>) -> Self {
        let mut stages: Vec<Stage> = stages
            .into_iter()
            .map(|(name, weight)| Stage {
                name: name.into(),
                weight: if weight.is_finite() { weight.max(0.0) } else { 0.0 },
                local: 0.0,
                completed: false,
            })
            .collect();

        let mut total_weight: f64 = stages.iter().map(|s| s.weight).sum();
        if total_weight <= 0.0 {
            for stage in &mut stages {
                stage.weight = 1.0;
            }
            total_weight = stages.len() as f64;
        }

        let state = if stages.is_empty() {
            ProgressState::Completed
        } else {
            ProgressState::Running
        };

        Self {
            stages,
            total_weight,
            index: 0,
            state,
            message: String::new(),
            started_at: Instant::now(),
            callback: None,
        }
    }

    /// Equally weighted stages
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(|n| (n, 1.0)))
    }

    #[must_use]
    pub fn with_callback(mut self, callback: impl FnMut(&str, usize, usize, f64) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Attach an already boxed callback
    #[must_use]
    pub fn with_boxed_callback(mut self, callback: Option<StageCallback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    /// 0-based index of the running stage
    pub fn stage_index(&self) -> usize {
        self.index
    }

    pub fn current_stage_name(&self) -> Option<&str> {
        self.stages.get(self.index).map(|s| s.name.as_str())
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != ProgressState::Running
    }

    /// Normalized weight of stage `index`
    pub fn stage_weight(&self, index: usize) -> Option<f64> {
        self.stages.get(index).map(|s| s.weight / self.total_weight)
    }

    /// Overall percentage: completed stage weights plus the running stage's share
    pub fn overall_progress(&self) -> f64 {
        if self.stages.is_empty() {
            return 100.0;
        }

        let done: f64 = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                if stage.completed {
                    stage.weight
                } else if i == self.index {
                    stage.weight * stage.local
                } else {
                    0.0
                }
            })
            .sum();

        (done / self.total_weight * 100.0).clamp(0.0, 100.0)
    }

    fn notify(&mut self) {
        self.notify_stage(self.index);
    }

    /// Notify with stage `index` as the reported stage
    fn notify_stage(&mut self, index: usize) {
        let total = self.stages.len();
        let step = (index + 1).min(total);
        let overall = self.overall_progress();
        let name = self
            .stages
            .get(index)
            .or_else(|| self.stages.last())
            .map(|s| s.name.clone())
            .unwrap_or_default();

        tracing::debug!(stage = %name, step = step, total = total, overall = overall, message = %self.message, "Progress");

        if let Some(callback) = self.callback.as_mut() {
            callback(&name, step, total, overall);
        }
    }

    /// Announce the first stage
    pub fn start(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.started_at = Instant::now();
        self.notify();
    }

    /// Set the running stage's local fraction (clamped to `[0, 1]`)
    pub fn update_stage(&mut self, fraction: f64, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        if let Some(stage) = self.stages.get_mut(self.index) {
            stage.local = fraction;
        }
        self.message = message.into();
        self.notify();
    }

    /// Complete the running stage and move to the next
    ///
    /// Past the last stage the tracker is complete; further calls do nothing.
    pub fn next_stage(&mut self, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }

        if let Some(stage) = self.stages.get_mut(self.index) {
            stage.local = 1.0;
            stage.completed = true;
        }
        self.index += 1;
        if self.index >= self.stages.len() {
            self.index = self.stages.len();
            self.state = ProgressState::Completed;
        }

        self.message = message.into();
        self.notify();
    }

    /// Mark every stage complete (100%)
    ///
    /// The notification names the stage that was running, so a short-circuit
    /// reads as that stage finishing at 100%.
    pub fn complete_all(&mut self, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }

        let reported = self.index;
        for stage in &mut self.stages {
            stage.local = 1.0;
            stage.completed = true;
        }
        self.index = self.stages.len();
        self.state = ProgressState::Completed;
        self.message = message.into();
        self.notify_stage(reported);
    }

    /// Stop at the running stage and report failure
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        self.state = ProgressState::Failed;
        self.message = message.into();
        self.notify();
    }

    pub fn status(&self) -> StageStatus {
        StageStatus {
            current_stage: self.current_stage_name().map(String::from),
            current_step: (self.index + 1).min(self.stages.len()),
            total_stages: self.stages.len(),
            overall_progress: self.overall_progress(),
            state: self.state,
            message: self.message.clone(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }

    /// Start and return a guard; see [`StageGuard`]
    pub fn scope(&mut self, message: impl Into<String>) -> StageGuard<'_> {
        self.start(message);
        StageGuard { tracker: self }
    }
}

/// Scoped handle over a [`MultiStageProgressTracker`]
///
/// Call [`StageGuard::finish`] on success. Dropping the guard while the
/// tracker is still running reports failure at the current stage.
pub struct StageGuard<'a> {
    tracker: &'a mut MultiStageProgressTracker,
}

impl StageGuard<'_> {
    /// Complete all remaining stages and release the tracker
    pub fn finish(self, message: impl Into<String>) {
        self.tracker.complete_all(message);
    }
}

impl Deref for StageGuard<'_> {
    type Target = MultiStageProgressTracker;

    fn deref(&self) -> &Self::Target {
        self.tracker
    }
}

impl DerefMut for StageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tracker
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if self.tracker.is_finished() {
            return;
        }
        self.tracker.fail(unfinished_message());
    }
}
