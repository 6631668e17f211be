use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::graph::DependencyGraph;
use crate::layout::{BarArena, BarUpdate, LayoutContext};
use crate::model::{Project, TaskKind};
use crate::render::Rect;

use super::snap::snap_delta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragMode {
    Idle,
    Dragging,
    ResizingLeft,
    ResizingRight,
    ResizingProgress,
}

/// The part of a bar a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitRegion {
    Body,
    LeftHandle,
    RightHandle,
    ProgressHandle,
}

impl HitRegion {
    pub fn drag_mode(self) -> DragMode {
        match self {
            HitRegion::Body => DragMode::Dragging,
            HitRegion::LeftHandle => DragMode::ResizingLeft,
            HitRegion::RightHandle => DragMode::ResizingRight,
            HitRegion::ProgressHandle => DragMode::ResizingProgress,
        }
    }
}

/// Bars and arrows changed by one pointer move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub bars: Vec<usize>,
    pub arrows: Vec<usize>,
}

impl MoveOutcome {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty() && self.arrows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Origin {
    rect: Rect,
    progress_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Gesture {
    mode: DragMode,
    anchor: usize,
    anchor_kind: TaskKind,
    start_x: f64,
    /// Anchor first, then its transitive dependents in discovery order.
    affected: Vec<usize>,
    origins: Vec<Origin>,
    delta: f64,
}

impl Gesture {
    fn follows_anchor(&self, bars: &BarArena, index: usize) -> bool {
        index == self.anchor || bars.get(index).is_some_and(|b| b.kind == self.anchor_kind)
    }
}

/// A gesture that ended with a non-zero delta.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedGesture {
    pub mode: DragMode,
    pub anchor: usize,
    /// Every bar the gesture covered, including ones a rejected tick left in place.
    pub affected: Vec<usize>,
}

/// Pointer-driven move and resize state machine over a [`BarArena`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragController {
    gesture: Option<Gesture>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DragMode {
        self.gesture.as_ref().map_or(DragMode::Idle, |g| g.mode)
    }

    pub fn is_idle(&self) -> bool {
        self.gesture.is_none()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.gesture.as_ref().map(|g| g.anchor)
    }

    /// Bars taking part in the current gesture.
    pub fn affected(&self) -> &[usize] {
        match &self.gesture {
            Some(g) => &g.affected,
            None => &[],
        }
    }

    /// Starts a gesture on bar `anchor`. Ignored unless idle and the bar is valid.
    pub fn begin(
        &mut self,
        region: HitRegion,
        anchor: usize,
        pointer_x: f64,
        bars: &BarArena,
        project: &Project,
        graph: &DependencyGraph,
    ) -> bool {
        if self.gesture.is_some() {
            trace!(anchor, "pointer down ignored, gesture in progress");
            return false;
        }
        let (Some(bar), Some(task)) = (bars.get(anchor), project.tasks.get(anchor)) else {
            return false;
        };
        if bar.invalid {
            trace!(anchor, "pointer down on invalid bar ignored");
            return false;
        }

        let mut affected = vec![anchor];
        if region != HitRegion::ProgressHandle {
            affected.extend(
                graph
                    .all_transitive_dependents(&task.id)
                    .iter()
                    .filter_map(|id| project.task_index(id))
                    .filter(|&i| i != anchor && bars.get(i).is_some_and(|b| !b.invalid)),
            );
        }
        let origins = affected
            .iter()
            .filter_map(|&i| bars.get(i))
            .map(|b| Origin {
                rect: b.rect,
                progress_width: b.progress_width,
            })
            .collect();

        let mode = region.drag_mode();
        debug!(?mode, anchor, affected = affected.len(), "gesture started");
        self.gesture = Some(Gesture {
            mode,
            anchor,
            anchor_kind: bar.kind.clone(),
            start_x: pointer_x,
            affected,
            origins,
            delta: 0.0,
        });
        true
    }

    /// Applies the pointer position to every affected bar; returns bars that changed.
    pub fn update(&mut self, pointer_x: f64, bars: &mut BarArena, ctx: &LayoutContext) -> Vec<usize> {
        let Some(gesture) = self.gesture.as_mut() else {
            return Vec::new();
        };
        let dx = pointer_x - gesture.start_x;
        let mut changed = Vec::new();

        if gesture.mode == DragMode::ResizingProgress {
            gesture.delta = dx;
            let origin = gesture.origins[0].progress_width;
            if bars.set_progress_width(gesture.anchor, origin + dx).is_some() {
                changed.push(gesture.anchor);
            }
            return changed;
        }

        let d = snap_delta(dx, &ctx.scale);
        gesture.delta = d;
        trace!(dx, snapped = d, mode = ?gesture.mode, "drag tick");

        for (slot, &index) in gesture.affected.iter().enumerate() {
            let origin = gesture.origins[slot].rect;
            let is_anchor = index == gesture.anchor;
            let update = match gesture.mode {
                DragMode::ResizingLeft if is_anchor => {
                    BarUpdate::x_and_width(origin.x + d, origin.width - d)
                }
                DragMode::ResizingLeft => continue,
                DragMode::ResizingRight if is_anchor => BarUpdate::width(origin.width + d),
                DragMode::ResizingRight | DragMode::Dragging => {
                    if !gesture.follows_anchor(bars, index) {
                        continue;
                    }
                    BarUpdate::x(origin.x + d)
                }
                DragMode::Idle | DragMode::ResizingProgress => continue,
            };
            if bars.update_position(index, update, ctx).is_applied() {
                changed.push(index);
            }
        }
        changed
    }

    /// Ends the gesture. `None` when the pointer came back to a zero delta.
    pub fn finish(&mut self) -> Option<FinishedGesture> {
        let gesture = self.gesture.take()?;
        if gesture.delta == 0.0 {
            debug!(anchor = gesture.anchor, "gesture ended without movement");
            return None;
        }
        debug!(mode = ?gesture.mode, anchor = gesture.anchor, affected = gesture.affected.len(), "gesture committed");
        Some(FinishedGesture {
            mode: gesture.mode,
            anchor: gesture.anchor,
            affected: gesture.affected,
        })
    }

    /// Abandons the gesture and restores every affected bar; returns the restored bars.
    pub fn cancel(&mut self, bars: &mut BarArena, ctx: &LayoutContext) -> Vec<usize> {
        let Some(gesture) = self.gesture.take() else {
            return Vec::new();
        };
        debug!(anchor = gesture.anchor, "gesture cancelled");
        for (&index, origin) in gesture.affected.iter().zip(&gesture.origins) {
            bars.restore(index, origin.rect, origin.progress_width, ctx);
        }
        gesture.affected
    }
}
