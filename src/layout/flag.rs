use serde::Serialize;

use crate::date_math::{DateMath, DateUnit};
use crate::model::{Milestone, ViewMode};
use crate::render::{Point, Rect};

use super::LayoutContext;

/// Flags hang from a fixed line just under the header.
const FLAG_TOP: f64 = 60.0;
const LABEL_OFFSET: f64 = 12.0;

/// A milestone drawn as a vertical line with a pennant on top.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    pub milestone_index: usize,
    pub line: Rect,
    /// Empty for invalid milestones, which only get their line.
    pub pennant: Vec<Point>,
    pub label_anchor: Point,
    pub invalid: bool,
}

impl Flag {
    pub fn layout(
        milestone: &Milestone,
        milestone_index: usize,
        ctx: &LayoutContext,
        dm: &impl DateMath,
    ) -> Self {
        let scale = &ctx.scale;
        let cw = scale.column_width;
        let date = dm.start_of(milestone.date, scale.calendar_granularity());
        let x = scale.hours_to_px(dm.diff(date, scale.gantt_start, DateUnit::Hour) as f64);
        let width = match scale.view_mode {
            ViewMode::Week => cw / 21.0,
            ViewMode::Month | ViewMode::Max => {
                cw / dm.days_in_month(dm.start_of(milestone.date, DateUnit::Day)) as f64 / 2.0
            }
            _ => cw / 7.0,
        };
        let height = ctx.row_height() * ctx.rows_drawn as f64 + ctx.header_height
            + ctx.padding / 2.0
            - FLAG_TOP;
        let line = Rect::new(x, FLAG_TOP, width, height);

        let pennant = if milestone.invalid {
            Vec::new()
        } else {
            vec![
                Point::new(x, FLAG_TOP),
                Point::new(x - 3.0, FLAG_TOP - 6.0),
                Point::new(x + width / 2.0, FLAG_TOP - 16.0),
                Point::new(x + width + 3.0, FLAG_TOP - 6.0),
                Point::new(x + width, FLAG_TOP),
            ]
        };

        Self {
            milestone_index,
            line,
            pennant,
            label_anchor: Point::new(x + LABEL_OFFSET, FLAG_TOP),
            invalid: milestone.invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::FixedDateMath;
    use crate::layout::TimeScale;
    use crate::model::{GanttOptions, MilestoneInput, Project, TaskInput};

    fn dm() -> FixedDateMath {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        FixedDateMath::new(now)
    }

    fn flag(mode: ViewMode, milestone: MilestoneInput) -> Flag {
        let project = Project::ingest(
            vec![TaskInput::new("a", "2024-01-01", "2024-01-03")],
            vec![milestone],
            &dm(),
        );
        let options = GanttOptions::default().with_view_mode(mode);
        let scale = TimeScale::compute(mode, &project.tasks, 1200.0, &dm()).unwrap();
        let ctx = LayoutContext::new(&options, scale, project.tasks.len(), &dm());
        Flag::layout(&project.milestones[0], 0, &ctx, &dm())
    }

    #[test]
    fn day_view_flag_sits_on_the_milestone_day() {
        let f = flag(ViewMode::Day, MilestoneInput::new("release", "2024-01-02 15:00"));
        assert_eq!(f.line.x, 16.0 * 38.0);
        assert_eq!(f.line.y, 60.0);
        assert_eq!(f.line.width, 38.0 / 7.0);
        // one row: 38 + 50 + 9 - 60
        assert_eq!(f.line.height, 37.0);
        assert_eq!(f.pennant.len(), 5);
        assert_eq!(f.label_anchor.x, f.line.x + 12.0);
    }

    #[test]
    fn week_and_month_flags_are_thinner() {
        let week = flag(ViewMode::Week, MilestoneInput::new("m", "2024-01-02"));
        assert_eq!(week.line.width, 140.0 / 21.0);
        let month = flag(ViewMode::Month, MilestoneInput::new("m", "2024-02-10"));
        assert_eq!(month.line.width, 120.0 / 29.0 / 2.0);
    }

    #[test]
    fn invalid_milestone_has_no_pennant() {
        let f = flag(
            ViewMode::Day,
            MilestoneInput {
                date: None,
                ..MilestoneInput::new("m", "")
            },
        );
        assert!(f.invalid);
        assert!(f.pennant.is_empty());
        // defaulted to today
        assert_eq!(f.line.x, 16.0 * 38.0);
    }
}
