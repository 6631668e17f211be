//! Elbowed dependency arrows between bars.

use std::fmt::Write as _;

use serde::Serialize;

use crate::render::Point;

use super::bar::{Bar, BarArena};

const ARROWHEAD_SIZE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArrowPath {
    pub commands: Vec<PathCommand>,
}

impl ArrowPath {
    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
    }

    /// Two short strokes back from `tip`.
    fn arrowhead(&mut self, tip: Point) {
        self.line_to(tip.x - ARROWHEAD_SIZE, tip.y - ARROWHEAD_SIZE);
        self.move_to(tip.x, tip.y);
        self.line_to(tip.x - ARROWHEAD_SIZE, tip.y + ARROWHEAD_SIZE);
    }

    /// Polylines between successive `MoveTo`s.
    pub fn segments(&self) -> Vec<Vec<Point>> {
        let mut out: Vec<Vec<Point>> = Vec::new();
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) => out.push(vec![*p]),
                PathCommand::LineTo(p) => match out.last_mut() {
                    Some(current) => current.push(*p),
                    None => out.push(vec![*p]),
                },
            }
        }
        out
    }

    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            let (op, p) = match cmd {
                PathCommand::MoveTo(p) => ('M', p),
                PathCommand::LineTo(p) => ('L', p),
            };
            let _ = write!(d, "{op} {} {}", p.x, p.y);
        }
        d
    }
}

/// A dependency edge: `from` must finish before `to` starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrow {
    /// Bar index of the dependency.
    pub from: usize,
    /// Bar index of the dependent task.
    pub to: usize,
    pub path: ArrowPath,
}

impl Arrow {
    pub fn touches(&self, bar: usize) -> bool {
        self.from == bar || self.to == bar
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowRouter {
    pub padding: f64,
}

impl ArrowRouter {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    /// Routes from the right-center of `from` to the left-center of `to`.
    pub fn route(&self, from: &Bar, to: &Bar) -> ArrowPath {
        let start = Point::new(from.end_x(), from.rect.center_y());
        let end = Point::new(to.x(), to.rect.center_y());
        let half = self.padding / 2.0;
        let mut path = ArrowPath::default();
        path.move_to(start.x, start.y);

        if end.x - start.x >= self.padding {
            let mid_x = start.x + (end.x - start.x) / 2.0;
            path.line_to(mid_x, start.y);
            path.line_to(mid_x, end.y);
        } else {
            // not enough room: leave, drop under both bars, come back in from the left
            let below = from.rect.bottom().max(to.rect.bottom()) + half;
            path.line_to(start.x + half, start.y);
            path.line_to(start.x + half, below);
            path.line_to(end.x - half, below);
            path.line_to(end.x - half, end.y);
        }
        path.line_to(end.x, end.y);
        path.arrowhead(end);
        path
    }

    /// One arrow per resolved dependency edge, in bar order.
    pub fn route_all(&self, bars: &BarArena) -> Vec<Arrow> {
        let mut arrows = Vec::new();
        for (to, bar) in bars.iter().enumerate() {
            for &from in &bar.dependencies {
                if let Some(dep) = bars.get(from) {
                    arrows.push(Arrow {
                        from,
                        to,
                        path: self.route(dep, bar),
                    });
                }
            }
        }
        arrows
    }

    /// Reroutes every arrow touching one of `changed`; returns their indices.
    pub fn reroute(&self, arrows: &mut [Arrow], bars: &BarArena, changed: &[usize]) -> Vec<usize> {
        let mut touched = Vec::new();
        for (i, arrow) in arrows.iter_mut().enumerate() {
            if !changed.iter().any(|&b| arrow.touches(b)) {
                continue;
            }
            if let (Some(from), Some(to)) = (bars.get(arrow.from), bars.get(arrow.to)) {
                arrow.path = self.route(from, to);
                touched.push(i);
            }
        }
        touched
    }
}
