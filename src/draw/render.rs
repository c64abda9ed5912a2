//! Cairo-backed [`Renderer`] used on screen and for PNG/SVG export.

use super::color::Color;
use super::font::{FontDescriptor, label_layout};
use super::renderer::Renderer;
use crate::diagram::{FiniteState, Transition};
use crate::geometry::Coordinate;
use log::debug;
use std::f64::consts::TAU;

/// Gap between the two rings of a final state.
const FINAL_RING_GAP: f64 = 6.0;
/// Arrowhead length along the edge.
const ARROW_LENGTH: f64 = 8.0;
/// Arrowhead width across the edge.
const ARROW_WIDTH: f64 = 10.0;
/// Distance kept between a transition label and its edge.
const LABEL_PADDING: f64 = 5.0;

/// Stroke and font settings for a [`CairoRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub line_width: f64,
    pub font: FontDescriptor,
    /// Label font size in points
    pub font_size: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            font: FontDescriptor::default(),
            font_size: 20.0,
        }
    }
}

/// Draws diagrams onto any Cairo surface (image, SVG, window).
pub struct CairoRenderer {
    ctx: cairo::Context,
    style: RenderStyle,
}

impl CairoRenderer {
    pub fn new(ctx: cairo::Context, style: RenderStyle) -> Self {
        Self { ctx, style }
    }

    pub fn context(&self) -> &cairo::Context {
        &self.ctx
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    fn paint_state(
        &self,
        state: &FiniteState,
        color: Color,
        show_caret: bool,
    ) -> Result<(), cairo::Error> {
        let ctx = &self.ctx;
        let center = state.coordinate();
        ctx.save()?;
        color.apply(ctx);
        ctx.set_line_width(self.style.line_width);

        ctx.new_path();
        ctx.arc(center.x, center.y, state.radius(), 0.0, TAU);
        ctx.stroke()?;

        if state.is_final() {
            let inner = (state.radius() - FINAL_RING_GAP).max(0.0);
            ctx.new_path();
            ctx.arc(center.x, center.y, inner, 0.0, TAU);
            ctx.stroke()?;
        }

        self.paint_label(&state.text, center, None, show_caret)?;
        ctx.restore()
    }

    fn paint_transition(
        &self,
        transition: &Transition,
        color: Color,
        show_caret: bool,
    ) -> Result<(), cairo::Error> {
        let ctx = &self.ctx;
        ctx.save()?;
        color.apply(ctx);
        ctx.set_line_width(self.style.line_width);

        ctx.new_path();
        if transition.is_curved() {
            let arc = transition.arc();
            let (start, end) = (transition.from_angle(), transition.to_angle());
            if transition.is_reversed() {
                ctx.arc_negative(arc.center.x, arc.center.y, arc.radius, start, end);
            } else {
                ctx.arc(arc.center.x, arc.center.y, arc.radius, start, end);
            }
        } else {
            let from = transition.from_coord();
            let to = transition.to_coord();
            ctx.move_to(from.x, from.y);
            ctx.line_to(to.x, to.y);
        }
        ctx.stroke()?;

        let (tip, direction) = transition.arrow_head();
        let [tip, left, right] = arrowhead_points(tip, direction);
        ctx.new_path();
        ctx.move_to(tip.x, tip.y);
        ctx.line_to(left.x, left.y);
        ctx.line_to(right.x, right.y);
        ctx.close_path();
        ctx.fill()?;

        let label = transition.label_anchor();
        self.paint_label(&transition.text, label.position, Some(label.angle), show_caret)?;
        ctx.restore()
    }

    /// Draws a label centered on `anchor`, or pushed away from it along
    /// `angle` for transition labels.
    fn paint_label(
        &self,
        text: &str,
        anchor: Coordinate,
        angle: Option<f64>,
        show_caret: bool,
    ) -> Result<(), cairo::Error> {
        if text.is_empty() && !show_caret {
            return Ok(());
        }

        let ctx = &self.ctx;
        let layout = label_layout(ctx, &self.style.font, self.style.font_size, text);
        let (_ink, logical) = layout.pixel_extents();
        let width = logical.width() as f64;
        let height = logical.height() as f64;

        let center = match angle {
            Some(angle) => label_position(anchor, angle, width, height),
            None => anchor,
        };
        let left = (center.x - width / 2.0).round();
        let top = (center.y - height / 2.0).round();

        ctx.move_to(left, top);
        pangocairo::functions::show_layout(ctx, &layout);

        if show_caret {
            let caret = layout.index_to_pos(text.len() as i32);
            let x = left + caret.x() as f64 / pango::SCALE as f64 + 1.0;
            let y = top + caret.y() as f64 / pango::SCALE as f64;
            let h = caret.height() as f64 / pango::SCALE as f64;
            ctx.new_path();
            ctx.move_to(x, y);
            ctx.line_to(x, y + h);
            ctx.stroke()?;
        }
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn clear(&mut self) -> bool {
        let ctx = &self.ctx;
        let cleared = ctx.save().and_then(|_| {
            ctx.set_operator(cairo::Operator::Clear);
            let painted = ctx.paint();
            ctx.restore()?;
            painted
        });
        match cleared {
            Ok(()) => true,
            Err(err) => {
                debug!("Failed to clear surface: {err}");
                false
            }
        }
    }

    fn draw_background(&mut self, color: Color) {
        color.apply(&self.ctx);
        let _ = self.ctx.paint(); // Ignore errors - a failed fill leaves the cleared surface
    }

    fn draw_state(&mut self, state: &FiniteState, color: Color, show_caret: bool) -> bool {
        match self.paint_state(state, color, show_caret) {
            Ok(()) => true,
            Err(err) => {
                debug!("Failed to draw state {}: {err}", state.id());
                false
            }
        }
    }

    fn draw_transition(
        &mut self,
        transition: &Transition,
        color: Color,
        show_caret: bool,
    ) -> bool {
        match self.paint_transition(transition, color, show_caret) {
            Ok(()) => true,
            Err(err) => {
                debug!("Failed to draw transition {}: {err}", transition.id());
                false
            }
        }
    }
}

/// Tip and the two back corners of a filled arrowhead pointing along
/// `direction`.
pub fn arrowhead_points(tip: Coordinate, direction: f64) -> [Coordinate; 3] {
    let forward = Coordinate::from_angle(direction);
    let side = forward.perpendicular() * (ARROW_WIDTH / 2.0);
    let base = tip - forward * ARROW_LENGTH;
    [tip, base + side, base - side]
}

/// Center of a `width` x `height` label placed next to `anchor` on the side
/// `angle` points to.
///
/// The box slides around the anchor so that its nearest corner or edge
/// touches the padding circle, which keeps labels off the edge for every
/// direction.
pub fn label_position(anchor: Coordinate, angle: f64, width: f64, height: f64) -> Coordinate {
    let (sin, cos) = angle.sin_cos();
    let corner_x = (width / 2.0 + LABEL_PADDING) * if cos > 0.0 { 1.0 } else { -1.0 };
    let corner_y = (height / 2.0 + LABEL_PADDING) * if sin > 0.0 { 1.0 } else { -1.0 };
    let slide = sin * sin.abs().powi(40) * corner_x - cos * cos.abs().powi(10) * corner_y;
    Coordinate::new(
        anchor.x + corner_x - sin * slide,
        anchor.y + corner_y + cos * slide,
    )
}
