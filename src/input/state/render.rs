use crate::diagram::{Endpoint, Transition, TransitionId};
use crate::draw::{Highlight, Renderer, render_diagram};
use crate::geometry::Circle;
use crate::session::DiagramDocument;
use crate::ticker::{TickDecision, TickReport};
use log::{debug, warn};
use std::time::Instant;

use super::{Drag, Drawer, DrawingState};

impl<R: Renderer> Drawer<R> {
    /// Element drawn in the selection color, and whether it shows a caret.
    pub fn highlight(&self) -> Highlight {
        let editing = matches!(
            self.state,
            DrawingState::StateSelected(_) | DrawingState::TransitionSelected(_)
        );
        Highlight {
            state: self.selected_state(),
            transition: self.selected_transition(),
            show_caret: editing && self.caret_visible,
        }
    }

    /// The transition a connect gesture would create if released now.
    ///
    /// The preview is never added to the diagram and carries a placeholder id.
    pub fn connect_preview(&self) -> Option<Transition> {
        let DrawingState::Dragging(Drag::Connect {
            from,
            start,
            current,
        }) = &self.state
        else {
            return None;
        };
        let to = self.endpoint_at(*current);
        let resolve = |endpoint: Endpoint| {
            self.machine
                .resolve_endpoint(endpoint)
                .unwrap_or_else(|| Circle::new(*current, 0.0))
        };
        let mut preview = Transition::new(
            TransitionId(0),
            *from,
            to,
            resolve(*from),
            resolve(to),
            self.settings.min_perpendicular_distance,
        );
        if preview.is_self_loop() {
            let drag = *current - *start;
            if drag.length() > 0.0 {
                preview.set_self_angle(drag.angle());
            }
        }
        Some(preview)
    }

    /// Draws a full frame: the diagram, then the connect preview on top.
    ///
    /// Returns `false` if any draw call failed.
    pub fn redraw(&mut self) -> bool {
        let highlight = self.highlight();
        let mut ok = render_diagram(
            &mut self.renderer,
            &self.machine,
            &self.settings.palette,
            highlight,
        );
        if let Some(preview) = self.connect_preview() {
            ok &= self
                .renderer
                .draw_transition(&preview, self.settings.palette.selected, false);
        }
        self.needs_redraw = false;
        ok
    }

    /// Runs one timer tick if it is due: blinks the caret, redraws and
    /// autosaves unsaved changes.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        match self.scheduler.poll(now) {
            TickDecision::Wait(remaining) => return TickReport::Waiting(remaining),
            TickDecision::Skip => return TickReport::Skipped,
            TickDecision::Run => {}
        }
        if !self.scheduler.begin(now) {
            return TickReport::Skipped;
        }

        self.caret_visible = !self.caret_visible;
        let drawn = self.redraw();
        if !drawn {
            debug!("Renderer reported a failed frame");
        }
        let saved = self.autosave();
        self.scheduler.finish();
        TickReport::Ran { drawn, saved }
    }

    fn autosave(&mut self) -> bool {
        if !self.unsaved || !self.settings.autosave {
            return false;
        }
        let Some(store) = self.store.as_mut() else {
            return false;
        };
        match store.save(&DiagramDocument::from_machine(&self.machine)) {
            Ok(()) => {
                self.unsaved = false;
                true
            }
            Err(err) => {
                warn!("Autosave failed: {err:#}");
                false
            }
        }
    }
}
