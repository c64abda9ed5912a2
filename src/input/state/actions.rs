use crate::config::Action;
use crate::draw::Renderer;
use crate::input::{events::Key, text};
use log::debug;

use super::{Drawer, DrawingState};

impl<R: Renderer> Drawer<R> {
    /// Processes a key press event.
    ///
    /// Handles:
    /// - Modifier key tracking
    /// - Label editing for the selected state or transition
    /// - Configurable actions (delete, deselect, script toggles, exports)
    pub fn on_key_press(&mut self, key: Key) {
        match key {
            Key::Shift => {
                self.modifiers.shift = true;
                return;
            }
            Key::Ctrl => {
                self.modifiers.ctrl = true;
                return;
            }
            Key::Alt => {
                self.modifiers.alt = true;
                return;
            }
            _ => {}
        }

        let editing = matches!(
            self.state,
            DrawingState::StateSelected(_) | DrawingState::TransitionSelected(_)
        );

        // While a label is being edited, plain typing keys are text, not shortcuts
        let should_check_actions = !editing
            || match key {
                Key::Char(_) | Key::Space | Key::Return | Key::Backspace => {
                    self.modifiers.is_command()
                }
                _ => true,
            };

        if should_check_actions
            && let Some(action) = key.binding_name().and_then(|name| self.find_action(&name))
        {
            self.handle_action(action);
            return;
        }

        if editing && !self.modifiers.is_command() {
            self.edit_label(key);
        }
    }

    /// Processes a key release event.
    ///
    /// Only modifier keys are tracked on release.
    pub fn on_key_release(&mut self, key: Key) {
        match key {
            Key::Shift => self.modifiers.shift = false,
            Key::Ctrl => self.modifiers.ctrl = false,
            Key::Alt => self.modifiers.alt = false,
            _ => {}
        }
    }

    /// Executes a bound action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::DeleteSelection => {
                if let Some(id) = self.selected_state() {
                    if self.machine.remove_state(id).is_some() {
                        self.mark_dirty();
                    }
                } else if let Some(id) = self.selected_transition() {
                    if self.machine.remove_transition(id).is_some() {
                        debug!("Removed transition {id}");
                        self.mark_dirty();
                    }
                } else {
                    return;
                }
                self.set_state(DrawingState::Idle);
            }
            Action::Deselect => {
                if matches!(self.state, DrawingState::Dragging(_)) {
                    self.cancel_drag();
                } else if self.state != DrawingState::Idle {
                    self.set_state(DrawingState::Idle);
                }
            }
            Action::ToggleSuperscript => {
                self.script_mode = self.script_mode.toggled(text::ScriptMode::Superscript);
            }
            Action::ToggleSubscript => {
                self.script_mode = self.script_mode.toggled(text::ScriptMode::Subscript);
            }
            Action::ExportPng | Action::ExportSvg | Action::ExportJson => {
                self.set_pending_action(action);
                // The host's save dialog may swallow the key releases
                self.modifiers = Default::default();
            }
        }
    }

    fn edit_label(&mut self, key: Key) {
        let mode = self.script_mode;
        let changed = match self.state {
            DrawingState::StateSelected(id) => self
                .machine
                .state_mut(id)
                .is_some_and(|state| text::apply_key(&mut state.text, key, mode)),
            DrawingState::TransitionSelected(id) => self
                .machine
                .transition_mut(id)
                .is_some_and(|transition| text::apply_key(&mut transition.text, key, mode)),
            _ => false,
        };
        if changed {
            self.mark_dirty();
        }
    }
}
