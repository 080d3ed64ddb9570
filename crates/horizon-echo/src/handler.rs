//! Routing tree events to the focused field.

use std::path::Path;

use horizon_echo_core::logging::targets;
use horizon_echo_core::{AccessibilityTree, NodeId, TreeEvent, TreeEventKind};

use crate::error::{EditingError, Result};
use crate::field::{EditableField, FieldKind};
use crate::settings::EditingSettings;
use crate::speech::{BrailleSink, SpeechSink};

/// Editing feedback for one focused editable field.
///
/// Created when the field gains focus and discarded when focus leaves it.
#[derive(Debug, Clone)]
pub struct TextEditHandler {
    node: NodeId,
    field: EditableField,
    settings: EditingSettings,
}

impl TextEditHandler {
    /// Create a handler for the editable field `node`.
    ///
    /// Fails with [`EditingError::NotEditable`] when `node` does not accept
    /// text input. Use [`create_for_node`](Self::create_for_node) when the
    /// node may not be editable.
    pub fn new(tree: &AccessibilityTree, node: NodeId, settings: EditingSettings) -> Result<Self> {
        let field = EditableField::new(tree, node, &settings)?;
        tracing::debug!(target: targets::DISPATCH, ?node, kind = ?field.kind(), "created edit handler");
        Ok(Self {
            node,
            field,
            settings,
        })
    }

    /// Create a handler for the editable region containing `node`, if any.
    pub fn create_for_node(tree: &AccessibilityTree, node: NodeId, settings: &EditingSettings) -> Option<Self> {
        let root = tree.editable_root(node)?;
        Self::new(tree, root, settings.clone()).ok()
    }

    /// The handled field node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The field variant.
    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }

    /// The field state.
    pub fn field(&self) -> &EditableField {
        &self.field
    }

    /// The settings in effect.
    pub fn settings(&self) -> &EditingSettings {
        &self.settings
    }

    /// Replace the settings in effect.
    pub fn set_settings(&mut self, settings: EditingSettings) {
        self.settings = settings;
    }

    /// Whether `event` concerns the handled field.
    fn accepts(&self, tree: &AccessibilityTree, event: &TreeEvent) -> bool {
        if !event.kind.is_editing_event() {
            return false;
        }
        let on_field = event.target == self.node
            || (self.kind() == FieldKind::RichText && tree.is_ancestor(self.node, event.target));
        let state = tree.state(self.node).unwrap_or_default();
        on_field && state.focused && state.editable
    }

    /// Produce feedback for `event`.
    ///
    /// Returns `Ok(false)` for events that do not concern the field, and
    /// [`EditingError::StaleNode`] once the field has left the tree.
    pub fn on_event(
        &mut self,
        tree: &AccessibilityTree,
        event: &TreeEvent,
        speech: &mut dyn SpeechSink,
        braille: &mut dyn BrailleSink,
    ) -> Result<bool> {
        if !tree.contains(self.node) {
            return Err(EditingError::StaleNode(self.node));
        }
        if !self.accepts(tree, event) {
            tracing::trace!(target: targets::DISPATCH, kind = ?event.kind, target = ?event.target, "ignoring event");
            return Ok(false);
        }
        self.field
            .on_update(tree, &event.intents, &self.settings, speech, braille)?;
        Ok(true)
    }
}

/// Keeps the handler for whichever editable field has focus.
#[derive(Debug, Clone, Default)]
pub struct EditingDispatcher {
    settings: EditingSettings,
    handler: Option<TextEditHandler>,
}

impl EditingDispatcher {
    /// Create a dispatcher with no focused field.
    pub fn new(settings: EditingSettings) -> Self {
        Self {
            settings,
            handler: None,
        }
    }

    /// Create a dispatcher with settings loaded from a TOML or JSON file.
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = EditingSettings::load(path)?;
        Ok(Self::new(settings))
    }

    /// The settings handed to new handlers.
    pub fn settings(&self) -> &EditingSettings {
        &self.settings
    }

    /// Replace the settings, including the current handler's.
    pub fn set_settings(&mut self, settings: EditingSettings) {
        if let Some(handler) = &mut self.handler {
            handler.set_settings(settings.clone());
        }
        self.settings = settings;
    }

    /// The handler for the focused field, if one is editable.
    pub fn handler(&self) -> Option<&TextEditHandler> {
        self.handler.as_ref()
    }

    /// Route one tree event.
    ///
    /// A focus event replaces the handler. Returns whether feedback was
    /// produced for the event.
    pub fn on_event(
        &mut self,
        tree: &AccessibilityTree,
        event: &TreeEvent,
        speech: &mut dyn SpeechSink,
        braille: &mut dyn BrailleSink,
    ) -> bool {
        if event.kind == TreeEventKind::Focus {
            let root = tree.editable_root(event.target);
            if self.handler.as_ref().map(TextEditHandler::node) != root {
                self.handler = TextEditHandler::create_for_node(tree, event.target, &self.settings);
                if self.handler.is_none() {
                    tracing::trace!(target: targets::DISPATCH, target = ?event.target, "focus left editable content");
                }
            }
        }

        let Some(handler) = &mut self.handler else {
            return false;
        };
        match handler.on_event(tree, event, speech, braille) {
            Ok(handled) => handled,
            Err(error) => {
                tracing::debug!(target: targets::DISPATCH, %error, "dropping edit handler");
                self.handler = None;
                false
            }
        }
    }
}
