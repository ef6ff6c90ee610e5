//! Undo/redo history that doubles as the outbound edit log.

use super::{Command, CommandKind, CommandResult};
use crate::props::{Props, PropsExt};
use crate::scene::Scene;
use crate::shapes::ObjectId;
use crate::sync::{ClientMessage, ProtocolResult};
use serde_json::Value;
use std::collections::VecDeque;

/// A pushed command and whether it has been announced as final.
#[derive(Debug, Clone)]
struct Entry {
    command: Command,
    committed: bool,
}

/// Local edit history.
///
/// Commands are applied as soon as they are pushed. Uncommitted edits of the
/// same objects and keys coalesce, so a drag becomes one undo step. Every
/// state change queues a [`ClientMessage`] for the server; collect them with
/// [`CommandStack::take_outgoing`].
#[derive(Debug, Clone, Default)]
pub struct CommandStack {
    /// Applied commands, oldest first.
    undo_stack: Vec<Entry>,
    /// Undone commands, most recently undone first.
    redo_stack: VecDeque<Entry>,
    /// Messages waiting to be sent.
    outgoing: Vec<ClientMessage>,
    /// Undo history limit; 0 keeps everything.
    max_depth: usize,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// History limited to `max_depth` undo steps (0 for unlimited).
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    fn send(&mut self, message: ClientMessage) {
        self.outgoing.push(message);
    }

    /// Apply `command`, then record it.
    ///
    /// A `ShapeEdit` that merges into the previous uncommitted edit is not
    /// recorded separately; the merged edit is announced again instead.
    /// Otherwise the previous command is committed before this one is
    /// appended. With `autocommit` the command is committed right away.
    pub fn push(
        &mut self,
        scene: &mut Scene,
        command: Command,
        autocommit: bool,
    ) -> CommandResult<()> {
        self.redo_stack.clear();
        let mut command = command;
        command.redo(scene)?;

        let merged = self
            .undo_stack
            .last_mut()
            .is_some_and(|last| !last.committed && last.command.merge(&command));

        if merged {
            log::debug!("Merged {} into previous edit", command.kind());
            self.send(command.redo_message());
        } else {
            self.commit();
            log::debug!("Pushed {}", command.kind());
            self.undo_stack.push(Entry {
                command,
                committed: false,
            });
            self.trim();
        }

        if autocommit {
            self.commit();
        }
        Ok(())
    }

    fn trim(&mut self) {
        if self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
        }
    }

    /// Commit the most recent command. Committing twice sends one message.
    pub fn commit(&mut self) {
        let Some(last) = self.undo_stack.last_mut() else {
            return;
        };
        if last.committed {
            return;
        }
        last.committed = true;
        let message = last.command.redo_message();
        log::debug!("Committed {}", last.command.kind());
        self.send(message);
    }

    /// Push an edit of `ids` to `props`, reading the previous values from the
    /// first object. Nothing happens for an empty id list.
    pub fn edit(
        &mut self,
        scene: &mut Scene,
        ids: &[ObjectId],
        props: Props,
        autocommit: bool,
    ) -> CommandResult<bool> {
        let Some(first) = ids.first() else {
            return Ok(false);
        };
        let before = scene.get(first)?.props().subset(props.keys());
        self.push(scene, Command::edit(ids.to_vec(), before, props), autocommit)?;
        Ok(true)
    }

    /// Revert the most recent command. Returns whether there was one.
    pub fn undo(&mut self, scene: &mut Scene) -> CommandResult<bool> {
        let Some(mut entry) = self.undo_stack.pop() else {
            return Ok(false);
        };
        entry.committed = true;
        // Keyframe commands give up their saved keyframe when undone.
        let message = entry.command.undo_message();
        let result = entry.command.undo(scene);
        log::debug!("Undo {}", entry.command.kind());
        self.redo_stack.push_front(entry);
        result?;
        self.send(message);
        Ok(true)
    }

    /// Re-apply the most recently undone command. Returns whether there was one.
    pub fn redo(&mut self, scene: &mut Scene) -> CommandResult<bool> {
        let Some(mut entry) = self.redo_stack.pop_front() else {
            return Ok(false);
        };
        if let Err(err) = entry.command.redo(scene) {
            self.redo_stack.push_front(entry);
            return Err(err);
        }
        log::debug!("Redo {}", entry.command.kind());
        self.send(entry.command.redo_message());
        self.undo_stack.push(entry);
        Ok(true)
    }

    /// Apply an edit received from the server.
    ///
    /// Only the forward effect runs; the undo and redo lists are untouched.
    pub fn apply_remote(
        &self,
        scene: &mut Scene,
        kind: &str,
        data: Value,
    ) -> ProtocolResult<Command> {
        let kind = CommandKind::from_name(kind)?;
        let mut command = Command::from_remote(kind, data)?;
        command.redo(scene)?;
        log::debug!("Applied remote {kind}");
        Ok(command)
    }

    /// Drain queued outbound messages.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Most recent command on the undo list.
    pub fn last(&self) -> Option<&Command> {
        self.undo_stack.last().map(|entry| &entry.command)
    }

    /// Whether the most recent command has been committed.
    pub fn is_last_committed(&self) -> bool {
        self.undo_stack.last().is_some_and(|entry| entry.committed)
    }
}
