//! Edit session: current image, undo/redo snapshots and a dirty flag.
//!
//! The filters never see a session. A host owns one [`EditSession`] per open
//! document and routes operations through it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::buffer::ImageBuffer;
use crate::error::Result;
use crate::ops::Operation;

/// Notified after an operation completes successfully.
pub trait CompletionObserver {
    fn on_complete(&self, result: &ImageBuffer, elapsed: Duration);
}

impl<F> CompletionObserver for F
where
    F: Fn(&ImageBuffer, Duration),
{
    fn on_complete(&self, result: &ImageBuffer, elapsed: Duration) {
        self(result, elapsed)
    }
}

#[derive(Debug, Clone)]
pub struct EditSession {
    current: ImageBuffer,
    undo: VecDeque<ImageBuffer>,
    redo: Vec<ImageBuffer>,
    dirty: bool,
    history_limit: Option<usize>,
}

impl EditSession {
    pub fn new(image: ImageBuffer) -> Self {
        Self {
            current: image,
            undo: VecDeque::new(),
            redo: Vec::new(),
            dirty: false,
            history_limit: None,
        }
    }

    /// Keep at most `limit` undo snapshots; the oldest are dropped first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self.trim_history();
        self
    }

    pub fn current(&self) -> &ImageBuffer {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Record that the current image has been persisted by the host.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Start a new document. History is discarded.
    pub fn replace(&mut self, image: ImageBuffer) {
        self.current = image;
        self.undo.clear();
        self.redo.clear();
        self.dirty = false;
    }

    /// Run `op` on the current image. On error the session is left as it was.
    pub fn apply(&mut self, op: &Operation) -> Result<Duration> {
        let processed = op.apply(&self.current)?;
        self.commit(processed.image);
        Ok(processed.elapsed)
    }

    /// Like [`apply`](Self::apply), then notify `observer` with the new image.
    pub fn apply_observed(
        &mut self,
        op: &Operation,
        observer: &dyn CompletionObserver,
    ) -> Result<Duration> {
        let elapsed = self.apply(op)?;
        observer.on_complete(&self.current, elapsed);
        Ok(elapsed)
    }

    /// Commit the result of an arbitrary transform of the current image.
    ///
    /// Used for operations that need more than one input, such as summing with
    /// a second image.
    pub fn apply_with<F>(&mut self, f: F) -> Result<Duration>
    where
        F: FnOnce(&ImageBuffer) -> Result<ImageBuffer>,
    {
        let start = Instant::now();
        let image = f(&self.current)?;
        let elapsed = start.elapsed();
        self.commit(image);
        Ok(elapsed)
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, previous);
        self.redo.push(current);
        self.dirty = true;
        trace!("undo: {} left, {} redoable", self.undo.len(), self.redo.len());
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, next);
        self.undo.push_back(current);
        self.dirty = true;
        trace!("redo: {} left, {} undoable", self.redo.len(), self.undo.len());
        true
    }

    fn commit(&mut self, image: ImageBuffer) {
        let previous = std::mem::replace(&mut self.current, image);
        self.undo.push_back(previous);
        self.redo.clear();
        self.dirty = true;
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if let Some(limit) = self.history_limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
                debug!("history limit {limit} reached, dropped oldest snapshot");
            }
        }
    }
}
