//! Event types and sinks for observing matching and growth runs.
//!
//! This module defines [`ValencyEvent`] and a set of sinks to emit, collect, or forward
//! events while running a [`crate::matching::PatternMatcher`] or a
//! [`crate::growth::GrowthEngine`]. Sinks are optional; passing `&mut ()` disables
//! event construction entirely through [`EventSink::wants`].
use crate::growth::Termination;
use crate::rules::ModuleIndex;

/// Describes events emitted by the matcher and the growth engine.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum ValencyEvent {
    /// A full pattern match was discovered.
    MatchFound {
        pattern: String,
        pattern_index: usize,
        /// Node bound to each entry, in entry order.
        nodes: Vec<usize>,
    },

    /// An exclusive match took ownership of its active nodes.
    MatchClaimed {
        pattern: String,
        match_index: usize,
        nodes: Vec<usize>,
    },

    /// An exclusive match lost at least one active node to an earlier claim.
    MatchRejected {
        pattern: String,
        match_index: usize,
    },

    /// A pattern was excluded by the matcher's filter.
    PatternSkipped {
        pattern: String,
    },

    /// The growth engine placed a module.
    PlacementMade {
        index: usize,
        module: ModuleIndex,
        depth: u32,
        parent: Option<usize>,
    },

    /// An open socket could not be filled.
    BranchDied {
        parent: usize,
        socket_index: usize,
        depth: u32,
        /// Number of compatible candidates that were tried.
        candidates: usize,
    },

    /// Growth stopped.
    GrowthHalted {
        placed: usize,
        termination: Termination,
    },

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. pattern name, seed index).
        context: String,
        message: String,
    },
}

/// Discriminant of [`ValencyEvent`], used for pre-filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValencyEventKind {
    MatchFound,
    MatchClaimed,
    MatchRejected,
    PatternSkipped,
    PlacementMade,
    BranchDied,
    GrowthHalted,
    Warning,
}

impl ValencyEvent {
    pub fn kind(&self) -> ValencyEventKind {
        match self {
            ValencyEvent::MatchFound { .. } => ValencyEventKind::MatchFound,
            ValencyEvent::MatchClaimed { .. } => ValencyEventKind::MatchClaimed,
            ValencyEvent::MatchRejected { .. } => ValencyEventKind::MatchRejected,
            ValencyEvent::PatternSkipped { .. } => ValencyEventKind::PatternSkipped,
            ValencyEvent::PlacementMade { .. } => ValencyEventKind::PlacementMade,
            ValencyEvent::BranchDied { .. } => ValencyEventKind::BranchDied,
            ValencyEvent::GrowthHalted { .. } => ValencyEventKind::GrowthHalted,
            ValencyEvent::Warning { .. } => ValencyEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`ValencyEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: ValencyEvent);

    /// Whether events of `kind` should be built at all.
    #[inline]
    fn wants(&self, _kind: ValencyEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = ValencyEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ValencyEvent) {}

    #[inline]
    fn wants(&self, _kind: ValencyEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(ValencyEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(ValencyEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ValencyEvent),
{
    #[inline]
    fn send(&mut self, event: ValencyEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ValencyEvent>,
    only: Option<Vec<ValencyEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collects only the listed kinds.
    pub fn only(kinds: impl IntoIterator<Item = ValencyEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<ValencyEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ValencyEvent] {
        &self.events
    }

    pub fn count(&self, kind: ValencyEventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ValencyEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    #[inline]
    fn wants(&self, kind: ValencyEventKind) -> bool {
        self.only.as_ref().is_none_or(|only| only.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: ValencyEvent) {
        let kind = event.kind();
        let Some(last) = self.sinks.iter().rposition(|s| s.wants(kind)) else {
            return;
        };
        for sink in &mut self.sinks[..last] {
            if sink.wants(kind) {
                sink.send(event.clone());
            }
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: ValencyEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
