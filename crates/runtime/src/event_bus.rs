use foundation::SubmissionId;

/// One recorded store mutation (or rejected mutation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in the log; strictly increasing.
    pub sequence: u64,
    pub submission: Option<SubmissionId>,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only record of what happened to the dashboard state, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct EventLog {
    next_sequence: u64,
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        submission: Option<SubmissionId>,
        kind: &'static str,
        message: impl Into<String>,
    ) {
        self.events.push(Event {
            sequence: self.next_sequence,
            submission,
            kind,
            message: message.into(),
        });
        self.next_sequence += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
