use std::fmt;

/// Change notifications emitted after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEvent {
    Created { plan_id: String },
    Updated { plan_id: String },
    Deleted { plan_id: String },
    Activated { plan_id: String },
    /// `automatic` is set when plan creation demoted the plan to free a slot.
    Deactivated { plan_id: String, automatic: bool },
    Completed { plan_id: String },
    Opened { plan_id: String },
    DaysChanged { plan_id: String },
}

impl PlanEvent {
    pub fn plan_id(&self) -> &str {
        match self {
            Self::Created { plan_id }
            | Self::Updated { plan_id }
            | Self::Deleted { plan_id }
            | Self::Activated { plan_id }
            | Self::Deactivated { plan_id, .. }
            | Self::Completed { plan_id }
            | Self::Opened { plan_id }
            | Self::DaysChanged { plan_id } => plan_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<'a> = Box<dyn FnMut(&PlanEvent) + 'a>;

#[derive(Default)]
pub struct Listeners<'a> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<'a>)>,
}

impl<'a> Listeners<'a> {
    pub fn add(&mut self, listener: impl FnMut(&PlanEvent) + 'a) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &PlanEvent) {
        tracing::trace!(plan_id = event.plan_id(), ?event, listeners = self.entries.len(), "plan data changed");
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

impl fmt::Debug for Listeners<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
