use super::state::WizardState;

/// The five pages of the provisioning flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Start,
    Plan,
    Os,
    Keys,
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [Step::Start, Step::Plan, Step::Os, Step::Keys, Step::Review];

    pub fn path(self) -> &'static str {
        match self {
            Step::Start => "/create/start",
            Step::Plan => "/create/plan",
            Step::Os => "/create/os",
            Step::Keys => "/create/ssh-keys",
            Step::Review => "/create/review",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Start => "Hostnames & region",
            Step::Plan => "Plan",
            Step::Os => "Operating system",
            Step::Keys => "SSH keys",
            Step::Review => "Review",
        }
    }

    /// 1-based position for the progress header.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    /// Whether the state already holds what this step is for. Keys is
    /// optional, so it never blocks later steps; Review produces the
    /// request itself.
    fn completed(self, state: &WizardState) -> bool {
        match self {
            Step::Start => state.step1_complete(),
            Step::Plan => state.plan_complete(),
            Step::Os => state.os_selected(),
            Step::Keys => true,
            Step::Review => true,
        }
    }

    /// A step may be entered once every earlier step is complete. This
    /// is monotonic by construction: losing any earlier step's output
    /// closes every later step, on either plan branch.
    pub fn can_enter(self, state: &WizardState) -> bool {
        Step::ALL
            .iter()
            .take_while(|step| **step != self)
            .all(|step| step.completed(state))
    }
}

/// Where a precondition failure sends the operator: the first step
/// whose output is still missing. Never forward of the failed step.
pub fn resume_point(state: &WizardState) -> Step {
    Step::ALL
        .into_iter()
        .find(|step| !step.completed(state))
        .unwrap_or(Step::Review)
}
