use parking_lot::Mutex;
use promptlib_core::DuplicateResolver;
use promptlib_protocol::DuplicatePolicy;

/// Resolver answering a fixed policy and recording every question asked.
pub struct ScriptedResolver {
    policy: DuplicatePolicy,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedResolver {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Duplicate id lists passed to each `resolve` call, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

impl DuplicateResolver for ScriptedResolver {
    fn resolve(&self, duplicate_ids: &[String]) -> DuplicatePolicy {
        self.calls.lock().push(duplicate_ids.to_vec());
        self.policy
    }
}
