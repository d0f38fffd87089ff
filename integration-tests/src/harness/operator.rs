use haproxy_operator_core::model::{Event, ModelSnapshot};
use haproxy_operator_core::reconciler::{ReconcileOutcome, Reconciler};
use haproxy_operator_core::settings::OperatorSettings;
use haproxy_operator_core::testing::{FakeHaproxyService, MemoryFileSystem, apply_outcome};

/// One operator unit running against an in-memory host. Every event feeds
/// its published databags and secrets back into the model, the way the
/// platform would between two events.
pub struct TestOperator {
    reconciler: Reconciler<MemoryFileSystem, FakeHaproxyService>,
    pub model: ModelSnapshot,
}

impl TestOperator {
    pub fn new(model: ModelSnapshot) -> Self {
        Self::with_service(model, FakeHaproxyService::new())
    }

    pub fn with_service(model: ModelSnapshot, service: FakeHaproxyService) -> Self {
        let reconciler =
            Reconciler::new(OperatorSettings::default(), MemoryFileSystem::new(), service)
                .expect("templates load");
        Self { reconciler, model }
    }

    pub async fn event(&mut self, event: Event) -> ReconcileOutcome {
        let outcome = self.reconciler.handle(&event, self.model.clone()).await;
        apply_outcome(&mut self.model, &outcome);
        outcome
    }

    /// Live `haproxy.cfg`.
    pub fn config(&self) -> String {
        let path = self.reconciler.settings().config_path();
        self.reconciler
            .fs()
            .contents(&path)
            .unwrap_or_else(|| panic!("{} not written", path.display()))
    }

    pub fn fs(&self) -> &MemoryFileSystem {
        self.reconciler.fs()
    }

    pub fn service(&self) -> &FakeHaproxyService {
        self.reconciler.service()
    }

    /// Lines of the `header` section, up to the next blank line.
    pub fn section(&self, header: &str) -> Vec<String> {
        self.config()
            .lines()
            .skip_while(|line| *line != header)
            .take_while(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}
