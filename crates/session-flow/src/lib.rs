//! Session orchestration: the full autofill loop from inventory through
//! planning, execution, residual scanning and submission.

pub mod errors;
pub mod orchestrator;
pub mod plan;
pub mod ports;
mod residual;
pub mod types;

pub use errors::FlowError;
pub use orchestrator::SessionOrchestrator;
pub use plan::parse_plan;
pub use ports::{PlannerPort, ProgressLevel, ProgressPort, ProgressUpdate, TracingProgress};
pub use types::{SessionOutcome, SessionSettings};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use action_executor::{
        ActionExecutor, AttachmentPayload, AttachmentPort, Tempo, MANUAL_UPLOAD,
    };
    use async_trait::async_trait;
    use dom_bridge::{
        ControlSpec, DomError, DomEvent, DomPort, FilePayload, FixtureDom, NodeId, NodeSnapshot,
    };
    use field_resolver::DefaultFieldResolver;
    use formpilot_core_types::{
        ActionKind, ActionRecord, EngineError, FormSnapshot, SessionPhase,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    use super::*;

    struct StubPlanner {
        value: Value,
    }

    #[async_trait]
    impl PlannerPort for StubPlanner {
        async fn plan(
            &self,
            _snapshot: &FormSnapshot,
            _history: &[ActionRecord],
        ) -> Result<Value, EngineError> {
            Ok(self.value.clone())
        }
    }

    struct FailingPlanner;

    #[async_trait]
    impl PlannerPort for FailingPlanner {
        async fn plan(
            &self,
            _snapshot: &FormSnapshot,
            _history: &[ActionRecord],
        ) -> Result<Value, EngineError> {
            Err(EngineError::new("planner should not have been called"))
        }
    }

    struct BlockingPlanner {
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
        value: Value,
    }

    #[async_trait]
    impl PlannerPort for BlockingPlanner {
        async fn plan(
            &self,
            _snapshot: &FormSnapshot,
            _history: &[ActionRecord],
        ) -> Result<Value, EngineError> {
            if let Some(rx) = self.gate.lock().await.take() {
                let _ = rx.await;
            }
            Ok(self.value.clone())
        }
    }

    #[derive(Default)]
    struct VecProgress {
        updates: Mutex<Vec<ProgressUpdate>>,
    }

    impl ProgressPort for VecProgress {
        fn emit(&self, update: ProgressUpdate) {
            self.updates.lock().push(update);
        }
    }

    /// Hands out one batch of control handles and immediately re-renders,
    /// so every handle in that batch is stale by the time it is used. Fires
    /// on the n-th `controls` call, counting from one.
    struct RerenderAfterControls {
        inner: Arc<FixtureDom>,
        fire_on_call: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DomPort for RerenderAfterControls {
        async fn controls(&self) -> Result<Vec<NodeId>, DomError> {
            let handles = self.inner.controls().await?;
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fire_on_call {
                self.inner.rerender();
            }
            Ok(handles)
        }

        async fn describe(&self, node: NodeId) -> Result<NodeSnapshot, DomError> {
            self.inner.describe(node).await
        }

        async fn by_dom_id(&self, id: &str) -> Result<Option<NodeId>, DomError> {
            self.inner.by_dom_id(id).await
        }

        async fn by_name(&self, name: &str) -> Result<Vec<NodeId>, DomError> {
            self.inner.by_name(name).await
        }

        async fn by_label_text(&self, label: &str) -> Result<Option<NodeId>, DomError> {
            self.inner.by_label_text(label).await
        }

        async fn page_text(&self) -> Result<String, DomError> {
            self.inner.page_text().await
        }

        async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
            self.inner.set_value(node, value).await
        }

        async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError> {
            self.inner.set_checked(node, checked).await
        }

        async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), DomError> {
            self.inner.dispatch(node, event).await
        }

        async fn click(&self, node: NodeId) -> Result<(), DomError> {
            self.inner.click(node).await
        }

        async fn attach_files(&self, node: NodeId, file: &FilePayload) -> Result<(), DomError> {
            self.inner.attach_files(node, file).await
        }

        async fn override_file_list(
            &self,
            node: NodeId,
            file: &FilePayload,
        ) -> Result<(), DomError> {
            self.inner.override_file_list(node, file).await
        }

        async fn highlight(&self, node: NodeId) -> Result<(), DomError> {
            self.inner.highlight(node).await
        }

        async fn clear_highlight(&self, node: NodeId) -> Result<(), DomError> {
            self.inner.clear_highlight(node).await
        }

        async fn scroll_into_view(&self, node: NodeId) -> Result<(), DomError> {
            self.inner.scroll_into_view(node).await
        }
    }

    struct NoAttachments;

    #[async_trait]
    impl AttachmentPort for NoAttachments {
        async fn resume(&self) -> Option<AttachmentPayload> {
            None
        }

        async fn render_cover_letter(
            &self,
            content: &str,
            filename: &str,
        ) -> Result<AttachmentPayload, EngineError> {
            Ok(action_executor::fallback_cover_letter(content, filename))
        }
    }

    fn orchestrator(
        dom: Arc<FixtureDom>,
        planner: Arc<dyn PlannerPort>,
    ) -> (Arc<SessionOrchestrator>, Arc<VecProgress>) {
        let progress = Arc::new(VecProgress::default());
        let resolver = Arc::new(DefaultFieldResolver::new(dom.clone()));
        let executor = ActionExecutor::new(
            dom.clone(),
            resolver,
            Arc::new(NoAttachments),
            Tempo::instant(),
        );
        let orch = Arc::new(SessionOrchestrator::new(
            dom,
            planner,
            progress.clone(),
            executor,
        ));
        (orch, progress)
    }

    fn job_form() -> Arc<FixtureDom> {
        Arc::new(FixtureDom::new(vec![
            ControlSpec::email("email").labeled("Email").required(),
            ControlSpec::select("country", &[("US", "United States"), ("CA", "Canada")])
                .labeled("Country"),
            ControlSpec::radio("visa", "yes").wrapped_label("Yes"),
            ControlSpec::radio("visa", "no").wrapped_label("No"),
            ControlSpec::submit("Submit Application"),
        ]))
    }

    #[tokio::test]
    async fn full_session_fills_and_submits() {
        let dom = job_form();
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [
                    {"element_id": "email", "action": "fill", "value": "a@b.example"},
                    {"element_id": "country", "action": "select", "value": "us"},
                    {"element_id": "visa", "action": "radio", "value": "yes"}
                ],
                "submit_form": true
            }),
        });
        let (orch, _) = orchestrator(dom.clone(), planner);

        let outcome = orch
            .run(SessionSettings {
                prevent_submit: false,
                ..SessionSettings::default()
            })
            .await
            .unwrap();

        assert!(outcome.success, "unexpected errors: {:?}", outcome.results);
        assert!(outcome.submitted);
        assert_eq!(outcome.phase, SessionPhase::Complete);
        assert_eq!(dom.value_at(0), "a@b.example");
        assert_eq!(dom.value_at(1), "US");
        assert!(dom.checked_at(2));
        assert!(dom.events_at(4).contains(&DomEvent::Click));
        assert_eq!(orch.history().len(), 3);
    }

    #[tokio::test]
    async fn rejected_actions_become_field_errors() {
        let dom = job_form();
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [
                    {"element_id": "email", "action": "fill", "value": "a@b.example"},
                    {"element_id": "country", "action": "hover", "value": "x"}
                ]
            }),
        });
        let (orch, _) = orchestrator(dom, planner);

        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        let rejected = &outcome.results["country"];
        assert!(!rejected.is_success());
        assert!(rejected.error.as_deref().unwrap_or("").contains("hover"));
        assert!(outcome.results["email"].is_success());
    }

    #[tokio::test]
    async fn residual_scan_flags_untouched_fields() {
        let dom = Arc::new(FixtureDom::new(vec![
            ControlSpec::text("name").labeled("Full name"),
            ControlSpec::email("email").labeled("Email"),
        ]));
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [{"element_id": "name", "action": "fill", "value": "Sam"}]
            }),
        });
        let (orch, _) = orchestrator(dom, planner);

        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        assert!(outcome.results["name"].is_success());
        let email = &outcome.results["email"];
        assert_eq!(email.error.as_deref(), Some("Field appears empty"));
        assert_eq!(email.label, "Email");
    }

    #[tokio::test]
    async fn residual_scan_never_overwrites_action_results() {
        let dom = Arc::new(FixtureDom::new(vec![ControlSpec::email("email")]));
        let planner = Arc::new(StubPlanner {
            // Fill with no value fails at the executor; the residual scan
            // must keep that error, not replace it with "appears empty".
            value: json!({
                "actions": [{"element_id": "email", "action": "fill"}]
            }),
        });
        let (orch, _) = orchestrator(dom, planner);

        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        let email = &outcome.results["email"];
        assert!(email.error.as_deref().unwrap_or("").contains("no value provided"));
    }

    #[tokio::test]
    async fn rerender_during_residual_scan_keeps_collected_results() {
        let fixture = Arc::new(FixtureDom::new(vec![
            ControlSpec::email("email").labeled("Email"),
            ControlSpec::text("name").labeled("Full name"),
        ]));
        // Call 1 is the inventory scan, call 2 the residual sweep; the sweep's
        // whole batch of handles goes stale under it.
        let dom = Arc::new(RerenderAfterControls {
            inner: fixture,
            fire_on_call: 2,
            calls: AtomicUsize::new(0),
        });
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [{"element_id": "email", "action": "fill", "value": "a@b.example"}]
            }),
        });
        let progress = Arc::new(VecProgress::default());
        let resolver = Arc::new(DefaultFieldResolver::new(dom.clone()));
        let executor = ActionExecutor::new(
            dom.clone(),
            resolver,
            Arc::new(NoAttachments),
            Tempo::instant(),
        );
        let orch = SessionOrchestrator::new(dom, planner, progress, executor);

        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        assert!(outcome.results["email"].is_success());
        // The sweep recovered with fresh handles and still found the gap.
        assert!(!outcome.results["name"].is_success());
    }

    #[tokio::test]
    async fn rerender_during_submit_search_degrades_to_a_warning() {
        let fixture = Arc::new(FixtureDom::new(vec![
            ControlSpec::email("email").labeled("Email"),
            ControlSpec::submit("Submit"),
        ]));
        // Call 3 is the submit search; every candidate it describes is stale.
        let dom = Arc::new(RerenderAfterControls {
            inner: fixture.clone(),
            fire_on_call: 3,
            calls: AtomicUsize::new(0),
        });
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [{"element_id": "email", "action": "fill", "value": "a@b.example"}],
                "submit_form": true
            }),
        });
        let progress = Arc::new(VecProgress::default());
        let resolver = Arc::new(DefaultFieldResolver::new(dom.clone()));
        let executor = ActionExecutor::new(
            dom.clone(),
            resolver,
            Arc::new(NoAttachments),
            Tempo::instant(),
        );
        let orch = SessionOrchestrator::new(dom, planner, progress.clone(), executor);

        let outcome = orch
            .run(SessionSettings {
                prevent_submit: false,
                ..SessionSettings::default()
            })
            .await
            .unwrap();

        assert!(!outcome.submitted);
        assert_eq!(outcome.phase, SessionPhase::Complete);
        assert!(outcome.results["email"].is_success());
        assert!(fixture.events_at(1).is_empty());
        assert!(progress
            .updates
            .lock()
            .iter()
            .any(|u| u.level == ProgressLevel::Warning && u.message.contains("No submit control")));
    }

    #[tokio::test]
    async fn concurrent_session_is_rejected() {
        let dom = job_form();
        let (tx, rx) = oneshot::channel();
        let planner = Arc::new(BlockingPlanner {
            gate: tokio::sync::Mutex::new(Some(rx)),
            value: json!({
                "actions": [{"element_id": "email", "action": "fill", "value": "x"}]
            }),
        });
        let (orch, _) = orchestrator(dom, planner);

        let background = orch.clone();
        let handle = tokio::spawn(async move { background.run(SessionSettings::default()).await });
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let err = orch.run(SessionSettings::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Form automation already in progress");

        tx.send(()).ok();
        handle.await.unwrap().unwrap();

        // Once the first session drains, a new one may start.
        assert!(orch.run(SessionSettings::default()).await.is_ok());
    }

    #[tokio::test]
    async fn default_settings_never_submit() {
        let dom = job_form();
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [{"element_id": "email", "action": "fill", "value": "a@b.example"}],
                "submit_form": true
            }),
        });
        let (orch, _) = orchestrator(dom.clone(), planner);

        // Submission is opt-in even when the plan asks for it.
        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        assert!(!outcome.submitted);
        assert!(dom.events_at(4).is_empty());
    }

    #[tokio::test]
    async fn missing_submit_control_is_a_warning_not_an_error() {
        let dom = Arc::new(FixtureDom::new(vec![ControlSpec::email("email")]));
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [{"element_id": "email", "action": "fill", "value": "a@b.example"}],
                "submit_form": true
            }),
        });
        let (orch, progress) = orchestrator(dom, planner);

        let outcome = orch
            .run(SessionSettings {
                prevent_submit: false,
                ..SessionSettings::default()
            })
            .await
            .unwrap();

        assert!(!outcome.submitted);
        assert_eq!(outcome.phase, SessionPhase::Complete);
        assert!(progress
            .updates
            .lock()
            .iter()
            .any(|u| u.level == ProgressLevel::Warning && u.message.contains("No submit control")));
    }

    #[tokio::test]
    async fn detect_only_never_consults_the_planner() {
        let dom = job_form();
        let (orch, _) = orchestrator(dom, Arc::new(FailingPlanner));

        let outcome = orch
            .run(SessionSettings {
                detect_only: true,
                ..SessionSettings::default()
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.results.is_empty());
        assert!(outcome.inventory.field_count() > 0);
    }

    #[tokio::test]
    async fn unusable_plan_is_fatal() {
        let dom = job_form();
        let planner = Arc::new(StubPlanner { value: json!({}) });
        let (orch, _) = orchestrator(dom, planner);

        assert!(matches!(
            orch.run(SessionSettings::default()).await,
            Err(FlowError::PlanFormat(_))
        ));
    }

    #[tokio::test]
    async fn required_only_drops_optional_targets() {
        let dom = Arc::new(FixtureDom::new(vec![
            ControlSpec::email("email").required(),
            ControlSpec::text("nickname"),
        ]));
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [
                    {"element_id": "email", "action": "fill", "value": "a@b.example"},
                    {"element_id": "nickname", "action": "fill", "value": "Sam"}
                ]
            }),
        });
        let (orch, _) = orchestrator(dom.clone(), planner);

        let outcome = orch
            .run(SessionSettings {
                required_only: true,
                ..SessionSettings::default()
            })
            .await
            .unwrap();

        assert_eq!(dom.value_at(0), "a@b.example");
        assert_eq!(dom.value_at(1), "");
        assert!(outcome.results["email"].is_success());
    }

    #[tokio::test]
    async fn uploads_run_before_everything_else() {
        let dom = Arc::new(FixtureDom::new(vec![
            ControlSpec::email("email"),
            ControlSpec::file("resume"),
        ]));
        let planner = Arc::new(StubPlanner {
            value: json!({
                "actions": [
                    {"element_id": "email", "action": "fill", "value": "a@b.example"},
                    {"element_id": "resume", "action": "upload", "value": "resume"}
                ]
            }),
        });
        let (orch, _) = orchestrator(dom, planner);

        let outcome = orch.run(SessionSettings::default()).await.unwrap();

        let history = orch.history();
        assert_eq!(history[0].kind, ActionKind::Upload);
        assert_eq!(history[1].kind, ActionKind::Fill);
        // No stored resume, so the upload degrades to the manual picker but
        // still counts as handled.
        assert_eq!(
            outcome.results["resume"].value.as_deref(),
            Some(MANUAL_UPLOAD)
        );
    }
}
