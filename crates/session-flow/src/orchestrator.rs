use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use action_executor::{ActionExecutor, PlanContext};
use dom_bridge::DomPort;
use form_inventory::InventoryBuilder;
use formpilot_core_types::{
    ActionId, ActionItem, ActionKind, ActionRecord, FieldResult, FieldResults, FormSnapshot,
    SessionId, SessionPhase,
};
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::errors::FlowError;
use crate::plan::parse_plan;
use crate::ports::{PlannerPort, ProgressLevel, ProgressPort, ProgressUpdate};
use crate::residual;
use crate::types::{SessionOutcome, SessionSettings};

/// Words a submit control's text is expected to carry.
const SUBMIT_VOCABULARY: &[&str] = &["submit", "apply", "send", "continue"];

/// Drives one autofill session end to end: inventory, planning, execution,
/// residual scan, submission. At most one session runs at a time.
pub struct SessionOrchestrator {
    dom: Arc<dyn DomPort>,
    planner: Arc<dyn PlannerPort>,
    progress: Arc<dyn ProgressPort>,
    executor: ActionExecutor,
    running: AtomicBool,
    history: Mutex<Vec<ActionRecord>>,
}

impl SessionOrchestrator {
    pub fn new(
        dom: Arc<dyn DomPort>,
        planner: Arc<dyn PlannerPort>,
        progress: Arc<dyn ProgressPort>,
        executor: ActionExecutor,
    ) -> Self {
        Self {
            dom,
            planner,
            progress,
            executor,
            running: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        }
    }

    pub async fn detect(&self) -> Result<FormSnapshot, FlowError> {
        Ok(InventoryBuilder::new(self.dom.as_ref()).scan().await?)
    }

    /// Actions committed so far this session, oldest first.
    pub fn history(&self) -> Vec<ActionRecord> {
        self.history.lock().clone()
    }

    #[instrument(skip(self))]
    pub async fn run(&self, settings: SessionSettings) -> Result<SessionOutcome, FlowError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(FlowError::AlreadyRunning);
        }
        let outcome = self.run_inner(settings).await;
        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_inner(&self, settings: SessionSettings) -> Result<SessionOutcome, FlowError> {
        let session = SessionId::new();
        info!(session = %session.0, "session started");
        self.emit(10, SessionPhase::Detecting, "Scanning form fields", ProgressLevel::Info);
        let snapshot = self.detect().await?;
        if snapshot.field_count() == 0 {
            warn!("no form fields detected");
            return Ok(SessionOutcome {
                session,
                success: false,
                message: "No form fields detected on this page".to_string(),
                phase: SessionPhase::Error,
                results: FieldResults::new(),
                submitted: false,
                inventory: snapshot,
            });
        }

        if settings.detect_only {
            let message = format!("Detected {} form field(s)", snapshot.field_count());
            self.emit(100, SessionPhase::Complete, &message, ProgressLevel::Success);
            return Ok(SessionOutcome {
                session,
                success: true,
                message,
                phase: SessionPhase::Complete,
                results: FieldResults::new(),
                submitted: false,
                inventory: snapshot,
            });
        }

        self.emit(30, SessionPhase::Planning, "Requesting action plan", ProgressLevel::Info);
        let raw = self
            .planner
            .plan(&snapshot, &self.history())
            .await
            .map_err(|e| FlowError::Planner(e.to_string()))?;
        let plan = parse_plan(&raw)?;

        let mut results = FieldResults::new();
        for rejected in &plan.rejected {
            results
                .entry(rejected.element_id.clone())
                .or_insert_with(|| {
                    FieldResult::error(
                        snapshot.display_label(&rejected.element_id),
                        rejected.reason.clone(),
                    )
                });
        }

        let mut actions = plan.actions.clone();
        if settings.required_only {
            // Uploads stay regardless; an application without its documents
            // is not worth submitting.
            actions.retain(|a| {
                matches!(a.kind, ActionKind::Upload) || is_required_target(&snapshot, a)
            });
        }
        // Uploads run first so validation hooks fired by later fields see
        // the attachment already in place. The sort is stable, everything
        // else keeps plan order.
        actions.sort_by_key(|a| !matches!(a.kind, ActionKind::Upload));

        self.emit(
            40,
            SessionPhase::Executing,
            &format!("Executing {} action(s)", actions.len()),
            ProgressLevel::Info,
        );

        let ctx = PlanContext {
            snapshot: &snapshot,
            cover_letter: plan.cover_letter.as_ref(),
        };
        let total = actions.len().max(1);
        let mut cancelled = false;
        for (index, item) in actions.iter().enumerate() {
            if self.executor.tempo().cancelled() {
                cancelled = true;
                break;
            }
            let label = snapshot.display_label(&item.element_id);
            let percent = 40 + ((index * 55) / total) as u8;
            self.emit(
                percent,
                SessionPhase::Executing,
                &format!("{} {label}", verb(item.kind)),
                ProgressLevel::Info,
            );

            match self.executor.apply(&ctx, item).await {
                Ok(applied) => {
                    for warning in &applied.warnings {
                        self.emit(percent, SessionPhase::Executing, warning, ProgressLevel::Warning);
                    }
                    self.record(item, applied.value.clone());
                    results
                        .entry(item.element_id.clone())
                        .or_insert_with(|| FieldResult::success(&label, applied.value));
                }
                Err(err) => {
                    warn!(element_id = %item.element_id, error = %err, "action failed");
                    results
                        .entry(item.element_id.clone())
                        .or_insert_with(|| FieldResult::error(&label, err.to_string()));
                }
            }
        }

        if cancelled {
            let message = "Session cancelled".to_string();
            self.emit(100, SessionPhase::Error, &message, ProgressLevel::Warning);
            return Ok(SessionOutcome {
                session,
                success: false,
                message,
                phase: SessionPhase::Error,
                results,
                submitted: false,
                inventory: snapshot,
            });
        }

        residual::scan(self.dom.as_ref(), &mut results).await;

        // Submission trouble never costs the caller the collected results;
        // the worst case is a warning and a form left for manual submission.
        let mut submitted = false;
        if plan.submit_form && !settings.prevent_submit {
            self.emit(95, SessionPhase::Submitting, "Submitting form", ProgressLevel::Info);
            match self.find_submit_control().await {
                Ok(Some(node)) => match self.dom.click(node).await {
                    Ok(()) => {
                        submitted = true;
                        info!("submit control clicked");
                    }
                    Err(err) => {
                        warn!(error = %err, "submit click failed");
                        self.emit(
                            95,
                            SessionPhase::Submitting,
                            "Submit control could not be activated; leaving form for manual submission",
                            ProgressLevel::Warning,
                        );
                    }
                },
                Ok(None) => {
                    self.emit(
                        95,
                        SessionPhase::Submitting,
                        "No submit control found; leaving form for manual submission",
                        ProgressLevel::Warning,
                    );
                }
                Err(err) => {
                    warn!(error = %err, "submit search failed");
                    self.emit(
                        95,
                        SessionPhase::Submitting,
                        "No submit control found; leaving form for manual submission",
                        ProgressLevel::Warning,
                    );
                }
            }
        }

        let errors = results.values().filter(|r| !r.is_success()).count();
        let filled = results.len() - errors;
        let message = if submitted {
            format!("Filled {filled} field(s), {errors} issue(s); form submitted")
        } else {
            format!("Filled {filled} field(s), {errors} issue(s)")
        };
        self.emit(100, SessionPhase::Complete, &message, ProgressLevel::Success);
        Ok(SessionOutcome {
            session,
            success: errors == 0,
            message,
            phase: SessionPhase::Complete,
            results,
            submitted,
            inventory: snapshot,
        })
    }

    /// Best submit candidate: a real submit control whose text carries the
    /// expected vocabulary beats a bare submit control, which beats a
    /// button that merely says the right word. Ties go to document order.
    /// Nodes that go stale mid-search are skipped.
    async fn find_submit_control(
        &self,
    ) -> Result<Option<dom_bridge::NodeId>, dom_bridge::DomError> {
        let mut best: Option<(u8, dom_bridge::NodeId)> = None;
        for node in self.dom.controls().await? {
            let Ok(snap) = self.dom.describe(node).await else {
                continue;
            };
            if !snap.is_interactable() {
                continue;
            }
            let is_button =
                snap.tag == dom_bridge::ControlTag::Button || snap.type_is("submit") || snap.type_is("button");
            if !is_button {
                continue;
            }
            let text = snap
                .text
                .as_deref()
                .unwrap_or(snap.value.as_str())
                .to_lowercase();
            let has_vocab = SUBMIT_VOCABULARY.iter().any(|w| text.contains(w));
            let is_submit = snap.type_is("submit");
            let score = match (is_submit, has_vocab) {
                (true, true) => 3,
                (true, false) => 2,
                (false, true) => 1,
                (false, false) => continue,
            };
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, node));
            }
        }
        Ok(best.map(|(_, node)| node))
    }

    fn record(&self, item: &ActionItem, value: Option<String>) {
        let mut history = self.history.lock();
        let step = history.len() as u32 + 1;
        history.push(ActionRecord {
            id: ActionId::new(),
            step,
            kind: item.kind,
            element_id: item.element_id.clone(),
            value,
            explanation: item.explanation.clone(),
        });
    }

    fn emit(&self, percent: u8, phase: SessionPhase, message: &str, level: ProgressLevel) {
        self.progress.emit(ProgressUpdate {
            percent,
            message: message.to_string(),
            phase,
            level,
        });
    }
}

fn is_required_target(snapshot: &FormSnapshot, item: &ActionItem) -> bool {
    if let Some(field) = snapshot.find(&item.element_id) {
        return field.required();
    }
    if let Some(group) = snapshot
        .radio_groups
        .iter()
        .find(|g| g.name == item.element_id)
    {
        return group.required;
    }
    // Unknown to the snapshot: keep it and let resolution decide.
    true
}

fn verb(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Fill => "Filling",
        ActionKind::Select => "Selecting",
        ActionKind::Check => "Updating",
        ActionKind::Radio => "Choosing",
        ActionKind::Upload => "Uploading",
        ActionKind::Click => "Clicking",
    }
}
