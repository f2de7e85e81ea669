//! Wizard controller: command handlers over an owned [`WizardState`].
//!
//! The controller never touches a view. Every visible side effect is queued
//! as a [`WizardEvent`] which the hosting UI drains and renders after each
//! command.

use crate::backend::AnalysisBackend;
use crate::error::{BackendError, LineError, SubmitError, ValidationError};
use crate::lines::{LineKey, Section};
use crate::record::{
    AnalysisId, AnalysisRecord, Category, CategoryKind, Field, ListFilter, SimilarQuery,
    StoredAnalysis,
};
use crate::state::WizardState;
use crate::step::Step;

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Operation completed
    Success,
    /// Operation refused or failed
    Error,
}

/// View instruction produced by a command
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    /// Hide the view of a step
    HideStep(Step),
    /// Show the view of a step
    ShowStep(Step),
    /// Set the progress indicator, in percent
    Progress(f32),
    /// Scroll the viewport to the top
    ScrollToTop,
    /// Render a new input bound to `key`, with a remove control
    LineAdded {
        /// Section the line belongs to
        section: Section,
        /// Key the input must keep using
        key: LineKey,
        /// Initial text
        text: String,
    },
    /// Drop the input bound to `key`
    LineRemoved {
        /// Section the line belonged to
        section: Section,
        /// Removed key
        key: LineKey,
    },
    /// Discard every rendered input and re-render from the current state
    Reset,
    /// A submission started; the submit control should be disabled
    SubmitPending,
    /// The pending submission settled; the submit control may be re-enabled
    SubmitSettled,
    /// Transient message for the user
    Notice {
        /// Severity
        level: NoticeLevel,
        /// Text to display
        message: String,
    },
    /// The hosting view should reload its analysis listing
    RefreshListing,
}

/// Drives the six-step analysis wizard
#[derive(Debug)]
pub struct WizardController<B> {
    backend: B,
    state: WizardState,
    events: Vec<WizardEvent>,
}

impl<B: AnalysisBackend> WizardController<B> {
    /// Controller in the initial state
    #[must_use]
    pub fn new(backend: B) -> Self {
        let mut controller = Self {
            backend,
            state: WizardState::new(),
            events: Vec::new(),
        };
        controller.emit_full_render();
        controller
    }

    /// Current state, read-only
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Current step
    #[inline]
    #[must_use]
    pub fn current_step(&self) -> Step {
        self.state.current_step()
    }

    /// Backend collaborator
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Take all queued view events
    pub fn drain_events(&mut self) -> Vec<WizardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Return to the initial state, dropping any edit identity
    pub fn reinit(&mut self) {
        tracing::debug!("wizard reinitialised");
        self.state = WizardState::new();
        self.emit_full_render();
    }

    /// Validate the current step and move one step forward
    ///
    /// On failure the state is unchanged and an error notice is queued.
    /// At the last step a successful validation is a no-op.
    pub fn advance(&mut self) -> Result<Step, ValidationError> {
        let from = self.state.current_step();
        if let Err(err) = self.state.validate(from) {
            tracing::debug!(step = from.number(), %err, "step validation failed");
            self.notice(NoticeLevel::Error, err.to_string());
            return Err(err);
        }
        Ok(self.move_to(from.next()))
    }

    /// Move one step back without validation; no-op at the first step
    pub fn retreat(&mut self) -> Step {
        let from = self.state.current_step();
        self.move_to(from.previous())
    }

    fn move_to(&mut self, to: Step) -> Step {
        let from = self.state.current_step();
        if from != to {
            self.state.set_step(to);
            tracing::debug!(from = from.number(), to = to.number(), "wizard step changed");
            self.events.extend([
                WizardEvent::HideStep(from),
                WizardEvent::ShowStep(to),
                WizardEvent::Progress(to.progress_percent()),
                WizardEvent::ScrollToTop,
            ]);
        }
        to
    }

    /// Append a line to `section`
    pub fn add_line(&mut self, section: Section, initial: impl Into<String>) -> LineKey {
        let text = initial.into();
        let key = self.state.lines_mut(section).add(text.clone());
        self.events.push(WizardEvent::LineAdded { section, key, text });
        key
    }

    /// Remove the line at `key`; sibling keys stay valid
    pub fn remove_line(&mut self, section: Section, key: LineKey) -> Result<(), LineError> {
        self.state.lines_mut(section).remove(key)?;
        self.events.push(WizardEvent::LineRemoved { section, key });
        Ok(())
    }

    /// Input bound to `key` changed
    pub fn edit_line(
        &mut self,
        section: Section,
        key: LineKey,
        text: impl Into<String>,
    ) -> Result<(), LineError> {
        self.state.lines_mut(section).edit(key, text)
    }

    /// Set a flat field of steps 1, 5 or 6
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.state.set_field(field, value);
    }

    /// Payload that a submission would send
    pub fn assemble(&self) -> Result<AnalysisRecord, ValidationError> {
        self.state.assemble()
    }

    /// Send the assembled record to the backend
    ///
    /// Creates a new record, or updates the one loaded with
    /// [`load_for_edit`](Self::load_for_edit). On success the wizard returns
    /// to its initial state and the listing is refreshed; on any failure the
    /// state is kept so the user can retry.
    pub async fn submit(&mut self) -> Result<AnalysisId, SubmitError> {
        let step = self.state.current_step();
        if !step.is_final() {
            return Err(SubmitError::NotOnFinalStep(step));
        }

        let record = match self.state.assemble() {
            Ok(record) => record,
            Err(err) => {
                self.notice(NoticeLevel::Error, err.to_string());
                return Err(err.into());
            }
        };

        self.events.push(WizardEvent::SubmitPending);
        let result = match self.state.editing() {
            Some(id) => self.backend.update(id, &record).await,
            None => self.backend.create(&record).await,
        };
        self.events.push(WizardEvent::SubmitSettled);

        match result {
            Ok(stored) => {
                let updated = self.state.editing().is_some();
                tracing::info!(id = %stored.id, updated, "analysis saved");
                self.state = WizardState::new();
                self.emit_full_render();
                let message = if updated {
                    "Analysis updated"
                } else {
                    "Analysis saved"
                };
                self.notice(NoticeLevel::Success, message);
                self.events.push(WizardEvent::RefreshListing);
                Ok(stored.id)
            }
            Err(err) => {
                tracing::warn!(%err, "analysis submission failed");
                self.notice(NoticeLevel::Error, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Fetch a stored analysis and enter edit mode on it
    pub async fn load_for_edit(&mut self, id: AnalysisId) -> Result<(), BackendError> {
        match self.backend.fetch(&id).await {
            Ok(record) => {
                self.begin_edit(id, &record);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%id, %err, "could not load analysis for editing");
                self.notice(NoticeLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Enter edit mode on a record the host already holds
    pub fn begin_edit(&mut self, id: AnalysisId, record: &AnalysisRecord) {
        tracing::debug!(%id, "editing analysis");
        self.state = WizardState::from_record(id, record);
        self.emit_full_render();
    }

    /// Stored analyses for the listing view
    pub async fn listing(&mut self, filter: &ListFilter) -> Result<Vec<StoredAnalysis>, BackendError> {
        let result = self.backend.list(filter).await;
        self.notify_failure(result)
    }

    /// Delete a stored analysis
    ///
    /// Deleting the analysis being edited drops the draft and returns the
    /// wizard to its initial state.
    pub async fn delete(&mut self, id: &AnalysisId) -> Result<(), BackendError> {
        if let Err(err) = self.backend.delete(id).await {
            tracing::warn!(%id, %err, "could not delete analysis");
            self.notice(NoticeLevel::Error, err.to_string());
            return Err(err);
        }

        tracing::info!(%id, "analysis deleted");
        if self.state.editing() == Some(id) {
            self.state = WizardState::new();
            self.emit_full_render();
        }
        self.notice(NoticeLevel::Success, "Analysis deleted");
        self.events.push(WizardEvent::RefreshListing);
        Ok(())
    }

    /// Stored analyses sharing categories with the current draft
    ///
    /// Empty when the draft has no category chosen yet; the backend is not
    /// asked in that case.
    pub async fn similar(&mut self) -> Result<Vec<StoredAnalysis>, BackendError> {
        let query = SimilarQuery::for_record(&self.state.draft());
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let result = self.backend.similar(&query).await;
        self.notify_failure(result)
    }

    /// Options for a selectable field
    pub async fn categories(&mut self, kind: CategoryKind) -> Result<Vec<Category>, BackendError> {
        let result = self.backend.categories(kind).await;
        self.notify_failure(result)
    }

    /// Append an option to a selectable field
    pub async fn add_category(
        &mut self,
        kind: CategoryKind,
        valor: &str,
    ) -> Result<Category, BackendError> {
        let valor = valor.trim();
        let result = self.backend.add_category(kind, valor).await;
        self.notify_failure(result)
    }

    fn notify_failure<T>(&mut self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        if let Err(err) = &result {
            self.notice(NoticeLevel::Error, err.to_string());
        }
        result
    }

    fn emit_full_render(&mut self) {
        let step = self.state.current_step();
        self.events.extend([
            WizardEvent::Reset,
            WizardEvent::ShowStep(step),
            WizardEvent::Progress(step.progress_percent()),
            WizardEvent::ScrollToTop,
        ]);
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.events.push(WizardEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use pretty_assertions::assert_eq;

    fn controller(backend: MockAnalysisBackend) -> WizardController<MockAnalysisBackend> {
        let mut wizard = WizardController::new(backend);
        wizard.drain_events();
        wizard
    }

    fn first_line(wizard: &WizardController<MockAnalysisBackend>, section: Section) -> LineKey {
        wizard.state().lines(section).live().next().unwrap().0
    }

    fn walk_to_last_step(wizard: &mut WizardController<MockAnalysisBackend>) {
        wizard.set_field(Field::Title, "Aviones");
        wizard.set_field(Field::Author, "Gila");
        for section in Section::ALL {
            let key = first_line(wizard, section);
            wizard.edit_line(section, key, format!("{section} text")).unwrap();
        }
        for _ in 0..5 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.current_step(), Step::FormulationNotes);
        wizard.drain_events();
    }

    #[test]
    fn advance_emits_view_updates() {
        let mut wizard = controller(MockAnalysisBackend::new());
        wizard.set_field(Field::Title, "t");
        wizard.set_field(Field::Author, "a");

        assert_eq!(wizard.advance(), Ok(Step::Premise));
        assert_eq!(
            wizard.drain_events(),
            vec![
                WizardEvent::HideStep(Step::Identification),
                WizardEvent::ShowStep(Step::Premise),
                WizardEvent::Progress(Step::Premise.progress_percent()),
                WizardEvent::ScrollToTop,
            ]
        );
    }

    #[test]
    fn failed_advance_keeps_state_and_notifies() {
        let mut wizard = controller(MockAnalysisBackend::new());
        let before = wizard.state().clone();

        assert_eq!(wizard.advance(), Err(ValidationError::MissingTitle));
        assert_eq!(wizard.state(), &before);
        assert_eq!(
            wizard.drain_events(),
            vec![WizardEvent::Notice {
                level: NoticeLevel::Error,
                message: "title is required".into(),
            }]
        );
    }

    #[test]
    fn retreat_at_first_step_is_noop() {
        let mut wizard = controller(MockAnalysisBackend::new());
        assert_eq!(wizard.retreat(), Step::Identification);
        assert!(wizard.drain_events().is_empty());
    }

    #[test]
    fn advance_at_last_step_is_noop() {
        let mut wizard = controller(MockAnalysisBackend::new());
        walk_to_last_step(&mut wizard);
        assert_eq!(wizard.advance(), Ok(Step::FormulationNotes));
        assert!(wizard.drain_events().is_empty());
    }

    #[test]
    fn line_commands_emit_events() {
        let mut wizard = controller(MockAnalysisBackend::new());
        let key = wizard.add_line(Section::Rupture, "giro");
        wizard.remove_line(Section::Rupture, key).unwrap();
        assert_eq!(
            wizard.drain_events(),
            vec![
                WizardEvent::LineAdded {
                    section: Section::Rupture,
                    key,
                    text: "giro".into(),
                },
                WizardEvent::LineRemoved {
                    section: Section::Rupture,
                    key,
                },
            ]
        );
        assert_eq!(
            wizard.remove_line(Section::Rupture, key),
            Err(LineError::Removed(key))
        );
    }

    #[tokio::test]
    async fn submit_before_last_step_is_refused() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_create().never();
        let mut wizard = controller(backend);

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::NotOnFinalStep(Step::Identification)));
    }

    #[tokio::test]
    async fn submit_creates_and_resets() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_create()
            .withf(|record| record.titulo == "Aviones" && record.premisa == "premise text")
            .times(1)
            .returning(|record| {
                Ok(StoredAnalysis {
                    id: AnalysisId::new("new-1"),
                    record: record.clone(),
                })
            });
        backend.expect_update().never();
        let mut wizard = controller(backend);
        walk_to_last_step(&mut wizard);

        let id = wizard.submit().await.unwrap();
        assert_eq!(id, AnalysisId::new("new-1"));
        assert_eq!(wizard.state(), &WizardState::new());

        let events = wizard.drain_events();
        assert_eq!(events.first(), Some(&WizardEvent::SubmitPending));
        assert!(events.contains(&WizardEvent::RefreshListing));
        assert!(events.contains(&WizardEvent::Reset));
    }

    #[tokio::test]
    async fn backend_failure_preserves_state() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_create()
            .times(1)
            .returning(|_| Err(BackendError::rejected(500, "db down")));
        let mut wizard = controller(backend);
        walk_to_last_step(&mut wizard);
        let before = wizard.state().clone();

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Backend(_)));
        assert_eq!(wizard.state(), &before);

        let events = wizard.drain_events();
        assert!(!events.contains(&WizardEvent::RefreshListing));
        assert!(events.iter().any(|e| matches!(
            e,
            WizardEvent::Notice { level: NoticeLevel::Error, .. }
        )));
    }

    #[tokio::test]
    async fn incomplete_record_never_reaches_backend() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_create().never();
        let mut wizard = controller(backend);
        walk_to_last_step(&mut wizard);
        let key = first_line(&wizard, Section::Rupture);
        wizard.remove_line(Section::Rupture, key).unwrap();

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Incomplete(ValidationError::EmptySection(Section::Rupture))
        ));
    }

    #[tokio::test]
    async fn edit_mode_submits_update() {
        let stored = AnalysisRecord {
            titulo: "Suegras".into(),
            comediante: "Chiquito".into(),
            premisa: "uno\ndos".into(),
            ruptura: "tres".into(),
            remate: "cuatro".into(),
            ..AnalysisRecord::default()
        };
        let mut backend = MockAnalysisBackend::new();
        let fetched = stored.clone();
        backend
            .expect_fetch()
            .withf(|id| id.as_str() == "7")
            .returning(move |_| Ok(fetched.clone()));
        backend
            .expect_update()
            .withf(|id, record| id.as_str() == "7" && record.premisa == "uno\ndos")
            .times(1)
            .returning(|id, record| {
                Ok(StoredAnalysis {
                    id: id.clone(),
                    record: record.clone(),
                })
            });
        backend.expect_create().never();
        let mut wizard = controller(backend);

        wizard.load_for_edit(AnalysisId::new("7")).await.unwrap();
        assert_eq!(wizard.current_step(), Step::Identification);
        assert_eq!(wizard.state().field(Field::Title), "Suegras");
        assert_eq!(wizard.assemble().unwrap(), stored);

        for _ in 0..5 {
            wizard.advance().unwrap();
        }
        let id = wizard.submit().await.unwrap();
        assert_eq!(id.as_str(), "7");
        assert!(wizard.state().editing().is_none());
    }

    fn stored(id: &str, titulo: &str) -> StoredAnalysis {
        StoredAnalysis {
            id: AnalysisId::new(id),
            record: AnalysisRecord {
                titulo: titulo.into(),
                ..AnalysisRecord::default()
            },
        }
    }

    #[tokio::test]
    async fn deleting_the_edited_analysis_drops_the_draft() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_delete()
            .withf(|id| id.as_str() == "7")
            .times(1)
            .returning(|_| Ok(()));
        let mut wizard = controller(backend);
        wizard.begin_edit(
            AnalysisId::new("7"),
            &AnalysisRecord {
                titulo: "Suegras".into(),
                ..AnalysisRecord::default()
            },
        );
        wizard.drain_events();

        wizard.delete(&AnalysisId::new("7")).await.unwrap();
        assert_eq!(wizard.state(), &WizardState::new());
        let events = wizard.drain_events();
        assert_eq!(events.first(), Some(&WizardEvent::Reset));
        assert_eq!(events.last(), Some(&WizardEvent::RefreshListing));
    }

    #[tokio::test]
    async fn deleting_another_analysis_keeps_the_draft() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_delete().returning(|_| Ok(()));
        let mut wizard = controller(backend);
        wizard.set_field(Field::Title, "borrador");

        wizard.delete(&AnalysisId::new("3")).await.unwrap();
        assert_eq!(wizard.state().field(Field::Title), "borrador");
        assert!(!wizard.drain_events().contains(&WizardEvent::Reset));
    }

    #[tokio::test]
    async fn listing_failure_is_notified() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_list().times(2).returning(|filter| {
            if filter.comediante.as_deref() == Some("Gila") {
                Ok(vec![stored("1", "Guerra")])
            } else {
                Err(BackendError::Transport("refused".into()))
            }
        });
        let mut wizard = controller(backend);

        let by_gila = ListFilter {
            comediante: Some("Gila".into()),
            ..ListFilter::default()
        };
        assert_eq!(wizard.listing(&by_gila).await.unwrap(), vec![stored("1", "Guerra")]);
        assert!(wizard.drain_events().is_empty());

        assert!(wizard.listing(&ListFilter::default()).await.is_err());
        assert!(matches!(
            wizard.drain_events().as_slice(),
            [WizardEvent::Notice { level: NoticeLevel::Error, .. }]
        ));
    }

    #[tokio::test]
    async fn similar_uses_draft_categories() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_similar()
            .withf(|query| {
                query.concepto_categoria.as_deref() == Some("rutina")
                    && query.perspectiva_categoria.is_none()
            })
            .times(1)
            .returning(|_| Ok(vec![stored("2", "Bodas")]));
        let mut wizard = controller(backend);

        // Nothing chosen yet; no backend call
        assert!(wizard.similar().await.unwrap().is_empty());

        wizard.set_field(Field::ConceptCategory, "rutina");
        assert_eq!(wizard.similar().await.unwrap(), vec![stored("2", "Bodas")]);
    }

    #[tokio::test]
    async fn failed_load_keeps_current_state() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_fetch()
            .returning(|id| Err(BackendError::NotFound(id.to_string())));
        let mut wizard = controller(backend);
        wizard.set_field(Field::Title, "draft");

        let err = wizard.load_for_edit(AnalysisId::new("404")).await.unwrap_err();
        assert_eq!(err, BackendError::NotFound("404".into()));
        assert_eq!(wizard.state().field(Field::Title), "draft");
    }
}
