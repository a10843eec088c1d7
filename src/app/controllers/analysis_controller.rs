// Analysis lifecycle: idle -> loading -> success | error, reset back to idle.
// Requests run on a worker thread and report through a channel; each carries
// a sequence number and only the latest one may update the state.

use crate::analyze;
use crate::app::actions::{Action, AnalyzeStatus, StateEvent};
use crate::app::state::{AnalysisOutcome, AppState};
use crate::model::AnalyzeRequest;
use crate::page::RepoTarget;

pub fn handle(state: &mut AppState, action: &Action) -> bool {
    match action {
        Action::Analyze { repo_url, branch } => {
            state.begin_analysis(repo_url, branch.as_deref());
            true
        }
        Action::AnalyzeCurrentPage => {
            state.analyze_current_page();
            true
        }
        Action::MaybeAutoAnalyze => {
            state.maybe_auto_analyze();
            true
        }
        Action::Reset => {
            state.reset_analysis();
            true
        }
        Action::ToggleFab => {
            state.toggle_fab();
            true
        }
        _ => false,
    }
}

impl AppState {
    pub(crate) fn begin_analysis(&mut self, repo_url: &str, branch: Option<&str>) {
        self.analysis.seq += 1;
        let seq = self.analysis.seq;

        self.analysis.status = AnalyzeStatus::Loading;
        self.analysis.error = None;
        self.analysis.result = None;
        self.analysis.languages.clear();
        self.emit(StateEvent::StatusChanged(AnalyzeStatus::Loading));

        let req = AnalyzeRequest::new(repo_url, branch);
        tracing::info!(seq, repo = %req.repo_url, branch = ?req.branch, "analysis started");

        let client = self.client.clone();
        let tx = self.analysis.tx.clone();
        std::thread::spawn(move || {
            let result = client.analyze(&req);
            let _ = tx.send(AnalysisOutcome { seq, result });
        });
    }

    fn current_target(&self) -> Option<RepoTarget> {
        match self.page.repo_target() {
            Ok(Some(target)) => Some(target),
            Ok(None) => {
                tracing::debug!(path = %self.page.path, "not a repository page");
                None
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                None
            }
        }
    }

    fn analyze_target(&mut self, target: &RepoTarget) {
        let branch = self.page.branch().map(str::to_string);
        self.begin_analysis(&target.repo_url(), branch.as_deref());
    }

    /// Returns false when the page path has no owner/repo.
    pub(crate) fn analyze_current_page(&mut self) -> bool {
        let Some(target) = self.current_target() else {
            return false;
        };
        self.analyze_target(&target);
        true
    }

    /// Page-load analysis: only with auto-analyze on, and never for site
    /// sections such as `/owner/settings`.
    fn maybe_auto_analyze(&mut self) {
        let enabled = self.settings.as_ref().map(|s| s.auto_analyze).unwrap_or(false);
        if !enabled {
            return;
        }
        let Some(target) = self.current_target() else {
            return;
        };
        if target.is_reserved() {
            tracing::debug!(path = %self.page.path, "skipping auto-analyze on a site section");
            return;
        }
        self.analyze_target(&target);
    }

    pub(crate) fn reset_analysis(&mut self) {
        // in-flight work becomes stale
        self.analysis.seq += 1;
        self.analysis.status = AnalyzeStatus::Idle;
        self.analysis.error = None;
        self.analysis.result = None;
        self.analysis.languages.clear();
        self.emit(StateEvent::StatusChanged(AnalyzeStatus::Idle));
    }

    fn apply_outcome(&mut self, outcome: AnalysisOutcome) -> bool {
        if outcome.seq != self.analysis.seq || self.analysis.status != AnalyzeStatus::Loading {
            tracing::debug!(
                seq = outcome.seq,
                latest = self.analysis.seq,
                "discarding stale analysis result"
            );
            return false;
        }

        match outcome.result {
            Ok(resp) => {
                tracing::info!(seq = outcome.seq, repo = %resp.repo, lines = resp.data.stats.lines, "analysis finished");
                self.analysis.languages = analyze::languages_for(&resp);
                self.analysis.result = Some(resp);
                self.analysis.status = AnalyzeStatus::Success;
            }
            Err(e) => {
                tracing::info!(seq = outcome.seq, "analysis failed: {e}");
                self.analysis.error = Some(e.to_string());
                self.analysis.status = AnalyzeStatus::Error;
            }
        }
        self.emit(StateEvent::StatusChanged(self.analysis.status));
        true
    }

    /// Apply any finished requests without blocking.
    pub fn poll_analysis(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.analysis.rx.try_recv() {
            changed |= self.apply_outcome(outcome);
        }
        changed
    }

    /// Block until the latest request settles. No timeout: a stalled service
    /// keeps the state in `loading`.
    pub fn wait_analysis(&mut self) -> AnalyzeStatus {
        while self.analysis.status == AnalyzeStatus::Loading {
            match self.analysis.rx.recv() {
                Ok(outcome) => {
                    self.apply_outcome(outcome);
                }
                Err(_) => break,
            }
        }
        self.analysis.status
    }

    fn toggle_fab(&mut self) {
        if self.ui.suppress_click {
            self.ui.suppress_click = false;
            return;
        }
        if self.ui.panel_expanded {
            self.set_panel_expanded(false, true);
        } else {
            // every activation re-analyzes so config changes show up
            self.analyze_current_page();
            self.set_panel_expanded(true, true);
        }
    }
}
