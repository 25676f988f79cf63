use super::phase::{PhaseTransition, SearchMachine, SearchPhase};
use super::poll::{pause, until_cancelled, PollPolicy};
use crate::api::{SearchApi, StatusReport};
use crate::error::{AppError, Result};
use crate::models::{
    PaginationState, Parallel, SearchJob, SearchParameters, SearchSelection, TextReference,
};
use crate::state::{StateSink, StateUpdate};
use crate::transport::Transport;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Everything needed to run one search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Language whose corpus backs a `corpus` stoplist
    pub language: String,
    pub source: TextReference,
    pub target: TextReference,
    pub parameters: SearchParameters,
}

impl SearchRequest {
    /// Build a request from the current selection, refusing unready selections
    pub fn new(
        language: impl Into<String>,
        selection: &SearchSelection,
        parameters: SearchParameters,
    ) -> Result<Self> {
        let (source, target) = match (&selection.source, &selection.target) {
            (Some(source), Some(target)) if selection.search_ready() => {
                (source.clone(), target.clone())
            }
            _ => {
                return Err(AppError::Validation(
                    "a source and a target text must be selected".to_string(),
                ))
            }
        };
        parameters.validate()?;

        let language = language.into();
        if language.trim().is_empty() {
            return Err(AppError::Validation("language must not be empty".to_string()));
        }

        Ok(Self {
            language,
            source,
            target,
            parameters,
        })
    }
}

/// Summary of a finished search run
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub run_id: Uuid,
    pub search_id: String,
    /// Status checks made; zero when results came with the submission
    pub polls: u32,
    pub completed_synchronously: bool,
}

/// Drives a search from stoplist to published results
pub struct SearchOrchestrator<T, S> {
    api: SearchApi<T>,
    sink: S,
    policy: PollPolicy,
    last_run: Mutex<Vec<PhaseTransition>>,
}

impl<T: Transport, S: StateSink> SearchOrchestrator<T, S> {
    pub fn new(transport: T, sink: S, policy: PollPolicy) -> Self {
        Self {
            api: SearchApi::new(transport),
            sink,
            policy,
            last_run: Mutex::new(Vec::new()),
        }
    }

    pub fn api(&self) -> &SearchApi<T> {
        &self.api
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Phase transitions recorded by the most recent `run_search`
    pub fn last_run(&self) -> Vec<PhaseTransition> {
        self.last_run.lock().clone()
    }

    /// Run a full search and publish its first page of results.
    ///
    /// `SearchInProgress(true)` is published on entry and
    /// `SearchInProgress(false)` on every exit, including errors and
    /// cancellation.
    #[instrument(skip_all, fields(source = %request.source.object_id, target = %request.target.object_id))]
    pub async fn run_search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let mut machine = SearchMachine::new();
        machine.transition_to(SearchPhase::StoplistPending, "search requested")?;
        self.sink.apply(StateUpdate::SearchInProgress(true));

        let result = self.drive(&mut machine, request, cancel).await;

        if let Err(e) = &result {
            machine.abort(e);
            warn!(run_id = %machine.run_id(), phase = %machine.phase(), error = %e, "Search aborted");
        }

        self.sink.apply(StateUpdate::SearchInProgress(false));
        *self.last_run.lock() = machine.transitions().to_vec();

        result
    }

    async fn drive(
        &self,
        machine: &mut SearchMachine,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let params = &request.parameters;
        let basis = params
            .stoplist_basis
            .resolve(&request.language, &request.source, &request.target);

        let stopwords = until_cancelled(
            cancel,
            self.api
                .fetch_stoplist(&params.feature, params.stoplist_size, &basis),
        )
        .await?
        .publish(&self.sink);
        machine.transition_to(
            SearchPhase::SearchSubmitted,
            format!("{} stopwords resolved", stopwords.len()),
        )?;

        let submission = until_cancelled(
            cancel,
            self.api
                .initiate_search(&request.source, &request.target, params, &stopwords),
        )
        .await?
        .publish(&self.sink);
        let search_id = submission.search_id;

        if submission.results.is_some() {
            machine.transition_to(SearchPhase::Idle, "results embedded in submission")?;
            info!(run_id = %machine.run_id(), search_id = %search_id, "Search completed synchronously");
            return Ok(SearchOutcome {
                run_id: machine.run_id(),
                search_id,
                polls: 0,
                completed_synchronously: true,
            });
        }

        machine.transition_to(SearchPhase::Polling, "awaiting completion")?;
        let job = self.poll_until_done(machine, &search_id, cancel).await?;

        machine.transition_to(
            SearchPhase::ResultsFetching,
            format!("done after {} status checks", job.polls),
        )?;
        let page = until_cancelled(
            cancel,
            self.api.fetch_results(&search_id, &PaginationState::default()),
        )
        .await?
        .publish(&self.sink);
        machine.transition_to(SearchPhase::Idle, "results published")?;

        info!(
            run_id = %machine.run_id(),
            search_id = %search_id,
            polls = job.polls,
            total_count = page.total_count,
            "Search completed"
        );

        Ok(SearchOutcome {
            run_id: machine.run_id(),
            search_id,
            polls: job.polls,
            completed_synchronously: false,
        })
    }

    async fn poll_until_done(
        &self,
        machine: &mut SearchMachine,
        search_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchJob> {
        let mut job = SearchJob::new(search_id);

        loop {
            if let Some(max_polls) = self.policy.max_polls {
                if job.polls >= max_polls {
                    return Err(AppError::PollLimitExceeded {
                        search_id: search_id.to_string(),
                        polls: job.polls,
                    });
                }
            }

            let report = self
                .status_with_retry(search_id, cancel)
                .await?
                .publish(&self.sink);

            let status = report.status.ok_or_else(|| {
                AppError::Protocol(format!(
                    "status response for search {} has no status field",
                    search_id
                ))
            })?;
            job.record(status.clone(), report.progress);

            if status.is_done() {
                return Ok(job);
            }
            if status.is_failed() {
                return Err(AppError::SearchFailed {
                    search_id: search_id.to_string(),
                    status: status.to_string(),
                });
            }

            machine.transition_to(SearchPhase::Polling, status.to_string())?;
            pause(self.policy.delay_after(job.polls), cancel).await?;
        }
    }

    /// One status check, retried on transport failures up to the policy limit
    async fn status_with_retry(
        &self,
        search_id: &str,
        cancel: &CancellationToken,
    ) -> Result<crate::api::Step<StatusReport>> {
        let mut attempt = 0;

        loop {
            match until_cancelled(cancel, self.api.search_status(search_id)).await {
                Ok(step) => return Ok(step),
                Err(e) if e.is_transient() && attempt < self.policy.transient_retries => {
                    attempt += 1;
                    let delay = self.policy.retry_delay(attempt);
                    warn!(
                        search_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Status check failed, retrying"
                    );
                    pause(delay, cancel).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch another page or sort order of an existing search.
    ///
    /// `ChangingPage(false)` is published whether or not the fetch succeeds.
    pub async fn change_page(
        &self,
        search_id: &str,
        pagination: &PaginationState,
    ) -> Result<Vec<Parallel>> {
        self.sink.apply(StateUpdate::ChangingPage(true));

        let result = self
            .api
            .fetch_results(search_id, pagination)
            .await
            .map(|step| step.publish(&self.sink).parallels);

        self.sink.apply(StateUpdate::ChangingPage(false));

        if let Err(e) = &result {
            warn!(search_id, page = pagination.current_page, error = %e, "Page change failed");
        }
        result
    }
}
