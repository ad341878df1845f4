//! The rating desk: one session's rows, one draft at a time.

mod cursor;

pub use cursor::{progress_percent, total_pages, FilterCounts, RowCursor, Step};

use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::endpoints::examples::AnnotationExample;
use crate::endpoints::ratings::RatingCreate;
use crate::endpoints::sessions::{DataRow, PaginatedRows, ProjectForSession, RowFilter, SessionDetail};
use crate::error::{ApiError, ValidationError};
use crate::evaluation::{EvaluationForm, EvaluationResponse};
use crate::store::Store;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("you have unsaved changes")]
    UnsavedChanges,

    #[error("nothing to save, answer the evaluation first")]
    EmptyDraft,

    #[error("no row selected")]
    NoRow,

    #[error("project evaluation settings are invalid: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Every row of the session now has a rating from this rater.
    Completed,
}

pub struct RatingDesk {
    store: Store,
    session: SessionDetail,
    template: EvaluationForm,
    form: EvaluationForm,
    comment: String,
    rows: PaginatedRows,
    cursor: RowCursor,
    filter: RowFilter,
    dirty: bool,
    started: Instant,
}

impl RatingDesk {
    /// Load the session and its first page of rows.
    pub async fn open(store: Store, session_id: Uuid, per_page: u32) -> Result<Self, DeskError> {
        let session = store.session(session_id).await?;
        let template = session.project.evaluation_form()?;
        let cursor = RowCursor::new(per_page);
        let filter = RowFilter::All;
        let rows = store.rows(session_id, cursor.page, cursor.per_page, filter).await?;

        info!(%session_id, rows = session.counts.row_count, "rating desk opened");

        let mut desk = Self {
            store,
            session,
            form: template.clone(),
            template,
            comment: String::new(),
            rows,
            cursor,
            filter,
            dirty: false,
            started: Instant::now(),
        };
        desk.load_row();
        Ok(desk)
    }

    // STATE

    pub fn session(&self) -> &SessionDetail {
        &self.session
    }

    pub fn project(&self) -> &ProjectForSession {
        &self.session.project
    }

    pub fn instructions(&self) -> Option<&str> {
        self.session
            .project
            .instructions
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn rows(&self) -> &PaginatedRows {
        &self.rows
    }

    pub fn current_row(&self) -> Option<&DataRow> {
        self.rows.items.get(self.cursor.index)
    }

    pub fn cursor(&self) -> RowCursor {
        self.cursor
    }

    pub fn filter(&self) -> RowFilter {
        self.filter
    }

    pub fn form(&self) -> &EvaluationForm {
        &self.form
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn rated_count(&self) -> u64 {
        self.rows.rated_count
    }

    pub fn counts(&self) -> FilterCounts {
        FilterCounts::new(self.session.counts.row_count, self.rows.rated_count)
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.rows.rated_count, self.session.counts.row_count)
    }

    /// 1-based position of the current row and the number of rows in the current filter.
    pub fn position(&self) -> (u64, u64) {
        (self.cursor.global_index() + 1, self.rows.total)
    }

    pub fn at_start(&self) -> bool {
        self.cursor.at_start()
    }

    pub fn at_end(&self) -> bool {
        self.cursor.at_end(&self.rows)
    }

    pub async fn examples(&self) -> Result<Vec<AnnotationExample>, ApiError> {
        self.store.examples(self.session.project.id).await
    }

    // DRAFT

    /// Reset the draft to the current row's saved rating, or to empty.
    fn load_row(&mut self) {
        self.form = self.template.clone();
        self.comment.clear();

        if let Some(mine) = self.rows.items.get(self.cursor.index).and_then(|row| row.my_rating.as_ref()) {
            self.form.load(mine.submission().as_ref());
            self.comment = mine.comment.clone().unwrap_or_default();
        }

        self.dirty = false;
        self.started = Instant::now();
    }

    /// Set an answer. `key` names the question in multi-question projects.
    pub fn set_response(&mut self, key: Option<&str>, response: EvaluationResponse) -> Result<(), DeskError> {
        self.form.answer(key, response)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
        self.dirty = true;
    }

    // NAVIGATION

    async fn load_page(&mut self) -> Result<(), DeskError> {
        self.rows = self
            .store
            .rows(self.session.session.id, self.cursor.page, self.cursor.per_page, self.filter)
            .await?;
        self.cursor.clamp(self.rows.items.len());
        self.load_row();
        Ok(())
    }

    async fn apply(&mut self, step: Step) -> Result<Step, DeskError> {
        match step {
            Step::LoadPage(page) => {
                debug!(page, "loading row page");
                self.load_page().await?;
            }
            Step::Moved => self.load_row(),
            Step::AtStart | Step::AtEnd => {}
        }
        Ok(step)
    }

    pub async fn next(&mut self) -> Result<Step, DeskError> {
        if self.dirty {
            return Err(DeskError::UnsavedChanges);
        }
        let step = self.cursor.next(&self.rows);
        self.apply(step).await
    }

    pub async fn previous(&mut self) -> Result<Step, DeskError> {
        if self.dirty {
            return Err(DeskError::UnsavedChanges);
        }
        let step = self.cursor.previous();
        self.apply(step).await
    }

    /// Move on without saving. Unsaved changes are only dropped when `confirmed`.
    pub async fn skip(&mut self, confirmed: bool) -> Result<Step, DeskError> {
        if self.dirty && !confirmed {
            return Err(DeskError::UnsavedChanges);
        }

        self.dirty = false;
        let step = self.cursor.next(&self.rows);
        if matches!(step, Step::AtEnd) {
            self.load_row();
        }
        self.apply(step).await
    }

    /// Switch the row filter and go back to the first row.
    pub async fn set_filter(&mut self, filter: RowFilter) -> Result<(), DeskError> {
        if self.dirty {
            return Err(DeskError::UnsavedChanges);
        }
        self.filter = filter;
        self.cursor.reset();
        self.load_page().await
    }

    /// Re-read the session counts and the current page from the server.
    async fn refresh(&mut self) -> Result<(), DeskError> {
        let session_id = self.session.session.id;
        self.session = self.store.session(session_id).await?;
        self.rows = self
            .store
            .refetch_rows(session_id, self.cursor.page, self.cursor.per_page, self.filter)
            .await?;

        // Rating the last row of the last unrated page can empty that page.
        if self.rows.items.is_empty() && self.cursor.page > 1 {
            self.cursor.page = self.rows.total_pages.max(1);
            self.cursor.index = usize::MAX;
            self.rows = self
                .store
                .rows(session_id, self.cursor.page, self.cursor.per_page, self.filter)
                .await?;
        }

        self.cursor.clamp(self.rows.items.len());
        self.load_row();
        Ok(())
    }

    // SAVE

    /// Submit the draft for the current row.
    ///
    /// With `move_next` the desk advances afterwards. Under the unrated
    /// filter the saved row leaves the list, so the same position already
    /// holds the next row.
    pub async fn save(&mut self, move_next: bool) -> Result<SaveOutcome, DeskError> {
        let row = self.current_row().ok_or(DeskError::NoRow)?;
        let row_id = row.id;
        let was_rated = row.is_rated();

        let submission = self.form.submission().ok_or(DeskError::EmptyDraft)?;
        self.form.validate()?;

        let elapsed = self.started.elapsed().as_millis() as u64;
        let request = RatingCreate::new(row_id, self.session.session.id, submission)
            .with_comment(&self.comment)
            .with_time_spent_ms(elapsed);
        self.store.submit_rating(&request).await?;
        self.dirty = false;

        let rated = if was_rated { self.rows.rated_count } else { self.rows.rated_count + 1 };
        let total = self.session.counts.row_count;
        info!(%row_id, rated, total, "rating saved");

        if total > 0 && rated >= total {
            self.refresh().await?;
            return Ok(SaveOutcome::Completed);
        }

        if !move_next || self.filter == RowFilter::Unrated {
            self.refresh().await?;
            return Ok(SaveOutcome::Saved);
        }

        match self.cursor.next(&self.rows) {
            Step::LoadPage(_) => {
                self.session = self.store.session(self.session.session.id).await?;
                self.load_page().await?;
            }
            Step::Moved => {
                let index = self.cursor.index;
                self.refresh().await?;
                self.cursor.index = index;
                self.cursor.clamp(self.rows.items.len());
                self.load_row();
            }
            Step::AtStart | Step::AtEnd => self.refresh().await?,
        }
        Ok(SaveOutcome::Saved)
    }
}
