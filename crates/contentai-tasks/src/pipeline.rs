//! The shared fetch → template → call → parse routine.
//!
//! Batch operations run one [`AnalysisPipeline`] over every fetched record.
//! Per-record operations run a pipeline per record inside [`fold_records`],
//! which turns each record's outcome into an entry of an ordered list so a
//! failing record never aborts the rest.

use std::future::Future;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use contentai_core::{
    ChatMessage, CompletionBackend, CompletionOptions, ContentRecord, ContentRepository, Error,
    Result, TaskFilters,
};

/// Collaborators available to an analysis operation.
#[derive(Clone, Copy)]
pub struct OperationContext<'a> {
    pub content: &'a dyn ContentRepository,
    pub completion: &'a dyn CompletionBackend,
    pub options: CompletionOptions,
}

impl<'a> OperationContext<'a> {
    pub fn new(content: &'a dyn ContentRepository, completion: &'a dyn CompletionBackend) -> Self {
        Self {
            content,
            completion,
            options: CompletionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Which rows an operation reads.
#[derive(Debug, Clone, Copy)]
pub enum RecordSource<'a> {
    /// Rows matching every set filter.
    Filtered(&'a TaskFilters),
    /// Rows with these ids, in this order.
    Ids(&'a [String]),
}

impl RecordSource<'_> {
    pub async fn fetch(&self, ctx: &OperationContext<'_>, table: &str) -> Result<Vec<ContentRecord>> {
        let records = match self {
            RecordSource::Filtered(filters) => ctx.content.fetch_filtered(table, filters).await?,
            RecordSource::Ids(ids) => ctx.content.fetch_by_ids(table, ids).await?,
        };
        debug!(
            subsystem = "tasks",
            component = "pipeline",
            table,
            record_count = records.len(),
            "Records fetched"
        );
        Ok(records)
    }
}

/// One prompt template, its system message and the parser for the reply.
pub struct AnalysisPipeline<I: ?Sized, T> {
    pub name: &'static str,
    pub system_prompt: &'static str,
    pub render: fn(&I) -> String,
    pub parse: fn(&str) -> Result<T>,
}

impl<I: ?Sized, T> AnalysisPipeline<I, T> {
    /// Render `input`, send it with the system message and parse the reply.
    pub async fn call(&self, ctx: &OperationContext<'_>, input: &I) -> Result<T> {
        let start = Instant::now();
        let prompt = (self.render)(input);
        let messages = [
            ChatMessage::system(self.system_prompt),
            ChatMessage::user(prompt),
        ];
        let reply = ctx.completion.complete(&messages, ctx.options).await?;
        debug!(
            subsystem = "tasks",
            component = "pipeline",
            op = self.name,
            model = ctx.completion.model_name(),
            prompt_len = messages[1].content.len(),
            response_len = reply.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        (self.parse)(&reply)
    }
}

impl<T> AnalysisPipeline<[ContentRecord], T> {
    /// Fetch, then run one call over all rows.
    ///
    /// Returns `None` when the fetch finds nothing; no call is made then.
    pub async fn run_batch(
        &self,
        ctx: &OperationContext<'_>,
        table: &str,
        source: RecordSource<'_>,
    ) -> Result<Option<(usize, T)>> {
        let records = source.fetch(ctx, table).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let value = self.call(ctx, &records).await?;
        Ok(Some((records.len(), value)))
    }
}

/// Run `step` over every record in order, converting failures with `recover`.
pub async fn fold_records<'r, T, F, Fut, R>(
    records: &'r [ContentRecord],
    mut step: F,
    recover: R,
) -> Vec<T>
where
    F: FnMut(&'r ContentRecord) -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&'r ContentRecord, &Error) -> T,
{
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        match step(record).await {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(
                    subsystem = "tasks",
                    component = "pipeline",
                    record_id = %record.id,
                    error = %e,
                    "Record failed, continuing with the rest"
                );
                entries.push(recover(record, &e));
            }
        }
    }
    entries
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fold_records_isolates_failures_in_order() {
        let records = [record("a"), record("b"), record("c")];
        let entries = fold_records(
            &records,
            |r| async move {
                if r.id == "b" {
                    Err(Error::Inference("boom".to_string()))
                } else {
                    Ok(format!("ok:{}", r.id))
                }
            },
            |r, e| format!("err:{}:{}", r.id, e),
        )
        .await;
        assert_eq!(
            entries,
            vec!["ok:a", "err:b:Inference error: boom", "ok:c"]
        );
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }
}
