//! Chunked, resumable execution of a provider over many input addresses.
//!
//! An operator is driven by repeated [`StreamingOperator::step`] calls. Each
//! call does at most one row's resolution plus up to `max_output` emitted
//! rows, so memory stays bounded by one input row's results. Rows whose
//! address fails to resolve are skipped; later rows are still attempted.

use crate::config::EngineConfig;
use crate::context::ContextResolver;
use crate::error::Result;
use crate::git::HandleCache;
use crate::providers::{Provider, Session};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::vec::IntoIter;
use tracing::{debug, warn};

/// One input row: an address and an optional explicit revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    pub address: Option<String>,
    pub revision: Option<String>,
}

impl InputRow {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

/// What the host should do after a `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The current input chunk is exhausted; pass the next one.
    NeedMoreInput,
    /// Call `step` again with the same input chunk.
    HaveMoreOutput,
}

enum OperatorState<R> {
    AwaitingInput,
    /// Results of the current input row; the iterator is the output cursor.
    OutputReady(IntoIter<R>),
}

/// Streaming form of a provider, owned by one execution unit.
///
/// Owns its own [`HandleCache`], so instances are never shared between
/// threads; create one per worker.
pub struct StreamingOperator<'a, P: Provider> {
    provider: &'a P,
    resolver: &'a ContextResolver,
    revision: Option<String>,
    cache: HandleCache,
    state: OperatorState<P::Row>,
    input_cursor: usize,
    skipped: usize,
}

impl<'a, P: Provider> StreamingOperator<'a, P> {
    /// `revision` applies to rows that do not carry their own.
    pub fn new(provider: &'a P, resolver: &'a ContextResolver, revision: Option<String>) -> Self {
        Self {
            provider,
            resolver,
            revision,
            cache: HandleCache::new(),
            state: OperatorState::AwaitingInput,
            input_cursor: 0,
            skipped: 0,
        }
    }

    /// Advances the operator by one bounded unit of work.
    ///
    /// Appends up to `max_output` rows to `output`. Returns `NeedMoreInput`
    /// only when both the input chunk and the current row's results are
    /// exhausted; the next call then expects a fresh chunk.
    pub fn step(
        &mut self,
        input: &[InputRow],
        output: &mut Vec<P::Row>,
        max_output: usize,
    ) -> StepResult {
        let max_output = max_output.max(1);

        if let OperatorState::AwaitingInput = self.state {
            let Some(row) = input.get(self.input_cursor) else {
                self.input_cursor = 0;
                return StepResult::NeedMoreInput;
            };

            match self.load(row) {
                Ok(rows) => self.state = OperatorState::OutputReady(rows.into_iter()),
                Err(err) => {
                    self.skipped += 1;
                    if err.is_resolution() {
                        debug!(function = P::NAME, row = ?row.address, error = %err, "skipping row");
                    } else {
                        warn!(function = P::NAME, row = ?row.address, error = %err, "skipping row");
                    }
                    return self.advance(input.len());
                }
            }
        }

        if let OperatorState::OutputReady(rows) = &mut self.state {
            output.extend(rows.by_ref().take(max_output));
            if rows.len() > 0 {
                return StepResult::HaveMoreOutput;
            }
        }

        self.state = OperatorState::AwaitingInput;
        self.advance(input.len())
    }

    /// Drives the operator over `input` to completion, feeding it in chunks
    /// of `chunk_size` rows and emitting at most `chunk_size` rows per step.
    pub fn run(&mut self, input: &[InputRow], chunk_size: usize) -> Vec<P::Row> {
        let chunk_size = chunk_size.max(1);
        let mut results = Vec::new();
        for chunk in input.chunks(chunk_size) {
            let mut output = Vec::with_capacity(chunk_size);
            loop {
                let status = self.step(chunk, &mut output, chunk_size);
                results.append(&mut output);
                if status == StepResult::NeedMoreInput {
                    break;
                }
            }
        }
        results
    }

    /// Number of input rows skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The operator's handle cache.
    pub fn cache(&self) -> &HandleCache {
        &self.cache
    }

    fn advance(&mut self, input_len: usize) -> StepResult {
        self.input_cursor += 1;
        if self.input_cursor >= input_len {
            self.input_cursor = 0;
            StepResult::NeedMoreInput
        } else {
            StepResult::HaveMoreOutput
        }
    }

    fn load(&mut self, row: &InputRow) -> Result<Vec<P::Row>> {
        let Some(address) = row.address.as_deref() else {
            return Ok(Vec::new());
        };
        let revision = row.revision.as_deref().or(self.revision.as_deref());
        let context = self.resolver.resolve_with_revision(address, revision)?;
        self.provider
            .extract(&mut Session::new(self.resolver, &mut self.cache), &context)
    }
}

/// Runs `provider` over `input` on a dedicated pool of `config.threads`
/// workers.
///
/// The input is split into contiguous partitions, one operator per
/// partition. Results come back in input order.
pub fn run_partitioned<P: Provider>(
    provider: &P,
    resolver: &ContextResolver,
    input: &[InputRow],
    revision: Option<&str>,
    config: &EngineConfig,
) -> Result<Vec<P::Row>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let threads = config.threads.max(1);
    let partition = input.len().div_ceil(threads);
    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;

    let partitions: Vec<(Vec<P::Row>, usize)> = pool.install(|| {
        input
            .par_chunks(partition)
            .map(|part| {
                let mut operator =
                    StreamingOperator::new(provider, resolver, revision.map(str::to_string));
                let rows = operator.run(part, config.chunk_size);
                (rows, operator.skipped())
            })
            .collect()
    });

    let skipped: usize = partitions.iter().map(|(_, skipped)| skipped).sum();
    if skipped > 0 {
        debug!(function = P::NAME, skipped, total = input.len(), "skipped unresolvable rows");
    }
    Ok(partitions.into_iter().flat_map(|(rows, _)| rows).collect())
}
