use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet, time as tokio_time};

use larder_config::{Batch, Classifier};
use larder_storage::models::RecipeEmbedding;
use larder_taxonomy::{AssignmentEngine, TaxonomyTree};

use crate::{
	Error, Result,
	store::{AssignmentStore, ItemScope},
};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
	pub scope: ItemScope,
	pub dry_run: bool,
	pub follow: bool,
}

pub struct WorkerState<S> {
	pub store: Arc<S>,
	pub classifier: Classifier,
	pub batch: Batch,
	pub options: RunOptions,
}

/// Counters for one pass over the item feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
	pub pages: usize,
	pub fetched: usize,
	/// Items that received a label set, written or, in a dry run, only computed.
	pub assigned: usize,
	/// Items whose vector was missing or malformed.
	pub skipped: usize,
	pub persist_failures: usize,
	/// Item tasks that panicked or were cancelled before reporting.
	pub task_failures: usize,
	pub fallbacks: usize,
	pub dimension_mismatches: usize,
	pub labels_written: usize,
	pub dry_run: bool,
}
impl RunReport {
	fn record(&mut self, outcome: ItemOutcome) {
		match outcome {
			ItemOutcome::Skipped => self.skipped += 1,
			ItemOutcome::Classified { labels, fallback, dimension_mismatch, write } => {
				if fallback {
					self.fallbacks += 1;
				}
				if dimension_mismatch {
					self.dimension_mismatches += 1;
				}

				match write {
					WriteOutcome::Written => {
						self.assigned += 1;
						self.labels_written += labels;
					},
					WriteOutcome::DryRun => self.assigned += 1,
					WriteOutcome::Failed => self.persist_failures += 1,
				}
			},
		}
	}
}

#[derive(Debug)]
enum ItemOutcome {
	Skipped,
	Classified { labels: usize, fallback: bool, dimension_mismatch: bool, write: WriteOutcome },
}

#[derive(Debug)]
enum WriteOutcome {
	Written,
	DryRun,
	Failed,
}

/// Runs a single pass, or keeps polling forever when `follow` is set.
///
/// While following, store errors are logged and retried on the next poll. A taxonomy that cannot
/// be built is a configuration error and ends the loop.
pub async fn run_worker<S>(state: WorkerState<S>) -> Result<RunReport>
where
	S: AssignmentStore + 'static,
{
	if !state.options.follow {
		return run_pass(&state).await;
	}

	let poll_interval = Duration::from_millis(state.batch.poll_interval_ms);

	loop {
		match run_pass(&state).await {
			Ok(_) => {},
			Err(err @ Error::Taxonomy(_)) => {
				tracing::error!(error = %err, "Taxonomy is unusable. Stopping.");

				return Err(err);
			},
			Err(err) => tracing::error!(error = %err, "Assignment pass failed."),
		}

		tokio_time::sleep(poll_interval).await;
	}
}

/// Builds the tree once, then drains the item feed page by page.
pub async fn run_pass<S>(state: &WorkerState<S>) -> Result<RunReport>
where
	S: AssignmentStore + 'static,
{
	let rows = state.store.taxonomy().await?;
	let tree = Arc::new(TaxonomyTree::build(rows)?);

	tracing::info!(
		nodes = tree.len(),
		roots = tree.roots().len(),
		excluded = tree.excluded(),
		"Taxonomy tree built."
	);

	let mut report = RunReport { dry_run: state.options.dry_run, ..Default::default() };
	let mut after = i64::MIN;

	loop {
		let items = state.store.items(state.options.scope, after, state.batch.page_size).await?;
		let Some(last) = items.last() else {
			break;
		};
		let fetched = items.len();

		after = last.recipe_id;
		report.pages += 1;
		report.fetched += fetched;

		process_page(state, &tree, items, &mut report).await?;

		if fetched < state.batch.page_size as usize {
			break;
		}
	}

	tracing::info!(
		fetched = report.fetched,
		assigned = report.assigned,
		skipped = report.skipped,
		persist_failures = report.persist_failures,
		task_failures = report.task_failures,
		fallbacks = report.fallbacks,
		dry_run = report.dry_run,
		"Assignment pass finished."
	);

	Ok(report)
}

async fn process_page<S>(
	state: &WorkerState<S>,
	tree: &Arc<TaxonomyTree>,
	items: Vec<RecipeEmbedding>,
	report: &mut RunReport,
) -> Result<()>
where
	S: AssignmentStore + 'static,
{
	let semaphore = Arc::new(Semaphore::new(state.batch.concurrency as usize));
	let mut tasks = JoinSet::new();

	for item in items {
		let permit = semaphore
			.clone()
			.acquire_owned()
			.await
			.map_err(|err| Error::Message(format!("Failed to acquire worker permit: {err}.")))?;
		let store = state.store.clone();
		let tree = tree.clone();
		let classifier = state.classifier;
		let dry_run = state.options.dry_run;

		tasks.spawn(async move {
			let outcome = process_item(store.as_ref(), &tree, &classifier, dry_run, item).await;

			drop(permit);

			outcome
		});
	}

	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok(outcome) => report.record(outcome),
			Err(err) => {
				tracing::error!(error = %err, "Item task failed.");

				report.task_failures += 1;
			},
		}
	}

	Ok(())
}

async fn process_item<S>(
	store: &S,
	tree: &TaxonomyTree,
	classifier: &Classifier,
	dry_run: bool,
	item: RecipeEmbedding,
) -> ItemOutcome
where
	S: AssignmentStore,
{
	let recipe_id = item.recipe_id;
	let vector = match item.decode() {
		Ok(vector) => vector,
		Err(err) => {
			tracing::warn!(recipe_id, error = %err, "Recipe embedding is malformed. Skipping.");

			return ItemOutcome::Skipped;
		},
	};
	let engine = AssignmentEngine::new(tree, classifier);
	let dimension_mismatch = engine.dimension_mismatch(vector.len());

	if dimension_mismatch {
		tracing::warn!(
			recipe_id,
			dim = vector.len(),
			centroid_dims = ?tree.dimensions(),
			"Embedding dimension differs from taxonomy centroids. Comparing the common prefix."
		);
	}

	let classification = engine.classify(&vector);

	for branch in &classification.branches {
		tracing::debug!(
			recipe_id,
			root_id = branch.root.node_id,
			root_score = branch.root.score,
			leaf_count = branch.leaf_count,
			visited = branch.visited,
			outcome = ?branch.outcome,
			"Branch explored."
		);
	}

	if classification.fallback {
		tracing::debug!(recipe_id, "No branch produced a winner. Using tree-wide fallback.");
	}
	if classification.winners.is_empty() {
		tracing::warn!(recipe_id, "No category could be chosen. Skipping.");

		return ItemOutcome::Skipped;
	}

	let labels = classification.winners.len();
	let write = if dry_run {
		tracing::info!(
			recipe_id,
			winners = ?classification.winners,
			"Dry run. Assignment not written."
		);

		WriteOutcome::DryRun
	} else {
		match store.replace_assignments(recipe_id, &classification.winners).await {
			Ok(()) => {
				tracing::debug!(recipe_id, winners = labels, "Assignments replaced.");

				WriteOutcome::Written
			},
			Err(err) => {
				tracing::error!(error = %err, recipe_id, "Failed to persist assignments.");

				WriteOutcome::Failed
			},
		}
	};

	ItemOutcome::Classified { labels, fallback: classification.fallback, dimension_mismatch, write }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn report_counts_each_outcome() {
		let mut report = RunReport::default();

		report.record(ItemOutcome::Skipped);
		report.record(ItemOutcome::Classified {
			labels: 3,
			fallback: false,
			dimension_mismatch: true,
			write: WriteOutcome::Written,
		});
		report.record(ItemOutcome::Classified {
			labels: 1,
			fallback: true,
			dimension_mismatch: false,
			write: WriteOutcome::Failed,
		});
		report.record(ItemOutcome::Classified {
			labels: 2,
			fallback: false,
			dimension_mismatch: false,
			write: WriteOutcome::DryRun,
		});

		assert_eq!(report.skipped, 1);
		assert_eq!(report.assigned, 2);
		assert_eq!(report.labels_written, 3);
		assert_eq!(report.persist_failures, 1);
		assert_eq!(report.fallbacks, 1);
		assert_eq!(report.dimension_mismatches, 1);
	}
}
