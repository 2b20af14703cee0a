//! Parallel validation of independent resources.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::config::FhirNodeConfig;
use crate::error::{FhirNodeError, Result, ValidationError};
use crate::types::Node;
use crate::validation;

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duration: Duration,
    /// Input position and first violation of every invalid node, in input order
    pub failures: Vec<(usize, ValidationError)>,
}

impl BatchReport {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }

    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() == 0.0 {
            0.0
        } else {
            self.total as f64 / self.duration.as_secs_f64()
        }
    }

    pub fn is_all_valid(&self) -> bool {
        self.invalid == 0
    }
}

/// Validate every node's full tree on the blocking pool, at most
/// `config.batch.max_concurrency` at a time.
pub async fn validate_batch(nodes: Vec<Node>, config: &FhirNodeConfig) -> Result<BatchReport> {
    let start = Instant::now();
    let total = nodes.len();
    let permits = config.batch.max_concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(permits));
    tracing::debug!("Validating {} resources with {} workers", total, permits);

    let tasks: Vec<_> = nodes
        .into_iter()
        .map(|node| {
            let semaphore = semaphore.clone();
            let build = config.build.clone();
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FhirNodeError::concurrency(e.to_string()))?;
                let outcome =
                    tokio::task::spawn_blocking(move || validation::validate_tree(&node, &build))
                        .await
                        .map_err(|e| {
                            FhirNodeError::concurrency(format!("Validation task failed: {e}"))
                        })?;
                Ok::<_, FhirNodeError>(outcome)
            })
        })
        .collect();

    let mut report = BatchReport {
        total,
        ..Default::default()
    };
    for (index, joined) in futures::future::join_all(tasks).await.into_iter().enumerate() {
        let outcome = joined
            .map_err(|e| FhirNodeError::concurrency(format!("Validation task failed: {e}")))??;
        match outcome {
            Ok(()) => report.valid += 1,
            Err(violation) => {
                report.invalid += 1;
                report.failures.push((index, violation));
            }
        }
    }
    report.duration = start.elapsed();

    tracing::info!(
        "Validated {} resources in {:?}: {} valid, {} invalid",
        report.total,
        report.duration,
        report.valid,
        report.invalid
    );
    Ok(report)
}
