//! Batch classification on a pool of worker threads.
//!
//! Every worker builds its own classifier (and so its own store connection)
//! once, then classifies documents pulled from a bounded queue until the batch
//! is drained. The queue bound applies backpressure to the submitting thread.

use std::any::Any;
use std::borrow::Borrow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{bounded, unbounded};
use log::{debug, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{Algorithm, ClassifierFactory, ClassifierOptions, Classify};
use crate::error::{ClassyError, Result};
use crate::features;

/// Builds the classifier owned by one worker, given the worker index.
pub type ClassifierBuilder<D> = dyn Fn(usize) -> Result<Box<dyn Classify<D>>> + Send + Sync;

/// Configuration for [`WorkerPool`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
    /// Number of workers (default: number of CPUs).
    pub workers: Option<usize>,

    /// Maximum number of documents waiting for a worker.
    pub queue_capacity: usize,

    /// Label returned when no category is confident enough
    /// (default: the algorithm's own default).
    pub default_category: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            workers: None,
            queue_capacity: 64,
            default_category: None,
        }
    }
}

/// The message carried by a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

enum WorkerEvent {
    Classified(usize, Result<String>),
    Failed(usize, ClassyError),
}

/// A fixed set of classification workers.
pub struct WorkerPool<D: ?Sized> {
    config: PoolConfig,
    workers: usize,
    thread_pool: ThreadPool,
    builder: Arc<ClassifierBuilder<D>>,
}

impl<D: ?Sized + 'static> WorkerPool<D> {
    /// Create a pool whose workers construct their classifier with `builder`.
    pub fn new<F>(config: PoolConfig, builder: F) -> Result<Self>
    where
        F: Fn(usize) -> Result<Box<dyn Classify<D>>> + Send + Sync + 'static,
    {
        let workers = config.workers.unwrap_or_else(num_cpus::get).max(1);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("classy-worker-{i}"))
            .build()
            .map_err(|e| ClassyError::worker(format!("Failed to create thread pool: {e}")))?;

        Ok(WorkerPool {
            config,
            workers,
            thread_pool,
            builder: Arc::new(builder),
        })
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Classify every `(id, document)` pair and return `(id, category)` pairs
    /// in submission order.
    ///
    /// The first worker or classification failure fails the whole batch. A
    /// panic inside a worker is reported the same way, with its message.
    pub fn classify_all<K, T>(&self, jobs: Vec<(K, T)>) -> Result<Vec<(K, String)>>
    where
        T: Borrow<D> + Send + 'static,
    {
        let (ids, documents): (Vec<K>, Vec<T>) = jobs.into_iter().unzip();
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = bounded::<(usize, T)>(self.config.queue_capacity.max(1));
        let (event_tx, event_rx) = unbounded::<WorkerEvent>();

        for worker in 0..self.workers.min(documents.len()) {
            let job_rx = job_rx.clone();
            let event_tx = event_tx.clone();
            let builder = Arc::clone(&self.builder);
            let default = self.config.default_category.clone();

            self.thread_pool.spawn(move || {
                let built = panic::catch_unwind(AssertUnwindSafe(|| builder(worker)))
                    .unwrap_or_else(|payload| {
                        Err(ClassyError::worker(format!(
                            "panicked: {}",
                            panic_message(payload.as_ref())
                        )))
                    });
                let classifier = match built {
                    Ok(classifier) => classifier,
                    Err(e) => {
                        warn!("worker {worker} failed to start: {e}");
                        let _ = event_tx.send(WorkerEvent::Failed(worker, e));
                        return;
                    }
                };

                for (index, document) in job_rx.iter() {
                    let document: &D = document.borrow();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        classifier.classify(document, default.as_deref())
                    }))
                    .unwrap_or_else(|payload| {
                        Err(ClassyError::worker(format!(
                            "panicked: {}",
                            panic_message(payload.as_ref())
                        )))
                    });
                    if let Err(e) = &result {
                        warn!("worker {worker} failed to classify document {index}: {e}");
                    }
                    if event_tx.send(WorkerEvent::Classified(index, result)).is_err() {
                        break;
                    }
                }
                debug!("worker {worker} finished");
            });
        }
        drop(job_rx);
        drop(event_tx);

        let total = documents.len();
        for job in documents.into_iter().enumerate() {
            // Every worker is gone; the events below say why.
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut labels: Vec<Option<String>> = vec![None; total];
        let mut failure = None;
        for event in event_rx.iter() {
            match event {
                WorkerEvent::Classified(index, Ok(label)) => labels[index] = Some(label),
                WorkerEvent::Classified(index, Err(e)) => {
                    failure.get_or_insert_with(|| {
                        ClassyError::worker(format!("document {index}: {e}"))
                    });
                }
                WorkerEvent::Failed(worker, e) => {
                    failure.get_or_insert_with(|| {
                        ClassyError::worker(format!("worker {worker} failed to start: {e}"))
                    });
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        ids.into_iter()
            .zip(labels)
            .enumerate()
            .map(|(index, (id, label))| match label {
                Some(label) => Ok((id, label)),
                None => Err(ClassyError::worker(format!(
                    "document {index} was not classified"
                ))),
            })
            .collect()
    }
}

impl WorkerPool<Value> {
    /// Create a pool of JSON document classifiers.
    ///
    /// `feature` names a built-in extractor (see [`features::by_name`]).
    /// Each worker opens its own store from `options`.
    pub fn with_options(
        config: PoolConfig,
        algorithm: Algorithm,
        options: ClassifierOptions,
        feature: &str,
    ) -> Result<Self> {
        let extractor = features::resolve(feature)?;
        Self::new(config, move |_| {
            ClassifierFactory::create(algorithm, &options, Arc::clone(&extractor))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::classifier::BaseClassifier;
    use crate::classifier::NaiveBayes;
    use crate::features::FeatureExtractor;
    use crate::features::words::WordExtractor;
    use crate::store::{CountStore, MemoryCountStore};

    fn shared_store() -> Arc<dyn CountStore> {
        let base = BaseClassifier::default();
        base.train("buy pharmaceuticals now", "bad").unwrap();
        base.train("make quick money at the online casino", "bad").unwrap();
        base.train("the quick rabbit jumps fances", "good").unwrap();
        base.train("the quick brown fox jumps", "good").unwrap();
        Arc::clone(base.store())
    }

    fn text_pool(config: PoolConfig, store: Arc<dyn CountStore>) -> WorkerPool<str> {
        WorkerPool::new(config, move |_| {
            let base =
                BaseClassifier::<str>::new(Arc::clone(&store), Arc::new(WordExtractor::default()));
            Ok(Box::new(NaiveBayes::new(base)) as Box<dyn Classify<str>>)
        })
        .unwrap()
    }

    #[test]
    fn test_results_in_submission_order() {
        let config = PoolConfig {
            workers: Some(4),
            queue_capacity: 2,
            ..Default::default()
        };
        let pool = text_pool(config, shared_store());
        assert_eq!(pool.workers(), 4);

        let jobs: Vec<(usize, String)> = (0..40)
            .map(|i| {
                let doc = if i % 2 == 0 { "quick rabbit" } else { "online casino money" };
                (i, doc.to_string())
            })
            .collect();

        let results = pool.classify_all(jobs).unwrap();
        assert_eq!(results.len(), 40);
        for (i, (id, label)) in results.iter().enumerate() {
            assert_eq!(*id, i);
            assert_eq!(label, if i % 2 == 0 { "good" } else { "bad" });
        }
    }

    #[test]
    fn test_empty_batch() {
        let pool = text_pool(PoolConfig::default(), shared_store());
        let results = pool.classify_all(Vec::<(u32, String)>::new()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_default_category() {
        let config = PoolConfig {
            workers: Some(2),
            default_category: Some("unsure".to_string()),
            ..Default::default()
        };
        let pool = text_pool(config, Arc::new(MemoryCountStore::default()));

        let results = pool
            .classify_all(vec![("a", "quick rabbit".to_string())])
            .unwrap();
        assert_eq!(results, vec![("a", "unsure".to_string())]);
    }

    #[test]
    fn test_one_classifier_per_worker() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let store = shared_store();
        let config = PoolConfig {
            workers: Some(3),
            ..Default::default()
        };
        let pool = WorkerPool::new(config, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            let base =
                BaseClassifier::<str>::new(Arc::clone(&store), Arc::new(WordExtractor::default()));
            Ok(Box::new(NaiveBayes::new(base)) as Box<dyn Classify<str>>)
        })
        .unwrap();

        let jobs: Vec<_> = (0..30).map(|i| (i, "quick fox".to_string())).collect();
        pool.classify_all(jobs).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_worker_start_failure() {
        let config = PoolConfig {
            workers: Some(2),
            ..Default::default()
        };
        let pool: WorkerPool<str> = WorkerPool::new(config, |worker| {
            Err(ClassyError::storage(format!("no database for worker {worker}")))
        })
        .unwrap();

        match pool.classify_all(vec![(1, "quick rabbit".to_string())]) {
            Err(ClassyError::Worker(msg)) => assert!(msg.contains("no database")),
            other => panic!("Expected worker error, got {other:?}"),
        }
    }

    #[test]
    fn test_panicking_extractor_names_document() {
        let store = shared_store();
        let config = PoolConfig {
            workers: Some(2),
            ..Default::default()
        };
        let pool = WorkerPool::new(config, move |_| {
            let extractor = |text: &str| -> Result<crate::features::Features> {
                if text.contains("casino") {
                    panic!("tokenizer exploded");
                }
                WordExtractor::default().features(text)
            };
            let base = BaseClassifier::<str>::new(Arc::clone(&store), Arc::new(extractor));
            Ok(Box::new(NaiveBayes::new(base)) as Box<dyn Classify<str>>)
        })
        .unwrap();

        let jobs = vec![
            (0, "quick rabbit".to_string()),
            (1, "online casino".to_string()),
            (2, "quick fox".to_string()),
        ];
        match pool.classify_all(jobs) {
            Err(ClassyError::Worker(msg)) => {
                assert!(msg.contains("document 1"), "{msg}");
                assert!(msg.contains("tokenizer exploded"), "{msg}");
            }
            other => panic!("Expected worker error, got {other:?}"),
        }

        // The pool is still usable.
        let results = pool.classify_all(vec![(0, "quick rabbit".to_string())]).unwrap();
        assert_eq!(results, vec![(0, "good".to_string())]);
    }

    #[test]
    fn test_panicking_builder() {
        let config = PoolConfig {
            workers: Some(1),
            ..Default::default()
        };
        let pool: WorkerPool<str> =
            WorkerPool::new(config, |_| panic!("no classifier today")).unwrap();

        match pool.classify_all(vec![(0, "quick rabbit".to_string())]) {
            Err(ClassyError::Worker(msg)) => assert!(msg.contains("no classifier today"), "{msg}"),
            other => panic!("Expected worker error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_pool_with_options() {
        let dir = tempfile::tempdir().unwrap();
        let options =
            ClassifierOptions::with_db_path(dir.path().join("train.db")).create_if_missing(true);

        let trainer = ClassifierFactory::create(
            Algorithm::Fisher,
            &options,
            features::resolve("getWords").unwrap(),
        )
        .unwrap();
        for _ in 0..10 {
            trainer.train(&json!("the quick rabbit jumps fances"), "good").unwrap();
            trainer.train(&json!("make quick money at the online casino"), "bad").unwrap();
        }
        trainer.close().unwrap();

        let config = PoolConfig {
            workers: Some(2),
            ..Default::default()
        };
        let pool =
            WorkerPool::with_options(config, Algorithm::Fisher, options, "getWords").unwrap();
        let results = pool
            .classify_all(vec![
                ("doc-1", json!({ "body": "quick rabbit" })),
                ("doc-2", json!(["online", "casino"])),
            ])
            .unwrap();

        assert_eq!(
            results,
            vec![("doc-1", "good".to_string()), ("doc-2", "bad".to_string())]
        );
    }

    #[test]
    fn test_unknown_feature_name() {
        let result = WorkerPool::with_options(
            PoolConfig::default(),
            Algorithm::NaiveBayes,
            ClassifierOptions::default(),
            "./features.js",
        );
        assert!(matches!(result, Err(ClassyError::Features(_))));
    }
}
