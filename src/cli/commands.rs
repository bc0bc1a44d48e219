//! Command implementations for the classy worker.

use std::io::{self, Write};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{Algorithm, ClassifierFactory, ClassifierOptions, DatabaseOptions};
use crate::cli::args::*;
use crate::error::Result;
use crate::features;

/// Result of classifying one document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub algorithm: Algorithm,
}

/// Execute the worker command, writing the result to stdout.
pub fn execute_command(args: ClassyArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)
}

/// Execute the worker command, writing the result to `out`.
///
/// Classifies `--data` and writes the label, or with `--train` records the
/// document under the given category and writes nothing.
pub fn run<W: Write>(args: &ClassyArgs, out: &mut W) -> Result<()> {
    let document: Value = serde_json::from_str(&args.data)?;
    let extractor = features::resolve(&args.feature)?;
    let options = load_options(args)?;

    let classifier = ClassifierFactory::create(args.algorithm, &options, extractor)?;

    match &args.train {
        Some(category) => {
            classifier.train(&document, category)?;
            info!(
                "trained document under '{category}' in {}",
                args.db_path.display()
            );
        }
        None => {
            let label = classifier.classify(&document, args.default.as_deref())?;
            output_label(label, args, out)?;
        }
    }

    classifier.close()
}

/// Options from `--options`, pointed at `--dbpath`.
///
/// Training creates the database when it is missing; classifying against a
/// missing database falls back to empty in-memory counts.
fn load_options(args: &ClassyArgs) -> Result<ClassifierOptions> {
    let mut options = match &args.options {
        Some(path) => ClassifierOptions::from_json_file(path)?,
        None => ClassifierOptions::default(),
    };

    let busy_timeout_ms = options.database.as_ref().and_then(|db| db.busy_timeout_ms);
    options.database = Some(DatabaseOptions {
        db_path: args.db_path.clone(),
        create_if_missing: args.train.is_some(),
        busy_timeout_ms,
    });
    Ok(options)
}

fn output_label<W: Write>(label: String, args: &ClassyArgs, out: &mut W) -> Result<()> {
    match args.output_format {
        OutputFormat::Text => writeln!(out, "{label}")?,
        OutputFormat::Json => {
            let result = ClassificationResult {
                label,
                algorithm: args.algorithm,
            };
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::*;
    use crate::error::ClassyError;

    fn args(db: &Path, extra: &[&str]) -> ClassyArgs {
        let mut argv = vec!["classy", "--dbpath", db.to_str().unwrap()];
        argv.extend_from_slice(extra);
        ClassyArgs::try_parse_from(argv).unwrap()
    }

    fn output(args: &ClassyArgs) -> Result<String> {
        let mut out = Vec::new();
        run(args, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn train_sample(db: &Path) {
        let sample = [
            (r#""Nobody owns the water.""#, "good"),
            (r#""the quick rabbit jumps fances""#, "good"),
            (r#""buy pharmaceuticals now""#, "bad"),
            (r#"{"body": "make quick money at the online casino"}"#, "bad"),
            (r#"["the quick brown fox", "jumps"]"#, "good"),
        ];
        for _ in 0..10 {
            for (data, category) in sample {
                let written = output(&args(db, &["--data", data, "--train", category])).unwrap();
                assert!(written.is_empty());
            }
        }
    }

    #[test]
    fn test_train_then_classify() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("train.db");
        train_sample(&db);
        assert!(db.exists());

        let label = output(&args(&db, &["--data", r#""quick rabbit""#])).unwrap();
        assert_eq!(label, "good\n");

        let label = output(&args(&db, &["-a", "Fisher", "--data", r#""quick money""#])).unwrap();
        assert_eq!(label, "bad\n");
    }

    #[test]
    fn test_options_file_minimums() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("train.db");
        train_sample(&db);

        let options = dir.path().join("options.json");
        std::fs::write(&options, r#"{ "minimums": { "bad": 0.99, "good": 0.4 } }"#).unwrap();

        let argv = [
            "-a",
            "Fisher",
            "--options",
            options.to_str().unwrap(),
            "--default",
            "review",
            "--data",
            r#""quick money""#,
        ];
        assert_eq!(output(&args(&db, &argv)).unwrap(), "review\n");
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("train.db");
        train_sample(&db);

        let written = output(&args(
            &db,
            &["--format", "json", "--data", r#""quick rabbit""#],
        ))
        .unwrap();
        let result: ClassificationResult = serde_json::from_str(&written).unwrap();
        assert_eq!(result.label, "good");
        assert_eq!(result.algorithm, Algorithm::NaiveBayes);
    }

    #[test]
    fn test_missing_database_classifies_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent.db");

        let label = output(&args(&db, &["--data", r#""quick rabbit""#])).unwrap();
        assert_eq!(label, "\n");
        let label = output(&args(&db, &["-a", "fisher", "--data", r#""quick rabbit""#])).unwrap();
        assert_eq!(label, "unknown\n");
        assert!(!db.exists());
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("train.db");

        let result = output(&args(&db, &["--data", "{not json"]));
        assert!(matches!(result, Err(ClassyError::Json(_))));

        let result = output(&args(&db, &["--feature", "./custom.js", "--data", "{}"]));
        assert!(matches!(result, Err(ClassyError::Features(_))));
    }
}
