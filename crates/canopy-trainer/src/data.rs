//! Dataset fetching and train/test preparation.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use canopy_core::dataset::{Dataset, FeatureMatrix, Schema, train_test_split};

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Features and labels for both sides of the split.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub feature_names: Vec<String>,
    pub x_train: FeatureMatrix,
    pub y_train: Vec<u32>,
    pub x_test: FeatureMatrix,
    pub y_test: Vec<u32>,
}

impl PreparedData {
    pub fn n_train(&self) -> usize {
        self.y_train.len()
    }

    pub fn n_test(&self) -> usize {
        self.y_test.len()
    }
}

fn is_http(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads the raw CSV text from an http(s) URL or a local path.
pub async fn fetch_dataset(source: &str) -> Result<String> {
    if is_http(source) {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        let text = client
            .get(source)
            .send()
            .await
            .with_context(|| format!("failed to fetch dataset from {source}"))?
            .error_for_status()
            .with_context(|| format!("dataset request to {source} was rejected"))?
            .text()
            .await
            .context("failed to read dataset body")?;
        info!(source, bytes = text.len(), "fetched dataset");
        Ok(text)
    } else {
        let text = tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read dataset file {source}"))?;
        info!(source, bytes = text.len(), "loaded dataset file");
        Ok(text)
    }
}

/// Fetches and parses the diabetes dataset.
pub async fn load_dataset(source: &str) -> Result<Dataset> {
    let text = fetch_dataset(source).await?;
    let dataset = Dataset::from_csv_str(&text, Schema::pima())
        .with_context(|| format!("failed to parse dataset from {source}"))?;
    Ok(dataset)
}

/// Splits off the label column and partitions rows into train and test sets.
pub fn prepare(dataset: &Dataset, test_size: f64, seed: u64) -> Result<PreparedData> {
    let (x, y) = dataset.features_and_target()?;
    let split = train_test_split(x.n_rows(), test_size, seed)?;

    let gather = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<u32>>();
    let prepared = PreparedData {
        feature_names: dataset.feature_names().to_vec(),
        x_train: x.select(&split.train),
        y_train: gather(&split.train),
        x_test: x.select(&split.test),
        y_test: gather(&split.test),
    };
    info!(
        n_train = prepared.n_train(),
        n_test = prepared.n_test(),
        "split dataset"
    );
    Ok(prepared)
}
