use std::process::Command;

use canopy_core::dataset::PIMA_FEATURES;
use canopy_trainer::{TrainConfig, run_training};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/diabetes_sample.csv"
);

fn config_for(server: &ServerGuard) -> TrainConfig {
    TrainConfig {
        tracking_uri: server.url(),
        dataset_url: FIXTURE.to_string(),
        ..TrainConfig::default()
    }
}

/// Experiment lookup and run creation, shared by every pipeline test.
async fn mock_experiment_and_run(server: &mut ServerGuard) -> Vec<Mock> {
    let lookup = server
        .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
        .match_query(Matcher::UrlEncoded(
            "experiment_name".into(),
            "Resume_Project_Experiment".into(),
        ))
        .with_status(200)
        .with_body(
            json!({
                "experiment": {
                    "experiment_id": "1",
                    "name": "Resume_Project_Experiment",
                    "lifecycle_stage": "active"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/2.0/mlflow/runs/create")
        .with_status(200)
        .with_body(
            json!({
                "run": {
                    "info": {
                        "run_id": "r1",
                        "experiment_id": "1",
                        "status": "RUNNING",
                        "artifact_uri": "mlflow-artifacts:/1/r1/artifacts"
                    }
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    vec![lookup, create]
}

async fn mock_ok(server: &mut ServerGuard, method: &str, path: &str) -> Mock {
    server
        .mock(method, path)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await
}

#[tokio::test]
async fn full_run_logs_everything_and_finishes() {
    let mut server = mockito::Server::new_async().await;
    let setup = mock_experiment_and_run(&mut server).await;

    let params = server
        .mock("POST", "/api/2.0/mlflow/runs/log-batch")
        .match_body(Matcher::PartialJson(json!({
            "run_id": "r1",
            "params": [
                { "key": "n_estimators", "value": "100" },
                { "key": "max_depth", "value": "5" },
                { "key": "random_state", "value": "42" }
            ]
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let metric = server
        .mock("POST", "/api/2.0/mlflow/runs/log-metric")
        .match_body(Matcher::PartialJson(json!({ "key": "accuracy" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let artifacts = server
        .mock(
            "PUT",
            Matcher::Regex(
                r"^/api/2\.0/mlflow-artifacts/artifacts/1/r1/artifacts/random_forest_model/(model\.json|MLmodel)$"
                    .into(),
            ),
        )
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;
    let log_model = mock_ok(&mut server, "POST", "/api/2.0/mlflow/runs/log-model").await;
    let finished = server
        .mock("POST", "/api/2.0/mlflow/runs/update")
        .match_body(Matcher::PartialJson(json!({ "status": "FINISHED" })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let report = run_training(&config_for(&server)).await.unwrap();

    assert_eq!(report.run_id, "r1");
    assert!((0.0..=1.0).contains(&report.accuracy));
    assert_eq!(report.n_test, 20);
    assert_eq!(report.n_train, 80);
    assert_eq!(
        report.params,
        vec![
            ("n_estimators".to_string(), "100".to_string()),
            ("max_depth".to_string(), "5".to_string()),
            ("random_state".to_string(), "42".to_string()),
        ]
    );

    let rows = report.importances.rows();
    assert_eq!(rows.len(), 8);
    assert!((report.importances.total() - 1.0).abs() < 1e-9);
    let mut names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    let mut expected = PIMA_FEATURES.to_vec();
    expected.sort_unstable();
    assert_eq!(names, expected);

    for mock in setup {
        mock.assert_async().await;
    }
    params.assert_async().await;
    metric.assert_async().await;
    artifacts.assert_async().await;
    log_model.assert_async().await;
    finished.assert_async().await;
}

#[tokio::test]
async fn failure_inside_run_marks_it_failed() {
    let mut server = mockito::Server::new_async().await;
    let _setup = mock_experiment_and_run(&mut server).await;
    let _params = mock_ok(&mut server, "POST", "/api/2.0/mlflow/runs/log-batch").await;
    let _metric = server
        .mock("POST", "/api/2.0/mlflow/runs/log-metric")
        .with_status(500)
        .with_body(json!({ "error_code": "INTERNAL_ERROR", "message": "boom" }).to_string())
        .create_async()
        .await;
    let failed = server
        .mock("POST", "/api/2.0/mlflow/runs/update")
        .match_body(Matcher::PartialJson(json!({ "run_id": "r1", "status": "FAILED" })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let err = run_training(&config_for(&server)).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("failed to log accuracy"));
    assert!(message.contains("boom"));
    failed.assert_async().await;
}

#[tokio::test]
async fn bad_dataset_fails_before_a_run_is_started() {
    let mut server = mockito::Server::new_async().await;
    let _setup = mock_experiment_and_run(&mut server).await;
    let create = server
        .mock("POST", "/api/2.0/mlflow/runs/create")
        .expect(0)
        .create_async()
        .await;

    let config = TrainConfig {
        dataset_url: "/nonexistent/diabetes.csv".to_string(),
        ..config_for(&server)
    };
    let err = run_training(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/diabetes.csv"));
    create.assert_async().await;
}

#[tokio::test]
async fn unreachable_tracking_server_is_an_error() {
    let config = TrainConfig {
        tracking_uri: "http://127.0.0.1:1".to_string(),
        dataset_url: FIXTURE.to_string(),
        ..TrainConfig::default()
    };
    let err = run_training(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to set experiment"));
}

#[test]
fn binary_exits_non_zero_on_unreachable_tracking_server() {
    let output = Command::new(env!("CARGO_BIN_EXE_train"))
        .args(["--tracking-uri", "http://127.0.0.1:1", "--dataset-url", FIXTURE])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error during training"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn binary_prints_summary_on_success() {
    let mut server = mockito::Server::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let _mocks = runtime.block_on(async {
        let mut mocks = mock_experiment_and_run(&mut server).await;
        for path in [
            "/api/2.0/mlflow/runs/log-batch",
            "/api/2.0/mlflow/runs/log-metric",
            "/api/2.0/mlflow/runs/log-model",
            "/api/2.0/mlflow/runs/update",
        ] {
            mocks.push(mock_ok(&mut server, "POST", path).await);
        }
        mocks.push(
            server
                .mock("PUT", Matcher::Regex(r"^/api/2\.0/mlflow-artifacts/".into()))
                .with_status(200)
                .with_body("{}")
                .create_async()
                .await,
        );
        mocks
    });

    let output = Command::new(env!("CARGO_BIN_EXE_train"))
        .args(["--tracking-uri", &server.url(), "--dataset-url", FIXTURE])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.starts_with("Model trained and logged with accuracy: "));
    assert!(stdout.contains("\nFeature Importance:\n"));
    for name in PIMA_FEATURES {
        assert!(stdout.contains(name), "missing {name} in {stdout}");
    }
}
