//! End-to-end run against a mock chat completions endpoint

use extract_bench::config::ProviderConfig;
use extract_bench::providers::create_provider;
use extract_bench::reporting::RunReport;
use extract_bench::runner::{run_benchmark, Executor, ExecutorConfig, NoOpProgress};
use extract_bench::tasks::{load_dataset, Sampling, TaskStatus};
use extract_judge::{Benchmark, Judge};
use mockito::Matcher;
use serde_json::{json, Value};

const CLAIM_ONE: &str = "{'header': {'claim_id': 'CLM-000001', 'report_date': datetime.date(2024, 5, 2), \
'channel': 'Email'}, 'policy_details': None, 'insured_objects': [{'object_id': 'VIN1', \
'object_type': 'Vehicle', 'year': 2019}, {'object_id': 'PROP-000001', 'object_type': 'Building', \
'year': None}], 'incident_description': {'incident_type': 'house_fire', 'estimated_damage_amount': 5000}}";

const CLAIM_TWO: &str = "{'header': {'claim_id': 'CLM-000002', 'report_date': datetime.date(2024, 6, 1), \
'channel': 'Email'}, 'policy_details': None, 'insured_objects': None, \
'incident_description': {'incident_type': 'vandalism', 'estimated_damage_amount': None}}";

const CLAIM_THREE: &str = "{'header': {'claim_id': 'CLM-000003', 'report_date': datetime.date(2024, 7, 9), \
'channel': 'Portal'}, 'policy_details': None, 'insured_objects': None, \
'incident_description': {'incident_type': 'roof_leak', 'estimated_damage_amount': 900}}";

fn completion(content: &str) -> String {
    json!({
        "model": "mock-model",
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 40}
    })
    .to_string()
}

fn write_dataset(path: &std::path::Path) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(["id", "claim_text", "ground_truth"]).unwrap();
    writer
        .write_record(["c1", "Claim CLM-000001 about a car and a house fire", CLAIM_ONE])
        .unwrap();
    writer
        .write_record(["c2", "Claim CLM-000002 for vandalism", CLAIM_TWO])
        .unwrap();
    writer
        .write_record(["c3", "Claim CLM-000003 for a leaking roof", CLAIM_THREE])
        .unwrap();
    writer.flush().unwrap();
}

#[tokio::test]
async fn test_insurance_claims_end_to_end() {
    let mut server = mockito::Server::new_async().await;

    // insured objects come back in the opposite order
    let first = json!({
        "header": {"claim_id": "CLM-000001", "report_date": "2024-05-02", "channel": "Email"},
        "policy_details": null,
        "insured_objects": [
            {"object_id": "PROP-000001", "object_type": "Building", "year": null},
            {"object_id": "VIN1", "object_type": "Vehicle", "year": 2019}
        ],
        "incident_description": {"incident_type": "house_fire", "estimated_damage_amount": 5000}
    });
    let second = json!({
        "header": {"claim_id": "CLM-000002", "report_date": "2024-06-01", "channel": "Phone"},
        "policy_details": null,
        "insured_objects": null,
        "incident_description": {"incident_type": "vandalism", "estimated_damage_amount": null}
    });

    let mocks = [
        ("CLM-000001", completion(&first.to_string())),
        ("CLM-000002", completion(&second.to_string())),
        ("CLM-000003", completion("Sorry, I cannot process this claim.")),
    ];
    let mut handles = Vec::new();
    for (needle, body) in mocks {
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex(needle.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await;
        handles.push(mock);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("insurance_claims_extraction.csv");
    write_dataset(&path);

    let provider = create_provider(&ProviderConfig {
        name: "mock".to_string(),
        base_url: Some(server.url()),
        api_key: Some("test-key".to_string()),
        model: "mock-model".to_string(),
        ..ProviderConfig::default()
    })
    .unwrap();
    let executor = Executor::new(
        provider,
        ExecutorConfig {
            retry_count: 0,
            ..ExecutorConfig::default()
        },
    );

    let dataset = load_dataset(&path, Benchmark::InsuranceClaims, &Sampling::all()).unwrap();
    assert_eq!(dataset.len(), 3);

    let judge = Judge::new(&Benchmark::InsuranceClaims.judge_config());
    let run = run_benchmark(&executor, &dataset, &judge, &NoOpProgress)
        .await
        .unwrap();

    for mock in &handles {
        mock.assert_async().await;
    }

    let statuses: Vec<_> = run.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![TaskStatus::Success, TaskStatus::Success, TaskStatus::ParseFailed]
    );

    // reordered objects still line up with their ground truth
    assert!(run.examples[0].overall);
    assert_eq!(
        run.examples[0].field_correctness.get("insured_objects[0].object_id"),
        Some(true)
    );
    assert_eq!(run.examples[0].alignments[0].chosen, Some(1));

    assert!(!run.examples[1].overall);
    assert_eq!(run.examples[1].field_correctness.get("header.channel"), Some(false));
    assert_eq!(run.examples[1].field_correctness.get("header.claim_id"), Some(true));

    assert!(run.examples[2].is_failure());

    let result = &run.result;
    assert_eq!(result.total_examples, 3);
    assert_eq!(result.parsed_examples, 2);
    assert_eq!(result.extraction_failures, 1);
    assert!((result.overall_accuracy - 1.0 / 3.0).abs() < 1e-9);
    assert!((result.accuracy_for("header.claim_id").unwrap() - 2.0 / 3.0).abs() < 1e-9);

    let report = RunReport::from_run(&run, "mock-model", "mock");
    let report_path = dir.path().join("run").join(report.file_name());
    report.write_to_file(&report_path).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["benchmark_name"], "insurance_claims");
    assert_eq!(written["sample_size"], 3);
    assert_eq!(written["success_number"], 2);
    assert_eq!(written["examples"][2]["task_status"], "parse_failed");
}
