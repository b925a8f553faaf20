mod common;

use common::MockBackend;
use trends_cli::api_client::ApiClient;
use trends_cli::health::{HealthMonitor, HealthStatus};
use trends_cli::models::ProjectCreate;

#[test]
fn project_round_trip() {
    let backend = MockBackend::start();
    let client = ApiClient::new(&backend.base_url());

    let existing = client.list_projects().unwrap();
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].name, "Spring campaign");

    let created = client
        .create_project(&ProjectCreate {
            name: "Tiktok push".into(),
            platforms: vec!["tiktok".into()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(created.name, "Tiktok push");
    assert_eq!(created.status, "active");

    client.delete_project(created.id).unwrap();
}

#[test]
fn health_probe_flips_with_backend_availability() {
    let backend = MockBackend::start();
    let client = ApiClient::new(&backend.base_url());
    let mut monitor = HealthMonitor::new(3600);

    assert!(monitor.tick(&client));
    assert_eq!(monitor.status(), HealthStatus::Healthy);

    // Backend goes away; force a probe past the interval.
    drop(backend);
    assert!(monitor.probe_now(&client));
    assert_eq!(monitor.status(), HealthStatus::Down);
}
