//! Integration tests for the gateway bridge service.
use std::sync::Arc;
use std::time::Duration;

use crate::fake_gateway::FakeGateway;
use crate::mockserver_homeassistant::HomeAssistantMockServer;
use franklinbridge::coordinator::{PollingCoordinator, Settings};
use franklinbridge::integration::franklinwh::{AccessoryType, Error};
use franklinbridge::integration::homeassistant::Client;
use franklinbridge::services::{GatewayBridgeService, GatewayFetcher, SetupError};
use httpmock::Mock;
use rstest::rstest;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;


const BATTERY_SOC: &str = "sensor.franklinwh_1b2c3d_battery_soc";

fn bridge(
    gateway: &Arc<FakeGateway>,
    server: &HomeAssistantMockServer,
    shutdown_token: &CancellationToken,
) -> Arc<GatewayBridgeService<FakeGateway>> {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
    let coordinator = Arc::new(PollingCoordinator::new(
        "test",
        GatewayFetcher::new(Arc::clone(gateway)),
        Settings {
            interval: Duration::from_millis(50),
            ..Settings::default()
        },
        shutdown_token,
    ));
    let client = Client::new(server.url(), server.token().to_string()).unwrap();
    Arc::new(GatewayBridgeService::new(
        coordinator,
        Arc::new(client),
        Duration::from_millis(50),
    ))
}

async fn wait_for_hits(mock: &Mock<'_>, hits: usize) {
    timeout(Duration::from_secs(5), async {
        while mock.hits_async().await < hits {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("expected requests were not received in time");
}

#[rstest]
#[case(&[], 22)]
#[case(&[AccessoryType::SmartCircuitModule], 25)]
#[case(&[AccessoryType::GeneratorModule], 23)]
#[case(
    &[
        AccessoryType::SmartCircuitModule,
        AccessoryType::GeneratorModule,
        AccessoryType::Other(7),
    ],
    26
)]
#[tokio::test]
async fn test_setup_discovers_entities(
    #[case] accessories: &[AccessoryType],
    #[case] expected: usize,
) {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let gateway = Arc::new(FakeGateway::new().with_accessories(accessories));
    let service = bridge(&gateway, &server, &CancellationToken::new());

    let entities = service.setup().await.unwrap();

    assert_eq!(entities.len(), expected);
    let has_switches = accessories.contains(&AccessoryType::SmartCircuitModule);
    assert_eq!(gateway.switch_state_calls(), usize::from(has_switches));
    assert_eq!(gateway.mode_calls(), 1);
    assert!(
        entities
            .iter()
            .any(|e| e.entity_id() == "switch.franklinwh_1b2c3d_generator")
            == accessories.contains(&AccessoryType::GeneratorModule)
    );
}

#[tokio::test]
async fn test_setup_auth_failure() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail_accessories(Some(Error::InvalidCredentials));
    let service = bridge(&gateway, &server, &CancellationToken::new());

    let result = service.setup().await;

    assert!(matches!(result, Err(SetupError::AuthFailed(_))));
}

#[tokio::test]
async fn test_setup_not_ready() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail_stats(Some(Error::GatewayOffline));
    let service = bridge(&gateway, &server, &CancellationToken::new());

    let result = service.setup().await;

    assert!(matches!(result, Err(SetupError::NotReady(_))));
}

#[tokio::test]
async fn test_setup_homeassistant_rejects_token() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_unauthorized().await;
    let gateway = Arc::new(FakeGateway::new());
    let service = bridge(&gateway, &server, &CancellationToken::new());

    let result = service.setup().await;

    assert!(matches!(result, Err(SetupError::NotReady(_))));
    assert_eq!(gateway.stats_calls(), 0);
}

#[tokio::test]
async fn test_run_publishes_changes() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let initial = server.mock_set_state_matching(BATTERY_SOC, "80").await;
    let changed = server.mock_set_state_matching(BATTERY_SOC, "55").await;
    server.mock_any_set_state().await;
    let gateway = Arc::new(FakeGateway::new());
    let shutdown_token = CancellationToken::new();
    let service = bridge(&gateway, &server, &shutdown_token);

    let handle = tokio::spawn({
        let service = Arc::clone(&service);
        let shutdown_token = shutdown_token.clone();
        async move { service.run(shutdown_token).await }
    });
    wait_for_hits(&initial, 1).await;
    gateway.set_battery_soc(55.0);
    wait_for_hits(&changed, 1).await;
    sleep(Duration::from_millis(200)).await;
    shutdown_token.cancel();

    let result = timeout(Duration::from_secs(5), handle)
        .await
        .expect("bridge did not stop in time")
        .expect("bridge task failed");
    assert_eq!(result, Ok(()));
    assert_eq!(initial.hits_async().await, 1, "unchanged states are not republished");
    assert_eq!(changed.hits_async().await, 1);
}

#[tokio::test]
async fn test_run_retries_setup_until_ready() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let states = server.mock_any_set_state().await;
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail_accessories(Some(Error::GatewayOffline));
    let shutdown_token = CancellationToken::new();
    let service = bridge(&gateway, &server, &shutdown_token);

    let handle = tokio::spawn({
        let service = Arc::clone(&service);
        let shutdown_token = shutdown_token.clone();
        async move { service.run(shutdown_token).await }
    });
    sleep(Duration::from_millis(150)).await;
    assert_eq!(states.hits_async().await, 0);
    assert!(!handle.is_finished(), "setup should be retried");

    gateway.fail_accessories(None);
    wait_for_hits(&states, 22).await;
    shutdown_token.cancel();

    let result = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn test_run_stops_on_auth_failure() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let available = server.mock_set_state_matching(BATTERY_SOC, "80").await;
    let unavailable = server
        .mock_set_state_matching(BATTERY_SOC, "unavailable")
        .await;
    server.mock_any_set_state().await;
    let gateway = Arc::new(FakeGateway::new());
    let shutdown_token = CancellationToken::new();
    let service = bridge(&gateway, &server, &shutdown_token);

    let handle = tokio::spawn({
        let service = Arc::clone(&service);
        let shutdown_token = shutdown_token.clone();
        async move { service.run(shutdown_token).await }
    });
    wait_for_hits(&available, 1).await;
    gateway.fail_stats(Some(Error::TokenExpired));

    let result = timeout(Duration::from_secs(5), handle)
        .await
        .expect("bridge did not stop on auth failure")
        .unwrap();
    assert!(matches!(result, Err(SetupError::AuthFailed(_))));
    assert_eq!(unavailable.hits_async().await, 1);
    assert!(!shutdown_token.is_cancelled());
}

#[tokio::test]
async fn test_run_setup_auth_failure() {
    let server = HomeAssistantMockServer::start().await;
    server.mock_api_status().await;
    let states = server.mock_any_set_state().await;
    let gateway = Arc::new(FakeGateway::new());
    gateway.fail_accessories(Some(Error::InvalidCredentials));
    let shutdown_token = CancellationToken::new();
    let service = bridge(&gateway, &server, &shutdown_token);

    let result = timeout(Duration::from_secs(5), service.run(shutdown_token))
        .await
        .expect("setup should not be retried");

    assert!(matches!(result, Err(SetupError::AuthFailed(_))));
    assert_eq!(states.hits_async().await, 0);
}
