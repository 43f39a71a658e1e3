use companion_tracker::api::{router, AppState};
use companion_tracker::geo::{RoutePlan, RouteStop};
use companion_tracker::location::{ChannelProvider, PermissionStatus};
use companion_tracker::notify::{AlarmPresenter, LogNotifier, TravelMode};
use companion_tracker::tracking::{StopProximityEvaluator, TrackingSession};
use serde_json::Value;
use std::sync::Arc;

async fn spawn_api() -> String {
    let plan = RoutePlan::new(vec![
        RouteStop {
            location_name: "Market".to_string(),
            latitude: 40.0,
            longitude: -3.7,
            note: None,
        },
        RouteStop {
            location_name: "Palace".to_string(),
            latitude: 40.01,
            longitude: -3.71,
            note: Some("tickets at the side door".to_string()),
        },
    ]);
    let (_positions, provider) = ChannelProvider::new(PermissionStatus::Granted);
    let presenter = AlarmPresenter::new(Arc::new(LogNotifier), TravelMode::Walking);
    let session = TrackingSession::new(provider, plan, StopProximityEvaluator::default(), presenter);
    let state = AppState {
        tracking: session.handle(),
        members: None,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn exposes_tracking_and_route_controls() {
    let base = spawn_api().await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert!(health.status().is_success());

    let tracking: Value = client
        .get(format!("{base}/tracking"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tracking["nextStop"]["locationName"], "Market");
    assert_eq!(tracking["alarm"]["visible"], false);
    assert_eq!(tracking["stopsRemaining"], 2);

    let next: Value = client
        .post(format!("{base}/route/advance"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(next["locationName"], "Palace");

    let tracking: Value = client
        .get(format!("{base}/tracking"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tracking["nextStop"]["locationName"], "Palace");
    assert_eq!(tracking["stopsRemaining"], 1);

    let alarm: Value = client
        .post(format!("{base}/alarm/dismiss"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alarm["visible"], false);

    let members = client.get(format!("{base}/members")).send().await.unwrap();
    assert_eq!(members.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
}
