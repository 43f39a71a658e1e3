use clap::Parser;
use companion_tracker::api::{self, AppState};
use companion_tracker::config::{init_tracing, Args};
use companion_tracker::geo::{loader, RoutePlan};
use companion_tracker::location::{ChannelProvider, PermissionStatus, ReplayProvider, SamplingPolicy};
use companion_tracker::notify::{AlarmPresenter, LogNotifier};
use companion_tracker::realtime::{HttpMembersBackend, MemberPoller};
use companion_tracker::tracking::{StopProximityEvaluator, TrackingSession};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Starting companion tracker...");

    let plan = match &args.route {
        Some(path) => match loader::load_route_stops(path) {
            Ok(stops) => RoutePlan::new(stops),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load route");
                return;
            }
        },
        None => RoutePlan::default(),
    };

    let evaluator = StopProximityEvaluator::new(args.alarm_radius_m);
    let presenter = AlarmPresenter::new(Arc::new(LogNotifier), args.travel_mode);

    let mut poller = None;
    if args.poll_members {
        match HttpMembersBackend::new(args.api_url.clone()) {
            Ok(backend) => {
                let mut p = MemberPoller::new(Arc::new(backend), args.room(), args.token.clone())
                    .with_interval(args.poll_interval());
                p.set_enabled(true);
                poller = Some(p);
            }
            Err(e) => error!(error = %e, "failed to build backend client, member polling off"),
        }
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        let _ = shutdown_rx.await;
    };

    let (tracking, session_handle) = match &args.track {
        Some(path) => {
            let track = match loader::load_track(path) {
                Ok(track) => track,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to load track");
                    return;
                }
            };
            let provider = ReplayProvider::new(track, SamplingPolicy::default(), args.replay_speed);
            let session = TrackingSession::new(provider, plan, evaluator, presenter);
            (session.handle(), tokio::spawn(session.run(shutdown)))
        }
        None => {
            // No position source attached; the sender is held so the session waits.
            let (positions, provider) = ChannelProvider::new(PermissionStatus::Granted);
            let session = TrackingSession::new(provider, plan, evaluator, presenter);
            let handle = session.handle();
            (
                handle,
                tokio::spawn(async move {
                    let _positions = positions;
                    session.run(shutdown).await
                }),
            )
        }
    };

    let state = AppState {
        tracking,
        members: poller.as_ref().map(MemberPoller::handle),
    };
    let port = args.port;
    let mut api_handle = tokio::spawn(async move { api::run_server(state, port).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        res = &mut api_handle => match res {
            Ok(Err(e)) => error!(error = %e, "API server exited"),
            _ => error!("API server exited"),
        },
    }

    let _ = shutdown_tx.send(());
    if let Some(mut p) = poller {
        p.set_enabled(false);
    }
    if let Ok(summary) = session_handle.await {
        info!(
            distance_m = summary.distance_m.round(),
            elapsed_secs = summary.elapsed_secs,
            "Tracking summary"
        );
    }
}
