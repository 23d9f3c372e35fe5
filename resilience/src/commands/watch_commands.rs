use crate::services::{HealthProbe, NetworkMonitor};
use crate::state::AppState;

/// 持续监视连通性,联网时补交本地队列,直到 Ctrl-C
pub async fn watch(state: &AppState) -> Result<(), String> {
    let probe = HealthProbe::new(
        &state.config.api_base_url,
        state.config.health_interval,
        state.config.request_timeout,
        state.connectivity.clone(),
    )
    .map_err(|e| e.to_string())?;

    // 先探测一次,让监视器以真实状态启动
    let online = probe.probe_once().await;
    println!(
        "Watching {} (currently {})",
        state.config.api_base_url,
        if online { "online" } else { "offline" }
    );

    let monitor = NetworkMonitor::new(state.reporter.clone(), &state.connectivity);
    let cancel = monitor.cancel_token();
    let monitor_task = monitor.spawn();
    let probe_task = tokio::spawn(probe.run(cancel.clone()));

    tokio::signal::ctrl_c().await.map_err(|e| e.to_string())?;
    cancel.cancel();

    let _ = monitor_task.await;
    let _ = probe_task.await;
    println!("Stopped");
    Ok(())
}
