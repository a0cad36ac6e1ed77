//! Capture demo
//!
//! Starts a permission relay host on loopback, connects a relayed controller
//! to it, opens the camera, captures one frame and submits it to the
//! analysis backend configured through `DEEPCHECK_API_URL`.
//!
//! Run with `cargo run --example capture_demo` (add `--features native` to
//! use a real camera).

use deepcheck::{
    default_camera, init_logging, CameraAccess, DeepCheck, PermissionRelay, PermissionStore,
    RelayHost, ResultView, WsRelayClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(false);

    println!("🔐 Starting permission relay host...");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let host = RelayHost::new(addr, Arc::new(PermissionStore::new(true)));
    let server = host.clone();
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            eprintln!("❌ Relay host stopped: {e}");
        }
    });

    let relay: Arc<dyn PermissionRelay> =
        Arc::new(WsRelayClient::connect(&format!("ws://{addr}")).await?);
    println!("✅ Relay connected on {addr}");

    let deepcheck = DeepCheck::init()?;
    let controller = deepcheck
        .controller(default_camera())
        .access(CameraAccess::Relayed {
            relay,
            permission_page: Some("permission.html".to_string()),
        })
        .build()?;
    controller.spawn_permission_listener();

    println!("📹 Starting camera...");
    if let Err(e) = controller.start_camera().await {
        let status = controller.status();
        println!("❌ {}", status.message);
        if status.offer_permission_page {
            println!("   Open the permission page to grant camera access.");
        }
        return Err(e.into());
    }
    println!("✅ {}", controller.status().message);

    let frame = controller.capture_frame()?;
    println!("📸 Captured {} byte JPEG", frame.len());

    println!("🔍 Submitting to {}...", deepcheck.client().base_url());
    match controller.capture_and_analyze().await {
        Ok(result) => {
            let view = ResultView::from_result(&result);
            println!("{} {} ({})", view.icon, view.label_text, view.confidence_text);
            for line in &view.details {
                println!("   {line}");
            }
        }
        Err(e) => println!("❌ Analysis failed: {}", e.status_message()),
    }

    controller.stop_camera();
    println!("🛑 Camera stopped ({})", controller.state());
    Ok(())
}
