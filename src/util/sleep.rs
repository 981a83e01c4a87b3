use wasm_timer::Instant;
#[cfg(target_family = "wasm")]
#[cfg(feature = "tracing")]
use tracing::error;

/// Sleep until the given deadline. Returns immediately if it already passed.
pub async fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline <= now {
        return;
    }
    let duration = deadline - now;
    #[cfg(target_family = "wasm")]
    {
        match wasm_timer::Delay::new(duration).await {
            Ok(_) => (),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Error sleeping: {_e}");
            }
        };
    }
    #[cfg(not(target_family = "wasm"))]
    {
        tokio::time::sleep(duration).await;
    }
}
