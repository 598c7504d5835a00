use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber for a service binary.
///
/// `RUST_LOG` wins when set; otherwise the service logs at debug and
/// everything else at info. `KEEL_ENV=production` switches the output
/// from the developer format to JSON lines.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{service_name}=debug,tower_http=debug")));

    let production = matches!(std::env::var("KEEL_ENV").as_deref(), Ok("production"));

    let output = if production {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(output).init();

    tracing::info!(service = service_name, "tracing initialized");
}
