use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber. Logs go to stderr so stdout only
/// carries decision output.
pub fn init(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}

/// Masks a customer id for log output: first char, `***`, last three chars.
pub fn mask_customer(customer_id: &str) -> String {
    let chars: Vec<char> = customer_id.chars().collect();
    let Some(first) = chars.first() else {
        return String::new();
    };
    let tail: String = if chars.len() > 3 {
        chars[chars.len() - 3..].iter().collect()
    } else {
        customer_id.to_string()
    };
    format!("{first}***{tail}")
}
