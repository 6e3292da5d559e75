#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so stdout stays clean for summaries and
/// `config get`. `RUST_LOG` overrides the `-v` count.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("ppm_import={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_crate_level() {
        assert_eq!(default_directive(0), "ppm_import=warn");
        assert_eq!(default_directive(1), "ppm_import=info");
        assert_eq!(default_directive(2), "ppm_import=debug");
        assert_eq!(default_directive(9), "ppm_import=trace");
    }

    #[test]
    fn verbosity_applies_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter(2).to_string(), "ppm_import=debug");
    }
}
