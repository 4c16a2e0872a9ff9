use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, with source file and line.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// `TANDEM_LOG_FORMAT` (`json` or `pretty`) wins when set. Otherwise JSON when
    /// `TANDEM_ENV=production`, pretty everywhere else.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var("TANDEM_ENV").ok().as_deref(),
            std::env::var("TANDEM_LOG_FORMAT").ok().as_deref(),
        )
    }

    fn resolve(environment: Option<&str>, explicit: Option<&str>) -> Self {
        match explicit.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => Self::Json,
            Some(f) if f.eq_ignore_ascii_case("pretty") => Self::Pretty,
            _ if environment == Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(service_name: &str) -> String {
    let service_target = service_name.replace('-', "_");
    format!("info,{service_target}=debug,tandem_shared=debug,tower_http=debug")
}

pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));
    let format = LogFormat::from_env();
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_file(true).with_line_number(true))
            .init(),
    }

    tracing::info!(service = service_name, format = ?format, "tracing initialized");
}
