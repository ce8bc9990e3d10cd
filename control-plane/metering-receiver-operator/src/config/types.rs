use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    /// Namespace to watch. Unset or empty watches every namespace.
    /// Env: WATCH_NAMESPACE
    #[envconfig(from = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    #[envconfig(from = "HTTP_PORT", default = "8088")]
    pub http_port: u16,

    /// Pause after creating children (and after a status sync) before the
    /// pass returns, so new objects become observable.
    /// Env: METERING_SETTLE_DELAY_SECS
    #[envconfig(from = "METERING_SETTLE_DELAY_SECS", default = "5")]
    pub settle_delay_secs: u64,

    /// Env: METERING_ERROR_REQUEUE_SECS
    #[envconfig(from = "METERING_ERROR_REQUEUE_SECS", default = "30")]
    pub error_requeue_secs: u64,

    #[envconfig(nested)]
    pub operand: OperandConfig,
}

/// Settings that shape the operand workload rather than the operator itself.
#[derive(Envconfig, Clone, Debug)]
pub struct OperandConfig {
    /// Receiver image tag ("3.6.0") or digest ("sha256:...").
    /// Env: IMAGE_SHA_OR_TAG_RECEIVER
    #[envconfig(from = "IMAGE_SHA_OR_TAG_RECEIVER")]
    pub receiver_image: Option<String>,

    #[envconfig(from = "SA_NAME", default = "default")]
    pub service_account: String,
}

impl Default for OperandConfig {
    fn default() -> Self {
        Self {
            receiver_image: None,
            service_account: "default".to_string(),
        }
    }
}

impl OperandConfig {
    pub fn receiver_image(&self) -> Option<&str> {
        self.receiver_image.as_deref().filter(|s| !s.is_empty())
    }

    pub fn service_account(&self) -> &str {
        if self.service_account.is_empty() {
            "default"
        } else {
            &self.service_account
        }
    }
}

impl OperatorConfig {
    pub fn watch_namespace(&self) -> Option<&str> {
        self.watch_namespace.as_deref().filter(|s| !s.is_empty())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}
