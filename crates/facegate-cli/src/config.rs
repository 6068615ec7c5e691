//! Process configuration from flags and environment.

use clap::Args;
use facegate_access::MatcherConfig;
use facegate_core::EnrollmentPolicy;
use facegate_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PORT};
use facegate_hardware::LinkConfig;
use facegate_storage::DatabaseConfig;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Serial port of the controller board
    #[arg(long, global = true, env = "FACEGATE_SERIAL_PORT", default_value = DEFAULT_SERIAL_PORT)]
    pub port: String,

    /// Serial baud rate
    #[arg(long, global = true, env = "FACEGATE_BAUD_RATE", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// SQLite database file
    #[arg(long, global = true, env = "FACEGATE_DATABASE", default_value = "facegate.db")]
    pub database: String,

    /// Match threshold; defaults to the policy's threshold
    #[arg(long, global = true, env = "FACEGATE_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Enrollment policy: multi_sample or single_active
    #[arg(long, global = true, env = "FACEGATE_POLICY", default_value_t = EnrollmentPolicy::MultiSample)]
    pub policy: EnrollmentPolicy,
}

impl Settings {
    pub fn link(&self) -> LinkConfig {
        LinkConfig::new(self.port.clone()).with_baud_rate(self.baud)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.clone())
    }

    pub fn matcher(&self) -> MatcherConfig {
        let config = MatcherConfig::for_policy(self.policy);
        match self.threshold {
            Some(threshold) => config.with_threshold(threshold),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let argv = std::iter::once("facegate").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn test_threshold_follows_policy() {
        let settings = parse(&["--policy", "single_active"]);
        assert_eq!(settings.policy, EnrollmentPolicy::SingleActive);
        assert_eq!(settings.matcher().threshold, 0.6);

        let settings = parse(&["--policy", "multi_sample", "--threshold", "0.42"]);
        assert_eq!(settings.matcher().threshold, 0.42);
    }

    #[test]
    fn test_link_and_database() {
        let settings = parse(&["--port", "/dev/ttyACM0", "--baud", "9600", "--database", "x.db"]);
        let link = settings.link();
        assert_eq!(link.port, "/dev/ttyACM0");
        assert_eq!(link.baud_rate, 9600);
        assert_eq!(settings.database().path, std::path::PathBuf::from("x.db"));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let argv = ["facegate", "--policy", "sometimes"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }
}
