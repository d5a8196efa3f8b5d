use log::info;

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::prompt::is_digits;
use crate::slurm::partition::{Limits, Partition};

/// Wall time, partition and account for every job of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub hours: u32,
    pub partition: Partition,
    pub account: String,
}

impl ResourceRequest {
    /// Check command line values, falling back to the configured defaults for missing ones
    pub fn validate(
        hours: Option<&str>,
        partition: Option<&str>,
        account: Option<&str>,
        config: &Config,
    ) -> Result<Self> {
        let hours = hours.unwrap_or(&config.hours);
        if !is_digits(hours) {
            return Err(JobError::InvalidInput(format!(
                "wall time '{hours}' must be a whole number of hours"
            )));
        }
        let partition = Partition::parse(partition.unwrap_or(&config.partition))?;
        let limits = partition.limits();

        // digits only, so a parse failure is an overflow
        let hours: u32 = hours.parse().map_err(|_| exceeded_hours(hours, partition, &limits))?;
        if hours > limits.max_hours {
            return Err(exceeded_hours(&hours.to_string(), partition, &limits));
        }

        let account = account.unwrap_or(&config.account).to_string();
        let teaching_account = account == config.teaching_account;
        let teaching_partition = partition == Partition::Teaching;
        if teaching_account != teaching_partition {
            return Err(JobError::InvalidInput(format!(
                "account '{}' can only be used with the teaching partition and vice versa \
                 (got account '{account}' on partition '{partition}')",
                config.teaching_account
            )));
        }

        let request = ResourceRequest { hours, partition, account };
        info!("Resources validated: {}", request.summary());
        Ok(request)
    }

    /// `HH:00:00` for `#SBATCH --time`
    pub fn time(&self) -> String {
        format!("{:02}:00:00", self.hours)
    }

    pub fn limits(&self) -> Limits {
        self.partition.limits()
    }

    pub fn summary(&self) -> String {
        format!("time: {}, partition: {}, account: {}", self.time(), self.partition, self.account)
    }
}

fn exceeded_hours(hours: &str, partition: Partition, limits: &Limits) -> JobError {
    JobError::ResourceExceeded(format!(
        "{hours} hours is more than the {} hour limit of partition {partition}",
        limits.max_hours
    ))
}
