use clap::{Parser, Subcommand};
use riti_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "riti", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: riti add "Go to the gym" -d "Leg day, no excuses" -r weekly --due "2025-01-06 18:00" --every 1
    Add {
        title: Option<String>,
        /// What needs to be done
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// daily, weekly or monthly
        #[arg(short = 'r', long, default_value = "daily")]
        recurrence: String,
        /// Due date (RFC3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD"); defaults to now
        #[arg(long)]
        due: Option<String>,
        /// Coins earned on completion (1-100)
        #[arg(long)]
        reward: Option<u32>,
        /// Repeat after this many recurrence units once completed (1-30)
        #[arg(long, value_name = "N")]
        every: Option<u32>,
    },
    /// Edit a task
    ///
    /// Example: riti edit task-1 --title "Go to the gym early" --reward 20
    /// Example: riti edit task-1 --no-repeat
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
        #[arg(short = 'r', long)]
        recurrence: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        reward: Option<u32>,
        #[arg(long, value_name = "N", conflicts_with = "no_repeat")]
        every: Option<u32>,
        /// Stop spawning a new occurrence on completion
        #[arg(long)]
        no_repeat: bool,
    },
    /// Delete a task
    ///
    /// Example: riti delete task-1
    Delete {
        id: String,
    },
    /// Show details of a task
    ///
    /// Example: riti show task-1
    Show {
        id: String,
    },
    /// Complete a task by submitting proof
    ///
    /// Example: riti done task-1 --proof ./gym-selfie.jpg
    Done {
        id: String,
        /// Image file proving the task was done
        #[arg(long, value_name = "IMAGE")]
        proof: Option<String>,
    },
    /// List tasks
    ///
    /// Example: riti list upcoming
    /// Example: riti list weekly
    List {
        #[command(subcommand)]
        list: ListCommand,
    },
    /// Show the coin balance
    ///
    /// Example: riti balance
    Balance,
    /// Delete every task and reset the balance to zero
    ///
    /// Example: riti reset --yes
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    /// Pending daily tasks
    Daily,
    /// Pending weekly tasks
    Weekly,
    /// Pending monthly tasks
    Monthly,
    /// Completed tasks
    Completed,
    /// Pending tasks due in the future, soonest first
    Upcoming,
    /// Every task
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StorePath,
    DefaultReward,
    LogFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "default_reward" | "reward" => ConfigOverrideTarget::DefaultReward,
        "log_filter" | "log" => ConfigOverrideTarget::LogFilter,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override for '{field}' requires a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::StorePath => overrides.store_path = Some(parsed.value),
            ConfigOverrideTarget::DefaultReward => {
                let reward = parsed
                    .value
                    .parse::<u32>()
                    .map_err(|_| format!("default_reward must be a number, got '{}'", parsed.value))?;
                overrides.default_reward = Some(reward);
            }
            ConfigOverrideTarget::LogFilter => overrides.log_filter = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
