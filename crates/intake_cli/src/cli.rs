use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use intake::{MediaSlot, SectionId, Track};

#[derive(Parser, Debug)]
#[command(name = "intake", version, about = "Validate, submit and quote pageant applications")]
pub struct Cli {
    /// Extra settings file, layered over the config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `intake=trace`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the ordered section catalog
    Sections {
        #[arg(long, default_value = "participant")]
        track: Track,
    },
    /// Check an application snapshot
    Validate {
        #[arg(long, default_value = "participant")]
        track: Track,
        /// JSON object keyed by field name
        #[arg(long)]
        input: PathBuf,
        /// Only this section (camelCase id)
        #[arg(long)]
        section: Option<SectionId>,
    },
    /// Attach images and submit to the configured endpoint
    Submit {
        #[arg(long, default_value = "participant")]
        track: Track,
        #[arg(long)]
        input: PathBuf,
        /// `<slot>=<path>`, repeatable
        #[arg(long = "attach", value_parser = Attachment::from_str)]
        attachments: Vec<Attachment>,
    },
    /// Compute the payment quote
    Quote {
        #[arg(long, default_value = "participant")]
        track: Track,
        /// USD amount; defaults to the configured fee
        #[arg(long)]
        amount: Option<String>,
        /// Payment country; defaults to the configured country
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub slot: MediaSlot,
    pub path: PathBuf,
}

impl FromStr for Attachment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slot, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <slot>=<path>, got `{s}`"))?;
        let slot = MediaSlot::from_str(slot.trim()).map_err(|_| format!("unknown media slot `{slot}`"))?;
        if path.is_empty() {
            return Err("empty path".to_string());
        }
        Ok(Self {
            slot,
            path: PathBuf::from(path),
        })
    }
}
