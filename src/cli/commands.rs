//! CLI command definitions

use crate::contract::Party;
use crate::negotiation::CreatorMetrics;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pactflow")]
#[command(about = "Pactflow - brand/creator negotiation and contract signing", long_about = None)]
pub struct Cli {
    /// Contract store file
    #[arg(long, global = true, env = "PACTFLOW_STORE_PATH")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the metric-adjusted counter-offer for a price
    CounterOffer {
        /// Quoted price
        #[arg(short, long)]
        price: Decimal,

        #[command(flatten)]
        metrics: MetricsArgs,
    },

    /// Decide accept/counter/reject for a quotation
    Evaluate {
        /// Quoted price
        #[arg(short, long)]
        price: Decimal,

        /// Delivery deadline (RFC 3339)
        #[arg(short, long)]
        deadline: DateTime<Utc>,

        /// Deliverable, repeat for several
        #[arg(long = "deliverable", required = true)]
        deliverables: Vec<String>,

        /// Creator's minimum rate
        #[arg(short = 'm', long)]
        minimum_rate: Option<Decimal>,

        #[command(flatten)]
        metrics: MetricsArgs,

        /// Email the decision to this address
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Manage contracts
    Contract {
        #[command(subcommand)]
        action: ContractAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContractAction {
    /// Draw up a new contract
    Create {
        /// Brand account id
        #[arg(long)]
        brand: String,

        /// Creator account id
        #[arg(long)]
        creator: String,

        /// Product being promoted
        #[arg(long)]
        product: String,

        /// Agreed rate
        #[arg(long)]
        rate: Decimal,

        /// Delivery timeline
        #[arg(long)]
        timeline: String,
    },

    /// Sign a contract as brand or influencer
    Sign {
        /// Contract ID
        contract_id: String,

        /// Signing party (brand or influencer)
        #[arg(short, long)]
        party: Party,

        /// File holding the captured signature image
        #[arg(short, long)]
        signature_file: PathBuf,

        /// Send the fully-signed confirmation to this address
        #[arg(long)]
        notify: Option<String>,
    },

    /// Show one contract
    Show {
        /// Contract ID
        contract_id: String,
    },

    /// List contracts, optionally for one brand/creator pair
    List {
        #[arg(long, requires = "creator")]
        brand: Option<String>,

        #[arg(long, requires = "brand")]
        creator: Option<String>,
    },
}

/// Creator metrics, all optional
#[derive(Args, Debug, Clone, Default)]
pub struct MetricsArgs {
    /// Average engagement rate in percent
    #[arg(long)]
    pub engagement: Option<f64>,

    /// Follower count
    #[arg(long, allow_hyphen_values = true)]
    pub followers: Option<i64>,

    /// Average CPM
    #[arg(long)]
    pub cpm: Option<f64>,
}

impl From<MetricsArgs> for CreatorMetrics {
    fn from(args: MetricsArgs) -> Self {
        CreatorMetrics {
            avg_engagement_rate: args.engagement,
            follower_count: args.followers,
            avg_cpm: args.cpm,
        }
    }
}
