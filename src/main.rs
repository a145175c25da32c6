//! Pactflow CLI binary

use anyhow::Context;
use clap::Parser;
use pactflow::cli::{contract_summary, Cli, Commands, ContractAction, PactApp};
use pactflow::{AppConfig, ContractId, ContractTerms, CreatorMetrics, CreatorProfile, QuotationDraft, UserId};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = PactApp::from_config(&config);

    match cli.command {
        Commands::CounterOffer { price, metrics } => {
            let metrics = CreatorMetrics::from(metrics);
            let counter_price = app.counter_offer(price, &metrics)?;
            print_json(&json!({ "originalPrice": price, "counterPrice": counter_price }))?;
        }

        Commands::Evaluate {
            price,
            deadline,
            deliverables,
            minimum_rate,
            metrics,
            reply_to,
        } => {
            let draft = QuotationDraft {
                price: Some(price),
                deadline: Some(deadline),
                deliverables,
                notes: None,
            };
            let profile = CreatorProfile {
                metrics: Some(metrics.into()),
                minimum_rate,
            };

            let reply = app.respond_to_quotation(draft, &profile, reply_to.as_deref())?;
            print_json(&json!({
                "decision": reply.evaluation.decision,
                "counterPrice": reply.evaluation.counter_price,
                "minAcceptablePrice": reply.evaluation.min_acceptable_price,
                "factors": reply.evaluation.factors,
                "quotationStatus": reply.status,
                "replyMessageId": reply.receipt.map(|r| r.message_id),
            }))?;
        }

        Commands::Contract { action } => match action {
            ContractAction::Create {
                brand,
                creator,
                product,
                rate,
                timeline,
            } => {
                let contract = app.create_contract(ContractTerms {
                    brand_id: UserId(brand),
                    creator_id: UserId(creator),
                    product,
                    rate,
                    timeline,
                })?;
                print_json(&contract_summary(&contract))?;
            }

            ContractAction::Sign {
                contract_id,
                party,
                signature_file,
                notify,
            } => {
                let image = std::fs::read(&signature_file).with_context(|| {
                    format!("failed to read signature file {}", signature_file.display())
                })?;

                let reply = app
                    .sign_and_notify(&ContractId(contract_id), party, image, notify.as_deref())
                    .await?;

                let mut summary = contract_summary(&reply.outcome.contract);
                summary["previousStatus"] = json!(reply.outcome.previous);
                summary["notifications"] = json!(reply.notifications);
                print_json(&summary)?;
            }

            ContractAction::Show { contract_id } => {
                let contract = app.get_contract(&ContractId(contract_id))?;
                print_json(&contract_summary(&contract))?;
            }

            ContractAction::List { brand, creator } => {
                let pair = brand.map(UserId).zip(creator.map(UserId));
                let contracts = app.list_contracts(pair.as_ref().map(|(b, c)| (b, c)))?;
                let summaries: Vec<_> = contracts.iter().map(contract_summary).collect();
                print_json(&summaries)?;
            }
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
