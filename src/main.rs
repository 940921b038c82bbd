//! `flyrancher-sub`: subscription payment memo tool and backend client.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse arguments
//!   3. Load config (file, then env overrides)
//!   4. Init logger at the configured level
//!   5. Run the command; Ctrl-C cancels anything waiting on the backend

mod cli;

use std::process;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flyrancher_sub::amount::{format_wax, parse_wax_amount};
use flyrancher_sub::client::SubscriptionClient;
use flyrancher_sub::client::poll::retry_with_backoff;
use flyrancher_sub::config::{self, Config};
use flyrancher_sub::error::AppError;
use flyrancher_sub::expiry::{DEFAULT_WARNING_DAYS, is_expiring_soon, time_remaining};
use flyrancher_sub::logger;
use flyrancher_sub::payment::{PaymentRecord, validate_payment};
use flyrancher_sub::pricing::{PriceCalculator, Proration};
use flyrancher_sub::wallet::{validate_wallet_list, validate_wallet_name};

use cli::Command;

// Read-only backend calls are safe to repeat.
const READ_RETRIES: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let cli = match cli::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(2);
        }
    };
    if cli.command == Command::Help {
        cli::print_help();
        return Ok(());
    }

    let config = config::load(cli.config.as_deref())?;
    logger::init(&config.log_level, config.log_file.as_deref())?;
    debug!(
        network = %config.network,
        base_url = %config.api.base_url,
        "config loaded"
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, cancelling");
            trigger.cancel();
        }
    });

    execute(cli.command, &config, &cancel).await
}

async fn execute(command: Command, config: &Config, cancel: &CancellationToken) -> Result<(), AppError> {
    let codec = config.codec();
    // Catalog-only pricing never touches upgrade proration.
    let catalog_pricing = || PriceCalculator::new(config.catalog(), Proration::default());

    match command {
        Command::Help => cli::print_help(),
        Command::Encode(intent) => println!("{}", codec.encode(&intent)?),
        Command::Decode { memo } => print_json(&codec.decode(&memo)?)?,
        Command::Price { memo, remaining_days } => {
            let intent = codec.decode(&memo)?;
            let amount = config.calculator(remaining_days)?.expected_amount(&intent)?;
            println!("{}", format_wax(amount));
        }
        Command::Check { memo, amount, tolerance, remaining_days } => {
            let amount = parse_wax_amount(&amount)?;
            let tolerance = tolerance.unwrap_or(config.payment.amount_tolerance);
            let calculator = config.calculator(remaining_days)?;
            print_json(&validate_payment(&codec, &calculator, &memo, amount, tolerance)?)?;
        }
        Command::Quote { tier, duration, addons } => {
            let calculator = catalog_pricing();
            let total = calculator.quote(tier, duration, addons.as_slice())?;
            print_json(&serde_json::json!({
                "tier": tier,
                "duration": duration,
                "addons": addons,
                "total": total,
                "savings": calculator.savings(tier, duration),
                "display": format_wax(total),
            }))?;
        }
        Command::Recommend { wallets, growth } => {
            print_json(&catalog_pricing().recommend(wallets, growth))?;
        }
        Command::Wallet { names } => {
            for name in &names {
                match validate_wallet_name(name) {
                    Ok(()) => println!("ok   {name}"),
                    Err(e) => println!("err  {name}: {e}"),
                }
            }
            validate_wallet_list(names.as_slice(), config.payment.max_wallets_per_transaction)?;
        }
        Command::Status { wallets } => {
            let client = client(config)?;
            let now = Utc::now();
            if let [wallet] = wallets.as_slice() {
                let mut status = client.subscription_status(wallet).await?;
                annotate_expiry(&mut status, now);
                print_json(&status)?;
            } else {
                let mut statuses = client.wallet_statuses(&wallets).await?;
                statuses.values_mut().for_each(|s| annotate_expiry(s, now));
                print_json(&statuses)?;
            }
        }
        Command::History { wallet, limit, offset } => {
            validate_wallet_name(&wallet)?;
            let client = &client(config)?;
            let wallet = wallet.as_str();
            let history = retry_with_backoff(READ_RETRIES, READ_RETRY_DELAY, cancel, move |_| {
                client.payment_history(wallet, limit, offset)
            })
            .await?;
            print_json(&history)?;
        }
        Command::Metrics => {
            let client = &client(config)?;
            let metrics =
                retry_with_backoff(READ_RETRIES, READ_RETRY_DELAY, cancel, move |_| client.system_metrics())
                    .await?;
            print_json(&metrics)?;
        }
        Command::Health => {
            let client = &client(config)?;
            let health =
                retry_with_backoff(READ_RETRIES, READ_RETRY_DELAY, cancel, move |_| client.system_health())
                    .await?;
            print_json(&health)?;
        }
        Command::Submit { transaction_hash, from, to, amount, memo, block_number } => {
            let to = to.unwrap_or_else(|| config.network.info().payment_wallet.to_string());
            let record = PaymentRecord::new(
                transaction_hash,
                from,
                to,
                parse_wax_amount(&amount)?,
                memo,
                block_number,
            );
            print_json(&client(config)?.submit_payment(&record).await?)?;
        }
        Command::Poll { transaction_id } => {
            let status = client(config)?
                .poll_payment_confirmation(&transaction_id, cancel)
                .await?;
            print_json(&status)?;
            eprintln!("explorer: {}", config.network.explorer_tx_url(&transaction_id));
        }
    }
    Ok(())
}

fn client(config: &Config) -> Result<SubscriptionClient, AppError> {
    SubscriptionClient::new(&config.api, &config.polling, config.codec())
}

/// Add `timeRemaining` and `expiringSoon` when the backend reports `expiresAt`.
fn annotate_expiry(status: &mut Value, now: DateTime<Utc>) {
    let Some(expires_at) = status
        .get("expiresAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
    else {
        return;
    };
    if let Some(obj) = status.as_object_mut() {
        obj.insert("timeRemaining".into(), time_remaining(expires_at, now).into());
        obj.insert(
            "expiringSoon".into(),
            is_expiring_soon(expires_at, now, DEFAULT_WARNING_DAYS).into(),
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn expiry_annotation() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut status = json!({ "isActive": true, "expiresAt": "2025-03-04T12:00:00Z" });
        annotate_expiry(&mut status, now);
        assert_eq!(status["timeRemaining"], "3 days");
        assert_eq!(status["expiringSoon"], true);
    }

    #[test]
    fn no_expiry_left_untouched() {
        let now = Utc::now();
        let mut status = json!({ "isActive": false });
        annotate_expiry(&mut status, now);
        assert_eq!(status, json!({ "isActive": false }));

        let mut garbled = json!({ "expiresAt": "soon" });
        annotate_expiry(&mut garbled, now);
        assert!(garbled.get("timeRemaining").is_none());
    }
}
