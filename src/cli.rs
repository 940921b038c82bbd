//! Argument parsing for `flyrancher-sub`.
//!
//! # Usage
//!
//! ```text
//! flyrancher-sub [--config <path>] <command> [args…]
//! ```
//!
//! Global flags are accepted anywhere on the line. Command flags are pulled
//! out of the remaining arguments before positionals are read.

use std::path::PathBuf;
use std::str::FromStr;

use flyrancher_sub::catalog::Tier;
use flyrancher_sub::memo::{Intent, IntentKind};

#[derive(Debug, PartialEq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Encode(Intent),
    Decode { memo: String },
    Price { memo: String, remaining_days: Option<u32> },
    Quote { tier: Tier, duration: u32, addons: Vec<String> },
    Check {
        memo: String,
        amount: String,
        tolerance: Option<f64>,
        remaining_days: Option<u32>,
    },
    Wallet { names: Vec<String> },
    Recommend { wallets: usize, growth: usize },
    Status { wallets: Vec<String> },
    History { wallet: String, limit: u32, offset: u32 },
    Metrics,
    Health,
    Submit {
        transaction_hash: String,
        from: String,
        to: Option<String>,
        amount: String,
        memo: String,
        block_number: Option<u64>,
    },
    Poll { transaction_id: String },
}

const DEFAULT_HISTORY_LIMIT: u32 = 20;

pub fn print_help() {
    eprintln!("usage: flyrancher-sub [--config <path>] <command> [args…]");
    eprintln!();
    eprintln!("memo commands:");
    eprintln!("  encode <kind> <duration> [--tier T] [--addon A] [wallets…]");
    eprintln!("                        build a memo (kind: name or tag, e.g. N, FW, upgrade)");
    eprintln!("  decode <memo>         print the decoded intent as JSON");
    eprintln!("  price <memo> [--remaining-days N]");
    eprintln!("                        expected payment amount for a memo");
    eprintln!("  check <memo> <amount> [--tolerance X] [--remaining-days N]");
    eprintln!("                        reconcile an observed amount against a memo");
    eprintln!();
    eprintln!("catalog commands:");
    eprintln!("  quote <tier> <duration> [addons…]");
    eprintln!("  recommend <wallets> [growth]");
    eprintln!("  wallet <names…>       validate wallet names");
    eprintln!();
    eprintln!("backend commands:");
    eprintln!("  status <wallets…>     subscription status per wallet");
    eprintln!("  history <wallet> [--limit N] [--offset N]");
    eprintln!("  metrics               backend metrics");
    eprintln!("  health                backend health");
    eprintln!("  submit --tx H --from W --amount X --memo M [--to W] [--block N]");
    eprintln!("  poll <tx>             wait until a transaction is processed (Ctrl-C stops)");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config, -c <path>   config file (default: config/default.toml)");
    eprintln!("  --help,   -h          print this help");
    eprintln!();
    eprintln!("env overrides: FLYRANCHER_LOG_LEVEL, FLYRANCHER_API_BASE_URL, FLYRANCHER_NETWORK");
}

pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Cli, String> {
    let mut config = None;
    let mut command = None;
    let mut rest = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                return Ok(Cli { config, command: Command::Help });
            }
            "--" => {
                rest.extend(iter);
                break;
            }
            _ if command.is_none() => command = Some(arg),
            _ => rest.push(arg),
        }
    }

    let command = match command {
        Some(cmd) => build_command(&cmd, rest)?,
        None => Command::Help,
    };
    Ok(Cli { config, command })
}

fn build_command(cmd: &str, mut rest: Vec<String>) -> Result<Command, String> {
    let command = match cmd {
        "help" => Command::Help,
        "encode" => {
            let tier = take_flag(&mut rest, "--tier")?
                .map(|t| parse_value::<Tier>(&t, "tier"))
                .transpose()?;
            let addon = take_flag(&mut rest, "--addon")?;
            let mut pos = rest.into_iter();
            let usage = "usage: flyrancher-sub encode <kind> <duration> [--tier T] [--addon A] [wallets…]";
            let kind: IntentKind = parse_value(&pos.next().ok_or(usage)?, "memo type")?;
            let duration = parse_value(&pos.next().ok_or(usage)?, "duration")?;
            Command::Encode(build_intent(kind, duration, tier, addon, pos.collect())?)
        }
        "decode" => Command::Decode { memo: single(rest, "usage: flyrancher-sub decode <memo>")? },
        "price" => {
            let remaining_days = take_number(&mut rest, "--remaining-days")?;
            let memo = single(rest, "usage: flyrancher-sub price <memo> [--remaining-days N]")?;
            Command::Price { memo, remaining_days }
        }
        "check" => {
            let tolerance: Option<f64> = take_number(&mut rest, "--tolerance")?;
            if let Some(t) = tolerance {
                if !(t.is_finite() && t >= 0.0) {
                    return Err(format!("invalid tolerance: '{t}' (must be a finite number >= 0)"));
                }
            }
            let remaining_days = take_number(&mut rest, "--remaining-days")?;
            let [memo, amount] = exactly::<2>(rest, "usage: flyrancher-sub check <memo> <amount> [--tolerance X]")?;
            Command::Check { memo, amount, tolerance, remaining_days }
        }
        "quote" => {
            let mut pos = rest.into_iter();
            let usage = "usage: flyrancher-sub quote <tier> <duration> [addons…]";
            let tier = parse_value(&pos.next().ok_or(usage)?, "tier")?;
            let duration = parse_value(&pos.next().ok_or(usage)?, "duration")?;
            Command::Quote { tier, duration, addons: pos.collect() }
        }
        "recommend" => {
            let mut pos = rest.into_iter();
            let wallets = parse_value(
                &pos.next().ok_or("usage: flyrancher-sub recommend <wallets> [growth]")?,
                "wallet count",
            )?;
            let growth = pos.next().map(|g| parse_value(&g, "growth")).transpose()?.unwrap_or(0);
            Command::Recommend { wallets, growth }
        }
        "wallet" | "wallets" => {
            if rest.is_empty() {
                return Err("usage: flyrancher-sub wallet <names…>".into());
            }
            Command::Wallet { names: rest }
        }
        "status" => {
            if rest.is_empty() {
                return Err("usage: flyrancher-sub status <wallets…>".into());
            }
            Command::Status { wallets: rest }
        }
        "history" => {
            let limit = take_number(&mut rest, "--limit")?.unwrap_or(DEFAULT_HISTORY_LIMIT);
            let offset = take_number(&mut rest, "--offset")?.unwrap_or(0);
            let wallet = single(rest, "usage: flyrancher-sub history <wallet> [--limit N] [--offset N]")?;
            Command::History { wallet, limit, offset }
        }
        "metrics" => Command::Metrics,
        "health" => Command::Health,
        "submit" => {
            let usage = "usage: flyrancher-sub submit --tx H --from W --amount X --memo M [--to W] [--block N]";
            let transaction_hash = take_flag(&mut rest, "--tx")?.ok_or(usage)?;
            let from = take_flag(&mut rest, "--from")?.ok_or(usage)?;
            let amount = take_flag(&mut rest, "--amount")?.ok_or(usage)?;
            let memo = take_flag(&mut rest, "--memo")?.ok_or(usage)?;
            let to = take_flag(&mut rest, "--to")?;
            let block_number = take_number(&mut rest, "--block")?;
            if let Some(extra) = rest.first() {
                return Err(format!("unexpected argument '{extra}'\n{usage}"));
            }
            Command::Submit { transaction_hash, from, to, amount, memo, block_number }
        }
        "poll" => Command::Poll {
            transaction_id: single(rest, "usage: flyrancher-sub poll <tx>")?,
        },
        other => {
            return Err(format!(
                "unknown command: {other}\n  run 'flyrancher-sub --help' for usage"
            ));
        }
    };
    Ok(command)
}

/// Assemble an [`Intent`] from loose arguments. Field-level validation is
/// left to the codec.
fn build_intent(
    kind: IntentKind,
    duration: u32,
    tier: Option<Tier>,
    addon: Option<String>,
    wallets: Vec<String>,
) -> Result<Intent, String> {
    let need_tier = || tier.ok_or_else(|| format!("{} needs --tier", kind.as_str()));
    let need_addon = || addon.clone().ok_or_else(|| format!("{} needs --addon", kind.as_str()));

    Ok(match kind {
        IntentKind::NewSubscription => Intent::NewSubscription { duration, tier: need_tier()?, wallets },
        IntentKind::AddWallet => Intent::AddWallet { duration, wallets },
        IntentKind::WalletRenewal => Intent::WalletRenewal { duration, wallets },
        IntentKind::SubscriptionAddon => Intent::SubscriptionAddon { duration, addon: need_addon()? },
        IntentKind::WalletAddon => Intent::WalletAddon { duration, addon: need_addon()?, wallets },
        IntentKind::SubscriptionRenewal => Intent::SubscriptionRenewal { duration, tier: need_tier()? },
        IntentKind::Upgrade => Intent::Upgrade { duration, tier: need_tier()? },
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Remove `name <value>` from `rest`, returning the value.
fn take_flag(rest: &mut Vec<String>, name: &str) -> Result<Option<String>, String> {
    let Some(pos) = rest.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= rest.len() {
        return Err(format!("{name} needs a value"));
    }
    let value = rest.remove(pos + 1);
    rest.remove(pos);
    Ok(Some(value))
}

fn take_number<T: FromStr>(rest: &mut Vec<String>, name: &str) -> Result<Option<T>, String> {
    take_flag(rest, name)?
        .map(|v| parse_value(&v, name.trim_start_matches('-')))
        .transpose()
}

fn parse_value<T: FromStr>(value: &str, what: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("invalid {what}: '{value}'"))
}

fn single(rest: Vec<String>, usage: &str) -> Result<String, String> {
    let [value] = exactly::<1>(rest, usage)?;
    Ok(value)
}

fn exactly<const N: usize>(rest: Vec<String>, usage: &str) -> Result<[String; N], String> {
    rest.try_into().map_err(|_| usage.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn command(line: &str) -> Command {
        parse(args(line)).unwrap().command
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(command(""), Command::Help);
        assert_eq!(command("status aaa.gm --help"), Command::Help);
    }

    #[test]
    fn config_flag_anywhere() {
        let cli = parse(args("decode N-1-B:aaa.gm --config /tmp/x.toml")).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert_eq!(cli.command, Command::Decode { memo: "N-1-B:aaa.gm".into() });
        assert!(parse(args("decode x --config")).is_err());
    }

    #[test]
    fn encode_builds_intent() {
        assert_eq!(
            command("encode N 3 --tier standard aaa.gm bbb.gm"),
            Command::Encode(Intent::NewSubscription {
                duration: 3,
                tier: Tier::Standard,
                wallets: vec!["aaa.gm".into(), "bbb.gm".into()],
            })
        );
        assert_eq!(
            command("encode wallet_addon 2 --addon REPAIR aaa.gm"),
            Command::Encode(Intent::WalletAddon {
                duration: 2,
                addon: "REPAIR".into(),
                wallets: vec!["aaa.gm".into()],
            })
        );
        assert_eq!(
            command("encode U 0 --tier premium"),
            Command::Encode(Intent::Upgrade { duration: 0, tier: Tier::Premium })
        );
    }

    #[test]
    fn encode_missing_pieces() {
        assert!(parse(args("encode N 3 aaa.gm")).unwrap_err().contains("needs --tier"));
        assert!(parse(args("encode FS 1")).unwrap_err().contains("needs --addon"));
        assert!(parse(args("encode XX 1")).is_err());
        assert!(parse(args("encode N")).is_err());
    }

    #[test]
    fn check_with_flags() {
        assert_eq!(
            command("check S-2-P 40.45 --tolerance 0.05"),
            Command::Check {
                memo: "S-2-P".into(),
                amount: "40.45".into(),
                tolerance: Some(0.05),
                remaining_days: None,
            }
        );
        assert!(parse(args("check S-2-P")).is_err());
        assert!(parse(args("check S-2-P 1 --tolerance lots")).is_err());
    }

    #[test]
    fn check_rejects_non_finite_or_negative_tolerance() {
        for t in ["NaN", "inf", "-0.5"] {
            let line = format!("check N-3-S:aaa.gm 0.00000001 --tolerance {t}");
            assert!(parse(args(&line)).is_err(), "{t}");
        }
        assert!(parse(args("check N-3-S:aaa.gm 40.5 --tolerance 0")).is_ok());
    }

    #[test]
    fn history_defaults() {
        assert_eq!(
            command("history aaa.gm"),
            Command::History { wallet: "aaa.gm".into(), limit: 20, offset: 0 }
        );
        assert_eq!(
            command("history --offset 40 aaa.gm --limit 10"),
            Command::History { wallet: "aaa.gm".into(), limit: 10, offset: 40 }
        );
    }

    #[test]
    fn submit_requires_core_flags() {
        assert_eq!(
            command("submit --tx abc --from aaa.gm --amount 8 --memo N-1-B:aaa.gm --block 7"),
            Command::Submit {
                transaction_hash: "abc".into(),
                from: "aaa.gm".into(),
                to: None,
                amount: "8".into(),
                memo: "N-1-B:aaa.gm".into(),
                block_number: Some(7),
            }
        );
        assert!(parse(args("submit --tx abc --from aaa.gm")).is_err());
        assert!(parse(args("submit --tx a --from b --amount 1 --memo m stray")).is_err());
    }

    #[test]
    fn quote_and_recommend() {
        assert_eq!(
            command("quote standard 3 REPAIR"),
            Command::Quote { tier: Tier::Standard, duration: 3, addons: vec!["REPAIR".into()] }
        );
        assert_eq!(command("recommend 3"), Command::Recommend { wallets: 3, growth: 0 });
        assert_eq!(command("recommend 3 4"), Command::Recommend { wallets: 3, growth: 4 });
    }

    #[test]
    fn unknown_command_errors() {
        let err = parse(args("launch")).unwrap_err();
        assert!(err.contains("unknown command: launch"));
    }
}
