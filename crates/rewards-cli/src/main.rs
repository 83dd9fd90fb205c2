use std::env;
use std::net::SocketAddr;

use contracts::{CreditReason, GoalKind, GoalPeriod, RewardConfig, TipKind};
use rewards_api::{serve, ProviderClient, ProviderConfig, RewardsApi};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("rewards-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  balance <address>");
    println!("  credit <address> <amount> [reason]");
    println!("  steps <address> <total>");
    println!("  tip <from> <to> <amount>");
    println!("  goals <address> [period]");
    println!("  history <address>");
    println!("  demo <address>");
    println!("    seeds the store with a day of sample activity");
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn parse_address(value: Option<&String>, label: &str) -> Result<String, String> {
    value
        .map(String::to_string)
        .filter(|address| !address.trim().is_empty())
        .ok_or_else(|| format!("missing {}", label))
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_reason(value: Option<&String>) -> Result<CreditReason, String> {
    match value.map(String::as_str) {
        None | Some("manual") => Ok(CreditReason::Manual),
        Some("milestone") => Ok(CreditReason::Milestone),
        Some("ticket") => Ok(CreditReason::Ticket),
        Some("tip_received") => Ok(CreditReason::TipReceived),
        Some("goal_bonus") => Ok(CreditReason::GoalBonus),
        Some(other) => Err(format!("invalid reason: {other}")),
    }
}

fn parse_period(value: Option<&String>) -> Result<GoalPeriod, String> {
    match value.map(String::as_str) {
        None | Some("daily") => Ok(GoalPeriod::Daily),
        Some("weekly") => Ok(GoalPeriod::Weekly),
        Some(other) => Err(format!("invalid period: {other}")),
    }
}

fn default_sqlite_path() -> String {
    std::env::var("STRIDE_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "stride_rewards.sqlite".to_string())
}

fn open_api() -> Result<RewardsApi, String> {
    RewardsApi::open_sqlite(default_sqlite_path(), RewardConfig::default())
        .map_err(|err| format!("failed to open sqlite store: {err}"))
}

fn print_summary(api: &RewardsApi, address: &str) -> Result<(), String> {
    let summary = api
        .wallet_summary(address)
        .map_err(|err| err.to_string())?;
    let streak = summary
        .streak
        .map(|streak| format!("{} day(s), longest {}", streak.current, streak.longest))
        .unwrap_or_else(|| "none".to_string());
    println!(
        "address={} tokens={} tickets={} rank={} streak={}",
        summary.address, summary.tokens, summary.tickets, summary.rank, streak
    );
    Ok(())
}

fn run_credit(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;
    let amount = parse_u64(args.get(3), "amount")?;
    let reason = parse_reason(args.get(4))?;

    let mut api = open_api()?;
    api.credit(&address, amount, reason)
        .map_err(|err| err.to_string())?;
    print_summary(&api, &address)
}

fn run_steps(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;
    let total = parse_u64(args.get(3), "total")?;

    let mut api = open_api()?;
    let evaluation = api
        .record_steps(&address, total)
        .map_err(|err| err.to_string())?;

    println!(
        "steps={} new_milestones={:?} new_tickets={} tokens_credited={}",
        evaluation.total_steps,
        evaluation.new_milestones,
        evaluation.new_tickets,
        evaluation.tokens_credited
    );
    print_summary(&api, &address)
}

fn run_tip(args: &[String]) -> Result<(), String> {
    let from = parse_address(args.get(2), "from")?;
    let to = parse_address(args.get(3), "to")?;
    let amount = parse_u64(args.get(4), "amount")?;

    let mut api = open_api()?;
    let transaction = api
        .send_tip(&from, &to, amount, TipKind::Tip, None)
        .map_err(|err| err.to_string())?;

    println!(
        "tip id={} status={:?} tx_hash={}",
        transaction.id,
        transaction.status,
        transaction.tx_hash.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn run_goals(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;
    let period = parse_period(args.get(3))?;

    let mut api = open_api()?;
    let set = api
        .goal_set(&address, period)
        .map_err(|err| err.to_string())?;

    println!("period={} key={} bonus={:?}", set.period, set.period_key, set.bonus);
    for (kind, record) in &set.goals {
        println!(
            "  {:?}: {}/{} {}",
            kind,
            record.achieved,
            record.target,
            if record.completed { "done" } else { "open" }
        );
    }
    Ok(())
}

fn run_history(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;

    let api = open_api()?;
    let history = api
        .transaction_history(&address)
        .map_err(|err| err.to_string())?;

    if history.is_empty() {
        println!("no transactions for {address}");
        return Ok(());
    }
    for tx in history {
        println!(
            "{} {} -> {} amount={} {:?} {:?}",
            tx.created_at, tx.from_address, tx.to_address, tx.amount, tx.kind, tx.status
        );
    }
    Ok(())
}

fn run_demo(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;

    let mut api = open_api()?;
    api.credit(&address, 100, CreditReason::Manual)
        .map_err(|err| err.to_string())?;
    api.record_steps(&address, 7_500)
        .map_err(|err| err.to_string())?;
    api.record_goal_progress(&address, GoalPeriod::Daily, GoalKind::Steps, 7_500)
        .map_err(|err| err.to_string())?;
    api.record_goal_progress(&address, GoalPeriod::Daily, GoalKind::ActiveMinutes, 35)
        .map_err(|err| err.to_string())?;

    println!("seeded demo activity for {address}");
    print_summary(&api, &address)
}

fn run_balance(args: &[String]) -> Result<(), String> {
    let address = parse_address(args.get(2), "address")?;
    let api = open_api()?;
    print_summary(&api, &address)
}

async fn run_serve(args: &[String]) -> Result<(), String> {
    let addr = parse_socket_addr(args.get(2))?;
    let api = open_api()?;
    let provider = ProviderClient::new(ProviderConfig::from_env());

    println!("serving reward api on http://{addr}");
    serve(addr, api, provider)
        .await
        .map_err(|err| format!("server error: {err}"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("serve") => run_serve(&args).await,
        Some("balance") => run_balance(&args),
        Some("credit") => run_credit(&args),
        Some("steps") => run_steps(&args),
        Some("tip") => run_tip(&args),
        Some("goals") => run_goals(&args),
        Some("history") => run_history(&args),
        Some("demo") => run_demo(&args),
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
