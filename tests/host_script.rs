//! Operator command scripts driven through the command host

use casino_ledger::{games::FixedOracle, Casino, CommandHost, LedgerConfig};

fn run_script(script: &str) -> (CommandHost<FixedOracle>, Vec<String>) {
    let casino = Casino::new(LedgerConfig::default(), FixedOracle(false)).unwrap();
    let mut host = CommandHost::new(casino);
    let replies = script
        .lines()
        .filter_map(|line| host.execute_line(line))
        .map(|reply| reply.text)
        .collect();
    (host, replies)
}

#[test]
fn test_full_session_script() {
    let script = "\
# evening table
start ₹1,000
bet 100
win
bet 50 pp=10
lose
bet 100
split
win
tie
bet 80
double
cashout 100
end
";
    let (host, replies) = run_script(script);

    assert_eq!(replies.len(), 13);
    assert!(replies[0].contains("₹1,000"));
    assert!(replies[4].contains("Side bets: -₹10"));
    assert!(replies[7].contains("Resolve hand 2"));
    assert!(replies[11].contains("₹60 forfeited"));
    // 1000 +100 -50 -10 +100 +0 -60
    assert!(replies[12].contains("₹1,000 -> ₹1,080"));
    assert!(!host.casino().view().active);
}

#[test]
fn test_errors_do_not_stop_the_script() {
    let script = "\
bet 100
start 0
start 500
bet 600
resetbalance 1,000
bet 600
blackjack
end
";
    let (host, replies) = run_script(script);

    assert!(replies[0].starts_with("❌"));
    assert!(replies[1].starts_with("❌"));
    assert!(replies[3].contains("Insufficient balance"));
    assert!(replies[4].contains("₹500 to ₹1,000"));
    assert!(replies[6].contains("Blackjack"));
    assert!(replies[7].contains("SESSION COMPLETE"));
    assert_eq!(host.casino().history().len(), 1);
}

#[test]
fn test_report_carries_chart() {
    let casino = Casino::new(LedgerConfig::default(), FixedOracle(false)).unwrap();
    let mut host = CommandHost::new(casino);
    for line in ["start 1000", "bet 100", "win", "bet 100", "lose"] {
        host.execute_line(line);
    }

    let reply = host.execute_line("end").unwrap();
    let report = reply.report.unwrap();
    let svg = String::from_utf8(report.chart.unwrap()).unwrap();
    assert!(svg.contains("Cumulative Profit/Loss Trend"));
}
