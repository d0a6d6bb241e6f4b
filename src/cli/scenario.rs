//! Scripted follow scenarios
//!
//! Runs a TOML-described sequence of ledger and hub actions against an
//! in-memory asset ledger, hub and follow module, and reports the outcome of
//! each step. Step failures are reported and the scenario continues.
//!
//! Without `--file` the built-in scenario runs: mint 1000 CUR, require
//! [(CUR, 100), (CUR, 200)], approve 300, follow, burn the follow token.

use super::config::DepositFollowConfig;
use deposit_follow::assets::{AccountId, Amount, AssetId, MockAssetLedger};
use deposit_follow::follow_module::{AssetDepositFollowModule, FollowModule, ModuleEvent};
use deposit_follow::hub::FollowHub;
use deposit_follow::serialization::encode_deposits;
use deposit_follow::{DepositRequirement, ProfileId};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Built-in scenario.
pub const DEFAULT_SCENARIO: &str = r#"
[[accounts]]
name = "user"
mint = [{ asset = "CUR", amount = 1000 }]

[[profiles]]
owner = "user"
handle = "tester"
deposits = [{ asset = "CUR", amount = 100 }, { asset = "CUR", amount = 200 }]

[[steps]]
action = "approve"
owner = "user"
asset = "CUR"
amount = 300

[[steps]]
action = "follow"
follower = "user"
profile = 1

[[steps]]
action = "balance"
account = "user"
asset = "CUR"

[[steps]]
action = "unfollow"
follower = "user"
profile = 1

[[steps]]
action = "balance"
account = "user"
asset = "CUR"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    #[serde(default)]
    pub profiles: Vec<ProfileSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositSpec {
    pub asset: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSpec {
    pub name: String,
    #[serde(default)]
    pub mint: Vec<DepositSpec>,
}

/// Profiles are numbered from 1 in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSpec {
    pub owner: String,
    pub handle: String,
    /// Attach the follow module with this requirement.
    pub deposits: Option<Vec<DepositSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Approve {
        owner: String,
        asset: String,
        amount: u64,
    },
    Mint {
        account: String,
        asset: String,
        amount: u64,
    },
    /// Follow with `deposits`, or with the profile's requirement if omitted.
    Follow {
        follower: String,
        profile: u64,
        deposits: Option<Vec<DepositSpec>>,
    },
    Unfollow {
        follower: String,
        profile: u64,
    },
    Balance {
        account: String,
        asset: String,
    },
}

fn to_requirement(specs: &[DepositSpec]) -> DepositRequirement {
    DepositRequirement::from_pairs(
        specs
            .iter()
            .map(|d| (d.asset.clone(), Amount::from(d.amount))),
    )
}

impl Scenario {
    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(contents).map_err(|e| format!("Failed to parse scenario: {}", e))?)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario '{}': {}", path.display(), e))?;
        Self::parse(&contents)
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Default)]
pub struct ScenarioReport {
    pub lines: Vec<String>,
    pub failures: usize,
    /// Module event log at the end of the run.
    pub events: Vec<ModuleEvent>,
}

impl ScenarioReport {
    fn ok(&mut self, line: String) {
        self.lines.push(format!("✓ {}", line));
    }

    fn failed(&mut self, line: String) {
        self.failures += 1;
        self.lines.push(format!("✗ {}", line));
    }
}

/// Run `scenario` and collect per-step results.
pub async fn run_scenario(
    config: &DepositFollowConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, Box<dyn std::error::Error>> {
    let ledger = Arc::new(MockAssetLedger::new());
    let module = Arc::new(AssetDepositFollowModule::new(
        config.escrow_account(),
        ledger.clone(),
        Arc::new(config.whitelist_gate()),
    ));
    let hub = FollowHub::new();
    let mut report = ScenarioReport::default();

    for account in &scenario.accounts {
        let id = AccountId::new(account.name.clone());
        for mint in &account.mint {
            ledger.mint(&id, &AssetId::new(mint.asset.clone()), Amount::from(mint.amount))?;
        }
    }

    for spec in &scenario.profiles {
        let owner = AccountId::new(spec.owner.clone());
        let profile = hub.create_profile(&owner, &spec.handle);
        let Some(deposits) = &spec.deposits else {
            report.ok(format!("profile {} ({}) created", profile, spec.handle));
            continue;
        };

        let data = encode_deposits(&to_requirement(deposits))?;
        let attachable: Arc<dyn FollowModule> = module.clone();
        match hub
            .set_follow_module(&owner, profile, Some(attachable), &data)
            .await
        {
            Ok(()) => report.ok(format!(
                "profile {} ({}) requires {} deposit(s)",
                profile,
                spec.handle,
                deposits.len()
            )),
            Err(e) => report.failed(format!("profile {} ({}): {}", profile, spec.handle, e)),
        }
    }

    for step in &scenario.steps {
        match step {
            Step::Approve {
                owner,
                asset,
                amount,
            } => {
                ledger.approve(
                    &AccountId::new(owner.clone()),
                    module.escrow_account(),
                    &AssetId::new(asset.clone()),
                    Amount::from(*amount),
                );
                report.ok(format!("{} approved {} {}", owner, amount, asset));
            }
            Step::Mint {
                account,
                asset,
                amount,
            } => {
                let minted = ledger.mint(
                    &AccountId::new(account.clone()),
                    &AssetId::new(asset.clone()),
                    Amount::from(*amount),
                );
                match minted {
                    Ok(()) => report.ok(format!("minted {} {} to {}", amount, asset, account)),
                    Err(e) => report.failed(format!("mint to {}: {}", account, e)),
                }
            }
            Step::Follow {
                follower,
                profile,
                deposits,
            } => {
                let profile = ProfileId(*profile);
                let manifest = match deposits {
                    Some(specs) => Some(to_requirement(specs)),
                    None => module.requirement_of(profile),
                };
                let data = match manifest {
                    Some(manifest) => encode_deposits(&manifest)?,
                    None => Vec::new(),
                };

                match hub
                    .follow(&AccountId::new(follower.clone()), profile, &data)
                    .await
                {
                    Ok(token) => report.ok(format!(
                        "{} followed profile {} (token {})",
                        follower, profile, token
                    )),
                    Err(e) => report.failed(format!("{} follow {}: {}", follower, profile, e)),
                }
            }
            Step::Unfollow { follower, profile } => {
                let follower_id = AccountId::new(follower.clone());
                let token = hub
                    .tokens_of(&follower_id)
                    .into_iter()
                    .find(|t| t.profile == ProfileId(*profile));

                match token {
                    Some(token) => match hub.burn(&follower_id, token.id).await {
                        Ok(()) => report.ok(format!(
                            "{} unfollowed profile {} (token {} burned)",
                            follower, profile, token.id
                        )),
                        Err(e) => {
                            report.failed(format!("{} unfollow {}: {}", follower, profile, e))
                        }
                    },
                    None => report.failed(format!(
                        "{} holds no follow token for profile {}",
                        follower, profile
                    )),
                }
            }
            Step::Balance { account, asset } => {
                let balance = ledger.balance(
                    &AccountId::new(account.clone()),
                    &AssetId::new(asset.clone()),
                );
                report.ok(format!("{} balance: {} {}", account, balance, asset));
            }
        }
    }

    report.events = module.events().all();
    Ok(report)
}

/// Run a scenario file (or the built-in one) and print the results.
pub async fn execute(
    config_path: Option<String>,
    file: Option<String>,
    show_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let scenario = match &file {
        Some(path) => Scenario::load(Path::new(path))?,
        None => Scenario::parse(DEFAULT_SCENARIO)?,
    };

    println!(
        "Running scenario: {}",
        file.as_deref().unwrap_or("built-in")
    );
    println!("Escrow account: {}", config.module.escrow_account);
    println!();

    run_and_print(&config, &scenario, show_events).await
}

/// Run `scenario`, print its report, and fail if any step failed.
async fn run_and_print(
    config: &DepositFollowConfig,
    scenario: &Scenario,
    show_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_scenario(config, scenario).await?;
    for line in &report.lines {
        println!("{}", line);
    }

    println!();
    println!("{}", summary(scenario, &report));

    if show_events {
        println!();
        for event in &report.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }

    if report.failures > 0 {
        return Err(format!("scenario finished with {} failure(s)", report.failures).into());
    }
    Ok(())
}

/// One-line result: profiles set up, steps run, failures across both.
fn summary(scenario: &Scenario, report: &ScenarioReport) -> String {
    format!(
        "{} profile(s), {} step(s), {} failed",
        scenario.profiles.len(),
        scenario.steps.len(),
        report.failures
    )
}
