use odra::host::HostEnv;
use odra::prelude::Addressable;

use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt, OdraCli,
};

use nova_cdp::manager::{CdpManager, CdpManagerInitArgs};
use nova_cdp::math::{Decimal, Rate};

/// Deploy script for the position manager.
pub struct CdpManagerDeployScript;

impl DeployScript for CdpManagerDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer,
    ) -> Result<(), odra_cli::deploy::Error> {
        println!("Deploying CdpManager...");

        let operator = env.get_account(0);
        let manager = CdpManager::load_or_deploy(
            env,
            CdpManagerInitArgs {
                admin: operator,
                price_feeder: operator,
                liquidation_ratio_pct: 130,
                min_collateral_ratio_pct: 150,
                position_debt_ceiling: Decimal::from(1_000_000u64),
                position_debt_floor: Decimal::from(100u64),
                global_debt_ceiling: Decimal::from(10_000_000u64),
                stability_fee_rate: Rate::from_percent(5),
                max_operation_amount: Decimal::from(100_000u64),
                max_price_age_secs: 86_400,
                auto_close: true,
            },
            container,
            200_000_000_000, // 200 CSPR
        )?;

        println!("CdpManager deployed at: {:?}", manager.address());

        Ok(())
    }
}

/// Scenario: read back the system-wide figures.
pub struct SystemStatusScenario;

impl Scenario for SystemStatusScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        _args: Args,
    ) -> Result<(), Error> {
        let contract = container.contract_ref::<CdpManager>(env)?;

        println!("total debt:        {}", contract.total_debt());
        println!("collateral price:  {}", contract.collateral_price());
        println!("shutdown active:   {}", contract.is_shutdown());

        Ok(())
    }
}

impl ScenarioMetadata for SystemStatusScenario {
    const NAME: &'static str = "system-status";
    const DESCRIPTION: &'static str = "Prints the manager's system-wide debt and price figures";
}

pub fn main() {
    OdraCli::new()
        .about("CLI tool for the NOVA CDP position manager")
        .deploy(CdpManagerDeployScript)
        .contract::<CdpManager>()
        .scenario(SystemStatusScenario)
        .build()
        .run();
}
