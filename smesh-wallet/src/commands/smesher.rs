//! Smesher commands: rewards, smeshing control and rewards account

use std::io::{BufRead, Write};

use super::{decode_hex, Dispatcher, COIN_UNIT};
use crate::error::Result;
use crate::rpc::{NodeApi, Reward};

/// Page size for smesher reward listings
const REWARDS_LIMIT: u32 = 10_000;

impl<C: NodeApi, R: BufRead, W: Write> Dispatcher<C, R, W> {
    /// All rewards awarded to a smesher id entered by the user
    pub(super) async fn smesher_rewards(&mut self) -> Result<()> {
        let input = self.prompt_not_blank("Enter or paste a Smesher id:")?;
        let smesher_id = decode_hex(&input)?;

        let (rewards, total) = self
            .backend
            .smesher_rewards(&smesher_id, 0, REWARDS_LIMIT)
            .await?;

        self.say(&format!("Total rewards: {}", total))?;
        for reward in &rewards {
            self.print_reward(reward)?;
        }
        Ok(())
    }

    fn print_reward(&mut self, reward: &Reward) -> Result<()> {
        self.say(&format!("Layer: {}", reward.layer))?;
        self.say(&format!("Total: {} {}", reward.total, COIN_UNIT))?;
        self.say(&format!("Layer reward: {} {}", reward.layer_reward, COIN_UNIT))?;
        self.say(&format!("Rewards account: {}", reward.coinbase))?;
        self.say("-----")
    }

    pub(super) async fn start_smeshing(&mut self) -> Result<()> {
        self.require_current_account()?;
        let data_dir = self.prompt_not_blank("Enter data file directory:")?;
        let size_gib = self.prompt_u64("Enter space allocation (GiB):")?;

        self.backend.start_smeshing(&data_dir, size_gib).await?;
        self.say("Smeshing started")
    }

    pub(super) async fn stop_smeshing(&mut self) -> Result<()> {
        let delete_files = self.prompt_yes_no("Delete smeshing data files")?;

        self.backend.stop_smeshing(delete_files).await?;
        self.say("Smeshing stopped")
    }

    pub(super) async fn smeshing_status(&mut self) -> Result<()> {
        if self.backend.is_smeshing().await? {
            self.say("Smeshing is currently on")
        } else {
            self.say("Smeshing is off")
        }
    }

    pub(super) async fn get_rewards_account(&mut self) -> Result<()> {
        let address = self.backend.rewards_account().await?;
        self.say(&format!("Rewards address is: {}", address))
    }

    pub(super) async fn set_rewards_account(&mut self) -> Result<()> {
        self.require_current_account()?;
        let address = self.backend.set_rewards_account().await?;
        self.say(&format!("Rewards address set to: {}", address))
    }

    pub(super) async fn get_smesher_id(&mut self) -> Result<()> {
        let id = self.backend.smesher_id().await?;
        self.say(&format!("Smesher id: 0x{}", hex::encode(id)))
    }
}
