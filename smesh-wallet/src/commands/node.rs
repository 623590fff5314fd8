//! Node info command

use std::io::{BufRead, Write};

use super::Dispatcher;
use crate::error::Result;
use crate::rpc::NodeApi;

impl<C: NodeApi, R: BufRead, W: Write> Dispatcher<C, R, W> {
    pub(super) async fn node_info(&mut self) -> Result<()> {
        let info = self.backend.node_info().await?;
        let url = self.backend.server_url().to_string();

        self.say(&format!("Version: {}", info.version))?;
        self.say(&format!("Build: {}", info.build))?;
        self.say(&format!("API server: {}", url))?;

        let status = self.backend.node_status().await?;
        self.say(&format!("Synced: {}", status.is_synced))?;
        self.say(&format!("Synced layer: {}", status.synced_layer))?;
        self.say(&format!("Current layer: {}", status.top_layer))?;
        self.say(&format!("Verified layer: {}", status.verified_layer))?;
        self.say(&format!("Peers: {}", status.connected_peers))
    }
}
